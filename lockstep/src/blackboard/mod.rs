// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Blackboard notification layer.
//!
//! The interface-management subsystem owns the actual named, typed interfaces
//! and their message queues; this module only dispatches its events: interface
//! creation/destruction to observers registered with (type, id) glob patterns,
//! and message arrival to listeners bound to one interface instance. The
//! [OnMessageWaker] adapter turns a message arrival into a wakeup of a
//! wait-for-wakeup thread.
//!
//! Delivery is synchronous on the publisher's thread, before the triggering
//! call returns; callbacks must be fast and non-blocking by contract and must
//! not register or deregister on the notifier that is delivering to them.

mod lifecycle;
mod message;
pub mod pattern;
mod waker;

pub use lifecycle::{LifecycleNotifier, LifecycleObserver, ObserverInterest};
pub use message::{InterfaceId, MessageListener, MessageNotifier};
pub use waker::OnMessageWaker;
