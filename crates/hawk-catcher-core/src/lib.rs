// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Hawk error catcher.
//!
//! This crate holds the plain data shared by every stage of the capture
//! pipeline and does no I/O of its own. The SDK in `hawk-catcher` builds on it.
//!
//! # Overview
//!
//! - [`Exception`], [`RaisedError`] and [`Fault`] describe what was caught
//! - [`RawFrame`] is a call-stack entry as recorded; [`Frame`] is its
//!   normalized wire shape
//! - [`Value`] models captured runtime values such as frame arguments
//! - [`EventPayload`] and [`Event`] are what ends up on the wire
//! - [`Addon`] is the interface for named metadata resolvers

pub mod addon;
pub mod error;
pub mod event;
pub mod exception;
pub mod frame;
pub mod level;
pub mod severity;
pub mod value;

pub use addon::Addon;
pub use error::{CoreError, Result};
pub use event::{Event, EventPayload, CATCHER_TYPE};
pub use exception::{Exception, ExceptionId, Fault, RaisedError};
pub use frame::{Frame, RawFrame, SourceLine, Stacktrace};
pub use level::ErrorLevel;
pub use severity::Severity;
pub use value::Value;
