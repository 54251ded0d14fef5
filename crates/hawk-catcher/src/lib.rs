// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error catcher SDK for Rust applications reporting to Hawk.
//!
//! The catcher intercepts raised runtime errors, uncaught exceptions (panics
//! included) and fatal terminations, turns each into a JSON-safe event and
//! hands it to a transport. Delivery is synchronous and best-effort.
//!
//! # Quick Start
//!
//! ```ignore
//! use hawk_catcher::{Options, process_runtime};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = Options::builder()
//!         .integration_token(std::env::var("HAWK_INTEGRATION_TOKEN")?)
//!         .release(env!("CARGO_PKG_VERSION"))
//!         .build()?;
//!
//!     // Registers the error, exception (panic) and fatal handlers
//!     hawk_catcher::init(options)?;
//!     let _shutdown = process_runtime().shutdown_guard();
//!
//!     if let Err(e) = risky_operation() {
//!         hawk_catcher::send_error(&e)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Panic capture**: panics are reported as uncaught exceptions, then the
//!   previous panic hook runs
//! - **Hook chaining**: hooks displaced by the catcher still run after it
//! - **Stack normalization**: fault site first, with source context and named
//!   arguments
//! - **Addons**: environment, OS and runtime metadata on every event
//! - **before_send**: rewrite or drop events before delivery
//! - **tracing integration**: [`CatcherLayer`] reports error logs

mod addons;
mod backtrace;
mod client;
mod error;
mod global;
mod handler;
mod log;
mod namer;
mod options;
mod panic_hook;
mod payload_builder;
mod runtime;
mod serializer;
mod source;
mod stacktrace;
mod transport;

pub use addons::{AddonRegistry, EnvironmentAddon, HeadersAddon, OsAddon, RuntimeAddon, SDK_VERSION};
pub use crate::backtrace::capture_raw_frames;
pub use client::{Catcher, CatcherBuilder, Delivery};
pub use error::{CatcherSdkError, Result};
pub use global::{
	init, instance, send_error, send_event, send_exception, send_message, set_context, set_user,
};
pub use handler::{Disposition, MAX_RERAISE_DEPTH};
pub use log::{forward_log_record, CatcherLayer, LogRecord, LOG_EXCEPTION_TYPE};
pub use namer::{resolve_names, FrameNamer, PositionalNamer, SignatureNamer};
pub use options::{BeforeSend, Options, OptionsBuilder, DEFAULT_TIMEOUT, DEFAULT_URL};
pub use panic_hook::PANIC_TYPE;
pub use payload_builder::{EventData, EventPayloadBuilder};
pub use runtime::{
	process_runtime, ErrorHook, ExceptionHook, HookOutcome, HostRuntime, ProcessRuntime,
	ShutdownGuard, ShutdownHook,
};
pub use serializer::{ValueSerializer, MAX_DEPTH};
pub use source::{SourceContextReader, DEFAULT_MARGIN};
pub use stacktrace::{sanitize_keys, StacktraceNormalizer, MAX_ARGUMENTS};
pub use transport::{transport_for, HttpTransport, TracingTransport, Transport, TransportKind};

// Re-export core types for convenience
pub use hawk_catcher_core::{
	Addon, ErrorLevel, Event, EventPayload, Exception, ExceptionId, Fault, Frame, RaisedError,
	RawFrame, Severity, SourceLine, Stacktrace, Value,
};
