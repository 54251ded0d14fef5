// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide catcher for applications that want a single instance.
//!
//! [`Catcher`] works fine as an ordinary value; this module only adds a
//! shared slot and free functions on top of it.

use std::error::Error as StdError;
use std::sync::OnceLock;

use hawk_catcher_core::Exception;
use parking_lot::{const_mutex, Mutex};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::client::{Catcher, Delivery};
use crate::error::{CatcherSdkError, Result};
use crate::options::Options;
use crate::payload_builder::EventData;

static INSTANCE: OnceLock<Catcher> = OnceLock::new();
static INIT: Mutex<()> = const_mutex(());

/// Initializes the process-wide catcher and enables its handlers.
///
/// Only the first successful call configures anything; later calls return
/// the existing instance and ignore their options. Configuration errors are
/// returned and leave the catcher uninitialized.
pub fn init(options: Options) -> Result<Catcher> {
	let _guard = INIT.lock();
	if let Some(catcher) = INSTANCE.get() {
		debug!("Catcher already initialized");
		return Ok(catcher.clone());
	}

	let catcher = Catcher::builder().options(options).build()?;
	catcher.enable_handlers();
	Ok(INSTANCE.get_or_init(|| catcher).clone())
}

/// The process-wide catcher.
pub fn instance() -> Result<Catcher> {
	INSTANCE.get().cloned().ok_or(CatcherSdkError::NotInitialized)
}

pub fn send_event(data: EventData) -> Result<Delivery> {
	Ok(instance()?.send_event(data))
}

pub fn send_message(title: impl Into<String>, context: Map<String, JsonValue>) -> Result<Delivery> {
	Ok(instance()?.send_message(title, context))
}

pub fn send_exception(exception: &Exception, context: Map<String, JsonValue>) -> Result<Delivery> {
	Ok(instance()?.send_exception(exception, context))
}

#[track_caller]
pub fn send_error<E: StdError + ?Sized>(error: &E) -> Result<Delivery> {
	Ok(instance()?.send_error(error))
}

pub fn set_user(user: Map<String, JsonValue>) -> Result<()> {
	instance()?.set_user(user);
	Ok(())
}

pub fn set_context(context: Map<String, JsonValue>) -> Result<()> {
	instance()?.set_context(context);
	Ok(())
}
