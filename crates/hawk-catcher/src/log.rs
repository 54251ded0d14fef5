// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Log adapter: forwards log records into the capture pipeline.

use std::cell::Cell;
use std::fmt;

use hawk_catcher_core::{ErrorLevel, Exception, Severity};
use serde_json::{Map, Value as JsonValue};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::backtrace::capture_raw_frames;
use crate::client::{Catcher, Delivery};
use crate::payload_builder::EventData;

/// Exception type of exceptions synthesized from log records.
pub const LOG_EXCEPTION_TYPE: &str = "ErrorException";

/// A log record handed over by a logging framework.
///
/// Without an embedded exception, `context` must carry `message` (or the
/// record carries one), `code`, `file` and `line`.
#[derive(Debug, Clone)]
pub struct LogRecord {
	pub level: Severity,
	pub message: String,
	pub exception: Option<Exception>,
	pub context: Map<String, JsonValue>,
}

/// Forwards a log record to the catcher.
///
/// Returns `None` when the record embeds no exception and lacks one of the
/// fields needed to synthesize it. The consumed fields are not sent as
/// context.
pub fn forward_log_record(catcher: &Catcher, record: LogRecord) -> Option<Delivery> {
	let LogRecord {
		level,
		message,
		exception,
		mut context,
	} = record;

	let exception = match exception {
		Some(exception) => exception,
		None => synthesize_exception(&mut context, message)?,
	};

	Some(catcher.send_event(
		EventData::new()
			.severity(level)
			.exception(exception)
			.context(context),
	))
}

fn synthesize_exception(context: &mut Map<String, JsonValue>, fallback: String) -> Option<Exception> {
	let message = match context.remove("message") {
		Some(JsonValue::String(message)) => message,
		Some(_) => return None,
		None => fallback,
	};
	let code = context.remove("code").and_then(|v| v.as_i64());
	let file = context
		.remove("file")
		.and_then(|v| v.as_str().map(str::to_string));
	let line = context
		.remove("line")
		.and_then(|v| v.as_u64())
		.and_then(|l| u32::try_from(l).ok());

	match (code, file, line) {
		(Some(code), Some(file), Some(line))
			if !message.is_empty() && code != 0 && !file.is_empty() && line != 0 =>
		{
			Some(
				Exception::at(LOG_EXCEPTION_TYPE, message, file, line)
					.with_code(code)
					.with_trace(capture_raw_frames()),
			)
		}
		_ => None,
	}
}

thread_local! {
	static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// A tracing Layer that reports log events as catcher events.
///
/// Events at or above the threshold (default `ERROR`) become log records.
/// `file`, `line` and `code` are filled from the event metadata and level
/// unless set as fields. Events emitted by this crate are ignored.
#[derive(Clone)]
pub struct CatcherLayer {
	catcher: Catcher,
	min_level: Level,
}

impl CatcherLayer {
	pub fn new(catcher: Catcher) -> Self {
		Self {
			catcher,
			min_level: Level::ERROR,
		}
	}

	/// Reports events at `level` and more severe.
	pub fn with_min_level(mut self, level: Level) -> Self {
		self.min_level = level;
		self
	}
}

impl<S> Layer<S> for CatcherLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if *metadata.level() > self.min_level || metadata.target().starts_with("hawk_catcher") {
			return;
		}
		// Events logged while forwarding (e.g. by the HTTP stack) are dropped.
		if FORWARDING.with(|flag| flag.replace(true)) {
			return;
		}

		let mut visitor = RecordVisitor::new();
		event.record(&mut visitor);

		let mut context = visitor.fields;
		if let Some(file) = metadata.file() {
			context
				.entry("file")
				.or_insert_with(|| JsonValue::from(file));
		}
		if let Some(line) = metadata.line() {
			context
				.entry("line")
				.or_insert_with(|| JsonValue::from(line));
		}
		context
			.entry("code")
			.or_insert_with(|| JsonValue::from(error_level(metadata.level()).bits()));

		let record = LogRecord {
			level: severity(metadata.level()),
			message: visitor.message.unwrap_or_default(),
			exception: None,
			context,
		};
		forward_log_record(&self.catcher, record);

		FORWARDING.with(|flag| flag.set(false));
	}
}

fn severity(level: &Level) -> Severity {
	match *level {
		Level::ERROR => Severity::Error,
		Level::WARN => Severity::Warning,
		Level::INFO => Severity::Info,
		_ => Severity::Debug,
	}
}

fn error_level(level: &Level) -> ErrorLevel {
	match *level {
		Level::ERROR => ErrorLevel::USER_ERROR,
		Level::WARN => ErrorLevel::USER_WARNING,
		_ => ErrorLevel::USER_NOTICE,
	}
}

struct RecordVisitor {
	message: Option<String>,
	fields: Map<String, JsonValue>,
}

impl RecordVisitor {
	fn new() -> Self {
		Self {
			message: None,
			fields: Map::new(),
		}
	}

	fn insert(&mut self, field: &Field, value: JsonValue) {
		self.fields.insert(field.name().to_string(), value);
	}
}

impl Visit for RecordVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let value = format!("{:?}", value);
		if field.name() == "message" {
			self.message = Some(value);
		} else {
			self.insert(field, JsonValue::from(value));
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = Some(value.to_string());
		} else {
			self.insert(field, JsonValue::from(value));
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.insert(field, JsonValue::from(value));
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.insert(field, JsonValue::from(value));
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.insert(field, JsonValue::from(value));
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.insert(field, JsonValue::from(value));
	}

	fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
		self.insert(field, JsonValue::from(value.to_string()));
	}
}
