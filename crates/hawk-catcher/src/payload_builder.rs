// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembly of event payloads.

use hawk_catcher_core::{EventPayload, Exception, Severity};
use serde_json::{Map, Value as JsonValue};

use crate::addons::AddonRegistry;
use crate::backtrace::capture_raw_frames;
use crate::stacktrace::StacktraceNormalizer;

/// What a payload is built from.
#[derive(Debug, Clone, Default)]
pub struct EventData {
	pub title: Option<String>,
	pub description: Option<String>,
	pub severity: Option<Severity>,
	pub exception: Option<Exception>,
	pub context: Map<String, JsonValue>,
	pub user: Map<String, JsonValue>,
}

impl EventData {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn message(title: impl Into<String>) -> Self {
		Self::new().title(title)
	}

	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn severity(mut self, severity: Severity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn exception(mut self, exception: Exception) -> Self {
		self.exception = Some(exception);
		self
	}

	pub fn context(mut self, context: Map<String, JsonValue>) -> Self {
		self.context = context;
		self
	}

	pub fn user(mut self, user: Map<String, JsonValue>) -> Self {
		self.user = user;
		self
	}
}

/// Builds immutable payloads from [`EventData`].
#[derive(Clone, Default)]
pub struct EventPayloadBuilder {
	normalizer: StacktraceNormalizer,
	addons: AddonRegistry,
}

impl EventPayloadBuilder {
	pub fn new(normalizer: StacktraceNormalizer, addons: AddonRegistry) -> Self {
		Self { normalizer, addons }
	}

	pub fn addons(&self) -> &AddonRegistry {
		&self.addons
	}

	/// Creates the payload.
	///
	/// With an exception, the stacktrace is built from its raw stack and the
	/// cause chain goes into the description. Without one, the current call
	/// stack is used. Context and user are taken as given. The release is
	/// left empty for the caller to fill in.
	pub fn create(&self, data: EventData) -> EventPayload {
		let EventData {
			title,
			description,
			severity,
			exception,
			context,
			user,
		} = data;

		let (title, backtrace, chain) = match &exception {
			Some(exception) => (
				title.unwrap_or_else(|| exception.title().to_string()),
				self.normalizer.build_stack(exception),
				cause_chain(exception),
			),
			None => (
				title.unwrap_or_default(),
				self.normalizer.normalize(&capture_raw_frames()),
				String::new(),
			),
		};

		EventPayload::new(title)
			.with_severity(severity)
			.with_description(description.unwrap_or(chain))
			.with_backtrace(backtrace)
			.with_addons(self.addons.resolve_all())
			.with_user(user)
			.with_context(context)
	}
}

/// `Caused by: {type}: {message}`, one line per cause, outermost first.
fn cause_chain(exception: &Exception) -> String {
	exception
		.causes()
		.map(|cause| format!("Caused by: {cause}"))
		.collect::<Vec<_>>()
		.join("\n")
}
