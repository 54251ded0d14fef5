// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event payloads and the wire event wrapping them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::frame::Stacktrace;
use crate::severity::Severity;

/// Catcher type reported with every event from this SDK.
pub const CATCHER_TYPE: &str = "errors/rust";

/// The body of one captured fault.
///
/// A payload is assembled once per occurrence and not mutated afterwards;
/// the `with_*` methods consume it and return an updated copy, which is how
/// before-send transforms rewrite it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
	title: String,
	#[serde(rename = "type")]
	severity: Option<Severity>,
	description: String,
	backtrace: Stacktrace,
	addons: Map<String, JsonValue>,
	release: String,
	user: Map<String, JsonValue>,
	context: Map<String, JsonValue>,
}

impl EventPayload {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			..Self::default()
		}
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn severity(&self) -> Option<Severity> {
		self.severity
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn backtrace(&self) -> &Stacktrace {
		&self.backtrace
	}

	pub fn addons(&self) -> &Map<String, JsonValue> {
		&self.addons
	}

	pub fn release(&self) -> &str {
		&self.release
	}

	pub fn user(&self) -> &Map<String, JsonValue> {
		&self.user
	}

	pub fn context(&self) -> &Map<String, JsonValue> {
		&self.context
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	pub fn with_severity(mut self, severity: Option<Severity>) -> Self {
		self.severity = severity;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn with_backtrace(mut self, backtrace: Stacktrace) -> Self {
		self.backtrace = backtrace;
		self
	}

	pub fn with_addons(mut self, addons: Map<String, JsonValue>) -> Self {
		self.addons = addons;
		self
	}

	pub fn with_release(mut self, release: impl Into<String>) -> Self {
		self.release = release.into();
		self
	}

	pub fn with_user(mut self, user: Map<String, JsonValue>) -> Self {
		self.user = user;
		self
	}

	pub fn with_context(mut self, context: Map<String, JsonValue>) -> Self {
		self.context = context;
		self
	}
}

/// The unit handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub token: String,
	pub catcher_type: String,
	pub payload: EventPayload,
}

impl Event {
	pub fn new(token: impl Into<String>, payload: EventPayload) -> Self {
		Self {
			token: token.into(),
			catcher_type: CATCHER_TYPE.to_string(),
			payload,
		}
	}

	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string(self)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::frame::Frame;

	#[test]
	fn test_event_wire_shape() {
		let mut context = Map::new();
		context.insert("order".to_string(), JsonValue::from(42));

		let payload = EventPayload::new("boom")
			.with_severity(Some(Severity::Error))
			.with_backtrace(Stacktrace::from(vec![Frame::new("src/lib.rs", 7)]))
			.with_release("1.2.3")
			.with_context(context);
		let event = Event::new("token-123", payload);

		let json: JsonValue = serde_json::from_str(&event.to_json().unwrap()).unwrap();
		assert_eq!(json["token"], "token-123");
		assert_eq!(json["catcherType"], "errors/rust");
		assert_eq!(json["payload"]["title"], "boom");
		assert_eq!(json["payload"]["type"], "error");
		assert_eq!(json["payload"]["description"], "");
		assert_eq!(json["payload"]["backtrace"][0]["file"], "src/lib.rs");
		assert_eq!(json["payload"]["release"], "1.2.3");
		assert!(json["payload"]["addons"].is_object());
		assert!(json["payload"]["user"].is_object());
		assert_eq!(json["payload"]["context"]["order"], 42);
	}

	#[test]
	fn test_missing_severity_is_null() {
		let json = serde_json::to_value(EventPayload::new("x")).unwrap();
		assert!(json["type"].is_null());
	}

	#[test]
	fn test_with_methods_leave_other_fields() {
		let payload = EventPayload::new("first").with_release("r1");
		let updated = payload.clone().with_title("second");
		assert_eq!(payload.title(), "first");
		assert_eq!(updated.title(), "second");
		assert_eq!(updated.release(), "r1");
	}
}
