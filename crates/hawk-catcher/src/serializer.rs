// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON-safe rendering of captured runtime values.

use hawk_catcher_core::Value;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

/// Deepest nesting the encoder accepts. Anything deeper fails to encode.
pub const MAX_DEPTH: usize = 512;

/// Turns captured values into JSON text for frame arguments.
///
/// Serialization never fails the caller: a value that cannot be encoded
/// (too deeply nested, non-finite float) becomes an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer;

impl ValueSerializer {
	pub fn new() -> Self {
		Self
	}

	/// Renders `value` as JSON text, or `""` if it cannot be encoded.
	pub fn serialize(&self, value: &Value) -> String {
		match self.to_json(value) {
			Some(json) => serde_json::to_string(&json).unwrap_or_else(|e| {
				debug!(error = %e, "Failed to encode value");
				String::new()
			}),
			None => String::new(),
		}
	}

	/// Converts `value` into a JSON tree, or `None` if it cannot be encoded.
	pub fn to_json(&self, value: &Value) -> Option<JsonValue> {
		let json = convert(value, 1);
		if json.is_none() {
			debug!(kind = value.kind(), "Value cannot be encoded");
		}
		json
	}
}

fn convert(value: &Value, depth: usize) -> Option<JsonValue> {
	let json = match value {
		Value::Null => JsonValue::Null,
		Value::Bool(b) => JsonValue::Bool(*b),
		Value::Int(i) => JsonValue::Number((*i).into()),
		Value::Float(f) => JsonValue::Number(Number::from_f64(*f)?),
		Value::String(s) => JsonValue::String(s.clone()),
		Value::Closure => JsonValue::String("Closure".to_string()),
		Value::Object(type_name) => JsonValue::String(type_name.clone()),
		Value::Resource => JsonValue::String("Resource".to_string()),
		Value::List(items) => {
			if depth > MAX_DEPTH {
				return None;
			}
			JsonValue::Array(
				items
					.iter()
					.map(|item| convert(item, depth + 1))
					.collect::<Option<Vec<_>>>()?,
			)
		}
		Value::Map(entries) => {
			if depth > MAX_DEPTH {
				return None;
			}
			let mut map = Map::with_capacity(entries.len());
			for (key, item) in entries {
				map.insert(key.clone(), convert(item, depth + 1)?);
			}
			JsonValue::Object(map)
		}
	};
	Some(json)
}
