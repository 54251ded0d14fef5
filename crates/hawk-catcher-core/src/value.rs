// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Captured runtime values (frame arguments, extra frame data).
//!
//! Values are captured eagerly when a frame is recorded so that nothing in a
//! stacktrace keeps a reference to live host state. Opaque things are reduced
//! to a marker at capture time: callables become [`Value::Closure`], arbitrary
//! objects keep only their type name, and OS handles become
//! [`Value::Resource`].

/// A runtime value as seen by the catcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	/// Sequential collection.
	List(Vec<Value>),
	/// Associative collection; insertion order is preserved.
	Map(Vec<(String, Value)>),
	/// A function or closure.
	Closure,
	/// Any other object, identified by its type name only.
	Object(String),
	/// An external handle such as an open file or socket.
	Resource,
}

impl Value {
	/// Captures an arbitrary value as an opaque object carrying its type name.
	pub fn object_of<T: ?Sized>(value: &T) -> Self {
		Self::Object(std::any::type_name_of_val(value).to_string())
	}

	/// Builds an associative value from key/value pairs.
	pub fn map<K, V, I>(entries: I) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
		I: IntoIterator<Item = (K, V)>,
	{
		Self::Map(
			entries
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}

	/// Short description of the value's kind.
	pub fn kind(&self) -> &str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::List(_) | Self::Map(_) => "array",
			Self::Closure => "Closure",
			Self::Object(name) => name,
			Self::Resource => "resource",
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Self::Int(v.into())
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Self::Int(v)
	}
}

impl From<u32> for Value {
	fn from(v: u32) -> Self {
		Self::Int(v.into())
	}
}

impl From<u64> for Value {
	fn from(v: u64) -> Self {
		match i64::try_from(v) {
			Ok(i) => Self::Int(i),
			Err(_) => Self::Float(v as f64),
		}
	}
}

impl From<usize> for Value {
	fn from(v: usize) -> Self {
		Self::from(v as u64)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Self::Float(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::String(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Self::String(v)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Self::List(v.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(Self::Null)
	}
}

impl From<&std::fs::File> for Value {
	fn from(_: &std::fs::File) -> Self {
		Self::Resource
	}
}

impl From<serde_json::Value> for Value {
	fn from(v: serde_json::Value) -> Self {
		match v {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(b) => Self::Bool(b),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Self::Int(i),
				None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
			},
			serde_json::Value::String(s) => Self::String(s),
			serde_json::Value::Array(items) => {
				Self::List(items.into_iter().map(Self::from).collect())
			}
			serde_json::Value::Object(map) => {
				Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
			}
		}
	}
}
