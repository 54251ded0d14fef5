// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack frame types: raw call-stack entries and normalized wire frames.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::value::Value;

/// One entry of a call stack as recorded by the runtime.
///
/// `file`/`line` locate the call site inside `function`. `args` are the
/// values the call was made with; `parameters` carries the declared parameter
/// names when the runtime already knows the callee's signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
	pub file: Option<String>,
	pub line: Option<u32>,
	pub function: Option<String>,
	/// Owning type for methods.
	pub class: Option<String>,
	/// Call operator between class and function (`::`, `->`, `.`).
	pub call_type: Option<String>,
	pub args: Vec<Value>,
	pub parameters: Option<Vec<String>>,
}

impl RawFrame {
	/// Creates a frame for a call site.
	pub fn new(file: impl Into<String>, line: u32) -> Self {
		Self {
			file: Some(file.into()),
			line: Some(line),
			..Self::default()
		}
	}

	pub fn with_function(mut self, function: impl Into<String>) -> Self {
		self.function = Some(function.into());
		self
	}

	pub fn with_method(
		mut self,
		class: impl Into<String>,
		call_type: impl Into<String>,
		function: impl Into<String>,
	) -> Self {
		self.class = Some(class.into());
		self.call_type = Some(call_type.into());
		self.function = Some(function.into());
		self
	}

	pub fn with_args(mut self, args: Vec<Value>) -> Self {
		self.args = args;
		self
	}

	pub fn with_parameters<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
		self.parameters = Some(names.into_iter().map(Into::into).collect());
		self
	}

	/// Returns true if this frame has a usable file location.
	pub fn has_location(&self) -> bool {
		self.file.as_deref().is_some_and(|f| !f.is_empty())
	}

	/// Returns true if this frame sits at `file:line`.
	///
	/// Paths match when equal or when one is a component-wise suffix of the
	/// other, since caller locations are crate-relative while debug info
	/// usually records absolute paths. The shorter path must have at least two
	/// components to match as a suffix; a bare `lib.rs` would otherwise match
	/// every crate root.
	pub fn is_at(&self, file: &str, line: u32) -> bool {
		if self.line != Some(line) {
			return false;
		}
		let Some(own) = self.file.as_deref() else {
			return false;
		};
		if own.is_empty() || file.is_empty() {
			return false;
		}
		own == file || is_path_suffix(own, file) || is_path_suffix(file, own)
	}

	/// Function name qualified with its owning type, e.g. `Cart::add`.
	pub fn qualified_function(&self) -> Option<String> {
		let function = self.function.as_deref()?;
		match self.class.as_deref().filter(|c| !c.is_empty()) {
			Some(class) => Some(format!(
				"{}{}{}",
				class,
				self.call_type.as_deref().unwrap_or("::"),
				function
			)),
			None => Some(function.to_string()),
		}
	}
}

fn is_path_suffix(path: &str, suffix: &str) -> bool {
	let suffix = Path::new(suffix);
	suffix.components().count() >= 2 && Path::new(path).ends_with(suffix)
}

/// A source line near a frame location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
	pub line: u32,
	pub content: String,
}

/// A normalized stack frame in its wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
	pub file: String,
	pub line: u32,
	pub column: Option<u32>,
	/// `None` when no source lookup was attempted.
	pub source_code: Option<Vec<SourceLine>>,
	pub function: Option<String>,
	/// `name = value` strings.
	pub arguments: Vec<String>,
	pub additional_data: Map<String, JsonValue>,
}

impl Frame {
	pub fn new(file: impl Into<String>, line: u32) -> Self {
		Self {
			file: file.into(),
			line,
			..Self::default()
		}
	}
}

/// Ordered frames, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	pub fn len(&self) -> usize {
		self.frames.len()
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	/// The frame the fault was raised at.
	pub fn top(&self) -> Option<&Frame> {
		self.frames.first()
	}
}

impl From<Vec<Frame>> for Stacktrace {
	fn from(frames: Vec<Frame>) -> Self {
		Self { frames }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_qualified_function() {
		let frame = RawFrame::new("cart.rs", 10).with_method("Cart", "->", "add");
		assert_eq!(frame.qualified_function(), Some("Cart->add".to_string()));

		let frame = RawFrame::new("cart.rs", 10).with_function("checkout");
		assert_eq!(frame.qualified_function(), Some("checkout".to_string()));

		assert_eq!(RawFrame::new("cart.rs", 10).qualified_function(), None);
	}

	#[test]
	fn test_is_at_matches_path_suffix() {
		let frame = RawFrame::new("/home/dev/app/src/lib.rs", 42);
		assert!(frame.is_at("src/lib.rs", 42));
		assert!(frame.is_at("/home/dev/app/src/lib.rs", 42));
		assert!(!frame.is_at("src/lib.rs", 43));
		assert!(!frame.is_at("rc/lib.rs", 42));
		assert!(!frame.is_at("", 42));
	}

	#[test]
	fn test_is_at_rejects_bare_file_name_suffix() {
		let frame = RawFrame::new("/home/dev/.cargo/registry/src/serde-1.0/src/lib.rs", 42);
		assert!(!frame.is_at("lib.rs", 42));
		assert!(!RawFrame::new("lib.rs", 42).is_at("/home/dev/app/src/lib.rs", 42));
		assert!(RawFrame::new("lib.rs", 42).is_at("lib.rs", 42));
	}

	#[test]
	fn test_has_location() {
		assert!(RawFrame::new("a.rs", 1).has_location());
		assert!(!RawFrame::default().has_location());
		assert!(!RawFrame::new("", 1).has_location());
	}

	#[test]
	fn test_frame_wire_shape() {
		let frame = Frame {
			source_code: Some(vec![SourceLine {
				line: 3,
				content: "let x = 1;".to_string(),
			}]),
			function: Some("main".to_string()),
			arguments: vec!["a = 1".to_string()],
			..Frame::new("src/main.rs", 3)
		};

		let json = serde_json::to_value(&frame).unwrap();
		assert_eq!(json["file"], "src/main.rs");
		assert_eq!(json["line"], 3);
		assert!(json["column"].is_null());
		assert_eq!(json["sourceCode"][0]["line"], 3);
		assert_eq!(json["sourceCode"][0]["content"], "let x = 1;");
		assert_eq!(json["function"], "main");
		assert_eq!(json["arguments"][0], "a = 1");
		assert!(json["additionalData"].is_object());
	}

	#[test]
	fn test_stacktrace_serializes_as_array() {
		let trace = Stacktrace::from(vec![Frame::new("a.rs", 1), Frame::new("b.rs", 2)]);
		let json = serde_json::to_value(&trace).unwrap();
		assert!(json.is_array());
		assert_eq!(json.as_array().unwrap().len(), 2);
		assert_eq!(trace.top().map(|f| f.line), Some(1));
	}
}
