// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack normalization: raw call stacks into ordered, enriched frames.

use std::sync::Arc;

use hawk_catcher_core::{Exception, Frame, RawFrame, Stacktrace};
use serde_json::{Map, Value as JsonValue};

use crate::backtrace::{is_in_app_frame, module_of};
use crate::namer::{resolve_names, FrameNamer, PositionalNamer};
use crate::serializer::ValueSerializer;
use crate::source::SourceContextReader;

/// Most arguments rendered per frame.
pub const MAX_ARGUMENTS: usize = 10;

/// Builds wire stacktraces from raw call stacks.
#[derive(Clone)]
pub struct StacktraceNormalizer {
	source: SourceContextReader,
	namer: Arc<dyn FrameNamer>,
	serializer: ValueSerializer,
}

impl StacktraceNormalizer {
	pub fn new(namer: Arc<dyn FrameNamer>) -> Self {
		Self {
			source: SourceContextReader::default(),
			namer,
			serializer: ValueSerializer::new(),
		}
	}

	pub fn with_source_reader(mut self, source: SourceContextReader) -> Self {
		self.source = source;
		self
	}

	/// Builds the stacktrace of an exception, fault site first.
	///
	/// The raw stack is walked from the outermost call inwards. Frames without
	/// a file are skipped. The first frame sitting exactly at the fault
	/// location ends the walk: it and everything inside it (dispatch and
	/// unwinding machinery) are dropped, and the fault site is synthesized
	/// as the first frame instead. The fault site borrows the function name
	/// of that matched frame.
	pub fn build_stack(&self, exception: &Exception) -> Stacktrace {
		let (file, line) = (exception.file(), exception.line());

		let mut retained = Vec::new();
		let mut site_function = None;
		for raw in exception.trace().iter().rev() {
			if !raw.has_location() {
				continue;
			}
			if raw.is_at(file, line) {
				site_function = raw.qualified_function();
				break;
			}
			retained.push(raw);
		}

		let mut frames = Vec::with_capacity(retained.len() + 1);
		frames.push(self.site_frame(file, line, site_function));
		frames.extend(retained.into_iter().rev().map(|raw| self.enrich(raw)));
		Stacktrace::from(frames)
	}

	/// Normalizes a raw stack that did not come with an exception.
	///
	/// Every frame is kept in order. No source is read; the callee's
	/// owner and call operator plus up to [`MAX_ARGUMENTS`] argument values
	/// are kept under `additionalData`.
	pub fn normalize(&self, raw: &[RawFrame]) -> Stacktrace {
		raw.iter()
			.map(|frame| {
				let mut additional = Map::new();
				if let Some(class) = &frame.class {
					additional.insert("class".to_string(), JsonValue::from(class.as_str()));
				}
				if let Some(call_type) = &frame.call_type {
					additional.insert("type".to_string(), JsonValue::from(call_type.as_str()));
				}
				if !frame.args.is_empty() {
					let args = frame
						.args
						.iter()
						.take(MAX_ARGUMENTS)
						.map(|v| self.serializer.to_json(v).unwrap_or(JsonValue::Null))
						.collect();
					additional.insert("args".to_string(), JsonValue::Array(args));
				}

				let function = function_name(frame);
				describe_function(function.as_deref(), &mut additional);

				Frame {
					file: frame.file.clone().unwrap_or_default(),
					line: frame.line.unwrap_or(0),
					column: None,
					source_code: None,
					function,
					arguments: Vec::new(),
					additional_data: sanitize_keys(additional),
				}
			})
			.collect::<Vec<_>>()
			.into()
	}

	fn site_frame(&self, file: &str, line: u32, function: Option<String>) -> Frame {
		let mut additional = Map::new();
		describe_function(function.as_deref(), &mut additional);

		Frame {
			source_code: Some(self.source.read(file, line)),
			function,
			additional_data: additional,
			..Frame::new(file, line)
		}
	}

	fn enrich(&self, raw: &RawFrame) -> Frame {
		let file = raw.file.clone().unwrap_or_default();
		let line = raw.line.unwrap_or(0);
		let function = raw.qualified_function();

		let mut additional = Map::new();
		describe_function(function.as_deref(), &mut additional);

		Frame {
			source_code: Some(self.source.read(&file, line)),
			function,
			arguments: self.arguments(raw),
			additional_data: additional,
			..Frame::new(file, line)
		}
	}

	fn arguments(&self, raw: &RawFrame) -> Vec<String> {
		if raw.args.is_empty() {
			return Vec::new();
		}

		let names = resolve_names(self.namer.as_ref(), raw);
		names
			.iter()
			.zip(&raw.args)
			.take(MAX_ARGUMENTS)
			.map(|(name, value)| format!("{} = {}", name, self.serializer.serialize(value)))
			.collect()
	}
}

impl Default for StacktraceNormalizer {
	fn default() -> Self {
		Self::new(Arc::new(PositionalNamer))
	}
}

fn function_name(frame: &RawFrame) -> Option<String> {
	let function = frame.function.as_deref()?;
	match (frame.class.as_deref(), frame.call_type.as_deref()) {
		(Some(class), Some(call_type)) if !class.is_empty() && !call_type.is_empty() => {
			Some(format!("{class}{call_type}{function}"))
		}
		_ => Some(function.to_string()),
	}
}

fn describe_function(function: Option<&str>, additional: &mut Map<String, JsonValue>) {
	let Some(function) = function else {
		return;
	};
	if let Some(module) = module_of(function) {
		additional.insert("module".to_string(), JsonValue::from(module));
	}
	additional.insert("inApp".to_string(), JsonValue::from(is_in_app_frame(function)));
}

/// Rewrites map keys so they are safe for the collector's storage: `.`
/// becomes `_` and a leading `$` becomes `dollar_`. Applied recursively.
pub fn sanitize_keys(map: Map<String, JsonValue>) -> Map<String, JsonValue> {
	map.into_iter()
		.map(|(key, value)| (sanitize_key(&key), sanitize_value(value)))
		.collect()
}

fn sanitize_value(value: JsonValue) -> JsonValue {
	match value {
		JsonValue::Object(map) => JsonValue::Object(sanitize_keys(map)),
		JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(sanitize_value).collect()),
		other => other,
	}
}

fn sanitize_key(key: &str) -> String {
	let key = key.replace('.', "_");
	match key.strip_prefix('$') {
		Some(rest) => format!("dollar_{rest}"),
		None => key,
	}
}
