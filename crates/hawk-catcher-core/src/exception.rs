// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Faults: uncaught exceptions, raised runtime errors and fatal terminations.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::str::FromStr;
use uuid::Uuid;

use crate::frame::RawFrame;
use crate::level::ErrorLevel;
use crate::severity::Severity;

/// Identity of an exception object.
///
/// Clones of an [`Exception`] share the id, so a handler can tell whether a
/// chained hook handed back the very exception it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionId(pub Uuid);

impl ExceptionId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for ExceptionId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ExceptionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ExceptionId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// An exception as seen by the catcher: type, message, origin, the call stack
/// at the point it was raised, and an optional cause.
#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
	id: ExceptionId,
	type_name: String,
	message: String,
	file: String,
	line: u32,
	code: Option<i64>,
	trace: Vec<RawFrame>,
	previous: Option<Box<Exception>>,
}

impl Exception {
	/// Creates an exception located at the caller.
	#[track_caller]
	pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
		let location = Location::caller();
		Self::at(type_name, message, location.file(), location.line())
	}

	/// Creates an exception at an explicit location.
	pub fn at(
		type_name: impl Into<String>,
		message: impl Into<String>,
		file: impl Into<String>,
		line: u32,
	) -> Self {
		Self {
			id: ExceptionId::new(),
			type_name: type_name.into(),
			message: message.into(),
			file: file.into(),
			line,
			code: None,
			trace: Vec::new(),
			previous: None,
		}
	}

	/// Converts an error value and its `source()` chain.
	///
	/// The outer error keeps the concrete type name of `E`; causes reached
	/// through `source()` are only known as trait objects and are named
	/// `Error`.
	#[track_caller]
	pub fn from_error<E: StdError + ?Sized>(error: &E) -> Self {
		let location = Location::caller();
		let mut exception = Self::at(
			std::any::type_name::<E>(),
			error.to_string(),
			location.file(),
			location.line(),
		);

		let mut causes = Vec::new();
		let mut source = error.source();
		while let Some(cause) = source {
			causes.push(Self::at("Error", cause.to_string(), location.file(), location.line()));
			source = cause.source();
		}

		let previous = causes.into_iter().rev().fold(None::<Exception>, |inner, mut cause| {
			cause.previous = inner.map(Box::new);
			Some(cause)
		});
		exception.previous = previous.map(Box::new);
		exception
	}

	pub fn with_code(mut self, code: i64) -> Self {
		self.code = Some(code);
		self
	}

	/// Attaches the raw call stack, most recent call first.
	pub fn with_trace(mut self, trace: Vec<RawFrame>) -> Self {
		self.trace = trace;
		self
	}

	pub fn with_previous(mut self, previous: Exception) -> Self {
		self.previous = Some(Box::new(previous));
		self
	}

	pub fn id(&self) -> ExceptionId {
		self.id
	}

	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn file(&self) -> &str {
		&self.file
	}

	pub fn line(&self) -> u32 {
		self.line
	}

	pub fn code(&self) -> Option<i64> {
		self.code
	}

	pub fn trace(&self) -> &[RawFrame] {
		&self.trace
	}

	pub fn previous(&self) -> Option<&Exception> {
		self.previous.as_deref()
	}

	/// Iterates over the causal chain, not including `self`.
	pub fn causes(&self) -> impl Iterator<Item = &Exception> {
		std::iter::successors(self.previous(), |e| e.previous())
	}

	/// Title used for events: the message, or the type name when empty.
	pub fn title(&self) -> &str {
		if self.message.is_empty() {
			&self.type_name
		} else {
			&self.message
		}
	}

	/// Returns true if `other` is this very exception (same identity).
	pub fn is_same(&self, other: &Exception) -> bool {
		self.id == other.id
	}
}

impl fmt::Display for Exception {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.type_name, self.message)
	}
}

/// A runtime error raised through the host's error channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RaisedError {
	pub level: ErrorLevel,
	pub message: String,
	pub file: String,
	pub line: u32,
}

impl RaisedError {
	pub fn new(
		level: ErrorLevel,
		message: impl Into<String>,
		file: impl Into<String>,
		line: u32,
	) -> Self {
		Self {
			level,
			message: message.into(),
			file: file.into(),
			line,
		}
	}

	/// Wraps the error into an exception so it can go through the stack
	/// builder. The error level is kept as the exception code.
	pub fn to_exception(&self) -> Exception {
		Exception::at(self.level.label(), &self.message, &self.file, self.line)
			.with_code(i64::from(self.level.bits()))
	}
}

/// Anything the catcher reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
	RaisedError(RaisedError),
	UncaughtException(Exception),
	FatalTermination {
		message: String,
		file: String,
		line: u32,
		kind: ErrorLevel,
	},
}

impl Fault {
	pub fn title(&self) -> &str {
		match self {
			Self::RaisedError(error) => &error.message,
			Self::UncaughtException(exception) => exception.title(),
			Self::FatalTermination { message, .. } => message,
		}
	}

	pub fn severity(&self) -> Severity {
		match self {
			Self::RaisedError(error) => Severity::from_error_level(error.level),
			Self::UncaughtException(_) => Severity::Error,
			Self::FatalTermination { .. } => Severity::Fatal,
		}
	}

	/// The exception this fault is reported as.
	pub fn exception(&self) -> Exception {
		match self {
			Self::RaisedError(error) => error.to_exception(),
			Self::UncaughtException(exception) => exception.clone(),
			Self::FatalTermination {
				message,
				file,
				line,
				kind,
			} => RaisedError::new(*kind, message.as_str(), file.as_str(), *line).to_exception(),
		}
	}
}

impl From<Exception> for Fault {
	fn from(exception: Exception) -> Self {
		Self::UncaughtException(exception)
	}
}

impl From<RaisedError> for Fault {
	fn from(error: RaisedError) -> Self {
		Self::RaisedError(error)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[derive(Debug)]
	struct Outer(Inner);

	#[derive(Debug)]
	struct Inner;

	impl fmt::Display for Outer {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "request failed")
		}
	}

	impl fmt::Display for Inner {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "connection reset")
		}
	}

	impl StdError for Outer {
		fn source(&self) -> Option<&(dyn StdError + 'static)> {
			Some(&self.0)
		}
	}

	impl StdError for Inner {}

	#[test]
	fn test_new_records_caller_location() {
		let exception = Exception::new("RuntimeError", "boom");
		assert_eq!(exception.file(), file!());
		assert_eq!(exception.line(), line!() - 2);
	}

	#[test]
	fn test_clone_keeps_identity() {
		let exception = Exception::new("RuntimeError", "boom");
		let copy = exception.clone();
		assert!(exception.is_same(&copy));

		let other = Exception::new("RuntimeError", "boom");
		assert!(!exception.is_same(&other));
	}

	#[test]
	fn test_title_falls_back_to_type() {
		let exception = Exception::new("LogicError", "");
		assert_eq!(exception.title(), "LogicError");
	}

	#[test]
	fn test_from_error_walks_sources() {
		let exception = Exception::from_error(&Outer(Inner));
		assert!(exception.type_name().ends_with("Outer"));
		assert_eq!(exception.message(), "request failed");

		let causes: Vec<_> = exception.causes().map(|c| c.message().to_string()).collect();
		assert_eq!(causes, vec!["connection reset".to_string()]);
	}

	#[test]
	fn test_raised_error_to_exception() {
		let error = RaisedError::new(ErrorLevel::WARNING, "Division by zero", "calc.rs", 12);
		let exception = error.to_exception();
		assert_eq!(exception.type_name(), "Warning");
		assert_eq!(exception.file(), "calc.rs");
		assert_eq!(exception.line(), 12);
		assert_eq!(exception.code(), Some(2));
	}

	#[test]
	fn test_fault_severity() {
		let raised = Fault::from(RaisedError::new(ErrorLevel::NOTICE, "x", "a.rs", 1));
		assert_eq!(raised.severity(), Severity::Info);

		let fatal = Fault::FatalTermination {
			message: "out of memory".to_string(),
			file: "a.rs".to_string(),
			line: 3,
			kind: ErrorLevel::ERROR,
		};
		assert_eq!(fatal.severity(), Severity::Fatal);
		assert_eq!(fatal.title(), "out of memory");
		assert_eq!(fatal.exception().type_name(), "Fatal error");

		let uncaught = Fault::from(Exception::new("E", "m"));
		assert_eq!(uncaught.severity(), Severity::Error);
	}

	proptest! {
		#[test]
		fn exception_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let id = ExceptionId(Uuid::from_bytes(uuid_bytes));
			let parsed: ExceptionId = id.to_string().parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}
}
