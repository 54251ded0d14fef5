// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event severity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::level::ErrorLevel;

/// Severity attached to an event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	Debug,
	Info,
	Warning,
	Error,
	Fatal,
}

impl Severity {
	/// Translates a runtime error level into a severity.
	pub fn from_error_level(level: ErrorLevel) -> Self {
		if level.intersects(
			ErrorLevel::DEPRECATED
				| ErrorLevel::USER_DEPRECATED
				| ErrorLevel::WARNING
				| ErrorLevel::USER_WARNING,
		) {
			return Self::Warning;
		}

		if level.is_fatal() {
			return Self::Fatal;
		}

		if level.intersects(ErrorLevel::RECOVERABLE_ERROR | ErrorLevel::USER_ERROR) {
			return Self::Error;
		}

		if level.intersects(ErrorLevel::NOTICE | ErrorLevel::USER_NOTICE | ErrorLevel::STRICT) {
			return Self::Info;
		}

		Self::Error
	}
}

impl From<ErrorLevel> for Severity {
	fn from(level: ErrorLevel) -> Self {
		Self::from_error_level(level)
	}
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
			Self::Fatal => write!(f, "fatal"),
		}
	}
}

impl FromStr for Severity {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warning" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			"fatal" => Ok(Self::Fatal),
			_ => Err(CoreError::InvalidSeverity(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_from_error_level() {
		assert_eq!(Severity::from(ErrorLevel::USER_DEPRECATED), Severity::Warning);
		assert_eq!(Severity::from(ErrorLevel::WARNING), Severity::Warning);
		assert_eq!(Severity::from(ErrorLevel::ERROR), Severity::Fatal);
		assert_eq!(Severity::from(ErrorLevel::CORE_WARNING), Severity::Fatal);
		assert_eq!(Severity::from(ErrorLevel::USER_ERROR), Severity::Error);
		assert_eq!(Severity::from(ErrorLevel::STRICT), Severity::Info);
		assert_eq!(Severity::from(ErrorLevel::empty()), Severity::Error);
	}

	#[test]
	fn test_invalid_severity() {
		assert!(matches!(
			"critical".parse::<Severity>(),
			Err(CoreError::InvalidSeverity(_))
		));
	}

	#[test]
	fn test_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Severity::Fatal).unwrap(), "\"fatal\"");
	}

	proptest! {
		#[test]
		fn severity_roundtrip(severity in prop_oneof![
			Just(Severity::Debug),
			Just(Severity::Info),
			Just(Severity::Warning),
			Just(Severity::Error),
			Just(Severity::Fatal),
		]) {
			let s = severity.to_string();
			let parsed: Severity = s.parse().unwrap();
			prop_assert_eq!(severity, parsed);
		}
	}
}
