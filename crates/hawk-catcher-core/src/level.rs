// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime error levels and the reporting bitmask built from them.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

bitflags! {
	/// Class of a raised runtime error.
	///
	/// The bit values follow the classic `E_*` error constants so masks coming
	/// from configuration files keep their meaning.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct ErrorLevel: u32 {
		const ERROR = 1;
		const WARNING = 1 << 1;
		const PARSE = 1 << 2;
		const NOTICE = 1 << 3;
		const CORE_ERROR = 1 << 4;
		const CORE_WARNING = 1 << 5;
		const COMPILE_ERROR = 1 << 6;
		const COMPILE_WARNING = 1 << 7;
		const USER_ERROR = 1 << 8;
		const USER_WARNING = 1 << 9;
		const USER_NOTICE = 1 << 10;
		const STRICT = 1 << 11;
		const RECOVERABLE_ERROR = 1 << 12;
		const DEPRECATED = 1 << 13;
		const USER_DEPRECATED = 1 << 14;
	}
}

const NAMES: &[(&str, ErrorLevel)] = &[
	("E_ERROR", ErrorLevel::ERROR),
	("E_WARNING", ErrorLevel::WARNING),
	("E_PARSE", ErrorLevel::PARSE),
	("E_NOTICE", ErrorLevel::NOTICE),
	("E_CORE_ERROR", ErrorLevel::CORE_ERROR),
	("E_CORE_WARNING", ErrorLevel::CORE_WARNING),
	("E_COMPILE_ERROR", ErrorLevel::COMPILE_ERROR),
	("E_COMPILE_WARNING", ErrorLevel::COMPILE_WARNING),
	("E_USER_ERROR", ErrorLevel::USER_ERROR),
	("E_USER_WARNING", ErrorLevel::USER_WARNING),
	("E_USER_NOTICE", ErrorLevel::USER_NOTICE),
	("E_STRICT", ErrorLevel::STRICT),
	("E_RECOVERABLE_ERROR", ErrorLevel::RECOVERABLE_ERROR),
	("E_DEPRECATED", ErrorLevel::DEPRECATED),
	("E_USER_DEPRECATED", ErrorLevel::USER_DEPRECATED),
	("E_ALL", ErrorLevel::ALL),
];

impl ErrorLevel {
	/// Every level.
	pub const ALL: Self = Self::all();

	/// Levels that terminate the process and can never be silenced.
	pub const FATAL: Self = Self::ERROR
		.union(Self::PARSE)
		.union(Self::CORE_ERROR)
		.union(Self::CORE_WARNING)
		.union(Self::COMPILE_ERROR)
		.union(Self::COMPILE_WARNING);

	/// Returns true if any bit of this level is fatal-class.
	pub fn is_fatal(&self) -> bool {
		self.intersects(Self::FATAL)
	}

	/// Human readable label, used as the type name of synthesized exceptions.
	pub fn label(&self) -> &'static str {
		if self.contains(Self::PARSE) {
			"Parse error"
		} else if self.intersects(Self::FATAL) {
			"Fatal error"
		} else if self.intersects(Self::WARNING | Self::USER_WARNING) {
			"Warning"
		} else if self.intersects(Self::NOTICE | Self::USER_NOTICE) {
			"Notice"
		} else if self.intersects(Self::DEPRECATED | Self::USER_DEPRECATED) {
			"Deprecated"
		} else if self.contains(Self::STRICT) {
			"Strict standards"
		} else {
			"Error"
		}
	}
}

impl Default for ErrorLevel {
	fn default() -> Self {
		Self::ALL
	}
}

impl fmt::Display for ErrorLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if *self == Self::ALL {
			return write!(f, "E_ALL");
		}

		let mut first = true;
		for (name, level) in NAMES.iter().filter(|(_, l)| *l != Self::ALL) {
			if self.contains(*level) {
				if !first {
					write!(f, " | ")?;
				}
				write!(f, "{name}")?;
				first = false;
			}
		}

		if first {
			write!(f, "0")?;
		}
		Ok(())
	}
}

impl FromStr for ErrorLevel {
	type Err = CoreError;

	/// Parses `E_WARNING | E_NOTICE` style expressions or a plain integer mask.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if let Ok(bits) = trimmed.parse::<u32>() {
			return Ok(Self::from_bits_truncate(bits));
		}

		let mut level = Self::empty();
		for part in trimmed.split('|') {
			let part = part.trim();
			let found = NAMES
				.iter()
				.find(|(name, _)| name.eq_ignore_ascii_case(part))
				.map(|(_, l)| *l)
				.ok_or_else(|| CoreError::InvalidErrorLevel(part.to_string()))?;
			level |= found;
		}
		Ok(level)
	}
}

impl Serialize for ErrorLevel {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u32(self.bits())
	}
}

impl<'de> Deserialize<'de> for ErrorLevel {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		u32::deserialize(deserializer).map(Self::from_bits_truncate)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_all_matches_classic_mask() {
		assert_eq!(ErrorLevel::ALL.bits(), 32767);
	}

	#[test]
	fn test_fatal_levels() {
		assert!(ErrorLevel::ERROR.is_fatal());
		assert!(ErrorLevel::COMPILE_WARNING.is_fatal());
		assert!(!ErrorLevel::WARNING.is_fatal());
		assert!(!ErrorLevel::USER_ERROR.is_fatal());
	}

	#[test]
	fn test_parse_expression() {
		let level: ErrorLevel = "E_WARNING | E_NOTICE".parse().unwrap();
		assert_eq!(level, ErrorLevel::WARNING | ErrorLevel::NOTICE);

		let level: ErrorLevel = "11".parse().unwrap();
		assert_eq!(
			level,
			ErrorLevel::ERROR | ErrorLevel::WARNING | ErrorLevel::NOTICE
		);
	}

	#[test]
	fn test_parse_unknown_name_fails() {
		let result = "E_BOGUS".parse::<ErrorLevel>();
		assert!(matches!(result, Err(CoreError::InvalidErrorLevel(_))));
	}

	#[test]
	fn test_serde_as_integer() {
		let json = serde_json::to_string(&(ErrorLevel::WARNING | ErrorLevel::PARSE)).unwrap();
		assert_eq!(json, "6");
		let back: ErrorLevel = serde_json::from_str("6").unwrap();
		assert_eq!(back, ErrorLevel::WARNING | ErrorLevel::PARSE);
	}

	#[test]
	fn test_labels() {
		assert_eq!(ErrorLevel::USER_WARNING.label(), "Warning");
		assert_eq!(ErrorLevel::PARSE.label(), "Parse error");
		assert_eq!(ErrorLevel::CORE_ERROR.label(), "Fatal error");
		assert_eq!(ErrorLevel::RECOVERABLE_ERROR.label(), "Error");
	}

	proptest! {
		#[test]
		fn error_level_display_roundtrip(bits in 1u32..32767) {
			let level = ErrorLevel::from_bits_truncate(bits);
			let parsed: ErrorLevel = level.to_string().parse().unwrap();
			prop_assert_eq!(level, parsed);
		}
	}
}
