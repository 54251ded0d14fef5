// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source context lookup for stack frames.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hawk_catcher_core::SourceLine;
use tracing::debug;

/// Lines shown on each side of a frame location by default.
pub const DEFAULT_MARGIN: u32 = 5;

/// Reads a window of lines around a `file:line` location.
#[derive(Debug, Clone, Copy)]
pub struct SourceContextReader {
	margin: u32,
}

impl SourceContextReader {
	pub fn new(margin: u32) -> Self {
		Self { margin }
	}

	pub fn margin(&self) -> u32 {
		self.margin
	}

	/// Returns the lines `line - margin ..= line + margin` that exist in
	/// `path`, with line terminators removed.
	///
	/// An unreadable file yields an empty list.
	pub fn read(&self, path: impl AsRef<Path>, line: u32) -> Vec<SourceLine> {
		let path = path.as_ref();
		let file = match File::open(path) {
			Ok(file) => file,
			Err(e) => {
				debug!(path = %path.display(), error = %e, "Source file not readable");
				return Vec::new();
			}
		};

		let first = line.saturating_sub(self.margin).max(1);
		let last = line.saturating_add(self.margin);

		let mut lines = Vec::new();
		for (index, chunk) in BufReader::new(file).split(b'\n').enumerate() {
			let number = u32::try_from(index + 1).unwrap_or(u32::MAX);
			if number < first {
				continue;
			}
			if number > last {
				break;
			}

			let bytes = match chunk {
				Ok(bytes) => bytes,
				Err(e) => {
					debug!(path = %path.display(), error = %e, "Failed to read source line");
					break;
				}
			};

			let content = String::from_utf8_lossy(&bytes).replace(['\r', '\n'], "");
			lines.push(SourceLine {
				line: number,
				content,
			});
		}
		lines
	}
}

impl Default for SourceContextReader {
	fn default() -> Self {
		Self::new(DEFAULT_MARGIN)
	}
}
