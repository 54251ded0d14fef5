// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Call stack capture for Rust code.

use backtrace::Backtrace;
use hawk_catcher_core::RawFrame;
use rustc_demangle::demangle;

/// Prefixes of frames belonging to the capture machinery itself.
const CAPTURE_PREFIXES: &[&str] = &[
	"backtrace::",
	"<backtrace::",
	"hawk_catcher::",
	"<hawk_catcher::",
];

/// Capture the current call stack, most recent call first.
///
/// Leading frames from the capture machinery are skipped. Frames without
/// symbol information are kept with whatever is known, so the stack
/// normalizer can drop the ones lacking a location.
pub fn capture_raw_frames() -> Vec<RawFrame> {
	let backtrace = Backtrace::new();
	let frames = backtrace
		.frames()
		.iter()
		.flat_map(|frame| frame.symbols())
		.map(|symbol| {
			let function = symbol.name().map(|name| match name.as_str() {
				Some(raw) => format!("{:#}", demangle(raw)),
				None => format!("{name:#}"),
			});
			RawFrame {
				file: symbol.filename().map(|p| p.display().to_string()),
				line: symbol.lineno(),
				function,
				..RawFrame::default()
			}
		});

	frames
		.skip_while(|frame| frame.function.as_deref().is_some_and(is_capture_frame))
		.collect()
}

fn is_capture_frame(function: &str) -> bool {
	CAPTURE_PREFIXES.iter().any(|p| function.starts_with(p))
}

/// Module path of a demangled function name.
///
/// e.g., `my_app::handlers::process` -> `my_app::handlers`
pub fn module_of(function: &str) -> Option<&str> {
	function.rfind("::").map(|idx| &function[..idx])
}

/// Determine if a frame is from user application code vs standard library.
pub fn is_in_app_frame(function: &str) -> bool {
	// System/std library prefixes to exclude
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tokio::",
		"<tokio::",
		"futures::",
		"<futures::",
		"tracing::",
		"<tracing::",
		"backtrace::",
		"<backtrace::",
		"hawk_catcher::",
		"<hawk_catcher::",
		"panic_unwind::",
		"<panic_unwind::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
	];

	// Also exclude common runtime functions
	const SYSTEM_CONTAINS: &[&str] = &[
		"::panic::",
		"::panicking::",
		"::thread::",
		"::rt::",
		"::runtime::",
		"::sys_common::",
	];

	if SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p)) {
		return false;
	}

	!SYSTEM_CONTAINS.iter().any(|c| function.contains(c))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_in_app_frame_excludes_std() {
		assert!(!is_in_app_frame("std::panic::panic_any"));
		assert!(!is_in_app_frame("core::panicking::panic"));
		assert!(!is_in_app_frame("alloc::vec::Vec::push"));
		assert!(!is_in_app_frame("tokio::runtime::Runtime::block_on"));
		assert!(!is_in_app_frame("hawk_catcher::client::Catcher::send_event"));
	}

	#[test]
	fn test_is_in_app_frame_includes_user_code() {
		assert!(is_in_app_frame("my_app::main"));
		assert!(is_in_app_frame("billing::invoice::Invoice::total"));
		assert!(is_in_app_frame("foo::bar::baz"));
	}

	#[test]
	fn test_module_of() {
		assert_eq!(module_of("my_app::handlers::process"), Some("my_app::handlers"));
		assert_eq!(module_of("main"), None);
	}

	#[test]
	fn test_capture_skips_capture_frames() {
		// The frames captured depend on compilation mode and debug info
		// availability; only the leading frame is checked.
		let frames = capture_raw_frames();
		if let Some(function) = frames.first().and_then(|f| f.function.as_deref()) {
			assert!(!function.starts_with("backtrace::"));
		}
	}
}
