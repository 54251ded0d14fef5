// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration: panics become uncaught exceptions.

use std::cell::Cell;
use std::panic::PanicHookInfo;
use std::sync::Weak;

use hawk_catcher_core::Exception;

use crate::backtrace::capture_raw_frames;
use crate::runtime::RuntimeInner;
use crate::transport::DELIVERY_THREAD;

/// Exception type reported for panics.
pub const PANIC_TYPE: &str = "panic";

thread_local! {
	static IN_HOOK: Cell<bool> = const { Cell::new(false) };
}

/// Install a panic hook that raises panics through the runtime's exception
/// hook.
///
/// The existing hook is wrapped and still runs afterwards. A panic raised
/// while reporting a panic on the same thread, or on the delivery thread, is
/// left to the previous hook.
pub(crate) fn install_panic_hook(runtime: Weak<RuntimeInner>) {
	let previous = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		if !is_delivery_thread() && !IN_HOOK.with(|flag| flag.replace(true)) {
			if let Some(runtime) = runtime.upgrade() {
				runtime.dispatch_exception(panic_exception(info));
			}
			IN_HOOK.with(|flag| flag.set(false));
		}

		previous(info);
	}));
}

fn is_delivery_thread() -> bool {
	std::thread::current().name() == Some(DELIVERY_THREAD)
}

/// Converts panic info into an exception located at the panic site.
fn panic_exception(info: &PanicHookInfo<'_>) -> Exception {
	let message = extract_panic_message(info);
	let trace = capture_raw_frames();
	let exception = match info.location() {
		Some(location) => Exception::at(PANIC_TYPE, message, location.file(), location.line()),
		None => Exception::at(PANIC_TYPE, message, "", 0),
	};
	exception.with_trace(trace)
}

/// Extract the panic message from panic info.
fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
