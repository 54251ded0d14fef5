// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host runtime binding: the hooks a catcher installs into.
//!
//! A host runtime exposes three fault channels: raised errors, uncaught
//! exceptions, and process shutdown. [`ProcessRuntime`] is the in-process
//! implementation; it turns panics into uncaught exceptions.

use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use hawk_catcher_core::{ErrorLevel, Exception, RaisedError};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::panic_hook::install_panic_hook;

/// Hook for raised errors. Returns true if the error was absorbed.
pub type ErrorHook = Arc<dyn Fn(&RaisedError) -> bool + Send + Sync>;

/// Hook for uncaught exceptions.
pub type ExceptionHook = Arc<dyn Fn(&Exception) -> HookOutcome + Send + Sync>;

/// Hook run once at process shutdown.
pub type ShutdownHook = Arc<dyn Fn() + Send + Sync>;

/// What an exception hook did with the exception it was given.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
	/// Fully handled; the runtime should carry on.
	Absorbed,
	/// Not handled; the next hook (or the runtime default) applies.
	Declined,
	/// The hook raised an exception back, possibly the one it was given.
	Raised(Exception),
}

/// Fault channels of a host runtime.
pub trait HostRuntime: Send + Sync {
	/// Levels the host currently reports. Levels outside the mask are
	/// considered silenced.
	fn error_reporting(&self) -> ErrorLevel;

	/// Installs the raised-error hook and returns the one it replaces.
	fn set_error_hook(&self, hook: ErrorHook) -> Option<ErrorHook>;

	/// Installs the uncaught-exception hook and returns the one it replaces.
	fn set_exception_hook(&self, hook: ExceptionHook) -> Option<ExceptionHook>;

	fn register_shutdown(&self, hook: ShutdownHook);

	/// Last error recorded by the runtime, if any.
	fn last_error(&self) -> Option<RaisedError>;
}

static PROCESS: OnceLock<ProcessRuntime> = OnceLock::new();

/// The runtime shared by the whole process. Catchers built without an
/// explicit runtime register their handlers here.
pub fn process_runtime() -> &'static ProcessRuntime {
	PROCESS.get_or_init(ProcessRuntime::new)
}

/// The runtime of the current process.
///
/// Cloning shares the same hooks and state.
#[derive(Clone)]
pub struct ProcessRuntime {
	inner: Arc<RuntimeInner>,
}

pub(crate) struct RuntimeInner {
	reporting: RwLock<ErrorLevel>,
	error_hook: RwLock<Option<ErrorHook>>,
	exception_hook: RwLock<Option<ExceptionHook>>,
	shutdown_hooks: Mutex<Vec<ShutdownHook>>,
	last_error: Mutex<Option<RaisedError>>,
	shut_down: AtomicBool,
	capture_panics: bool,
	panic_hook_installed: AtomicBool,
}

impl ProcessRuntime {
	/// Runtime that also reports panics once an exception hook is set.
	pub fn new() -> Self {
		Self::with_panic_capture(true)
	}

	/// Runtime that never touches the process panic hook.
	pub fn isolated() -> Self {
		Self::with_panic_capture(false)
	}

	fn with_panic_capture(capture_panics: bool) -> Self {
		Self {
			inner: Arc::new(RuntimeInner {
				reporting: RwLock::new(ErrorLevel::ALL),
				error_hook: RwLock::new(None),
				exception_hook: RwLock::new(None),
				shutdown_hooks: Mutex::new(Vec::new()),
				last_error: Mutex::new(None),
				shut_down: AtomicBool::new(false),
				capture_panics,
				panic_hook_installed: AtomicBool::new(false),
			}),
		}
	}

	pub fn set_error_reporting(&self, levels: ErrorLevel) {
		*self.inner.reporting.write() = levels;
	}

	/// Raises a runtime error at the caller's location.
	///
	/// Fatal-class levels are only recorded; they surface at shutdown. Other
	/// levels go to the installed error hook. Returns true if it absorbed
	/// the error.
	#[track_caller]
	pub fn trigger_error(&self, level: ErrorLevel, message: impl Into<String>) -> bool {
		let location = Location::caller();
		let error = RaisedError::new(level, message, location.file(), location.line());
		self.inner.dispatch_error(error)
	}

	/// Hands an uncaught exception to the exception hook.
	///
	/// Unless a hook absorbs it, the runtime records it as a fatal
	/// `Uncaught ...` error.
	pub fn raise(&self, exception: Exception) -> HookOutcome {
		self.inner.dispatch_exception(exception)
	}

	/// Runs shutdown hooks in registration order. Only the first call does
	/// anything.
	pub fn shutdown(&self) {
		self.inner.shutdown();
	}

	/// Guard that runs [`ProcessRuntime::shutdown`] when dropped, e.g. at
	/// the end of `main`.
	#[must_use = "shutdown runs when the guard is dropped"]
	pub fn shutdown_guard(&self) -> ShutdownGuard {
		ShutdownGuard {
			runtime: self.clone(),
		}
	}
}

impl Default for ProcessRuntime {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ProcessRuntime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProcessRuntime")
			.field("reporting", &*self.inner.reporting.read())
			.field("capture_panics", &self.inner.capture_panics)
			.field("shut_down", &self.inner.shut_down.load(Ordering::SeqCst))
			.finish()
	}
}

impl HostRuntime for ProcessRuntime {
	fn error_reporting(&self) -> ErrorLevel {
		*self.inner.reporting.read()
	}

	fn set_error_hook(&self, hook: ErrorHook) -> Option<ErrorHook> {
		self.inner.error_hook.write().replace(hook)
	}

	fn set_exception_hook(&self, hook: ExceptionHook) -> Option<ExceptionHook> {
		let previous = self.inner.exception_hook.write().replace(hook);
		if self.inner.capture_panics && !self.inner.panic_hook_installed.swap(true, Ordering::SeqCst)
		{
			install_panic_hook(Arc::downgrade(&self.inner));
		}
		previous
	}

	fn register_shutdown(&self, hook: ShutdownHook) {
		self.inner.shutdown_hooks.lock().push(hook);
	}

	fn last_error(&self) -> Option<RaisedError> {
		self.inner.last_error.lock().clone()
	}
}

impl RuntimeInner {
	fn dispatch_error(&self, error: RaisedError) -> bool {
		*self.last_error.lock() = Some(error.clone());

		if error.level.is_fatal() {
			debug!(level = %error.level, "Fatal error recorded for shutdown");
			return false;
		}

		let hook = self.error_hook.read().clone();
		match hook {
			Some(hook) => hook(&error),
			None => false,
		}
	}

	pub(crate) fn dispatch_exception(&self, exception: Exception) -> HookOutcome {
		let hook = self.exception_hook.read().clone();
		let outcome = match hook {
			Some(hook) => hook(&exception),
			None => HookOutcome::Declined,
		};

		let uncaught = match &outcome {
			HookOutcome::Absorbed => None,
			HookOutcome::Declined => Some(&exception),
			HookOutcome::Raised(raised) => Some(raised),
		};
		if let Some(uncaught) = uncaught {
			*self.last_error.lock() = Some(RaisedError::new(
				ErrorLevel::ERROR,
				format!("Uncaught {uncaught}"),
				uncaught.file(),
				uncaught.line(),
			));
		}
		outcome
	}

	fn shutdown(&self) {
		if self.shut_down.swap(true, Ordering::SeqCst) {
			return;
		}
		let hooks = std::mem::take(&mut *self.shutdown_hooks.lock());
		for hook in hooks {
			hook();
		}
	}
}

/// Runs runtime shutdown on drop.
pub struct ShutdownGuard {
	runtime: ProcessRuntime,
}

impl Drop for ShutdownGuard {
	fn drop(&mut self) {
		self.runtime.shutdown();
	}
}
