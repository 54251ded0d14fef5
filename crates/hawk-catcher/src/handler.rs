// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fault interception: the handlers a [`Catcher`] registers with its host
//! runtime.
//!
//! Each handler remembers the hook it displaced and chains to it after
//! reporting. Hooks in a chain run in order and stop at the first one that
//! absorbs the fault.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hawk_catcher_core::{ErrorLevel, Exception, ExceptionId, Fault, RaisedError};
use parking_lot::RwLock;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::backtrace::capture_raw_frames;
use crate::client::{Catcher, CatcherInner, Delivery};
use crate::payload_builder::EventData;
use crate::runtime::{ErrorHook, ExceptionHook, HookOutcome};

/// How many times a chained hook may raise a new exception before the
/// handler stops following.
pub const MAX_RERAISE_DEPTH: usize = 32;

/// What the exception handler did with an exception.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
	/// Reported; nothing further to do.
	Reported(ExceptionId),
	/// A chained hook raised this exception back after it was reported. The
	/// host should let it propagate; the fatal handler is disarmed so the
	/// runtime's termination does not report it a second time.
	///
	/// When a hook first raised a different exception, this is the one that
	/// finally came back, not the exception originally handled.
	AlreadyReported(Exception),
}

impl Disposition {
	pub fn id(&self) -> ExceptionId {
		match self {
			Self::Reported(id) => *id,
			Self::AlreadyReported(exception) => exception.id(),
		}
	}
}

/// Ordered hooks invoked after the catcher's own handling.
pub(crate) struct HookChain<H> {
	hooks: RwLock<Vec<H>>,
}

impl<H: Clone> HookChain<H> {
	fn push(&self, hook: H) {
		self.hooks.write().push(hook);
	}

	fn snapshot(&self) -> Vec<H> {
		self.hooks.read().clone()
	}
}

impl<H> Default for HookChain<H> {
	fn default() -> Self {
		Self {
			hooks: RwLock::new(Vec::new()),
		}
	}
}

impl HookChain<ErrorHook> {
	/// Returns true once a hook absorbs the error.
	fn dispatch(&self, error: &RaisedError) -> bool {
		self.snapshot().iter().any(|hook| hook(error))
	}
}

impl HookChain<ExceptionHook> {
	fn dispatch(&self, exception: &Exception) -> HookOutcome {
		for hook in self.snapshot() {
			match hook(exception) {
				HookOutcome::Declined => continue,
				outcome => return outcome,
			}
		}
		HookOutcome::Declined
	}
}

/// Registration flags and hook chains of one catcher.
#[derive(Default)]
pub(crate) struct HandlerState {
	error_registered: AtomicBool,
	exception_registered: AtomicBool,
	fatal_registered: AtomicBool,
	fatal_disarmed: AtomicBool,
	error_chain: HookChain<ErrorHook>,
	exception_chain: HookChain<ExceptionHook>,
}

impl Catcher {
	/// Installs the raised-error handler. Calling it again does nothing.
	pub fn register_error_handler(&self) {
		if self.inner.state.error_registered.swap(true, Ordering::SeqCst) {
			return;
		}

		let weak = Arc::downgrade(&self.inner);
		let hook: ErrorHook = Arc::new(move |error: &RaisedError| match weak.upgrade() {
			Some(inner) => inner.handle_error(error),
			None => false,
		});
		if let Some(previous) = self.inner.runtime.set_error_hook(hook) {
			self.inner.state.error_chain.push(previous);
		}
		debug!("Error handler registered");
	}

	/// Installs the uncaught-exception handler. Calling it again does nothing.
	pub fn register_exception_handler(&self) {
		if self.inner.state.exception_registered.swap(true, Ordering::SeqCst) {
			return;
		}

		let weak = Arc::downgrade(&self.inner);
		let hook: ExceptionHook = Arc::new(move |exception: &Exception| match weak.upgrade() {
			Some(inner) => match inner.handle_exception(exception, Map::new()) {
				Disposition::Reported(_) => HookOutcome::Absorbed,
				Disposition::AlreadyReported(raised) => HookOutcome::Raised(raised),
			},
			None => HookOutcome::Declined,
		});
		if let Some(previous) = self.inner.runtime.set_exception_hook(hook) {
			self.inner.state.exception_chain.push(previous);
		}
		debug!("Exception handler registered");
	}

	/// Installs the shutdown handler. Calling it again does nothing.
	pub fn register_fatal_handler(&self) {
		if self.inner.state.fatal_registered.swap(true, Ordering::SeqCst) {
			return;
		}

		let weak = Arc::downgrade(&self.inner);
		self.inner.runtime.register_shutdown(Arc::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.handle_fatal();
			}
		}));
		debug!("Fatal handler registered");
	}

	/// Appends a hook to run after the catcher handles a raised error.
	pub fn chain_error_hook(&self, hook: ErrorHook) {
		self.inner.state.error_chain.push(hook);
	}

	/// Appends a hook to run after the catcher handles an exception.
	pub fn chain_exception_hook(&self, hook: ExceptionHook) {
		self.inner.state.exception_chain.push(hook);
	}

	/// Handles a raised runtime error. Returns true if a chained hook
	/// absorbed it.
	pub fn handle_error(&self, error: &RaisedError) -> bool {
		self.inner.handle_error(error)
	}

	/// Reports an exception and hands it down the hook chain.
	pub fn handle_exception(&self, exception: &Exception, context: Map<String, JsonValue>) -> Disposition {
		self.inner.handle_exception(exception, context)
	}

	/// Reports the runtime's last error at shutdown, if it is fatal and was
	/// not already reported as an exception.
	pub fn handle_fatal(&self) -> Option<Delivery> {
		self.inner.handle_fatal()
	}

	/// Returns true once an exception re-raised through the chain has
	/// disarmed the fatal handler.
	pub fn is_fatal_disarmed(&self) -> bool {
		self.inner.state.fatal_disarmed.load(Ordering::SeqCst)
	}
}

impl CatcherInner {
	fn handle_error(&self, error: &RaisedError) -> bool {
		if self.should_capture(error.level) {
			let fault = Fault::from(error.clone());
			let exception = fault.exception().with_trace(capture_raw_frames());
			self.capture(
				EventData::new()
					.title(fault.title())
					.severity(fault.severity())
					.exception(exception),
			);
		} else {
			debug!(level = %error.level, "Error filtered out");
		}

		self.state.error_chain.dispatch(error)
	}

	/// Silenced levels (outside the host's reporting mask) are skipped unless
	/// configured otherwise. Fatal-class levels are never silenced.
	fn should_capture(&self, level: ErrorLevel) -> bool {
		let filter = self.options.error_types().unwrap_or(ErrorLevel::ALL);
		if !filter.intersects(level) {
			return false;
		}

		let silenced = !level.is_fatal() && !self.runtime.error_reporting().intersects(level);
		!silenced || self.options.capture_silenced_errors()
	}

	fn handle_exception(&self, exception: &Exception, context: Map<String, JsonValue>) -> Disposition {
		self.process_exception(exception, context, 0)
	}

	fn process_exception(
		&self,
		exception: &Exception,
		context: Map<String, JsonValue>,
		depth: usize,
	) -> Disposition {
		let fault = Fault::from(exception.clone());
		self.capture(
			EventData::new()
				.severity(fault.severity())
				.exception(fault.exception())
				.context(context.clone()),
		);

		match self.state.exception_chain.dispatch(exception) {
			HookOutcome::Raised(raised) if raised.is_same(exception) => {
				self.state.fatal_disarmed.store(true, Ordering::SeqCst);
				debug!(id = %exception.id(), "Exception raised back by chained hook");
				Disposition::AlreadyReported(raised)
			}
			HookOutcome::Raised(raised) if depth < MAX_RERAISE_DEPTH => {
				self.process_exception(&raised, context, depth + 1)
			}
			HookOutcome::Raised(raised) => {
				warn!(id = %raised.id(), depth, "Too many exceptions raised by chained hooks");
				Disposition::Reported(exception.id())
			}
			HookOutcome::Absorbed | HookOutcome::Declined => Disposition::Reported(exception.id()),
		}
	}

	fn handle_fatal(&self) -> Option<Delivery> {
		if self.state.fatal_disarmed.load(Ordering::SeqCst) {
			debug!("Fatal handler disarmed");
			return None;
		}

		// Non-fatal levels already went through the error handler.
		let error = self.runtime.last_error().filter(|e| e.level.is_fatal())?;
		let fault = Fault::FatalTermination {
			message: error.message,
			file: error.file,
			line: error.line,
			kind: error.level,
		};

		Some(self.capture(
			EventData::new()
				.title(fault.title())
				.severity(fault.severity())
				.exception(fault.exception()),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Result;
	use crate::options::Options;
	use crate::runtime::{HostRuntime, ProcessRuntime};
	use crate::transport::Transport;
	use hawk_catcher_core::{Event, Severity};
	use parking_lot::Mutex;
	use std::sync::atomic::AtomicUsize;

	#[derive(Default)]
	struct RecordingTransport {
		events: Mutex<Vec<Event>>,
	}

	impl RecordingTransport {
		fn titles(&self) -> Vec<String> {
			self.events
				.lock()
				.iter()
				.map(|e| e.payload.title().to_string())
				.collect()
		}
	}

	impl Transport for RecordingTransport {
		fn send(&self, event: &Event) -> Result<Option<JsonValue>> {
			self.events.lock().push(event.clone());
			Ok(None)
		}
	}

	fn setup(options: Options) -> (Catcher, ProcessRuntime, Arc<RecordingTransport>) {
		let runtime = ProcessRuntime::isolated();
		let transport = Arc::new(RecordingTransport::default());
		let catcher = Catcher::builder()
			.options(options)
			.runtime(Arc::new(runtime.clone()))
			.transport(transport.clone())
			.build()
			.unwrap();
		(catcher, runtime, transport)
	}

	fn default_options() -> Options {
		Options::builder().integration_token("token").build().unwrap()
	}

	#[test]
	fn test_registration_idempotent() {
		let (catcher, runtime, _) = setup(default_options());
		let previous_calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&previous_calls);
		runtime.set_error_hook(Arc::new(move |_: &RaisedError| {
			counter.fetch_add(1, Ordering::SeqCst);
			false
		}));

		catcher.register_error_handler();
		catcher.register_error_handler();

		runtime.trigger_error(ErrorLevel::WARNING, "disk almost full");
		assert_eq!(previous_calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_error_reported_with_severity() {
		let (catcher, runtime, transport) = setup(default_options());
		catcher.enable_handlers();

		assert!(!runtime.trigger_error(ErrorLevel::USER_WARNING, "deprecated call"));
		let events = transport.events.lock();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].payload.title(), "deprecated call");
		assert_eq!(events[0].payload.severity(), Some(Severity::Warning));
		assert_eq!(events[0].payload.backtrace().top().unwrap().file, file!());
	}

	#[test]
	fn test_previous_error_hook_result_returned() {
		let (catcher, runtime, transport) = setup(default_options());
		runtime.set_error_hook(Arc::new(|_: &RaisedError| true));
		catcher.register_error_handler();

		assert!(runtime.trigger_error(ErrorLevel::NOTICE, "undefined index"));
		assert_eq!(transport.titles(), vec!["undefined index"]);
	}

	#[test]
	fn test_error_chain_short_circuits() {
		let (catcher, runtime, _) = setup(default_options());
		catcher.register_error_handler();
		let later = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&later);
		catcher.chain_error_hook(Arc::new(|_: &RaisedError| true));
		catcher.chain_error_hook(Arc::new(move |_: &RaisedError| {
			counter.fetch_add(1, Ordering::SeqCst);
			true
		}));

		assert!(runtime.trigger_error(ErrorLevel::NOTICE, "n"));
		assert_eq!(later.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn test_silenced_error_skipped() {
		let (catcher, runtime, transport) = setup(default_options());
		catcher.register_error_handler();
		runtime.set_error_reporting(ErrorLevel::ALL - ErrorLevel::NOTICE);

		runtime.trigger_error(ErrorLevel::NOTICE, "quiet");
		runtime.trigger_error(ErrorLevel::WARNING, "loud");
		assert_eq!(transport.titles(), vec!["loud"]);
	}

	#[test]
	fn test_silenced_error_captured_when_configured() {
		let options = Options::builder()
			.integration_token("token")
			.capture_silenced_errors(true)
			.build()
			.unwrap();
		let (catcher, runtime, transport) = setup(options);
		catcher.register_error_handler();
		runtime.set_error_reporting(ErrorLevel::empty());

		runtime.trigger_error(ErrorLevel::NOTICE, "quiet");
		assert_eq!(transport.titles(), vec!["quiet"]);
	}

	#[test]
	fn test_error_types_filter() {
		let options = Options::builder()
			.integration_token("token")
			.error_types(ErrorLevel::WARNING)
			.build()
			.unwrap();
		let (catcher, _, transport) = setup(options);

		assert!(!catcher.handle_error(&RaisedError::new(ErrorLevel::NOTICE, "n", "a.rs", 1)));
		catcher.handle_error(&RaisedError::new(ErrorLevel::WARNING, "w", "a.rs", 2));
		assert_eq!(transport.titles(), vec!["w"]);
	}

	#[test]
	fn test_fatal_level_never_silenced() {
		let (catcher, runtime, transport) = setup(default_options());
		runtime.set_error_reporting(ErrorLevel::empty());

		catcher.handle_error(&RaisedError::new(ErrorLevel::ERROR, "fatal", "a.rs", 1));
		assert_eq!(transport.titles(), vec!["fatal"]);
	}

	#[test]
	fn test_exception_reported_once_and_absorbed() {
		let (catcher, runtime, transport) = setup(default_options());
		catcher.enable_handlers();

		let outcome = runtime.raise(Exception::at("LogicError", "bad state", "a.rs", 3));
		assert_eq!(outcome, HookOutcome::Absorbed);
		runtime.shutdown();

		assert_eq!(transport.titles(), vec!["bad state"]);
	}

	#[test]
	fn test_rethrown_exception_reported_once() {
		let (catcher, runtime, transport) = setup(default_options());
		runtime.set_exception_hook(Arc::new(|e: &Exception| HookOutcome::Raised(e.clone())));
		catcher.enable_handlers();

		let exception = Exception::at("LogicError", "bad state", "a.rs", 3);
		let outcome = runtime.raise(exception.clone());
		assert!(matches!(outcome, HookOutcome::Raised(e) if e.is_same(&exception)));
		assert!(catcher.is_fatal_disarmed());

		// The runtime recorded the uncaught exception as a fatal error.
		assert!(runtime.last_error().is_some());
		runtime.shutdown();
		assert_eq!(transport.titles(), vec!["bad state"]);
	}

	#[test]
	fn test_already_reported_disposition() {
		let (catcher, _, _) = setup(default_options());
		catcher.chain_exception_hook(Arc::new(|e: &Exception| HookOutcome::Raised(e.clone())));

		let exception = Exception::at("E", "m", "a.rs", 1);
		let disposition = catcher.handle_exception(&exception, Map::new());
		assert_eq!(disposition.id(), exception.id());
		assert!(matches!(disposition, Disposition::AlreadyReported(e) if e.is_same(&exception)));
	}

	#[test]
	fn test_different_exception_processed_recursively() {
		let (catcher, _, transport) = setup(default_options());
		let raised = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&raised);
		catcher.chain_exception_hook(Arc::new(move |_: &Exception| {
			if flag.swap(true, Ordering::SeqCst) {
				HookOutcome::Declined
			} else {
				HookOutcome::Raised(Exception::at("Wrapped", "second", "b.rs", 2))
			}
		}));

		let disposition = catcher.handle_exception(&Exception::at("E", "first", "a.rs", 1), Map::new());
		assert!(matches!(disposition, Disposition::Reported(_)));
		assert_eq!(transport.titles(), vec!["first", "second"]);
		assert!(!catcher.is_fatal_disarmed());
	}

	#[test]
	fn test_reraised_replacement_propagates_to_host() {
		let (catcher, runtime, transport) = setup(default_options());
		let replacement = Exception::at("Wrapped", "second", "b.rs", 2);
		let raised = replacement.clone();
		runtime.set_exception_hook(Arc::new(move |e: &Exception| {
			if e.is_same(&raised) {
				HookOutcome::Raised(e.clone())
			} else {
				HookOutcome::Raised(raised.clone())
			}
		}));
		catcher.enable_handlers();

		let outcome = runtime.raise(Exception::at("E", "first", "a.rs", 1));
		assert!(matches!(outcome, HookOutcome::Raised(e) if e.is_same(&replacement)));
		assert!(catcher.is_fatal_disarmed());
		assert_eq!(runtime.last_error().unwrap().message, "Uncaught Wrapped: second");

		runtime.shutdown();
		assert_eq!(transport.titles(), vec!["first", "second"]);
	}

	#[test]
	fn test_before_send_applies_to_handled_faults() {
		let options = Options::builder()
			.integration_token("token")
			.before_send(|payload| {
				if payload.title() == "drop me" {
					None
				} else {
					Some(payload.with_title("rewritten"))
				}
			})
			.build()
			.unwrap();
		let (catcher, runtime, transport) = setup(options);
		catcher.enable_handlers();

		runtime.trigger_error(ErrorLevel::WARNING, "drop me");
		runtime.raise(Exception::at("LogicError", "bad state", "a.rs", 3));
		runtime.trigger_error(ErrorLevel::ERROR, "out of memory");
		runtime.shutdown();

		assert_eq!(transport.titles(), vec!["rewritten", "rewritten"]);
	}

	#[test]
	fn test_endless_reraise_is_capped() {
		let (catcher, _, transport) = setup(default_options());
		catcher.chain_exception_hook(Arc::new(|_: &Exception| {
			HookOutcome::Raised(Exception::at("Again", "again", "a.rs", 1))
		}));

		catcher.handle_exception(&Exception::at("E", "first", "a.rs", 1), Map::new());
		assert_eq!(transport.events.lock().len(), MAX_RERAISE_DEPTH + 1);
	}

	#[test]
	fn test_exception_context_attached() {
		let (catcher, _, transport) = setup(default_options());
		let mut context = Map::new();
		context.insert("job".to_string(), JsonValue::from("import"));

		catcher.handle_exception(&Exception::at("E", "m", "a.rs", 1), context);
		assert_eq!(transport.events.lock()[0].payload.context()["job"], "import");
	}

	#[test]
	fn test_fatal_reported_at_shutdown() {
		let (catcher, runtime, transport) = setup(default_options());
		catcher.enable_handlers();

		runtime.trigger_error(ErrorLevel::ERROR, "Allowed memory size exhausted");
		runtime.shutdown();

		let events = transport.events.lock();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].payload.title(), "Allowed memory size exhausted");
		assert_eq!(events[0].payload.severity(), Some(Severity::Fatal));
	}

	#[test]
	fn test_fatal_ignores_non_fatal_last_error() {
		let (catcher, runtime, transport) = setup(default_options());
		catcher.register_fatal_handler();

		runtime.trigger_error(ErrorLevel::WARNING, "w");
		assert!(catcher.handle_fatal().is_none());
		assert!(transport.events.lock().is_empty());
	}

	#[test]
	fn test_fatal_without_error_is_noop() {
		let (catcher, _, transport) = setup(default_options());
		assert!(catcher.handle_fatal().is_none());
		assert!(transport.events.lock().is_empty());
	}
}
