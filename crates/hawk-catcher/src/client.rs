// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The catcher: capture pipeline and manual capture API.

use std::error::Error as StdError;
use std::sync::Arc;

use hawk_catcher_core::{Addon, Event, Exception, Severity};
use parking_lot::RwLock;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::addons::AddonRegistry;
use crate::backtrace::capture_raw_frames;
use crate::error::{CatcherSdkError, Result};
use crate::handler::HandlerState;
use crate::namer::{FrameNamer, SignatureNamer};
use crate::options::Options;
use crate::payload_builder::{EventData, EventPayloadBuilder};
use crate::runtime::{process_runtime, HostRuntime};
use crate::source::SourceContextReader;
use crate::stacktrace::StacktraceNormalizer;
use crate::transport::{transport_for, Transport};

/// Outcome of a single capture.
///
/// Captures never fail the caller; this tells what happened to the event.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
	/// Handed to the transport. Holds the decoded collector response, if any.
	Sent(Option<JsonValue>),
	/// Cancelled before delivery, by `before_send` or by the error filter.
	Dropped,
	/// The transport failed. The failure has been logged.
	Failed,
}

impl Delivery {
	pub fn is_sent(&self) -> bool {
		matches!(self, Self::Sent(_))
	}
}

/// Builder for constructing a [`Catcher`].
pub struct CatcherBuilder {
	options: Option<Options>,
	runtime: Option<Arc<dyn HostRuntime>>,
	transport: Option<Arc<dyn Transport>>,
	addons: AddonRegistry,
	namer: Option<Arc<dyn FrameNamer>>,
	source: SourceContextReader,
}

impl CatcherBuilder {
	/// Creates a new builder with the default addons.
	pub fn new() -> Self {
		Self {
			options: None,
			runtime: None,
			transport: None,
			addons: AddonRegistry::with_defaults(),
			namer: None,
			source: SourceContextReader::default(),
		}
	}

	pub fn options(mut self, options: Options) -> Self {
		self.options = Some(options);
		self
	}

	/// Sets the host runtime handlers are registered with.
	///
	/// Defaults to the shared [`process_runtime`].
	pub fn runtime(mut self, runtime: Arc<dyn HostRuntime>) -> Self {
		self.runtime = Some(runtime);
		self
	}

	/// Overrides the transport selected by the options.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Adds a metadata resolver, replacing any with the same name.
	pub fn addon(mut self, addon: Arc<dyn Addon>) -> Self {
		self.addons.register(addon);
		self
	}

	/// Sets the argument namer. Defaults to an empty [`SignatureNamer`].
	pub fn frame_namer(mut self, namer: Arc<dyn FrameNamer>) -> Self {
		self.namer = Some(namer);
		self
	}

	/// Sets how much source is read around each frame.
	pub fn source_context(mut self, source: SourceContextReader) -> Self {
		self.source = source;
		self
	}

	/// Builds the catcher. Handlers are not registered until
	/// [`Catcher::enable_handlers`] is called.
	pub fn build(self) -> Result<Catcher> {
		let options = self
			.options
			.ok_or_else(|| CatcherSdkError::InvalidOptions("options are required".to_string()))?;

		let transport = match self.transport {
			Some(transport) => transport,
			None => transport_for(&options)?,
		};
		let runtime = self
			.runtime
			.unwrap_or_else(|| Arc::new(process_runtime().clone()));
		let namer = self
			.namer
			.unwrap_or_else(|| Arc::new(SignatureNamer::new()));

		let normalizer = StacktraceNormalizer::new(namer).with_source_reader(self.source);
		let builder = EventPayloadBuilder::new(normalizer, self.addons);

		info!(
			url = %options.url(),
			transport = %options.transport(),
			"Catcher initialized"
		);

		Ok(Catcher {
			inner: Arc::new(CatcherInner {
				options,
				runtime,
				transport,
				builder,
				user: RwLock::new(Map::new()),
				context: RwLock::new(Map::new()),
				state: HandlerState::default(),
			}),
		})
	}
}

impl Default for CatcherBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Internal catcher state.
pub(crate) struct CatcherInner {
	pub(crate) options: Options,
	pub(crate) runtime: Arc<dyn HostRuntime>,
	transport: Arc<dyn Transport>,
	builder: EventPayloadBuilder,
	user: RwLock<Map<String, JsonValue>>,
	context: RwLock<Map<String, JsonValue>>,
	pub(crate) state: HandlerState,
}

impl CatcherInner {
	/// Runs one capture: defaults merge, payload assembly, `before_send`,
	/// delivery.
	pub(crate) fn capture(&self, data: EventData) -> Delivery {
		let data = self.with_defaults(data);
		let payload = self.builder.create(data).with_release(self.options.release());

		let payload = match self.options.before_send() {
			Some(before_send) => match before_send(payload) {
				Some(payload) => payload,
				None => {
					debug!("Event dropped by before_send");
					return Delivery::Dropped;
				}
			},
			None => payload,
		};

		let event = Event::new(self.options.integration_token(), payload);
		match self.transport.send(&event) {
			Ok(response) => {
				debug!(title = %event.payload.title(), "Event sent");
				Delivery::Sent(response)
			}
			Err(e) => {
				warn!(error = %e, "Failed to send event");
				Delivery::Failed
			}
		}
	}

	/// Given context keys win over the catcher's context. A given user
	/// replaces the catcher's user entirely.
	fn with_defaults(&self, mut data: EventData) -> EventData {
		let mut context = self.context.read().clone();
		context.extend(std::mem::take(&mut data.context));
		data.context = context;

		if data.user.is_empty() {
			data.user = self.user.read().clone();
		}
		data
	}
}

/// Client capturing faults and shipping them to the collector.
///
/// Cloning is cheap; clones share configuration, defaults and handler
/// state.
///
/// # Example
///
/// ```ignore
/// use hawk_catcher::{Catcher, Options};
///
/// let options = Options::builder()
///     .integration_token("eyJ...")
///     .release(env!("CARGO_PKG_VERSION"))
///     .build()?;
///
/// let catcher = Catcher::builder().options(options).build()?;
/// catcher.enable_handlers();
///
/// if let Err(e) = do_something() {
///     catcher.send_error(&e);
/// }
/// ```
#[derive(Clone)]
pub struct Catcher {
	pub(crate) inner: Arc<CatcherInner>,
}

impl Catcher {
	/// Creates a new builder for constructing a Catcher.
	pub fn builder() -> CatcherBuilder {
		CatcherBuilder::new()
	}

	pub fn options(&self) -> &Options {
		&self.inner.options
	}

	pub fn runtime(&self) -> &Arc<dyn HostRuntime> {
		&self.inner.runtime
	}

	/// Registers the error, exception and fatal handlers.
	pub fn enable_handlers(&self) {
		self.register_error_handler();
		self.register_exception_handler();
		self.register_fatal_handler();
	}

	/// Sets the user attached to events that do not name one.
	pub fn set_user(&self, user: Map<String, JsonValue>) {
		*self.inner.user.write() = user;
	}

	/// Sets the context merged into every event.
	pub fn set_context(&self, context: Map<String, JsonValue>) {
		*self.inner.context.write() = context;
	}

	/// Sends a custom event.
	pub fn send_event(&self, data: EventData) -> Delivery {
		self.inner.capture(data)
	}

	/// Sends a message event. The stacktrace is taken at the call site.
	pub fn send_message(&self, title: impl Into<String>, context: Map<String, JsonValue>) -> Delivery {
		self.inner.capture(
			EventData::message(title)
				.severity(Severity::Info)
				.context(context),
		)
	}

	/// Sends an exception. Its chain of previous exceptions goes into the
	/// description.
	pub fn send_exception(&self, exception: &Exception, context: Map<String, JsonValue>) -> Delivery {
		self.inner.capture(
			EventData::new()
				.severity(Severity::Error)
				.exception(exception.clone())
				.context(context),
		)
	}

	/// Sends an error value with its `source()` chain, located at the caller.
	#[track_caller]
	pub fn send_error<E: StdError + ?Sized>(&self, error: &E) -> Delivery {
		let exception = Exception::from_error(error).with_trace(capture_raw_frames());
		self.send_exception(&exception, Map::new())
	}
}

impl std::fmt::Debug for Catcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Catcher")
			.field("options", &self.inner.options)
			.finish_non_exhaustive()
	}
}
