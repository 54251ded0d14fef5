// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catcher configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hawk_catcher_core::{ErrorLevel, EventPayload};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{CatcherSdkError, Result};
use crate::transport::TransportKind;

/// Collector endpoint used when no URL is configured.
pub const DEFAULT_URL: &str = "https://k1.hawk.so/";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transform applied to every payload right before delivery. Returning
/// `None` cancels delivery of that event.
pub type BeforeSend = Arc<dyn Fn(EventPayload) -> Option<EventPayload> + Send + Sync>;

/// Process-wide catcher configuration. Read-only once built.
#[derive(Clone)]
pub struct Options {
	integration_token: String,
	url: String,
	release: String,
	error_types: Option<ErrorLevel>,
	capture_silenced_errors: bool,
	timeout: Duration,
	transport: TransportKind,
	before_send: Option<BeforeSend>,
}

impl Options {
	pub fn builder() -> OptionsBuilder {
		OptionsBuilder::new()
	}

	/// Reads the configuration map, e.g.
	/// `{"integrationToken": "...", "errorTypes": "E_ALL", "timeout": 5}`.
	///
	/// `errorTypes` takes an integer mask or an `E_A | E_B` expression and
	/// `timeout` is in seconds. Unknown keys are rejected.
	pub fn from_value(value: serde_json::Value) -> Result<Self> {
		let raw: RawOptions =
			serde_json::from_value(value).map_err(|e| CatcherSdkError::InvalidOptions(e.to_string()))?;

		let mut builder = Self::builder();
		if let Some(token) = raw.integration_token {
			builder = builder.integration_token(token);
		}
		if let Some(url) = raw.url {
			builder = builder.url(url);
		}
		if let Some(release) = raw.release {
			builder = builder.release(release);
		}
		if let Some(error_types) = raw.error_types {
			builder = builder.error_types(error_types.into_level()?);
		}
		if let Some(capture) = raw.capture_silenced_errors {
			builder = builder.capture_silenced_errors(capture);
		}
		if let Some(seconds) = raw.timeout {
			builder = builder.timeout(seconds_to_duration(seconds)?);
		}
		if let Some(transport) = raw.transport {
			builder = builder.transport(transport.parse()?);
		}
		builder.build()
	}

	/// Reads `HAWK_INTEGRATION_TOKEN`, `HAWK_URL`, `HAWK_RELEASE`,
	/// `HAWK_TIMEOUT` (seconds) and `HAWK_TRANSPORT`.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let mut builder = Self::builder();
		if let Some(token) = lookup("HAWK_INTEGRATION_TOKEN") {
			builder = builder.integration_token(token);
		}
		if let Some(url) = lookup("HAWK_URL") {
			builder = builder.url(url);
		}
		if let Some(release) = lookup("HAWK_RELEASE") {
			builder = builder.release(release);
		}
		if let Some(timeout) = lookup("HAWK_TIMEOUT") {
			let seconds: f64 = timeout
				.trim()
				.parse()
				.map_err(|_| CatcherSdkError::InvalidTimeout)?;
			builder = builder.timeout(seconds_to_duration(seconds)?);
		}
		if let Some(transport) = lookup("HAWK_TRANSPORT") {
			builder = builder.transport(transport.parse()?);
		}
		builder.build()
	}

	pub fn integration_token(&self) -> &str {
		&self.integration_token
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn release(&self) -> &str {
		&self.release
	}

	/// Configured error filter. `None` captures every level the host
	/// currently reports.
	pub fn error_types(&self) -> Option<ErrorLevel> {
		self.error_types
	}

	pub fn capture_silenced_errors(&self) -> bool {
		self.capture_silenced_errors
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn transport(&self) -> TransportKind {
		self.transport
	}

	pub fn before_send(&self) -> Option<&BeforeSend> {
		self.before_send.as_ref()
	}
}

impl fmt::Debug for Options {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("integration_token", &"[REDACTED]")
			.field("url", &self.url)
			.field("release", &self.release)
			.field("error_types", &self.error_types)
			.field("capture_silenced_errors", &self.capture_silenced_errors)
			.field("timeout", &self.timeout)
			.field("transport", &self.transport)
			.field("before_send", &self.before_send.is_some())
			.finish()
	}
}

/// Builder for [`Options`].
pub struct OptionsBuilder {
	integration_token: Option<String>,
	url: String,
	release: String,
	error_types: Option<ErrorLevel>,
	capture_silenced_errors: bool,
	timeout: Duration,
	transport: TransportKind,
	before_send: Option<BeforeSend>,
}

impl OptionsBuilder {
	pub fn new() -> Self {
		Self {
			integration_token: None,
			url: DEFAULT_URL.to_string(),
			release: String::new(),
			error_types: None,
			capture_silenced_errors: false,
			timeout: DEFAULT_TIMEOUT,
			transport: TransportKind::default(),
			before_send: None,
		}
	}

	/// Sets the project integration token (required).
	pub fn integration_token(mut self, token: impl Into<String>) -> Self {
		self.integration_token = Some(token.into());
		self
	}

	/// Sets the collector URL.
	///
	/// Example: `https://k1.hawk.so/`
	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	/// Sets the release tag sent with every event.
	pub fn release(mut self, release: impl Into<String>) -> Self {
		self.release = release.into();
		self
	}

	/// Restricts which raised error levels are captured.
	pub fn error_types(mut self, levels: ErrorLevel) -> Self {
		self.error_types = Some(levels);
		self
	}

	/// Also capture errors the host's reporting mask silences.
	pub fn capture_silenced_errors(mut self, capture: bool) -> Self {
		self.capture_silenced_errors = capture;
		self
	}

	/// Sets the HTTP request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn transport(mut self, transport: TransportKind) -> Self {
		self.transport = transport;
		self
	}

	pub fn before_send(
		mut self,
		hook: impl Fn(EventPayload) -> Option<EventPayload> + Send + Sync + 'static,
	) -> Self {
		self.before_send = Some(Arc::new(hook));
		self
	}

	/// Validates and builds the options.
	pub fn build(self) -> Result<Options> {
		let integration_token = self
			.integration_token
			.filter(|t| !t.trim().is_empty())
			.ok_or(CatcherSdkError::MissingIntegrationToken)?;

		let url = Url::parse(&self.url).map_err(|_| CatcherSdkError::InvalidUrl(self.url.clone()))?;
		if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
			return Err(CatcherSdkError::InvalidUrl(self.url));
		}

		if self.timeout.is_zero() {
			return Err(CatcherSdkError::InvalidTimeout);
		}

		Ok(Options {
			integration_token,
			url: self.url,
			release: self.release,
			error_types: self.error_types,
			capture_silenced_errors: self.capture_silenced_errors,
			timeout: self.timeout,
			transport: self.transport,
			before_send: self.before_send,
		})
	}
}

impl Default for OptionsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
	integration_token: Option<String>,
	url: Option<String>,
	release: Option<String>,
	#[serde(alias = "error_types")]
	error_types: Option<ErrorTypes>,
	capture_silenced_errors: Option<bool>,
	timeout: Option<f64>,
	transport: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorTypes {
	Mask(u32),
	Expression(String),
}

impl ErrorTypes {
	fn into_level(self) -> Result<ErrorLevel> {
		match self {
			Self::Mask(bits) => Ok(ErrorLevel::from_bits_truncate(bits)),
			Self::Expression(expr) => expr
				.parse()
				.map_err(|e: hawk_catcher_core::CoreError| CatcherSdkError::InvalidOptions(e.to_string())),
		}
	}
}

fn seconds_to_duration(seconds: f64) -> Result<Duration> {
	Duration::try_from_secs_f64(seconds).map_err(|_| CatcherSdkError::InvalidTimeout)
}
