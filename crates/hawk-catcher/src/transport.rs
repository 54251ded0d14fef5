// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event delivery.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hawk_catcher_core::Event;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::{CatcherSdkError, Result};
use crate::options::Options;

/// Ships one event to the collector.
///
/// `send` blocks the calling thread until the collector answers or the
/// configured timeout elapses. The returned value is the decoded collector
/// response when it was JSON.
pub trait Transport: Send + Sync {
	fn send(&self, event: &Event) -> Result<Option<JsonValue>>;
}

/// Registered transport implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
	/// POST to the collector URL.
	#[default]
	Http,
	/// Write events to the `tracing` log instead of the network.
	Tracing,
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Http => write!(f, "http"),
			Self::Tracing => write!(f, "tracing"),
		}
	}
}

impl FromStr for TransportKind {
	type Err = CatcherSdkError;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"http" | "default" => Ok(Self::Http),
			"tracing" => Ok(Self::Tracing),
			_ => Err(CatcherSdkError::UnknownTransport(s.to_string())),
		}
	}
}

impl<'de> Deserialize<'de> for TransportKind {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Name of the thread that carries each HTTP request.
pub(crate) const DELIVERY_THREAD: &str = "hawk-catcher-send";

/// Posts events as JSON to the collector URL.
///
/// Each request runs on its own short-lived thread, which owns the blocking
/// client for the duration of the call. The caller waits for it, so delivery
/// stays synchronous, but the blocking client never lives on a thread driven
/// by an async runtime.
pub struct HttpTransport {
	url: String,
	timeout: Duration,
}

impl HttpTransport {
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
		let url = url.into();
		reqwest::Url::parse(&url).map_err(|e| CatcherSdkError::InvalidUrl(format!("{url}: {e}")))?;
		Ok(Self { url, timeout })
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

impl Transport for HttpTransport {
	fn send(&self, event: &Event) -> Result<Option<JsonValue>> {
		debug!(url = %self.url, "Sending event");

		let body = serde_json::to_vec(event)?;
		let url = self.url.clone();
		let timeout = self.timeout;
		let worker = thread::Builder::new()
			.name(DELIVERY_THREAD.to_string())
			.spawn(move || post_json(&url, timeout, body))
			.map_err(|e| CatcherSdkError::Delivery(e.to_string()))?;

		worker
			.join()
			.map_err(|_| CatcherSdkError::Delivery("delivery thread panicked".to_string()))?
	}
}

fn post_json(url: &str, timeout: Duration, body: Vec<u8>) -> Result<Option<JsonValue>> {
	let client = hawk_common_http::new_client_with_timeout(timeout)?;
	let response = client
		.post(url)
		.header(CONTENT_TYPE, "application/json")
		.body(body)
		.send()?;

	let status = response.status();
	if !status.is_success() {
		let message = response.text().unwrap_or_default();
		return Err(CatcherSdkError::ServerError {
			status: status.as_u16(),
			message,
		});
	}

	let body = response.text()?;
	Ok(serde_json::from_str(&body).ok())
}

/// Logs events at `info` level and sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransport;

impl Transport for TracingTransport {
	fn send(&self, event: &Event) -> Result<Option<JsonValue>> {
		let json = serde_json::to_string(event)?;
		info!(target: "hawk_catcher::transport", event = %json, "Captured event");
		Ok(None)
	}
}

/// Builds the transport selected by `options`.
pub fn transport_for(options: &Options) -> Result<Arc<dyn Transport>> {
	Ok(match options.transport() {
		TransportKind::Http => Arc::new(HttpTransport::new(options.url(), options.timeout())?),
		TransportKind::Tracing => Arc::new(TracingTransport),
	})
}
