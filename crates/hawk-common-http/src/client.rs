// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared blocking HTTP client with consistent User-Agent header.

use reqwest::blocking::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a new HTTP client builder with the standard User-Agent header.
///
/// The User-Agent format is: `hawk-catcher-rust/{version} ({os}-{arch})`
/// Example: `hawk-catcher-rust/0.1.0 (linux-x86_64)`
///
/// Use this when you need to customize the client (e.g., set timeout).
///
/// # Example
/// ```ignore
/// let client = hawk_common_http::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a request timeout and the standard User-Agent.
///
/// Blocking clients must not be created or dropped on a thread driven by an
/// async runtime.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Returns the standard catcher User-Agent string.
pub fn user_agent() -> String {
	format!(
		"hawk-catcher-rust/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		assert!(ua.starts_with("hawk-catcher-rust/"));
		assert!(ua.contains(std::env::consts::OS));
		assert!(ua.ends_with(')'));
	}

	#[test]
	fn client_with_timeout_builds() {
		assert!(new_client_with_timeout(Duration::from_millis(250)).is_ok());
	}
}
