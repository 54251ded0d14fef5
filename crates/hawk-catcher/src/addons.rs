// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Addon registry and the built-in metadata resolvers.

use std::sync::Arc;

use hawk_catcher_core::{Addon, CoreError};
use serde_json::{Map, Value as JsonValue};
use sysinfo::System;
use tracing::warn;

/// SDK version reported by the runtime addon.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

type Resolved = hawk_catcher_core::Result<Map<String, JsonValue>>;

/// Ordered set of named resolvers, keyed by name.
///
/// Registering a second addon with the same name replaces the first.
#[derive(Clone, Default)]
pub struct AddonRegistry {
	addons: Vec<Arc<dyn Addon>>,
}

impl AddonRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry with the environment, OS and runtime addons.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(Arc::new(EnvironmentAddon));
		registry.register(Arc::new(OsAddon));
		registry.register(Arc::new(RuntimeAddon));
		registry
	}

	pub fn register(&mut self, addon: Arc<dyn Addon>) {
		let position = self.addons.iter().position(|a| a.name() == addon.name());
		match position {
			Some(index) => self.addons[index] = addon,
			None => self.addons.push(addon),
		}
	}

	pub fn names(&self) -> Vec<&str> {
		self.addons.iter().map(|a| a.name()).collect()
	}

	/// Resolves every addon. A failing addon is logged and left out.
	pub fn resolve_all(&self) -> Map<String, JsonValue> {
		let mut resolved = Map::new();
		for addon in &self.addons {
			match addon.resolve() {
				Ok(data) => {
					resolved.insert(addon.name().to_string(), JsonValue::Object(data));
				}
				Err(e) => {
					warn!(addon = addon.name(), error = %e, "Addon failed to resolve");
				}
			}
		}
		resolved
	}
}

/// Host identity: `hostname`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentAddon;

impl Addon for EnvironmentAddon {
	fn name(&self) -> &str {
		"environment"
	}

	fn resolve(&self) -> Resolved {
		let mut data = Map::new();
		if let Some(name) = hostname::get().ok().and_then(|h| h.into_string().ok()) {
			data.insert("hostname".to_string(), JsonValue::from(name));
		}
		Ok(data)
	}
}

/// Operating system: `name`, `version`, `kernelVersion`, `arch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsAddon;

impl Addon for OsAddon {
	fn name(&self) -> &str {
		"os"
	}

	fn resolve(&self) -> Resolved {
		let mut data = Map::new();
		let name = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
		data.insert("name".to_string(), JsonValue::from(name));
		if let Some(version) = System::os_version() {
			data.insert("version".to_string(), JsonValue::from(version));
		}
		if let Some(kernel) = System::kernel_version() {
			data.insert("kernelVersion".to_string(), JsonValue::from(kernel));
		}
		data.insert("arch".to_string(), JsonValue::from(std::env::consts::ARCH));
		Ok(data)
	}
}

/// Language runtime: `name`, `sdkVersion`, `target`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeAddon;

impl Addon for RuntimeAddon {
	fn name(&self) -> &str {
		"runtime"
	}

	fn resolve(&self) -> Resolved {
		let mut data = Map::new();
		data.insert("name".to_string(), JsonValue::from("rust"));
		data.insert("sdkVersion".to_string(), JsonValue::from(SDK_VERSION));
		data.insert(
			"target".to_string(),
			JsonValue::from(format!(
				"{}-{}",
				std::env::consts::ARCH,
				std::env::consts::OS
			)),
		);
		Ok(data)
	}
}

/// Request headers of the work in flight.
///
/// The provider returns a snapshot of CGI-style variables or plain header
/// pairs. `HTTP_*` names and the content headers are turned into header
/// names; anything else is dropped. Output is sorted by header name.
pub struct HeadersAddon {
	provider: Box<dyn Fn() -> Vec<(String, String)> + Send + Sync>,
}

impl HeadersAddon {
	pub fn new(provider: impl Fn() -> Vec<(String, String)> + Send + Sync + 'static) -> Self {
		Self {
			provider: Box::new(provider),
		}
	}
}

impl Addon for HeadersAddon {
	fn name(&self) -> &str {
		"headers"
	}

	fn resolve(&self) -> Resolved {
		let mut headers: Vec<(String, String)> = (self.provider)()
			.into_iter()
			.filter_map(|(name, value)| header_name(&name).map(|n| (n, value)))
			.collect();
		if headers.is_empty() {
			return Err(CoreError::AddonFailed("no request headers".to_string()));
		}
		headers.sort_by(|a, b| a.0.cmp(&b.0));

		Ok(headers
			.into_iter()
			.map(|(name, value)| (name, JsonValue::from(value)))
			.collect())
	}
}

/// `HTTP_USER_AGENT` -> `User-Agent`, `CONTENT_TYPE` -> `Content-Type`.
/// Names that already look like headers (`x-request-id`) are title-cased.
fn header_name(raw: &str) -> Option<String> {
	let name = if let Some(rest) = raw.strip_prefix("HTTP_") {
		rest
	} else if matches!(raw, "CONTENT_TYPE" | "CONTENT_LENGTH" | "CONTENT_MD5") {
		raw
	} else if raw.contains('-') || raw.chars().any(|c| c.is_ascii_lowercase()) {
		raw
	} else {
		return None;
	};

	let words: Vec<String> = name
		.split(['_', '-'])
		.filter(|w| !w.is_empty())
		.map(|word| {
			let lower = word.to_ascii_lowercase();
			let mut chars = lower.chars();
			match chars.next() {
				Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
				None => String::new(),
			}
		})
		.collect();
	if words.is_empty() {
		return None;
	}
	Some(words.join("-"))
}
