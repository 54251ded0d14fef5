// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named metadata resolvers attached to every event.

use serde_json::{Map, Value as JsonValue};

use crate::error::Result;

/// A named provider of flat key/value metadata (environment, OS, runtime...).
///
/// Resolution happens once per event. A failing resolver only loses its own
/// slot in the event.
pub trait Addon: Send + Sync {
	/// Key under which the resolved data is stored in the payload.
	fn name(&self) -> &str;

	fn resolve(&self) -> Result<Map<String, JsonValue>>;
}

impl<F> Addon for (&'static str, F)
where
	F: Fn() -> Result<Map<String, JsonValue>> + Send + Sync,
{
	fn name(&self) -> &str {
		self.0
	}

	fn resolve(&self) -> Result<Map<String, JsonValue>> {
		(self.1)()
	}
}
