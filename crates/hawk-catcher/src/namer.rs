// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parameter naming for frame arguments.
//!
//! Rust has no runtime reflection, so declared parameter names come either
//! from the frame itself (when the recorder knew the callee signature) or
//! from signatures registered up front. Frames without a known signature fall
//! back to positional names.

use std::collections::HashMap;

use hawk_catcher_core::RawFrame;
use parking_lot::RwLock;

/// Resolves argument names for a raw frame.
pub trait FrameNamer: Send + Sync {
	/// Returns true if this namer knows the signature of the frame's callee.
	fn can_name(&self, frame: &RawFrame) -> bool;

	/// Names for the frame's arguments, one per argument position.
	fn names(&self, frame: &RawFrame) -> Vec<String>;
}

/// Names every argument by its position: `param0`, `param1`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalNamer;

impl FrameNamer for PositionalNamer {
	fn can_name(&self, _frame: &RawFrame) -> bool {
		true
	}

	fn names(&self, frame: &RawFrame) -> Vec<String> {
		(0..frame.args.len()).map(positional_name).collect()
	}
}

/// Names arguments from declared signatures.
///
/// A frame's own `parameters` win over signatures registered by function
/// name. Arguments past the declared parameters (variadics) get positional
/// names.
#[derive(Debug, Default)]
pub struct SignatureNamer {
	signatures: RwLock<HashMap<String, Vec<String>>>,
}

impl SignatureNamer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the parameter names of `function` (as it appears in frames,
	/// e.g. `Cart::add`).
	pub fn register<S: Into<String>>(
		&self,
		function: impl Into<String>,
		parameters: impl IntoIterator<Item = S>,
	) {
		self.signatures.write().insert(
			function.into(),
			parameters.into_iter().map(Into::into).collect(),
		);
	}

	fn declared(&self, frame: &RawFrame) -> Option<Vec<String>> {
		if let Some(parameters) = &frame.parameters {
			return Some(parameters.clone());
		}
		let function = frame.qualified_function()?;
		self.signatures.read().get(&function).cloned()
	}
}

impl FrameNamer for SignatureNamer {
	fn can_name(&self, frame: &RawFrame) -> bool {
		frame.parameters.is_some()
			|| frame
				.qualified_function()
				.is_some_and(|f| self.signatures.read().contains_key(&f))
	}

	fn names(&self, frame: &RawFrame) -> Vec<String> {
		let declared = self.declared(frame).unwrap_or_default();
		(0..frame.args.len())
			.map(|i| declared.get(i).cloned().unwrap_or_else(|| positional_name(i)))
			.collect()
	}
}

/// Picks `preferred` when it can name the frame, positional names otherwise.
pub fn resolve_names(preferred: &dyn FrameNamer, frame: &RawFrame) -> Vec<String> {
	if preferred.can_name(frame) {
		preferred.names(frame)
	} else {
		PositionalNamer.names(frame)
	}
}

fn positional_name(index: usize) -> String {
	format!("param{index}")
}
