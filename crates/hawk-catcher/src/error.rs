// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the catcher SDK.

use thiserror::Error;

/// Result type alias for catcher operations.
pub type Result<T> = std::result::Result<T, CatcherSdkError>;

/// Errors that can occur in the catcher SDK.
///
/// Only configuration problems and use before initialization ever reach the
/// host application. Transport errors are returned by [`crate::Transport`]
/// implementations and absorbed by the catcher.
#[derive(Debug, Error)]
pub enum CatcherSdkError {
	/// No integration token was configured.
	#[error("integration token is required")]
	MissingIntegrationToken,

	/// The collector URL is not an absolute http(s) URL.
	#[error("invalid collector URL: {0}")]
	InvalidUrl(String),

	/// The request timeout must be greater than zero.
	#[error("timeout must be greater than zero")]
	InvalidTimeout,

	/// The transport name is not registered.
	#[error("unknown transport: {0}")]
	UnknownTransport(String),

	/// The configuration map could not be read.
	#[error("invalid options: {0}")]
	InvalidOptions(String),

	/// The process-wide catcher has not been initialized.
	#[error("catcher is not initialized")]
	NotInitialized,

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Collector returned a non-success status.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Response body.
		message: String,
	},

	/// The delivery thread could not be started or did not finish.
	#[error("delivery failed: {0}")]
	Delivery(String),

	/// Failed to serialize event.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl CatcherSdkError {
	/// Returns true for errors raised while validating configuration.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			Self::MissingIntegrationToken
				| Self::InvalidUrl(_)
				| Self::InvalidTimeout
				| Self::UnknownTransport(_)
				| Self::InvalidOptions(_)
		)
	}
}
