// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the Hawk catcher.
//!
//! This crate provides a pre-configured blocking HTTP client with a
//! consistent User-Agent header. Delivery is synchronous, so only the
//! blocking flavour of `reqwest` is exposed.

mod client;

pub use client::{builder, new_client_with_timeout, user_agent};
