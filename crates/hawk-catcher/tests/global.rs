// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide catcher lifecycle. Runs as one test because the instance is
//! global to the test binary.

use hawk_catcher::{CatcherSdkError, Delivery, EventData, Options, TransportKind};
use serde_json::Map;

fn options(token: &str) -> Options {
	Options::builder()
		.integration_token(token)
		.transport(TransportKind::Tracing)
		.build()
		.unwrap()
}

#[test]
fn test_global_lifecycle() {
	assert!(matches!(
		hawk_catcher::send_message("too early", Map::new()),
		Err(CatcherSdkError::NotInitialized)
	));
	assert!(matches!(
		hawk_catcher::instance(),
		Err(CatcherSdkError::NotInitialized)
	));

	let bad = Options::builder().integration_token("  ").build();
	assert!(matches!(bad, Err(CatcherSdkError::MissingIntegrationToken)));

	let first = hawk_catcher::init(options("first-token")).unwrap();
	let second = hawk_catcher::init(options("second-token")).unwrap();
	assert_eq!(first.options().integration_token(), "first-token");
	assert_eq!(second.options().integration_token(), "first-token");
	assert_eq!(
		hawk_catcher::instance().unwrap().options().integration_token(),
		"first-token"
	);

	// The tracing transport logs the event and returns no response.
	assert_eq!(
		hawk_catcher::send_message("hello", Map::new()).unwrap(),
		Delivery::Sent(None)
	);
	assert_eq!(
		hawk_catcher::send_event(EventData::message("custom")).unwrap(),
		Delivery::Sent(None)
	);
	hawk_catcher::set_user(Map::new()).unwrap();
	hawk_catcher::set_context(Map::new()).unwrap();

	let error = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
	assert!(hawk_catcher::send_error(&error).unwrap().is_sent());
}
