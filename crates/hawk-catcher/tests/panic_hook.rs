// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panics raised after the exception handler is registered are reported
//! once. Own test binary because the std panic hook is process-global.

use std::sync::Arc;

use hawk_catcher::{
	Catcher, Event, HostRuntime, Options, ProcessRuntime, Result, Severity, Transport, PANIC_TYPE,
};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

#[derive(Default)]
struct RecordingTransport {
	events: Mutex<Vec<Event>>,
}

impl Transport for RecordingTransport {
	fn send(&self, event: &Event) -> Result<Option<JsonValue>> {
		self.events.lock().push(event.clone());
		Ok(None)
	}
}

fn explode(order: u32) {
	panic!("order {order} is corrupt");
}

#[test]
fn test_panic_reported_once() {
	let runtime = ProcessRuntime::new();
	let transport = Arc::new(RecordingTransport::default());
	let catcher = Catcher::builder()
		.options(Options::builder().integration_token("token").build().unwrap())
		.runtime(Arc::new(runtime.clone()))
		.transport(transport.clone())
		.build()
		.unwrap();
	catcher.enable_handlers();

	let result = std::panic::catch_unwind(|| explode(42));
	assert!(result.is_err());

	// Absorbed by the catcher, so the runtime has nothing left to report.
	assert!(runtime.last_error().is_none());
	runtime.shutdown();

	let events = transport.events.lock();
	assert_eq!(events.len(), 1);
	let payload = &events[0].payload;
	assert_eq!(payload.title(), "order 42 is corrupt");
	assert_eq!(payload.severity(), Some(Severity::Error));

	let top = payload.backtrace().top().unwrap();
	assert!(top.file.ends_with("panic_hook.rs"));
	assert_eq!(top.line, 28);
	assert!(!PANIC_TYPE.is_empty());
}
