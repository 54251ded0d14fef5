// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: capture a message, an error and a runtime warning.
//!
//! Run with:
//!   HAWK_INTEGRATION_TOKEN=... cargo run --example capture -p hawk-catcher
//!
//! Set `HAWK_TRANSPORT=tracing` to print events instead of sending them.

use hawk_catcher::{process_runtime, Delivery, ErrorLevel, Options};
use serde_json::{json, Map, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

	let options = Options::from_env()?;
	println!("Initializing catcher...");
	println!("  URL: {}", options.url());
	println!("  Transport: {}", options.transport());

	let catcher = hawk_catcher::init(options)?;
	let runtime = process_runtime();
	let _shutdown = runtime.shutdown_guard();

	let mut user = Map::new();
	user.insert("id".to_string(), json!("user_example_123"));
	catcher.set_user(user);

	let mut context = Map::new();
	context.insert("example".to_string(), Value::Bool(true));
	catcher.set_context(context);

	println!("\nSending message...");
	report(catcher.send_message("Example message from hawk-catcher", Map::new()));

	println!("\nSending error...");
	if let Err(error) = std::fs::read_to_string("/definitely/missing.toml") {
		report(catcher.send_error(&error));
	}

	println!("\nRaising runtime warning...");
	runtime.trigger_error(ErrorLevel::USER_WARNING, "Example warning from hawk-catcher");

	Ok(())
}

fn report(delivery: Delivery) {
	match delivery {
		Delivery::Sent(Some(response)) => println!("  Sent, collector answered: {response}"),
		Delivery::Sent(None) => println!("  Sent"),
		Delivery::Dropped => println!("  Dropped by before_send"),
		Delivery::Failed => println!("  Delivery failed (see logs)"),
	}
}
