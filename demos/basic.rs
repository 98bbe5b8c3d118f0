//! Basic console logging example.
//!
//! This example demonstrates the simplest way to initialize logging
//! with tracelog using the builder API.

use tracelog::{Level, LogApi};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install the console subscriber and create the facade
    let log = tracelog::builder()
        .with_console(true)
        .with_level(Level::Info)
        .init()?;

    log.info("This is an info message");
    log.warning("This is a warning message");

    // Diagnostic levels return the id shared by the message and its stack record
    let trace_id = log.error("This is an error message");
    println!("error traced as {}", trace_id);

    Ok(())
}
