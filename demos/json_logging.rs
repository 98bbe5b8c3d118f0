//! Writing newline-delimited JSON to a file.
//!
//! Every line in the file is one JSON object with `timestamp`, `level`,
//! `message` and `meta`. Traced records also carry `trace_id`.

use serde_json::json;
use tracelog::{Level, LogApi, Meta};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;

    let log = tracelog::builder()
        .with_console(false)
        .with_file("app.log")
        .with_raw_json(true)
        .with_log_root(temp_dir.path())
        .build_logger()?;

    let mut meta = Meta::new();
    meta.insert("user".to_string(), json!("alice"));
    meta.insert("action".to_string(), json!("login"));
    log.log_with(Level::Info, "User performed an action", meta);

    let mut meta = Meta::new();
    meta.insert("error_code".to_string(), json!(404));
    meta.insert("path".to_string(), json!("/api/users"));
    log.log_with(Level::Error, "Resource not found", meta);

    let content = std::fs::read_to_string(temp_dir.path().join("app.log"))?;
    for line in content.lines() {
        let value: serde_json::Value = serde_json::from_str(line)?;
        println!("{} {}", value["level"], value["message"]);
    }

    Ok(())
}
