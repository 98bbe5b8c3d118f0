//! Example of loading logging configuration from YAML.
//!
//! Run with:
//! ```bash
//! cargo run --example config_yaml
//! ```

use std::collections::HashMap;

use tracelog::{LogApi, LogBuilder, LogConfig};

const CONFIG: &str = r#"
log:
  console: true
  level: notice
  format: text
  filename: "service-%Y-%m-%d.log"
  symlink: current.log
  file_level: debug
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;

    // Parse the YAML configuration
    let root: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(CONFIG)?;
    let config: LogConfig = serde_yaml::from_value(root["log"].clone())?;
    let config = LogConfig {
        log_root: Some(temp_dir.path().to_path_buf()),
        ..config
    };

    let log = LogBuilder::from_config(config).init()?;

    log.debug("only the file sees this");
    log.info("below the console level");
    log.notice("service started");
    log.warn("cache is cold");

    Ok(())
}
