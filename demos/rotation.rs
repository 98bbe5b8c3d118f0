//! Time-pattern rotation with a "latest" symlink.
//!
//! The file name is re-evaluated on every write; whenever it changes the
//! sink opens the new file and repoints `current.log` at it.

use tracelog::{LogApi, LogConfig, Logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;

    // One file per second so a short run crosses a few boundaries
    let config = LogConfig::new()
        .with_console(false)
        .with_filename("app-%Y%m%d-%H%M%S.log");
    let config = LogConfig {
        symlink: Some("current.log".to_string()),
        log_root: Some(temp_dir.path().to_path_buf()),
        ..config
    };
    let log = std::sync::Arc::new(Logger::new(&config)?);

    for i in 0..30 {
        log.notice(&format!("Log message number {}", i));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    let mut files: Vec<_> = std::fs::read_dir(temp_dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    files.sort();
    for name in files {
        println!("{}", name);
    }

    let link = temp_dir.path().join("current.log");
    if let Ok(target) = std::fs::read_link(&link) {
        println!("current.log -> {}", target.display());
    }

    Ok(())
}
