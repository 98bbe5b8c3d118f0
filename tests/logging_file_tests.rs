use std::sync::Arc;

use tracelog::{Level, LogApi, LogConfig, Logger, Meta};

fn file_config(dir: &std::path::Path) -> LogConfig {
    LogConfig {
        console: false,
        filename: Some("app.log".to_string()),
        log_root: Some(dir.to_path_buf()),
        ..Default::default()
    }
}

fn json_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .expect("read log file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("one JSON object per line"))
        .collect()
}

#[test]
fn test_error_writes_message_then_stack_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let logger = Logger::new(&file_config(dir.path())).expect("logger");

    let id = logger.error("disk full");

    let s = std::fs::read_to_string(dir.path().join("app.log")).expect("read log file");
    let first = s.lines().next().expect("message line");
    assert!(first.ends_with(&format!("error: disk full | trace: {}", id)));

    let stack_start = s.find(" debug: ").expect("stack record");
    assert!(stack_start > s.find("disk full").unwrap());
    assert!(!s.contains("\x1b"), "ANSI escape found in log file");
}

#[test]
fn test_json_file_carries_trace_id_on_both_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = LogConfig {
        raw_json: true,
        ..file_config(dir.path())
    };
    let logger = Logger::new(&config).expect("logger");

    let mut meta = Meta::new();
    meta.insert("mount".to_string(), serde_json::json!("/data"));
    let id = logger
        .log_with(Level::Critical, "disk full", meta)
        .expect("critical is traced");
    logger.info("recovered");

    let lines = json_lines(&dir.path().join("app.log"));
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["level"], "crit");
    assert_eq!(lines[0]["message"], format!("disk full | trace: {}", id));
    assert_eq!(lines[0]["meta"]["mount"], "/data");
    assert_eq!(lines[0]["trace_id"], id.to_string());
    assert_eq!(lines[1]["level"], "debug");
    assert_eq!(lines[1]["trace_id"], id.to_string());
    assert!(lines[1]["meta"].is_null());
    assert_eq!(lines[2]["message"], "recovered");
}

#[test]
fn test_file_level_filters_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = LogConfig {
        raw_json: true,
        file_level: Level::Warning,
        ..file_config(dir.path())
    };
    let logger = Logger::new(&config).expect("logger");

    logger.debug("noise");
    logger.notice("still noise");
    logger.error("kept");

    let lines = json_lines(&dir.path().join("app.log"));
    // the error's stack record is debug and is filtered too
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "error");
}

#[cfg(unix)]
#[test]
fn test_symlink_points_at_active_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = LogConfig {
        filename: Some("app-%Y-%m-%d.log".to_string()),
        symlink: Some("current.log".to_string()),
        ..file_config(dir.path())
    };
    let logger = Logger::new(&config).expect("logger");

    logger.warning("through the link");

    let link = dir.path().join("current.log");
    let target = std::fs::read_link(&link).expect("symlink exists");
    let name = target.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("app-") && name.ends_with(".log"));
    let s = std::fs::read_to_string(&link).expect("read through symlink");
    assert!(s.contains("through the link"));
}

#[test]
fn test_log_root_from_pattern_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = LogConfig {
        filename: Some("%Y/app.log".to_string()),
        ..file_config(dir.path())
    };
    let logger = Logger::new(&config).expect("logger");

    logger.notice("nested");

    let year_dir = std::fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .find(|e| e.path().is_dir())
        .expect("year directory created");
    let s = std::fs::read_to_string(year_dir.path().join("app.log")).expect("read log file");
    assert!(s.contains("nested"));
}

#[test]
fn test_unwritable_root_does_not_panic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").expect("create file");

    let config = LogConfig {
        console: false,
        filename: Some("app.log".to_string()),
        log_root: Some(blocker),
        ..Default::default()
    };
    let errors = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&errors);
    let logger = Logger::new(&config)
        .expect("logger")
        .on_error(move |err| seen.lock().unwrap().push(err.to_string()));

    logger.error("nowhere to go");

    let errors = errors.lock().unwrap();
    // message and stack record both failed
    let failed = errors.iter().filter(|e| e.contains("rotation")).count();
    assert_eq!(failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_keep_trace_after_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = LogConfig {
        raw_json: true,
        ..file_config(dir.path())
    };
    let logger = Arc::new(Logger::new(&config).expect("logger"));

    let mut tasks = Vec::new();
    for task in 0..8 {
        let log = logger.extend();
        tasks.push(tokio::spawn(async move {
            for i in 0..20 {
                log.error(&format!("task {} failure {}", task, i));
                log.info(&format!("task {} progress {}", task, i));
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    let lines = json_lines(&dir.path().join("app.log"));
    assert_eq!(lines.len(), 8 * 20 * 3);

    let mut i = 0;
    while i < lines.len() {
        if lines[i]["level"] == "error" {
            let next = &lines[i + 1];
            assert_eq!(next["level"], "debug");
            assert_eq!(next["trace_id"], lines[i]["trace_id"]);
            i += 2;
        } else {
            assert_eq!(lines[i]["level"], "info");
            i += 1;
        }
    }
}
