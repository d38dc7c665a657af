use std::{fmt::Display, fs::OpenOptions, io::Write, path::PathBuf, sync::RwLock};

use anyhow::Result;
use once_cell::sync::Lazy;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const LOG_FILE: &str = "proxybridge.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

/**
 * \brief 日志落盘位置与开关；进程内唯一，默认关闭。
 */
struct Sink {
    enabled: bool,
    dir: PathBuf,
}

static SINK: Lazy<RwLock<Sink>> = Lazy::new(|| {
    let dir = std::env::var("PROXYBRIDGE_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    RwLock::new(Sink {
        enabled: false,
        dir: PathBuf::from(dir),
    })
});

pub fn set_enabled(enabled: bool) {
    if let Ok(mut sink) = SINK.write() {
        sink.enabled = enabled;
    }
}

pub fn is_enabled() -> bool {
    SINK.read().map(|s| s.enabled).unwrap_or(false)
}

/**
 * \brief 修改日志目录，默认 `logs`（或环境变量 PROXYBRIDGE_LOG_DIR）。
 */
pub fn set_log_dir(dir: impl Into<PathBuf>) {
    if let Ok(mut sink) = SINK.write() {
        sink.dir = dir.into();
    }
}

pub fn log_file_path() -> PathBuf {
    let dir = SINK
        .read()
        .map(|s| s.dir.clone())
        .unwrap_or_else(|_| PathBuf::from("logs"));
    dir.join(LOG_FILE)
}

/**
 * \brief 把键值对拼成 `k=v k=v`，调用方负责不传入密钥等敏感值。
 */
pub fn fields(pairs: &[(&str, &dyn Display)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn log_event(category: &str, message: &str) {
    log(Level::Info, category, message);
}

pub fn log_error(category: &str, message: &str) {
    log(Level::Error, category, message);
}

/**
 * \brief 追加一行日志；关闭时直接返回，写入失败只打印到 stderr。
 */
pub fn log(level: Level, category: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    let line = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map(|ts| format_line(&ts, level, category, message));
    let written = match line {
        Ok(line) => append(&line),
        Err(err) => Err(err.into()),
    };
    if let Err(err) = written {
        eprintln!("telemetry write failed: {}", err);
    }
}

fn format_line(timestamp: &str, level: Level, category: &str, message: &str) -> String {
    // one record per line
    let message = message.replace('\n', "\\n");
    format!("{} [{}] {} - {}", timestamp, level.as_str(), category, message)
}

fn append(line: &str) -> Result<()> {
    let path = log_file_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_and_fields() {
        let line = format_line(
            "2026-01-01T00:00:00Z",
            Level::Error,
            "bridge.invoke",
            &fields(&[("provider", &"openai"), ("status", &502)]),
        );
        assert_eq!(
            line,
            "2026-01-01T00:00:00Z [ERROR] bridge.invoke - provider=openai status=502"
        );
        assert_eq!(
            format_line("t", Level::Info, "c", "a\nb"),
            "t [INFO] c - a\\nb"
        );
    }

    #[test]
    fn test_log_lines_written_when_enabled() {
        let dir = tempfile::tempdir().expect("tempdir");
        set_log_dir(dir.path());
        set_enabled(true);

        log_event("test.telemetry", "hello");
        log_error("test.telemetry", "boom");

        let content = std::fs::read_to_string(dir.path().join(LOG_FILE)).expect("read log");
        assert!(content.contains("[INFO] test.telemetry - hello"));
        assert!(content.contains("[ERROR] test.telemetry - boom"));

        set_enabled(false);
        log_event("test.telemetry", "silent");
        let content = std::fs::read_to_string(dir.path().join(LOG_FILE)).expect("read log");
        assert!(!content.contains("silent"));
    }
}
