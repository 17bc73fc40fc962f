//! log4rs setup: rolling `app.log`, a separate `metrics.log` for the
//! `nexus_column::metrics` target, and an optional `dev6.log` for developer lines.
//!
//! The first successful call installs the global logger; later calls swap the
//! configuration on the same handle.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::errors::DbError;
use crate::utils::devlog::DEV_TARGET;

pub const METRICS_TARGET: &str = "nexus_column::metrics";

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

static HANDLE: Mutex<Option<log4rs::Handle>> = Mutex::new(None);

fn config_err(e: impl std::fmt::Display) -> DbError {
    DbError::Config(format!("logger: {e}"))
}

fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, DbError> {
    let roller = FixedWindowRoller::builder()
        .build(&base.join(format!("{stem}.{{}}.log")).display().to_string(), keep)
        .map_err(config_err)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))
        .map_err(|e| DbError::Io(e.to_string()))
}

fn install(config: Config) -> Result<(), DbError> {
    let mut handle = HANDLE.lock();
    if let Some(h) = handle.as_ref() {
        h.set_config(config);
        return Ok(());
    }
    *handle = Some(log4rs::init_config(config).map_err(config_err)?);
    Ok(())
}

/// Configures process-wide logging.
///
/// - `dir`: base directory for log files (created if missing); current directory when `None`
/// - `level`: `off|error|warn|info|debug|trace`, default `info`
/// - `retention`: rolled files kept per log, default 7
///
/// # Errors
/// `Io` when the directory or files cannot be created, `Config` when log4rs
/// rejects the configuration or another logger owns the global slot.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
) -> Result<(), DbError> {
    configure_logging_with_dev(dir, level, retention, false)
}

/// Like [`configure_logging`], additionally persisting `dev6!` lines to
/// `dev6.log` when `enable_dev6` is set.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_dev6: bool,
) -> Result<(), DbError> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&base).map_err(|e| DbError::Io(format!("{}: {e}", base.display())))?;
    let keep = retention.unwrap_or(7);
    let lvl = parse_level(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(&base, "metrics", keep)?)))
        .logger(Logger::builder().appender("metrics").additive(false).build(METRICS_TARGET, lvl));

    builder = if enable_dev6 {
        builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(&base, "dev6", keep)?)))
            .logger(Logger::builder().appender("dev6").additive(false).build(DEV_TARGET, LevelFilter::Trace))
    } else {
        builder.logger(Logger::builder().additive(false).build(DEV_TARGET, LevelFilter::Off))
    };

    let config = builder.build(Root::builder().appender("app").build(lvl)).map_err(config_err)?;
    install(config)
}

/// Reads `NEXUS_COLUMN_LOG_DIR`, `NEXUS_COLUMN_LOG_LEVEL`,
/// `NEXUS_COLUMN_LOG_RETENTION` and `NEXUS_COLUMN_DEV6`.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), DbError> {
    let dir = std::env::var("NEXUS_COLUMN_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("NEXUS_COLUMN_LOG_LEVEL").ok();
    let retention =
        std::env::var("NEXUS_COLUMN_LOG_RETENTION").ok().and_then(|s| s.trim().parse::<u32>().ok());
    let dev6 = std::env::var("NEXUS_COLUMN_DEV6")
        .is_ok_and(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    configure_logging_with_dev(dir.as_deref(), level.as_deref(), retention, dev6)
}

/// Initializes logging from a log4rs YAML file.
///
/// # Errors
/// `Config` when the file cannot be loaded or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), DbError> {
    log4rs::init_file(path, log4rs::config::Deserializers::default()).map_err(config_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(parse_level(Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("off")), LevelFilter::Off);
        assert_eq!(parse_level(Some("bogus")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }
}
