use log::{error, info, LevelFilter};
use std::path::Path;

// For file-based logging with rotation
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Environment variable overriding the configured level
pub const LOG_ENV: &str = "TRIAGE_LOG";

/// Initialize the logger with timestamp, log level, and module path.
/// Logs go to a rotated file so they don't interleave with the review console.
pub fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let log_file_path = log_dir.join("triage.log");
    let archived_logs_pattern = format!("{}/triage.{{}}.log", log_dir.display());

    // Rotate at 10MB
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);

    // Keep 5 archived log files
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern, 5)
        .map_err(|e| format!("Failed to create log roller: {}", e))?;

    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(&log_file_path, Box::new(compound_policy))
        .map_err(|e| format!("Failed to create log appender: {}", e))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(Root::builder().appender("file").build(LevelFilter::Trace))
        .map_err(|e| format!("Failed to build log config: {}", e))?;

    log4rs::init_config(config).map_err(|e| format!("Failed to initialize log4rs: {}", e))?;

    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(level);
    log::set_max_level(level);

    info!("photo-triage started");
    info!("Logging to file: {}", log_file_path.display());
    Ok(())
}

/// `op path (details)`, the shape shared by change and failure lines
fn item_line(operation: &str, path: &Path, details: Option<&str>) -> String {
    match details {
        Some(details) if !details.is_empty() => {
            format!("{:<8} {} ({})", operation, path.display(), details)
        }
        _ => format!("{:<8} {}", operation, path.display()),
    }
}

/// A workflow step failed on one item; the batch goes on
pub fn log_item_failure(operation: &str, path: &Path, error: &dyn std::fmt::Display) {
    error!("{}", item_line(operation, path, Some(&error.to_string())));
}

/// A file was renamed, linked, moved, written or removed
pub fn log_item_change(operation: &str, path: &Path, details: Option<&str>) {
    info!("{}", item_line(operation, path, details));
}
