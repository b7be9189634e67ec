use crate::severity::LogSeverity;
use crate::time::now;
use once_cell::sync::Lazy;

/// Set `MAPART_DEBUG` to any value to see debug lines.
static DEBUG_ENABLED: Lazy<bool> = Lazy::new(|| std::env::var_os("MAPART_DEBUG").is_some());

pub fn enabled(log_severity: LogSeverity) -> bool {
    log_severity != LogSeverity::Debug || *DEBUG_ENABLED
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if enabled(log_severity) {
        println!("[{}] {} {}", log_severity, now(), msg);
    }
}
