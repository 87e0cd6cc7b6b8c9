//! Environment variable names read by [`Config::from_env`](crate::init::Config::from_env).
//!
//! These are purely helpers; destinations and the fan-out handler never
//! touch the environment.

/// Minimum level, e.g. `debug`, `info`, `warn`, `error`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// `true`/`false`: whether to log to stdout.
pub const LOG_CONSOLE_ENV: &str = "LOG_CONSOLE";

/// Console encoding, `text` or `json`.
pub const LOG_CONSOLE_FORMAT_ENV: &str = "LOG_CONSOLE_FORMAT";

/// Path of the log file; setting it enables file output.
pub const LOG_FILE_ENV: &str = "LOG_FILE";

/// File encoding, `text` or `json`.
pub const LOG_FILE_FORMAT_ENV: &str = "LOG_FILE_FORMAT";

/// `true`/`false`: whether to record file:line of the call site.
pub const LOG_ADD_SOURCE_ENV: &str = "LOG_ADD_SOURCE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and blank as absent.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Interpret common truthy/falsy spellings; anything else is `None`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
