//! Logging service

use crate::models::LogLevel;

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match level {
        LogLevel::Error => "stepchain_core=error,stepchain_cli=error",
        LogLevel::Warn => "stepchain_core=warn,stepchain_cli=warn",
        LogLevel::Info => "stepchain_core=info,stepchain_cli=info",
        LogLevel::Debug => "stepchain_core=debug,stepchain_cli=debug",
        LogLevel::Trace => "stepchain_core=trace,stepchain_cli=trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Log a system error
pub fn log_error(error: &str, context: Option<&str>) {
    tracing::error!(
        error = error,
        context = context.unwrap_or(""),
        "System error occurred"
    );
}
