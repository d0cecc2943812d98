//! Utilities for logging.
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` directives take precedence over `level`. Fails if a global
/// subscriber was already set.
pub fn configure_global_logger<W>(
    level: Level,
    format: LogFormat,
    writer: W,
) -> Result<(), SetGlobalDefaultError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter(level))
        .with_writer(writer);

    match format {
        LogFormat::HumanReadable => set_global_default(builder.with_target(false).finish()),
        LogFormat::Json => set_global_default(
            builder
                .json()
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true)
                .finish(),
        ),
    }
}

/// Log to the test writer at debug level. Safe to call from every test.
pub fn init_test() {
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = set_global_default(subscriber);
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}
