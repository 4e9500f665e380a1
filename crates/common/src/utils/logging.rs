use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,store=info";

#[derive(Clone, Copy)]
enum Format {
    Compact,
    Json,
}

/// Initialize tracing subscriber with compact, human-readable output.
/// - Respects `RUST_LOG` if set, e.g. `RUST_LOG=store=debug` to trace file I/O
/// - Writes to stderr; stdout is reserved for collection output
/// - Safe to call more than once; later calls are ignored
pub fn init_logging_default() {
    install(Format::Compact);
}

/// Same as [`init_logging_default`] but emits one JSON object per event,
/// with targets included.
pub fn init_logging_json() {
    install(Format::Json);
}

fn install(format: Format) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(env_filter).with_writer(io::stderr);
    let _ = match format {
        Format::Compact => builder.with_target(false).compact().try_init(),
        Format::Json => builder.with_target(true).json().try_init(),
    };
}
