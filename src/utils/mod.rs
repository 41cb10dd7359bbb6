pub mod build_info;
pub mod persistence;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Directive used when neither `RUST_LOG` nor the config supplies one.
pub const DEFAULT_LOG_DIRECTIVE: &str = "budget_ledger=info";

/// Initializes the global tracing subscriber. `RUST_LOG` wins over
/// `directive`; an unparseable directive falls back to
/// [`DEFAULT_LOG_DIRECTIVE`]. Logs go to stderr so command output stays clean.
pub fn init_tracing(directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(directive.unwrap_or(DEFAULT_LOG_DIRECTIVE)))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
