//! Log subscriber setup for the server binary.

use crate::KeywardenError;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` directives are honoured on top of the base level, which is
/// `info` or `debug` with `verbose`.
pub fn init(verbose: bool) -> Result<(), KeywardenError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive(
            "hyper=warn"
                .parse()
                .map_err(|e| KeywardenError::Config(format!("bad log directive: {e}")))?,
        );

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| KeywardenError::Config(format!("failed to set log subscriber: {e}")))
}
