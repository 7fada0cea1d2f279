//! Log output for MarkForge searches.
//!
//! Installs a `tracing-subscriber` formatter filtered through `RUST_LOG`.
//! Without `RUST_LOG`, proposer and breakdown initialization summaries are
//! shown at INFO; per-kernel events need `markforge_solver=debug`.

use std::sync::OnceLock;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes log output at INFO.
///
/// Safe to call multiple times - only the first call has effect.
pub fn init() {
    init_with_level(LevelFilter::INFO);
}

/// Initializes log output with `level` as the default directive.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_with_level(level: LevelFilter) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init_with_level(LevelFilter::TRACE);
    }
}
