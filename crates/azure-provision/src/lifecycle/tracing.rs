//! # Tracing Setup
//!
//! Structured logging for the binary and for tests that want to see it.
//!
//! Verbosity comes from `RUST_LOG` and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=info cargo run                        # lifecycle and operation events
//! RUST_LOG=debug cargo run                       # every request and poll
//! RUST_LOG=provision_framework=debug cargo run   # orchestrator and simulator only
//! ```
//!
//! Spans from `#[instrument]` carry the resource kind, name and operation id, so a
//! single provisioning call can be followed from submit to its terminal state.

use tracing_subscriber::EnvFilter;

/// Installs a compact global subscriber. Calling it again is a no-op.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
