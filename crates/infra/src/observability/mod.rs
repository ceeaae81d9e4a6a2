//! Logging and tracing setup
//!
//! Libraries in this workspace only emit `tracing` events. Binaries and host
//! applications call [`init_tracing`] once at startup to install a subscriber.
//! `RUST_LOG` overrides the default level.

use backoffice_domain::Environment;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};

/// Level used when `RUST_LOG` is unset or invalid.
pub fn default_directive(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "debug",
        Environment::Production => "info",
    }
}

/// Install the global subscriber: pretty output in development, JSON lines
/// in production.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing(environment: Environment) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(environment)));

    let installed = match environment {
        Environment::Development => {
            registry().with(filter).with(fmt::layer().pretty()).try_init()
        }
        Environment::Production => {
            registry().with(filter).with(fmt::layer().json().with_current_span(true)).try_init()
        }
    };

    match installed {
        Ok(()) => {
            tracing::debug!(%environment, "Tracing initialized");
            true
        }
        Err(_) => false,
    }
}
