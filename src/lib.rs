//! ArgenDash data core
//!
//! The data layer behind an Argentine-market dashboard: domain API clients
//! for economic series, currency/equity/bond quotes, crypto, news, and
//! alerts; pure transforms from wire types to display models; a persistent
//! query cache with explicit staleness and single-flight fetching; and the
//! auth session layer.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod transform;

pub use error::{AppError, Result};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing. Call once at startup; `RUST_LOG` overrides the
/// default filter.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argendash_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
