//! Facade crate for Helios features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `helios` with the `server` feature for the HTTP surface.
//! - Call [`init`] to register feature slices; extend as new slices appear.

pub use helios_domain as domain;
use helios_domain::config::ApiConfig;
use helios_domain::registry::InitializedSlice;
pub use helios_kernel as kernel;

#[cfg(feature = "server")]
pub mod server {
    pub mod router {
        pub use helios_forecast::http::router as forecast_router;
        pub use helios_kernel::server::router::system_router;
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use helios_forecast as forecast;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "server")]
        "server",
        "forecast",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initialize all enabled features.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init(
    config: &ApiConfig,
) -> Result<Vec<InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    let mut slices = Vec::new();

    // Forecast (model and schema registries)
    slices.push(features::forecast::init(config)?);

    Ok(slices)
}
