//! Shared string constants used across slices and the HTTP surface.

/// `OpenAPI` tag for system endpoints (health, entry page).
pub const SYSTEM_TAG: &str = "System";
/// `OpenAPI` tag for prediction endpoints.
pub const FORECAST_TAG: &str = "Forecast";

/// Quantity predicted by every bundled model.
pub const DEFAULT_TARGET: &str = "control_ppc_active_power_1m";

pub const WINTER: &str = "winter";
pub const SPRING: &str = "spring";
pub const SUMMER: &str = "summer";
pub const FALL: &str = "fall";

/// Every season key, in calendar order starting from winter.
pub const SEASONS: [&str; 4] = [WINTER, SPRING, SUMMER, FALL];
