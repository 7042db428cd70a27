//! Kernel utilities shared across slices.
//! Keep this crate lightweight: layered config loading, the slice-aware API state,
//! and the system routes every server mounts.
//!
//! ## Config loading (non-wasm)
//! ```rust,ignore
//! #[cfg(not(target_arch = "wasm32"))]
//! # {
//!     use helios_kernel::config::load_config;
//!     let cfg: serde_json::Value = load_config::<serde_json::Value>(Some("server")).unwrap();
//! # }
//! ```
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod prelude;
#[cfg(feature = "server")]
pub mod server;

pub use helios_domain as domain;
