//! areapop - population statistics for a map area.
//!
//! Client core for a map tool that reports population, household and age
//! statistics for a drawn circle or polygon, or for a Korean administrative
//! region. Runs natively (command-line host) and in the browser (wasm).

pub mod api;
pub mod cache;
pub mod capture;
pub mod config;
pub mod constants;
pub mod geo;
pub mod mode;
pub mod model;
pub mod query;
pub mod region;
pub mod report;
pub mod session;

#[cfg(target_arch = "wasm32")]
mod web_storage;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
#[cfg(target_arch = "wasm32")]
pub use web_storage::SessionStorage;
