//! WASM bindings for the double pendulum simulation core.

pub mod logger;
pub mod pendulum;

pub use pendulum::{EnergyReport, WasmDoublePendulum};
