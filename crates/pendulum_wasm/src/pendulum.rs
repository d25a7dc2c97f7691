//! Double pendulum wrapper driven by the page's `requestAnimationFrame` loop.

use crate::logger;
use js_sys::Float64Array;
use log::{info, LevelFilter};
use pendulum_core::pendulum::{DoublePendulum, FrameSnapshot, PendulumConfig, PointerState};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// `requestAnimationFrame` timestamps are in milliseconds.
fn ms_to_s(timestamp_ms: f64) -> f64 {
    timestamp_ms / 1000.0
}

fn decode_config(config: JsValue) -> Result<PendulumConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(PendulumConfig::default());
    }
    from_value(config).map_err(|err| JsValue::from_str(&format!("Invalid pendulum config: {err}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyReport {
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
}

#[wasm_bindgen]
pub struct WasmDoublePendulum {
    inner: DoublePendulum,
}

#[wasm_bindgen]
impl WasmDoublePendulum {
    /// `config` may be `undefined`/`null` for the defaults, or an object with
    /// any subset of the camelCase config fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, timestamp_ms: f64) -> Result<WasmDoublePendulum, JsValue> {
        console_error_panic_hook::set_once();
        logger::init(LevelFilter::Info);
        let config = decode_config(config)?;
        Self::from_config(config, timestamp_ms)
    }

    pub fn set_log_level(level: &str) -> Result<(), JsValue> {
        let level = logger::parse_level(level).map_err(|err| JsValue::from_str(&err))?;
        logger::init(level);
        Ok(())
    }

    /// Advances to `timestamp_ms` and returns the frame snapshot. `button` is
    /// the currently pressed pointer button, or `undefined` when none is.
    pub fn frame(
        &mut self,
        timestamp_ms: f64,
        button: Option<i16>,
        x: f64,
        y: f64,
    ) -> Result<JsValue, JsValue> {
        let snapshot = self
            .advance(timestamp_ms, PointerState { button, x, y })
            .map_err(|err| JsValue::from_str(&format!("Frame update failed: {err:#}")))?;
        to_value(&snapshot)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize frame: {err}")))
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.inner
            .resize(width, height)
            .map_err(|err| JsValue::from_str(&format!("Resize failed: {err:#}")))
    }

    pub fn start(&mut self, timestamp_ms: f64) {
        self.inner.start(ms_to_s(timestamp_ms));
    }

    pub fn stop(&mut self, timestamp_ms: f64) {
        self.inner.stop(ms_to_s(timestamp_ms));
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.inner
            .reset()
            .map_err(|err| JsValue::from_str(&format!("Reset failed: {err:#}")))
    }

    /// Hook for `visibilitychange`.
    pub fn set_hidden(&mut self, timestamp_ms: f64, hidden: bool) {
        self.inner.set_hidden(ms_to_s(timestamp_ms), hidden);
    }

    pub fn set_speed(&mut self, timestamp_ms: f64, speed: f64) -> Result<(), JsValue> {
        self.inner
            .set_speed(ms_to_s(timestamp_ms), speed)
            .map_err(|err| JsValue::from_str(&format!("Failed to set speed: {err:#}")))
    }

    pub fn get_time(&self, timestamp_ms: f64) -> f64 {
        self.inner.clock().time(ms_to_s(timestamp_ms))
    }

    pub fn is_paused(&self) -> bool {
        self.inner.clock().is_paused()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    pub fn energy_kinetic(&self) -> f64 {
        self.inner.energy_kinetic()
    }

    pub fn energy_potential(&self) -> f64 {
        self.inner.energy_potential()
    }

    pub fn energy_total(&self) -> f64 {
        self.inner.energy_total()
    }

    /// All three energies as `{ kinetic, potential, total }`.
    pub fn energies(&self) -> Result<JsValue, JsValue> {
        to_value(&self.energy_report())
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize energies: {err}")))
    }

    /// Trail samples packed as `[t0, x0, y0, t1, x1, y1, ...]`, in metres
    /// relative to the pivot.
    pub fn trail_buffer(&self) -> Float64Array {
        Float64Array::from(self.inner.trail().flatten().as_slice())
    }

    /// Fade factor per trail sample at `timestamp_ms`, oldest first.
    pub fn trail_alphas(&self, timestamp_ms: f64) -> Float64Array {
        Float64Array::from(self.alphas(timestamp_ms).as_slice())
    }
}

impl WasmDoublePendulum {
    pub fn from_config(config: PendulumConfig, timestamp_ms: f64) -> Result<Self, JsValue> {
        let inner = DoublePendulum::new(config, ms_to_s(timestamp_ms))
            .map_err(|err| JsValue::from_str(&format!("Failed to create pendulum: {err:#}")))?;
        info!(
            "Double pendulum ready ({} integrator, timestep {}).",
            inner.config().integrator,
            inner.config().timestep
        );
        Ok(Self { inner })
    }

    pub fn advance(
        &mut self,
        timestamp_ms: f64,
        pointer: PointerState,
    ) -> anyhow::Result<FrameSnapshot> {
        self.inner.frame(ms_to_s(timestamp_ms), &pointer)
    }

    pub fn pendulum(&self) -> &DoublePendulum {
        &self.inner
    }

    pub fn energy_report(&self) -> EnergyReport {
        let kinetic = self.inner.energy_kinetic();
        let potential = self.inner.energy_potential();
        EnergyReport {
            kinetic,
            potential,
            total: kinetic + potential,
        }
    }

    fn alphas(&self, timestamp_ms: f64) -> Vec<f64> {
        let now = self.inner.clock().time(ms_to_s(timestamp_ms));
        let duration = self.inner.trail().duration();
        self.inner
            .trail()
            .iter()
            .map(|sample| sample.alpha(now, duration))
            .collect()
    }
}
