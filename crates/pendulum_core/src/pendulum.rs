use crate::clock::Clock;
use crate::integrator::{Integrator, IntegratorKind};
use crate::traits::AccelerationField;
use crate::trail::{Trail, TrailSample};
use crate::units::UnitConversions;
use crate::vector::Vector;
use anyhow::{bail, Context, Result};
use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Frames arriving slower than this do not advance the physics.
pub const MIN_FRAMERATE: f64 = 10.0;

/// Pointer button that drags the first link.
pub const DRAG_BUTTON: i16 = 0;

/// Canvas width expressed in units of the total pendulum length.
const VIEW_SPAN: f64 = 2.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PendulumConfig {
    pub g: f64,
    pub m1: f64,
    pub m2: f64,
    pub l1: f64,
    pub l2: f64,
    pub trail_duration: f64,
    pub show_trail: bool,
    pub show_pendulum: bool,
    #[serde(alias = "integratorKind")]
    pub integrator: IntegratorKind,
    pub timestep: f64,
    /// Initial angles (θ1, θ2) from the downward vertical.
    pub theta: [f64; 2],
    /// Initial angular velocities (ω1, ω2).
    pub omega: [f64; 2],
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            g: 9.8,
            m1: 1.0,
            m2: 0.5,
            l1: 1.0,
            l2: 0.5,
            trail_duration: 5.0,
            show_trail: true,
            show_pendulum: true,
            integrator: IntegratorKind::Rk4,
            timestep: 0.01,
            theta: [0.8 * PI, 0.9 * PI],
            omega: [0.0, 0.0],
        }
    }
}

impl PendulumConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.g.is_finite() {
            bail!("Gravity must be finite (got {}).", self.g);
        }
        for (name, value) in [("m1", self.m1), ("m2", self.m2), ("l1", self.l1), ("l2", self.l2)] {
            if !(value > 0.0) || !value.is_finite() {
                bail!("{} must be positive (got {}).", name, value);
            }
        }
        if !(self.timestep > 0.0) || !self.timestep.is_finite() {
            bail!("timestep must be positive (got {}).", self.timestep);
        }
        if !self.trail_duration.is_finite() || self.trail_duration < 0.0 {
            bail!(
                "trailDuration must be non-negative (got {}).",
                self.trail_duration
            );
        }
        if self.theta.iter().chain(&self.omega).any(|v| !v.is_finite()) {
            bail!("Initial angles and angular velocities must be finite.");
        }
        Ok(())
    }
}

/// Physical parameters and equations of motion of the double pendulum.
///
/// Angles are measured from the downward vertical in screen coordinates
/// (y grows downwards), so `θ = 0` hangs straight down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumDynamics {
    pub g: f64,
    pub m1: f64,
    pub m2: f64,
    pub l1: f64,
    pub l2: f64,
}

impl From<&PendulumConfig> for PendulumDynamics {
    fn from(config: &PendulumConfig) -> Self {
        Self {
            g: config.g,
            m1: config.m1,
            m2: config.m2,
            l1: config.l1,
            l2: config.l2,
        }
    }
}

impl PendulumDynamics {
    /// Angular accelerations (α1, α2).
    pub fn angular_acceleration(&self, theta: [f64; 2], omega: [f64; 2]) -> [f64; 2] {
        let Self { g, m1, m2, l1, l2 } = *self;
        let [theta1, theta2] = theta;
        let [omega1, omega2] = omega;
        let (sin_d, cos_d) = (theta2 - theta1).sin_cos();
        let total = m1 + m2;

        let alpha1 = (m2 * l1 * omega1 * omega1 * sin_d * cos_d
            + m2 * g * theta2.sin() * cos_d
            + m2 * l2 * omega2 * omega2 * sin_d
            - total * g * theta1.sin())
            / (total * l1 - m2 * l1 * cos_d * cos_d);
        let alpha2 = (-m2 * l2 * omega2 * omega2 * sin_d * cos_d
            + total
                * (g * theta1.sin() * cos_d - l1 * omega1 * omega1 * sin_d - g * theta2.sin()))
            / (total * l2 - m2 * l2 * cos_d * cos_d);
        [alpha1, alpha2]
    }

    pub fn kinetic_energy(&self, theta: [f64; 2], omega: [f64; 2]) -> f64 {
        let Self { m1, m2, l1, l2, .. } = *self;
        let [omega1, omega2] = omega;
        let coupling = (theta[1] - theta[0]).cos();
        0.5 * (m1 + m2) * l1 * l1 * omega1 * omega1
            + 0.5 * m2 * l2 * l2 * omega2 * omega2
            + m2 * l1 * l2 * omega1 * omega2 * coupling
    }

    /// Gravitational energy relative to both links hanging straight down.
    pub fn potential_energy(&self, theta: [f64; 2]) -> f64 {
        let Self { g, m1, m2, l1, l2 } = *self;
        (m1 + m2) * g * l1 * (1.0 - theta[0].cos()) + m2 * g * l2 * (1.0 - theta[1].cos())
    }

    /// Positions of both masses relative to the pivot, in metres.
    pub fn mass_positions(&self, theta: [f64; 2]) -> [[f64; 2]; 2] {
        let (s1, c1) = theta[0].sin_cos();
        let (s2, c2) = theta[1].sin_cos();
        let p1 = [self.l1 * s1, self.l1 * c1];
        let p2 = [p1[0] + self.l2 * s2, p1[1] + self.l2 * c2];
        [p1, p2]
    }
}

impl AccelerationField for PendulumDynamics {
    fn acceleration(&self, position: &Vector, velocity: &Vector, _t: f64) -> Vector {
        let [alpha1, alpha2] = self.angular_acceleration(
            [position.x(), position.y()],
            [velocity.x(), velocity.y()],
        );
        Vector::from_dvector(DVector::from_vec(vec![alpha1, alpha2]))
    }
}

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Pointer state polled once per frame, in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    /// Identity of the pressed button, if any.
    pub button: Option<i16>,
    pub x: f64,
    pub y: f64,
}

impl PointerState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn pressed(button: i16, x: f64, y: f64) -> Self {
        Self {
            button: Some(button),
            x,
            y,
        }
    }
}

/// Everything the renderer needs for one frame.
///
/// Positions are in metres relative to the pivot; `pivot_px` and
/// `pixels_per_metre` place them on the canvas once it has been sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub time: f64,
    pub steps: usize,
    pub theta: [f64; 2],
    pub omega: [f64; 2],
    pub mass1: [f64; 2],
    pub mass2: [f64; 2],
    pub radius1: f64,
    pub radius2: f64,
    pub pivot_px: Option<[f64; 2]>,
    pub pixels_per_metre: Option<f64>,
    /// Both mass centres in canvas pixels, once the canvas is sized.
    pub mass_px: Option<[[f64; 2]; 2]>,
    pub trail: Vec<TrailSample>,
    pub trail_duration: f64,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
    pub total_energy: f64,
    pub paused: bool,
    pub dragging: bool,
    pub show_trail: bool,
    pub show_pendulum: bool,
}

#[derive(Debug, Clone, Copy)]
struct FrameMark {
    wall: f64,
    time: f64,
}

/// Interactive double pendulum driven once per displayed frame.
pub struct DoublePendulum {
    config: PendulumConfig,
    integrator: Integrator<PendulumDynamics>,
    clock: Clock,
    trail: Trail,
    viewport: Option<Viewport>,
    units: Option<UnitConversions>,
    dragging: bool,
    last_frame: Option<FrameMark>,
}

impl DoublePendulum {
    /// Builds the pendulum with a running clock reading zero at `now`.
    pub fn new(config: PendulumConfig, now: f64) -> Result<Self> {
        config.validate()?;
        let position = Vector::new(config.theta.to_vec())?;
        let velocity = Vector::new(config.omega.to_vec())?;
        let integrator = Integrator::new(
            config.integrator,
            PendulumDynamics::from(&config),
            position,
            velocity,
            config.timestep,
        )
        .context("Failed to build the pendulum integrator.")?;
        let trail = Trail::new(config.trail_duration)?;

        Ok(Self {
            config,
            integrator,
            clock: Clock::new(now),
            trail,
            viewport: None,
            units: None,
            dragging: false,
            last_frame: None,
        })
    }

    pub fn config(&self) -> &PendulumConfig {
        &self.config
    }

    pub fn dynamics(&self) -> &PendulumDynamics {
        self.integrator.field()
    }

    pub fn integrator(&self) -> &Integrator<PendulumDynamics> {
        &self.integrator
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn theta(&self) -> [f64; 2] {
        let position = self.integrator.position();
        [position.x(), position.y()]
    }

    pub fn omega(&self) -> [f64; 2] {
        let velocity = self.integrator.velocity();
        [velocity.x(), velocity.y()]
    }

    pub fn energy_kinetic(&self) -> f64 {
        self.dynamics().kinetic_energy(self.theta(), self.omega())
    }

    pub fn energy_potential(&self) -> f64 {
        self.dynamics().potential_energy(self.theta())
    }

    pub fn energy_total(&self) -> f64 {
        self.energy_kinetic() + self.energy_potential()
    }

    pub fn mass_positions(&self) -> [[f64; 2]; 2] {
        self.dynamics().mass_positions(self.theta())
    }

    /// Draw radius of each mass, growing with the cube root of its mass.
    pub fn mass_radii(&self) -> [f64; 2] {
        [0.05 * self.config.m1.cbrt(), 0.05 * self.config.m2.cbrt()]
    }

    /// Sizes the canvas. The pivot sits at its centre and the old trail is
    /// dropped, since it was drawn for the previous scale.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        if !(height > 0.0) || !height.is_finite() {
            bail!("Canvas height must be positive (got {}).", height);
        }
        let units = UnitConversions::new(VIEW_SPAN * (self.config.l1 + self.config.l2), width)?;
        self.units = Some(units);
        self.viewport = Some(Viewport { width, height });
        self.trail.clear();
        Ok(())
    }

    pub fn pivot_px(&self) -> Option<[f64; 2]> {
        self.viewport.map(|v| [0.5 * v.width, 0.5 * v.height])
    }

    /// Canvas pixel positions of both masses.
    pub fn masses_px(&self) -> Option<[[f64; 2]; 2]> {
        let (units, pivot) = (self.units?, self.pivot_px()?);
        Some(self.mass_positions().map(|p| {
            let [x, y] = units.point_m_to_px(p);
            [pivot[0] + x, pivot[1] + y]
        }))
    }

    pub fn start(&mut self, now: f64) {
        self.clock.start(now);
    }

    pub fn stop(&mut self, now: f64) {
        self.clock.pause(now);
    }

    /// Clears the trail and brings both links to rest where they are.
    pub fn reset(&mut self) -> Result<()> {
        self.trail.clear();
        let dimension = self.integrator.dimension();
        self.integrator.set_velocity(Vector::zeros(dimension)?)
    }

    pub fn set_hidden(&mut self, now: f64, hidden: bool) {
        self.clock.set_hidden(now, hidden);
    }

    pub fn set_speed(&mut self, now: f64, speed: f64) -> Result<()> {
        self.clock.set_speed(now, speed)
    }

    /// Advances the simulation to wall time `now` and returns what to draw.
    ///
    /// Physics runs at most once per frame, from the previous frame's
    /// simulation time to the current one, and is skipped when the frame
    /// interval implies fewer than `MIN_FRAMERATE` frames per second.
    pub fn frame(&mut self, now: f64, pointer: &PointerState) -> Result<FrameSnapshot> {
        let time = self.clock.time(now);
        let mut steps = 0;

        if !self.clock.is_paused() {
            if let Some(mark) = self.last_frame {
                let interval = now - mark.wall;
                if interval > 1.0 / MIN_FRAMERATE {
                    debug!(
                        "Frame interval {:.3}s is below {} fps; skipping physics.",
                        interval, MIN_FRAMERATE
                    );
                } else if time > mark.time {
                    steps = self.integrator.integrate_fixed(mark.time, time)?;
                }
            }
        }

        self.apply_pointer(now, pointer)?;

        let time = self.clock.time(now);
        if !self.clock.is_paused() {
            let [_, mass2] = self.mass_positions();
            self.trail.push(time, mass2);
        }
        self.last_frame = Some(FrameMark { wall: now, time });

        Ok(self.snapshot(time, steps))
    }

    fn apply_pointer(&mut self, now: f64, pointer: &PointerState) -> Result<()> {
        if pointer.button == Some(DRAG_BUTTON) {
            let (Some(units), Some(pivot_px)) = (self.units, self.pivot_px()) else {
                debug!("Ignoring pointer drag before the canvas has been sized.");
                return Ok(());
            };
            let pointer_m = Vector::new(units.point_px_to_m([pointer.x, pointer.y]).to_vec())?;
            let pivot_m = Vector::new(units.point_px_to_m(pivot_px).to_vec())?;
            let theta = FRAC_PI_2 - pointer_m.sub(&pivot_m)?.heading();

            let [_, theta2] = self.theta();
            self.integrator.set_position(Vector::new(vec![theta, theta2])?)?;
            self.clock.pause(now);
            self.reset()?;
            if !self.dragging {
                debug!("Drag started.");
            }
            self.dragging = true;
        } else if self.dragging {
            self.clock.start(now);
            self.dragging = false;
            debug!("Drag released at theta1 = {:.3}.", self.theta()[0]);
        }
        Ok(())
    }

    fn snapshot(&self, time: f64, steps: usize) -> FrameSnapshot {
        let [mass1, mass2] = self.mass_positions();
        let [radius1, radius2] = self.mass_radii();
        let kinetic_energy = self.energy_kinetic();
        let potential_energy = self.energy_potential();
        FrameSnapshot {
            time,
            steps,
            theta: self.theta(),
            omega: self.omega(),
            mass1,
            mass2,
            radius1,
            radius2,
            pivot_px: self.pivot_px(),
            pixels_per_metre: self.units.map(|u| u.pixels_per_metre()),
            mass_px: self.masses_px(),
            trail: self.trail.to_vec(),
            trail_duration: self.trail.duration(),
            kinetic_energy,
            potential_energy,
            total_energy: kinetic_energy + potential_energy,
            paused: self.clock.is_paused(),
            dragging: self.dragging,
            show_trail: self.config.show_trail,
            show_pendulum: self.config.show_pendulum,
        }
    }
}
