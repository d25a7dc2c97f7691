use crate::solvers::{Euler, Rk4};
use crate::traits::{AccelerationField, PhaseState, Stepper};
use crate::vector::Vector;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative size below which the remainder of an interval is absorbed into
/// the previous step instead of becoming a sliver step of its own.
const SLIVER_FRACTION: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorKind {
    #[serde(alias = "Euler")]
    Euler,
    #[default]
    #[serde(alias = "RK4")]
    Rk4,
}

impl FromStr for IntegratorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euler" => Ok(IntegratorKind::Euler),
            "rk4" => Ok(IntegratorKind::Rk4),
            other => bail!("Unknown integrator '{}'. Expected 'euler' or 'rk4'.", other),
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegratorKind::Euler => write!(f, "euler"),
            IntegratorKind::Rk4 => write!(f, "rk4"),
        }
    }
}

impl IntegratorKind {
    fn build(self, dim: usize) -> InternalStepper {
        match self {
            IntegratorKind::Euler => InternalStepper::Euler(Euler),
            IntegratorKind::Rk4 => InternalStepper::Rk4(Rk4::new(dim)),
        }
    }
}

enum InternalStepper {
    Euler(Euler),
    Rk4(Rk4),
}

impl InternalStepper {
    fn step(&mut self, field: &impl AccelerationField, t: f64, state: &mut PhaseState, dt: f64) {
        match self {
            InternalStepper::Euler(s) => s.step(field, t, state, dt),
            InternalStepper::Rk4(s) => s.step(field, t, state, dt),
        }
    }
}

/// Fixed-step integrator for a second-order system.
///
/// Owns the current position and velocity and overwrites them on every step;
/// no history is kept.
pub struct Integrator<F: AccelerationField> {
    field: F,
    kind: IntegratorKind,
    stepper: InternalStepper,
    state: PhaseState,
    timestep: f64,
    dimension: usize,
    time: f64,
}

impl<F: AccelerationField> Integrator<F> {
    /// Validates the configuration and probes `field` once at `t = 0`.
    pub fn new(
        kind: IntegratorKind,
        field: F,
        position: Vector,
        velocity: Vector,
        timestep: f64,
    ) -> Result<Self> {
        if velocity.len() != position.len() {
            bail!(
                "Velocity vector must be the same length as the position vector (position {}, velocity {}).",
                position.len(),
                velocity.len()
            );
        }
        if !(timestep > 0.0) || !timestep.is_finite() {
            bail!("The timestep, h, must be > 0 (got {}).", timestep);
        }

        let probe = field.acceleration(&position, &velocity, 0.0);
        if probe.len() != position.len() {
            bail!(
                "Acceleration function must return vector of the same length as the position (expected {}, got {}).",
                position.len(),
                probe.len()
            );
        }

        let dimension = position.len();
        Ok(Self {
            field,
            kind,
            stepper: kind.build(dimension),
            state: PhaseState { position, velocity },
            timestep,
            dimension,
            time: 0.0,
        })
    }

    /// Integrates from `t_start` to `t_end` with the fixed timestep, shortening
    /// the final step so that the interval ends exactly on `t_end`.
    ///
    /// Returns the number of steps taken.
    pub fn integrate_fixed(&mut self, t_start: f64, t_end: f64) -> Result<usize> {
        if !t_start.is_finite() || !t_end.is_finite() {
            bail!(
                "Integration bounds must be finite (got {} to {}).",
                t_start,
                t_end
            );
        }
        if t_end < t_start {
            bail!(
                "Integration interval runs backwards ({} to {}).",
                t_start,
                t_end
            );
        }

        let h = self.timestep;
        let mut t = t_start;
        let mut steps = 0usize;
        while t < t_end {
            let mut next = (t_start + (steps + 1) as f64 * h).min(t_end);
            if t_end - next < SLIVER_FRACTION * h {
                next = t_end;
            }
            self.stepper.step(&self.field, t, &mut self.state, next - t);
            t = next;
            steps += 1;
        }
        self.time = t_end;
        Ok(steps)
    }

    pub fn kind(&self) -> IntegratorKind {
        self.kind
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Time reached by the last `integrate_fixed` call.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn position(&self) -> &Vector {
        &self.state.position
    }

    pub fn velocity(&self) -> &Vector {
        &self.state.velocity
    }

    pub fn set_position(&mut self, position: Vector) -> Result<()> {
        if position.len() != self.dimension {
            bail!(
                "Position dimension mismatch. Expected {}, got {}.",
                self.dimension,
                position.len()
            );
        }
        self.state.position = position;
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: Vector) -> Result<()> {
        if velocity.len() != self.dimension {
            bail!(
                "Velocity dimension mismatch. Expected {}, got {}.",
                self.dimension,
                velocity.len()
            );
        }
        self.state.velocity = velocity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f64]) -> Vector {
        Vector::new(values.to_vec()).unwrap()
    }

    fn free_fall(_x: &Vector, v: &Vector, _t: f64) -> Vector {
        Vector::splat(-9.8, v.len()).unwrap()
    }

    fn assert_err_contains<T>(result: Result<T>, needle: &str) {
        let err = match result {
            Ok(_) => panic!("expected error containing \"{needle}\""),
            Err(err) => err,
        };
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn construction_rejects_invalid_inputs() {
        assert_err_contains(
            Integrator::new(
                IntegratorKind::Rk4,
                free_fall,
                vector(&[0.0, 0.0]),
                vector(&[0.0]),
                0.1,
            ),
            "same length as the position vector",
        );
        assert_err_contains(
            Integrator::new(IntegratorKind::Euler, free_fall, vector(&[0.0]), vector(&[0.0]), 0.0),
            "must be > 0",
        );
        assert_err_contains(
            Integrator::new(IntegratorKind::Euler, free_fall, vector(&[0.0]), vector(&[0.0]), -1.0),
            "must be > 0",
        );
        assert_err_contains(
            Integrator::new(
                IntegratorKind::Euler,
                free_fall,
                vector(&[0.0]),
                vector(&[0.0]),
                f64::NAN,
            ),
            "must be > 0",
        );
    }

    #[test]
    fn construction_probes_acceleration_dimension() {
        let wrong = |_x: &Vector, _v: &Vector, _t: f64| Vector::zeros(3).unwrap();
        assert_err_contains(
            Integrator::new(IntegratorKind::Rk4, wrong, vector(&[0.0, 0.0]), vector(&[0.0, 0.0]), 0.1),
            "Acceleration function must return vector",
        );

        let probed_at = std::cell::Cell::new(f64::NAN);
        let recording = |_x: &Vector, v: &Vector, t: f64| {
            probed_at.set(t);
            Vector::zeros(v.len()).unwrap()
        };
        Integrator::new(IntegratorKind::Rk4, recording, vector(&[1.0]), vector(&[2.0]), 0.1)
            .expect("valid integrator");
        assert_eq!(probed_at.get(), 0.0);
    }

    #[test]
    fn integrate_fixed_lands_exactly_on_the_end_time() {
        let mut integrator =
            Integrator::new(IntegratorKind::Rk4, free_fall, vector(&[0.0]), vector(&[0.0]), 0.01)
                .unwrap();
        let cases = [(0.0, 0.025, 3usize), (1.0, 1.1, 10), (2.0, 2.0, 0), (0.3, 0.30001, 1)];
        for (start, end, expected_steps) in cases {
            let steps = integrator.integrate_fixed(start, end).unwrap();
            assert_eq!(steps, expected_steps, "steps for {start}..{end}");
            assert_eq!(integrator.time(), end);
        }
    }

    #[test]
    fn step_count_is_ceiling_of_interval_over_timestep() {
        let h = 0.01;
        let mut integrator =
            Integrator::new(IntegratorKind::Euler, free_fall, vector(&[0.0]), vector(&[0.0]), h)
                .unwrap();
        for delta in [0.005, 0.017, 0.0333, 0.1234, 0.5] {
            let steps = integrator.integrate_fixed(4.0, 4.0 + delta).unwrap();
            assert_eq!(steps, (delta / h).ceil() as usize, "delta {delta}");
            assert_eq!(integrator.time(), 4.0 + delta);
        }
    }

    #[test]
    fn partial_final_step_uses_the_remaining_time() {
        let mut integrator =
            Integrator::new(IntegratorKind::Rk4, free_fall, vector(&[0.0]), vector(&[0.0]), 0.1)
                .unwrap();
        integrator.integrate_fixed(0.0, 0.25).unwrap();
        let t: f64 = 0.25;
        assert!((integrator.velocity()[0] + 9.8 * t).abs() < 1e-12);
        assert!((integrator.position()[0] + 4.9 * t * t).abs() < 1e-12);
    }

    #[test]
    fn integrate_fixed_rejects_bad_intervals() {
        let mut integrator =
            Integrator::new(IntegratorKind::Rk4, free_fall, vector(&[0.0]), vector(&[0.0]), 0.1)
                .unwrap();
        assert_err_contains(integrator.integrate_fixed(1.0, 0.5), "runs backwards");
        assert_err_contains(integrator.integrate_fixed(0.0, f64::INFINITY), "finite");
    }

    #[test]
    fn state_setters_keep_the_dimension() {
        let mut integrator = Integrator::new(
            IntegratorKind::Rk4,
            free_fall,
            vector(&[0.0, 1.0]),
            vector(&[0.0, 0.0]),
            0.1,
        )
        .unwrap();
        assert_eq!(integrator.dimension(), 2);
        assert!(integrator.set_position(vector(&[1.0])).is_err());
        integrator.set_velocity(vector(&[3.0, 4.0])).unwrap();
        integrator.set_position(vector(&[2.0, 1.0])).unwrap();
        assert_eq!(integrator.position().as_slice(), &[2.0, 1.0]);
        assert_eq!(integrator.velocity().as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn integrator_kind_parses_names() {
        assert_eq!("RK4".parse::<IntegratorKind>().unwrap(), IntegratorKind::Rk4);
        assert_eq!("euler".parse::<IntegratorKind>().unwrap(), IntegratorKind::Euler);
        assert_err_contains("verlet".parse::<IntegratorKind>(), "Unknown integrator");
        assert_eq!(IntegratorKind::Euler.to_string(), "euler");
    }
}
