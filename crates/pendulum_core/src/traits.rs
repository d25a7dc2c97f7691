use crate::vector::Vector;

/// A second-order system `x'' = a(x, x', t)`.
///
/// Implemented for any `Fn(&Vector, &Vector, f64) -> Vector`, so a closure is
/// enough for ad-hoc systems.
pub trait AccelerationField {
    /// Evaluates the acceleration.
    /// position: current generalised coordinates
    /// velocity: their time derivatives
    /// t: current time
    fn acceleration(&self, position: &Vector, velocity: &Vector, t: f64) -> Vector;
}

impl<F> AccelerationField for F
where
    F: Fn(&Vector, &Vector, f64) -> Vector,
{
    fn acceleration(&self, position: &Vector, velocity: &Vector, t: f64) -> Vector {
        self(position, velocity, t)
    }
}

/// Position/velocity pair advanced by a stepper.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    pub position: Vector,
    pub velocity: Vector,
}

/// A fixed-step strategy that advances a phase state by one step.
pub trait Stepper {
    /// Performs one step of size dt starting at time t.
    /// Position and velocity are overwritten with the new state.
    fn step(&mut self, field: &impl AccelerationField, t: f64, state: &mut PhaseState, dt: f64);
}
