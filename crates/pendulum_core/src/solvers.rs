use crate::traits::{AccelerationField, PhaseState, Stepper};
use crate::vector::Vector;
use nalgebra::DVector;

/// Semi-implicit Euler: the velocity is updated first and the new velocity
/// moves the position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl Stepper for Euler {
    fn step(&mut self, field: &impl AccelerationField, t: f64, state: &mut PhaseState, dt: f64) {
        let accel = field.acceleration(&state.position, &state.velocity, t);
        debug_assert_eq!(accel.len(), state.velocity.len());

        // v = v + h*a
        let velocity = state.velocity.as_dvector() + accel.as_dvector() * dt;
        // x = x + h*v
        let position = state.position.as_dvector() + &velocity * dt;

        state.velocity = Vector::from_dvector(velocity);
        state.position = Vector::from_dvector(position);
    }
}

/// Classic Runge-Kutta 4th Order Solver over the phase vector q = [x, v].
pub struct Rk4 {
    dim: usize,
    k1: DVector<f64>,
    k2: DVector<f64>,
    k3: DVector<f64>,
    k4: DVector<f64>,
    tmp: DVector<f64>,
}

impl Rk4 {
    /// `dim` is the number of generalised coordinates; the phase vector is
    /// twice as long.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            k1: DVector::zeros(2 * dim),
            k2: DVector::zeros(2 * dim),
            k3: DVector::zeros(2 * dim),
            k4: DVector::zeros(2 * dim),
            tmp: DVector::zeros(2 * dim),
        }
    }
}

/// dq/dt = [v, a(x, v, t)]
fn equation_of_motion(
    field: &impl AccelerationField,
    dim: usize,
    t: f64,
    q: &DVector<f64>,
    out: &mut DVector<f64>,
) {
    let position = Vector::from_dvector(q.rows(0, dim).into_owned());
    let velocity = Vector::from_dvector(q.rows(dim, dim).into_owned());
    let accel = field.acceleration(&position, &velocity, t);
    debug_assert_eq!(accel.len(), dim);

    out.rows_mut(0, dim).copy_from(velocity.as_dvector());
    out.rows_mut(dim, dim).copy_from(accel.as_dvector());
}

impl Stepper for Rk4 {
    fn step(&mut self, field: &impl AccelerationField, t: f64, state: &mut PhaseState, dt: f64) {
        let dim = self.dim;
        let half = 0.5 * dt;
        let q = state.position.concat(&state.velocity).as_dvector().clone();

        // k1 = f(t, q)
        equation_of_motion(field, dim, t, &q, &mut self.k1);

        // k2 = f(t + h/2, q + h*k1/2)
        self.tmp.copy_from(&q);
        self.tmp.axpy(half, &self.k1, 1.0);
        equation_of_motion(field, dim, t + half, &self.tmp, &mut self.k2);

        // k3 = f(t + h/2, q + h*k2/2)
        self.tmp.copy_from(&q);
        self.tmp.axpy(half, &self.k2, 1.0);
        equation_of_motion(field, dim, t + half, &self.tmp, &mut self.k3);

        // k4 = f(t + h, q + h*k3)
        self.tmp.copy_from(&q);
        self.tmp.axpy(dt, &self.k3, 1.0);
        equation_of_motion(field, dim, t + dt, &self.tmp, &mut self.k4);

        // q_next = q + h/6 * (k1 + 2k2 + 2k3 + k4)
        let next = &q + (&self.k1 + &self.k2 * 2.0 + &self.k3 * 2.0 + &self.k4) * (dt / 6.0);

        state.position = Vector::from_dvector(next.rows(0, dim).into_owned());
        state.velocity = Vector::from_dvector(next.rows(dim, dim).into_owned());
    }
}
