//! The `pendulum_core` crate is the numerical engine behind the double-pendulum page.
//! It has no browser dependency; the render loop drives it one frame at a time.
//!
//! Key components:
//! - **Algebra**: `Vector` (dynamic-length, broadcasting arithmetic) and `SquareMatrix` (rotations, products).
//! - **Traits**: `AccelerationField` (second-order systems) and `Stepper` (one fixed step).
//! - **Integrator**: Euler and RK4 behind `Integrator::integrate_fixed`, which always lands on the end time.
//! - **Clock**: Pausable, speed-scaled simulation time with a soft pause for hidden pages.
//! - **Pendulum**: The double pendulum itself, with energies, pointer dragging and a fading trail.
pub mod clock;
pub mod error;
pub mod integrator;
pub mod matrix;
pub mod pendulum;
mod solvers;
pub mod trail;
pub mod traits;
pub mod units;
pub mod vector;

pub use clock::Clock;
pub use error::AlgebraError;
pub use integrator::{Integrator, IntegratorKind};
pub use matrix::SquareMatrix;
pub use pendulum::{DoublePendulum, FrameSnapshot, PendulumConfig, PendulumDynamics, PointerState};
pub use trail::{Trail, TrailSample};
pub use units::UnitConversions;
pub use vector::Vector;
