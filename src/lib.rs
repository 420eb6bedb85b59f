//! Time integration of the semi-discrete equation of motion
//! `M*a + D*v + Q(u) = P(t)` with a constant mass operator M, constant
//! damping D, a possibly nonlinear internal force Q and an external load P.
//!
//! The schemes in [`solver`] all advance one state per call and share the
//! [`solver::Integrator`] contract; [`solver::simulate`] is the entry point
//! that selects a scheme and runs it to a given end time.

pub mod eom;
pub mod numerics;
pub mod prelude;
pub mod solver;
