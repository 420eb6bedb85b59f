use crate::eom::EquationOfMotion;
use crate::numerics::linear;
use crate::prelude::*;
use crate::solver::{DynamicError, Integrator, State, TimeHistory};

/// Explicit central difference scheme. Conditionally stable, so the step
/// size must resolve the highest natural frequency of the system. Requires
/// the last two states; the very first step runs against the backwards
/// extrapolation `u(-dt) = u0 - dt*v0 + dt^2/2*a0`.
pub struct CentralDifference<'a, E: EquationOfMotion> {
    eom: &'a E,
}

impl<'a, E: EquationOfMotion> CentralDifference<'a, E> {
    pub fn new(eom: &'a E) -> Self {
        CentralDifference { eom }
    }
}

impl<'a, E: EquationOfMotion> Integrator for CentralDifference<'a, E> {
    fn advance(&self, history: &TimeHistory, dt: f64) -> Result<State, DynamicError> {
        let state = history.last();
        let t_next = state.t + dt;

        let u_prev = match history.prev() {
            Some(prev) => prev.u.clone(),
            None => &state.u - dt * &state.v + dt * dt / 2.0 * &state.a,
        };

        // Free acceleration at the current displacement and velocity
        let q = self
            .eom
            .internal_force(&state.u)
            .map_err(|source| DynamicError::Domain {
                t: state.t,
                dt,
                source,
            })?;
        let rhs = self.eom.load(t_next) - self.eom.damping() * &state.v - q;
        let a_free = linear::solve(self.eom.mass(), &rhs).map_err(|_| {
            DynamicError::SingularOperator { t: state.t, dt }
        })?;

        // Three-point recurrence on the displacement
        let u_next = 2.0 * &state.u - u_prev + dt * dt * a_free;
        let v_next = (&u_next - &state.u) / dt;
        let a_next = (&v_next - &state.v) / dt;

        Ok(State {
            t: t_next,
            u: u_next,
            v: v_next,
            a: a_next,
        })
    }
}
