use crate::eom::EquationOfMotion;
use crate::numerics::newton::NewtonSolver;
use crate::prelude::*;
use crate::solver::newmark::{u_pred, v_pred, NewmarkConfig};
use crate::solver::{DynamicError, Integrator, State, TimeHistory};

/// Generalized-alpha method constants, derived from the spectral radius at
/// infinity `rho_inf` in `[0, 1]`:
///
/// - `rho_inf = 1`: no numerical dissipation, recovers undamped Newmark
/// - `rho_inf = 0`: asymptotic annihilation of the high-frequency response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaConfig {
    pub alpha_m: f64,
    pub alpha_f: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl AlphaConfig {
    pub fn from_rho_inf(rho_inf: f64) -> Self {
        let alpha_m = (2.0 * rho_inf - 1.0) / (rho_inf + 1.0);
        let alpha_f = rho_inf / (rho_inf + 1.0);
        let gamma = 0.5 - alpha_m + alpha_f;
        let beta = 0.25 * (1.0 - alpha_m + alpha_f).powi(2);

        AlphaConfig {
            alpha_m,
            alpha_f,
            beta,
            gamma,
        }
    }

    pub(crate) fn newmark(&self) -> NewmarkConfig {
        NewmarkConfig {
            beta: self.beta,
            gamma: self.gamma,
        }
    }
}

impl Default for AlphaConfig {
    fn default() -> Self {
        Self::from_rho_inf(1.0)
    }
}

/// Generalized-alpha scheme: Newmark predictors with the residual evaluated
/// at alpha-shifted states, giving controllable dissipation of spurious
/// high-frequency content while keeping second-order accuracy.
pub struct GeneralizedAlpha<'a, E: EquationOfMotion> {
    eom: &'a E,
    config: AlphaConfig,
    newton: NewtonSolver,
}

impl<'a, E: EquationOfMotion> GeneralizedAlpha<'a, E> {
    pub fn new(eom: &'a E, config: AlphaConfig) -> Self {
        GeneralizedAlpha {
            eom,
            config,
            newton: NewtonSolver::default(),
        }
    }

    pub fn with_newton(mut self, newton: NewtonSolver) -> Self {
        self.newton = newton;
        self
    }
}

impl<'a, E: EquationOfMotion> Integrator for GeneralizedAlpha<'a, E> {
    fn advance(&self, history: &TimeHistory, dt: f64) -> Result<State, DynamicError> {
        let state = history.last();
        let t_next = state.t + dt;
        let AlphaConfig {
            alpha_m, alpha_f, ..
        } = self.config;
        let nm = self.config.newmark();

        let m = self.eom.mass();
        let d = self.eom.damping();
        let q_prev = self
            .eom
            .internal_force(&state.u)
            .map_err(|source| DynamicError::Domain {
                t: state.t,
                dt,
                source,
            })?;
        let p_alpha = (1.0 - alpha_f) * self.eom.load(t_next) + alpha_f * self.eom.load(state.t);

        // Residual at the alpha-shifted states between step k and k+1
        let f = |a_next: &VectorD| {
            let a_alpha = (1.0 - alpha_m) * a_next + alpha_m * &state.a;
            let v_alpha = (1.0 - alpha_f) * v_pred(&nm, state, dt, a_next) + alpha_f * &state.v;
            let q_alpha = (1.0 - alpha_f)
                * self.eom.internal_force(&u_pred(&nm, state, dt, a_next))?
                + alpha_f * &q_prev;
            Ok(&m * a_alpha + &d * v_alpha + q_alpha - &p_alpha)
        };
        let df = |a_next: &VectorD| {
            let kt = self.eom.tangent(&u_pred(&nm, state, dt, a_next))?;
            Ok((1.0 - alpha_m) * &m + (1.0 - alpha_f) * (nm.gamma * dt * &d + nm.beta * dt * dt * kt))
        };

        let a_next = self
            .newton
            .find_root(f, df, &state.a)
            .map_err(|e| DynamicError::from_newton(state.t, dt, e))?;
        let u_next = u_pred(&nm, state, dt, &a_next);
        let v_next = v_pred(&nm, state, dt, &a_next);

        Ok(State {
            t: t_next,
            u: u_next,
            v: v_next,
            a: a_next,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_constants_without_dissipation() {
        // rho_inf = 1 recovers the average acceleration Newmark constants
        let config = AlphaConfig::from_rho_inf(1.0);

        assert_relative_eq!(config.alpha_m, 0.5);
        assert_relative_eq!(config.alpha_f, 0.5);
        assert_relative_eq!(config.beta, 0.25);
        assert_relative_eq!(config.gamma, 0.5);
    }

    #[test]
    fn test_constants_asymptotic_annihilation() {
        let config = AlphaConfig::from_rho_inf(0.0);

        assert_relative_eq!(config.alpha_m, -1.0);
        assert_relative_eq!(config.alpha_f, 0.0);
        assert_relative_eq!(config.beta, 1.0);
        assert_relative_eq!(config.gamma, 1.5);
    }
}
