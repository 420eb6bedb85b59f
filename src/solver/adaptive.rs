use std::f64::consts::TAU;

use crate::eom::{DomainError, EquationOfMotion};
use crate::prelude::*;
use crate::solver::alpha::{AlphaConfig, GeneralizedAlpha};
use crate::solver::{DynamicError, Integrator, State, TimeHistory};

/// Step-size control parameters for the adaptive generalized-alpha run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConfig {
    /// Step size of the first step.
    pub dt_start: f64,
    /// Target number of steps per oscillation period.
    pub n_period: f64,
    /// Lower bound on the step size. The controller may shrink the step by
    /// any factor in a single update but never below this floor, so a run
    /// always makes progress near stiff transients.
    pub dt_min: f64,
}

impl StepConfig {
    pub fn new(dt_start: f64, n_period: f64) -> Self {
        StepConfig {
            dt_start,
            n_period,
            dt_min: 1e-12,
        }
    }
}

/// Generalized-alpha wrapped in a step-size controller. After each accepted
/// step the instantaneous natural frequency is estimated from a Rayleigh
/// quotient over the last displacement increment and the next step size is
/// chosen to keep `n_period` samples per oscillation period, with growth
/// limited to a factor of two per step (Chrisfield) to keep the controller
/// itself from oscillating.
pub struct AdaptiveAlpha<'a, E: EquationOfMotion> {
    eom: &'a E,
    integrator: GeneralizedAlpha<'a, E>,
    config: StepConfig,
}

impl<'a, E: EquationOfMotion> AdaptiveAlpha<'a, E> {
    pub fn new(eom: &'a E, alpha: AlphaConfig, config: StepConfig) -> Self {
        AdaptiveAlpha {
            eom,
            integrator: GeneralizedAlpha::new(eom, alpha),
            config,
        }
    }

    /// Runs from `(u0, v0)` at t = 0 until `t_end`, selecting the step size
    /// before every step.
    pub fn run(&self, u0: VectorD, v0: VectorD, t_end: f64) -> Result<TimeHistory, DynamicError> {
        let mut history = TimeHistory::new(State::initial(self.eom, u0, v0)?);
        let mut dt = self.config.dt_start;

        while history.last().t < t_end {
            let next = self.integrator.advance(&history, dt)?;
            history.push(next);
            dt = self.next_timestep(&history, dt)?;
        }

        Ok(history)
    }

    /// Rayleigh quotient estimate `w^2 = |du'*Kt*du / du'*M*du|` of the
    /// current squared natural frequency, target step `2*pi/(n_period*w)`,
    /// growth capped at a factor of two.
    fn next_timestep(&self, history: &TimeHistory, dt: f64) -> Result<f64, DynamicError> {
        let state = history.last();
        let Some(prev) = history.prev() else {
            return Ok(dt);
        };
        let du = &state.u - &prev.u;

        let kt = self
            .eom
            .tangent(&state.u)
            .map_err(|source| DynamicError::Domain {
                t: state.t,
                dt,
                source,
            })?;

        let denominator = du.dot(&(self.eom.mass() * &du));
        if denominator == 0.0 {
            return Err(DynamicError::Domain {
                t: state.t,
                dt,
                source: DomainError::new("zero displacement increment in frequency estimate"),
            });
        }

        let w2 = (du.dot(&(kt * &du)) / denominator).abs();
        if w2 == 0.0 || !w2.is_finite() {
            return Err(DynamicError::Domain {
                t: state.t,
                dt,
                source: DomainError::new("degenerate frequency estimate"),
            });
        }

        let dt_star = TAU / (self.config.n_period * w2.sqrt());
        let zeta = dt_star / dt;

        Ok((zeta.min(2.0) * dt).max(self.config.dt_min))
    }
}
