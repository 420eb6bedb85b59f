pub mod adaptive;
pub mod alpha;
pub mod central;
pub mod newmark;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eom::{DomainError, EquationOfMotion};
use crate::numerics::linear;
use crate::numerics::newton::NewtonError;
use crate::prelude::*;

pub use adaptive::{AdaptiveAlpha, StepConfig};
pub use alpha::{AlphaConfig, GeneralizedAlpha};
pub use central::CentralDifference;
pub use newmark::{Newmark, NewmarkConfig, NewmarkLinear};

/// Failure of a simulation run, carrying the start time `t` of the failing
/// step and the step size `dt` it was attempted with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicError {
    #[error("at t = {t}, dt = {dt}: {source}")]
    Domain {
        t: f64,
        dt: f64,
        source: DomainError,
    },

    #[error("at t = {t}, dt = {dt}: linear system is numerically singular")]
    SingularOperator { t: f64, dt: f64 },

    /// The one condition a higher-level policy may recover from by reducing
    /// the step size and re-attempting the interval. This core never retries.
    #[error("at t = {t}, dt = {dt}: no convergence after {iterations} iterations, residual norm {residual:e}")]
    Convergence {
        t: f64,
        dt: f64,
        iterations: usize,
        residual: f64,
    },
}

impl DynamicError {
    pub(crate) fn from_newton(t: f64, dt: f64, err: NewtonError) -> Self {
        match err {
            NewtonError::Domain(source) => DynamicError::Domain { t, dt, source },
            NewtonError::Singular(_) => DynamicError::SingularOperator { t, dt },
            NewtonError::Convergence {
                iterations,
                residual,
            } => DynamicError::Convergence {
                t,
                dt,
                iterations,
                residual,
            },
        }
    }
}

/// Simulation state at one instant of time. Displacement, velocity and
/// acceleration share one fixed dimension for the lifetime of a run.
/// States are never mutated once recorded; every step produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub t: f64,
    pub u: VectorD,
    pub v: VectorD,
    pub a: VectorD,
}

impl State {
    /// Initial state at t = 0 with the consistent acceleration from
    /// `M*a0 = P(0) - D*v0 - Q(u0)`.
    pub fn initial<E: EquationOfMotion>(
        eom: &E,
        u0: VectorD,
        v0: VectorD,
    ) -> Result<Self, DynamicError> {
        let q0 = eom
            .internal_force(&u0)
            .map_err(|source| DynamicError::Domain {
                t: 0.0,
                dt: 0.0,
                source,
            })?;
        let a0 = linear::solve(eom.mass(), &(eom.load(0.0) - eom.damping() * &v0 - q0))
            .map_err(|_| DynamicError::SingularOperator { t: 0.0, dt: 0.0 })?;

        Ok(State {
            t: 0.0,
            u: u0,
            v: v0,
            a: a0,
        })
    }

    pub fn n_dofs(&self) -> usize {
        self.u.len()
    }
}

/// Append-only record of the states produced by a simulation run, in
/// simulation order. Always contains at least the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeHistory {
    states: Vec<State>,
}

impl TimeHistory {
    pub fn new(initial: State) -> Self {
        TimeHistory {
            states: vec![initial],
        }
    }

    pub fn push(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Last recorded state.
    pub fn last(&self) -> &State {
        &self.states[self.states.len() - 1]
    }

    /// State before the last one, if any. The central difference scheme reads
    /// a two-state window through this.
    pub fn prev(&self) -> Option<&State> {
        self.states.len().checked_sub(2).map(|i| &self.states[i])
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    /// Consecutive pairs of states, oldest first.
    pub fn increments(&self) -> impl Iterator<Item = (&State, &State)> {
        self.states.iter().tuple_windows()
    }
}

/// A single-step time integration scheme: given the recorded history and a
/// step size, produce the next state. Implementations read the last one or
/// two states and never mutate the history themselves.
pub trait Integrator {
    fn advance(&self, history: &TimeHistory, dt: f64) -> Result<State, DynamicError>;
}

/// Steps an integrator with a fixed step size until the end time is reached.
pub fn integrate<I: Integrator>(
    integrator: &I,
    history: &mut TimeHistory,
    dt: f64,
    t_end: f64,
) -> Result<(), DynamicError> {
    while history.last().t < t_end {
        let next = integrator.advance(history, dt)?;
        history.push(next);
    }

    Ok(())
}

/// Scheme selection for [`simulate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scheme {
    /// Explicit, conditionally stable.
    CentralDifference { dt: f64 },
    /// Implicit, one linear solve per step, valid for constant stiffness.
    NewmarkLinear { config: NewmarkConfig, dt: f64 },
    /// Implicit with Newton iteration, handles nonlinear internal forces.
    Newmark { config: NewmarkConfig, dt: f64 },
    /// Implicit with tunable high-frequency dissipation.
    GeneralizedAlpha { config: AlphaConfig, dt: f64 },
    /// Generalized-alpha with local-frequency step-size control.
    GeneralizedAlphaAdaptive { config: AlphaConfig, step: StepConfig },
}

/// Integrates the equation of motion from `(u0, v0)` at t = 0 until `t_end`
/// with the selected scheme and returns the recorded history.
pub fn simulate<E: EquationOfMotion>(
    eom: &E,
    u0: VectorD,
    v0: VectorD,
    t_end: f64,
    scheme: Scheme,
) -> Result<TimeHistory, DynamicError> {
    match scheme {
        Scheme::CentralDifference { dt } => {
            let mut history = TimeHistory::new(State::initial(eom, u0, v0)?);
            integrate(&CentralDifference::new(eom), &mut history, dt, t_end)?;
            Ok(history)
        }
        Scheme::NewmarkLinear { config, dt } => {
            let mut history = TimeHistory::new(State::initial(eom, u0, v0)?);
            integrate(&NewmarkLinear::new(eom, config), &mut history, dt, t_end)?;
            Ok(history)
        }
        Scheme::Newmark { config, dt } => {
            let mut history = TimeHistory::new(State::initial(eom, u0, v0)?);
            integrate(&Newmark::new(eom, config), &mut history, dt, t_end)?;
            Ok(history)
        }
        Scheme::GeneralizedAlpha { config, dt } => {
            let mut history = TimeHistory::new(State::initial(eom, u0, v0)?);
            integrate(&GeneralizedAlpha::new(eom, config), &mut history, dt, t_end)?;
            Ok(history)
        }
        Scheme::GeneralizedAlphaAdaptive { config, step } => {
            AdaptiveAlpha::new(eom, config, step).run(u0, v0, t_end)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use super::*;

    struct Oscillator {
        m: f64,
        k: f64,
        d: f64,
        p: f64,
    }

    impl EquationOfMotion for Oscillator {
        fn mass(&self) -> MatrixD {
            MatrixD::from_element(1, 1, self.m)
        }
        fn damping(&self) -> MatrixD {
            MatrixD::from_element(1, 1, self.d)
        }
        fn internal_force(&self, u: &VectorD) -> Result<VectorD, DomainError> {
            Ok(self.k * u)
        }
        fn tangent(&self, _u: &VectorD) -> Result<MatrixD, DomainError> {
            Ok(MatrixD::from_element(1, 1, self.k))
        }
        fn load(&self, _t: f64) -> VectorD {
            dvector![self.p]
        }
    }

    #[test]
    fn test_initial_state_acceleration() {
        let eom = Oscillator {
            m: 2.0,
            k: 10.0,
            d: 0.5,
            p: 3.0,
        };
        let state = State::initial(&eom, dvector![0.1], dvector![2.0]).unwrap();

        // a0 = (p - d*v0 - k*u0)/m
        assert_relative_eq!(state.a[0], (3.0 - 0.5 * 2.0 - 10.0 * 0.1) / 2.0);
        assert_eq!(state.t, 0.0);
        assert_eq!(state.n_dofs(), 1);
    }

    #[test]
    fn test_initial_state_singular_mass() {
        let eom = Oscillator {
            m: 0.0,
            k: 10.0,
            d: 0.0,
            p: 0.0,
        };
        let result = State::initial(&eom, dvector![0.0], dvector![0.0]);

        assert!(matches!(result, Err(DynamicError::SingularOperator { .. })));
    }

    #[test]
    fn test_history_access() {
        let state = |t: f64| State {
            t,
            u: dvector![t],
            v: dvector![0.0],
            a: dvector![0.0],
        };

        let mut history = TimeHistory::new(state(0.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.prev(), None);

        history.push(state(1.0));
        history.push(state(2.0));

        assert_eq!(history.len(), 3);
        assert_eq!(history.last().t, 2.0);
        assert_eq!(history.prev().map(|s| s.t), Some(1.0));

        let increments = history.increments().map(|(a, b)| (a.t, b.t)).collect_vec();
        assert_eq!(increments, vec![(0.0, 1.0), (1.0, 2.0)]);
    }
}
