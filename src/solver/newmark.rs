use crate::eom::EquationOfMotion;
use crate::numerics::linear;
use crate::numerics::newton::NewtonSolver;
use crate::prelude::*;
use crate::solver::{DynamicError, Integrator, State, TimeHistory};

/// Newmark family constants. Unconditionally stable for
/// `beta >= 1/4*(gamma + 1/2)^2` with `gamma >= 1/2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewmarkConfig {
    pub beta: f64,
    pub gamma: f64,
}

impl NewmarkConfig {
    /// Average constant acceleration (trapezoidal rule), unconditionally stable.
    pub fn average_acceleration() -> Self {
        NewmarkConfig {
            beta: 0.25,
            gamma: 0.5,
        }
    }

    /// Linear acceleration, conditionally stable.
    pub fn linear_acceleration() -> Self {
        NewmarkConfig {
            beta: 1.0 / 6.0,
            gamma: 0.5,
        }
    }
}

impl Default for NewmarkConfig {
    fn default() -> Self {
        Self::average_acceleration()
    }
}

/// Newmark displacement predictor as a pure function of the previous state
/// and the candidate acceleration.
pub(crate) fn u_pred(config: &NewmarkConfig, state: &State, dt: f64, a_next: &VectorD) -> VectorD {
    &state.u
        + dt * &state.v
        + dt * dt * ((0.5 - config.beta) * &state.a + config.beta * a_next)
}

/// Newmark velocity predictor.
pub(crate) fn v_pred(config: &NewmarkConfig, state: &State, dt: f64, a_next: &VectorD) -> VectorD {
    &state.v + dt * ((1.0 - config.gamma) * &state.a + config.gamma * a_next)
}

/// Implicit Newmark-beta for constant stiffness: one solve per step against
/// the effective operator `M + gamma*dt*D + beta*dt^2*K`, no iteration.
pub struct NewmarkLinear<'a, E: EquationOfMotion> {
    eom: &'a E,
    config: NewmarkConfig,
}

impl<'a, E: EquationOfMotion> NewmarkLinear<'a, E> {
    pub fn new(eom: &'a E, config: NewmarkConfig) -> Self {
        NewmarkLinear { eom, config }
    }
}

impl<'a, E: EquationOfMotion> Integrator for NewmarkLinear<'a, E> {
    fn advance(&self, history: &TimeHistory, dt: f64) -> Result<State, DynamicError> {
        let state = history.last();
        let t_next = state.t + dt;
        let NewmarkConfig { beta, gamma } = self.config;

        let m = self.eom.mass();
        let d = self.eom.damping();
        let k = self
            .eom
            .tangent(&state.u)
            .map_err(|source| DynamicError::Domain {
                t: state.t,
                dt,
                source,
            })?;

        let m_eff = &m + gamma * dt * &d + beta * dt * dt * &k;
        let p_eff = self.eom.load(t_next)
            - &k * (&state.u + dt * &state.v + dt * dt * (0.5 - beta) * &state.a)
            - &d * (&state.v + (1.0 - gamma) * dt * &state.a);

        let a_next = linear::solve(m_eff, &p_eff).map_err(|_| {
            DynamicError::SingularOperator { t: state.t, dt }
        })?;
        let u_next = u_pred(&self.config, state, dt, &a_next);
        let v_next = v_pred(&self.config, state, dt, &a_next);

        Ok(State {
            t: t_next,
            u: u_next,
            v: v_next,
            a: a_next,
        })
    }
}

/// Implicit Newmark-beta with Newton iteration on the acceleration residual
/// `f(a) = M*a + D*v_pred(a) + Q(u_pred(a)) - P(t_next)`, for nonlinear
/// internal forces.
pub struct Newmark<'a, E: EquationOfMotion> {
    eom: &'a E,
    config: NewmarkConfig,
    newton: NewtonSolver,
}

impl<'a, E: EquationOfMotion> Newmark<'a, E> {
    pub fn new(eom: &'a E, config: NewmarkConfig) -> Self {
        Newmark {
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

impl<'a, E: EquationOfMotion> Integrator for Newmark<'a, E> {
    fn advance(&self, history: &TimeHistory, dt: f64) -> Result<State, DynamicError> {
        let state = history.last();
        let t_next = state.t + dt;
        let NewmarkConfig { beta, gamma } = self.config;

        let m = self.eom.mass();
        let d = self.eom.damping();
        let p_next = self.eom.load(t_next);

        let f = |a_next: &VectorD| {
            let q = self.eom.internal_force(&u_pred(&self.config, state, dt, a_next))?;
            Ok(&m * a_next + &d * v_pred(&self.config, state, dt, a_next) + q - &p_next)
        };
        let df = |a_next: &VectorD| {
            let kt = self.eom.tangent(&u_pred(&self.config, state, dt, a_next))?;
            Ok(&m + gamma * dt * &d + beta * dt * dt * kt)
        };

        // The previous acceleration is the essential starting point
        let a_next = self
            .newton
            .find_root(f, df, &state.a)
            .map_err(|e| DynamicError::from_newton(state.t, dt, e))?;
        let u_next = u_pred(&self.config, state, dt, &a_next);
        let v_next = v_pred(&self.config, state, dt, &a_next);

        Ok(State {
            t: t_next,
            u: u_next,
            v: v_next,
            a: a_next,
        })
    }
}
