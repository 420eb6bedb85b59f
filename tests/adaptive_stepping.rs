use std::f64::consts::TAU;

use approx::assert_relative_eq;
use nalgebra::dvector;

use transient::eom::{DomainError, EquationOfMotion};
use transient::prelude::*;
use transient::solver::{simulate, AlphaConfig, DynamicError, Scheme, StepConfig};

struct Oscillator {
    m: f64,
    k: f64,
    p: f64,
}

impl EquationOfMotion for Oscillator {
    fn mass(&self) -> MatrixD {
        MatrixD::from_element(1, 1, self.m)
    }
    fn damping(&self) -> MatrixD {
        MatrixD::zeros(1, 1)
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

// Free mass without any stiffness, so the frequency estimate has nothing
// to work with
struct FreeMass;

impl EquationOfMotion for FreeMass {
    fn mass(&self) -> MatrixD {
        MatrixD::from_element(1, 1, 1.0)
    }
    fn damping(&self) -> MatrixD {
        MatrixD::zeros(1, 1)
    }
    fn internal_force(&self, _u: &VectorD) -> Result<VectorD, DomainError> {
        Ok(VectorD::zeros(1))
    }
    fn tangent(&self, _u: &VectorD) -> Result<MatrixD, DomainError> {
        Ok(MatrixD::zeros(1, 1))
    }
    fn load(&self, _t: f64) -> VectorD {
        dvector![1.0]
    }
}

#[test]
fn step_size_settles_at_the_target_period_fraction() {
    // For a linear oscillator the Rayleigh quotient gives exactly w^2 = k/m,
    // so the controller must grow the step from dt_start towards
    // dt* = 2*pi/(n_period*w) and then hold it there
    let eom = Oscillator {
        m: 0.1,
        k: 1e5,
        p: 0.0,
    };
    let omega = f64::sqrt(eom.k / eom.m);
    let n_period = 50.0;
    let dt_target = TAU / (n_period * omega);

    let history = simulate(
        &eom,
        dvector![0.01],
        dvector![0.0],
        0.05,
        Scheme::GeneralizedAlphaAdaptive {
            config: AlphaConfig::from_rho_inf(1.0),
            step: StepConfig::new(1e-6, n_period),
        },
    )
    .unwrap();

    assert!(history.last().t >= 0.05);

    // Growth is limited to a factor of two per step
    let steps = history.increments().map(|(a, b)| b.t - a.t).collect_vec();
    for pair in steps.windows(2) {
        assert!(pair[1] <= 2.0 * pair[0] * (1.0 + 1e-12));
    }

    // The final step size sits at the target
    assert_relative_eq!(*steps.last().unwrap(), dt_target, max_relative = 1e-9);
}

#[test]
fn run_from_rest_fails_with_domain_error() {
    // Zero load and zero initial state produce a step with du = 0 exactly,
    // which must surface as a DomainError instead of a division by zero
    let eom = Oscillator {
        m: 1.0,
        k: 100.0,
        p: 0.0,
    };

    let result = simulate(
        &eom,
        dvector![0.0],
        dvector![0.0],
        1.0,
        Scheme::GeneralizedAlphaAdaptive {
            config: AlphaConfig::from_rho_inf(1.0),
            step: StepConfig::new(1e-3, 50.0),
        },
    );

    assert!(matches!(result, Err(DynamicError::Domain { .. })));
}

#[test]
fn zero_tangent_fails_with_domain_error() {
    let result = simulate(
        &FreeMass,
        dvector![0.0],
        dvector![0.0],
        1.0,
        Scheme::GeneralizedAlphaAdaptive {
            config: AlphaConfig::from_rho_inf(1.0),
            step: StepConfig::new(1e-3, 50.0),
        },
    );

    match result {
        Err(DynamicError::Domain { t, dt, .. }) => {
            assert!(t > 0.0);
            assert_eq!(dt, 1e-3);
        }
        other => panic!("expected a domain error, got {other:?}"),
    }
}
