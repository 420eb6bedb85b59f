use thiserror::Error;

use crate::eom::DomainError;
use crate::numerics::linear::{self, SingularOperatorError};
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NewtonError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Singular(#[from] SingularOperatorError),

    #[error("no convergence after {iterations} iterations, residual norm {residual:e}")]
    Convergence { iterations: usize, residual: f64 },
}

/// Newton iteration for a vector-valued residual `f` with Jacobian `df`,
/// using the update `x -> x - df(x)^-1 * f(x)` solved through the linear
/// solver rather than explicit inversion.
///
/// Holds no state between calls. The starting point matters: stepping schemes
/// pass the previous acceleration, which makes smoothly varying force laws
/// converge in one or two iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolver {
    /// Residual norm tolerance.
    pub tol: f64,
    /// Maximum number of Newton updates before giving up.
    pub max_iter: usize,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        NewtonSolver {
            tol: 1e-8,
            max_iter: 20,
        }
    }
}

impl NewtonSolver {
    /// Finds `x` with `|f(x)| <= tol` starting from `x0`.
    pub fn find_root<F, J>(&self, mut f: F, mut df: J, x0: &VectorD) -> Result<VectorD, NewtonError>
    where
        F: FnMut(&VectorD) -> Result<VectorD, DomainError>,
        J: FnMut(&VectorD) -> Result<MatrixD, DomainError>,
    {
        let mut x = x0.clone();

        for _ in 0..self.max_iter {
            let residual = f(&x)?;
            if residual.norm() <= self.tol {
                return Ok(x);
            }

            let dx = linear::solve(df(&x)?, &residual)?;
            x -= dx;
        }

        // The last update may still have reached the tolerance
        let residual = f(&x)?;
        if residual.norm() <= self.tol {
            return Ok(x);
        }

        Err(NewtonError::Convergence {
            iterations: self.max_iter,
            residual: residual.norm(),
        })
    }
}
