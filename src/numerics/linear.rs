use thiserror::Error;

use crate::prelude::*;

/// The linear system has no solution because the operator is numerically
/// singular. Structural failure of the model, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("linear system is numerically singular")]
pub struct SingularOperatorError;

/// Solves `A*x = b` for a symmetric operator A by LU decomposition.
pub fn solve(a: MatrixD, b: &VectorD) -> Result<VectorD, SingularOperatorError> {
    a.lu().solve(b).ok_or(SingularOperatorError)
}
