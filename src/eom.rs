use thiserror::Error;

use crate::prelude::*;

/// An operator of the physical model was evaluated outside the input range it
/// supports. Fatal for the step that triggered it; recovery by step-size
/// reduction is the caller's business, not this layer's.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("operator evaluated outside its valid domain: {reason}")]
pub struct DomainError {
    pub reason: String,
}

impl DomainError {
    pub fn new(reason: impl Into<String>) -> Self {
        DomainError {
            reason: reason.into(),
        }
    }
}

/// Semi-discrete equation of motion `M*a + D*v + Q(u) = P(t)`.
///
/// Supplies the operators and forces consumed by every stepping scheme.
/// All methods must be deterministic pure functions of their arguments:
/// the mass and damping operators are constant over a run, the tangent
/// stiffness may depend on the current displacement and is re-evaluated
/// at every Newton iteration point.
pub trait EquationOfMotion {
    /// Constant symmetric mass operator M.
    fn mass(&self) -> MatrixD;

    /// Constant symmetric damping operator D.
    fn damping(&self) -> MatrixD;

    /// Internal force Q(u).
    fn internal_force(&self, u: &VectorD) -> Result<VectorD, DomainError>;

    /// Tangent stiffness Kt(u) = dQ/du.
    fn tangent(&self, u: &VectorD) -> Result<MatrixD, DomainError>;

    /// External load P(t).
    fn load(&self, t: f64) -> VectorD;
}
