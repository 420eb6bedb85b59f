pub use itertools::{izip, Itertools};

//------------------------------------------------------------------------------
// Types
//------------------------------------------------------------------------------

/// Column vector (Degrees of Freedom)
pub type VectorD = nalgebra::DVector<f64>;

/// Matrix (DOFs x DOFs)
pub type MatrixD = nalgebra::OMatrix<f64, nalgebra::Dyn, nalgebra::Dyn>;
