pub mod linear;
pub mod newton;
