pub mod matrix;
pub mod real;
pub mod symbolic;

pub use real::Real;
pub use symbolic::Expr;
