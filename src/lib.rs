// Planar rigid transforms and quaternions
pub mod core {
    pub mod batch;
    pub mod block;
    pub mod geometry;
    pub mod math;
    pub mod value;
}

pub mod config;
pub mod error;
pub mod resolve;

pub use crate::config::{AlgebraConfig, AngleUnit};
pub use crate::core::batch::Batch;
pub use crate::core::block::Block;
pub use crate::core::geometry::{Manifold, QuatOperand, Quaternion, SE2, Se2, Se2Operand, Twist2};
pub use crate::core::math::{Expr, Real};
pub use crate::core::value::{BlockValue, QuaternionValue, Se2Value, ValueOperand, ValueProduct};
pub use crate::error::{Result, RigidError};
pub use crate::resolve::{Arg, Resolver};
