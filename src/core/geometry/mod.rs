pub mod manifold;
pub mod quaternion;
pub mod se2;
pub mod twist;
pub mod validity;

pub use manifold::{Manifold, SE2};
pub use quaternion::{QuatOperand, Quaternion};
pub use se2::{Se2, Se2Operand, Se2Product};
pub use twist::Twist2;
