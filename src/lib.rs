//! Restarted, right-preconditioned GMRES(m), generic over a vector-space
//! [`operand::Operand`] so it solves `Vec<f64>` systems and arbitrarily-shaped
//! operand types alike.

pub mod basis;
pub mod error;
pub mod gmres;
pub mod hessenberg;
pub mod operand;
pub mod operator;
pub mod preconditioner;

pub use error::{BreakdownKind, GmresError, Result};
pub use gmres::{solve, GmresConfig, GmresOutcome};
pub use operand::Operand;
pub use operator::Operator;
pub use preconditioner::Preconditioner;
