//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the certification
//! pipeline: tools, artifacts, stages, exit-code tables, outcomes, run
//! configuration and the unified error type.
//!
//! ## Exit-code model
//! - Decision procedures report 10 (satisfiable/true) or 20 (unsatisfiable/false)
//! - All other tools report 0 on success
//! - Anything else is an undifferentiated tool error, never retried

mod artifact;
mod config;
mod decision;
mod error;
mod outcome;
mod stage;
mod tool;

pub use artifact::*;
pub use config::*;
pub use decision::*;
pub use error::*;
pub use outcome::*;
pub use stage::*;
pub use tool::*;
