//! Command implementations.

mod certify;

pub use certify::run_certify;
