//! Registry-wide structural validators.

pub mod cycles;
pub mod duplicates;
