//! CLI command implementations

pub mod hosts;
pub mod keygen;
pub mod run;
