//! Driver of the firn compiler.
//!
//! The driver sequences parsing, symbol entry, annotation processing,
//! attribution, flow analysis, lowering and code generation over the
//! environments entered from the source files.
//! The phases themselves are collaborators implementing the traits in
//! [`firn_core::phase`]; the driver decides which environments they see,
//! in which order, and when to stop.

#![warn(missing_docs)]

pub use self::{compiler::*, error::*};

mod compiler;
mod desugar;
mod error;
mod front;
mod print;
mod process;
mod schedule;

#[cfg(test)]
mod tests;
