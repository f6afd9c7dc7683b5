//! Model and collaborator contracts of the firn compiler driver.
//!
//! The driver itself lives in the `firn` crate.
//! This crate defines what the driver schedules:
//! compilation units and the environments entered from them,
//! the ledger of how far each environment has progressed,
//! the diagnostic log and the policy deciding when to stop,
//! and the object-safe traits through which the driver
//! calls the parser, symbol entry, attribution, flow analysis,
//! the lowering passes, the code generator and annotation processing.

#![warn(missing_docs)]

pub mod context;
pub mod env;
pub mod error;
pub mod file;
pub mod log;
pub mod options;
pub mod phase;
pub mod state;
pub mod stop;
pub mod symbol;
pub mod tree;
