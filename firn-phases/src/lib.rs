//! Reference implementations of the firn compiler phases.
//!
//! These phases compile a tiny language of class declarations:
//!
//! ```text
//! module m;
//! package p;
//! class A extends B {
//!     field x;
//!     method f {
//!         lambda { use C; }
//!         ref C::g;
//!         warn;
//!     }
//!     class Inner { }
//! }
//! ```
//!
//! Superclasses are named by their flat name, e.g. `extends A$Inner`.
//! Besides nested declarations, a class contains statements
//! that the phases interpret as follows.
//! `use C;` must name a known class.
//! `warn;` and `error;` are reported during attribution.
//! `crash;`, `panic;`, `incomplete;` and `exhaust;` make attribution fail.
//! `unreachable;` is reported during flow analysis.
//! `toolarge;` makes code generation fail.
//! Any other keyword statement is carried through untouched.
//!
//! Every phase records its invocations in a shared [`Trace`],
//! which lets tests observe what the driver asked for and when.

#![warn(missing_docs)]

pub use self::{
    attr::*, enter::*, files::*, flow::*, gen::*, lower::*,
    modules::*, parse::*, process::*, trace::*,
};

mod attr;
mod enter;
mod files;
mod flow;
mod gen;
mod lower;
mod modules;
mod parse;
mod process;
mod trace;

#[cfg(test)]
mod testing;
