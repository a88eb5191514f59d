//! Derived relational goals built on top of the goal algebra (spec §4.3).
//!
//! Each relation here is a plain function returning a [`crate::goal::Goal`],
//! mirroring the teacher's one-relation-per-file layout (`relation/*.rs`)
//! but built from this crate's closure-based goals instead of the
//! `proto_vulcan!`/`proto_vulcan_closure!` macros, which this crate does not
//! carry forward (see DESIGN.md).
pub mod control;
pub mod list_algorithms;
pub mod list_basics;
pub mod list_measures;
pub mod typed;

pub use control::{conda, conde, condu, noto, onceo, project};
pub use list_algorithms::{appendo, permuteo, rembero, reverso, subseto};
pub use list_basics::{car, cdr, cons, membero, nullo, pairo};
pub use list_measures::{distincto, flatteno, lengtho, lengtho_int};
pub use typed::{absento, neq, numbero, symbolo};
