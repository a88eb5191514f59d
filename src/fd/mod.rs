//! Finite-domain constraint solving (spec §4.4–§4.7).
pub mod constraint;
pub mod domain;
pub mod model;
pub mod optimize;
pub mod solver;
pub mod variable;
