//! Signal taxonomy mapping, pattern matching, cross-referencing and risk
//! aggregation over accumulated evidence.

pub mod aggregate;
pub mod crossref;
pub mod matcher;
pub mod next_steps;
pub mod patterns;
pub mod signal_map;
