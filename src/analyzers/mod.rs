//! Per-evidence-type heuristic analyzers. Each is an independent pure
//! function over its raw input; none of them share state or call each other.

pub mod deepfake;
pub mod email;
pub mod image;
pub mod message;
pub mod profile;
pub mod video;
