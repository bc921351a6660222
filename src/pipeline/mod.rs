//! End-to-end assembly pipeline for one region.

pub mod assemble;

pub use assemble::{assemble, AssemblyOutput, AssemblyStats};
