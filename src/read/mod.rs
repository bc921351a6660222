//! Read storage: validated input sequences with optional qualities.

pub mod store;

pub use store::{Read, ReadStore};
