//! Assembly graph: construction, compaction, and cleaning.

pub mod clean;
pub mod overlap;
pub mod unitig;

pub use clean::{clean_graph, CleanStats};
pub use overlap::build_graph;
pub use unitig::{Unitig, UnitigGraph};
