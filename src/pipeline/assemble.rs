//! Orchestration of one region assembly: read store -> optional error
//! correction -> overlap graph -> optional cleaning -> unitigs.

use serde::Serialize;
use tracing::info;

use crate::config::AssembleOptions;
use crate::correct::correct_reads;
use crate::error::Result;
use crate::graph::{build_graph, clean_graph, Unitig};
use crate::kmer::{auto_k, KmerIndex};
use crate::read::{Read, ReadStore};

/// What one invocation produces: corrected reads (when unitig construction
/// is skipped) or the cleaned unitig set. Either may be empty; an empty
/// region is a successful result.
#[derive(Debug)]
pub enum AssemblyOutput {
    Reads(Vec<Read>),
    Unitigs(Vec<Unitig>),
}

/// Run the whole pipeline on one region's reads.
///
/// Configuration is validated up front; nothing is processed on a bad
/// config. Identical input and options produce byte-identical output.
pub fn assemble(
    input: Vec<(Vec<u8>, Option<Vec<u8>>)>,
    opts: &AssembleOptions,
) -> Result<AssemblyOutput> {
    opts.validate()?;

    let mut store = ReadStore::from_reads(input)?;
    info!("loaded {} read(s)", store.len());

    if opts.do_error_correction && !store.is_empty() {
        let k = opts
            .error_correction_k
            .unwrap_or_else(|| auto_k::correction_k(&store));
        info!("error correction with k={}", k);
        let index = KmerIndex::build(&store, k);
        store = correct_reads(&store, &index, opts.correct);
    }

    if opts.skip_unitig_construction {
        return Ok(AssemblyOutput::Reads(store.into_reads()));
    }

    let k = opts.unitig_k.unwrap_or_else(|| auto_k::unitig_k(&store));
    info!("unitig construction with min overlap {}", k);
    let mut graph = build_graph(&store, k);

    if opts.do_graph_cleaning {
        clean_graph(&mut graph, &opts.clean);
    }

    let unitigs = graph.unitigs(&store);
    info!("{} unitig(s) assembled", unitigs.len());
    Ok(AssemblyOutput::Unitigs(unitigs))
}

/// Summary of an assembled unitig set, exportable as JSON.
#[derive(Debug, Serialize)]
pub struct AssemblyStats {
    pub unitigs: usize,
    pub total_len: usize,
    pub max_len: usize,
    pub mean_len: f64,
    pub mean_coverage: f64,
}

impl AssemblyStats {
    pub fn from_unitigs(unitigs: &[Unitig]) -> Self {
        let total_len: usize = unitigs.iter().map(|u| u.seq.len()).sum();
        let max_len = unitigs.iter().map(|u| u.seq.len()).max().unwrap_or(0);
        let n = unitigs.len();
        let mean_len = if n > 0 { total_len as f64 / n as f64 } else { 0.0 };
        let mean_coverage = if n > 0 {
            unitigs.iter().map(|u| u.coverage as f64).sum::<f64>() / n as f64
        } else {
            0.0
        };
        AssemblyStats {
            unitigs: n,
            total_len,
            max_len,
            mean_len,
            mean_coverage,
        }
    }
}
