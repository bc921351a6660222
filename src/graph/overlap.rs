//! Overlap graph construction.
//!
//! Reads collapse into distinct molecules (a read and its reverse
//! complement are the same molecule), contained reads are absorbed into
//! their host's coverage, and suffix-prefix overlaps are discovered through
//! terminal-k-mer lookups in the occurrence index rather than all-pairs
//! comparison. Every candidate is verified by exact string comparison
//! before an edge is added.

use rayon::prelude::*;
use tracing::{debug, info};

use ahash::AHashMap;

use crate::graph::unitig::UnitigGraph;
use crate::kmer::kmer::{canonical, encode_kmer, reverse_complement};
use crate::kmer::KmerIndex;
use crate::read::{Read, ReadStore};

/// One distinct sequence and the input reads that spell it (in either
/// orientation).
struct Molecule {
    seq: Vec<u8>,
    reads: Vec<u32>,
}

/// Build the read-overlap graph, accepting only verified suffix-prefix
/// overlaps of at least `min_overlap` bases.
///
/// Candidates are seeded from indexed k-mers of length
/// `min(min_overlap, MAX_K)`, so `min_overlap` itself is not bounded by the
/// packed-k-mer width. Containments of molecules shorter than the index k
/// are below the resolution of this graph by construction.
pub fn build_graph(store: &ReadStore, min_overlap: usize) -> UnitigGraph {
    let index_k = min_overlap.min(crate::config::MAX_K);
    let molecules = collapse_molecules(store);
    let molecules = absorb_contained(molecules, index_k);
    info!(
        "{} read(s) -> {} distinct molecule(s)",
        store.len(),
        molecules.len()
    );

    // Oriented node layout: molecule m is node 2m forward, 2m+1 reverse.
    let oriented: Vec<Vec<u8>> = molecules
        .iter()
        .flat_map(|m| [m.seq.clone(), reverse_complement(&m.seq)])
        .collect();

    let mut graph = UnitigGraph::new();
    for (m, mol) in molecules.iter().enumerate() {
        let fwd = graph.add_node(mol.seq.clone(), mol.reads.clone(), 2 * m + 1);
        debug_assert_eq!(fwd, 2 * m);
        graph.add_node(oriented[2 * m + 1].clone(), mol.reads.clone(), fwd);
    }

    let edges = find_overlap_edges(&molecules, &oriented, min_overlap, index_k);
    let covs: Vec<u32> = molecules.iter().map(|m| m.reads.len() as u32).collect();
    let mut n_edges = 0;
    for (u, v, overlap) in edges {
        let weight = covs[u / 2].min(covs[v / 2]);
        graph.add_edge(u, v, overlap, weight);
        n_edges += 1;
    }
    debug!("overlap graph: {} oriented edge(s)", n_edges);

    // Collapse unbranched chains immediately; the builder's contract is a
    // graph of maximal non-branching paths.
    let merges = graph.compact();
    debug!("initial compaction: {} chain merge(s)", merges);
    graph
}

/// Group reads by canonical sequence, preserving read-id order. Empty
/// reads are dropped (they can support nothing).
fn collapse_molecules(store: &ReadStore) -> Vec<Molecule> {
    let mut by_canon: AHashMap<Vec<u8>, Vec<u32>> = AHashMap::new();
    for id in 0..store.len() {
        let read = store.get(id);
        if read.is_empty() {
            debug!("dropping empty read {}", id);
            continue;
        }
        let rc = reverse_complement(&read.seq);
        let canon = if read.seq <= rc {
            read.seq.clone()
        } else {
            rc
        };
        by_canon.entry(canon).or_default().push(id as u32);
    }
    let mut molecules: Vec<Molecule> = by_canon
        .into_iter()
        .map(|(seq, reads)| Molecule { seq, reads })
        .collect();
    // Hash order is not deterministic; the first supporting read id is.
    molecules.sort_by_key(|m| m.reads[0]);
    molecules
}

/// Absorb molecules fully contained in a longer molecule (either strand)
/// into the host's read list. Candidates come from the host index via the
/// contained molecule's first k-mer.
fn absorb_contained(molecules: Vec<Molecule>, k: usize) -> Vec<Molecule> {
    let mol_store = ReadStore::from_corrected(
        molecules
            .iter()
            .map(|m| Read {
                seq: m.seq.clone(),
                qual: None,
            })
            .collect(),
    );
    let index = KmerIndex::build(&mol_store, k);

    let mut host: Vec<Option<usize>> = vec![None; molecules.len()];
    for (m, mol) in molecules.iter().enumerate() {
        if mol.seq.len() < k {
            continue;
        }
        let Some(val) = encode_kmer(&mol.seq[..k]) else {
            continue; // leading N window, not searchable
        };
        let (canon, strand) = canonical(val, k);
        for occ in index.occurrences(canon) {
            let j = occ.read as usize;
            if j == m || molecules[j].seq.len() <= mol.seq.len() {
                continue;
            }
            let found = if occ.strand == strand {
                // Forward containment: molecule starts at occ.offset in j.
                let start = occ.offset as usize;
                molecules[j].seq[start..]
                    .starts_with(&mol.seq)
            } else {
                // The reverse complement sits in j; our first k-mer is the
                // rc molecule's window at distance len - k from its start.
                let Some(start) = (occ.offset as usize).checked_sub(mol.seq.len() - k) else {
                    continue;
                };
                if start + mol.seq.len() > molecules[j].seq.len() {
                    continue;
                }
                molecules[j].seq[start..start + mol.seq.len()]
                    == reverse_complement(&mol.seq)[..]
            };
            if found {
                // Deterministic host: the smallest qualifying molecule id.
                match host[m] {
                    Some(h) if h <= j => {}
                    _ => host[m] = Some(j),
                }
            }
        }
    }

    // Resolve containment chains to a surviving host.
    let resolve = |mut m: usize| -> usize {
        while let Some(h) = host[m] {
            m = h;
        }
        m
    };

    let mut absorbed: Vec<Vec<u32>> = vec![Vec::new(); molecules.len()];
    for m in 0..molecules.len() {
        if host[m].is_some() {
            let h = resolve(m);
            let reads = molecules[m].reads.clone();
            absorbed[h].extend(reads);
        }
    }

    let mut out = Vec::new();
    for (m, mut mol) in molecules.into_iter().enumerate() {
        if host[m].is_some() {
            continue;
        }
        mol.reads.extend(std::mem::take(&mut absorbed[m]));
        mol.reads.sort_unstable();
        out.push(mol);
    }
    out
}

/// Discover verified suffix-prefix overlap edges between oriented nodes.
/// Candidate generation is parallel and read-only; the returned list is in
/// deterministic (source, target, overlap) order.
fn find_overlap_edges(
    molecules: &[Molecule],
    oriented: &[Vec<u8>],
    min_overlap: usize,
    k: usize,
) -> Vec<(usize, usize, usize)> {
    let mol_store = ReadStore::from_corrected(
        molecules
            .iter()
            .map(|m| Read {
                seq: m.seq.clone(),
                qual: None,
            })
            .collect(),
    );
    let index = KmerIndex::build(&mol_store, k);

    let mut edges: Vec<(usize, usize, usize)> = (0..oriented.len())
        .into_par_iter()
        .flat_map_iter(|u| {
            let seq_u = &oriented[u];
            let mut found = Vec::new();
            if seq_u.len() < k {
                return found.into_iter();
            }
            let tail = &seq_u[seq_u.len() - k..];
            let Some(val) = encode_kmer(tail) else {
                return found.into_iter(); // N in the terminal window
            };
            let (canon, strand) = canonical(val, k);
            for occ in index.occurrences(canon) {
                let j = occ.read as usize;
                let len_j = molecules[j].seq.len();
                // Map the hit back to an oriented target and overlap length.
                let (v, overlap) = if occ.strand == strand {
                    (2 * j, occ.offset as usize + k)
                } else {
                    (2 * j + 1, len_j - occ.offset as usize)
                };
                if v == u {
                    continue;
                }
                if overlap < min_overlap {
                    continue;
                }
                // A full-length hit is identity or containment, both
                // already collapsed; a proper dovetail overlap is shorter
                // than both sequences.
                if overlap >= seq_u.len() || overlap >= len_j {
                    continue;
                }
                let target = &oriented[v];
                if seq_u[seq_u.len() - overlap..] == target[..overlap] {
                    found.push((u, v, overlap));
                    // Insert the strand mirror explicitly. Its own seed
                    // window can contain an N and then never appears in
                    // the index, so it cannot be relied on to rediscover
                    // this edge from the other side.
                    found.push((v ^ 1, u ^ 1, overlap));
                }
            }
            found.into_iter()
        })
        .collect();

    edges.sort_unstable();
    edges.dedup();
    edges
}
