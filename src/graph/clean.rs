//! Topology-aware graph cleaning.
//!
//! Each pass is a pure function of the current graph state, applied from a
//! snapshot of candidates so iteration order cannot influence the outcome.
//! After every pass that changed something the graph is re-compacted, since
//! a removal can newly unbranch a path. The whole schedule loops until a
//! fixed point or the round cap.

use tracing::{debug, info};

use crate::config::CleanPolicy;
use crate::graph::unitig::{NodeId, UnitigGraph};

/// What one cleaning run did. An all-zero report on a second run over the
/// same graph is the fixed-point guarantee.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    pub rounds: usize,
    pub tips_removed: usize,
    pub bubbles_popped: usize,
    pub weak_edges_removed: usize,
    pub low_cov_removed: usize,
}

impl CleanStats {
    pub fn total_removals(&self) -> usize {
        self.tips_removed + self.bubbles_popped + self.weak_edges_removed + self.low_cov_removed
    }
}

/// Run all enabled passes to a fixed point (or `max_rounds`).
///
/// Cleaning a graph down to nothing is a legitimate outcome; the caller
/// sees an empty graph, never an error.
pub fn clean_graph(graph: &mut UnitigGraph, policy: &CleanPolicy) -> CleanStats {
    let p = policy.effective();
    let mut stats = CleanStats::default();

    for round in 1..=p.max_rounds {
        stats.rounds = round;
        let mut changed = false;

        if p.tip_trimming {
            let n = trim_tips(graph, p.min_tip_len);
            if n > 0 {
                stats.tips_removed += n;
                graph.compact();
                changed = true;
            }
        }
        if p.bubble_popping {
            let n = pop_bubbles(graph, p.min_bubble_similarity, p.bubble_cov_ratio);
            if n > 0 {
                stats.bubbles_popped += n;
                graph.compact();
                changed = true;
            }
        }
        if p.weak_edge_removal {
            let n = remove_weak_edges(graph, p.min_edge_ratio);
            if n > 0 {
                stats.weak_edges_removed += n;
                graph.compact();
                changed = true;
            }
        }
        if p.aggressive {
            let n = drop_low_coverage(graph, p.min_node_cov);
            if n > 0 {
                stats.low_cov_removed += n;
                graph.compact();
                changed = true;
            }
        }

        if !changed {
            break;
        }
        debug!("cleaning round {}: {:?}", round, stats);
    }

    info!(
        "cleaning done after {} round(s): {} tip(s), {} bubble(s), {} weak edge(s), {} low-coverage node(s)",
        stats.rounds,
        stats.tips_removed,
        stats.bubbles_popped,
        stats.weak_edges_removed,
        stats.low_cov_removed
    );
    stats
}

/// A tip is a dead end on exactly one side, attached on the other, shorter
/// than `min_tip_len`, with coverage strictly below the graph median. The
/// coverage gate keeps genuine short terminal sequence distinguishable
/// from error dead-ends.
fn trim_tips(graph: &mut UnitigGraph, min_tip_len: usize) -> usize {
    let median = graph.median_coverage();
    let candidates: Vec<NodeId> = graph
        .alive_ids()
        .filter(|&id| {
            let node = graph.node(id);
            (node.inn.is_empty() ^ node.out.is_empty())
                && node.seq.len() < min_tip_len
                && node.coverage() < median
        })
        .collect();

    let mut removed = 0;
    for id in candidates {
        if graph.is_alive(id) {
            graph.remove_node_mirrored(id);
            removed += 1;
        }
    }
    removed
}

/// Drop out-edges whose weight falls below `min_edge_ratio` of the
/// strongest competing edge at the same node end. In-edge competition is
/// covered through the twin's out list, so one sweep over out lists sees
/// every node end.
fn remove_weak_edges(graph: &mut UnitigGraph, min_edge_ratio: f64) -> usize {
    let mut doomed: Vec<(NodeId, NodeId, usize)> = Vec::new();
    for id in graph.alive_ids() {
        let node = graph.node(id);
        if node.out.len() < 2 {
            continue;
        }
        let wmax = node.out.iter().map(|e| e.weight).max().unwrap_or(0);
        for e in &node.out {
            if (e.weight as f64) < min_edge_ratio * wmax as f64 {
                doomed.push((id, e.to, e.overlap));
            }
        }
    }

    let mut removed = 0;
    for (from, to, overlap) in doomed {
        if graph.is_alive(from) && graph.is_alive(to) && graph.remove_edge_mirrored(from, to, overlap)
        {
            removed += 1;
        }
    }
    removed
}

/// Pop simple bubbles: two single-in/single-out nodes bridging the same
/// source and sink. The weaker side is removed when the sides are
/// near-identical or its coverage is a small fraction of the stronger's.
fn pop_bubbles(graph: &mut UnitigGraph, min_similarity: f64, cov_ratio: f64) -> usize {
    let mut losers: Vec<NodeId> = Vec::new();

    for s in graph.alive_ids() {
        let source = graph.node(s);
        if source.out.len() < 2 {
            continue;
        }
        for i in 0..source.out.len() {
            for j in (i + 1)..source.out.len() {
                let (a, b) = (source.out[i].to, source.out[j].to);
                if a == b || a == s || b == s {
                    continue;
                }
                let na = graph.node(a);
                let nb = graph.node(b);
                // An inverted-repeat pair is one molecule, not a bubble.
                if na.twin == b {
                    continue;
                }
                if na.inn.len() != 1 || na.out.len() != 1 || nb.inn.len() != 1 || nb.out.len() != 1
                {
                    continue;
                }
                let t = na.out[0].to;
                if nb.out[0].to != t || t == s || t == a || t == b {
                    continue;
                }

                let (cov_a, cov_b) = (na.coverage(), nb.coverage());
                let lo = cov_a.min(cov_b) as f64;
                let hi = cov_a.max(cov_b) as f64;
                let sim = similarity(&na.seq, &nb.seq);
                if sim < min_similarity && lo > cov_ratio * hi {
                    continue;
                }

                // Lower coverage loses; ties fall to the lexicographically
                // larger sequence, then the higher id.
                let loser = if cov_a != cov_b {
                    if cov_a < cov_b {
                        a
                    } else {
                        b
                    }
                } else if na.seq != nb.seq {
                    if na.seq > nb.seq {
                        a
                    } else {
                        b
                    }
                } else {
                    a.max(b)
                };
                losers.push(loser);
            }
        }
    }

    let mut removed = 0;
    for id in losers {
        if graph.is_alive(id) {
            graph.remove_node_mirrored(id);
            removed += 1;
        }
    }
    removed
}

/// Aggressive-mode pass: remove attached nodes with coverage below
/// `min_node_cov`. Isolated singletons are spared; destroying those is the
/// caller's business via tip length, not coverage alone.
fn drop_low_coverage(graph: &mut UnitigGraph, min_node_cov: u32) -> usize {
    let candidates: Vec<NodeId> = graph
        .alive_ids()
        .filter(|&id| {
            let node = graph.node(id);
            node.coverage() < min_node_cov && (!node.inn.is_empty() || !node.out.is_empty())
        })
        .collect();

    let mut removed = 0;
    for id in candidates {
        if graph.is_alive(id) {
            graph.remove_node_mirrored(id);
            removed += 1;
        }
    }
    removed
}

/// Length-normalized Levenshtein similarity in [0, 1].
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let sub = prev[j] + usize::from(ca != cb);
            curr[j + 1] = sub.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::kmer::reverse_complement;

    fn add_pair(g: &mut UnitigGraph, seq: &[u8], reads: Vec<u32>) -> NodeId {
        let fwd = g.add_node(seq.to_vec(), reads.clone(), 0);
        let rev = g.add_node(reverse_complement(seq), reads, fwd);
        g.set_twin(fwd, rev);
        fwd
    }

    fn add_edge_mirrored(g: &mut UnitigGraph, from: NodeId, to: NodeId, overlap: usize, w: u32) {
        g.add_edge(from, to, overlap, w);
        let (mf, mt) = (g.node(to).twin, g.node(from).twin);
        if (mf, mt) != (from, to) {
            g.add_edge(mf, mt, overlap, w);
        }
    }

    fn policy() -> CleanPolicy {
        CleanPolicy::default()
    }

    #[test]
    fn levenshtein_similarity_basics() {
        assert_eq!(similarity(b"ACGT", b"ACGT"), 1.0);
        assert!(similarity(b"ACGTACGTAC", b"ACGTTCGTAC") >= 0.9);
        assert!(similarity(b"AAAA", b"TTTT") <= 0.1);
        assert_eq!(similarity(b"", b""), 1.0);
    }

    #[test]
    fn short_low_coverage_tip_is_trimmed() {
        let mut g = UnitigGraph::new();
        // Backbone of three well-covered nodes, one weak short tip off the middle.
        let a = add_pair(&mut g, &[b'A'; 80], (0..10).collect());
        let b = add_pair(&mut g, &[b'C'; 80], (10..20).collect());
        let c = add_pair(&mut g, &[b'G'; 80], (20..30).collect());
        let tip = add_pair(&mut g, &[b'T'; 20], vec![30]);
        add_edge_mirrored(&mut g, a, b, 30, 10);
        add_edge_mirrored(&mut g, b, c, 30, 10);
        add_edge_mirrored(&mut g, b, tip, 15, 1);

        let mut p = policy();
        p.weak_edge_removal = false;
        let stats = clean_graph(&mut g, &p);
        assert!(stats.tips_removed >= 1);
        assert!(!g.is_alive(tip));
        // Backbone chain now compacts into a single pair of oriented nodes.
        assert_eq!(g.alive_count(), 2);
    }

    #[test]
    fn well_covered_short_end_is_kept() {
        let mut g = UnitigGraph::new();
        let a = add_pair(&mut g, &[b'A'; 80], (0..5).collect());
        let end = add_pair(&mut g, &[b'C'; 20], (5..10).collect());
        add_edge_mirrored(&mut g, a, end, 10, 5);

        // Same coverage everywhere: median gate protects the short end.
        let before = g.alive_count();
        let mut p = policy();
        p.bubble_popping = false;
        p.weak_edge_removal = false;
        let stats = clean_graph(&mut g, &p);
        assert_eq!(stats.tips_removed, 0);
        // Nothing removed; the chain still compacts.
        assert!(g.alive_count() <= before);
    }

    #[test]
    fn bubble_collapses_to_higher_coverage_path() {
        let mut g = UnitigGraph::new();
        let s = add_pair(&mut g, b"ATCGGACTTACGGATACG", (0..8).collect());
        let hi = add_pair(&mut g, b"GATACGCAGTTACCGGAT", (0..8).collect());
        let lo = add_pair(&mut g, b"GATACGCACTTACCGGAT", vec![8]);
        let t = add_pair(&mut g, b"CCGGATTTACAGATTACA", (0..8).collect());
        add_edge_mirrored(&mut g, s, hi, 6, 8);
        add_edge_mirrored(&mut g, s, lo, 6, 1);
        add_edge_mirrored(&mut g, hi, t, 6, 8);
        add_edge_mirrored(&mut g, lo, t, 6, 1);

        let mut p = policy();
        p.tip_trimming = false;
        p.weak_edge_removal = false;
        let stats = clean_graph(&mut g, &p);
        assert_eq!(stats.bubbles_popped, 1);
        assert!(!g.is_alive(lo));
        // s -> hi -> t compacts into one molecule.
        assert_eq!(g.alive_count(), 2);
    }

    #[test]
    fn weak_edge_is_dropped() {
        let mut g = UnitigGraph::new();
        let s = add_pair(&mut g, &[b'A'; 40], (0..20).collect());
        let strong = add_pair(&mut g, &[b'C'; 40], (0..20).collect());
        let weak = add_pair(&mut g, &[b'G'; 40], (20..22).collect());
        add_edge_mirrored(&mut g, s, strong, 10, 20);
        add_edge_mirrored(&mut g, s, weak, 10, 2);

        let mut p = policy();
        p.tip_trimming = false;
        p.bubble_popping = false;
        let stats = clean_graph(&mut g, &p);
        assert_eq!(stats.weak_edges_removed, 1);
        // The weak node survives as a disconnected unitig; only the
        // chimeric join goes.
        assert!(g.is_alive(weak));
        assert!(g.node(weak).inn.is_empty());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let mut g = UnitigGraph::new();
        let s = add_pair(&mut g, b"ATCGGACTTACGGATACG", (0..8).collect());
        let hi = add_pair(&mut g, b"GATACGCAGTTACCGGAT", (0..8).collect());
        let lo = add_pair(&mut g, b"GATACGCACTTACCGGAT", vec![8]);
        let t = add_pair(&mut g, b"CCGGATTTACAGATTACA", (0..8).collect());
        let tip = add_pair(&mut g, b"ATTACAGG", vec![9]);
        add_edge_mirrored(&mut g, s, hi, 6, 8);
        add_edge_mirrored(&mut g, s, lo, 6, 1);
        add_edge_mirrored(&mut g, hi, t, 6, 8);
        add_edge_mirrored(&mut g, lo, t, 6, 1);
        add_edge_mirrored(&mut g, t, tip, 6, 1);

        clean_graph(&mut g, &policy());
        let again = clean_graph(&mut g, &policy());
        assert_eq!(again.total_removals(), 0);
    }

    #[test]
    fn cleaning_empty_graph_is_a_no_op() {
        let mut g = UnitigGraph::new();
        let stats = clean_graph(&mut g, &policy());
        assert_eq!(stats.total_removals(), 0);
    }

    #[test]
    fn aggressive_mode_drops_attached_low_coverage_nodes() {
        let mut g = UnitigGraph::new();
        let a = add_pair(&mut g, &[b'A'; 100], (0..9).collect());
        let weak = add_pair(&mut g, &[b'C'; 100], vec![9]);
        add_edge_mirrored(&mut g, a, weak, 10, 1);

        let mut p = policy();
        p.tip_trimming = false;
        p.bubble_popping = false;
        p.weak_edge_removal = false;
        p.aggressive = true;
        let stats = clean_graph(&mut g, &p);
        assert!(stats.low_cov_removed >= 1);
        assert!(!g.is_alive(weak));
    }
}
