//! Arena-based unitig graph.
//!
//! Nodes live in a slot vector addressed by stable integer ids; removal
//! tombstones a slot instead of deleting it, so edge lists can be repaired
//! without dangling references during multi-pass cleaning.
//!
//! Orientation is handled by doubling: every distinct input sequence is
//! present as two oriented nodes (`twin` pairs, forward and reverse
//! complement), which keeps every edge a plain directed suffix-prefix
//! overlap. Unitigs are deduplicated per twin pair at extraction.

use crate::kmer::kmer::reverse_complement;
use crate::read::ReadStore;

pub type NodeId = usize;

/// Directed overlap. In `out` lists `to` is the successor; in `inn` lists
/// `to` is the predecessor. `weight` is the supporting-read multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub to: NodeId,
    pub overlap: usize,
    pub weight: u32,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub seq: Vec<u8>,
    /// Supporting input read ids. Coverage = `reads.len()`.
    pub reads: Vec<u32>,
    pub out: Vec<Edge>,
    pub inn: Vec<Edge>,
    /// The same molecule in the opposite orientation.
    pub twin: NodeId,
    pub alive: bool,
}

impl Node {
    pub fn coverage(&self) -> u32 {
        self.reads.len() as u32
    }
}

/// A maximal non-branching path, extracted once per twin pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unitig {
    pub seq: Vec<u8>,
    /// Supporting input read ids, sorted ascending.
    pub reads: Vec<u32>,
    /// Number of supporting reads.
    pub coverage: u32,
    /// Sum of the supporting reads' lengths; divided by `seq.len()` this
    /// gives mean per-base depth.
    pub total_read_bases: u64,
}

#[derive(Debug, Default)]
pub struct UnitigGraph {
    nodes: Vec<Node>,
}

impl UnitigGraph {
    pub fn new() -> Self {
        UnitigGraph { nodes: Vec::new() }
    }

    /// Push a node and return its id. Twin pointers are the caller's
    /// responsibility (construction adds oriented nodes in pairs).
    pub fn add_node(&mut self, seq: Vec<u8>, reads: Vec<u32>, twin: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            seq,
            reads,
            out: Vec::new(),
            inn: Vec::new(),
            twin,
            alive: true,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        let n = &self.nodes[id];
        assert!(n.alive, "access to removed node {}", id);
        n
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes[id].alive
    }

    pub fn alive_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(move |&id| self.nodes[id].alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive_ids().count()
    }

    /// Add a directed overlap edge and its back-reference.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, overlap: usize, weight: u32) {
        debug_assert!(self.nodes[from].alive && self.nodes[to].alive);
        self.nodes[from].out.push(Edge { to, overlap, weight });
        self.nodes[to].inn.push(Edge {
            to: from,
            overlap,
            weight,
        });
    }

    /// Remove one directed edge, identified by endpoints and overlap.
    /// Returns false if no such edge exists.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId, overlap: usize) -> bool {
        let out = &mut self.nodes[from].out;
        let Some(pos) = out.iter().position(|e| e.to == to && e.overlap == overlap) else {
            return false;
        };
        out.remove(pos);
        let inn = &mut self.nodes[to].inn;
        let pos = inn
            .iter()
            .position(|e| e.to == from && e.overlap == overlap)
            .expect("edge back-reference missing");
        inn.remove(pos);
        true
    }

    /// Remove an edge together with its strand mirror
    /// (`twin(to) -> twin(from)`), keeping the graph strand-symmetric.
    /// Returns whether the primary edge existed.
    pub fn remove_edge_mirrored(&mut self, from: NodeId, to: NodeId, overlap: usize) -> bool {
        let removed = self.remove_edge(from, to, overlap);
        let (mf, mt) = (self.nodes[to].twin, self.nodes[from].twin);
        if (mf, mt) != (from, to) {
            self.remove_edge(mf, mt, overlap);
        }
        removed
    }

    /// Bind two oriented nodes as strand mirrors of each other.
    pub fn set_twin(&mut self, a: NodeId, b: NodeId) {
        self.nodes[a].twin = b;
        self.nodes[b].twin = a;
    }

    /// Tombstone a node and detach all its edges from the neighbors.
    pub fn remove_node(&mut self, id: NodeId) {
        if !self.nodes[id].alive {
            return;
        }
        let out = std::mem::take(&mut self.nodes[id].out);
        for e in out {
            let inn = &mut self.nodes[e.to].inn;
            inn.retain(|b| b.to != id);
        }
        let inn = std::mem::take(&mut self.nodes[id].inn);
        for e in inn {
            let out = &mut self.nodes[e.to].out;
            out.retain(|b| b.to != id);
        }
        self.nodes[id].alive = false;
    }

    /// Remove a node together with its twin.
    pub fn remove_node_mirrored(&mut self, id: NodeId) {
        let twin = self.nodes[id].twin;
        self.remove_node(id);
        if twin != id {
            self.remove_node(twin);
        }
    }

    /// Median node coverage over alive nodes, 0 for an empty graph.
    pub fn median_coverage(&self) -> u32 {
        let mut covs: Vec<u32> = self.alive_ids().map(|id| self.nodes[id].coverage()).collect();
        if covs.is_empty() {
            return 0;
        }
        covs.sort_unstable();
        covs[covs.len() / 2]
    }

    /// Every alive node must have an alive twin, the pairing must be
    /// involutive, and the twin must carry the reverse complement
    /// sequence. Compaction and extraction both lean on this; a violation
    /// means some earlier mutation was not strand-mirrored.
    fn debug_assert_strand_symmetry(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        for id in self.alive_ids() {
            let t = self.nodes[id].twin;
            assert_eq!(
                self.nodes[t].twin, id,
                "twin pairing is not involutive at node {}",
                id
            );
            assert!(self.nodes[t].alive, "node {} has a dead twin {}", id, t);
            assert_eq!(
                self.nodes[t].seq,
                reverse_complement(&self.nodes[id].seq),
                "twin of node {} is not its reverse complement",
                id
            );
        }
    }

    /// Merge every path whose internal nodes have exactly one incoming and
    /// one outgoing edge. The merged node lands in the chain head's slot,
    /// so repeated compaction of the same graph is byte-deterministic.
    /// Returns the number of chain merges performed.
    pub fn compact(&mut self) -> usize {
        self.debug_assert_strand_symmetry();
        let n = self.nodes.len();
        let mut remap: Vec<NodeId> = (0..n).collect();
        let mut merges = 0;

        for head in 0..n {
            if !self.nodes[head].alive || !self.is_chain_head(head) {
                continue;
            }
            let chain = self.walk_chain(head);
            if chain.len() < 2 {
                continue;
            }

            // Splice member sequences into the head slot, dropping each
            // overlap so no bases are duplicated.
            let mut seq = std::mem::take(&mut self.nodes[head].seq);
            let mut reads = std::mem::take(&mut self.nodes[head].reads);
            let mut prev = head;
            for &m in &chain[1..] {
                let overlap = self.nodes[prev]
                    .out
                    .iter()
                    .find(|e| e.to == m)
                    .expect("chain edge vanished")
                    .overlap;
                seq.extend_from_slice(&self.nodes[m].seq[overlap..]);
                reads.extend(std::mem::take(&mut self.nodes[m].reads));
                prev = m;
            }

            let last = *chain.last().expect("chain is non-empty");
            let tail_out = std::mem::take(&mut self.nodes[last].out);
            // Repair back-references of the tail's successors.
            for e in &tail_out {
                for b in self.nodes[e.to].inn.iter_mut() {
                    if b.to == last {
                        b.to = head;
                    }
                }
            }
            for &m in &chain[1..] {
                self.nodes[m].alive = false;
                self.nodes[m].out.clear();
                self.nodes[m].inn.clear();
                remap[m] = head;
            }
            let head_node = &mut self.nodes[head];
            head_node.seq = seq;
            head_node.reads = reads;
            head_node.out = tail_out;
            merges += 1;
        }

        // The mirror of a maximal chain is a maximal chain, so any member
        // of the old twin's chain remaps to the merged mirror slot.
        for id in 0..n {
            if self.nodes[id].alive {
                let t = self.nodes[id].twin;
                self.nodes[id].twin = remap[t];
            }
        }
        merges
    }

    /// A chain head starts a maximal non-branching path: it is not itself
    /// extendable backwards through an in-1/out-1 link.
    fn is_chain_head(&self, id: NodeId) -> bool {
        if self.nodes[id].inn.len() != 1 {
            return true;
        }
        let pred = self.nodes[id].inn[0].to;
        pred == id || self.nodes[pred].out.len() != 1 || !self.mergeable(pred, id)
    }

    /// Whether `from -> to` is an unambiguous extension.
    fn mergeable(&self, from: NodeId, to: NodeId) -> bool {
        from != to
            && self.nodes[from].alive
            && self.nodes[to].alive
            && self.nodes[from].out.len() == 1
            && self.nodes[to].inn.len() == 1
            // Never merge a molecule onto its own mirror.
            && self.nodes[from].twin != to
    }

    fn walk_chain(&self, head: NodeId) -> Vec<NodeId> {
        let mut chain = vec![head];
        let mut current = head;
        loop {
            if self.nodes[current].out.len() != 1 {
                break;
            }
            let next = self.nodes[current].out[0].to;
            if next == head || chain.contains(&next) || !self.mergeable(current, next) {
                break;
            }
            // Palindrome guard: a chain must not swallow the mirror of a
            // node it already contains.
            if chain.iter().any(|&m| self.nodes[m].twin == next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    /// Extract unitigs, one per twin pair, in a canonical deterministic
    /// order (smallest supporting read id, then sequence).
    pub fn unitigs(&self, store: &ReadStore) -> Vec<Unitig> {
        self.debug_assert_strand_symmetry();
        let mut out = Vec::new();
        for id in self.alive_ids() {
            let node = &self.nodes[id];
            let twin = node.twin;
            // Emit each molecule once: from the orientation whose sequence
            // is lexicographically smaller (lower id breaks palindromes).
            if self.nodes[twin].alive && twin != id {
                let twin_seq = &self.nodes[twin].seq;
                if *twin_seq < node.seq || (*twin_seq == node.seq && twin < id) {
                    continue;
                }
            }
            let mut reads = node.reads.clone();
            reads.sort_unstable();
            let total_read_bases = reads
                .iter()
                .map(|&r| store.get(r as usize).len() as u64)
                .sum();
            out.push(Unitig {
                seq: node.seq.clone(),
                coverage: reads.len() as u32,
                reads,
                total_read_bases,
            });
        }
        out.sort_by(|a, b| {
            let ka = a.reads.first().copied().unwrap_or(u32::MAX);
            let kb = b.reads.first().copied().unwrap_or(u32::MAX);
            ka.cmp(&kb).then_with(|| a.seq.cmp(&b.seq))
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::kmer::reverse_complement;

    /// Two-orientation helper mirroring what construction does.
    fn add_pair(g: &mut UnitigGraph, seq: &[u8], reads: Vec<u32>) -> (NodeId, NodeId) {
        let fwd = g.add_node(seq.to_vec(), reads.clone(), 0);
        let rev = g.add_node(reverse_complement(seq), reads, fwd);
        g.set_twin(fwd, rev);
        (fwd, rev)
    }

    fn add_edge_mirrored(g: &mut UnitigGraph, from: NodeId, to: NodeId, overlap: usize, w: u32) {
        g.add_edge(from, to, overlap, w);
        let (mf, mt) = (g.nodes[to].twin, g.nodes[from].twin);
        g.add_edge(mf, mt, overlap, w);
    }

    fn store(n: usize, len: usize) -> ReadStore {
        ReadStore::from_reads((0..n).map(|_| (vec![b'A'; len], None))).unwrap()
    }

    #[test]
    fn compaction_merges_a_simple_chain() {
        let mut g = UnitigGraph::new();
        let (a, _) = add_pair(&mut g, b"ACGTAC", vec![0]);
        let (b, _) = add_pair(&mut g, b"TACGGT", vec![1]);
        add_edge_mirrored(&mut g, a, b, 3, 1);

        assert_eq!(g.compact(), 2); // the chain and its mirror
        let store = store(2, 6);
        let unitigs = g.unitigs(&store);
        assert_eq!(unitigs.len(), 1);
        // Reported in its canonical orientation (lexicographically smaller
        // of ACGTACGGT and its reverse complement).
        assert_eq!(unitigs[0].seq, b"ACCGTACGT");
        assert_eq!(unitigs[0].coverage, 2);
        assert_eq!(unitigs[0].reads, vec![0, 1]);
    }

    #[test]
    fn compaction_stops_at_branches() {
        let mut g = UnitigGraph::new();
        let (a, _) = add_pair(&mut g, b"AACCGGT", vec![0]);
        let (b, _) = add_pair(&mut g, b"GGTCCAA", vec![1]);
        let (c, _) = add_pair(&mut g, b"GGTTTTA", vec![2]);
        // a fans out to both b and c, so nothing may merge.
        add_edge_mirrored(&mut g, a, b, 3, 1);
        add_edge_mirrored(&mut g, a, c, 3, 1);

        assert_eq!(g.compact(), 0);
        assert_eq!(g.alive_count(), 6);
    }

    #[test]
    fn removal_repairs_neighbor_edge_lists() {
        let mut g = UnitigGraph::new();
        let (a, _) = add_pair(&mut g, b"AACCGGT", vec![0]);
        let (b, _) = add_pair(&mut g, b"GGTCCAA", vec![1]);
        add_edge_mirrored(&mut g, a, b, 3, 1);

        g.remove_node_mirrored(b);
        assert!(g.node(a).out.is_empty());
        assert_eq!(g.alive_count(), 2);
    }

    #[test]
    fn median_coverage_over_alive_nodes() {
        let mut g = UnitigGraph::new();
        add_pair(&mut g, b"AAAA", vec![0]);
        add_pair(&mut g, b"CCCC", vec![1, 2, 3]);
        add_pair(&mut g, b"GGGG", vec![4, 5, 6, 7, 8]);
        assert_eq!(g.median_coverage(), 3);
    }

    #[test]
    fn singleton_becomes_singleton_unitig() {
        let mut g = UnitigGraph::new();
        add_pair(&mut g, b"ACCGGTTAA", vec![0]);
        let store = store(1, 9);
        let unitigs = g.unitigs(&store);
        assert_eq!(unitigs.len(), 1);
        assert_eq!(unitigs[0].coverage, 1);
        assert_eq!(unitigs[0].total_read_bases, 9);
    }

    #[test]
    #[should_panic(expected = "reverse complement")]
    fn compaction_rejects_mismatched_twins() {
        let mut g = UnitigGraph::new();
        let a = g.add_node(b"ACGT".to_vec(), vec![0], 0);
        let b = g.add_node(b"AAAA".to_vec(), vec![1], 0);
        g.set_twin(a, b);
        g.compact();
    }

    #[test]
    #[should_panic(expected = "access to removed node")]
    fn access_to_removed_node_panics() {
        let mut g = UnitigGraph::new();
        let (a, _) = add_pair(&mut g, b"ACGT", vec![0]);
        g.remove_node_mirrored(a);
        let _ = g.node(a);
    }
}
