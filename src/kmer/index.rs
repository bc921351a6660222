use ahash::AHashMap;
use rayon::prelude::*;

use crate::kmer::kmer::{canonical, encode_kmer, KmerScanner, Strand};
use crate::read::ReadStore;

/// One indexed k-mer hit: which read, at what offset, and on which strand
/// the canonical form matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub read: u32,
    pub offset: u32,
    pub strand: Strand,
}

/// Canonical k-mer -> occurrence list over a whole read store.
///
/// Built once, fully, before any consumer runs; read-only afterward.
/// Occurrence lists are sorted by (read, offset) so every lookup is
/// iteration-order independent.
pub struct KmerIndex {
    k: usize,
    map: AHashMap<u64, Vec<Occurrence>>,
}

impl KmerIndex {
    /// Scan every read in parallel and merge the per-read hit maps.
    pub fn build(store: &ReadStore, k: usize) -> Self {
        let per_read: Vec<Vec<(u64, Occurrence)>> = (0..store.len())
            .into_par_iter()
            .map(|id| {
                KmerScanner::new(&store.get(id).seq, k)
                    .map(|(offset, kmer, strand)| {
                        (
                            kmer,
                            Occurrence {
                                read: id as u32,
                                offset: offset as u32,
                                strand,
                            },
                        )
                    })
                    .collect()
            })
            .collect();

        let mut map: AHashMap<u64, Vec<Occurrence>> = AHashMap::new();
        for hits in per_read {
            for (kmer, occ) in hits {
                map.entry(kmer).or_default().push(occ);
            }
        }
        // Reads were merged in id order, so each list is already sorted by
        // (read, offset); assert rather than re-sort.
        debug_assert!(map.values().all(|v| v
            .windows(2)
            .all(|w| (w[0].read, w[0].offset) <= (w[1].read, w[1].offset))));
        KmerIndex { k, map }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// All occurrences of a canonical k-mer, sorted by (read, offset).
    pub fn occurrences(&self, canon: u64) -> &[Occurrence] {
        self.map.get(&canon).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occurrence count of a canonical k-mer.
    pub fn count(&self, canon: u64) -> u32 {
        self.occurrences(canon).len() as u32
    }

    /// Occurrence count of a raw window; 0 if the window contains `N`.
    pub fn count_seq(&self, window: &[u8]) -> u32 {
        debug_assert_eq!(window.len(), self.k);
        match encode_kmer(window) {
            Some(val) => self.count(canonical(val, self.k).0),
            None => 0,
        }
    }

    pub fn distinct_kmers(&self) -> usize {
        self.map.len()
    }
}
