//! Conservative k-mer-spectrum error correction.
//!
//! Every read is scored against an index built over the *raw* read set; a
//! base is rewritten only when its own evidence is weak and exactly one
//! alternative is solidly supported. Correction never changes read length
//! and never touches a base on ties or thin evidence.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::CorrectParams;
use crate::kmer::KmerIndex;
use crate::read::{Read, ReadStore};

/// Quality assigned to a rewritten base when the read carries qualities
/// (Phred 12 in Phred+33). Propagating the original score would overstate
/// confidence in a base the corrector invented.
pub const CORRECTED_QUAL: u8 = b'!' + 12;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Correct every read against `index`, producing a new store. The input
/// store remains the evidence and is not touched.
///
/// Reads shorter than k pass through unchanged.
pub fn correct_reads(store: &ReadStore, index: &KmerIndex, params: CorrectParams) -> ReadStore {
    let k = index.k();
    let corrected: Vec<(Read, usize)> = (0..store.len())
        .into_par_iter()
        .map(|id| correct_one(store.get(id), index, k, params))
        .collect();

    let changed: usize = corrected.iter().map(|(_, n)| n).sum();
    info!(
        "error correction: {} base(s) rewritten across {} read(s)",
        changed,
        store.len()
    );

    let mut out = Vec::with_capacity(corrected.len());
    for (read, n) in corrected {
        if n > 0 {
            debug!("read corrected at {} position(s)", n);
        }
        out.push(read);
    }
    ReadStore::from_corrected(out)
}

/// Correct a single read; returns the new read and the number of bases
/// rewritten. All positions are judged against the original sequence, so
/// one rewrite never manufactures evidence for the next.
fn correct_one(read: &Read, index: &KmerIndex, k: usize, params: CorrectParams) -> (Read, usize) {
    if read.len() < k {
        return (read.clone(), 0);
    }

    let mut out_seq = read.seq.clone();
    let mut out_qual = read.qual.clone();
    let mut scratch = read.seq.clone();
    let mut changed = 0;

    for i in 0..read.seq.len() {
        let original = read.seq[i];
        let orig_support = position_support(&read.seq, i, k, index);
        if orig_support >= params.weak_threshold {
            continue;
        }

        // Try each substitution; require a unique solid winner.
        let mut best: Option<(u8, u32)> = None;
        let mut tie = false;
        for &alt in &BASES {
            if alt == original {
                continue;
            }
            scratch[i] = alt;
            let support = position_support(&scratch, i, k, index);
            match best {
                Some((_, s)) if support > s => {
                    best = Some((alt, support));
                    tie = false;
                }
                Some((_, s)) if support == s => tie = true,
                None => best = Some((alt, support)),
                _ => {}
            }
        }
        scratch[i] = original;

        if let Some((alt, support)) = best {
            if !tie && support > params.solid_threshold {
                out_seq[i] = alt;
                if let Some(ref mut q) = out_qual {
                    q[i] = q[i].min(CORRECTED_QUAL);
                }
                changed += 1;
            }
        }
    }

    (
        Read {
            seq: out_seq,
            qual: out_qual,
        },
        changed,
    )
}

/// Best count among all k-mers covering position `i`. Windows containing an
/// ambiguous base count as zero.
fn position_support(seq: &[u8], i: usize, k: usize, index: &KmerIndex) -> u32 {
    let lo = i.saturating_sub(k - 1);
    let hi = i.min(seq.len() - k);
    let mut best = 0;
    for start in lo..=hi {
        best = best.max(index.count_seq(&seq[start..start + k]));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(seqs: &[&str]) -> ReadStore {
        ReadStore::from_reads(seqs.iter().map(|s| (s.as_bytes().to_vec(), None))).unwrap()
    }

    fn params() -> CorrectParams {
        CorrectParams {
            weak_threshold: 3,
            solid_threshold: 4,
        }
    }

    #[test]
    fn lone_mismatch_is_corrected() {
        // Nine clean copies and one copy with a single error in the middle.
        let clean = "ACGGTCTTAGCCATGTACCTGA";
        let erroneous = "ACGGTCTTAGCAATGTACCTGA"; // C -> A at index 11
        let mut seqs = vec![clean; 9];
        seqs.push(erroneous);
        let store = store(&seqs);
        let index = KmerIndex::build(&store, 11);

        let out = correct_reads(&store, &index, params());
        assert_eq!(out.get(9).seq, clean.as_bytes());
        // The clean copies are untouched.
        for id in 0..9 {
            assert_eq!(out.get(id).seq, clean.as_bytes());
        }
    }

    #[test]
    fn uniform_coverage_yields_zero_changes() {
        let seqs = vec!["ACGGTCTTAGCCATGTACCTGA"; 6];
        let store = store(&seqs);
        let index = KmerIndex::build(&store, 11);
        let out = correct_reads(&store, &index, params());
        for id in 0..store.len() {
            assert_eq!(out.get(id).seq, store.get(id).seq);
        }
    }

    #[test]
    fn correction_preserves_length() {
        let clean = "ACGGTCTTAGCCATGTACCTGA";
        let erroneous = "TCGGTCTTAGCCATGTACCTGT";
        let mut seqs = vec![clean; 8];
        seqs.push(erroneous);
        let store = store(&seqs);
        let index = KmerIndex::build(&store, 11);
        let out = correct_reads(&store, &index, params());
        for id in 0..store.len() {
            assert_eq!(out.get(id).len(), store.get(id).len());
        }
    }

    #[test]
    fn reads_shorter_than_k_pass_through() {
        let store = store(&["ACGT", "ACGGTCTTAGCC"]);
        let index = KmerIndex::build(&store, 11);
        let out = correct_reads(&store, &index, params());
        assert_eq!(out.get(0).seq, b"ACGT");
    }

    #[test]
    fn corrected_base_quality_is_capped() {
        let clean = "ACGGTCTTAGCCATGTACCTGA";
        let erroneous = "ACGGTCTTAGCAATGTACCTGA";
        let mut reads: Vec<(Vec<u8>, Option<Vec<u8>>)> = (0..9)
            .map(|_| (clean.as_bytes().to_vec(), Some(vec![b'I'; clean.len()])))
            .collect();
        reads.push((
            erroneous.as_bytes().to_vec(),
            Some(vec![b'I'; erroneous.len()]),
        ));
        let store = ReadStore::from_reads(reads).unwrap();
        let index = KmerIndex::build(&store, 11);

        let out = correct_reads(&store, &index, params());
        let qual = out.get(9).qual.as_ref().unwrap();
        assert_eq!(qual[11], CORRECTED_QUAL);
        assert_eq!(qual[0], b'I');
    }
}
