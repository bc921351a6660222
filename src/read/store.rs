use crate::error::{AsmError, Result};
use crate::kmer::kmer::reverse_complement;

/// A single input read. Identity is its index in the [`ReadStore`].
///
/// Immutable once stored; error correction builds a new store rather than
/// mutating the evidence the index was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub seq: Vec<u8>,
    pub qual: Option<Vec<u8>>,
}

impl Read {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// The validated input read set for one region.
///
/// Bases are uppercased at ingest; anything outside {A,C,G,T,N} is
/// `MalformedInput`. `N` is kept as an ambiguous base: k-mer windows
/// containing it are never indexed, so it contributes no correction
/// evidence and seeds no overlaps.
#[derive(Debug, Default)]
pub struct ReadStore {
    reads: Vec<Read>,
}

impl ReadStore {
    /// Validate and ingest `(sequence, optional quality)` pairs in order.
    pub fn from_reads<I>(input: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<u8>, Option<Vec<u8>>)>,
    {
        let mut reads = Vec::new();
        for (idx, (mut seq, qual)) in input.into_iter().enumerate() {
            for b in seq.iter_mut() {
                *b = match b.to_ascii_uppercase() {
                    c @ (b'A' | b'C' | b'G' | b'T' | b'N') => c,
                    other => {
                        return Err(AsmError::MalformedInput(format!(
                            "read {}: invalid base {:?}",
                            idx,
                            char::from(other)
                        )))
                    }
                };
            }
            if let Some(ref q) = qual {
                if q.len() != seq.len() {
                    return Err(AsmError::MalformedInput(format!(
                        "read {}: quality length {} != sequence length {}",
                        idx,
                        q.len(),
                        seq.len()
                    )));
                }
            }
            reads.push(Read { seq, qual });
        }
        Ok(ReadStore { reads })
    }

    /// Wrap reads that are already validated (the corrector only ever
    /// substitutes bases from the allowed alphabet).
    pub(crate) fn from_corrected(reads: Vec<Read>) -> Self {
        ReadStore { reads }
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn get(&self, id: usize) -> &Read {
        &self.reads[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Read> {
        self.reads.iter()
    }

    /// Reverse complement of a stored read's sequence.
    pub fn revcomp(&self, id: usize) -> Vec<u8> {
        reverse_complement(&self.reads[id].seq)
    }

    /// Median read length, 0 for an empty store. Used by automatic k
    /// selection.
    pub fn median_len(&self) -> usize {
        if self.reads.is_empty() {
            return 0;
        }
        let mut lens: Vec<usize> = self.reads.iter().map(|r| r.len()).collect();
        lens.sort_unstable();
        lens[lens.len() / 2]
    }

    pub fn into_reads(self) -> Vec<Read> {
        self.reads
    }
}
