//! 2-bit k-mer primitives. k is capped at 31 so a k-mer always fits a u64.

/// Which orientation of a k-mer matched its canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn flip(self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

#[inline]
pub fn base_code(b: u8) -> Option<u64> {
    match b {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

#[inline]
pub fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        // N and anything else complements to itself
        other => other,
    }
}

/// Encodes a DNA k-mer to a 64-bit integer (2 bits per base).
/// Returns `None` if the window contains an ambiguous base.
pub fn encode_kmer(seq: &[u8]) -> Option<u64> {
    debug_assert!(seq.len() <= crate::config::MAX_K);
    let mut val: u64 = 0;
    for &b in seq {
        val = (val << 2) | base_code(b)?;
    }
    Some(val)
}

/// Decodes a 2-bit-packed k-mer back into bases.
pub fn decode_kmer(mut val: u64, k: usize) -> Vec<u8> {
    let mut out = vec![0u8; k];
    for i in (0..k).rev() {
        out[i] = match val & 3 {
            0 => b'A',
            1 => b'C',
            2 => b'G',
            _ => b'T',
        };
        val >>= 2;
    }
    out
}

/// Reverse complement of a packed k-mer.
pub fn revcomp_kmer(val: u64, k: usize) -> u64 {
    let mut rc: u64 = 0;
    let mut v = val;
    for _ in 0..k {
        rc = (rc << 2) | (3 - (v & 3));
        v >>= 2;
    }
    rc
}

/// Canonical form: the numerically smaller of forward and reverse
/// complement, plus the strand that produced it.
pub fn canonical(val: u64, k: usize) -> (u64, Strand) {
    let rc = revcomp_kmer(val, k);
    if val <= rc {
        (val, Strand::Forward)
    } else {
        (rc, Strand::Reverse)
    }
}

/// Reverse complement of a base sequence.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Rolling canonical k-mer scanner over one sequence.
///
/// Yields `(offset, canonical_kmer, strand)` for every window free of
/// ambiguous bases; windows containing `N` are skipped and the roll
/// restarts past them.
pub struct KmerScanner<'a> {
    seq: &'a [u8],
    k: usize,
    pos: usize,
    valid: usize,
    fwd: u64,
    rev: u64,
    mask: u64,
}

impl<'a> KmerScanner<'a> {
    pub fn new(seq: &'a [u8], k: usize) -> Self {
        debug_assert!(k >= 1 && k <= crate::config::MAX_K);
        KmerScanner {
            seq,
            k,
            pos: 0,
            valid: 0,
            fwd: 0,
            rev: 0,
            mask: (1u64 << (2 * k)) - 1,
        }
    }
}

impl<'a> Iterator for KmerScanner<'a> {
    type Item = (usize, u64, Strand);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.seq.len() {
            let b = self.seq[self.pos];
            self.pos += 1;
            match base_code(b) {
                Some(code) => {
                    self.fwd = ((self.fwd << 2) | code) & self.mask;
                    self.rev = (self.rev >> 2) | ((3 - code) << (2 * (self.k - 1)));
                    self.valid += 1;
                    if self.valid >= self.k {
                        let offset = self.pos - self.k;
                        return Some(if self.fwd <= self.rev {
                            (offset, self.fwd, Strand::Forward)
                        } else {
                            (offset, self.rev, Strand::Reverse)
                        });
                    }
                }
                None => {
                    self.valid = 0;
                    self.fwd = 0;
                    self.rev = 0;
                }
            }
        }
        None
    }
}
