use crate::config::MAX_K;
use crate::read::ReadStore;

/// Automatic k for error correction when none is configured.
///
/// The largest odd value that is <= 21 and <= median_read_len / 2, with a
/// floor of 11. Odd k avoids palindromic k-mers that are their own reverse
/// complement and would double-count strand evidence.
pub fn correction_k(store: &ReadStore) -> usize {
    let half = store.median_len() / 2;
    let mut k = half.min(21).max(11);
    if k % 2 == 0 {
        k -= 1;
    }
    k.min(MAX_K)
}

/// Automatic minimum-overlap length for unitig construction when none is
/// configured: median_read_len / 2 with a floor of 15. Not capped at
/// [`MAX_K`]; overlap candidates are seeded from shorter indexed k-mers.
pub fn unitig_k(store: &ReadStore) -> usize {
    (store.median_len() / 2).max(15)
}
