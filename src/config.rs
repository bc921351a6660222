use crate::error::{AsmError, Result};

/// K-mers are packed 2 bits per base into a u64, so k can never exceed 31
/// (the top bit pair is reserved as a sentinel by the rolling encoder).
pub const MAX_K: usize = 31;

/// Options for a single region assembly.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Run k-mer-spectrum error correction before assembly.
    pub do_error_correction: bool,
    /// k for error correction. When `None`, the largest odd value that is
    /// <= 21 and <= median_read_len / 2 is used, with a floor of 11.
    pub error_correction_k: Option<usize>,
    /// Skip unitig construction and emit the (possibly corrected) reads.
    pub skip_unitig_construction: bool,
    /// Minimum suffix-prefix overlap for the assembly graph. May exceed
    /// [`MAX_K`]: overlap candidates are seeded from shorter indexed
    /// k-mers and verified at full length. When `None`, median_read_len / 2
    /// is used, with a floor of 15.
    pub unitig_k: Option<usize>,
    /// Run graph cleaning after unitig construction.
    pub do_graph_cleaning: bool,
    /// Cleaning thresholds; only consulted when `do_graph_cleaning` is set.
    pub clean: CleanPolicy,
    /// Correction thresholds; only consulted when `do_error_correction` is set.
    pub correct: CorrectParams,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        AssembleOptions {
            do_error_correction: false,
            error_correction_k: None,
            skip_unitig_construction: false,
            unitig_k: None,
            do_graph_cleaning: false,
            clean: CleanPolicy::default(),
            correct: CorrectParams::default(),
        }
    }
}

impl AssembleOptions {
    /// Validate before any processing. k values of 0 or above [`MAX_K`]
    /// and ratios outside [0, 1] are rejected here, not mid-pipeline.
    pub fn validate(&self) -> Result<()> {
        if let Some(k) = self.error_correction_k {
            if k == 0 || k > MAX_K {
                return Err(AsmError::ConfigurationError(format!(
                    "error correction k must be in 1..={}, got {}",
                    MAX_K, k
                )));
            }
        }
        if self.unitig_k == Some(0) {
            return Err(AsmError::ConfigurationError(
                "minimum overlap must be at least 1".to_string(),
            ));
        }
        if self.correct.weak_threshold >= self.correct.solid_threshold {
            return Err(AsmError::ConfigurationError(format!(
                "weak threshold ({}) must be below solid threshold ({})",
                self.correct.weak_threshold, self.correct.solid_threshold
            )));
        }
        self.clean.validate()
    }
}

/// Thresholds for conservative base correction.
///
/// A base is rewritten only when every k-mer covering it has count strictly
/// below `weak_threshold` and exactly one alternative base yields a covering
/// k-mer with count strictly above `solid_threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CorrectParams {
    pub weak_threshold: u32,
    pub solid_threshold: u32,
}

impl Default for CorrectParams {
    fn default() -> Self {
        CorrectParams {
            weak_threshold: 3,
            solid_threshold: 4,
        }
    }
}

/// Independently toggleable graph-cleaning passes with their thresholds.
/// Stateless: owns no graph data.
#[derive(Debug, Clone)]
pub struct CleanPolicy {
    /// Remove dead-end nodes shorter than `min_tip_len` whose coverage is
    /// below the graph median.
    pub tip_trimming: bool,
    pub min_tip_len: usize,
    /// Collapse divergent-reconvergent path pairs to the stronger side.
    pub bubble_popping: bool,
    /// Pop a bubble when the two sides' sequence similarity is at least
    /// this value (Levenshtein ratio in [0, 1])...
    pub min_bubble_similarity: f64,
    /// ...or when the weaker side's coverage is at most this fraction of
    /// the stronger side's.
    pub bubble_cov_ratio: f64,
    /// Drop edges whose weight is below `min_edge_ratio` of the strongest
    /// competing edge at the same node end.
    pub weak_edge_removal: bool,
    pub min_edge_ratio: f64,
    /// Opt-in destructive mode: relaxed thresholds plus removal of attached
    /// nodes with coverage below `min_node_cov`.
    pub aggressive: bool,
    pub min_node_cov: u32,
    /// Iteration cap for the fixed-point loop.
    pub max_rounds: usize,
}

impl Default for CleanPolicy {
    fn default() -> Self {
        CleanPolicy {
            tip_trimming: true,
            min_tip_len: 60,
            bubble_popping: true,
            min_bubble_similarity: 0.85,
            bubble_cov_ratio: 0.15,
            weak_edge_removal: true,
            min_edge_ratio: 0.25,
            aggressive: false,
            min_node_cov: 2,
            max_rounds: 8,
        }
    }
}

impl CleanPolicy {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("min_bubble_similarity", self.min_bubble_similarity),
            ("bubble_cov_ratio", self.bubble_cov_ratio),
            ("min_edge_ratio", self.min_edge_ratio),
        ] {
            if !(0.0..=1.0).contains(&v) || v.is_nan() {
                return Err(AsmError::ConfigurationError(format!(
                    "{} must be within [0, 1], got {}",
                    name, v
                )));
            }
        }
        if self.max_rounds == 0 {
            return Err(AsmError::ConfigurationError(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The thresholds actually applied, after the aggressive relaxation.
    pub fn effective(&self) -> CleanPolicy {
        if !self.aggressive {
            return self.clone();
        }
        let mut p = self.clone();
        p.min_tip_len = (self.min_tip_len * 3) / 2;
        p.min_bubble_similarity = (self.min_bubble_similarity * 0.9).max(0.0);
        p.bubble_cov_ratio = (self.bubble_cov_ratio * 2.0).min(1.0);
        p.min_edge_ratio = (self.min_edge_ratio * 2.0).min(1.0);
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(AssembleOptions::default().validate().is_ok());
    }

    #[test]
    fn oversized_correction_k_rejected() {
        let mut opts = AssembleOptions::default();
        opts.error_correction_k = Some(32);
        assert!(matches!(
            opts.validate(),
            Err(AsmError::ConfigurationError(_))
        ));
    }

    #[test]
    fn zero_k_rejected() {
        let mut opts = AssembleOptions::default();
        opts.error_correction_k = Some(0);
        assert!(opts.validate().is_err());
        let mut opts = AssembleOptions::default();
        opts.unitig_k = Some(0);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn long_overlap_is_allowed() {
        let mut opts = AssembleOptions::default();
        opts.unitig_k = Some(50);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn bad_ratio_rejected() {
        let mut opts = AssembleOptions::default();
        opts.clean.min_edge_ratio = 1.5;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn aggressive_relaxes_thresholds() {
        let mut policy = CleanPolicy::default();
        policy.aggressive = true;
        let eff = policy.effective();
        assert!(eff.min_tip_len > policy.min_tip_len);
        assert!(eff.min_edge_ratio > policy.min_edge_ratio);
    }
}
