//! Sequence-file boundary: FASTQ in, FASTQ or FASTA out.

pub mod fasta;
pub mod fastq;
