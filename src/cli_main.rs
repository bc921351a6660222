use clap::Parser;

/// Local assembler for small peak regions: corrects sequencing errors,
/// builds and cleans an overlap graph, and emits unitigs.
#[derive(Parser, Debug)]
#[command(name = "talon", version, about = "Local assembler for small peak regions", long_about = None)]
pub struct Cli {
    /// Input FASTQ(.gz) file with one region's reads
    pub input: String,

    /// Output file; FASTA of unitigs, or FASTQ of reads with -U.
    /// Writes to stdout when omitted; .gz enables compression
    #[arg(short, long)]
    pub output: Option<String>,

    /// Run k-mer error correction before assembly
    #[arg(short = 'e', long)]
    pub error_correction: bool,

    /// k-mer length for error correction (auto-selected when omitted)
    #[arg(short = 'k', long, value_name = "K")]
    pub ec_k: Option<usize>,

    /// Skip unitig construction and emit the (possibly corrected) reads
    #[arg(short = 'U', long)]
    pub skip_unitig: bool,

    /// Minimum overlap length for unitig construction (auto-selected when omitted)
    #[arg(short = 'l', long, value_name = "K")]
    pub unitig_k: Option<usize>,

    /// Clean the assembly graph (tips, bubbles, weak edges)
    #[arg(short = 'c', long)]
    pub clean: bool,

    /// More destructive cleaning: relaxed thresholds plus low-coverage
    /// node removal. Implies --clean
    #[arg(long)]
    pub aggressive: bool,

    /// Number of threads
    #[arg(long, default_value_t = num_cpus::get())]
    pub threads: usize,

    /// Write an assembly-summary JSON to this path
    #[arg(long, value_name = "FILE")]
    pub json_stats: Option<String>,
}
