mod cli_main;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use cli_main::Cli;
use talon::config::AssembleOptions;
use talon::error::Result;
use talon::io::fasta::FastaWriter;
use talon::io::fastq::{open_fastq, stream_fastq_records, FastqWriter};
use talon::pipeline::{assemble, AssemblyOutput, AssemblyStats};

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting tracing default failed");

    let cli = Cli::parse();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
    {
        warn!("could not size thread pool: {}", e);
    }

    if let Err(e) = run(&cli) {
        eprintln!("talon: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start = std::time::Instant::now();

    let reader = open_fastq(&cli.input)?;
    let mut headers = Vec::new();
    let mut input = Vec::new();
    for record in stream_fastq_records(reader) {
        headers.push(record.header);
        input.push((
            record.sequence.into_bytes(),
            Some(record.quality.into_bytes()),
        ));
    }
    info!("{}: {} read(s)", cli.input, input.len());

    let mut opts = AssembleOptions::default();
    opts.do_error_correction = cli.error_correction;
    opts.error_correction_k = cli.ec_k;
    opts.skip_unitig_construction = cli.skip_unitig;
    opts.unitig_k = cli.unitig_k;
    opts.do_graph_cleaning = cli.clean || cli.aggressive;
    opts.clean.aggressive = cli.aggressive;

    match assemble(input, &opts)? {
        AssemblyOutput::Reads(reads) => {
            let mut writer = FastqWriter::create(cli.output.as_deref())?;
            for (header, read) in headers.iter().zip(&reads) {
                writer.write_read(header, read)?;
            }
            writer.finish()?;
            if cli.json_stats.is_some() {
                warn!("--json-stats ignored with -U (no unitigs assembled)");
            }
        }
        AssemblyOutput::Unitigs(unitigs) => {
            let mut writer = FastaWriter::create(cli.output.as_deref())?;
            for (id, unitig) in unitigs.iter().enumerate() {
                writer.write_unitig(id, unitig)?;
            }
            writer.finish()?;
            if let Some(path) = &cli.json_stats {
                let stats = AssemblyStats::from_unitigs(&unitigs);
                let json = serde_json::to_string_pretty(&stats)
                    .expect("stats serialize to JSON");
                std::fs::write(path, json)
                    .map_err(|e| talon::error::AsmError::io(e, path))?;
            }
        }
    }

    info!("done in {:.2}s", start.elapsed().as_secs_f32());
    Ok(())
}
