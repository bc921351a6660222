use std::fs::File;
use std::io::{self, BufWriter, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{AsmError, Result};
use crate::graph::Unitig;

pub enum FastaWriter {
    Plain(BufWriter<Box<dyn Write>>),
    Compressed(BufWriter<GzEncoder<Box<dyn Write>>>),
}

impl FastaWriter {
    /// Write to `path`, or to stdout when `path` is `None`. A `.gz`
    /// extension turns on compression.
    pub fn create(path: Option<&str>) -> Result<Self> {
        let (sink, gz): (Box<dyn Write>, bool) = match path {
            Some(p) => {
                let file = File::create(p).map_err(|e| AsmError::io(e, p))?;
                (Box::new(file), p.ends_with(".gz"))
            }
            None => (Box::new(io::stdout()), false),
        };
        Ok(if gz {
            FastaWriter::Compressed(BufWriter::new(GzEncoder::new(sink, Compression::default())))
        } else {
            FastaWriter::Plain(BufWriter::new(sink))
        })
    }

    /// One record per unitig, with coverage metadata in the header:
    /// `>utg<id> len=<bases> cov=<reads> depth=<mean per-base depth>`.
    pub fn write_unitig(&mut self, id: usize, unitig: &Unitig) -> io::Result<()> {
        let depth = if unitig.seq.is_empty() {
            0.0
        } else {
            unitig.total_read_bases as f64 / unitig.seq.len() as f64
        };
        let seq = std::str::from_utf8(&unitig.seq).expect("unitigs are ASCII");
        match self {
            FastaWriter::Plain(w) => writeln!(
                w,
                ">utg{} len={} cov={} depth={:.2}\n{}",
                id,
                unitig.seq.len(),
                unitig.coverage,
                depth,
                seq
            ),
            FastaWriter::Compressed(w) => writeln!(
                w,
                ">utg{} len={} cov={} depth={:.2}\n{}",
                id,
                unitig.seq.len(),
                unitig.coverage,
                depth,
                seq
            ),
        }
    }

    pub fn finish(self) -> io::Result<()> {
        match self {
            FastaWriter::Plain(mut w) => w.flush(),
            FastaWriter::Compressed(w) => {
                w.into_inner()
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
                    .finish()?
                    .flush()
            }
        }
    }
}
