use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{AsmError, Result};
use crate::read::Read;

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub header: String,
    pub sequence: String,
    pub plus: String,
    pub quality: String,
}

/// Open a FASTQ file for reading; gzipped input is detected by extension.
pub fn open_fastq(path: &str) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| AsmError::io(e, path))?;
    if path.ends_with(".gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Stream FASTQ records without loading the whole file. A trailing
/// truncated record ends the stream.
pub fn stream_fastq_records<R: BufRead>(reader: R) -> impl Iterator<Item = FastqRecord> {
    FastqStreamParser {
        lines: reader.lines(),
    }
}

pub struct FastqStreamParser<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    lines: I,
}

impl<I> Iterator for FastqStreamParser<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = FastqRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let header = match self.lines.next() {
            Some(Ok(line)) => line,
            _ => return None,
        };
        let sequence = match self.lines.next() {
            Some(Ok(line)) => line,
            _ => return None,
        };
        let plus = match self.lines.next() {
            Some(Ok(line)) => line,
            _ => return None,
        };
        let quality = match self.lines.next() {
            Some(Ok(line)) => line,
            _ => return None,
        };
        Some(FastqRecord {
            header,
            sequence,
            plus,
            quality,
        })
    }
}

pub enum FastqWriter {
    Plain(BufWriter<Box<dyn Write>>),
    Compressed(BufWriter<GzEncoder<Box<dyn Write>>>),
}

impl FastqWriter {
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
            FastqWriter::Compressed(BufWriter::new(GzEncoder::new(sink, Compression::default())))
        } else {
            FastqWriter::Plain(BufWriter::new(sink))
        })
    }

    /// Write one (possibly corrected) read under its original header.
    /// Reads without qualities get a constant placeholder line.
    pub fn write_read(&mut self, header: &str, read: &Read) -> io::Result<()> {
        let seq = std::str::from_utf8(&read.seq).expect("reads are ASCII");
        let qual = match &read.qual {
            Some(q) => String::from_utf8(q.clone()).expect("qualities are ASCII"),
            None => "I".repeat(read.seq.len()),
        };
        match self {
            FastqWriter::Plain(w) => writeln!(w, "{}\n{}\n+\n{}", header, seq, qual),
            FastqWriter::Compressed(w) => writeln!(w, "{}\n{}\n+\n{}", header, seq, qual),
        }
    }

    pub fn finish(self) -> io::Result<()> {
        match self {
            FastqWriter::Plain(mut w) => w.flush(),
            FastqWriter::Compressed(w) => {
                w.into_inner()
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
                    .finish()?
                    .flush()
            }
        }
    }
}
