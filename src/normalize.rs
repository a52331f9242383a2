use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::{debug, trace};

use crate::models::*;

/// A parsed edge list: the verbatim header and the canonical edges below it.
#[derive(Debug, Default)]
pub struct EdgeList {
    pub header: String,
    pub edges: EdgeSet,
    pub read: u64,
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl EdgeList {
    pub fn read_from<R: BufRead>(mut reader: R, extra: ExtraColumns) -> Result<EdgeList> {
        let mut list = EdgeList::default();
        reader
            .read_line(&mut list.header)
            .context("Failed to read the header line")?;

        let mut line = String::new();
        // the header is line 1
        let mut lineno: u64 = 1;
        loop {
            line.clear();
            let n = reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read line {}", lineno + 1))?;
            if n == 0 {
                break;
            }
            lineno += 1;

            let edge = CanonicalEdge::parse(strip_terminator(&line), extra)
                .with_context(|| format!("Malformed record at line {}", lineno))?;
            if !list.edges.insert(&edge) {
                trace!(line = lineno, "duplicate edge {}", edge);
            }
            list.read += 1;
        }
        Ok(list)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.header.as_bytes())?;
        for line in self.edges.iter() {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()
    }

    pub fn stats(&self) -> NormalizeStats {
        NormalizeStats {
            read: self.read,
            unique: self.edges.len() as u64,
        }
    }
}

/// Canonicalizes, deduplicates and sorts the edge list read from `reader`.
///
/// Nothing is written until the whole input has been parsed.
pub fn normalize<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    extra: ExtraColumns,
) -> Result<NormalizeStats> {
    let list = EdgeList::read_from(reader, extra)?;
    list.write_to(writer).context("Failed to write edges")?;
    Ok(list.stats())
}

pub fn normalize_file(input: &Path, output: &Path, extra: ExtraColumns) -> Result<NormalizeStats> {
    let file = fs::File::open(input)
        .with_context(|| format!("Failed to open input: {}", input.to_string_lossy()))?;
    let list = EdgeList::read_from(io::BufReader::new(file), extra)
        .with_context(|| format!("Failed to parse: {}", input.to_string_lossy()))?;
    debug!(
        input = %input.display(),
        read = list.read,
        unique = list.edges.len(),
        "parsed edge list"
    );

    let file = fs::File::create(output)
        .with_context(|| format!("Failed to create output: {}", output.to_string_lossy()))?;
    list.write_to(io::BufWriter::new(file))
        .with_context(|| format!("Failed to write: {}", output.to_string_lossy()))?;
    Ok(list.stats())
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(input: &str, extra: ExtraColumns) -> Result<(String, NormalizeStats)> {
        let mut buffer: Vec<u8> = Vec::new();
        let stats = normalize(input.as_bytes(), &mut buffer, extra)?;
        Ok((String::from_utf8(buffer).unwrap(), stats))
    }

    #[test]
    fn end_to_end() {
        let (output, stats) = run(
            "Gene1\tGene2\tWeight\nB\tA\t0.5\nA\tB\t0.5\nA\tC\t0.2\n",
            ExtraColumns::Reject,
        )
        .unwrap();
        assert_eq!(output, "Gene1\tGene2\tWeight\nA\tB\t0.5\nA\tC\t0.2\n");
        assert_eq!(stats, NormalizeStats { read: 3, unique: 2 });
    }

    #[test]
    fn payload_distinguishes_edges() {
        let (output, _) = run("h\nA\tB\tW2\nB\tA\tW1\n", ExtraColumns::Reject).unwrap();
        assert_eq!(output, "h\nA\tB\tW1\nA\tB\tW2\n");
    }

    #[test]
    fn sorted_by_full_line() {
        let (output, _) = run("h\nC\tD\tX\nA\tB\tY\n", ExtraColumns::Reject).unwrap();
        assert_eq!(output, "h\nA\tB\tY\nC\tD\tX\n");
    }

    #[test]
    fn header_is_verbatim() {
        let (output, _) = run(" a\tb \t c\r\nB\tA\t1\r\n", ExtraColumns::Reject).unwrap();
        assert_eq!(output, " a\tb \t c\r\nA\tB\t1\n");
    }

    #[test]
    fn low_control_byte_sorts_first() {
        let (output, _) = run("h\nA\tB\t1\x01\nA\tB\t1\n", ExtraColumns::Reject).unwrap();
        assert_eq!(output, "h\nA\tB\t1\x01\nA\tB\t1\n");
    }

    #[test]
    fn final_line_without_newline() {
        let (output, _) = run("h\nB\tA\t1\nC\tA\t2", ExtraColumns::Reject).unwrap();
        assert_eq!(output, "h\nA\tB\t1\nA\tC\t2\n");
    }

    #[test]
    fn header_only_and_empty_input() {
        let (output, stats) = run("h\n", ExtraColumns::Reject).unwrap();
        assert_eq!(output, "h\n");
        assert_eq!(stats, NormalizeStats::default());

        let (output, _) = run("", ExtraColumns::Reject).unwrap();
        assert_eq!(output, "");
    }

    #[test]
    fn malformed_record_is_fatal() {
        let mut buffer: Vec<u8> = Vec::new();
        let err = normalize(
            "h\nA\tB\t1\nA B 2\n".as_bytes(),
            &mut buffer,
            ExtraColumns::Reject,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<MalformedRecord>(),
            Some(&MalformedRecord::TooFewFields(1))
        );
        assert!(err.to_string().contains("line 3"));
        // nothing is written on failure
        assert!(buffer.is_empty());
    }

    #[test]
    fn blank_line_is_malformed() {
        let err = run("h\nA\tB\t1\n\n", ExtraColumns::Drop).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MalformedRecord>(),
            Some(&MalformedRecord::TooFewFields(1))
        );
    }

    #[test]
    fn extra_columns_policy() {
        let input = "h\nB\tA\t1\tnote\nA\tB\t1\n";
        let err = run(input, ExtraColumns::Reject).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MalformedRecord>(),
            Some(&MalformedRecord::TooManyFields(4))
        );

        let (output, stats) = run(input, ExtraColumns::Drop).unwrap();
        assert_eq!(output, "h\nA\tB\t1\n");
        assert_eq!(stats, NormalizeStats { read: 2, unique: 1 });
    }
}
