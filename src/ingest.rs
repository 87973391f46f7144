use std::borrow::Borrow;
use std::io;
use std::time::Instant;

use io::BufRead;
use io::Write;

use arrow::datatypes::Schema;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;

use crate::batch::BatchAccumulator;
use crate::error::Error;
use crate::matcher::LineMatcher;
use crate::pattern::Pattern;

/// Text lines with the `\n` or `\r\n` terminator dropped. Invalid UTF-8 is
/// replaced with U+FFFD instead of failing the read.
pub fn reader2lines<R>(rdr: R) -> impl Iterator<Item = Result<String, io::Error>>
where
    R: BufRead,
{
    reader2byte_lines(rdr).map(|rline| {
        rline.map(|line| match String::from_utf8(line) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    })
}

/// Splits raw bytes on `\n`, dropping the terminator and a trailing `\r`.
pub fn reader2byte_lines<R>(rdr: R) -> impl Iterator<Item = Result<Vec<u8>, io::Error>>
where
    R: BufRead,
{
    rdr.split(b'\n').map(|rline| {
        rline.map(|mut line| {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Stop after this many accepted rows; 0 means no limit.
    pub row_limit: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read from the source.
    pub lines: u64,
    /// Lines that matched and were appended.
    pub rows: u64,
    /// Lines that did not match.
    pub skipped: u64,
    /// Batches yielded.
    pub batches: u64,
}

pub fn lines2batch_iter<I, L, P>(
    lines: I,
    matcher: LineMatcher<P>,
    bldr: BatchAccumulator,
    opts: IngestOptions,
) -> Lines2BatchIter<I, P>
where
    I: Iterator<Item = Result<L, io::Error>>,
    L: Borrow<P::Haystack>,
    P: Pattern,
{
    Lines2BatchIter {
        lines,
        matcher,
        bldr,
        opts,
        stats: IngestStats::default(),
        done: false,
    }
}

/// Yields a batch each time the accumulator reaches its threshold, plus one
/// for the rows left at end of input. Never yields an empty batch.
pub struct Lines2BatchIter<I, P>
where
    P: Pattern,
{
    lines: I,
    matcher: LineMatcher<P>,
    bldr: BatchAccumulator,
    opts: IngestOptions,
    stats: IngestStats,
    done: bool,
}

impl<I, P> Lines2BatchIter<I, P>
where
    P: Pattern,
{
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    fn limit_reached(&self) -> bool {
        self.opts.row_limit > 0 && self.stats.rows >= self.opts.row_limit
    }

    fn flush(&mut self) -> Option<Result<RecordBatch, Error>> {
        if self.bldr.is_empty() {
            return None;
        }
        self.stats.batches += 1;
        Some(self.bldr.finalize().map_err(Error::from))
    }
}

impl<I, L, P> Iterator for Lines2BatchIter<I, P>
where
    I: Iterator<Item = Result<L, io::Error>>,
    L: Borrow<P::Haystack>,
    P: Pattern,
{
    type Item = Result<RecordBatch, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.limit_reached() {
            let line: L = match self.lines.next() {
                None => break,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                Some(Ok(l)) => l,
            };
            self.stats.lines += 1;

            let hay: &P::Haystack = line.borrow();
            match self.matcher.match_line(hay) {
                None => {
                    self.stats.skipped += 1;
                    tracing::debug!(line = self.stats.lines, "does not match pattern");
                }
                Some(vals) => {
                    self.bldr.append(&vals);
                    self.stats.rows += 1;
                }
            }

            if self.bldr.should_flush() {
                return self.flush();
            }
        }

        if self.limit_reached() {
            tracing::debug!(limit = self.opts.row_limit, "row limit reached");
        }
        self.done = true;
        self.flush()
    }
}

/// Writes every batch to an arrow ipc file and returns the number of rows
/// written. Stops at the first failing batch.
pub fn batches2ipc_file<W, I>(
    out: W,
    schema: &Schema,
    batches: I,
    bench_report: bool,
) -> Result<u64, Error>
where
    W: Write,
    I: Iterator<Item = Result<RecordBatch, Error>>,
{
    let mut writer = FileWriter::try_new(out, schema)?;
    let mut rows: u64 = 0;
    let mut started = Instant::now();

    for rbat in batches {
        let bat: RecordBatch = rbat?;
        writer.write(&bat)?;
        rows += bat.num_rows() as u64;
        if bench_report {
            tracing::info!(rows = bat.num_rows(), elapsed = ?started.elapsed(), "batch written");
            started = Instant::now();
        }
    }

    writer.finish()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::sync::Arc;

    use arrow::array::Array;
    use arrow::array::StringArray;
    use arrow::ipc::reader::FileReader;
    use regex::Regex;

    use crate::batch::BuilderConfig;
    use crate::schema::derive_schema;

    fn setup(pat: &str, max_rows: usize) -> (LineMatcher<Regex>, BatchAccumulator) {
        let re = Regex::new(pat).unwrap();
        let schema = derive_schema(&re).unwrap();
        let acc = BatchAccumulator::new(schema, max_rows, BuilderConfig::for_batch_size(max_rows));
        (LineMatcher::new(re).unwrap(), acc)
    }

    fn ok_lines(lines: &[&str]) -> std::vec::IntoIter<Result<String, io::Error>> {
        lines
            .iter()
            .map(|l| Ok(l.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn two_then_one() {
        let (m, acc) = setup(r"(?P<field>\w+)", 2);
        let mut it = lines2batch_iter(ok_lines(&["a", "b", "c"]), m, acc, IngestOptions::default());

        let sizes: Vec<usize> = (&mut it).map(|r| r.unwrap().num_rows()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(
            it.stats(),
            IngestStats {
                lines: 3,
                rows: 3,
                skipped: 0,
                batches: 2
            }
        );
        assert!(it.next().is_none());
    }

    #[test]
    fn non_matching_lines_are_skipped() {
        let (m, acc) = setup(r"^(?P<a>\w+)-(?P<b>\d+)$", 10);
        let lines = ok_lines(&["foo-1", "garbage", "", "bar-22"]);
        let mut it = lines2batch_iter(lines, m, acc, IngestOptions::default());

        let batch = it.next().unwrap().unwrap();
        assert!(it.next().is_none());
        assert_eq!(batch.num_rows(), 2);
        let a = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        let b = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(a.value(1), "bar");
        assert_eq!(b.value(1), "22");
        assert_eq!(it.stats().skipped, 2);
    }

    #[test]
    fn no_matches_no_batches() {
        let (m, acc) = setup(r"^(?P<n>\d+)$", 2);
        let mut it = lines2batch_iter(ok_lines(&["x", "y"]), m, acc, IngestOptions::default());
        assert!(it.next().is_none());
        assert_eq!(it.stats().batches, 0);
    }

    #[test]
    fn row_limit() {
        let (m, acc) = setup(r"(?P<field>\w+)", 2);
        let opts = IngestOptions { row_limit: 3 };
        let lines = ok_lines(&["a", "b", "c", "d", "e"]);
        let mut it = lines2batch_iter(lines, m, acc, opts);

        let sizes: Vec<usize> = (&mut it).map(|r| r.unwrap().num_rows()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(it.stats().lines, 3);
    }

    #[test]
    fn io_error_ends_iteration() {
        let (m, acc) = setup(r"(?P<field>\w+)", 0);
        let lines = vec![
            Ok("a".to_string()),
            Err(io::Error::other("boom")),
            Ok("b".to_string()),
        ];
        let mut it = lines2batch_iter(lines.into_iter(), m, acc, IngestOptions::default());
        assert!(matches!(it.next(), Some(Err(Error::Io(_)))));
        assert!(it.next().is_none());
    }

    #[test]
    fn invalid_utf8_text_line_is_kept() {
        let (m, acc) = setup(r"^(?P<year>\d{4}) (?P<level>\w+) (?P<msg>.+)$", 0);
        let input: &[u8] = b"2024 INFO ok\n2024 INFO caf\xe9\r\n2024 INFO after\n";
        let mut it = lines2batch_iter(reader2lines(input), m, acc, IngestOptions::default());

        let batch = it.next().unwrap().unwrap();
        assert!(it.next().is_none());
        assert_eq!(batch.num_rows(), 3);
        let msg = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(msg.value(0), "ok");
        assert_eq!(msg.value(1), "caf\u{fffd}");
        assert_eq!(msg.value(2), "after");
    }

    #[test]
    fn byte_lines() {
        let input: &[u8] = b"k1=v1\r\nnot a pair\nk2=\xff\n";
        let re = regex::bytes::Regex::new(r"^(?P<k>[^=]+)=(?-u:(?P<v>.*))$").unwrap();
        let schema = derive_schema(&re).unwrap();
        let acc = BatchAccumulator::new(schema, 0, BuilderConfig::default());
        let m = LineMatcher::new(re).unwrap();

        let mut it = lines2batch_iter(reader2byte_lines(input), m, acc, IngestOptions::default());
        let batch = it.next().unwrap().unwrap();
        let v = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(v.value(0), "v1");
        assert_eq!(v.value(1), "\u{fffd}");
        assert_eq!(it.stats().skipped, 1);
    }

    #[test]
    fn ipc_file_roundtrip() {
        let (m, acc) = setup(r"^(?P<ts>\S+) (?P<level>\w+) (?P<msg>.+)$", 2);
        let schema = acc.schema();
        let text = "2024-01-01T00:00:00Z INFO up\n\
                    2024-01-01T00:00:01Z WARN slow\n\
                    broken\n\
                    2024-01-01T00:00:02Z INFO done\n";
        let lines = reader2lines(Cursor::new(text));
        let it = lines2batch_iter(lines, m, acc, IngestOptions::default());

        let mut buf = Vec::new();
        let written = batches2ipc_file(&mut buf, &schema, it, true).unwrap();
        assert_eq!(written, 3);

        let rdr = FileReader::try_new(Cursor::new(buf), None).unwrap();
        assert_eq!(rdr.schema(), Arc::clone(&schema));
        let batches: Vec<RecordBatch> = rdr.map(|r| r.unwrap()).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].num_rows(), 2);
        assert_eq!(batches[1].num_rows(), 1);

        let msg = batches[1]
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(msg.value(0), "done");
    }

    #[test]
    fn ipc_file_stops_on_error() {
        let re = Regex::new(r"(?P<field>\w+)").unwrap();
        let schema = derive_schema(&re).unwrap();
        let batches = vec![Err(Error::Io(io::Error::other("read failed")))];
        let res = batches2ipc_file(Vec::new(), &schema, batches.into_iter(), false);
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
