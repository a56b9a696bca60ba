//! Flat-text adapters for histogram input and result output.
//!
//! Histograms arrive as one whitespace-delimited line of counts; results
//! leave as space-separated counts with a trailing newline, one line per
//! run. The core algorithms never perform I/O themselves.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use hist_privacy_core::{Histogram, Result};

/// Read a histogram from the first line of `reader`.
pub fn read_histogram<R: BufRead>(reader: &mut R) -> Result<Histogram> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Histogram::from_line(&line)
}

/// Load a histogram from a whitespace-delimited text file.
pub fn load_histogram<P: AsRef<Path>>(path: P) -> Result<Histogram> {
    let mut reader = BufReader::new(File::open(path)?);
    read_histogram(&mut reader)
}

/// Write counts space-separated with a trailing newline.
pub fn write_counts<W: Write>(writer: &mut W, counts: &[f64]) -> Result<()> {
    for value in counts {
        write!(writer, "{value} ")?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Append one run's counts to a result file, creating it if needed.
pub fn append_counts<P: AsRef<Path>>(path: P, counts: &[f64]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write_counts(&mut file, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_first_line_only() {
        let mut reader = Cursor::new("1 2 3\n4 5 6\n");
        let hist = read_histogram(&mut reader).expect("valid");
        assert_eq!(hist.counts(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut buf = Vec::new();
        write_counts(&mut buf, &[1.5, 0.0, 42.0]).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "1.5 0 42 \n");

        let mut reader = Cursor::new(text);
        let hist = read_histogram(&mut reader).expect("read");
        assert_eq!(hist.counts(), &[1.5, 0.0, 42.0]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let mut reader = Cursor::new("");
        assert!(read_histogram(&mut reader).is_err());
    }
}
