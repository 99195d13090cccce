//! Record readers: newline-delimited (optionally hex) and fixed-size binary.

use std::io::{self, BufRead, Read};
use std::num::NonZeroUsize;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("record {record}: odd number of hex digits")]
    OddHexLength { record: u64 },
    #[error("record {record}: invalid hex digit {byte:#04x}")]
    InvalidHexDigit { record: u64, byte: u8 },
}

/// How the input stream is cut into records.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum InputFormat {
    /// One record per line, trailing `\n` removed.
    #[default]
    Lines,
    /// One record per line, each line a string of hex digit pairs.
    HexLines,
    /// Consecutive records of this many bytes; the last may be shorter.
    Fixed(NonZeroUsize),
}

fn nibble(byte: u8, record: u64) -> Result<u8, InputError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(InputError::InvalidHexDigit { record, byte }),
    }
}

/// Decode pairs of hex digits. `record` is the 1-based record number used
/// in error reports.
pub fn decode_hex(src: &[u8], record: u64) -> Result<Vec<u8>, InputError> {
    if src.len() % 2 != 0 {
        return Err(InputError::OddHexLength { record });
    }
    src.chunks_exact(2)
        .map(|pair| -> Result<u8, InputError> {
            Ok((nibble(pair[0], record)? << 4) | nibble(pair[1], record)?)
        })
        .collect()
}

pub struct LineRecords<R> {
    reader: R,
    hex: bool,
    record: u64,
}

impl<R: BufRead> LineRecords<R> {
    pub fn new(reader: R, hex: bool) -> Self {
        Self {
            reader,
            hex,
            record: 0,
        }
    }
}

impl<R: BufRead> Iterator for LineRecords<R> {
    type Item = Result<Vec<u8>, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                self.record += 1;
                if self.hex {
                    Some(decode_hex(&line, self.record))
                } else {
                    Some(Ok(line))
                }
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

pub struct FixedRecords<R> {
    reader: R,
    size: NonZeroUsize,
}

impl<R: Read> FixedRecords<R> {
    pub fn new(reader: R, size: NonZeroUsize) -> Self {
        Self { reader, size }
    }
}

impl<R: Read> Iterator for FixedRecords<R> {
    type Item = Result<Vec<u8>, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = vec![0u8; self.size.get()];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        if filled == 0 {
            return None;
        }
        buf.truncate(filled);
        Some(Ok(buf))
    }
}

/// Records of a stream in any [`InputFormat`].
pub enum Records<R> {
    Lines(LineRecords<R>),
    Fixed(FixedRecords<R>),
}

impl<R: BufRead> Records<R> {
    pub fn new(format: InputFormat, reader: R) -> Self {
        match format {
            InputFormat::Lines => Records::Lines(LineRecords::new(reader, false)),
            InputFormat::HexLines => Records::Lines(LineRecords::new(reader, true)),
            InputFormat::Fixed(size) => Records::Fixed(FixedRecords::new(reader, size)),
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Vec<u8>, InputError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Records::Lines(it) => it.next(),
            Records::Fixed(it) => it.next(),
        }
    }
}
