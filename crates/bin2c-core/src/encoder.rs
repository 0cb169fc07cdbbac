//! Streaming conversion of binary data into C array elements.
//!
//! The encoder reads its source in fixed-size chunks and writes every byte as
//! an `unsigned char` literal (`0x0Au`), separated by `", "`. Nothing is
//! buffered beyond one chunk, so inputs of any size stream straight through
//! to the sink.
//!
//! ## Element count
//!
//! The number of elements is tracked as it is produced and may never exceed
//! the positive range of the C `long` type on the host. The final
//! [`ElementCount`] picks the narrowest integer literal able to hold it when
//! rendered into a size macro.

use crate::error::{Error, Result};
use std::ffi::c_long;
use std::fmt;
use std::io::{self, Read, Write};
use tracing::{debug, trace};

/// Chunk size used for reads: a few pages on x86 processors
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub const DEFAULT_CHUNK_SIZE: usize = 4096 * 4;

/// Chunk size used for reads: a few storage sectors elsewhere
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 8;

/// Largest element count representable by the C `long` type
pub const MAX_ELEMENTS: u64 = c_long::MAX as u64;

/// Configuration for the encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Bytes requested from the source per read
    pub chunk_size: usize,
    /// Maximum number of elements before encoding fails
    pub max_elements: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_elements: MAX_ELEMENTS,
        }
    }
}

impl EncoderConfig {
    /// Creates a new encoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read chunk size (zero is treated as one)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the element ceiling
    pub fn max_elements(mut self, max: u64) -> Self {
        self.max_elements = max;
        self
    }
}

/// Integer width used to render an element count as a C literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LiteralWidth {
    /// Fits `signed char`
    Char,
    /// Fits `short`
    Short,
    /// Fits `int`
    Int,
    /// Needs `long`
    Long,
}

impl LiteralWidth {
    /// Selects the narrowest width whose signed range contains `value`
    pub fn for_value(value: u64) -> Self {
        if value <= i8::MAX as u64 {
            LiteralWidth::Char
        } else if value <= i16::MAX as u64 {
            LiteralWidth::Short
        } else if value <= i32::MAX as u64 {
            LiteralWidth::Int
        } else {
            LiteralWidth::Long
        }
    }

    /// C literal suffix for this width
    ///
    /// Unsuffixed decimal literals already have type `int`, so only `long`
    /// needs a suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            LiteralWidth::Char | LiteralWidth::Short | LiteralWidth::Int => "",
            LiteralWidth::Long => "l",
        }
    }
}

/// Number of array elements produced by an encoding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElementCount(u64);

impl ElementCount {
    /// Wraps a raw count
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the raw count
    pub fn get(self) -> u64 {
        self.0
    }

    /// Returns the narrowest literal width able to hold the count
    pub fn literal_width(self) -> LiteralWidth {
        LiteralWidth::for_value(self.0)
    }

    /// Renders the count as a decimal C literal with the matching suffix
    pub fn to_literal(self) -> String {
        format!("{}{}", self.0, self.literal_width().suffix())
    }
}

impl fmt::Display for ElementCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Streams bytes from a reader into C array element literals
#[derive(Debug, Clone, Default)]
pub struct StreamEncoder {
    config: EncoderConfig,
}

impl StreamEncoder {
    /// Creates a new encoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new encoder with custom configuration
    pub fn with_config(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encodes all of `source` into `sink` and returns the element count.
    ///
    /// Elements are written in source order, separated by `", "` with no
    /// leading or trailing separator. An empty source writes nothing.
    ///
    /// On error the sink keeps whatever was written before the failure: a
    /// read error after `n` bytes leaves exactly `n` elements behind.
    pub fn encode<R, W>(&self, source: &mut R, sink: &mut W) -> Result<ElementCount>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let limit = self.config.max_elements;
        let mut chunk = vec![0u8; self.config.chunk_size.max(1)];
        let mut count: u64 = 0;

        loop {
            let read = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(Error::StreamRead {
                        offset: count,
                        source: e,
                    })
                }
            };

            trace!("Encoding chunk of {} bytes at offset {}", read, count);

            for &byte in &chunk[..read] {
                if count >= limit {
                    return Err(Error::CountOverflow { limit });
                }

                let separator = if count == 0 { "" } else { ", " };
                write!(sink, "{}0x{:02X}u", separator, byte).map_err(|e| Error::StreamWrite {
                    offset: count,
                    source: e,
                })?;

                count += 1;
            }
        }

        debug!("Encoded {} elements", count);
        Ok(ElementCount(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Yields `data` and then fails every subsequent read
    struct FailingReader<'a> {
        data: &'a [u8],
    }

    impl Read for FailingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "device error"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Interrupts every other read
    struct InterruptingReader<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for InterruptingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.data.len()).min(1);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Accepts `capacity` bytes, then refuses further writes
    struct FullWriter {
        written: Vec<u8>,
        capacity: usize,
    }

    impl Write for FullWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.capacity - self.written.len();
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(room);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn encode_to_string(encoder: &StreamEncoder, data: &[u8]) -> (String, ElementCount) {
        let mut out = Vec::new();
        let count = encoder.encode(&mut &data[..], &mut out).unwrap();
        (String::from_utf8(out).unwrap(), count)
    }

    fn parse_elements(text: &str) -> Vec<u8> {
        text.split(", ")
            .filter(|s| !s.is_empty())
            .map(|s| {
                let hex = s.strip_prefix("0x").unwrap().strip_suffix('u').unwrap();
                u8::from_str_radix(hex, 16).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_encode_format() {
        let (text, count) = encode_to_string(&StreamEncoder::new(), &[0x00, 0x0A, 0xFF, 0x7f]);
        assert_eq!(text, "0x00u, 0x0Au, 0xFFu, 0x7Fu");
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn test_encode_empty() {
        let (text, count) = encode_to_string(&StreamEncoder::new(), &[]);
        assert_eq!(text, "");
        assert_eq!(count, ElementCount::new(0));
    }

    #[test]
    fn test_round_trip_across_chunks() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let encoder = StreamEncoder::with_config(EncoderConfig::new().chunk_size(7));
        let (text, count) = encode_to_string(&encoder, &data);

        assert_eq!(count.get(), data.len() as u64);
        assert_eq!(parse_elements(&text), data);
    }

    #[test]
    fn test_chunk_size_does_not_change_output() {
        let data: Vec<u8> = (0..100u8).rev().collect();
        let (small, _) = encode_to_string(
            &StreamEncoder::with_config(EncoderConfig::new().chunk_size(1)),
            &data,
        );
        let (large, _) = encode_to_string(&StreamEncoder::new(), &data);
        let (zero, _) = encode_to_string(
            &StreamEncoder::with_config(EncoderConfig::new().chunk_size(0)),
            &data,
        );
        assert_eq!(small, large);
        assert_eq!(zero, large);
    }

    #[test]
    fn test_read_error_keeps_written_elements() {
        let encoder = StreamEncoder::with_config(EncoderConfig::new().chunk_size(2));
        let mut source = FailingReader { data: &[1, 2, 3] };
        let mut out = Vec::new();

        let err = encoder.encode(&mut source, &mut out).unwrap_err();
        assert!(matches!(err, Error::StreamRead { offset: 3, .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "0x01u, 0x02u, 0x03u");
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let mut source = InterruptingReader {
            data: &[9, 8, 7],
            interrupt: false,
        };
        let mut out = Vec::new();
        let count = StreamEncoder::new().encode(&mut source, &mut out).unwrap();
        assert_eq!(count.get(), 3);
        assert_eq!(String::from_utf8(out).unwrap(), "0x09u, 0x08u, 0x07u");
    }

    #[test]
    fn test_write_error_stops_encoding() {
        let mut sink = FullWriter {
            written: Vec::new(),
            capacity: 8,
        };
        let err = StreamEncoder::new()
            .encode(&mut &[0xAB, 0xCD, 0xEF][..], &mut sink)
            .unwrap_err();

        assert!(matches!(err, Error::StreamWrite { offset: 1, .. }));
        assert_eq!(sink.written, b"0xABu, 0");
    }

    #[test]
    fn test_count_overflow() {
        let encoder = StreamEncoder::with_config(EncoderConfig::new().max_elements(2));
        let mut out = Vec::new();

        assert!(encoder.encode(&mut &[1, 2][..], &mut out).is_ok());

        out.clear();
        let err = encoder.encode(&mut &[1, 2, 3][..], &mut out).unwrap_err();
        assert!(matches!(err, Error::CountOverflow { limit: 2 }));
        assert_eq!(String::from_utf8(out).unwrap(), "0x01u, 0x02u");
    }

    #[test]
    fn test_literal_width_tiers() {
        assert_eq!(LiteralWidth::for_value(0), LiteralWidth::Char);
        assert_eq!(LiteralWidth::for_value(5), LiteralWidth::Char);
        assert_eq!(LiteralWidth::for_value(127), LiteralWidth::Char);
        assert_eq!(LiteralWidth::for_value(128), LiteralWidth::Short);
        assert_eq!(LiteralWidth::for_value(200), LiteralWidth::Short);
        assert_eq!(LiteralWidth::for_value(32_768), LiteralWidth::Int);
        assert_eq!(LiteralWidth::for_value(2_147_483_648), LiteralWidth::Long);
    }

    #[test]
    fn test_count_literal() {
        assert_eq!(ElementCount::new(0).to_literal(), "0");
        assert_eq!(ElementCount::new(40_000).to_literal(), "40000");
        assert_eq!(ElementCount::new(3_000_000_000).to_literal(), "3000000000l");
        assert_eq!(ElementCount::new(3_000_000_000).to_string(), "3000000000");
    }
}
