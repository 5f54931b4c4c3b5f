//! Binary Interchange File Format (BIFF8) record reader.
//! A BIFF8 stream is a flat sequence of `(type, size, payload)` records where
//! large payloads spill into trailing `CONTINUE` records.

use crate::error::WorkbookError;
use crate::helpers::bytes::u16_at;
use crate::helpers::bytes::u32_at;
use crate::helpers::bytes::u64_at;
use encoding_rs::Encoding;
use encoding_rs::UTF_16LE;
use thiserror::Error;

const CONTINUE: u16 = 60;

/// Errors specific to BIFF8 record decoding
#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Record ended with fewer than {0} bytes remaining")]
    NotEnoughData(usize),
}

/// Cursor over the records of a BIFF8 stream.
///
/// `next` advances to the following record and gathers its `CONTINUE`
/// segments; the `read_*` methods then consume the record payload.
pub(crate) struct Biff8Reader {
    /// Encoding of 8-bit ("compressed") strings, set by the CODEPAGE record
    pub(crate) encoding: &'static Encoding,
    stream: Vec<u8>,
    position: usize,
    segments: Vec<(usize, usize)>,
    segment: usize,
    offset: usize,
}

impl Biff8Reader {
    pub(crate) fn new(stream: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            encoding: UTF_16LE,
            stream,
            position: 0,
            segments: Vec::new(),
            segment: 0,
            offset: 0,
        }
    }

    /// Moves to the next record and returns its type, or `None` at the end of the stream
    pub(crate) fn next(&mut self) -> Result<Option<u16>, WorkbookError> {
        let (kind, size) = match self.record_header(self.position) {
            Some(header) => header,
            None => return Ok(None),
        };
        self.segments.clear();
        self.segment = 0;
        self.offset = 0;
        self.push_segment(size)?;
        while let Some((CONTINUE, size)) = self.record_header(self.position) {
            self.push_segment(size)?;
        }
        Ok(Some(kind))
    }

    /// Repositions the reader at an absolute stream offset (a BOUNDSHEET8 pointer)
    pub(crate) fn goto(&mut self, position: usize) {
        self.position = position;
        self.segments.clear();
    }

    fn record_header(&self, position: usize) -> Option<(u16, usize)> {
        let kind = u16_at(&self.stream, position)?;
        let size = u16_at(&self.stream, position + 2)? as usize;
        Some((kind, size))
    }

    fn push_segment(&mut self, size: usize) -> Result<(), WorkbookError> {
        let lower = self.position + 4;
        let upper = lower + size;
        if upper > self.stream.len() {
            Err(Biff8Error::NotEnoughData(size))?;
        }
        self.segments.push((lower, upper));
        self.position = upper;
        Ok(())
    }

    /// Consumes at most `length` bytes without crossing into the next segment
    fn take_partial(&mut self, length: usize) -> &[u8] {
        while let Some((lower, upper)) = self.segments.get(self.segment).copied() {
            let source = lower + self.offset;
            if source >= upper {
                self.segment += 1;
                self.offset = 0;
                continue;
            }
            let target = upper.min(source + length);
            self.offset += target - source;
            return &self.stream[source..target];
        }
        &[]
    }

    /// Consumes exactly `length` bytes of the current segment
    fn take(&mut self, length: usize) -> Result<&[u8], WorkbookError> {
        let (lower, upper) = match self.segments.get(self.segment).copied() {
            Some(segment) => segment,
            None => Err(Biff8Error::NotEnoughData(length))?,
        };
        let source = lower + self.offset;
        if source + length > upper {
            // Fixed-size fields never straddle a CONTINUE boundary unless the
            // current segment is exhausted exactly
            if source == upper {
                self.segment += 1;
                self.offset = 0;
                return self.take(length);
            }
            Err(Biff8Error::NotEnoughData(length))?;
        }
        self.offset += length;
        Ok(&self.stream[source..source + length])
    }

    /// Skips `length` bytes, crossing segment boundaries if needed
    pub(crate) fn skip(&mut self, length: usize) -> Result<(), WorkbookError> {
        let mut remaining = length;
        while remaining > 0 {
            let consumed = self.take_partial(remaining).len();
            if consumed == 0 {
                Err(Biff8Error::NotEnoughData(remaining))?;
            }
            remaining -= consumed;
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, WorkbookError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, WorkbookError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, WorkbookError> {
        let bytes = self.take(4)?;
        u32_at(bytes, 0).ok_or_else(|| Biff8Error::NotEnoughData(4).into())
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, WorkbookError> {
        let bytes = self.take(8)?;
        u64_at(bytes, 0).ok_or_else(|| Biff8Error::NotEnoughData(8).into())
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, WorkbookError> {
        self.read_u64().map(f64::from_bits)
    }

    /// Reads the last `u16` of the current record (MULRK stores its last column there)
    pub(crate) fn last_u16(&self) -> Result<u16, WorkbookError> {
        let (lower, upper) = match self.segments.last() {
            Some(segment) => *segment,
            None => Err(Biff8Error::NotEnoughData(2))?,
        };
        if upper < lower + 2 {
            Err(Biff8Error::NotEnoughData(2))?;
        }
        u16_at(&self.stream, upper - 2).ok_or_else(|| Biff8Error::NotEnoughData(2).into())
    }

    /// Decodes an RK value: a 30-bit integer or the high 30 bits of a double,
    /// optionally scaled by 1/100
    pub(crate) fn read_rk_number(&mut self) -> Result<f64, WorkbookError> {
        let raw = self.read_u32()?;
        let mut value = if raw & 0x02 != 0 {
            ((raw as i32) >> 2) as f64
        } else {
            f64::from_bits(((raw & 0xFFFF_FFFC) as u64) << 32)
        };
        if raw & 0x01 != 0 {
            value /= 100.0;
        }
        Ok(value)
    }

    /// Reads a ShortXLUnicodeString (8-bit character count)
    pub(crate) fn read_short_unicode_string(&mut self) -> Result<String, WorkbookError> {
        let chars = self.read_u8()? as usize;
        self.read_unicode_chars(chars, false)
    }

    /// Reads an XLUnicodeString (16-bit character count)
    pub(crate) fn read_unicode_string(&mut self) -> Result<String, WorkbookError> {
        let chars = self.read_u16()? as usize;
        self.read_unicode_chars(chars, false)
    }

    /// Reads an XLUnicodeRichExtendedString as stored in the SST
    pub(crate) fn read_rich_extended_string(&mut self) -> Result<String, WorkbookError> {
        let chars = self.read_u16()? as usize;
        self.read_unicode_chars(chars, true)
    }

    /// Reads `chars` characters; a string cut by a CONTINUE record resumes
    /// with a fresh option byte in the next segment
    fn read_unicode_chars(&mut self, chars: usize, is_extended: bool) -> Result<String, WorkbookError> {
        let mut text = String::new();
        let flags = self.read_u8()?;
        let runs = if is_extended && flags & 0x08 != 0 { self.read_u16()? as usize } else { 0 };
        let phonetic_size = if is_extended && flags & 0x04 != 0 { self.read_u32()? as usize } else { 0 };

        let mut remaining = chars;
        let mut is_wide = flags & 0x01 != 0;
        loop {
            let width = if is_wide { 2 } else { 1 };
            let encoding = self.encoding;
            let bytes = self.take_partial(remaining * width);
            let read = bytes.len() / width;
            if is_wide {
                let (decoded, _, _) = UTF_16LE.decode(bytes);
                text.push_str(&decoded);
            } else if encoding == UTF_16LE {
                // Compressed UTF-16: every byte is the low half of a code unit
                text.extend(bytes.iter().map(|byte| char::from(*byte)));
            } else {
                let (decoded, _, _) = encoding.decode(bytes);
                text.push_str(&decoded);
            }
            remaining -= read.min(remaining);
            if remaining == 0 {
                break;
            }
            if read == 0 && self.segment >= self.segments.len() {
                Err(Biff8Error::NotEnoughData(remaining * width))?;
            }
            if self.at_segment_end() {
                is_wide = self.read_u8()? & 0x01 != 0;
            }
        }

        self.skip(4 * runs)?;
        self.skip(phonetic_size)?;
        Ok(text)
    }

    fn at_segment_end(&mut self) -> bool {
        match self.segments.get(self.segment).copied() {
            Some((lower, upper)) if lower + self.offset >= upper => {
                self.segment += 1;
                self.offset = 0;
                self.segment < self.segments.len()
            }
            Some(_) => false,
            None => false,
        }
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}
