//! Raw event dump reader.
//!
//! A dump is a sequence of events, each a 64-bit little-endian header followed by
//! `count` 64-bit candidate words. Header layout:
//!
//! ```text
//! bits  0..8   candidate count
//! bits  8..12  must be zero
//! bits 12..24  bunch crossing (0..3563)
//! bits 24..56  orbit number
//! bits 56..61  run number
//! bit  61      error flag
//! bits 62..64  valid-header marker (0b10)
//! ```

use std::io::{ErrorKind, Read};
use w3pi_core::{Event, Result, W3piError, NPUPPI_MAX};

/// Decoded event header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventHeader {
    pub count: usize,
    pub must_be_zero: u8,
    pub bunch_crossing: u16,
    pub orbit: u32,
    pub run: u8,
    pub error: bool,
    pub valid: u8,
}

impl EventHeader {
    pub const VALID_MARKER: u8 = 0b10;

    pub fn decode(word: u64) -> Self {
        Self {
            count: (word & 0xFF) as usize,
            must_be_zero: ((word >> 8) & 0xF) as u8,
            bunch_crossing: ((word >> 12) & 0xFFF) as u16,
            orbit: ((word >> 24) & 0xFFFF_FFFF) as u32,
            run: ((word >> 56) & 0x1F) as u8,
            error: (word >> 61) & 1 == 1,
            valid: ((word >> 62) & 0x3) as u8,
        }
    }

    #[cfg(test)]
    pub fn encode(&self) -> u64 {
        (self.count as u64 & 0xFF)
            | ((self.must_be_zero as u64 & 0xF) << 8)
            | ((self.bunch_crossing as u64 & 0xFFF) << 12)
            | ((self.orbit as u64) << 24)
            | ((self.run as u64 & 0x1F) << 56)
            | ((self.error as u64) << 61)
            | ((self.valid as u64 & 0x3) << 62)
    }

    /// Header for a well-formed event with `count` candidates.
    #[cfg(test)]
    pub fn for_count(count: usize) -> Self {
        Self {
            count,
            valid: Self::VALID_MARKER,
            ..Default::default()
        }
    }
}

/// One event as read from a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Position in the dump, counting from 0
    pub index: usize,
    pub header: EventHeader,
    pub words: Vec<u64>,
}

impl RawEvent {
    pub fn to_event(&self) -> Result<Event> {
        Event::from_words(&self.words)
    }
}

/// Iterates over the events of a dump.
pub struct DumpReader<R> {
    reader: R,
    index: usize,
    failed: bool,
}

impl<R: Read> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            index: 0,
            failed: false,
        }
    }

    /// Reads one word; `None` on a clean end of stream.
    fn read_word(&mut self) -> Result<Option<u64>> {
        let mut buf = [0u8; 8];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            8 => Ok(Some(u64::from_le_bytes(buf))),
            n => Err(W3piError::framing(format!(
                "event {}: stream ends {} bytes into a word",
                self.index, n
            ))),
        }
    }

    fn read_event(&mut self) -> Result<Option<RawEvent>> {
        let Some(word) = self.read_word()? else {
            return Ok(None);
        };
        let header = EventHeader::decode(word);
        if header.count > NPUPPI_MAX {
            return Err(W3piError::framing(format!(
                "event {}: header announces {} candidates, at most {} fit",
                self.index, header.count, NPUPPI_MAX
            )));
        }
        if header.valid != EventHeader::VALID_MARKER || header.must_be_zero != 0 {
            log::warn!(
                "event {}: unexpected header marker {:#04b} / reserved bits {:#x}",
                self.index,
                header.valid,
                header.must_be_zero
            );
        }
        if header.error {
            log::warn!(
                "event {}: error flag set (orbit {}, run {})",
                self.index,
                header.orbit,
                header.run
            );
        }

        let mut words = Vec::with_capacity(header.count);
        for i in 0..header.count {
            match self.read_word()? {
                Some(word) => words.push(word),
                None => {
                    return Err(W3piError::framing(format!(
                        "event {}: payload truncated after {} of {} words",
                        self.index, i, header.count
                    )))
                }
            }
        }

        let event = RawEvent {
            index: self.index,
            header,
            words,
        };
        self.index += 1;
        Ok(Some(event))
    }
}

impl<R: Read> Iterator for DumpReader<R> {
    type Item = Result<RawEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_event().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

/// Append one event to a dump.
#[cfg(test)]
pub fn write_event<W: std::io::Write>(writer: &mut W, header: &EventHeader, words: &[u64]) -> Result<()> {
    if words.len() != header.count {
        return Err(W3piError::framing(format!(
            "header announces {} candidates, {} given",
            header.count,
            words.len()
        )));
    }
    writer.write_all(&header.encode().to_le_bytes())?;
    for word in words {
        writer.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}
