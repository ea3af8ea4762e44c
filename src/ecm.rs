//! ECM container stream decoder.
//!
//! Reads the `"ECM\0"`-prefixed record stream described in the crate's
//! design notes, rebuilding each stripped-down sector through
//! [`crate::sector`] and appending the result to an output [`Sink`] in
//! strict input order. The only state that survives across records is the
//! read cursor into `input` and whatever the sink has already accumulated;
//! everything else is local to a single record.

use std::io;

use log::trace;
use thiserror::Error;

use crate::msf::Msf;
use crate::sector::{self, SectorKind, SECTOR_SIZE};

/// Errors that can abort a decode.
#[derive(Error, Debug)]
pub enum EcmError {
    /// Input was shorter than the 4-byte `"ECM\0"` magic.
    #[error("truncated ECM header: input is shorter than 4 bytes")]
    TruncatedHeader,
    /// The first four bytes weren't `"ECM\0"`.
    #[error("bad ECM magic: expected \"ECM\\0\"")]
    BadMagic,
    /// `cancel` returned `true` at a record boundary.
    #[error("decode was canceled")]
    Canceled,
    /// The output sink rejected a write.
    #[error("failed to write decoded output: {0}")]
    WriteFailed(#[source] io::Error),
    /// Reading from the input source failed mid-decode.
    ///
    /// The in-memory `decode` entry point never produces this variant
    /// itself (its input is a plain byte slice); it exists for
    /// collaborators that wrap `decode` around a streaming reader.
    #[error("failed to read ECM input: {0}")]
    IoRead(#[source] io::Error),
}

/// Convenience alias for a decode result.
pub type EcmResult<T> = Result<T, EcmError>;

/// Destination for decoded bytes.
///
/// Blanket-implemented for anything that implements [`std::io::Write`],
/// which covers `Vec<u8>` (the common case for library callers) as well as
/// a `BufWriter` around a file for streaming output without buffering the
/// whole image.
pub trait Sink {
    /// Append `bytes` to the sink.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: io::Write> Sink for W {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }
}

const MAGIC: &[u8] = b"ECM\0";
const TERMINATOR: u64 = 0xFFFF_FFFF;

/// ECM decoder. Stateless beyond the shared, lazily-built codec tables, so
/// it's cheap to construct and safe to use from multiple threads at once
/// (each call to [`Decoder::decode`] owns its input and output exclusively
/// for the duration of that call; only the tables are shared).
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    _private: (),
}

impl Decoder {
    /// Create a decoder, forcing the codec tables to be built if they
    /// haven't been already.
    pub fn new() -> Decoder {
        crate::tables::ecc_f();
        crate::tables::ecc_b();
        crate::tables::edc_lut();
        Decoder { _private: () }
    }

    /// Decode an ECM stream, appending reconstructed bytes to `output`.
    ///
    /// `progress` is invoked once per completed record with the number of
    /// input bytes consumed so far and the total input length. `cancel` is
    /// consulted at the start of every record; once it returns `true` the
    /// decode stops with [`EcmError::Canceled`] without writing anything
    /// further for that record.
    ///
    /// Malformed bodies (a descriptor that claims more bytes than remain)
    /// are not treated as errors: decoding stops cleanly and whatever was
    /// already appended to `output` is kept, matching the tolerant
    /// behavior of reference decoders that treat the stream as
    /// self-delimiting.
    pub fn decode<S, P, C>(
        &self,
        input: &[u8],
        output: &mut S,
        mut progress: P,
        mut cancel: C,
    ) -> EcmResult<()>
    where
        S: Sink,
        P: FnMut(u64, u64),
        C: FnMut() -> bool,
    {
        let total_in = input.len() as u64;

        if input.len() < MAGIC.len() {
            return Err(EcmError::TruncatedHeader);
        }
        if &input[..MAGIC.len()] != MAGIC {
            return Err(EcmError::BadMagic);
        }

        let mut pos = MAGIC.len();
        trace!("ECM header ok, {total_in} bytes total");

        loop {
            if cancel() {
                return Err(EcmError::Canceled);
            }

            let Some(descriptor) = read_descriptor(input, &mut pos) else {
                // Ran out of input mid-descriptor: end of stream, not an error.
                break;
            };

            let Descriptor::Record { record_type, count } = descriptor else {
                trace!("terminator descriptor at offset {pos}");
                break;
            };

            match record_type {
                0 => {
                    let available = input.len() - pos;
                    let take = (count as usize).min(available);

                    output
                        .write_bytes(&input[pos..pos + take])
                        .map_err(EcmError::WriteFailed)?;
                    pos += take;

                    progress(pos as u64, total_in);

                    if (take as u64) < count {
                        break;
                    }
                }
                1..=3 => {
                    let kind = SectorKind::try_from(record_type)
                        .expect("record_type is masked into 1..=3 by read_descriptor");
                    let emit_range = match kind {
                        SectorKind::Mode1 => 0..SECTOR_SIZE,
                        SectorKind::Mode2Form1 | SectorKind::Mode2Form2 => 0x010..SECTOR_SIZE,
                    };

                    let mut ran_short = false;
                    for _ in 0..count {
                        match read_sector(kind, input, &mut pos) {
                            Some(sector) => {
                                output
                                    .write_bytes(&sector[emit_range.clone()])
                                    .map_err(EcmError::WriteFailed)?;
                            }
                            None => {
                                ran_short = true;
                                break;
                            }
                        }
                    }

                    progress(pos as u64, total_in);

                    if ran_short {
                        break;
                    }
                }
                _ => unreachable!("record_type is masked to 2 bits by read_descriptor"),
            }
        }

        Ok(())
    }
}

enum Descriptor {
    Record { record_type: u8, count: u64 },
    Terminator,
}

/// Decode one variable-length record descriptor starting at `*pos`,
/// advancing `*pos` past it. Returns `None` if the input ends before a
/// full descriptor could be read.
fn read_descriptor(input: &[u8], pos: &mut usize) -> Option<Descriptor> {
    let c0 = *input.get(*pos)?;
    *pos += 1;

    let record_type = c0 & 0b11;
    let mut num: u64 = u64::from((c0 >> 2) & 0x1F);
    let mut bits: u32 = 5;
    let mut more = c0 & 0x80 != 0;

    while more {
        let c = *input.get(*pos)?;
        *pos += 1;

        // A pathological stream with dozens of continuation bytes could
        // otherwise overflow the shift; real descriptors need at most a
        // handful to express a 32-bit count.
        if bits < 63 {
            num |= u64::from(c & 0x7F) << bits;
        }
        bits += 7;
        more = c & 0x80 != 0;
    }

    if num == TERMINATOR {
        return Some(Descriptor::Terminator);
    }

    Some(Descriptor::Record {
        record_type,
        count: num + 1,
    })
}

/// Read one sector's payload out of `input` at `*pos` and reconstruct the
/// full 2352-byte sector, including its EDC/ECC. Returns `None` without
/// consuming any input if fewer payload bytes remain than the sector type
/// requires.
fn read_sector(kind: SectorKind, input: &[u8], pos: &mut usize) -> Option<[u8; SECTOR_SIZE]> {
    let mut sector = [0u8; SECTOR_SIZE];
    sector::write_sync(&mut sector);
    sector[0x00F] = kind.mode_byte();

    match kind {
        SectorKind::Mode1 => {
            let needed = 3 + 2048;
            if input.len() - *pos < needed {
                return None;
            }
            sector[0x00C..0x00F].copy_from_slice(&input[*pos..*pos + 3]);
            *pos += 3;
            sector[0x010..0x810].copy_from_slice(&input[*pos..*pos + 2048]);
            *pos += 2048;
        }
        SectorKind::Mode2Form1 => {
            let needed = 0x804;
            if input.len() - *pos < needed {
                return None;
            }
            sector[0x014..0x014 + needed].copy_from_slice(&input[*pos..*pos + needed]);
            *pos += needed;
        }
        SectorKind::Mode2Form2 => {
            let needed = 0x918;
            if input.len() - *pos < needed {
                return None;
            }
            sector[0x014..0x014 + needed].copy_from_slice(&input[*pos..*pos + needed]);
            *pos += needed;
        }
    }

    sector::eccedc_generate(&mut sector, kind);

    match Msf::from_sector_address([sector[0x00C], sector[0x00D], sector[0x00E]]) {
        Some(msf) => trace!("reconstructed {kind:?} sector at {msf}"),
        None => trace!(
            "reconstructed {kind:?} sector (non-BCD address {:02X}{:02X}{:02X})",
            sector[0x00C],
            sector[0x00D],
            sector[0x00E]
        ),
    }

    Some(sector)
}
