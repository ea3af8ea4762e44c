//! CD-ROM sector codec: EDC/ECC regeneration.
//!
//! Given a 2352-byte sector buffer whose payload region has already been
//! filled in, [`eccedc_generate`] writes the EDC checksum and, for sector
//! types that carry one, the P/Q ECC parity block at the fixed offsets a
//! real CD-ROM drive expects. This is the part of the decoder that must
//! match a reference encoder bit-for-bit: a single wrong byte here
//! produces an image that looks structurally fine but fails strict
//! verification.

use crate::tables;

/// Size in bytes of a raw CD-ROM sector (sync + header + payload + EDC/ECC).
pub const SECTOR_SIZE: usize = 2352;

/// Which of the three sector layouts this spec covers is being reconstructed.
///
/// This mirrors the `type` field of an ECM record descriptor (1, 2 or 3);
/// type 0 (raw passthrough) never reaches the sector codec and has no
/// `SectorKind` of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorKind {
    /// CD-ROM Mode 1: 2048 bytes of user data, EDC and full P/Q ECC.
    Mode1,
    /// CD-ROM XA Mode 2 Form 1: 2048 bytes of user data, EDC and full P/Q ECC.
    Mode2Form1,
    /// CD-ROM XA Mode 2 Form 2: 2324 bytes of user data, EDC only, no ECC.
    Mode2Form2,
}

impl SectorKind {
    /// The mode byte (offset 0x00F of the sector header) for this kind.
    pub fn mode_byte(self) -> u8 {
        match self {
            SectorKind::Mode1 => 1,
            SectorKind::Mode2Form1 | SectorKind::Mode2Form2 => 2,
        }
    }
}

impl TryFrom<u8> for SectorKind {
    type Error = ();

    fn try_from(record_type: u8) -> Result<Self, ()> {
        match record_type {
            1 => Ok(SectorKind::Mode1),
            2 => Ok(SectorKind::Mode2Form1),
            3 => Ok(SectorKind::Mode2Form2),
            _ => Err(()),
        }
    }
}

/// Write the 12-byte CD-ROM sync pattern (`0x00, 0xFF * 10, 0x00`) at the
/// start of a sector buffer.
pub fn write_sync(sector: &mut [u8; SECTOR_SIZE]) {
    sector[0] = 0x00;
    sector[1..11].fill(0xFF);
    sector[11] = 0x00;
}

/// Compute the EDC (CRC-32 variant, polynomial 0xD8018001) over `src`.
pub fn edc(src: &[u8]) -> u32 {
    let table = tables::edc_lut();
    let mut edc: u32 = 0;

    for &byte in src {
        edc = (edc >> 8) ^ table[((edc ^ u32::from(byte)) & 0xFF) as usize];
    }

    edc
}

/// One interleaved P/Q parity pass over `src`, per the CIRC interleave
/// pattern described by `(major_count, minor_count, major_mult, minor_inc)`.
/// Writes `2 * major_count` bytes to `dest`.
fn ecc_compute(
    src: &[u8],
    dest: &mut [u8],
    major_count: usize,
    minor_count: usize,
    major_mult: usize,
    minor_inc: usize,
) {
    let f = tables::ecc_f();
    let b = tables::ecc_b();
    let size = major_count * minor_count;

    for major in 0..major_count {
        let mut index = (major >> 1) * major_mult + (major & 1);
        let mut ecc_a: u8 = 0;
        let mut ecc_b: u8 = 0;

        for _ in 0..minor_count {
            let t = src[index];
            index += minor_inc;
            if index >= size {
                index -= size;
            }

            ecc_a ^= t;
            ecc_b ^= t;
            ecc_a = f[ecc_a as usize];
        }

        let t_a = f[ecc_a as usize];
        ecc_a = b[(t_a ^ ecc_b) as usize];

        dest[major] = ecc_a;
        dest[major + major_count] = ecc_a ^ ecc_b;
    }
}

/// Byte range of the ECC source region: address + mode + payload + EDC +
/// zero-pad, i.e. everything from the header onward except the sync bytes.
const ECC_SOURCE_START: usize = 0x00C;
const ECC_SOURCE_END: usize = 0x930;
const P_PARITY_START: usize = 0x81C;
const Q_PARITY_START: usize = 0x8C8;

/// Regenerate the P and Q parity blocks for a sector already holding its
/// address, mode, payload, EDC and zero-pad bytes.
///
/// If `zero_address` is set, the 4 address+mode bytes at 0x00C-0x00F are
/// temporarily zeroed for the duration of the computation and restored
/// afterwards, matching how Mode 2 sectors were originally encoded.
pub fn ecc_generate(sector: &mut [u8; SECTOR_SIZE], zero_address: bool) {
    let saved_address = zero_address.then(|| {
        let saved = *array_ref![sector, ECC_SOURCE_START, 4];
        sector[ECC_SOURCE_START..ECC_SOURCE_START + 4].fill(0);
        saved
    });

    // The Q pass's diagonals run over the P-parity bytes too (its source
    // size, 52*43 = 2236, extends 172 bytes past where P's stops), so P
    // must be written into the sector before Q is computed. Each pass's
    // own destination is a local array, not the sector, so reading the
    // sector directly as that pass's source is safe.
    let mut p = [0u8; 172];
    ecc_compute(&sector[ECC_SOURCE_START..ECC_SOURCE_END], &mut p, 86, 24, 2, 86);
    sector[P_PARITY_START..P_PARITY_START + 172].copy_from_slice(&p);

    let mut q = [0u8; 104];
    ecc_compute(&sector[ECC_SOURCE_START..ECC_SOURCE_END], &mut q, 52, 43, 86, 88);
    sector[Q_PARITY_START..Q_PARITY_START + 104].copy_from_slice(&q);

    if let Some(saved) = saved_address {
        sector[ECC_SOURCE_START..ECC_SOURCE_START + 4].copy_from_slice(&saved);
    }
}

/// Regenerate EDC (and, for types that carry one, ECC) for a sector whose
/// address, mode and payload bytes have already been filled in.
pub fn eccedc_generate(sector: &mut [u8; SECTOR_SIZE], kind: SectorKind) {
    match kind {
        SectorKind::Mode1 => {
            let checksum = edc(&sector[0..0x810]);
            sector[0x810..0x814].copy_from_slice(&checksum.to_le_bytes());
            sector[0x814..0x81C].fill(0);
            ecc_generate(sector, false);
        }
        SectorKind::Mode2Form1 => {
            let checksum = edc(&sector[0x010..0x010 + 0x808]);
            sector[0x818..0x81C].copy_from_slice(&checksum.to_le_bytes());
            ecc_generate(sector, true);
        }
        SectorKind::Mode2Form2 => {
            let checksum = edc(&sector[0x010..0x010 + 0x91C]);
            sector[0x92C..0x930].copy_from_slice(&checksum.to_le_bytes());
        }
    }
}
