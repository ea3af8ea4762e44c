//! Lookup tables used by the sector codec.
//!
//! Two 256-entry tables over GF(2^8) under the CIRC field polynomial 0x11D
//! drive the P/Q ECC computation, and a 256-entry CRC table drives the EDC
//! checksum. All three are pure functions of their index and are built once
//! and cached, since building them touches every one of the 256 entries
//! with a short loop and there is no reason to repeat that for every sector.

use std::sync::OnceLock;

/// GF(2^8) multiplication-by-alpha table under the CIRC field polynomial 0x11D.
pub type EccTable = [u8; 256];
/// CRC-32 lookup table for the EDC polynomial 0xD8018001.
pub type EdcTable = [u32; 256];

static ECC_F: OnceLock<EccTable> = OnceLock::new();
static ECC_B: OnceLock<EccTable> = OnceLock::new();
static EDC_LUT: OnceLock<EdcTable> = OnceLock::new();

fn build_ecc_f() -> EccTable {
    let mut table = [0u8; 256];

    for (i, entry) in table.iter_mut().enumerate() {
        let i = i as u8;
        let mut v = (i as u32) << 1;

        if i & 0x80 != 0 {
            v ^= 0x11D;
        }

        *entry = v as u8;
    }

    table
}

fn build_ecc_b(ecc_f: &EccTable) -> EccTable {
    let mut table = [0u8; 256];

    for i in 0..=255u8 {
        table[(ecc_f[i as usize] ^ i) as usize] = i;
    }

    table
}

fn build_edc_lut() -> EdcTable {
    let mut table = [0u32; 256];

    for (i, entry) in table.iter_mut().enumerate() {
        let mut v = i as u32;

        for _ in 0..8 {
            v = (v >> 1) ^ if v & 1 != 0 { 0xD801_8001 } else { 0 };
        }

        *entry = v;
    }

    table
}

/// Multiplication-by-alpha table (`ECC_F[i] = i * alpha` in GF(2^8)).
pub fn ecc_f() -> &'static EccTable {
    ECC_F.get_or_init(build_ecc_f)
}

/// Inverse of [`ecc_f`]: `ECC_B[ECC_F[i] ^ i] == i`.
pub fn ecc_b() -> &'static EccTable {
    ECC_B.get_or_init(|| build_ecc_b(ecc_f()))
}

/// CRC-32 (EDC) lookup table for polynomial 0xD8018001.
pub fn edc_lut() -> &'static EdcTable {
    EDC_LUT.get_or_init(build_edc_lut)
}
