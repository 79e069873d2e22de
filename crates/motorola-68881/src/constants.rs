//! FMOVECR on-chip constant ROM.

use softfloat::FloatX80;

/// `(offset, value, inexact)`. `inexact` marks constants whose stored
/// 64-bit significand is itself rounded.
const ROM: &[(u8, FloatX80, bool)] = &[
    (0x00, FloatX80::new(0x4000, 0xC90F_DAA2_2168_C235), true), // pi
    (0x0B, FloatX80::new(0x3FFD, 0x9A20_9A84_FBCF_F798), true), // log10(2)
    (0x0C, FloatX80::new(0x4000, 0xADF8_5458_A2BB_4A9A), true), // e
    (0x0D, FloatX80::new(0x3FFF, 0xB8AA_3B29_5C17_F0BC), true), // log2(e)
    (0x0E, FloatX80::new(0x3FFD, 0xDE5B_D8A9_3728_7195), true), // log10(e)
    (0x0F, FloatX80::new(0x0000, 0x0000_0000_0000_0000), false), // 0.0
    (0x30, FloatX80::new(0x3FFE, 0xB172_17F7_D1CF_79AC), true), // ln(2)
    (0x31, FloatX80::new(0x4000, 0x935D_8DDD_AAA8_AC17), true), // ln(10)
    (0x32, FloatX80::new(0x3FFF, 0x8000_0000_0000_0000), false), // 10^0
    (0x33, FloatX80::new(0x4002, 0xA000_0000_0000_0000), false), // 10^1
    (0x34, FloatX80::new(0x4005, 0xC800_0000_0000_0000), false), // 10^2
    (0x35, FloatX80::new(0x400C, 0x9C40_0000_0000_0000), false), // 10^4
    (0x36, FloatX80::new(0x4019, 0xBEBC_2000_0000_0000), false), // 10^8
    (0x37, FloatX80::new(0x4034, 0x8E1B_C9BF_0400_0000), false), // 10^16
    (0x38, FloatX80::new(0x4069, 0x9DC5_ADA8_2B70_B59E), true), // 10^32
    (0x39, FloatX80::new(0x40D3, 0xC278_1F49_FFCF_A6D5), true), // 10^64
    (0x3A, FloatX80::new(0x41A8, 0x93BA_47C9_80E9_8CE0), true), // 10^128
    (0x3B, FloatX80::new(0x4351, 0xAA7E_EBFB_9DF9_DE8E), true), // 10^256
    (0x3C, FloatX80::new(0x46A3, 0xE319_A0AE_A60E_91C7), true), // 10^512
    (0x3D, FloatX80::new(0x4D48, 0xC976_7586_8175_0C17), true), // 10^1024
    (0x3E, FloatX80::new(0x5A92, 0x9E8B_3B5D_C53D_5DE5), true), // 10^2048
    (0x3F, FloatX80::new(0x7525, 0xC460_5202_8A20_979B), true), // 10^4096
];

/// Look up a ROM offset (0x00-0x7F). Undefined offsets read as +0.0.
///
/// Returns the constant and whether it is an inexact approximation.
#[must_use]
pub fn lookup(offset: u8) -> (FloatX80, bool) {
    ROM.iter()
        .find(|&&(off, _, _)| off == offset)
        .map_or((FloatX80::zero(false), false), |&(_, value, inexact)| (value, inexact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_and_powers_of_ten() {
        let (pi, inexact) = lookup(0x00);
        assert!((pi.to_f64() - std::f64::consts::PI).abs() < 1e-15);
        assert!(inexact);
        assert_eq!(lookup(0x33).0.to_f64(), 10.0);
        assert_eq!(lookup(0x37).0.to_f64(), 1e16);
        assert!((lookup(0x39).0.to_f64() / 1e64 - 1.0).abs() < 1e-15);
    }

    #[test]
    fn undefined_offsets_read_zero() {
        assert_eq!(lookup(0x10), (FloatX80::zero(false), false));
        assert_eq!(lookup(0x7F), (FloatX80::zero(false), false));
    }
}
