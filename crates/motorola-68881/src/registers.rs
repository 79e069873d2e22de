//! FPCR and FPSR bit layout.

/// FPCR rounding-mode field (bits 5-4).
pub const FPCR_MODE_SHIFT: u32 = 4;
/// FPCR rounding-precision field (bits 7-6).
pub const FPCR_PREC_SHIFT: u32 = 6;
/// Writable FPCR bits: exception enables plus mode control.
pub const FPCR_MASK: u32 = 0x0000_FFF0;

/// FPSR condition code byte.
pub const FPSR_CC_N: u32 = 1 << 27;
pub const FPSR_CC_Z: u32 = 1 << 26;
pub const FPSR_CC_I: u32 = 1 << 25;
pub const FPSR_CC_NAN: u32 = 1 << 24;
pub const FPSR_CC_MASK: u32 = 0x0F00_0000;

/// FPSR quotient byte (FMOD/FREM): sign in bit 23, seven low bits below.
pub const FPSR_QUOTIENT_MASK: u32 = 0x00FF_0000;

/// FPSR exception status byte, cleared at the start of each arithmetic
/// instruction.
pub const EXC_BSUN: u32 = 1 << 15;
pub const EXC_SNAN: u32 = 1 << 14;
pub const EXC_OPERR: u32 = 1 << 13;
pub const EXC_OVFL: u32 = 1 << 12;
pub const EXC_UNFL: u32 = 1 << 11;
pub const EXC_DZ: u32 = 1 << 10;
pub const EXC_INEX2: u32 = 1 << 9;
pub const EXC_INEX1: u32 = 1 << 8;
pub const EXC_MASK: u32 = 0x0000_FF00;

/// FPSR accrued exception byte, sticky until software clears it.
pub const ACC_IOP: u32 = 1 << 7;
pub const ACC_OVFL: u32 = 1 << 6;
pub const ACC_UNFL: u32 = 1 << 5;
pub const ACC_DZ: u32 = 1 << 4;
pub const ACC_INEX: u32 = 1 << 3;

/// Writable FPSR bits.
pub const FPSR_MASK: u32 = 0x0FFF_FFF8;

/// Fold an exception status byte into the accrued byte.
#[must_use]
pub const fn accrue(exc: u32) -> u32 {
    let mut acc = 0;
    if exc & (EXC_BSUN | EXC_SNAN | EXC_OPERR) != 0 {
        acc |= ACC_IOP;
    }
    if exc & EXC_OVFL != 0 {
        acc |= ACC_OVFL;
    }
    if exc & EXC_UNFL != 0 && exc & EXC_INEX2 != 0 {
        acc |= ACC_UNFL;
    }
    if exc & EXC_DZ != 0 {
        acc |= ACC_DZ;
    }
    if exc & (EXC_OVFL | EXC_INEX2 | EXC_INEX1) != 0 {
        acc |= ACC_INEX;
    }
    acc
}

/// FMOVEM control register select bits (command word bits 12-10).
pub const CTRL_FPCR: u16 = 0b100;
pub const CTRL_FPSR: u16 = 0b010;
pub const CTRL_FPIAR: u16 = 0b001;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrued_byte_follows_motorola_rules() {
        assert_eq!(accrue(EXC_SNAN), ACC_IOP);
        assert_eq!(accrue(EXC_OPERR | EXC_BSUN), ACC_IOP);
        assert_eq!(accrue(EXC_OVFL), ACC_OVFL | ACC_INEX);
        // Underflow only accrues when the result is also inexact.
        assert_eq!(accrue(EXC_UNFL), 0);
        assert_eq!(accrue(EXC_UNFL | EXC_INEX2), ACC_UNFL | ACC_INEX);
        assert_eq!(accrue(EXC_DZ), ACC_DZ);
        assert_eq!(accrue(EXC_INEX1), ACC_INEX);
    }
}
