//! Integer ALU operations with condition code computation.
//!
//! Every function takes the current SR and returns the result together with
//! the updated SR, so callers can commit both at once.

use crate::flags::{C, N, V, X, Z};

/// Operation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Size {
    /// 8-bit byte.
    Byte,
    /// 16-bit word.
    Word,
    /// 32-bit long.
    Long,
}

impl Size {
    /// Standard 2-bit size field (00=byte, 01=word, 10=long).
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits & 0x03 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// MOVE size field (01=byte, 11=word, 10=long).
    #[must_use]
    pub const fn from_move_bits(bits: u16) -> Option<Self> {
        match bits & 0x03 {
            1 => Some(Self::Byte),
            3 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// CAS/CHK2 size field (01=byte, 10=word, 11=long).
    #[must_use]
    pub const fn from_cas_bits(bits: u16) -> Option<Self> {
        match bits & 0x03 {
            1 => Some(Self::Byte),
            2 => Some(Self::Word),
            3 => Some(Self::Long),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    #[must_use]
    pub const fn msb_mask(self) -> u32 {
        match self {
            Self::Byte => 0x80,
            Self::Word => 0x8000,
            Self::Long => 0x8000_0000,
        }
    }

    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Long => 0xFFFF_FFFF,
        }
    }

    /// Sign-extend the low `self` bits of `value` to 32 bits.
    #[must_use]
    pub const fn sign_extend(self, value: u32) -> u32 {
        match self {
            Self::Byte => value as u8 as i8 as i32 as u32,
            Self::Word => value as u16 as i16 as i32 as u32,
            Self::Long => value,
        }
    }
}

/// N and Z from a sized result, leaving the other bits of `sr` alone.
#[must_use]
pub fn nz(result: u32, size: Size, sr: u16) -> u16 {
    let mut flags = sr & !(N | Z);
    if result & size.mask() == 0 {
        flags |= Z;
    }
    if result & size.msb_mask() != 0 {
        flags |= N;
    }
    flags
}

/// Flags for MOVE and the logical operations: N, Z from the result, V and C
/// cleared, X untouched.
#[must_use]
pub fn logic(result: u32, size: Size, sr: u16) -> u16 {
    nz(result, size, sr) & !(V | C)
}

/// ADD: `dst + src`. Returns (result, sr).
#[must_use]
pub fn add(src: u32, dst: u32, size: Size, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb_mask();
    let s = src & mask;
    let d = dst & mask;
    let result = s.wrapping_add(d) & mask;

    let mut flags = nz(result, size, sr) & !(C | V | X);
    let carry = (s & d) | (!result & (s | d));
    if carry & msb != 0 {
        flags |= C | X;
    }
    let overflow = (s ^ result) & (d ^ result);
    if overflow & msb != 0 {
        flags |= V;
    }
    (result, flags)
}

/// SUB: `dst - src`. Returns (result, sr).
#[must_use]
pub fn sub(src: u32, dst: u32, size: Size, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb_mask();
    let s = src & mask;
    let d = dst & mask;
    let result = d.wrapping_sub(s) & mask;

    let mut flags = nz(result, size, sr) & !(C | V | X);
    let borrow = (s & !d) | (result & !d) | (s & result);
    if borrow & msb != 0 {
        flags |= C | X;
    }
    let overflow = (s ^ d) & (result ^ d);
    if overflow & msb != 0 {
        flags |= V;
    }
    (result, flags)
}

/// CMP: flags of `dst - src`, X untouched.
#[must_use]
pub fn cmp(src: u32, dst: u32, size: Size, sr: u16) -> u16 {
    let (_, flags) = sub(src, dst, size, sr);
    (flags & !X) | (sr & X)
}

/// ADDX: `dst + src + X`. Z is only ever cleared.
#[must_use]
pub fn addx(src: u32, dst: u32, size: Size, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb_mask();
    let x_in = u32::from(sr & X != 0);
    let s = src & mask;
    let d = dst & mask;
    let result = s.wrapping_add(d).wrapping_add(x_in) & mask;

    let mut flags = sr & !(C | V | N | X);
    if result != 0 {
        flags &= !Z;
    }
    if result & msb != 0 {
        flags |= N;
    }
    let carry = (s & d) | (!result & (s | d));
    if carry & msb != 0 {
        flags |= C | X;
    }
    let overflow = (s ^ result) & (d ^ result);
    if overflow & msb != 0 {
        flags |= V;
    }
    (result, flags)
}

/// SUBX: `dst - src - X`. Z is only ever cleared.
#[must_use]
pub fn subx(src: u32, dst: u32, size: Size, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb_mask();
    let x_in = u32::from(sr & X != 0);
    let s = src & mask;
    let d = dst & mask;
    let result = d.wrapping_sub(s).wrapping_sub(x_in) & mask;

    let mut flags = sr & !(C | V | N | X);
    if result != 0 {
        flags &= !Z;
    }
    if result & msb != 0 {
        flags |= N;
    }
    let borrow = (s & !d) | (result & !d) | (s & result);
    if borrow & msb != 0 {
        flags |= C | X;
    }
    let overflow = (s ^ d) & (result ^ d);
    if overflow & msb != 0 {
        flags |= V;
    }
    (result, flags)
}

/// NEG: `0 - dst`.
#[must_use]
pub fn neg(dst: u32, size: Size, sr: u16) -> (u32, u16) {
    sub(dst, 0, size, sr)
}

/// NEGX: `0 - dst - X`.
#[must_use]
pub fn negx(dst: u32, size: Size, sr: u16) -> (u32, u16) {
    subx(dst, 0, size, sr)
}

/// BCD addition `dst + src + extend`. Returns (result, carry, overflow).
#[must_use]
pub fn bcd_add(src: u8, dst: u8, extend: u8) -> (u8, bool, bool) {
    let low_sum = (dst & 0x0F) + (src & 0x0F) + extend;
    let corf: u16 = if low_sum > 9 { 6 } else { 0 };
    let uncorrected = u16::from(dst) + u16::from(src) + u16::from(extend);

    let low_carry = (low_sum + if low_sum > 9 { 6 } else { 0 }) >> 4;
    let carry = (dst >> 4) + (src >> 4) + low_carry > 9;

    let result = if carry { uncorrected + corf + 0x60 } else { uncorrected + corf };
    // V is undefined; the silicon sets it when correction flips bit 7 on.
    let overflow = (!uncorrected & result & 0x80) != 0;
    (result as u8, carry, overflow)
}

/// BCD subtraction `dst - src - extend`. Returns (result, borrow, overflow).
#[must_use]
pub fn bcd_sub(src: u8, dst: u8, extend: u8) -> (u8, bool, bool) {
    let uncorrected = dst.wrapping_sub(src).wrapping_sub(extend);
    let mut result = uncorrected;

    let low_borrowed = (dst & 0x0F) < (src & 0x0F).saturating_add(extend);
    if low_borrowed {
        result = result.wrapping_sub(6);
    }
    let high_borrowed = (dst >> 4) < (src >> 4) + u8::from(low_borrowed);
    if high_borrowed {
        result = result.wrapping_sub(0x60);
    }

    let borrow = high_borrowed || (low_borrowed && uncorrected < 6);
    let overflow = (uncorrected & !result & 0x80) != 0;
    (result, borrow, overflow)
}

/// Fold a BCD result into SR: C and X from the carry, Z only cleared.
#[must_use]
pub fn bcd_flags(result: u8, carry: bool, overflow: bool, sr: u16) -> u16 {
    let mut flags = sr & !(C | X | N | V);
    if carry {
        flags |= C | X;
    }
    if overflow {
        flags |= V;
    }
    if result & 0x80 != 0 {
        flags |= N;
    }
    if result != 0 {
        flags &= !Z;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_carry_and_overflow_at_each_width() {
        // 0x7F + 1: signed overflow without carry.
        let (r, sr) = add(1, 0x7F, Size::Byte, 0);
        assert_eq!(r, 0x80);
        assert_eq!(sr & (N | V | C | X | Z), N | V);

        // 0xFF + 1: carry and zero without overflow.
        let (r, sr) = add(1, 0xFF, Size::Byte, 0);
        assert_eq!(r, 0);
        assert_eq!(sr & (N | V | C | X | Z), Z | C | X);

        let (r, sr) = add(1, 0x7FFF, Size::Word, 0);
        assert_eq!(r, 0x8000);
        assert_eq!(sr & (N | V | C), N | V);

        let (r, sr) = add(0x8000_0000, 0x8000_0000, Size::Long, 0);
        assert_eq!(r, 0);
        assert_eq!(sr & (N | V | C | X | Z), Z | V | C | X);

        // Upper bits outside the operand size are ignored.
        let (r, sr) = add(0x1_0001, 0xFFFF, Size::Word, 0);
        assert_eq!(r, 0);
        assert_eq!(sr & (C | Z), C | Z);
    }

    #[test]
    fn sub_borrow() {
        let (r, sr) = sub(1, 0, Size::Long, 0);
        assert_eq!(r, 0xFFFF_FFFF);
        assert_eq!(sr & (N | C | X | V), N | C | X);

        let (r, sr) = sub(1, 0x80, Size::Byte, 0);
        assert_eq!(r, 0x7F);
        assert_eq!(sr & (N | C | V), V);
    }

    #[test]
    fn cmp_preserves_extend() {
        assert_eq!(cmp(1, 0, Size::Byte, X) & X, X);
        assert_eq!(cmp(0, 1, Size::Byte, 0) & (X | C), 0);
    }

    #[test]
    fn addx_keeps_z_across_words() {
        let (r, sr) = addx(0, 0, Size::Long, Z | X);
        assert_eq!(r, 1);
        assert_eq!(sr & Z, 0);
        let (r, sr) = addx(0, 0, Size::Long, Z);
        assert_eq!(r, 0);
        assert_eq!(sr & Z, Z);
    }

    #[test]
    fn bcd_arithmetic() {
        assert_eq!(bcd_add(0x45, 0x38, 0), (0x83, false, true));
        assert_eq!(bcd_add(0x99, 0x01, 0).0, 0x00);
        assert!(bcd_add(0x99, 0x01, 0).1);
        assert_eq!(bcd_sub(0x01, 0x10, 0).0, 0x09);
        assert_eq!(bcd_sub(0x01, 0x00, 0), (0x99, true, false));
    }

    #[test]
    fn sign_extension() {
        assert_eq!(Size::Byte.sign_extend(0x80), 0xFFFF_FF80);
        assert_eq!(Size::Word.sign_extend(0x1_7FFF), 0x7FFF);
    }
}
