//! Wide-integer helpers shared by every format.
//!
//! Significands are carried in a `u128` with the leading one at bit 126.
//! Bit 127 is headroom for an addition carry; bits below the target
//! precision are guard bits, and bit 0 doubles as a sticky bit once
//! anything has been shifted out ("jamming").

use crate::status::RoundingMode;

/// Position of the leading one in a normalised working significand.
pub(crate) const LEAD: u32 = 126;

/// Shift right, OR-ing every bit shifted out into bit 0.
#[must_use]
pub(crate) fn shift_right_jam(x: u128, n: u32) -> u128 {
    if n == 0 {
        x
    } else if n >= 128 {
        u128::from(x != 0)
    } else {
        (x >> n) | u128::from(x << (128 - n) != 0)
    }
}

/// Full 128x128 -> 256-bit product, returned as `(high, low)`.
#[must_use]
pub(crate) fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    const M64: u128 = 0xFFFF_FFFF_FFFF_FFFF;
    let (a1, a0) = (a >> 64, a & M64);
    let (b1, b0) = (b >> 64, b & M64);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let mid = (p00 >> 64) + (p01 & M64) + (p10 & M64);
    let low = (p00 & M64) | (mid << 64);
    let high = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (high, low)
}

/// Shift a 256-bit value right by `n` (1..128) with jamming. The caller
/// guarantees the result fits in 128 bits.
#[must_use]
pub(crate) fn shift_right_jam_wide(high: u128, low: u128, n: u32) -> u128 {
    debug_assert!((1..128).contains(&n));
    debug_assert!(high >> n == 0);
    let sticky = low << (128 - n) != 0;
    (high << (128 - n)) | (low >> n) | u128::from(sticky)
}

/// Normalise a non-zero significand so its leading one sits at `LEAD`.
///
/// Returns the shifted significand and the exponent adjustment to add.
#[must_use]
pub(crate) fn normalize(sig: u128) -> (u128, i32) {
    debug_assert!(sig != 0);
    let lz = sig.leading_zeros();
    if lz == 0 {
        (shift_right_jam(sig, 1), 1)
    } else {
        let shift = lz - 1;
        (sig << shift, -(shift as i32))
    }
}

/// Drop the low `shift` bits of `sig`, rounding in `mode`.
///
/// Returns the rounded (shifted) value and whether any non-zero bit was
/// discarded. `shift` may exceed 127, in which case everything is lost.
#[must_use]
pub(crate) fn round_bits(sig: u128, shift: u32, sign: bool, mode: RoundingMode) -> (u128, bool) {
    if shift == 0 {
        return (sig, false);
    }

    let (kept, lost_nonzero, half_cmp) = if shift >= 128 {
        // Everything lost. Only a shift of exactly 128 can reach the half.
        let cmp = if shift == 128 {
            sig.cmp(&(1u128 << 127))
        } else {
            std::cmp::Ordering::Less
        };
        (0u128, sig != 0, cmp)
    } else {
        let lost = sig & ((1u128 << shift) - 1);
        let half = 1u128 << (shift - 1);
        (sig >> shift, lost != 0, lost.cmp(&half))
    };

    if !lost_nonzero {
        return (kept, false);
    }

    let increment = match mode {
        RoundingMode::NearestEven => match half_cmp {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => kept & 1 == 1,
            std::cmp::Ordering::Less => false,
        },
        RoundingMode::ToZero => false,
        RoundingMode::Up => !sign,
        RoundingMode::Down => sign,
    };
    (kept + u128::from(increment), true)
}

/// The two bits starting at even position `index` of a 256-bit value.
#[must_use]
pub(crate) fn bit_pair_wide(high: u128, low: u128, index: u32) -> u128 {
    debug_assert!(index % 2 == 0);
    if index >= 128 {
        (high >> (index - 128)) & 3
    } else {
        (low >> index) & 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jamming_keeps_lost_bits_sticky() {
        assert_eq!(shift_right_jam(0b1000, 3), 0b1);
        assert_eq!(shift_right_jam(0b1001, 3), 0b1);
        assert_eq!(shift_right_jam(0b1_0001, 3), 0b11);
        assert_eq!(shift_right_jam(5, 200), 1);
        assert_eq!(shift_right_jam(0, 200), 0);
    }

    #[test]
    fn wide_multiply_matches_u128_for_small_operands() {
        let (h, l) = mul_wide(0xFFFF_FFFF_FFFF_FFFF, 0xFFFF_FFFF_FFFF_FFFF);
        assert_eq!(h, 0);
        assert_eq!(l, 0xFFFF_FFFF_FFFF_FFFE_0000_0000_0000_0001);

        let (h, l) = mul_wide(1u128 << 127, 4);
        assert_eq!(h, 2);
        assert_eq!(l, 0);
    }

    #[test]
    fn nearest_even_breaks_ties_to_even() {
        // 0b10.1 -> 0b10, 0b11.1 -> 0b100
        assert_eq!(round_bits(0b101, 1, false, RoundingMode::NearestEven), (0b10, true));
        assert_eq!(round_bits(0b111, 1, false, RoundingMode::NearestEven), (0b100, true));
        assert_eq!(round_bits(0b1011, 2, false, RoundingMode::NearestEven), (0b11, true));
    }

    #[test]
    fn directed_modes_depend_on_sign() {
        assert_eq!(round_bits(0b101, 1, false, RoundingMode::Up), (0b11, true));
        assert_eq!(round_bits(0b101, 1, true, RoundingMode::Up), (0b10, true));
        assert_eq!(round_bits(0b101, 1, true, RoundingMode::Down), (0b11, true));
        assert_eq!(round_bits(0b101, 1, false, RoundingMode::ToZero), (0b10, true));
        assert_eq!(round_bits(0b100, 1, false, RoundingMode::Up), (0b10, false));
    }

    #[test]
    fn normalize_moves_leading_one_to_lead() {
        let (sig, adj) = normalize(1);
        assert_eq!(sig, 1u128 << LEAD);
        assert_eq!(adj, -(LEAD as i32));
        let (sig, adj) = normalize(1u128 << 127 | 1);
        assert_eq!(sig, 1u128 << LEAD | 1);
        assert_eq!(adj, 1);
    }
}
