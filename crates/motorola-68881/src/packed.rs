//! Packed decimal real format.
//!
//! Twelve bytes, held here as three big-endian long words:
//!
//! ```text
//! word 0: SM SE YY EEE(3 BCD digits) EXP3 .... .... INT(1 BCD digit)
//! word 1: fraction digits 1-8
//! word 2: fraction digits 9-16
//! ```
//!
//! `SM` is the mantissa sign, `SE` the exponent sign. Infinities and NaNs
//! set bits 94-80 (SE, YY and the exponent digits) to all ones.
//!
//! Both directions are exact: the decimal value is converted with
//! arbitrary-precision integers and rounded once in the current FPCR mode.

use std::cmp::Ordering;

use softfloat::{FloatStatus, FloatX80, RoundingMode};

use crate::bigint::BigUint;
use crate::registers::{EXC_INEX1, EXC_INEX2, EXC_OPERR};

const INF_NAN_FIELD: u32 = 0x7FFF_0000;
const MAX_DIGITS: i32 = 17;

/// Decode a packed decimal operand to extended precision.
///
/// Returns the value and the FPSR exception bits raised (`INEX1` when the
/// decimal value is not exactly representable). Digits above 9 are used
/// at their raw nibble value.
#[must_use]
pub fn decode(words: [u32; 3], status: &FloatStatus) -> (FloatX80, u32) {
    let sign = words[0] & 0x8000_0000 != 0;

    if words[0] & INF_NAN_FIELD == INF_NAN_FIELD {
        let value = if words[1] == 0 && words[2] == 0 {
            FloatX80::infinity(sign)
        } else {
            let low = (u64::from(words[1]) << 32) | u64::from(words[2]);
            FloatX80::new(0x7FFF | (u16::from(sign) << 15), low)
        };
        return (value, 0);
    }

    let mut mantissa = u128::from(words[0] & 0xF);
    for word in [words[1], words[2]] {
        for shift in (0..8).rev() {
            mantissa = mantissa * 10 + u128::from((word >> (shift * 4)) & 0xF);
        }
    }
    if mantissa == 0 {
        return (FloatX80::zero(sign), 0);
    }

    let exp_digits = (words[0] >> 16) & 0xFFF;
    let mut exponent = ((exp_digits >> 8) & 0xF) as i32 * 100
        + ((exp_digits >> 4) & 0xF) as i32 * 10
        + (exp_digits & 0xF) as i32;
    if words[0] & 0x4000_0000 != 0 {
        exponent = -exponent;
    }
    // The mantissa digits are d.dddd..., sixteen of them after the point.
    let power = exponent - 16;

    let mut st = FloatStatus {
        precision: softfloat::Precision::Extended,
        flags: 0,
        ..*status
    };
    let value = if power >= 0 {
        let n = BigUint::from_u128(mantissa).mul(&BigUint::pow10(power.unsigned_abs()));
        let (bits, scale) = top_bits(&n);
        FloatX80::from_scaled_integer(sign, bits, scale, &mut st)
    } else {
        let den = BigUint::pow10(power.unsigned_abs());
        let num = BigUint::from_u128(mantissa);
        let extra = (den.bit_len() + 100).saturating_sub(num.bit_len());
        let (q, r) = num.shl(extra).div_rem(&den);
        FloatX80::from_scaled_integer(sign, q | u128::from(!r.is_zero()), -(extra as i32), &mut st)
    };

    let exc = if st.flags & softfloat::INEXACT != 0 { EXC_INEX1 } else { 0 };
    (value, exc)
}

/// Keep roughly 100 leading bits of `n`, jamming the rest into bit 0.
fn top_bits(n: &BigUint) -> (u128, i32) {
    let len = n.bit_len();
    if len <= 120 {
        return (n.low_u128(), 0);
    }
    let shift = len - 100;
    let sticky = u128::from(n.low_bits_nonzero(shift));
    (n.shr(shift).low_u128() | sticky, shift as i32)
}

/// Encode an extended value as packed decimal with the given k-factor.
///
/// `k > 0` requests `k` significant digits (at most 17; larger values raise
/// OPERR); `k <= 0` requests `-k` digits right of the decimal point. Returns
/// the three long words and the FPSR exception bits raised.
#[must_use]
pub fn encode(value: FloatX80, k_factor: i8, mode: RoundingMode) -> ([u32; 3], u32) {
    let sign_bit = if value.sign() { 0x8000_0000 } else { 0 };

    if value.is_infinity() {
        return ([sign_bit | INF_NAN_FIELD, 0, 0], 0);
    }
    if value.is_nan() {
        return ([sign_bit | INF_NAN_FIELD, (value.low >> 32) as u32, value.low as u32], 0);
    }
    if value.is_zero() {
        return ([sign_bit, 0, 0], 0);
    }

    let mut exc = 0;
    let (sign, sig, exp2) = value.to_scaled_integer();
    let (num, den) = if exp2 >= 0 {
        (BigUint::from_u128(u128::from(sig)).shl(exp2.unsigned_abs()), BigUint::from_u128(1))
    } else {
        (BigUint::from_u128(u128::from(sig)), BigUint::from_u128(1).shl(exp2.unsigned_abs()))
    };

    let mut ilog = estimate_log10(sig, exp2);
    while compare_pow10(&num, &den, ilog) == Ordering::Less {
        ilog -= 1;
    }
    while compare_pow10(&num, &den, ilog + 1) != Ordering::Less {
        ilog += 1;
    }

    let k = i32::from(k_factor);
    let len = if k > 0 {
        if k > MAX_DIGITS {
            exc |= EXC_OPERR;
        }
        k.min(MAX_DIGITS)
    } else {
        (ilog + 1 - k).clamp(1, MAX_DIGITS)
    };

    // Y = round(|x| * 10^(len - 1 - ilog)), an integer of `len` digits.
    let scale = len - 1 - ilog;
    let (n, d) = if scale >= 0 {
        (num.mul(&BigUint::pow10(scale.unsigned_abs())), den)
    } else {
        (num, den.mul(&BigUint::pow10(scale.unsigned_abs())))
    };
    let (mut digits, rem) = n.div_rem(&d);
    if !rem.is_zero() {
        exc |= EXC_INEX2;
        if round_up(digits, &rem.shl(1).cmp(&d), sign, mode) {
            digits += 1;
        }
    }
    if digits == 10u128.pow(len as u32) {
        digits /= 10;
        ilog += 1;
    }

    // Left-align to seventeen digits: one integer digit, sixteen fraction.
    let digits = digits * 10u128.pow((MAX_DIGITS - len) as u32);
    let mut bcd = [0u8; 17];
    let mut rest = digits;
    for slot in bcd.iter_mut().rev() {
        *slot = (rest % 10) as u8;
        rest /= 10;
    }

    let abs_exp = ilog.unsigned_abs();
    if abs_exp > 999 {
        exc |= EXC_OPERR;
    }
    let mut word0 = sign_bit | u32::from(bcd[0]);
    if ilog < 0 {
        word0 |= 0x4000_0000;
    }
    word0 |= ((abs_exp / 100) % 10) << 24 | ((abs_exp / 10) % 10) << 20 | (abs_exp % 10) << 16;
    word0 |= ((abs_exp / 1000) % 10) << 12;

    let pack = |digits: &[u8]| digits.iter().fold(0u32, |acc, &d| (acc << 4) | u32::from(d));
    ([word0, pack(&bcd[1..9]), pack(&bcd[9..17])], exc)
}

/// Rounding decision for a positive quotient with a non-zero remainder;
/// `half` compares twice the remainder to the divisor.
fn round_up(quotient: u128, half: &Ordering, negative: bool, mode: RoundingMode) -> bool {
    match mode {
        RoundingMode::NearestEven => match half {
            Ordering::Greater => true,
            Ordering::Equal => quotient & 1 == 1,
            Ordering::Less => false,
        },
        RoundingMode::ToZero => false,
        RoundingMode::Up => !negative,
        RoundingMode::Down => negative,
    }
}

/// First guess at `floor(log10(sig * 2^exp2))`; corrected exactly by the
/// caller.
fn estimate_log10(sig: u64, exp2: i32) -> i32 {
    let log2 = (sig as f64).log2() + f64::from(exp2);
    (log2 * std::f64::consts::LOG10_2).floor() as i32
}

/// Compare `num / den` with `10^power`.
fn compare_pow10(num: &BigUint, den: &BigUint, power: i32) -> Ordering {
    let p = BigUint::pow10(power.unsigned_abs());
    if power >= 0 {
        num.cmp(&den.mul(&p))
    } else {
        num.mul(&p).cmp(den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(v: f64) -> FloatX80 {
        FloatX80::from_f64(v)
    }

    #[test]
    fn encodes_integers_with_exponent() {
        // 1234.5 with 17 significant digits: 1.2345E+3
        let (words, exc) = encode(x(1234.5), 17, RoundingMode::NearestEven);
        assert_eq!(words, [0x0003_0001, 0x2345_0000, 0]);
        assert_eq!(exc, 0);
    }

    #[test]
    fn encodes_negative_exponent_and_sign() {
        // -0.015625 = -1.5625E-2
        let (words, exc) = encode(x(-0.015_625), 17, RoundingMode::NearestEven);
        assert_eq!(words, [0xC002_0001, 0x5625_0000, 0]);
        assert_eq!(exc, 0);
    }

    #[test]
    fn k_factor_limits_significant_digits() {
        // 2/3 to 3 digits: 6.67E-1, inexact.
        let third = FloatX80::from_f64(2.0).div(x(3.0), &mut FloatStatus::new());
        let (words, exc) = encode(third, 3, RoundingMode::NearestEven);
        assert_eq!(words, [0x4001_0006, 0x6700_0000, 0]);
        assert_eq!(exc, EXC_INEX2);

        let (words, _) = encode(third, 3, RoundingMode::ToZero);
        assert_eq!(words[1], 0x6600_0000);
    }

    #[test]
    fn negative_k_counts_fraction_digits() {
        // 123.456 with k = -1: one digit after the point -> 1.235E+2
        let (words, _) = encode(x(123.456), -1, RoundingMode::NearestEven);
        assert_eq!(words, [0x0002_0001, 0x2350_0000, 0]);
    }

    #[test]
    fn rounding_carry_bumps_exponent() {
        // 9.99 to 2 digits rounds to 10 -> 1.0E+1
        let (words, _) = encode(x(9.99), 2, RoundingMode::NearestEven);
        assert_eq!(words, [0x0001_0001, 0, 0]);
    }

    #[test]
    fn decodes_exactly() {
        let st = FloatStatus::new();
        let (v, exc) = decode([0x0003_0001, 0x2345_0000, 0], &st);
        assert_eq!(v, x(1234.5));
        assert_eq!(exc, 0);

        let (v, exc) = decode([0xC002_0001, 0x5625_0000, 0], &st);
        assert_eq!(v, x(-0.015_625));
        assert_eq!(exc, 0);

        // 0.1 is not representable in binary.
        let (v, exc) = decode([0x4001_0001, 0, 0], &st);
        assert_eq!(v, FloatX80::new(0x3FFB, 0xCCCC_CCCC_CCCC_CCCD));
        assert_eq!(exc, EXC_INEX1);
    }

    #[test]
    fn special_values() {
        let st = FloatStatus::new();
        assert_eq!(encode(FloatX80::infinity(true), 17, RoundingMode::NearestEven).0, [0xFFFF_0000, 0, 0]);
        assert_eq!(decode([0x7FFF_0000, 0, 0], &st).0, FloatX80::infinity(false));
        assert!(decode([0x7FFF_0000, 0x4000_0000, 0], &st).0.is_nan());
        assert_eq!(decode([0x8000_0000, 0, 0], &st).0, FloatX80::zero(true));
        assert_eq!(encode(FloatX80::zero(false), 5, RoundingMode::NearestEven).0, [0, 0, 0]);
    }

    #[test]
    fn large_exponents_use_the_fourth_digit() {
        let big = FloatX80::new(0x7000, 0x8000_0000_0000_0000);
        let (words, exc) = encode(big, 17, RoundingMode::NearestEven);
        assert!(exc & EXC_OPERR != 0);
        assert_ne!(words[0] & 0x0000_F000, 0);
        let (back, _) = decode([0x0123_0004, 0x5000_0000, 0], &FloatStatus::new());
        assert!(back.to_f64() > 4.49e123 && back.to_f64() < 4.51e123);
    }
}
