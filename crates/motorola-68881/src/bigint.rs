//! Minimal arbitrary-precision unsigned integers for exact decimal
//! conversion. Only the handful of operations packed decimal needs.

use std::cmp::Ordering;

/// Little-endian base-2^32 digits with no trailing zero limbs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct BigUint {
    limbs: Vec<u32>,
}

impl BigUint {
    pub fn from_u128(mut value: u128) -> Self {
        let mut limbs = Vec::with_capacity(4);
        while value != 0 {
            limbs.push(value as u32);
            value >>= 32;
        }
        Self { limbs }
    }

    /// `10^n`.
    pub fn pow10(n: u32) -> Self {
        const CHUNK: u32 = 1_000_000_000;
        let mut result = Self::from_u128(1);
        let mut left = n;
        while left >= 9 {
            result.mul_small(CHUNK);
            left -= 9;
        }
        result.mul_small(10u32.pow(left));
        result
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn bit_len(&self) -> u32 {
        match self.limbs.last() {
            None => 0,
            Some(top) => (self.limbs.len() as u32 - 1) * 32 + (32 - top.leading_zeros()),
        }
    }

    /// Low 128 bits.
    pub fn low_u128(&self) -> u128 {
        self.limbs
            .iter()
            .take(4)
            .rev()
            .fold(0u128, |acc, &limb| (acc << 32) | u128::from(limb))
    }

    pub fn mul_small(&mut self, factor: u32) {
        let mut carry = 0u64;
        for limb in &mut self.limbs {
            let product = u64::from(*limb) * u64::from(factor) + carry;
            *limb = product as u32;
            carry = product >> 32;
        }
        if carry != 0 {
            self.limbs.push(carry as u32);
        }
        self.trim();
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::default();
        }
        let mut out = vec![0u32; self.limbs.len() + other.limbs.len()];
        for (i, &a) in self.limbs.iter().enumerate() {
            let mut carry = 0u64;
            for (j, &b) in other.limbs.iter().enumerate() {
                let cur = u64::from(out[i + j]) + u64::from(a) * u64::from(b) + carry;
                out[i + j] = cur as u32;
                carry = cur >> 32;
            }
            out[i + other.limbs.len()] = carry as u32;
        }
        let mut result = Self { limbs: out };
        result.trim();
        result
    }

    pub fn shl(&self, bits: u32) -> Self {
        if self.is_zero() {
            return Self::default();
        }
        let words = (bits / 32) as usize;
        let shift = bits % 32;
        let mut limbs = vec![0u32; words];
        if shift == 0 {
            limbs.extend_from_slice(&self.limbs);
        } else {
            let mut carry = 0u32;
            for &limb in &self.limbs {
                limbs.push((limb << shift) | carry);
                carry = limb >> (32 - shift);
            }
            limbs.push(carry);
        }
        let mut result = Self { limbs };
        result.trim();
        result
    }

    pub fn shr(&self, bits: u32) -> Self {
        let words = (bits / 32) as usize;
        if words >= self.limbs.len() {
            return Self::default();
        }
        let shift = bits % 32;
        let src = &self.limbs[words..];
        let limbs = if shift == 0 {
            src.to_vec()
        } else {
            (0..src.len())
                .map(|i| {
                    let high = src.get(i + 1).map_or(0, |&next| next << (32 - shift));
                    (src[i] >> shift) | high
                })
                .collect()
        };
        let mut result = Self { limbs };
        result.trim();
        result
    }

    /// True if any of the low `bits` bits is set.
    pub fn low_bits_nonzero(&self, bits: u32) -> bool {
        let words = (bits / 32) as usize;
        if self.limbs.iter().take(words).any(|&l| l != 0) {
            return true;
        }
        let rest = bits % 32;
        rest != 0 && self.limbs.get(words).is_some_and(|&l| l & ((1u32 << rest) - 1) != 0)
    }

    fn sub_assign(&mut self, other: &Self) {
        debug_assert!(*self >= *other);
        let mut borrow = 0i64;
        for (i, limb) in self.limbs.iter_mut().enumerate() {
            let rhs = i64::from(other.limbs.get(i).copied().unwrap_or(0));
            let mut diff = i64::from(*limb) - rhs - borrow;
            borrow = 0;
            if diff < 0 {
                diff += 1 << 32;
                borrow = 1;
            }
            *limb = diff as u32;
        }
        self.trim();
    }

    fn shr1(&mut self) {
        let mut carry = 0u32;
        for limb in self.limbs.iter_mut().rev() {
            let next = *limb << 31;
            *limb = (*limb >> 1) | carry;
            carry = next;
        }
        self.trim();
    }

    /// Divide where the quotient is known to fit in 128 bits.
    pub fn div_rem(&self, divisor: &Self) -> (u128, Self) {
        debug_assert!(!divisor.is_zero());
        if *self < *divisor {
            return (0, self.clone());
        }
        let shift = self.bit_len() - divisor.bit_len();
        debug_assert!(shift < 128, "quotient does not fit in 128 bits");
        let mut rem = self.clone();
        let mut d = divisor.shl(shift);
        let mut quotient = 0u128;
        for bit in (0..=shift).rev() {
            if rem >= d {
                rem.sub_assign(&d);
                quotient |= 1u128 << bit;
            }
            d.shr1();
        }
        (quotient, rem)
    }

    fn trim(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powers_of_ten() {
        assert_eq!(BigUint::pow10(0).low_u128(), 1);
        assert_eq!(BigUint::pow10(19).low_u128(), 10_000_000_000_000_000_000);
        assert_eq!(BigUint::pow10(38).low_u128(), 10u128.pow(38));
        assert_eq!(BigUint::pow10(100).bit_len(), 333);
    }

    #[test]
    fn shifts_and_division() {
        let big = BigUint::pow10(40);
        let (q, r) = big.div_rem(&BigUint::pow10(20));
        assert_eq!(q, 10u128.pow(20));
        assert!(r.is_zero());

        let n = BigUint::from_u128(1000);
        let (q, r) = n.div_rem(&BigUint::from_u128(7));
        assert_eq!((q, r.low_u128()), (142, 6));

        let x = BigUint::from_u128(0b1011).shl(100);
        assert_eq!(x.shr(99).low_u128(), 0b10110);
        assert!(!x.low_bits_nonzero(100));
        assert!(x.low_bits_nonzero(101));
    }

    #[test]
    fn multiplication() {
        let a = BigUint::pow10(30);
        let b = BigUint::pow10(25);
        assert_eq!(a.mul(&b), BigUint::pow10(55));
    }
}
