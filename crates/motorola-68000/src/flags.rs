//! 680x0 status register flags.
//!
//! The status register is 16 bits:
//! - Bits 0-4: Condition code register (CCR): C, V, Z, N, X
//! - Bits 8-10: Interrupt mask
//! - Bit 12: Master/interrupt state (M, 68020+)
//! - Bit 13: Supervisor mode (S)
//! - Bit 14: Trace on change of flow (T0, 68020+)
//! - Bit 15: Trace on every instruction (T1)

/// Carry flag.
pub const C: u16 = 0x0001;
/// Overflow flag.
pub const V: u16 = 0x0002;
/// Zero flag.
pub const Z: u16 = 0x0004;
/// Negative flag.
pub const N: u16 = 0x0008;
/// Extend flag.
pub const X: u16 = 0x0010;

/// Interrupt priority mask (bits 8-10).
pub const INT_MASK: u16 = 0x0700;

/// Master/interrupt state.
pub const M: u16 = 0x1000;
/// Supervisor mode flag.
pub const S: u16 = 0x2000;
/// Trace on change of flow.
pub const T0: u16 = 0x4000;
/// Trace on every instruction.
pub const T1: u16 = 0x8000;

/// Condition code bits.
pub const CCR_MASK: u16 = 0x001F;
/// Implemented SR bits on the 68000 and 68010.
pub const SR_MASK_68000: u16 = 0xA71F;
/// Implemented SR bits on the 68020 and later.
pub const SR_MASK_68020: u16 = 0xF71F;

/// Status register helpers.
pub struct Status;

impl Status {
    /// Set a flag if condition is true, clear if false.
    #[must_use]
    pub fn set_if(sr: u16, flag: u16, condition: bool) -> u16 {
        if condition { sr | flag } else { sr & !flag }
    }

    /// Evaluate an integer condition code (0-15).
    #[must_use]
    pub fn condition(sr: u16, cc: u8) -> bool {
        let c = sr & C != 0;
        let v = sr & V != 0;
        let z = sr & Z != 0;
        let n = sr & N != 0;
        match cc & 0x0F {
            0x0 => true,            // T
            0x1 => false,           // F
            0x2 => !c && !z,        // HI
            0x3 => c || z,          // LS
            0x4 => !c,              // CC/HS
            0x5 => c,               // CS/LO
            0x6 => !z,              // NE
            0x7 => z,               // EQ
            0x8 => !v,              // VC
            0x9 => v,               // VS
            0xA => !n,              // PL
            0xB => n,               // MI
            0xC => n == v,          // GE
            0xD => n != v,          // LT
            0xE => !z && (n == v),  // GT
            _ => z || (n != v),     // LE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_conditions() {
        assert!(Status::condition(N | V, 0xC));
        assert!(Status::condition(N, 0xD));
        assert!(!Status::condition(Z, 0xE));
        assert!(Status::condition(Z, 0xF));
    }

    #[test]
    fn unsigned_conditions() {
        assert!(Status::condition(0, 0x2));
        assert!(Status::condition(C, 0x3));
        assert!(Status::condition(C, 0x5));
        assert!(!Status::condition(C, 0x4));
    }

    #[test]
    fn masks_cover_model_bits() {
        assert_eq!(SR_MASK_68000 & (M | T0), 0);
        assert_eq!(SR_MASK_68020 & (M | T0 | T1 | S), M | T0 | T1 | S);
    }
}
