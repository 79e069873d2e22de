//! 680x0 CPU registers.
//!
//! - D0-D7: 8 data registers (32-bit)
//! - A0-A6: 7 address registers (32-bit)
//! - A7: whichever of USP, ISP and MSP the S and M bits select
//! - PC, PPC: program counter and the address of the current instruction
//! - SR: status register (16-bit)
//! - VBR, SFC, DFC, CACR, CAAR: 68010+ control registers
//!
//! The three stack pointers are stored separately and A7 is derived from SR
//! on every access, so the live stack pointer can never disagree with the
//! mode bits.

use crate::flags::{CCR_MASK, INT_MASK, M, S, T0, T1};

/// Symbolic register names for [`Cpu68000::register`](crate::Cpu68000::register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    Pc,
    /// Address of the instruction being (or last) executed.
    Ppc,
    Sr,
    Usp,
    /// Interrupt stack pointer, the 68000's SSP.
    Isp,
    Msp,
    /// The live stack pointer, same as A7.
    Sp,
    Vbr,
    Sfc,
    Dfc,
    Cacr,
    Caar,
    /// Opcode of the current instruction.
    Ir,
}

impl Register {
    /// Data register by number.
    #[must_use]
    pub const fn d(n: usize) -> Self {
        const D: [Register; 8] = [
            Register::D0,
            Register::D1,
            Register::D2,
            Register::D3,
            Register::D4,
            Register::D5,
            Register::D6,
            Register::D7,
        ];
        D[n & 7]
    }

    /// Address register by number.
    #[must_use]
    pub const fn a(n: usize) -> Self {
        const A: [Register; 8] = [
            Register::A0,
            Register::A1,
            Register::A2,
            Register::A3,
            Register::A4,
            Register::A5,
            Register::A6,
            Register::A7,
        ];
        A[n & 7]
    }
}

/// 680x0 CPU register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// Data registers D0-D7.
    pub d: [u32; 8],
    /// Address registers A0-A6 (A7 is handled via the stack pointers).
    pub a: [u32; 7],
    /// User stack pointer.
    pub usp: u32,
    /// Interrupt (supervisor) stack pointer.
    pub isp: u32,
    /// Master stack pointer.
    pub msp: u32,
    /// Program counter.
    pub pc: u32,
    /// Start address of the current instruction.
    pub ppc: u32,
    /// Status register.
    pub sr: u16,
    /// Vector base register.
    pub vbr: u32,
    /// Source function code for MOVES.
    pub sfc: u8,
    /// Destination function code for MOVES.
    pub dfc: u8,
    /// Cache control register.
    pub cacr: u32,
    /// Cache address register.
    pub caar: u32,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Registers in reset state: supervisor mode, interrupt mask level 7.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            d: [0; 8],
            a: [0; 7],
            usp: 0,
            isp: 0,
            msp: 0,
            pc: 0,
            ppc: 0,
            sr: 0x2700,
            vbr: 0,
            sfc: 0,
            dfc: 0,
            cacr: 0,
            caar: 0,
        }
    }

    /// Get address register by index (0-7).
    #[must_use]
    pub fn a(&self, n: usize) -> u32 {
        debug_assert!(n < 8);
        if n < 7 { self.a[n] } else { self.active_sp() }
    }

    /// Set address register by index (0-7).
    pub fn set_a(&mut self, n: usize, value: u32) {
        debug_assert!(n < 8);
        if n < 7 {
            self.a[n] = value;
        } else {
            self.set_active_sp(value);
        }
    }

    /// The stack pointer selected by S and M.
    #[must_use]
    pub const fn active_sp(&self) -> u32 {
        match (self.is_supervisor(), self.is_master()) {
            (false, _) => self.usp,
            (true, false) => self.isp,
            (true, true) => self.msp,
        }
    }

    pub fn set_active_sp(&mut self, value: u32) {
        match (self.is_supervisor(), self.is_master()) {
            (false, _) => self.usp = value,
            (true, false) => self.isp = value,
            (true, true) => self.msp = value,
        }
    }

    /// Write SR, keeping only the bits in `mask`. Every SR change goes
    /// through here.
    pub fn set_sr(&mut self, value: u16, mask: u16) {
        self.sr = value & mask;
    }

    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        self.sr & S != 0
    }

    #[must_use]
    pub const fn is_master(&self) -> bool {
        self.sr & M != 0
    }

    /// Get the interrupt mask level (0-7).
    #[must_use]
    pub const fn interrupt_mask(&self) -> u8 {
        ((self.sr & INT_MASK) >> 8) as u8
    }

    /// Set the interrupt mask level (0-7).
    pub fn set_interrupt_mask(&mut self, level: u8) {
        self.sr = (self.sr & !INT_MASK) | (u16::from(level & 0x07) << 8);
    }

    /// Trace bits (T1, T0) in SR positions.
    #[must_use]
    pub const fn trace_bits(&self) -> u16 {
        self.sr & (T1 | T0)
    }

    /// Get the condition code register (low byte of SR).
    #[must_use]
    pub const fn ccr(&self) -> u8 {
        (self.sr & CCR_MASK) as u8
    }

    /// Set the condition code register.
    pub fn set_ccr(&mut self, value: u8) {
        self.sr = (self.sr & !CCR_MASK) | (u16::from(value) & CCR_MASK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a7_follows_mode_bits() {
        let mut regs = Registers::new();
        regs.usp = 0x100;
        regs.isp = 0x200;
        regs.msp = 0x300;
        assert_eq!(regs.a(7), 0x200);
        regs.set_sr(0x3700, 0xF71F);
        assert_eq!(regs.a(7), 0x300);
        regs.set_sr(0x0000, 0xF71F);
        assert_eq!(regs.a(7), 0x100);
        regs.set_a(7, 0x180);
        assert_eq!(regs.usp, 0x180);
        assert_eq!((regs.isp, regs.msp), (0x200, 0x300));
    }

    #[test]
    fn sr_writes_are_masked() {
        let mut regs = Registers::new();
        regs.set_sr(0xFFFF, 0xA71F);
        assert_eq!(regs.sr, 0xA71F);
        assert!(!regs.is_master());
        regs.set_ccr(0xFF);
        assert_eq!(regs.ccr(), 0x1F);
        regs.set_interrupt_mask(3);
        assert_eq!(regs.interrupt_mask(), 3);
    }
}
