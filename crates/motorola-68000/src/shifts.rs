//! Shift and rotate instructions.

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::decode::{ShiftCount, ShiftKind};
use crate::exceptions::Fault;
use crate::flags::{C, Status, V, X};
use crate::model::CpuModel;

/// Shift `value` by `count` one bit at a time. Returns (result, sr).
///
/// C is the last bit shifted out, or cleared for a zero count (ROXL/ROXR
/// copy X instead). X follows C except for ROL/ROR and zero counts. V is
/// only set by ASL, when the sign bit changes at any point.
#[must_use]
pub(crate) fn shift(kind: ShiftKind, left: bool, size: Size, value: u32, count: u32, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb_mask();
    let mut v = value & mask;
    let mut x = sr & X != 0;
    let mut c = false;
    let mut overflow = false;

    for _ in 0..count {
        match (kind, left) {
            (ShiftKind::Arithmetic, true) => {
                c = v & msb != 0;
                let next = (v << 1) & mask;
                overflow |= (next ^ v) & msb != 0;
                v = next;
                x = c;
            }
            (ShiftKind::Arithmetic, false) => {
                c = v & 1 != 0;
                v = (v >> 1) | (v & msb);
                x = c;
            }
            (ShiftKind::Logical, true) => {
                c = v & msb != 0;
                v = (v << 1) & mask;
                x = c;
            }
            (ShiftKind::Logical, false) => {
                c = v & 1 != 0;
                v >>= 1;
                x = c;
            }
            (ShiftKind::RotateExtend, true) => {
                c = v & msb != 0;
                v = ((v << 1) | u32::from(x)) & mask;
                x = c;
            }
            (ShiftKind::RotateExtend, false) => {
                c = v & 1 != 0;
                v = (v >> 1) | if x { msb } else { 0 };
                x = c;
            }
            (ShiftKind::Rotate, true) => {
                c = v & msb != 0;
                v = ((v << 1) | u32::from(c)) & mask;
            }
            (ShiftKind::Rotate, false) => {
                c = v & 1 != 0;
                v = (v >> 1) | if c { msb } else { 0 };
            }
        }
    }

    if count == 0 && kind == ShiftKind::RotateExtend {
        c = x;
    }
    let mut flags = alu::nz(v, size, sr) & !(V | C);
    flags = Status::set_if(flags, V, overflow);
    flags = Status::set_if(flags, C, c);
    if count > 0 && kind != ShiftKind::Rotate {
        flags = Status::set_if(flags, X, x);
    }
    (v, flags)
}

impl Cpu68000 {
    /// Register shifts: count 1-8 immediate or Dn modulo 64.
    pub(crate) fn exec_shift_reg(&mut self, kind: ShiftKind, left: bool, size: Size, count: ShiftCount, reg: u8) {
        let count = match count {
            ShiftCount::Immediate(n) => u32::from(n),
            ShiftCount::Register(r) => self.regs.d[r as usize] & 63,
        };
        let value = self.regs.d[reg as usize];
        let (result, sr) = shift(kind, left, size, value, count, self.regs.sr);
        let mask = size.mask();
        self.regs.d[reg as usize] = (value & !mask) | result;
        self.set_flags(sr);
        if matches!(self.model, CpuModel::M68000 | CpuModel::M68010) {
            self.cycles += 2 * count;
        }
    }

    /// Memory shifts: one bit of a word.
    pub(crate) fn exec_shift_mem<B: M68kBus>(&mut self, bus: &mut B, kind: ShiftKind, left: bool, mode: AddrMode) -> Result<(), Fault> {
        let ea = self.resolve(bus, mode, Size::Word)?;
        let value = self.read_ea(bus, ea, Size::Word)?;
        let (result, sr) = shift(kind, left, Size::Word, value, 1, self.regs.sr);
        self.write_ea(bus, ea, Size::Word, result)?;
        self.set_flags(sr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{N, Z};

    #[test]
    fn asl_sets_overflow_when_the_sign_changes() {
        let (r, sr) = shift(ShiftKind::Arithmetic, true, Size::Byte, 0x40, 1, 0);
        assert_eq!(r, 0x80);
        assert_eq!(sr & (N | V | C | X), N | V);
        let (r, sr) = shift(ShiftKind::Arithmetic, true, Size::Byte, 0x81, 1, 0);
        assert_eq!(r, 0x02);
        assert_eq!(sr & (V | C | X), V | C | X);
    }

    #[test]
    fn asr_keeps_the_sign() {
        let (r, sr) = shift(ShiftKind::Arithmetic, false, Size::Word, 0x8001, 1, 0);
        assert_eq!(r, 0xC000);
        assert_eq!(sr & (N | C | X), N | C | X);
    }

    #[test]
    fn logical_shift_past_width_clears() {
        let (r, sr) = shift(ShiftKind::Logical, false, Size::Byte, 0xFF, 9, 0);
        assert_eq!(r, 0);
        assert_eq!(sr & (Z | C | X), Z);
    }

    #[test]
    fn zero_count_clears_carry_but_keeps_x() {
        let (r, sr) = shift(ShiftKind::Logical, true, Size::Long, 0x1234, 0, X | C);
        assert_eq!(r, 0x1234);
        assert_eq!(sr & (C | X), X);
        let (_, sr) = shift(ShiftKind::RotateExtend, true, Size::Long, 0x1234, 0, X);
        assert_eq!(sr & (C | X), C | X);
    }

    #[test]
    fn rotates() {
        let (r, sr) = shift(ShiftKind::Rotate, true, Size::Byte, 0x81, 1, 0);
        assert_eq!(r, 0x03);
        assert_eq!(sr & (C | X), C);
        let (r, sr) = shift(ShiftKind::RotateExtend, false, Size::Byte, 0x01, 1, X);
        assert_eq!(r, 0x80);
        assert_eq!(sr & (C | X), C | X);
    }
}
