//! Effective address calculation.
//!
//! Resolution consumes extension words from the instruction stream and
//! applies (An)+/-(An) register updates, so each operand must be resolved
//! exactly once. The result is an [`Ea`] that can be read and written any
//! number of times, which is what read-modify-write instructions need.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{Fault, vector};
use crate::timing;

/// A resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ea {
    DataReg(u8),
    AddrReg(u8),
    /// `program` marks PC-relative operands, read in program space.
    Memory { addr: u32, program: bool },
    Immediate(u32),
}

impl Ea {
    /// Memory address, if the operand is in memory.
    pub(crate) fn address(self) -> Option<u32> {
        match self {
            Self::Memory { addr, .. } => Some(addr),
            _ => None,
        }
    }
}

/// (An)+ and -(An) step: operand size, except that byte accesses through
/// A7 move by 2 to keep the stack word aligned.
pub(crate) const fn step_bytes(reg: u8, size: Size) -> u32 {
    if reg == 7 && matches!(size, Size::Byte) { 2 } else { size.bytes() }
}

impl Cpu68000 {
    /// Resolve an operand of `size`. Immediates are fetched here.
    pub(crate) fn resolve<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode, size: Size) -> Result<Ea, Fault> {
        self.cycles += timing::ea_cycles(self.model, mode, size);
        let ea = match mode {
            AddrMode::DataReg(r) => Ea::DataReg(r),
            AddrMode::AddrReg(r) => Ea::AddrReg(r),
            AddrMode::Immediate => {
                let value = match size {
                    Size::Byte => u32::from(self.fetch_word(bus)?) & 0xFF,
                    Size::Word => u32::from(self.fetch_word(bus)?),
                    Size::Long => self.fetch_long(bus)?,
                };
                Ea::Immediate(value)
            }
            AddrMode::PcDisp | AddrMode::PcIndex => Ea::Memory {
                addr: self.effective_address(bus, mode, size)?,
                program: true,
            },
            _ => Ea::Memory {
                addr: self.effective_address(bus, mode, size)?,
                program: false,
            },
        };
        Ok(ea)
    }

    /// Address of a memory operand. `size` sets the (An)+/-(An) step.
    pub(crate) fn effective_address<B: M68kBus>(
        &mut self,
        bus: &mut B,
        mode: AddrMode,
        size: Size,
    ) -> Result<u32, Fault> {
        let addr = match mode {
            AddrMode::AddrInd(r) => self.regs.a(r as usize),
            AddrMode::AddrIndPostInc(r) => {
                let addr = self.regs.a(r as usize);
                self.regs.set_a(r as usize, addr.wrapping_add(step_bytes(r, size)));
                addr
            }
            AddrMode::AddrIndPreDec(r) => {
                let addr = self.regs.a(r as usize).wrapping_sub(step_bytes(r, size));
                self.regs.set_a(r as usize, addr);
                addr
            }
            AddrMode::AddrIndDisp(r) => {
                let disp = self.fetch_word(bus)? as i16;
                self.regs.a(r as usize).wrapping_add(disp as i32 as u32)
            }
            AddrMode::AddrIndIndex(r) => {
                let base = self.regs.a(r as usize);
                self.index_address(bus, base)?
            }
            AddrMode::AbsShort => self.fetch_word(bus)? as i16 as i32 as u32,
            AddrMode::AbsLong => self.fetch_long(bus)?,
            AddrMode::PcDisp => {
                let base = self.regs.pc;
                let disp = self.fetch_word(bus)? as i16;
                base.wrapping_add(disp as i32 as u32)
            }
            AddrMode::PcIndex => {
                let base = self.regs.pc;
                self.index_address(bus, base)?
            }
            AddrMode::DataReg(_) | AddrMode::AddrReg(_) | AddrMode::Immediate => {
                return Err(Fault::Exception(vector::ILLEGAL_INSTRUCTION));
            }
        };
        Ok(addr)
    }

    /// Index register value from an extension word, sized and scaled.
    fn index_value(&self, ext: u16) -> u32 {
        let reg = ((ext >> 12) & 7) as usize;
        let raw = if ext & 0x8000 != 0 { self.regs.a(reg) } else { self.regs.d[reg] };
        let value = if ext & 0x0800 != 0 { raw } else { raw as i16 as i32 as u32 };
        let scale = if self.caps.extended_addressing { (ext >> 9) & 3 } else { 0 };
        value << scale
    }

    /// Indexed modes: brief format on every model, full format on the
    /// 68020 and later.
    fn index_address<B: M68kBus>(&mut self, bus: &mut B, base: u32) -> Result<u32, Fault> {
        let ext = self.fetch_word(bus)?;
        if ext & 0x0100 == 0 || !self.caps.extended_addressing {
            let disp = ext as u8 as i8 as i32 as u32;
            return Ok(base.wrapping_add(disp).wrapping_add(self.index_value(ext)));
        }

        let base = if ext & 0x80 != 0 { 0 } else { base };
        let index_suppressed = ext & 0x40 != 0;
        let index = if index_suppressed { 0 } else { self.index_value(ext) };
        let base_disp = match (ext >> 4) & 3 {
            1 => 0,
            2 => self.fetch_word(bus)? as i16 as i32 as u32,
            3 => self.fetch_long(bus)?,
            _ => return Err(Fault::Exception(vector::ILLEGAL_INSTRUCTION)),
        };
        let selector = ext & 7;
        if selector == 0 {
            return Ok(base.wrapping_add(base_disp).wrapping_add(index));
        }
        if selector == 4 || (index_suppressed && selector > 4) {
            return Err(Fault::Exception(vector::ILLEGAL_INSTRUCTION));
        }
        let outer_disp = match selector & 3 {
            2 => self.fetch_word(bus)? as i16 as i32 as u32,
            3 => self.fetch_long(bus)?,
            _ => 0,
        };
        self.cycles += 6;
        let post_indexed = selector > 4;
        let pointer = if post_indexed {
            base.wrapping_add(base_disp)
        } else {
            base.wrapping_add(base_disp).wrapping_add(index)
        };
        let intermediate = self.read_mem(bus, Size::Long, pointer)?;
        let addr = intermediate.wrapping_add(outer_disp);
        Ok(if post_indexed { addr.wrapping_add(index) } else { addr })
    }

    /// Read a resolved operand.
    pub(crate) fn read_ea<B: M68kBus>(&mut self, bus: &mut B, ea: Ea, size: Size) -> Result<u32, Fault> {
        match ea {
            Ea::DataReg(r) => Ok(self.regs.d[r as usize] & size.mask()),
            Ea::AddrReg(r) => Ok(self.regs.a(r as usize) & size.mask()),
            Ea::Immediate(value) => Ok(value & size.mask()),
            Ea::Memory { addr, program: false } => self.read_mem(bus, size, addr),
            Ea::Memory { addr, program: true } => {
                let fc = self.program_fc();
                self.read_mem_fc(bus, size, addr, fc)
            }
        }
    }

    /// Write a resolved operand. Data registers keep their bits above
    /// `size`; address registers take the whole value.
    pub(crate) fn write_ea<B: M68kBus>(&mut self, bus: &mut B, ea: Ea, size: Size, value: u32) -> Result<(), Fault> {
        match ea {
            Ea::DataReg(r) => {
                let mask = size.mask();
                let reg = &mut self.regs.d[r as usize];
                *reg = (*reg & !mask) | (value & mask);
                Ok(())
            }
            Ea::AddrReg(r) => {
                self.regs.set_a(r as usize, value);
                Ok(())
            }
            Ea::Memory { addr, .. } => self.write_mem(bus, size, addr, value),
            Ea::Immediate(_) => Err(Fault::Exception(vector::ILLEGAL_INSTRUCTION)),
        }
    }

    /// Resolve and read in one go.
    pub(crate) fn read_operand<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode, size: Size) -> Result<u32, Fault> {
        let ea = self.resolve(bus, mode, size)?;
        self.read_ea(bus, ea, size)
    }

    /// Address of a control-mode operand (LEA, PEA, JMP, JSR, MOVEM).
    pub(crate) fn control_address<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode) -> Result<u32, Fault> {
        self.effective_address(bus, mode, Size::Long)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a7_byte_steps_keep_the_stack_aligned() {
        assert_eq!(step_bytes(7, Size::Byte), 2);
        assert_eq!(step_bytes(6, Size::Byte), 1);
        assert_eq!(step_bytes(7, Size::Long), 4);
    }

    #[test]
    fn memory_operands_expose_their_address() {
        assert_eq!(Ea::Memory { addr: 0x10, program: false }.address(), Some(0x10));
        assert_eq!(Ea::DataReg(0).address(), None);
    }
}
