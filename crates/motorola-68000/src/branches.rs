//! Program control: branches, jumps, subroutine returns and traps.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{Fault, vector};
use crate::flags::{Status, V};

impl Cpu68000 {
    /// Bcc/BRA/BSR. Displacements are relative to the word after the
    /// opcode.
    pub(crate) fn exec_bcc<B: M68kBus>(&mut self, bus: &mut B, cond: u8, disp: i8) -> Result<(), Fault> {
        let base = self.regs.pc;
        let offset = match disp {
            0 => self.fetch_word(bus)? as i16 as i32 as u32,
            -1 if self.caps.long_muldiv => self.fetch_long(bus)?,
            d => d as i32 as u32,
        };
        let target = base.wrapping_add(offset);
        match cond {
            0 => self.jump(bus, target),
            1 => {
                self.push(bus, Size::Long, self.regs.pc)?;
                self.jump(bus, target)
            }
            _ if Status::condition(self.regs.sr, cond) => {
                self.cycles += 2;
                self.jump(bus, target)
            }
            _ => Ok(()),
        }
    }

    /// DBcc: unless the condition holds, decrement Dn.W and branch while it
    /// has not reached -1.
    pub(crate) fn exec_dbcc<B: M68kBus>(&mut self, bus: &mut B, cond: u8, reg: u8) -> Result<(), Fault> {
        let base = self.regs.pc;
        let disp = self.fetch_word(bus)? as i16 as i32 as u32;
        if Status::condition(self.regs.sr, cond) {
            self.cycles += 4;
            return Ok(());
        }
        let dn = &mut self.regs.d[reg as usize];
        let counter = (*dn as u16).wrapping_sub(1);
        *dn = (*dn & 0xFFFF_0000) | u32::from(counter);
        if counter == 0xFFFF {
            self.cycles += 6;
            Ok(())
        } else {
            self.jump(bus, base.wrapping_add(disp))
        }
    }

    pub(crate) fn exec_scc<B: M68kBus>(&mut self, bus: &mut B, cond: u8, mode: AddrMode) -> Result<(), Fault> {
        let ea = self.resolve(bus, mode, Size::Byte)?;
        let set = Status::condition(self.regs.sr, cond);
        if set && matches!(mode, AddrMode::DataReg(_)) {
            self.cycles += 2;
        }
        self.write_ea(bus, ea, Size::Byte, if set { 0xFF } else { 0 })
    }

    /// TRAPcc with an optional operand that is fetched and ignored.
    pub(crate) fn exec_trapcc<B: M68kBus>(&mut self, bus: &mut B, cond: u8, operand: Option<Size>) -> Result<(), Fault> {
        match operand {
            Some(Size::Long) => {
                self.fetch_long(bus)?;
            }
            Some(_) => {
                self.fetch_word(bus)?;
            }
            None => {}
        }
        if Status::condition(self.regs.sr, cond) {
            return Err(Fault::Trap(vector::TRAPV));
        }
        Ok(())
    }

    pub(crate) fn exec_jmp<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode) -> Result<(), Fault> {
        let target = self.control_address(bus, mode)?;
        self.jump(bus, target)
    }

    pub(crate) fn exec_jsr<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode) -> Result<(), Fault> {
        let target = self.control_address(bus, mode)?;
        self.push(bus, Size::Long, self.regs.pc)?;
        self.jump(bus, target)
    }

    pub(crate) fn exec_rts<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let pc = self.pop(bus, Size::Long)?;
        self.jump(bus, pc)
    }

    /// RTR: pop CCR then PC.
    pub(crate) fn exec_rtr<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let ccr = self.pop(bus, Size::Word)?;
        let pc = self.pop(bus, Size::Long)?;
        self.regs.set_ccr(ccr as u8);
        self.jump(bus, pc)
    }

    /// RTD #d16: return and deallocate parameters.
    pub(crate) fn exec_rtd<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let disp = self.fetch_word(bus)? as i16 as i32 as u32;
        let pc = self.pop(bus, Size::Long)?;
        let sp = self.regs.a(7).wrapping_add(disp);
        self.regs.set_a(7, sp);
        self.jump(bus, pc)
    }

    /// RTE (privileged).
    pub(crate) fn exec_rte<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        self.require_supervisor()?;
        self.return_from_exception(bus)
    }

    pub(crate) fn exec_trapv(&self) -> Result<(), Fault> {
        if self.regs.sr & V != 0 {
            Err(Fault::Trap(vector::TRAPV))
        } else {
            Ok(())
        }
    }
}
