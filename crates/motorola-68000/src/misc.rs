//! Data movement and system control: MOVE and friends, MOVEM, MOVEP,
//! LEA/PEA, LINK/UNLK, status register moves, MOVEC, MOVES, MOVE16,
//! RESET and STOP.

use log::debug;

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::{FunctionCode, M68kBus};
use crate::cpu::{Cpu68000, State};
use crate::ea::Ea;
use crate::exceptions::{Fault, vector};
use crate::model::CpuModel;

/// MOVEC control register codes.
mod control {
    pub const SFC: u16 = 0x000;
    pub const DFC: u16 = 0x001;
    pub const CACR: u16 = 0x002;
    pub const TC: u16 = 0x003;
    pub const DTT1: u16 = 0x007;
    pub const USP: u16 = 0x800;
    pub const VBR: u16 = 0x801;
    pub const CAAR: u16 = 0x802;
    pub const MSP: u16 = 0x803;
    pub const ISP: u16 = 0x804;
    pub const MMUSR: u16 = 0x805;
    pub const SRP: u16 = 0x807;
}

impl Cpu68000 {
    pub(crate) fn exec_move<B: M68kBus>(
        &mut self,
        bus: &mut B,
        size: Size,
        src: AddrMode,
        dst: AddrMode,
    ) -> Result<(), Fault> {
        let value = self.read_operand(bus, src, size)?;
        let ea = self.resolve(bus, dst, size)?;
        let sr = alu::logic(value, size, self.regs.sr);
        self.set_flags(sr);
        self.write_ea(bus, ea, size, value)
    }

    /// MOVEA: word sources are sign-extended, flags untouched.
    pub(crate) fn exec_movea<B: M68kBus>(&mut self, bus: &mut B, size: Size, src: AddrMode, reg: u8) -> Result<(), Fault> {
        let value = self.read_operand(bus, src, size)?;
        self.regs.set_a(reg as usize, size.sign_extend(value));
        Ok(())
    }

    pub(crate) fn exec_moveq(&mut self, reg: u8, data: i8) {
        let value = data as i32 as u32;
        self.regs.d[reg as usize] = value;
        let sr = alu::logic(value, Size::Long, self.regs.sr);
        self.set_flags(sr);
    }

    /// MOVEM. The register mask is fetched before any extension words of
    /// the operand. In predecrement mode bit 0 selects A7, otherwise D0.
    pub(crate) fn exec_movem<B: M68kBus>(
        &mut self,
        bus: &mut B,
        size: Size,
        to_memory: bool,
        mode: AddrMode,
    ) -> Result<(), Fault> {
        let mask = self.fetch_word(bus)?;
        let step = size.bytes();
        let per_reg = if size == Size::Long { 8 } else { 4 };

        if let AddrMode::AddrIndPreDec(areg) = mode {
            let initial = self.regs.a(areg as usize);
            let mut addr = initial;
            for i in 0..16 {
                if mask & (1 << i) == 0 {
                    continue;
                }
                let reg = 15 - i;
                addr = addr.wrapping_sub(step);
                let value = if reg == 8 + usize::from(areg) {
                    if matches!(self.model, CpuModel::M68000 | CpuModel::M68010) {
                        initial
                    } else {
                        initial.wrapping_sub(step)
                    }
                } else {
                    self.movem_register(reg)
                };
                self.write_mem(bus, size, addr, value)?;
                self.cycles += per_reg;
            }
            self.regs.set_a(areg as usize, addr);
            return Ok(());
        }

        let mut addr = match mode {
            AddrMode::AddrIndPostInc(r) => self.regs.a(r as usize),
            _ => self.control_address(bus, mode)?,
        };
        for reg in 0..16 {
            if mask & (1 << reg) == 0 {
                continue;
            }
            if to_memory {
                let value = self.movem_register(reg);
                self.write_mem(bus, size, addr, value)?;
            } else {
                let value = size.sign_extend(self.read_mem(bus, size, addr)?);
                if reg < 8 {
                    self.regs.d[reg] = value;
                } else {
                    self.regs.set_a(reg - 8, value);
                }
            }
            addr = addr.wrapping_add(step);
            self.cycles += per_reg;
        }
        if let AddrMode::AddrIndPostInc(r) = mode {
            self.regs.set_a(r as usize, addr);
        }
        Ok(())
    }

    fn movem_register(&self, reg: usize) -> u32 {
        if reg < 8 { self.regs.d[reg] } else { self.regs.a(reg - 8) }
    }

    /// MOVEP: alternate bytes starting at (d16,An), high byte first.
    pub(crate) fn exec_movep<B: M68kBus>(
        &mut self,
        bus: &mut B,
        size: Size,
        to_memory: bool,
        dreg: u8,
        areg: u8,
    ) -> Result<(), Fault> {
        let disp = self.fetch_word(bus)? as i16 as i32 as u32;
        let base = self.regs.a(areg as usize).wrapping_add(disp);
        let count = size.bytes();
        if to_memory {
            let value = self.regs.d[dreg as usize];
            for i in 0..count {
                let byte = value >> (8 * (count - 1 - i));
                self.write_mem(bus, Size::Byte, base.wrapping_add(2 * i), byte)?;
            }
        } else {
            let mut value = 0u32;
            for i in 0..count {
                value = (value << 8) | self.read_mem(bus, Size::Byte, base.wrapping_add(2 * i))?;
            }
            let mask = size.mask();
            let dn = &mut self.regs.d[dreg as usize];
            *dn = (*dn & !mask) | value;
        }
        Ok(())
    }

    pub(crate) fn exec_lea<B: M68kBus>(&mut self, bus: &mut B, src: AddrMode, reg: u8) -> Result<(), Fault> {
        let addr = self.control_address(bus, src)?;
        self.regs.set_a(reg as usize, addr);
        Ok(())
    }

    pub(crate) fn exec_pea<B: M68kBus>(&mut self, bus: &mut B, src: AddrMode) -> Result<(), Fault> {
        let addr = self.control_address(bus, src)?;
        self.push(bus, Size::Long, addr)
    }

    /// EXG with registers numbered 0-15.
    pub(crate) fn exec_exg(&mut self, rx: u8, ry: u8) {
        let x = self.movem_register(rx as usize);
        let y = self.movem_register(ry as usize);
        self.set_numbered(rx as usize, y);
        self.set_numbered(ry as usize, x);
    }

    fn set_numbered(&mut self, reg: usize, value: u32) {
        if reg < 8 {
            self.regs.d[reg] = value;
        } else {
            self.regs.set_a(reg - 8, value);
        }
    }

    pub(crate) fn exec_swap(&mut self, reg: u8) {
        let value = self.regs.d[reg as usize].rotate_left(16);
        self.regs.d[reg as usize] = value;
        let sr = alu::logic(value, Size::Long, self.regs.sr);
        self.set_flags(sr);
    }

    pub(crate) fn exec_ext(&mut self, reg: u8, from: Size, size: Size) {
        let dn = self.regs.d[reg as usize];
        let extended = from.sign_extend(dn) & size.mask();
        self.regs.d[reg as usize] = (dn & !size.mask()) | extended;
        let sr = alu::logic(extended, size, self.regs.sr);
        self.set_flags(sr);
    }

    /// LINK An,#d. With A7 the decremented stack pointer is what gets
    /// pushed.
    pub(crate) fn exec_link<B: M68kBus>(&mut self, bus: &mut B, reg: u8, long: bool) -> Result<(), Fault> {
        let disp = if long {
            self.fetch_long(bus)?
        } else {
            self.fetch_word(bus)? as i16 as i32 as u32
        };
        let sp = self.regs.a(7).wrapping_sub(4);
        let value = if reg == 7 { sp } else { self.regs.a(reg as usize) };
        self.write_mem(bus, Size::Long, sp, value)?;
        self.regs.set_a(7, sp);
        self.regs.set_a(reg as usize, sp);
        self.regs.set_a(7, sp.wrapping_add(disp));
        Ok(())
    }

    pub(crate) fn exec_unlk<B: M68kBus>(&mut self, bus: &mut B, reg: u8) -> Result<(), Fault> {
        let frame = self.regs.a(reg as usize);
        let value = self.read_mem(bus, Size::Long, frame)?;
        self.regs.set_a(7, frame.wrapping_add(4));
        self.regs.set_a(reg as usize, value);
        Ok(())
    }

    /// MOVE from SR is privileged from the 68010 on.
    pub(crate) fn exec_move_from_sr<B: M68kBus>(&mut self, bus: &mut B, dst: AddrMode) -> Result<(), Fault> {
        if self.caps.vbr {
            self.require_supervisor()?;
        }
        let ea = self.resolve(bus, dst, Size::Word)?;
        self.write_ea(bus, ea, Size::Word, u32::from(self.regs.sr))
    }

    pub(crate) fn exec_move_from_ccr<B: M68kBus>(&mut self, bus: &mut B, dst: AddrMode) -> Result<(), Fault> {
        let ea = self.resolve(bus, dst, Size::Word)?;
        self.write_ea(bus, ea, Size::Word, u32::from(self.regs.ccr()))
    }

    pub(crate) fn exec_move_to_ccr<B: M68kBus>(&mut self, bus: &mut B, src: AddrMode) -> Result<(), Fault> {
        let value = self.read_operand(bus, src, Size::Word)?;
        self.regs.set_ccr(value as u8);
        Ok(())
    }

    pub(crate) fn exec_move_to_sr<B: M68kBus>(&mut self, bus: &mut B, src: AddrMode) -> Result<(), Fault> {
        self.require_supervisor()?;
        let value = self.read_operand(bus, src, Size::Word)?;
        self.set_sr_masked(value as u16);
        Ok(())
    }

    pub(crate) fn exec_move_usp(&mut self, reg: u8, to_usp: bool) -> Result<(), Fault> {
        self.require_supervisor()?;
        if to_usp {
            self.regs.usp = self.regs.a(reg as usize);
        } else {
            self.regs.set_a(reg as usize, self.regs.usp);
        }
        Ok(())
    }

    /// MOVEC (privileged). Unknown control register codes for the model
    /// are illegal instructions.
    pub(crate) fn exec_movec<B: M68kBus>(&mut self, bus: &mut B, to_control: bool) -> Result<(), Fault> {
        self.require_supervisor()?;
        let ext = self.fetch_word(bus)?;
        let code = ext & 0x0FFF;
        if !self.control_register_exists(code) {
            return Err(Fault::Exception(vector::ILLEGAL_INSTRUCTION));
        }
        let reg = ((ext >> 12) & 0xF) as usize;

        if to_control {
            let value = self.movem_register(reg);
            match code {
                control::SFC => self.regs.sfc = (value & 7) as u8,
                control::DFC => self.regs.dfc = (value & 7) as u8,
                control::CACR => self.regs.cacr = value & self.model.cacr_mask(),
                control::USP => self.regs.usp = value,
                control::VBR => self.regs.vbr = value,
                control::CAAR => self.regs.caar = value,
                control::MSP => self.regs.msp = value,
                control::ISP => self.regs.isp = value,
                _ => debug!("MOVEC write to MMU register {code:03X} ignored"),
            }
        } else {
            let value = match code {
                control::SFC => u32::from(self.regs.sfc),
                control::DFC => u32::from(self.regs.dfc),
                control::CACR => self.regs.cacr,
                control::USP => self.regs.usp,
                control::VBR => self.regs.vbr,
                control::CAAR => self.regs.caar,
                control::MSP => self.regs.msp,
                control::ISP => self.regs.isp,
                _ => 0,
            };
            self.set_numbered(reg, value);
        }
        Ok(())
    }

    fn control_register_exists(&self, code: u16) -> bool {
        match code {
            control::SFC | control::DFC | control::USP | control::VBR => self.caps.movec,
            control::CACR => self.caps.cacr,
            control::CAAR => self.caps.caar,
            control::MSP | control::ISP => self.caps.master_state,
            control::TC..=control::DTT1 | control::MMUSR..=control::SRP => self.model == CpuModel::M68040,
            _ => false,
        }
    }

    /// MOVES (privileged): memory access in the SFC/DFC address space.
    pub(crate) fn exec_moves<B: M68kBus>(&mut self, bus: &mut B, size: Size, mode: AddrMode) -> Result<(), Fault> {
        self.require_supervisor()?;
        let ext = self.fetch_word(bus)?;
        let reg = ((ext >> 12) & 0xF) as usize;
        let addr = self.effective_address(bus, mode, size)?;

        if ext & 0x0800 != 0 {
            let value = self.movem_register(reg);
            let fc = FunctionCode::from_bits(self.regs.dfc);
            self.write_mem_fc(bus, size, addr, value, fc)
        } else {
            let fc = FunctionCode::from_bits(self.regs.sfc);
            let value = self.read_mem_fc(bus, size, addr, fc)?;
            if reg < 8 {
                self.write_ea(bus, Ea::DataReg(reg as u8), size, value)
            } else {
                self.regs.set_a(reg - 8, size.sign_extend(value));
                Ok(())
            }
        }
    }

    /// MOVE16: copy one 16-byte aligned line.
    pub(crate) fn exec_move16<B: M68kBus>(&mut self, bus: &mut B, opcode: u16) -> Result<(), Fault> {
        let ax = (opcode & 7) as usize;
        let (src, dst) = if opcode & 0xFFF8 == 0xF620 {
            let ext = self.fetch_word(bus)?;
            let ay = ((ext >> 12) & 7) as usize;
            let src = self.regs.a(ax);
            let dst = self.regs.a(ay);
            self.regs.set_a(ax, src.wrapping_add(16));
            if ay != ax {
                self.regs.set_a(ay, dst.wrapping_add(16));
            }
            (src, dst)
        } else {
            let abs = self.fetch_long(bus)?;
            let ay = self.regs.a(ax);
            if opcode & 0x10 == 0 {
                self.regs.set_a(ax, ay.wrapping_add(16));
            }
            if opcode & 0x08 == 0 { (ay, abs) } else { (abs, ay) }
        };

        let src = src & !0xF;
        let dst = dst & !0xF;
        for i in 0..4 {
            let value = self.read_mem(bus, Size::Long, src.wrapping_add(4 * i))?;
            self.write_mem(bus, Size::Long, dst.wrapping_add(4 * i), value)?;
        }
        Ok(())
    }

    /// RESET (privileged): assert the reset line for external devices.
    pub(crate) fn exec_reset<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        self.require_supervisor()?;
        debug!("RESET instruction at {:08X}", self.regs.ppc);
        bus.reset();
        Ok(())
    }

    /// STOP #imm (privileged): load SR and wait for an interrupt.
    pub(crate) fn exec_stop<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        self.require_supervisor()?;
        let sr = self.fetch_word(bus)?;
        self.set_sr_masked(sr);
        self.state = State::Stopped;
        Ok(())
    }
}

