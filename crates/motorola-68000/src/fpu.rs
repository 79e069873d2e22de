//! Coprocessor interface for the floating-point unit.
//!
//! The CPU owns decode of the F-line opcode and its effective address; the
//! FPU crate does the arithmetic on operand images. Coprocessor id 1 is the
//! FPU. Every other id, and every F-line opcode on a CPU without an FPU,
//! takes the line F exception.

use motorola_68881::{CTRL_FPCR, CTRL_FPIAR, CTRL_FPSR, Command, DataFormat, Fpu, FpuModel};
use softfloat::FloatX80;

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::ea::Ea;
use crate::exceptions::{Fault, vector};

const FPU_ID: u16 = 1;
/// Bytes per data register in memory.
const EXTENDED_BYTES: u32 = 12;

fn line_f() -> Fault {
    Fault::Exception(vector::LINE_F)
}

fn illegal() -> Fault {
    Fault::Exception(vector::ILLEGAL_INSTRUCTION)
}

/// Integer size of a format that fits in a long word.
fn format_size(format: DataFormat) -> Size {
    format_size_for(format.size())
}

impl Cpu68000 {
    fn fpu_mut(&mut self) -> Result<&mut Fpu, Fault> {
        self.fpu.as_mut().ok_or_else(line_f)
    }

    fn opcode_mode(&self) -> Result<AddrMode, Fault> {
        AddrMode::from_opcode(self.ir).ok_or_else(line_f)
    }

    /// Entry point for `1111` opcodes that are not 68040 cache, MMU or
    /// MOVE16 instructions.
    pub(crate) fn exec_line_f<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let op = self.ir;
        if self.fpu.is_none() || (op >> 9) & 7 != FPU_ID {
            return Err(line_f());
        }
        match (op >> 6) & 7 {
            0 => self.fpu_general(bus),
            1 => self.fpu_conditional(bus),
            2 => self.fpu_branch(bus, false),
            3 => self.fpu_branch(bus, true),
            4 => self.fpu_save(bus),
            5 => self.fpu_restore(bus),
            _ => Err(line_f()),
        }
    }

    /// General instructions, selected by the opclass in bits 15-13 of the
    /// command word.
    fn fpu_general<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        match ext >> 13 {
            0b000 => {
                let cmd = self.fpu_command(ext)?;
                let src = ((ext >> 10) & 7) as usize;
                let dst = ((ext >> 7) & 7) as usize;
                let pc = self.regs.ppc;
                let fpu = self.fpu_mut()?;
                fpu.begin_instruction(pc);
                let value = fpu.fp[src];
                fpu.execute(cmd, value, dst);
                Ok(())
            }
            0b010 if ext & 0xFC00 == 0x5C00 => {
                let pc = self.regs.ppc;
                let fpu = self.fpu_mut()?;
                fpu.begin_instruction(pc);
                fpu.move_constant((ext & 0x7F) as u8, ((ext >> 7) & 7) as usize);
                Ok(())
            }
            0b010 => {
                let cmd = self.fpu_command(ext)?;
                let format = DataFormat::from_bits(ext >> 10);
                let dst = ((ext >> 7) & 7) as usize;
                let mode = self.opcode_mode()?;
                let image = self.fp_source_image(bus, mode, format)?;
                let pc = self.regs.ppc;
                let fpu = self.fpu_mut()?;
                fpu.begin_instruction(pc);
                let value = fpu.load_operand(format, image);
                fpu.execute(cmd, value, dst);
                Ok(())
            }
            0b011 => self.fmove_out(bus, ext),
            0b100 => self.fmove_control(bus, ext, false),
            0b101 => self.fmove_control(bus, ext, true),
            0b110 => self.fmovem_data(bus, ext, false),
            _ => self.fmovem_data(bus, ext, true),
        }
    }

    fn fpu_command(&mut self, ext: u16) -> Result<Command, Fault> {
        let on_chip = self.fpu_mut()?.model == FpuModel::Mc68040;
        Command::decode((ext & 0x7F) as u8, on_chip).ok_or_else(line_f)
    }

    /// Address of an FPU memory operand of `bytes` bytes. (An)+ and -(An)
    /// step by the operand size.
    fn fp_operand_address<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode, bytes: u32) -> Result<Ea, Fault> {
        let step = |reg: u8| if reg == 7 && bytes == 1 { 2 } else { bytes };
        let addr = match mode {
            AddrMode::AddrIndPostInc(r) => {
                let addr = self.regs.a(r as usize);
                self.regs.set_a(r as usize, addr.wrapping_add(step(r)));
                addr
            }
            AddrMode::AddrIndPreDec(r) => {
                let addr = self.regs.a(r as usize).wrapping_sub(step(r));
                self.regs.set_a(r as usize, addr);
                addr
            }
            _ => self.effective_address(bus, mode, Size::Long)?,
        };
        Ok(Ea::Memory {
            addr,
            program: matches!(mode, AddrMode::PcDisp | AddrMode::PcIndex),
        })
    }

    /// Fetch a source operand as a big-endian image.
    fn fp_source_image<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode, format: DataFormat) -> Result<[u32; 3], Fault> {
        let bytes = format.size();
        match mode {
            AddrMode::DataReg(r) if format.fits_data_register() => {
                Ok([self.regs.d[r as usize] & format_size(format).mask(), 0, 0])
            }
            AddrMode::DataReg(_) | AddrMode::AddrReg(_) => Err(line_f()),
            AddrMode::Immediate => {
                let mut image = [0u32; 3];
                match bytes {
                    1 => image[0] = u32::from(self.fetch_word(bus)?) & 0xFF,
                    2 => image[0] = u32::from(self.fetch_word(bus)?),
                    _ => {
                        for word in image.iter_mut().take((bytes / 4) as usize) {
                            *word = self.fetch_long(bus)?;
                        }
                    }
                }
                Ok(image)
            }
            _ => {
                let ea = self.fp_operand_address(bus, mode, bytes)?;
                self.read_fp_image(bus, ea, bytes)
            }
        }
    }

    fn read_fp_image<B: M68kBus>(&mut self, bus: &mut B, ea: Ea, bytes: u32) -> Result<[u32; 3], Fault> {
        let mut image = [0u32; 3];
        if bytes < 4 {
            image[0] = self.read_ea(bus, ea, format_size_for(bytes))?;
            return Ok(image);
        }
        let Ea::Memory { addr, program } = ea else {
            return Err(illegal());
        };
        for (i, word) in image.iter_mut().take((bytes / 4) as usize).enumerate() {
            let at = Ea::Memory {
                addr: addr.wrapping_add(4 * i as u32),
                program,
            };
            *word = self.read_ea(bus, at, Size::Long)?;
        }
        Ok(image)
    }

    fn write_fp_image<B: M68kBus>(&mut self, bus: &mut B, addr: u32, image: [u32; 3], bytes: u32) -> Result<(), Fault> {
        if bytes < 4 {
            return self.write_mem(bus, format_size_for(bytes), addr, image[0]);
        }
        for (i, word) in image.iter().take((bytes / 4) as usize).enumerate() {
            self.write_mem(bus, Size::Long, addr.wrapping_add(4 * i as u32), *word)?;
        }
        Ok(())
    }

    /// FMOVE FPn,<ea> in any of the eight formats.
    fn fmove_out<B: M68kBus>(&mut self, bus: &mut B, ext: u16) -> Result<(), Fault> {
        let format = DataFormat::from_bits(ext >> 10);
        let src = ((ext >> 7) & 7) as usize;
        let k_factor = match format {
            // Seven-bit signed k-factor.
            DataFormat::Packed => ((ext as u8) << 1) as i8 >> 1,
            DataFormat::PackedDynamic => ((self.regs.d[((ext >> 4) & 7) as usize] as u8) << 1) as i8 >> 1,
            _ => 0,
        };
        let mode = self.opcode_mode()?;
        if !mode.is_data_alterable() {
            return Err(line_f());
        }
        let pc = self.regs.ppc;

        if let AddrMode::DataReg(r) = mode {
            if !format.fits_data_register() {
                return Err(line_f());
            }
            let fpu = self.fpu_mut()?;
            fpu.begin_instruction(pc);
            let image = fpu.store_operand(format, src, k_factor);
            return self.write_ea(bus, Ea::DataReg(r), format_size(format), image[0]);
        }

        let bytes = format.size();
        let Ea::Memory { addr, .. } = self.fp_operand_address(bus, mode, bytes)? else {
            return Err(illegal());
        };
        let fpu = self.fpu_mut()?;
        fpu.begin_instruction(pc);
        let image = fpu.store_operand(format, src, k_factor);
        self.write_fp_image(bus, addr, image, bytes)
    }

    fn control_register(&self, select: u16) -> u32 {
        let Some(fpu) = self.fpu.as_ref() else {
            return 0;
        };
        match select {
            CTRL_FPCR => fpu.fpcr,
            CTRL_FPSR => fpu.fpsr,
            _ => fpu.fpiar,
        }
    }

    fn set_control_register(&mut self, select: u16, value: u32) -> Result<(), Fault> {
        let fpu = self.fpu_mut()?;
        match select {
            CTRL_FPCR => fpu.set_fpcr(value),
            CTRL_FPSR => fpu.set_fpsr(value),
            _ => fpu.fpiar = value,
        }
        Ok(())
    }

    /// FMOVE/FMOVEM of FPCR, FPSR and FPIAR. Memory holds the selected
    /// registers in that order.
    fn fmove_control<B: M68kBus>(&mut self, bus: &mut B, ext: u16, to_memory: bool) -> Result<(), Fault> {
        let list = (ext >> 10) & 7;
        if list == 0 {
            return Err(line_f());
        }
        let selected = [CTRL_FPCR, CTRL_FPSR, CTRL_FPIAR].into_iter().filter(move |bit| list & bit != 0);
        let count = list.count_ones();
        let mode = self.opcode_mode()?;

        match mode {
            AddrMode::DataReg(r) if count == 1 => {
                if to_memory {
                    self.regs.d[r as usize] = self.control_register(list);
                    Ok(())
                } else {
                    self.set_control_register(list, self.regs.d[r as usize])
                }
            }
            AddrMode::AddrReg(r) if list == CTRL_FPIAR => {
                if to_memory {
                    self.regs.set_a(r as usize, self.control_register(list));
                    Ok(())
                } else {
                    self.set_control_register(list, self.regs.a(r as usize))
                }
            }
            AddrMode::DataReg(_) | AddrMode::AddrReg(_) => Err(line_f()),
            AddrMode::Immediate if !to_memory => {
                for select in selected {
                    let value = self.fetch_long(bus)?;
                    self.set_control_register(select, value)?;
                }
                Ok(())
            }
            AddrMode::Immediate => Err(line_f()),
            _ => {
                if to_memory && !mode.is_alterable() {
                    return Err(line_f());
                }
                let Ea::Memory { addr, program } = self.fp_operand_address(bus, mode, 4 * count)? else {
                    return Err(illegal());
                };
                for (i, select) in selected.enumerate() {
                    let at = Ea::Memory {
                        addr: addr.wrapping_add(4 * i as u32),
                        program,
                    };
                    if to_memory {
                        let value = self.control_register(select);
                        self.write_ea(bus, at, Size::Long, value)?;
                    } else {
                        let value = self.read_ea(bus, at, Size::Long)?;
                        self.set_control_register(select, value)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// FMOVEM of data registers. In predecrement mode list bit n selects
    /// FPn; otherwise bit 7 selects FP0. Memory always holds the lowest
    /// numbered register first, twelve bytes each.
    fn fmovem_data<B: M68kBus>(&mut self, bus: &mut B, ext: u16, to_memory: bool) -> Result<(), Fault> {
        let predecrement_list = ext & 0x1000 == 0;
        let list = if ext & 0x0800 != 0 {
            self.regs.d[((ext >> 4) & 7) as usize] as u8
        } else {
            ext as u8
        };
        let selected = move |reg: usize| {
            if predecrement_list {
                list & (1 << reg) != 0
            } else {
                list & (0x80 >> reg) != 0
            }
        };
        let count = list.count_ones();
        let mode = self.opcode_mode()?;

        let (start, program) = match mode {
            AddrMode::AddrIndPreDec(r) if to_memory && predecrement_list => {
                let start = self.regs.a(r as usize).wrapping_sub(EXTENDED_BYTES * count);
                self.regs.set_a(r as usize, start);
                (start, false)
            }
            AddrMode::AddrIndPostInc(r) if !to_memory && !predecrement_list => {
                let start = self.regs.a(r as usize);
                self.regs.set_a(r as usize, start.wrapping_add(EXTENDED_BYTES * count));
                (start, false)
            }
            m if m.is_control() && !predecrement_list && (!to_memory || m.is_alterable()) => {
                (self.control_address(bus, m)?, matches!(m, AddrMode::PcDisp | AddrMode::PcIndex))
            }
            _ => return Err(line_f()),
        };

        let mut addr = start;
        for reg in (0..8).filter(|&reg| selected(reg)) {
            if to_memory {
                let value = self.fpu_mut()?.fp[reg];
                let image = [u32::from(value.high) << 16, (value.low >> 32) as u32, value.low as u32];
                self.write_fp_image(bus, addr, image, EXTENDED_BYTES)?;
            } else {
                let [hi, mid, lo] = self.read_fp_image(bus, Ea::Memory { addr, program }, EXTENDED_BYTES)?;
                let value = FloatX80::new((hi >> 16) as u16, (u64::from(mid) << 32) | u64::from(lo));
                self.fpu_mut()?.fp[reg] = value;
            }
            addr = addr.wrapping_add(EXTENDED_BYTES);
        }
        Ok(())
    }

    /// Evaluate a predicate from a condition extension word.
    fn fpu_predicate(&mut self, predicate: u16) -> Result<bool, Fault> {
        self.fpu_mut()?.test_condition((predicate & 0x3F) as u8).ok_or_else(line_f)
    }

    /// FScc, FDBcc and FTRAPcc.
    fn fpu_conditional<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        let op = self.ir;
        let ext = self.fetch_word(bus)?;
        let reg = (op & 7) as u8;
        match (op >> 3) & 7 {
            // FDBcc
            1 => {
                let base = self.regs.pc;
                let disp = self.fetch_word(bus)? as i16 as i32 as u32;
                if self.fpu_predicate(ext)? {
                    return Ok(());
                }
                let dn = &mut self.regs.d[reg as usize];
                let counter = (*dn as u16).wrapping_sub(1);
                *dn = (*dn & 0xFFFF_0000) | u32::from(counter);
                if counter == 0xFFFF {
                    Ok(())
                } else {
                    self.jump(bus, base.wrapping_add(disp))
                }
            }
            // FTRAPcc with a word, long or no operand.
            7 if (2..=4).contains(&reg) => {
                match reg {
                    2 => {
                        self.fetch_word(bus)?;
                    }
                    3 => {
                        self.fetch_long(bus)?;
                    }
                    _ => {}
                }
                if self.fpu_predicate(ext)? {
                    Err(Fault::Trap(vector::TRAPV))
                } else {
                    Ok(())
                }
            }
            _ => {
                let mode = self.opcode_mode()?;
                if !mode.is_data_alterable() {
                    return Err(line_f());
                }
                let ea = self.resolve(bus, mode, Size::Byte)?;
                let set = self.fpu_predicate(ext)?;
                self.write_ea(bus, ea, Size::Byte, if set { 0xFF } else { 0 })
            }
        }
    }

    /// FBcc with a word or long displacement. FNOP is FBF.W *+2.
    fn fpu_branch<B: M68kBus>(&mut self, bus: &mut B, long: bool) -> Result<(), Fault> {
        let base = self.regs.pc;
        let disp = if long {
            self.fetch_long(bus)?
        } else {
            self.fetch_word(bus)? as i16 as i32 as u32
        };
        if self.fpu_predicate(self.ir)? {
            self.jump(bus, base.wrapping_add(disp))
        } else {
            Ok(())
        }
    }

    /// FSAVE (privileged).
    fn fpu_save<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        self.require_supervisor()?;
        let frame = self.fpu_mut()?.save_frame();
        let bytes = 4 * frame.len() as u32;
        let mode = self.opcode_mode()?;
        let start = match mode {
            AddrMode::AddrIndPreDec(r) => {
                let start = self.regs.a(r as usize).wrapping_sub(bytes);
                self.regs.set_a(r as usize, start);
                start
            }
            m if m.is_control_alterable() => self.control_address(bus, m)?,
            _ => return Err(line_f()),
        };
        for (i, word) in frame.iter().enumerate() {
            self.write_mem(bus, Size::Long, start.wrapping_add(4 * i as u32), *word)?;
        }
        Ok(())
    }

    /// FRESTORE (privileged). An unknown frame is a format error.
    fn fpu_restore<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        self.require_supervisor()?;
        let mode = self.opcode_mode()?;
        let addr = match mode {
            AddrMode::AddrIndPostInc(r) => self.regs.a(r as usize),
            m if m.is_control() => self.control_address(bus, m)?,
            _ => return Err(line_f()),
        };
        let header = self.read_mem(bus, Size::Long, addr)?;
        let size = self
            .fpu_mut()?
            .restore_frame(header)
            .map_err(|_| Fault::Exception(vector::FORMAT_ERROR))?;
        if let AddrMode::AddrIndPostInc(r) = mode {
            self.regs.set_a(r as usize, addr.wrapping_add(4 + size));
        }
        Ok(())
    }
}

fn format_size_for(bytes: u32) -> Size {
    match bytes {
        1 => Size::Byte,
        2 => Size::Word,
        _ => Size::Long,
    }
}
