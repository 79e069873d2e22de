//! Exception processing: faults, stack frames, interrupts and RTE.
//!
//! Every exception goes through the same entry sequence: snapshot SR, set S,
//! clear T1/T0, push a frame whose shape depends only on the frame family
//! and the vector, then load PC from the vector table. Bus and address
//! errors (group 0) are special: a second one while the first frame is
//! being built, or before the handler completes its first instruction,
//! halts the CPU.

use log::{debug, warn};
use thiserror::Error;

use crate::alu::Size;
use crate::bus::{FunctionCode, InterruptAck, M68kBus};
use crate::cpu::{Cpu68000, State};
use crate::flags::{M, S, T0, T1};
use crate::model::FrameFamily;
use crate::timing;

/// Vector numbers used by the core.
pub mod vector {
    pub const BUS_ERROR: u8 = 2;
    pub const ADDRESS_ERROR: u8 = 3;
    pub const ILLEGAL_INSTRUCTION: u8 = 4;
    pub const ZERO_DIVIDE: u8 = 5;
    pub const CHK: u8 = 6;
    pub const TRAPV: u8 = 7;
    pub const PRIVILEGE_VIOLATION: u8 = 8;
    pub const TRACE: u8 = 9;
    pub const LINE_A: u8 = 10;
    pub const LINE_F: u8 = 11;
    pub const FORMAT_ERROR: u8 = 14;
    pub const UNINITIALIZED_INTERRUPT: u8 = 15;
    pub const SPURIOUS_INTERRUPT: u8 = 24;
    pub const AUTOVECTOR_BASE: u8 = 24;
    pub const TRAP_BASE: u8 = 32;
}

/// Details of a failed bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessFault {
    pub addr: u32,
    pub fc: FunctionCode,
    pub read: bool,
    /// The access was an instruction stream fetch.
    pub instruction: bool,
    pub size: Size,
    /// Data being written, 0 for reads.
    pub value: u32,
}

/// Why an instruction was abandoned. Carried through `Result` from the
/// access that failed up to `execute`, which turns it into an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Bus error (vector 2).
    Bus(AccessFault),
    /// Address error (vector 3).
    Address(AccessFault),
    /// Exception whose stacked PC is the faulting instruction.
    Exception(u8),
    /// Exception whose stacked PC is the next instruction.
    Trap(u8),
}

/// Bus/address error recovery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultState {
    #[default]
    Normal,
    /// A group 0 frame is being written.
    BuildingFrame,
    /// The frame is written; the handler's first instruction has not
    /// completed yet.
    Recovering,
}

/// Errors returned by [`Cpu68000::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecuteError {
    /// A bus or address error occurred while a previous one was being
    /// processed. The CPU is now halted.
    #[error("double bus fault at {address:#010X} (instruction at {pc:#010X})")]
    DoubleFault { address: u32, pc: u32 },
    /// The CPU is halted and must be reset.
    #[error("CPU is halted")]
    Halted,
}

/// Stack frame layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// 68000 group 1/2: SR, PC.
    Short,
    /// 68000 bus/address error: access info, fault address, IR, SR, PC.
    Group0,
    /// Four-word frame with format word.
    Format0,
    /// Throwaway frame on the interrupt stack.
    Format1,
    /// Six-word frame with the instruction address.
    Format2,
    /// 68040 access error frame.
    Format7,
    /// 68010 bus/address error frame.
    Format8,
    /// 68020/68030 long bus cycle fault frame.
    FormatB,
}

impl FrameFormat {
    /// Frame layout a `family` CPU uses for `vector`.
    #[must_use]
    pub const fn for_vector(family: FrameFamily, vector: u8) -> Self {
        let group0 = matches!(vector, vector::BUS_ERROR | vector::ADDRESS_ERROR);
        let with_address = matches!(
            vector,
            vector::ZERO_DIVIDE | vector::CHK | vector::TRAPV | vector::TRACE
        );
        match family {
            FrameFamily::M68000 if group0 => Self::Group0,
            FrameFamily::M68000 => Self::Short,
            FrameFamily::M68010 if group0 => Self::Format8,
            FrameFamily::M68010 => Self::Format0,
            FrameFamily::M68020 if group0 => Self::FormatB,
            FrameFamily::M68040 if group0 => Self::Format7,
            FrameFamily::M68020 | FrameFamily::M68040 if with_address => Self::Format2,
            FrameFamily::M68020 | FrameFamily::M68040 => Self::Format0,
        }
    }

    /// Frame size in 16-bit words.
    #[must_use]
    pub const fn words(self) -> u32 {
        match self {
            Self::Short => 3,
            Self::Group0 => 7,
            Self::Format0 | Self::Format1 => 4,
            Self::Format2 => 6,
            Self::Format7 => 30,
            Self::Format8 => 29,
            Self::FormatB => 46,
        }
    }

    /// Format nibble stored in the format/vector word.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Short | Self::Group0 | Self::Format0 => 0x0,
            Self::Format1 => 0x1,
            Self::Format2 => 0x2,
            Self::Format7 => 0x7,
            Self::Format8 => 0x8,
            Self::FormatB => 0xB,
        }
    }
}

/// Extra words after the format word that RTE discards, or `None` for a
/// format it cannot unwind.
const fn rte_extra_words(code: u16) -> Option<u32> {
    match code {
        0x0 => Some(0),
        0x2 => Some(2),
        0x7 => Some(26),
        0x8 => Some(25),
        0xA => Some(12),
        0xB => Some(42),
        _ => None,
    }
}

impl Cpu68000 {
    /// Turn a fault raised during an instruction into exception processing.
    pub(crate) fn process_fault<B: M68kBus>(
        &mut self,
        bus: &mut B,
        fault: Fault,
    ) -> Result<(), ExecuteError> {
        match fault {
            Fault::Bus(access) | Fault::Address(access) => {
                if self.fault_state != FaultState::Normal {
                    return Err(self.double_fault(access.addr));
                }
                let vector = if matches!(fault, Fault::Bus(_)) {
                    vector::BUS_ERROR
                } else {
                    vector::ADDRESS_ERROR
                };
                self.fault_state = FaultState::BuildingFrame;
                match self.group0_exception(bus, vector, &access) {
                    Ok(()) => {
                        self.fault_state = FaultState::Recovering;
                        Ok(())
                    }
                    Err(Fault::Bus(second) | Fault::Address(second)) => Err(self.double_fault(second.addr)),
                    Err(_) => Err(self.double_fault(access.addr)),
                }
            }
            Fault::Exception(v) => {
                let pc = self.regs.ppc;
                self.exception_or_fault(bus, v, pc)
            }
            Fault::Trap(v) => {
                let pc = self.regs.pc;
                self.exception_or_fault(bus, v, pc)
            }
        }
    }

    /// Group 1/2 exception; an access fault while stacking becomes a bus or
    /// address error of its own.
    fn exception_or_fault<B: M68kBus>(&mut self, bus: &mut B, vector: u8, pc: u32) -> Result<(), ExecuteError> {
        match self.exception(bus, vector, pc) {
            Ok(()) => Ok(()),
            Err(fault @ (Fault::Bus(_) | Fault::Address(_))) => self.process_fault(bus, fault),
            Err(_) => Err(self.double_fault(self.regs.a(7))),
        }
    }

    fn double_fault(&mut self, address: u32) -> ExecuteError {
        warn!("double bus fault at {address:#010X}, pc {:#010X}: CPU halted", self.regs.ppc);
        self.state = State::Halted;
        ExecuteError::DoubleFault {
            address,
            pc: self.regs.ppc,
        }
    }

    /// Snapshot SR, enter supervisor state and clear trace. Returns the old
    /// SR.
    fn enter_supervisor(&mut self) -> u16 {
        let old = self.regs.sr;
        self.set_sr_masked((old | S) & !(T1 | T0));
        old
    }

    /// Group 1/2 exception with `return_pc` stacked.
    pub(crate) fn exception<B: M68kBus>(&mut self, bus: &mut B, vec: u8, return_pc: u32) -> Result<(), Fault> {
        let format = FrameFormat::for_vector(self.caps.frames, vec);
        debug!(
            "exception {vec} at {:#010X}, frame {format:?}, return {return_pc:#010X}",
            self.regs.ppc
        );
        let old_sr = self.enter_supervisor();
        self.state = State::Running;
        self.push_frame(bus, format, vec, old_sr, return_pc, None)?;
        self.cycles += timing::exception_cycles(self.model, vec);
        self.load_vector(bus, vec)
    }

    fn group0_exception<B: M68kBus>(&mut self, bus: &mut B, vec: u8, access: &AccessFault) -> Result<(), Fault> {
        let format = FrameFormat::for_vector(self.caps.frames, vec);
        debug!(
            "{} at {:#010X} ({}), frame {format:?}",
            if vec == vector::BUS_ERROR { "bus error" } else { "address error" },
            access.addr,
            if access.read { "read" } else { "write" },
        );
        let old_sr = self.enter_supervisor();
        self.state = State::Running;
        let return_pc = if format == FrameFormat::Group0 {
            self.regs.ppc.wrapping_add(2)
        } else {
            self.regs.ppc
        };
        self.push_frame(bus, format, vec, old_sr, return_pc, Some(access))?;
        self.cycles += timing::exception_cycles(self.model, vec);
        self.load_vector(bus, vec)
    }

    /// Take an interrupt at `level`.
    pub(crate) fn interrupt<B: M68kBus>(&mut self, bus: &mut B, level: u8) -> Result<(), Fault> {
        let vec = match bus.interrupt_ack(level) {
            InterruptAck::Vector(n) => n,
            InterruptAck::Autovector => vector::AUTOVECTOR_BASE + level,
            InterruptAck::Spurious => vector::SPURIOUS_INTERRUPT,
        };
        debug!("interrupt level {level}, vector {vec}");
        let old_sr = self.enter_supervisor();
        self.regs.set_interrupt_mask(level);
        self.state = State::Running;
        let pc = self.regs.pc;
        let format = if self.caps.frames == FrameFamily::M68000 {
            FrameFormat::Short
        } else {
            FrameFormat::Format0
        };
        self.push_frame(bus, format, vec, old_sr, pc, None)?;
        if self.caps.master_state && self.regs.is_master() {
            self.set_sr_masked(self.regs.sr & !M);
            self.push_frame(bus, FrameFormat::Format1, vec, old_sr | S, pc, None)?;
        }
        self.cycles += timing::INTERRUPT_CYCLES;
        self.load_vector(bus, vec)
    }

    /// Write an exception frame on the active stack.
    fn push_frame<B: M68kBus>(
        &mut self,
        bus: &mut B,
        format: FrameFormat,
        vec: u8,
        sr: u16,
        pc: u32,
        access: Option<&AccessFault>,
    ) -> Result<(), Fault> {
        let mut words = vec![0u16; format.words() as usize];
        let format_word = (format.code() << 12) | (u16::from(vec) << 2);
        match format {
            FrameFormat::Group0 => {
                if let Some(a) = access {
                    let rw = if a.read { 0x10 } else { 0 };
                    let in_ = if a.instruction { 0 } else { 0x08 };
                    words[0] = (self.ir & 0xFFE0) | rw | in_ | u16::from(a.fc.bits());
                    words[1] = (a.addr >> 16) as u16;
                    words[2] = a.addr as u16;
                }
                words[3] = self.ir;
                words[4] = sr;
                words[5] = (pc >> 16) as u16;
                words[6] = pc as u16;
            }
            _ => {
                words[0] = sr;
                words[1] = (pc >> 16) as u16;
                words[2] = pc as u16;
                if format != FrameFormat::Short {
                    words[3] = format_word;
                }
            }
        }
        let ppc = self.regs.ppc;
        match format {
            FrameFormat::Format2 => {
                words[4] = (ppc >> 16) as u16;
                words[5] = ppc as u16;
            }
            FrameFormat::Format8 => {
                if let Some(a) = access {
                    let mut ssw = u16::from(a.fc.bits());
                    if a.instruction {
                        ssw |= 1 << 13;
                    } else {
                        ssw |= 1 << 12;
                    }
                    if a.read {
                        ssw |= 1 << 8;
                    }
                    if a.size == Size::Byte {
                        ssw |= 1 << 9;
                    }
                    words[4] = ssw;
                    words[5] = (a.addr >> 16) as u16;
                    words[6] = a.addr as u16;
                    words[8] = a.value as u16;
                }
            }
            FrameFormat::FormatB => {
                if let Some(a) = access {
                    let size_bits = match a.size {
                        Size::Byte => 1,
                        Size::Word => 2,
                        Size::Long => 0,
                    };
                    let mut ssw = u16::from(a.fc.bits()) | (size_bits << 4);
                    if a.read {
                        ssw |= 1 << 6;
                    }
                    if !a.instruction {
                        ssw |= 1 << 8;
                    }
                    words[5] = ssw;
                    words[8] = (a.addr >> 16) as u16;
                    words[9] = a.addr as u16;
                    words[12] = (a.value >> 16) as u16;
                    words[13] = a.value as u16;
                    let stage_b = ppc.wrapping_add(4);
                    words[18] = (stage_b >> 16) as u16;
                    words[19] = stage_b as u16;
                }
            }
            FrameFormat::Format7 => {
                if let Some(a) = access {
                    let size_bits = match a.size {
                        Size::Long => 0,
                        Size::Byte => 1,
                        Size::Word => 2,
                    };
                    let mut ssw = u16::from(a.fc.bits()) | (size_bits << 5);
                    if a.read {
                        ssw |= 1 << 8;
                    }
                    words[4] = (a.addr >> 16) as u16;
                    words[5] = a.addr as u16;
                    words[6] = ssw;
                    words[10] = (a.addr >> 16) as u16;
                    words[11] = a.addr as u16;
                }
            }
            _ => {}
        }

        let sp = self.regs.a(7).wrapping_sub(format.words() * 2);
        let fc = FunctionCode::SupervisorData;
        for (i, &word) in words.iter().enumerate() {
            self.write_mem_fc(bus, Size::Word, sp.wrapping_add(i as u32 * 2), u32::from(word), fc)?;
        }
        self.regs.set_a(7, sp);
        Ok(())
    }

    /// Load PC from the vector table. An empty entry is replaced by the
    /// uninitialised interrupt vector.
    fn load_vector<B: M68kBus>(&mut self, bus: &mut B, vec: u8) -> Result<(), Fault> {
        let base = if self.caps.vbr { self.regs.vbr } else { 0 };
        let fc = FunctionCode::SupervisorData;
        let mut handler = self.read_mem_fc(bus, Size::Long, base.wrapping_add(u32::from(vec) << 2), fc)?;
        if handler == 0 {
            let entry = base.wrapping_add(u32::from(vector::UNINITIALIZED_INTERRUPT) << 2);
            handler = self.read_mem_fc(bus, Size::Long, entry, fc)?;
        }
        self.jump(bus, handler)
    }

    /// RTE: unwind an exception frame. Unknown formats raise a format error
    /// with the stack untouched.
    pub(crate) fn return_from_exception<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        loop {
            let sp = self.regs.a(7);
            let sr = self.read_mem(bus, Size::Word, sp)? as u16;
            let pc = self.read_mem(bus, Size::Long, sp.wrapping_add(2))?;
            if self.caps.frames == FrameFamily::M68000 {
                self.regs.set_a(7, sp.wrapping_add(6));
                self.set_sr_masked(sr);
                return self.jump(bus, pc);
            }
            let format_word = self.read_mem(bus, Size::Word, sp.wrapping_add(6))? as u16;
            let code = format_word >> 12;
            if code == 0x1 {
                self.regs.set_a(7, sp.wrapping_add(8));
                self.set_sr_masked(sr);
                continue;
            }
            let Some(extra) = rte_extra_words(code) else {
                warn!("RTE with unsupported frame format {code:#X} at {:#010X}", self.regs.ppc);
                return Err(Fault::Exception(vector::FORMAT_ERROR));
            };
            self.regs.set_a(7, sp.wrapping_add(8 + extra * 2));
            self.set_sr_masked(sr);
            return self.jump(bus, pc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_shape_depends_on_family_and_vector() {
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68000, 2), FrameFormat::Group0);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68000, 3).words(), 7);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68000, 5).words(), 3);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68010, 3).words(), 29);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68010, 5), FrameFormat::Format0);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68020, 5), FrameFormat::Format2);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68020, 2).words(), 46);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68040, 2).words(), 30);
        assert_eq!(FrameFormat::for_vector(FrameFamily::M68040, 32), FrameFormat::Format0);
    }

    #[test]
    fn rte_knows_the_frames_it_builds() {
        for format in [
            FrameFormat::Format0,
            FrameFormat::Format2,
            FrameFormat::Format7,
            FrameFormat::Format8,
            FrameFormat::FormatB,
        ] {
            assert_eq!(rte_extra_words(format.code()), Some(format.words() - 4));
        }
        assert_eq!(rte_extra_words(0x3), None);
    }
}
