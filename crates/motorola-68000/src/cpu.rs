//! Motorola 680x0 CPU core.
//!
//! The core is instruction-level: each call to [`Cpu68000::execute`] takes
//! a pending interrupt or runs one instruction to completion and returns
//! the cycles it took. Memory accesses return `Result`, so a bus or address
//! error abandons the instruction at the access that failed; register
//! updates made before that point (post-increment, pre-decrement) stay.
//!
//! ## Prefetch
//!
//! An optional one-word prefetch cache holds the word after the last
//! fetched one. When enabled, code that overwrites the next instruction
//! still executes the stale copy, as on hardware. Any non-sequential PC
//! write invalidates it.

use emu_core::{Observable, Ticks, Value};
use log::{trace, warn};
use motorola_68881::Fpu;

use crate::alu::Size;
use crate::bus::{FunctionCode, M68kBus};
use crate::decode::decode;
use crate::exceptions::{AccessFault, ExecuteError, Fault, FaultState, vector};
use crate::flags::{C, M, N, S, T0, T1, V, X, Z};
use crate::model::{CpuCapabilities, CpuModel};
use crate::registers::{Register, Registers};
use crate::timing;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Normal execution.
    Running,
    /// STOP executed, waiting for an interrupt.
    Stopped,
    /// Halted after a double bus fault.
    Halted,
}

/// Motorola 680x0 CPU.
#[derive(Debug, Clone)]
pub struct Cpu68000 {
    // === Registers ===
    pub regs: Registers,
    /// Attached FPU, present when the model has one.
    pub fpu: Option<Fpu>,

    // === Configuration ===
    pub(crate) model: CpuModel,
    pub(crate) caps: CpuCapabilities,
    pub(crate) address_mask: u32,
    sr_mask: u16,

    // === Execution state ===
    /// Opcode of the current instruction.
    pub(crate) ir: u16,
    pub(crate) state: State,
    pub(crate) fault_state: FaultState,
    /// Interrupt level seen on the previous call, for level 7 edges.
    prev_level: u8,
    /// Set by any non-sequential PC write during the current instruction.
    pub(crate) flow_changed: bool,

    // === Prefetch ===
    prefetch_enabled: bool,
    /// Address and contents of the prefetched word.
    prefetch: Option<(u32, u16)>,

    // === Timing ===
    /// Cycles consumed by the current `execute` call.
    pub(crate) cycles: u32,
    total_cycles: Ticks,
}

impl Default for Cpu68000 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu68000 {
    /// Create a 68000 in reset state.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_model(CpuModel::M68000)
    }

    /// Create a CPU of the given model in reset state.
    #[must_use]
    pub fn new_with_model(model: CpuModel) -> Self {
        let caps = model.capabilities();
        Self {
            regs: Registers::new(),
            fpu: caps.fpu.map(Fpu::new),
            model,
            caps,
            address_mask: model.address_mask(),
            sr_mask: model.sr_mask(),
            ir: 0,
            state: State::Running,
            fault_state: FaultState::Normal,
            prev_level: 0,
            flow_changed: false,
            prefetch_enabled: false,
            prefetch: None,
            cycles: 0,
            total_cycles: Ticks::ZERO,
        }
    }

    /// Switch CPU model. Registers are kept; SR is re-masked, the address
    /// mask follows the new bus width and the FPU is attached or removed.
    pub fn set_cpu_type(&mut self, model: CpuModel) {
        self.model = model;
        self.caps = model.capabilities();
        self.address_mask = model.address_mask();
        self.sr_mask = model.sr_mask();
        self.fpu = match (self.caps.fpu, self.fpu.take()) {
            (Some(wanted), Some(fpu)) if fpu.model == wanted => Some(fpu),
            (Some(wanted), _) => Some(Fpu::new(wanted)),
            (None, _) => None,
        };
        if !self.caps.master_state && self.regs.is_master() {
            self.regs.isp = self.regs.msp;
        }
        self.set_sr_masked(self.regs.sr);
        self.prefetch = None;
    }

    #[must_use]
    pub const fn model(&self) -> CpuModel {
        self.model
    }

    #[must_use]
    pub const fn capabilities(&self) -> CpuCapabilities {
        self.caps
    }

    /// Hardware reset: SSP from address 0, PC from address 4.
    pub fn reset<B: M68kBus>(&mut self, bus: &mut B) {
        let fc = FunctionCode::SupervisorProgram;
        let ssp = bus.read(Size::Long, 0, fc);
        let pc = bus.read(Size::Long, 4, fc);
        if ssp.bus_error || pc.bus_error {
            warn!("bus error reading the reset vectors");
        }
        self.reset_to(ssp.data, pc.data);
    }

    /// Reset with explicit initial stack pointer and program counter.
    pub fn reset_to(&mut self, ssp: u32, pc: u32) {
        self.regs = Registers::new();
        self.regs.isp = ssp;
        self.regs.pc = pc;
        self.regs.ppc = pc;
        if let Some(fpu) = self.fpu.as_mut() {
            fpu.reset();
        }
        self.ir = 0;
        self.state = State::Running;
        self.fault_state = FaultState::Normal;
        self.prev_level = 0;
        self.flow_changed = false;
        self.prefetch = None;
    }

    /// Enable or disable the one-word prefetch cache.
    pub fn set_prefetch(&mut self, enabled: bool) {
        self.prefetch_enabled = enabled;
        self.prefetch = None;
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// True after STOP until an interrupt is taken.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == State::Stopped
    }

    /// Get total elapsed cycles.
    #[must_use]
    pub const fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    // === Register access ===

    #[must_use]
    pub const fn sr(&self) -> u16 {
        self.regs.sr
    }

    /// Write SR through the model mask. The live A7 follows S and M.
    pub fn set_sr(&mut self, value: u16) {
        self.set_sr_masked(value);
    }

    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.regs.pc
    }

    /// Set PC, as a jump: the prefetch cache is invalidated.
    pub fn set_pc(&mut self, pc: u32) {
        self.regs.pc = pc;
        self.prefetch = None;
    }

    /// Read a register by name.
    #[must_use]
    pub fn register(&self, reg: Register) -> u32 {
        match reg {
            Register::D0 => self.regs.d[0],
            Register::D1 => self.regs.d[1],
            Register::D2 => self.regs.d[2],
            Register::D3 => self.regs.d[3],
            Register::D4 => self.regs.d[4],
            Register::D5 => self.regs.d[5],
            Register::D6 => self.regs.d[6],
            Register::D7 => self.regs.d[7],
            Register::A0 => self.regs.a(0),
            Register::A1 => self.regs.a(1),
            Register::A2 => self.regs.a(2),
            Register::A3 => self.regs.a(3),
            Register::A4 => self.regs.a(4),
            Register::A5 => self.regs.a(5),
            Register::A6 => self.regs.a(6),
            Register::A7 | Register::Sp => self.regs.a(7),
            Register::Pc => self.regs.pc,
            Register::Ppc => self.regs.ppc,
            Register::Sr => u32::from(self.regs.sr),
            Register::Usp => self.regs.usp,
            Register::Isp => self.regs.isp,
            Register::Msp => self.regs.msp,
            Register::Vbr => self.regs.vbr,
            Register::Sfc => u32::from(self.regs.sfc),
            Register::Dfc => u32::from(self.regs.dfc),
            Register::Cacr => self.regs.cacr,
            Register::Caar => self.regs.caar,
            Register::Ir => u32::from(self.ir),
        }
    }

    /// Write a register by name. SR goes through the model mask.
    pub fn set_register(&mut self, reg: Register, value: u32) {
        match reg {
            Register::D0 => self.regs.d[0] = value,
            Register::D1 => self.regs.d[1] = value,
            Register::D2 => self.regs.d[2] = value,
            Register::D3 => self.regs.d[3] = value,
            Register::D4 => self.regs.d[4] = value,
            Register::D5 => self.regs.d[5] = value,
            Register::D6 => self.regs.d[6] = value,
            Register::D7 => self.regs.d[7] = value,
            Register::A0 => self.regs.set_a(0, value),
            Register::A1 => self.regs.set_a(1, value),
            Register::A2 => self.regs.set_a(2, value),
            Register::A3 => self.regs.set_a(3, value),
            Register::A4 => self.regs.set_a(4, value),
            Register::A5 => self.regs.set_a(5, value),
            Register::A6 => self.regs.set_a(6, value),
            Register::A7 | Register::Sp => self.regs.set_a(7, value),
            Register::Pc => self.set_pc(value),
            Register::Ppc => self.regs.ppc = value,
            Register::Sr => self.set_sr_masked(value as u16),
            Register::Usp => self.regs.usp = value,
            Register::Isp => self.regs.isp = value,
            Register::Msp => self.regs.msp = value,
            Register::Vbr => self.regs.vbr = value,
            Register::Sfc => self.regs.sfc = (value & 7) as u8,
            Register::Dfc => self.regs.dfc = (value & 7) as u8,
            Register::Cacr => self.regs.cacr = value & self.model.cacr_mask(),
            Register::Caar => self.regs.caar = value,
            Register::Ir => self.ir = value as u16,
        }
    }

    /// The single SR write path.
    pub(crate) fn set_sr_masked(&mut self, value: u16) {
        self.regs.set_sr(value, self.sr_mask);
    }

    // === Execution ===

    /// Execute one instruction, or take a pending interrupt.
    ///
    /// Returns the cycles consumed. A halted CPU returns
    /// [`ExecuteError::Halted`] until reset.
    pub fn execute<B: M68kBus>(&mut self, bus: &mut B) -> Result<u32, ExecuteError> {
        if self.state == State::Halted {
            warn!("execute called on a halted CPU");
            return Err(ExecuteError::Halted);
        }
        self.cycles = 0;

        let level = bus.interrupt_level() & 7;
        let nmi_edge = level == 7 && self.prev_level != 7;
        self.prev_level = level;

        let result = if level > self.regs.interrupt_mask() || nmi_edge {
            self.interrupt(bus, level)
        } else if self.state == State::Stopped {
            self.cycles += timing::STOPPED_CYCLES;
            Ok(())
        } else {
            self.step(bus)
        };

        if let Err(fault) = result {
            let outcome = self.process_fault(bus, fault);
            self.total_cycles.advance(self.cycles);
            outcome?;
        } else {
            self.total_cycles.advance(self.cycles);
        }
        Ok(self.cycles)
    }

    /// Fetch, decode and execute one instruction.
    fn step<B: M68kBus>(&mut self, bus: &mut B) -> Result<(), Fault> {
        self.regs.ppc = self.regs.pc;
        self.flow_changed = false;
        let trace_bits = self.regs.trace_bits();

        let opcode = self.fetch_word(bus)?;
        self.ir = opcode;
        let instr = decode(opcode, &self.caps);
        trace!("{:08X}: {opcode:04X} {instr:?}", self.regs.ppc);
        self.cycles += timing::base_cycles(self.model, &instr);

        self.dispatch(bus, instr)?;

        if self.fault_state == FaultState::Recovering {
            self.fault_state = FaultState::Normal;
        }
        let trace_flow = self.caps.trace_flow && trace_bits & T0 != 0 && self.flow_changed;
        if trace_bits & T1 != 0 || trace_flow {
            return Err(Fault::Trap(vector::TRACE));
        }
        Ok(())
    }

    // === Memory access ===

    /// Function code for data accesses in the current mode.
    pub(crate) fn data_fc(&self) -> FunctionCode {
        FunctionCode::from_flags(self.regs.is_supervisor(), false)
    }

    /// Function code for program accesses in the current mode.
    pub(crate) fn program_fc(&self) -> FunctionCode {
        FunctionCode::from_flags(self.regs.is_supervisor(), true)
    }

    fn access_fault(&self, size: Size, addr: u32, fc: FunctionCode, read: bool, value: u32) -> AccessFault {
        AccessFault {
            addr,
            fc,
            read,
            instruction: fc.is_program(),
            size,
            value,
        }
    }

    pub(crate) fn read_mem_fc<B: M68kBus>(
        &mut self,
        bus: &mut B,
        size: Size,
        addr: u32,
        fc: FunctionCode,
    ) -> Result<u32, Fault> {
        let addr = addr & self.address_mask;
        if size != Size::Byte && addr & 1 != 0 && !self.caps.misaligned_data {
            return Err(Fault::Address(self.access_fault(size, addr, fc, true, 0)));
        }
        let result = bus.read(size, addr, fc);
        self.cycles += u32::from(result.wait_cycles);
        if result.bus_error {
            return Err(Fault::Bus(self.access_fault(size, addr, fc, true, 0)));
        }
        Ok(result.data & size.mask())
    }

    pub(crate) fn write_mem_fc<B: M68kBus>(
        &mut self,
        bus: &mut B,
        size: Size,
        addr: u32,
        value: u32,
        fc: FunctionCode,
    ) -> Result<(), Fault> {
        let addr = addr & self.address_mask;
        let value = value & size.mask();
        if size != Size::Byte && addr & 1 != 0 && !self.caps.misaligned_data {
            return Err(Fault::Address(self.access_fault(size, addr, fc, false, value)));
        }
        let result = bus.write(size, addr, value, fc);
        self.cycles += u32::from(result.wait_cycles);
        if result.bus_error {
            return Err(Fault::Bus(self.access_fault(size, addr, fc, false, value)));
        }
        Ok(())
    }

    /// Data read in the current mode.
    pub(crate) fn read_mem<B: M68kBus>(&mut self, bus: &mut B, size: Size, addr: u32) -> Result<u32, Fault> {
        let fc = self.data_fc();
        self.read_mem_fc(bus, size, addr, fc)
    }

    /// Data write in the current mode.
    pub(crate) fn write_mem<B: M68kBus>(&mut self, bus: &mut B, size: Size, addr: u32, value: u32) -> Result<(), Fault> {
        let fc = self.data_fc();
        self.write_mem_fc(bus, size, addr, value, fc)
    }

    /// Fetch the next instruction stream word and advance PC.
    pub(crate) fn fetch_word<B: M68kBus>(&mut self, bus: &mut B) -> Result<u16, Fault> {
        let fc = self.program_fc();
        let addr = self.regs.pc & self.address_mask;
        if addr & 1 != 0 {
            return Err(Fault::Address(self.access_fault(Size::Word, addr, fc, true, 0)));
        }
        self.regs.pc = self.regs.pc.wrapping_add(2);

        let word = match self.prefetch.take() {
            Some((cached, word)) if cached == addr => word,
            _ => {
                let result = bus.fetch(addr, fc);
                self.cycles += u32::from(result.wait_cycles);
                if result.bus_error {
                    return Err(Fault::Bus(self.access_fault(Size::Word, addr, fc, true, 0)));
                }
                result.data as u16
            }
        };

        if self.prefetch_enabled {
            let next = addr.wrapping_add(2) & self.address_mask;
            let result = bus.fetch(next, fc);
            if !result.bus_error {
                self.prefetch = Some((next, result.data as u16));
            }
        }
        Ok(word)
    }

    pub(crate) fn fetch_long<B: M68kBus>(&mut self, bus: &mut B) -> Result<u32, Fault> {
        let hi = self.fetch_word(bus)?;
        let lo = self.fetch_word(bus)?;
        Ok((u32::from(hi) << 16) | u32::from(lo))
    }

    /// Push onto the active stack.
    pub(crate) fn push<B: M68kBus>(&mut self, bus: &mut B, size: Size, value: u32) -> Result<(), Fault> {
        let sp = self.regs.a(7).wrapping_sub(size.bytes());
        self.write_mem(bus, size, sp, value)?;
        self.regs.set_a(7, sp);
        Ok(())
    }

    /// Pop from the active stack.
    pub(crate) fn pop<B: M68kBus>(&mut self, bus: &mut B, size: Size) -> Result<u32, Fault> {
        let sp = self.regs.a(7);
        let value = self.read_mem(bus, size, sp)?;
        self.regs.set_a(7, sp.wrapping_add(size.bytes()));
        Ok(value)
    }

    /// Non-sequential PC write. An odd target is an address error.
    pub(crate) fn jump<B: M68kBus>(&mut self, bus: &mut B, target: u32) -> Result<(), Fault> {
        if target & 1 != 0 {
            let fc = self.program_fc();
            return Err(Fault::Address(self.access_fault(Size::Word, target, fc, true, 0)));
        }
        self.regs.pc = target;
        self.prefetch = None;
        self.flow_changed = true;
        bus.pc_changed(target);
        Ok(())
    }

    /// Supervisor check for privileged instructions.
    pub(crate) fn require_supervisor(&self) -> Result<(), Fault> {
        if self.regs.is_supervisor() {
            Ok(())
        } else {
            Err(Fault::Exception(vector::PRIVILEGE_VIOLATION))
        }
    }
}

const PATHS: &[&str] = &[
    "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7", "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7",
    "pc", "ppc", "sr", "ccr", "usp", "isp", "msp", "vbr", "sfc", "dfc", "cacr", "caar", "ir",
    "flags.x", "flags.n", "flags.z", "flags.v", "flags.c", "flags.s", "flags.m", "flags.t0", "flags.t1",
    "flags.ipl", "state", "model", "cycles", "fpu.fp0", "fpu.fp1", "fpu.fp2", "fpu.fp3", "fpu.fp4",
    "fpu.fp5", "fpu.fp6", "fpu.fp7", "fpu.fpcr", "fpu.fpsr", "fpu.fpiar",
];

impl Observable for Cpu68000 {
    fn query(&self, path: &str) -> Option<Value> {
        let sr = self.regs.sr;
        if let Some(rest) = path.strip_prefix("fpu.") {
            let fpu = self.fpu.as_ref()?;
            return match rest {
                "fpcr" => Some(fpu.fpcr.into()),
                "fpsr" => Some(fpu.fpsr.into()),
                "fpiar" => Some(fpu.fpiar.into()),
                _ => {
                    let n: usize = rest.strip_prefix("fp")?.parse().ok()?;
                    fpu.fp.get(n).map(|v| Value::F64(v.to_f64()))
                }
            };
        }
        let reg_index = |prefix: &str| -> Option<usize> {
            let n: usize = path.strip_prefix(prefix)?.parse().ok()?;
            (n < 8).then_some(n)
        };
        if path.len() == 2 {
            if let Some(n) = reg_index("d") {
                return Some(self.regs.d[n].into());
            }
            if let Some(n) = reg_index("a") {
                return Some(self.regs.a(n).into());
            }
        }
        match path {
            "pc" => Some(self.regs.pc.into()),
            "ppc" => Some(self.regs.ppc.into()),
            "sr" => Some(sr.into()),
            "ccr" => Some(self.regs.ccr().into()),
            "usp" => Some(self.regs.usp.into()),
            "isp" => Some(self.regs.isp.into()),
            "msp" => Some(self.regs.msp.into()),
            "vbr" => Some(self.regs.vbr.into()),
            "sfc" => Some(self.regs.sfc.into()),
            "dfc" => Some(self.regs.dfc.into()),
            "cacr" => Some(self.regs.cacr.into()),
            "caar" => Some(self.regs.caar.into()),
            "ir" => Some(self.ir.into()),
            "flags.x" => Some((sr & X != 0).into()),
            "flags.n" => Some((sr & N != 0).into()),
            "flags.z" => Some((sr & Z != 0).into()),
            "flags.v" => Some((sr & V != 0).into()),
            "flags.c" => Some((sr & C != 0).into()),
            "flags.s" => Some((sr & S != 0).into()),
            "flags.m" => Some((sr & M != 0).into()),
            "flags.t0" => Some((sr & T0 != 0).into()),
            "flags.t1" => Some((sr & T1 != 0).into()),
            "flags.ipl" => Some(self.regs.interrupt_mask().into()),
            "state" => Some(
                match self.state {
                    State::Running => "running",
                    State::Stopped => "stopped",
                    State::Halted => "halted",
                }
                .into(),
            ),
            "model" => Some(self.model.name().into()),
            "cycles" => Some(self.total_cycles.get().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        PATHS
    }
}
