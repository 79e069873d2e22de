//! Whole-CPU tests against a flat RAM bus.

use emu_core::{Observable, Value};
use motorola_68000::bus::{BusResult, FunctionCode, InterruptAck, M68kBus};
use motorola_68000::{Cpu68000, CpuModel, ExecuteError, Register, Size};

const RAM_SIZE: usize = 0x100_0000;
const STACK: u32 = 0x1000;
const START: u32 = 0x400;

/// 16 MB of RAM. Anything above it is unmapped and bus-errors.
struct TestBus {
    data: Vec<u8>,
    level: u8,
    ack: InterruptAck,
    skip_illegal: bool,
    resets: u32,
}

impl TestBus {
    fn new() -> Self {
        let mut bus = Self {
            data: vec![0; RAM_SIZE],
            level: 0,
            ack: InterruptAck::Autovector,
            skip_illegal: false,
            resets: 0,
        };
        bus.poke_long(0, STACK);
        bus.poke_long(4, START);
        bus
    }

    fn poke_word(&mut self, addr: u32, value: u16) {
        let a = addr as usize;
        self.data[a..a + 2].copy_from_slice(&value.to_be_bytes());
    }

    fn poke_long(&mut self, addr: u32, value: u32) {
        let a = addr as usize;
        self.data[a..a + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn peek_word(&self, addr: u32) -> u16 {
        let a = addr as usize;
        u16::from_be_bytes([self.data[a], self.data[a + 1]])
    }

    fn peek_long(&self, addr: u32) -> u32 {
        (u32::from(self.peek_word(addr)) << 16) | u32::from(self.peek_word(addr + 2))
    }

    /// Place a program at the reset PC.
    fn load(&mut self, words: &[u16]) {
        for (i, &word) in words.iter().enumerate() {
            self.poke_word(START + 2 * i as u32, word);
        }
    }

    fn set_vector(&mut self, vector: u32, handler: u32) {
        self.poke_long(vector * 4, handler);
    }
}

impl M68kBus for TestBus {
    fn read(&mut self, size: Size, addr: u32, _fc: FunctionCode) -> BusResult {
        let a = addr as usize;
        let n = size.bytes() as usize;
        if a + n > RAM_SIZE {
            return BusResult::error();
        }
        let value = self.data[a..a + n].iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        BusResult::new(value)
    }

    fn write(&mut self, size: Size, addr: u32, value: u32, _fc: FunctionCode) -> BusResult {
        let a = addr as usize;
        let n = size.bytes() as usize;
        if a + n > RAM_SIZE {
            return BusResult::error();
        }
        for i in 0..n {
            self.data[a + i] = (value >> (8 * (n - 1 - i))) as u8;
        }
        BusResult::write_ok()
    }

    fn interrupt_level(&mut self) -> u8 {
        self.level
    }

    fn interrupt_ack(&mut self, _level: u8) -> InterruptAck {
        self.ack
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn illegal_instruction(&mut self, _opcode: u16) -> bool {
        self.skip_illegal
    }
}

fn boot(model: CpuModel, program: &[u16]) -> (Cpu68000, TestBus) {
    let mut bus = TestBus::new();
    bus.load(program);
    let mut cpu = Cpu68000::new_with_model(model);
    cpu.reset(&mut bus);
    (cpu, bus)
}

fn run(cpu: &mut Cpu68000, bus: &mut TestBus, instructions: usize) {
    for _ in 0..instructions {
        cpu.execute(bus).expect("instruction should not halt the CPU");
    }
}

#[test]
fn reset_loads_stack_and_program_counter() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4E71]);
    assert_eq!(cpu.pc(), START);
    assert_eq!(cpu.register(Register::A7), STACK);
    assert_eq!(cpu.sr(), 0x2700);

    run(&mut cpu, &mut bus, 1);
    cpu.reset(&mut bus);
    let first = (cpu.pc(), cpu.sr(), cpu.register(Register::A7));
    cpu.reset(&mut bus);
    assert_eq!((cpu.pc(), cpu.sr(), cpu.register(Register::A7)), first);
}

#[test]
fn addq_byte_overflow_flags() {
    // MOVEQ #$7F,D0 ; ADDQ.B #1,D0
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x707F, 0x5200]);
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.register(Register::D0), 0x80);
    assert_eq!(cpu.sr() & 0x1F, 0x0A, "N and V set, X Z C clear");
}

#[test]
fn byte_predecrement_of_a7_keeps_the_stack_aligned() {
    // MOVE.B D0,-(A7)
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x1F00]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.register(Register::A7), STACK - 2);
}

#[test]
fn dbf_loop_counts_down_to_minus_one() {
    // MOVEQ #3,D0 ; loop: ADDQ.L #1,D1 ; DBF D0,loop
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x7003, 0x5281, 0x51C8, 0xFFFC]);
    run(&mut cpu, &mut bus, 9);
    assert_eq!(cpu.register(Register::D1), 4);
    assert_eq!(cpu.register(Register::D0) & 0xFFFF, 0xFFFF);
    assert_eq!(cpu.pc(), START + 8);
}

#[test]
fn movem_round_trips_through_the_stack() {
    // MOVEM.L D0-D1/A0,-(A7) ; MOVEM.L (A7)+,D2-D3/A1
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x48E7, 0xC080, 0x4CDF, 0x020C]);
    cpu.set_register(Register::D0, 0x1111_1111);
    cpu.set_register(Register::D1, 0x2222_2222);
    cpu.set_register(Register::A0, 0x3333_3333);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.register(Register::A7), STACK - 12);
    assert_eq!(bus.peek_long(STACK - 12), 0x1111_1111);
    assert_eq!(bus.peek_long(STACK - 4), 0x3333_3333);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.register(Register::D2), 0x1111_1111);
    assert_eq!(cpu.register(Register::D3), 0x2222_2222);
    assert_eq!(cpu.register(Register::A1), 0x3333_3333);
    assert_eq!(cpu.register(Register::A7), STACK);
}

#[test]
fn divide_by_zero_stacks_the_next_instruction() {
    // DIVU.W #0,D1
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x82FC, 0x0000]);
    bus.set_vector(5, 0x800);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x800);
    assert_eq!(cpu.register(Register::A7), STACK - 6);
    assert_eq!(bus.peek_word(STACK - 6), 0x2700);
    assert_eq!(bus.peek_long(STACK - 4), START + 4);
}

#[test]
fn divide_by_zero_on_68020_uses_format_2() {
    let (mut cpu, mut bus) = boot(CpuModel::M68020, &[0x82FC, 0x0000]);
    bus.set_vector(5, 0x800);
    run(&mut cpu, &mut bus, 1);
    let sp = STACK - 12;
    assert_eq!(cpu.register(Register::A7), sp);
    assert_eq!(bus.peek_long(sp + 2), START + 4);
    assert_eq!(bus.peek_word(sp + 6), 0x2014);
    assert_eq!(bus.peek_long(sp + 8), START);
}

#[test]
fn autovectored_interrupt_raises_the_mask() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4E71]);
    bus.set_vector(27, 0x900);
    cpu.set_sr(0x2000);
    bus.level = 3;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x900);
    assert_eq!(cpu.sr() & 0x0700, 0x0300);
    assert_ne!(cpu.sr() & 0x2000, 0);
    assert_eq!(bus.peek_long(STACK - 4), START);
}

#[test]
fn masked_interrupt_waits_except_level_seven() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4E71, 0x4E71]);
    bus.set_vector(31, 0xA00);
    bus.level = 3;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), START + 2, "mask 7 blocks level 3");
    bus.level = 7;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0xA00, "level 7 is taken on its edge");
}

#[test]
fn interrupt_in_master_state_adds_a_throwaway_frame() {
    let (mut cpu, mut bus) = boot(CpuModel::M68020, &[0x4E71]);
    bus.set_vector(27, 0x900);
    cpu.set_register(Register::Msp, 0x2000);
    cpu.set_sr(0x3200);
    bus.level = 3;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x900);
    assert_eq!(cpu.sr() & 0x1000, 0, "handler runs on the interrupt stack");
    assert_eq!(cpu.register(Register::A7), STACK - 8);

    let master = 0x2000 - 8;
    assert_eq!(bus.peek_word(master), 0x3200);
    assert_eq!(bus.peek_long(master + 2), START);
    assert_eq!(bus.peek_word(master + 6), 0x006C);

    let throwaway = STACK - 8;
    assert_eq!(bus.peek_word(throwaway), 0x3200);
    assert_eq!(bus.peek_word(throwaway + 6), 0x106C);
}

#[test]
fn vectored_interrupt_on_68010_writes_format_0() {
    let (mut cpu, mut bus) = boot(CpuModel::M68010, &[0x4E71]);
    bus.set_vector(64, 0xB00);
    bus.ack = InterruptAck::Vector(64);
    cpu.set_sr(0x2000);
    bus.level = 5;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0xB00);
    assert_eq!(bus.peek_word(STACK - 2), 0x0100);
}

#[test]
fn stop_waits_for_an_interrupt() {
    // STOP #$2000
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4E72, 0x2000]);
    bus.set_vector(26, 0xC00);
    run(&mut cpu, &mut bus, 2);
    assert!(cpu.is_stopped());
    assert_eq!(cpu.pc(), START + 4);
    bus.level = 2;
    run(&mut cpu, &mut bus, 1);
    assert!(!cpu.is_stopped());
    assert_eq!(cpu.pc(), 0xC00);
}

#[test]
fn address_error_on_odd_stack_halts_with_double_fault() {
    let mut bus = TestBus::new();
    bus.load(&[0x4AFC]);
    let mut cpu = Cpu68000::new();
    cpu.reset_to(STACK + 1, START);

    let err = cpu.execute(&mut bus).expect_err("odd stack must double fault");
    assert!(matches!(err, ExecuteError::DoubleFault { .. }));
    assert!(cpu.is_halted());
    assert_eq!(cpu.execute(&mut bus), Err(ExecuteError::Halted));

    cpu.reset(&mut bus);
    assert!(!cpu.is_halted());
}

#[test]
fn address_error_on_68000_writes_the_seven_word_frame() {
    // MOVE.W (A0),D0
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x3010]);
    bus.set_vector(3, 0xC00);
    cpu.set_register(Register::A0, 0x1001);
    run(&mut cpu, &mut bus, 1);
    let sp = STACK - 14;
    assert_eq!(cpu.pc(), 0xC00);
    assert_eq!(cpu.register(Register::A7), sp);
    let frame: Vec<u16> = (0..7).map(|i| bus.peek_word(sp + i * 2)).collect();
    assert_eq!(frame, [0x301D, 0x0000, 0x1001, 0x3010, 0x2700, 0x0000, 0x0402]);
}

#[test]
fn address_error_on_68010_writes_format_8_and_rte_restarts() {
    // MOVE.W (A0),D0; the handler bumps A0 to an even address and returns.
    let (mut cpu, mut bus) = boot(CpuModel::M68010, &[0x3010]);
    bus.set_vector(3, 0xC00);
    bus.poke_word(0xC00, 0x5288); // ADDQ.L #1,A0
    bus.poke_word(0xC02, 0x4E73); // RTE
    cpu.set_register(Register::A0, 0x1001);
    run(&mut cpu, &mut bus, 1);
    let sp = STACK - 58;
    assert_eq!(cpu.pc(), 0xC00);
    assert_eq!(cpu.register(Register::A7), sp);
    assert_eq!(bus.peek_word(sp + 6), 0x800C);
    assert_eq!(bus.peek_word(sp + 8), 0x1105);
    assert_eq!(bus.peek_long(sp + 10), 0x1001);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.pc(), START);
    assert_eq!(cpu.register(Register::A7), STACK);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), START + 2);
    assert_eq!(cpu.register(Register::A0), 0x1002);
}

#[test]
fn bus_error_on_68020_writes_format_b() {
    // MOVE.L ($02000000).L,D0
    let (mut cpu, mut bus) = boot(CpuModel::M68020, &[0x2039, 0x0200, 0x0000]);
    bus.set_vector(2, 0xC00);
    run(&mut cpu, &mut bus, 1);
    let sp = STACK - 92;
    assert_eq!(cpu.pc(), 0xC00);
    assert_eq!(cpu.register(Register::A7), sp);
    assert_eq!(bus.peek_word(sp + 6), 0xB008);
    assert_eq!(bus.peek_long(sp + 16), 0x0200_0000);
}

#[test]
fn illegal_instruction_can_be_claimed_by_the_host() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4AFC, 0x4E71]);
    bus.set_vector(4, 0xD00);
    bus.skip_illegal = true;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), START + 2);

    bus.skip_illegal = false;
    cpu.set_pc(START);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0xD00);
}

#[test]
fn privileged_instruction_in_user_mode() {
    // RESET
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4E70, 0x4E70]);
    bus.set_vector(8, 0xE00);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.resets, 1);

    cpu.set_register(Register::Usp, 0x2000);
    cpu.set_sr(0x0000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.resets, 1);
    assert_eq!(cpu.pc(), 0xE00);
    assert_eq!(bus.peek_long(STACK - 4), START + 2);
}

#[test]
fn movec_relocates_the_vector_table() {
    // MOVEC D0,VBR ; ILLEGAL
    let (mut cpu, mut bus) = boot(CpuModel::M68010, &[0x4E7B, 0x0801, 0x4AFC]);
    cpu.set_register(Register::D0, 0x2000);
    bus.poke_long(0x2000 + 4 * 4, 0xF00);
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.register(Register::Vbr), 0x2000);
    assert_eq!(cpu.pc(), 0xF00);
}

#[test]
fn movec_is_illegal_on_68000() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x4E7B, 0x0801]);
    bus.set_vector(4, 0xD00);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0xD00);
}

#[test]
fn rte_rejects_unknown_frame_formats() {
    // RTE with a format $F frame on the stack.
    let (mut cpu, mut bus) = boot(CpuModel::M68010, &[0x4E73]);
    bus.set_vector(14, 0x700);
    bus.poke_word(STACK, 0x2700);
    bus.poke_long(STACK + 2, 0x500);
    bus.poke_word(STACK + 6, 0xF000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x700);
    assert_eq!(cpu.register(Register::A7), STACK - 8);
    assert_eq!(bus.peek_long(STACK - 6), START);
}

#[test]
fn rte_unwinds_format_0() {
    let (mut cpu, mut bus) = boot(CpuModel::M68010, &[0x4E73]);
    bus.poke_word(STACK, 0x0004);
    bus.poke_long(STACK + 2, 0x600);
    bus.poke_word(STACK + 6, 0x0000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x600);
    assert_eq!(cpu.sr(), 0x0004);
    assert_eq!(cpu.register(Register::Isp), STACK + 8);
}

#[test]
fn line_f_without_fpu_takes_vector_11() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0xF23C, 0x4000, 0x0000, 0x0003]);
    bus.set_vector(11, 0x780);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x780);
}

#[test]
fn line_a_takes_vector_10() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0xA123]);
    bus.set_vector(10, 0x740);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc(), 0x740);
}

#[test]
fn fpu_add_and_store_integer() {
    // FMOVE.L #3,FP0 ; FADD.L #4,FP0 ; FMOVE.L FP0,D1
    let program = [
        0xF23C, 0x4000, 0x0000, 0x0003, //
        0xF23C, 0x4022, 0x0000, 0x0004, //
        0xF201, 0x6000,
    ];
    let (mut cpu, mut bus) = boot(CpuModel::M68020, &program);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.register(Register::D1), 7);
    assert_eq!(cpu.query("fpu.fp0"), Some(Value::F64(7.0)));
    assert_eq!(cpu.query("fpu.fpiar"), Some(Value::U32(START + 16)));
}

#[test]
fn fsave_after_reset_writes_a_null_frame() {
    // FSAVE -(A7)
    let (mut cpu, mut bus) = boot(CpuModel::M68020, &[0xF327]);
    bus.poke_long(STACK - 4, 0xDEAD_BEEF);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.register(Register::A7), STACK - 4);
    assert_eq!(bus.peek_long(STACK - 4), 0);
}

#[test]
fn observable_reports_registers_and_flags() {
    let (mut cpu, mut bus) = boot(CpuModel::M68000, &[0x7000]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.query("pc"), Some(Value::U32(START + 2)));
    assert_eq!(cpu.query("flags.z"), Some(Value::Bool(true)));
    assert_eq!(cpu.query("model"), Some(Value::String("68000".into())));
    assert_eq!(cpu.query("fpu.fp0"), None);
    assert!(cpu.query_paths().contains(&"flags.ipl"));
    assert!(cpu.total_cycles().get() > 0);
}
