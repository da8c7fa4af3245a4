//! # 6502 CPU Implementation
//! Fetch-decode-execute over a flat 64KB memory. Decimal mode is not supported.

use crate::addressing::Operand;
use crate::error::{EmuError, Result};
use crate::memory::Memory;
use crate::opcodes::{self, Instruction, Opcode};
use crate::state::{CpuState, Flag};

pub const STACK_BASE: u16 = 0x0100;
pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const INTERRUPT_CYCLES: u64 = 7;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Interrupt {
    Nmi,
    Irq,
    Break,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CpuConfig {
    /// PC after reset when vectors are disabled.
    pub entry: u16,
    /// Enables BRK, IRQ and NMI, and makes reset load PC from $FFFC.
    pub vectors: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        CpuConfig {
            entry: 0x0000,
            vectors: false,
        }
    }
}

pub struct Cpu {
    pub memory: Memory,
    pub(crate) pc: u16,
    pub(crate) sp: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub(crate) cycles: u64,
    config: CpuConfig,
}

impl Cpu {
    pub fn new(config: CpuConfig) -> Self {
        let mut cpu = Cpu {
            memory: Memory::new(),
            pc: 0,
            sp: 0,
            a: 0,
            x: 0,
            y: 0,
            p: 0,
            cycles: 0,
            config,
        };
        cpu.reset();
        cpu
    }

    /// Restores register defaults. Memory is left untouched.
    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.p = 0;
        self.cycles = 0;
        self.pc = if self.config.vectors {
            self.memory.read_word(RESET_VECTOR)
        } else {
            self.config.entry
        };
        log::debug!("CPU reset, PC set to: {:#06x}", self.pc);
    }

    pub fn config(&self) -> CpuConfig {
        self.config
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn status(&self) -> u8 {
        self.p
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.get_flag(flag)
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            pc: self.pc,
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            p: self.p,
            cycles: self.cycles,
        }
    }

    /// The table entry for the opcode at PC.
    pub fn current_opcode(&self) -> &'static Opcode {
        opcodes::lookup(self.memory.read_byte(self.pc))
    }

    fn pop_byte(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let address = STACK_BASE + self.sp as u16;
        self.memory.read_byte(address)
    }

    fn push_byte(&mut self, value: u8) {
        let address = STACK_BASE + self.sp as u16;
        self.memory.write_byte(address, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop_word(&mut self) -> u16 {
        let lo = self.pop_byte() as u16;
        let hi = self.pop_byte() as u16;
        (hi << 8) | lo
    }

    fn push_word(&mut self, value: u16) {
        self.push_byte((value >> 8) as u8);
        self.push_byte(value as u8);
    }

    fn get_flag(&self, flag: Flag) -> bool {
        (self.p & flag as u8) != 0
    }

    fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    fn set_flags_zero_negative(&mut self, value: u8) {
        self.set_flag(Flag::Zero, value == 0);
        self.set_flag(Flag::Negative, value & 0b1000_0000 != 0);
    }

    fn set_flags_carry_overflow(&mut self, m: u8, n: u8, result: u16) {
        self.set_flag(Flag::Carry, result > 0xFF);
        self.set_flag(
            Flag::Overflow,
            (m ^ result as u8) & (n ^ result as u8) & 0x80 != 0,
        );
    }

    fn carry(&self) -> u8 {
        if self.get_flag(Flag::Carry) {
            1
        } else {
            0
        }
    }

    /// Maskable interrupt. Returns whether it was taken.
    pub fn irq(&mut self) -> bool {
        if !self.config.vectors || self.get_flag(Flag::IrqDisable) {
            return false;
        }
        self.interrupt(Interrupt::Irq);
        self.cycles += INTERRUPT_CYCLES;
        true
    }

    /// Non-maskable interrupt. Returns whether it was taken.
    pub fn nmi(&mut self) -> bool {
        if !self.config.vectors {
            return false;
        }
        self.interrupt(Interrupt::Nmi);
        self.cycles += INTERRUPT_CYCLES;
        true
    }

    fn interrupt(&mut self, kind: Interrupt) {
        self.push_word(self.pc);

        let mut status = self.p | Flag::Unused as u8;
        match kind {
            Interrupt::Break => status |= Flag::Break as u8,
            _ => status &= !(Flag::Break as u8),
        }
        self.push_byte(status);
        self.set_flag(Flag::IrqDisable, true);

        let vector = match kind {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq | Interrupt::Break => IRQ_VECTOR,
        };
        self.pc = self.memory.read_word(vector);
        log::debug!("{:?} taken, PC set to: {:#06x}", kind, self.pc);
    }

    /// Executes exactly one instruction.
    ///
    /// On error nothing has been modified: registers, memory and the cycle
    /// counter still hold their pre-step values.
    pub fn step(&mut self) -> Result<()> {
        let pc = self.pc;
        let opcode_byte = self.memory.read_byte(pc);
        let opcode = opcodes::lookup(opcode_byte);
        self.check_supported(opcode_byte, opcode)?;

        log::trace!("{:04X}  {:02X}  {}  {}", pc, opcode_byte, opcode.mnemonic(), self.state());

        self.increment_pc();
        let operand = self.resolve(opcode.mode);
        self.execute_instruction(opcode.instruction, operand);
        self.cycles += opcode.cycles as u64;
        Ok(())
    }

    fn check_supported(&self, opcode_byte: u8, opcode: &Opcode) -> Result<()> {
        let reason = match opcode.instruction {
            Instruction::Illegal => {
                log::warn!("Illegal opcode: 0x{:02X} at PC: 0x{:04X}", opcode_byte, self.pc);
                return Err(EmuError::IllegalOpcode {
                    opcode: opcode_byte,
                    state: self.state(),
                });
            }
            Instruction::Brk if !self.config.vectors => "interrupt vectors are disabled",
            Instruction::Adc | Instruction::Sbc if self.get_flag(Flag::Decimal) => {
                "decimal mode is not supported"
            }
            _ => return Ok(()),
        };

        log::warn!(
            "Unimplemented instruction: {} (0x{:02X}) at PC: 0x{:04X}, {}",
            opcode.mnemonic(),
            opcode_byte,
            self.pc,
            reason
        );
        Err(EmuError::UnimplementedInstruction {
            opcode: opcode_byte,
            mnemonic: opcode.mnemonic(),
            reason,
            state: self.state(),
        })
    }

    fn execute_instruction(&mut self, instruction: Instruction, operand: Operand) {
        match instruction {
            // Loads and stores
            Instruction::Lda => self.lda(operand),
            Instruction::Ldx => self.ldx(operand),
            Instruction::Ldy => self.ldy(operand),
            Instruction::Sta => self.store(operand, self.a),
            Instruction::Stx => self.store(operand, self.x),
            Instruction::Sty => self.store(operand, self.y),

            // Arithmetic
            Instruction::Adc => self.adc(operand),
            Instruction::Sbc => self.sbc(operand),

            // Comparisons
            Instruction::Cmp => self.compare(self.a, operand),
            Instruction::Cpx => self.compare(self.x, operand),
            Instruction::Cpy => self.compare(self.y, operand),

            // Bitwise operations
            Instruction::And => self.and(operand),
            Instruction::Ora => self.ora(operand),
            Instruction::Eor => self.eor(operand),
            Instruction::Bit => self.bit(operand),

            // Shifts and rotates
            Instruction::Asl => self.asl(operand),
            Instruction::Lsr => self.lsr(operand),
            Instruction::Rol => self.rol(operand),
            Instruction::Ror => self.ror(operand),

            // Increments and decrements
            Instruction::Inc => self.modify(operand, |_, value| value.wrapping_add(1)),
            Instruction::Dec => self.modify(operand, |_, value| value.wrapping_sub(1)),
            Instruction::Inx => self.inx(),
            Instruction::Dex => self.dex(),
            Instruction::Iny => self.iny(),
            Instruction::Dey => self.dey(),

            // Register moves
            Instruction::Tax => self.tax(),
            Instruction::Tay => self.tay(),
            Instruction::Txa => self.txa(),
            Instruction::Tya => self.tya(),
            Instruction::Txs => self.sp = self.x,
            Instruction::Tsx => self.tsx(),

            // Flag operations
            Instruction::Clc => self.set_flag(Flag::Carry, false),
            Instruction::Sec => self.set_flag(Flag::Carry, true),
            Instruction::Cli => self.set_flag(Flag::IrqDisable, false),
            Instruction::Sei => self.set_flag(Flag::IrqDisable, true),
            Instruction::Clv => self.set_flag(Flag::Overflow, false),
            Instruction::Cld => self.set_flag(Flag::Decimal, false),
            Instruction::Sed => self.set_flag(Flag::Decimal, true),

            // Branches
            Instruction::Bpl => self.branch(operand, !self.get_flag(Flag::Negative)),
            Instruction::Bmi => self.branch(operand, self.get_flag(Flag::Negative)),
            Instruction::Bvc => self.branch(operand, !self.get_flag(Flag::Overflow)),
            Instruction::Bvs => self.branch(operand, self.get_flag(Flag::Overflow)),
            Instruction::Bcc => self.branch(operand, !self.get_flag(Flag::Carry)),
            Instruction::Bcs => self.branch(operand, self.get_flag(Flag::Carry)),
            Instruction::Bne => self.branch(operand, !self.get_flag(Flag::Zero)),
            Instruction::Beq => self.branch(operand, self.get_flag(Flag::Zero)),

            // Jumps
            Instruction::Jmp => self.jmp(operand),

            // Procedure calls
            Instruction::Jsr => self.jsr(operand),
            Instruction::Rts => self.rts(),
            Instruction::Brk => self.brk(),
            Instruction::Rti => self.rti(),

            // Stack operations
            Instruction::Pha => self.push_byte(self.a),
            Instruction::Pla => self.pla(),
            Instruction::Php => self.php(),
            Instruction::Plp => self.plp(),

            Instruction::Nop => {}

            Instruction::Illegal => unreachable!("illegal opcodes are rejected by check_supported"),
        }
    }

    fn load(&self, operand: Operand) -> u8 {
        match operand {
            Operand::Implied => self.a,
            Operand::Immediate(value) => value,
            Operand::Address(address) => self.memory.read_byte(address),
        }
    }

    fn store(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Implied => self.a = value,
            Operand::Address(address) => self.memory.write_byte(address, value),
            // No store or read-modify-write opcode uses immediate mode
            Operand::Immediate(_) => {}
        }
    }

    /// Read-modify-write on the accumulator or memory; sets N and Z from the result.
    fn modify(&mut self, operand: Operand, f: impl FnOnce(&mut Self, u8) -> u8) {
        let value = self.load(operand);
        let result = f(self, value);
        self.set_flags_zero_negative(result);
        self.store(operand, result);
    }

    // Instruction implementations
    fn lda(&mut self, operand: Operand) {
        let value = self.load(operand);
        self.set_flags_zero_negative(value);
        self.a = value;
    }

    fn ldx(&mut self, operand: Operand) {
        let value = self.load(operand);
        self.set_flags_zero_negative(value);
        self.x = value;
    }

    fn ldy(&mut self, operand: Operand) {
        let value = self.load(operand);
        self.set_flags_zero_negative(value);
        self.y = value;
    }

    fn add(&mut self, value: u8) {
        let a = self.a;
        let result = a as u16 + value as u16 + self.carry() as u16;
        self.set_flags_carry_overflow(a, value, result);
        self.set_flags_zero_negative(result as u8);
        self.a = result as u8;
    }

    fn adc(&mut self, operand: Operand) {
        let value = self.load(operand);
        self.add(value);
    }

    fn sbc(&mut self, operand: Operand) {
        let value = !self.load(operand);
        self.add(value);
    }

    fn compare(&mut self, register: u8, operand: Operand) {
        let value = self.load(operand);
        self.set_flags_zero_negative(register.wrapping_sub(value));
        self.set_flag(Flag::Carry, register >= value);
    }

    fn and(&mut self, operand: Operand) {
        let result = self.a & self.load(operand);
        self.set_flags_zero_negative(result);
        self.a = result;
    }

    fn ora(&mut self, operand: Operand) {
        let result = self.a | self.load(operand);
        self.set_flags_zero_negative(result);
        self.a = result;
    }

    fn eor(&mut self, operand: Operand) {
        let result = self.a ^ self.load(operand);
        self.set_flags_zero_negative(result);
        self.a = result;
    }

    fn bit(&mut self, operand: Operand) {
        let value = self.load(operand);
        self.set_flag(Flag::Zero, self.a & value == 0);
        self.set_flag(Flag::Overflow, value & 0b0100_0000 != 0);
        self.set_flag(Flag::Negative, value & 0b1000_0000 != 0);
    }

    fn asl(&mut self, operand: Operand) {
        self.modify(operand, |cpu, value| {
            cpu.set_flag(Flag::Carry, value & 0b1000_0000 != 0);
            value << 1
        });
    }

    fn lsr(&mut self, operand: Operand) {
        self.modify(operand, |cpu, value| {
            cpu.set_flag(Flag::Carry, value & 0b0000_0001 != 0);
            value >> 1
        });
    }

    fn rol(&mut self, operand: Operand) {
        self.modify(operand, |cpu, value| {
            let carry = cpu.carry();
            cpu.set_flag(Flag::Carry, value & 0b1000_0000 != 0);
            (value << 1) | carry
        });
    }

    fn ror(&mut self, operand: Operand) {
        self.modify(operand, |cpu, value| {
            let carry = cpu.carry() << 7;
            cpu.set_flag(Flag::Carry, value & 0b0000_0001 != 0);
            (value >> 1) | carry
        });
    }

    fn inx(&mut self) {
        let result = self.x.wrapping_add(1);
        self.set_flags_zero_negative(result);
        self.x = result;
    }

    fn dex(&mut self) {
        let result = self.x.wrapping_sub(1);
        self.set_flags_zero_negative(result);
        self.x = result;
    }

    fn iny(&mut self) {
        let result = self.y.wrapping_add(1);
        self.set_flags_zero_negative(result);
        self.y = result;
    }

    fn dey(&mut self) {
        let result = self.y.wrapping_sub(1);
        self.set_flags_zero_negative(result);
        self.y = result;
    }

    fn tax(&mut self) {
        let result = self.a;
        self.set_flags_zero_negative(result);
        self.x = result;
    }

    fn tay(&mut self) {
        let result = self.a;
        self.set_flags_zero_negative(result);
        self.y = result;
    }

    fn txa(&mut self) {
        let result = self.x;
        self.set_flags_zero_negative(result);
        self.a = result;
    }

    fn tya(&mut self) {
        let result = self.y;
        self.set_flags_zero_negative(result);
        self.a = result;
    }

    fn tsx(&mut self) {
        let result = self.sp;
        self.set_flags_zero_negative(result);
        self.x = result;
    }

    fn branch(&mut self, operand: Operand, condition: bool) {
        if let (true, Operand::Address(target)) = (condition, operand) {
            self.pc = target;
        }
    }

    fn jmp(&mut self, operand: Operand) {
        if let Operand::Address(target) = operand {
            self.pc = target;
        }
    }

    fn jsr(&mut self, operand: Operand) {
        // Pushes the address of the JSR's last byte; RTS adds one.
        let return_address = self.pc.wrapping_sub(1);
        self.push_word(return_address);
        self.jmp(operand);
    }

    fn rts(&mut self) {
        self.pc = self.pop_word().wrapping_add(1);
    }

    fn brk(&mut self) {
        // BRK skips a padding byte: the pushed address is BRK + 2.
        self.increment_pc();
        self.interrupt(Interrupt::Break);
    }

    fn rti(&mut self) {
        self.p = self.pop_byte() & !(Flag::Break as u8) | Flag::Unused as u8;
        self.pc = self.pop_word();
    }

    fn pla(&mut self) {
        let result = self.pop_byte();
        self.set_flags_zero_negative(result);
        self.a = result;
    }

    fn php(&mut self) {
        let p = self.p | Flag::Break as u8 | Flag::Unused as u8;
        self.push_byte(p);
    }

    fn plp(&mut self) {
        self.p = self.pop_byte() & !(Flag::Break as u8) | Flag::Unused as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: u16 = 0x0600;

    fn cpu_with(program: &[u8]) -> Cpu {
        let mut cpu = Cpu::new(CpuConfig {
            entry: ORIGIN,
            vectors: false,
        });
        cpu.memory.load(program, ORIGIN as usize).unwrap();
        cpu
    }

    fn run(program: &[u8], steps: usize) -> Cpu {
        let mut cpu = cpu_with(program);
        for _ in 0..steps {
            cpu.step().unwrap();
        }
        cpu
    }

    #[test]
    fn test_reset_defaults() {
        let mut cpu = cpu_with(&[0xA9, 0x42, 0xAA]);
        cpu.step().unwrap();
        cpu.step().unwrap();
        cpu.reset();
        assert_eq!(cpu.state(), CpuState {
            pc: ORIGIN,
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            p: 0,
            cycles: 0,
        });
        assert_eq!(cpu.memory.read_byte(ORIGIN), 0xA9);
    }

    #[test]
    fn test_lda_immediate_sets_flags() {
        let cpu = run(&[0xA9, 0x00], 1);
        assert_eq!(cpu.a, 0);
        assert!(cpu.flag(Flag::Zero));
        assert!(!cpu.flag(Flag::Negative));
        assert_eq!(cpu.pc(), ORIGIN + 2);

        let cpu = run(&[0xA9, 0x80], 1);
        assert!(cpu.flag(Flag::Negative));
        assert!(!cpu.flag(Flag::Zero));
    }

    #[test]
    fn test_ldx_zero_page_y() {
        // LDY #$01; LDX $FF,Y
        let mut cpu = cpu_with(&[0xA0, 0x01, 0xB6, 0xFF]);
        cpu.memory.write_byte(0x0000u16, 0x7E);
        cpu.memory.write_byte(0x0100u16, 0x11);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.x, 0x7E);
    }

    #[test]
    fn test_sta_writes_without_flags() {
        // LDA #$00; STA $0200; LDX #$05; STA $01FB,X
        let cpu = run(&[0xA9, 0x00, 0x8D, 0x00, 0x02, 0xA2, 0x05, 0x9D, 0xFB, 0x01], 4);
        assert_eq!(cpu.memory.read_byte(0x0200u16), 0x00);
        // LDX #$05 cleared Z; STA must not set it again
        assert!(!cpu.flag(Flag::Zero));
    }

    #[test]
    fn test_sta_indirect_indexed() {
        // LDA #$99; LDY #$04; STA ($10),Y
        let mut cpu = cpu_with(&[0xA9, 0x99, 0xA0, 0x04, 0x91, 0x10]);
        cpu.memory.load(&[0x00, 0x30], 0x0010).unwrap();
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.memory.read_byte(0x3004u16), 0x99);
    }

    #[test]
    fn test_stx_sty() {
        // LDX #$5A; LDY #$A5; STX $0210; STY $0211; STX $FE,Y; STY $20,X
        let cpu = run(
            &[
                0xA2, 0x5A, 0xA0, 0xA5, 0x8E, 0x10, 0x02, 0x8C, 0x11, 0x02, 0x96, 0xFE, 0x94,
                0x20,
            ],
            6,
        );
        assert_eq!(cpu.memory.read_byte(0x0210u16), 0x5A);
        assert_eq!(cpu.memory.read_byte(0x0211u16), 0xA5);
        // $FE + $A5 wraps within the zero page
        assert_eq!(cpu.memory.read_byte(0x00A3u16), 0x5A);
        assert_eq!(cpu.memory.read_byte(0x007Au16), 0xA5);
        assert_eq!(cpu.memory.read_byte(0x01A3u16), 0x00);
        // LDY #$A5 left N set; the stores did not touch it
        assert!(cpu.flag(Flag::Negative));
        assert_eq!(cpu.pc(), ORIGIN + 14);
    }

    #[test]
    fn test_lda_indexed_indirect() {
        // LDX #$04; LDA ($FE,X)
        let mut cpu = cpu_with(&[0xA2, 0x04, 0xA1, 0xFE]);
        cpu.memory.load(&[0x34, 0x12], 0x0002).unwrap();
        cpu.memory.write_byte(0x1234u16, 0x77);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0x77);
        assert_eq!(cpu.pc(), ORIGIN + 4);

        // LDX #$01; LDA ($FE,X): pointer high byte comes from $00
        let mut cpu = cpu_with(&[0xA2, 0x01, 0xA1, 0xFE]);
        cpu.memory.write_byte(0x00FFu16, 0x00);
        cpu.memory.write_byte(0x0000u16, 0x40);
        cpu.memory.write_byte(0x4000u16, 0x80);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_adc_carry_out() {
        // LDA #$FF; ADC #$01
        let cpu = run(&[0xA9, 0xFF, 0x69, 0x01], 2);
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.flag(Flag::Carry));
        assert!(cpu.flag(Flag::Zero));
        assert!(!cpu.flag(Flag::Negative));
        assert!(!cpu.flag(Flag::Overflow));
    }

    #[test]
    fn test_adc_signed_overflow() {
        // LDA #$50; ADC #$50
        let cpu = run(&[0xA9, 0x50, 0x69, 0x50], 2);
        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.flag(Flag::Overflow));
        assert!(cpu.flag(Flag::Negative));
        assert!(!cpu.flag(Flag::Carry));
    }

    #[test]
    fn test_adc_adds_carry_in() {
        // SEC; LDA #$10; ADC #$20
        let cpu = run(&[0x38, 0xA9, 0x10, 0x69, 0x20], 3);
        assert_eq!(cpu.a, 0x31);
        assert!(!cpu.flag(Flag::Carry));
    }

    #[test]
    fn test_sbc_borrow() {
        // SEC; LDA #$00; SBC #$01
        let cpu = run(&[0x38, 0xA9, 0x00, 0xE9, 0x01], 3);
        assert_eq!(cpu.a, 0xFF);
        assert!(!cpu.flag(Flag::Carry));
        assert!(cpu.flag(Flag::Negative));
        assert!(!cpu.flag(Flag::Zero));
    }

    #[test]
    fn test_sbc_without_carry_subtracts_one_more() {
        // CLC; LDA #$05; SBC #$02
        let cpu = run(&[0x18, 0xA9, 0x05, 0xE9, 0x02], 3);
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.flag(Flag::Carry));
    }

    #[test]
    fn test_sbc_signed_overflow() {
        // SEC; LDA #$80; SBC #$01
        let cpu = run(&[0x38, 0xA9, 0x80, 0xE9, 0x01], 3);
        assert_eq!(cpu.a, 0x7F);
        assert!(cpu.flag(Flag::Overflow));
        assert!(cpu.flag(Flag::Carry));
    }

    #[test]
    fn test_cmp_equal() {
        // LDA #$10; CMP #$10
        let cpu = run(&[0xA9, 0x10, 0xC9, 0x10], 2);
        assert!(cpu.flag(Flag::Zero));
        assert!(cpu.flag(Flag::Carry));
        assert!(!cpu.flag(Flag::Negative));
        assert_eq!(cpu.a, 0x10);
    }

    #[test]
    fn test_cmp_less_than() {
        // LDA #$10; CMP #$20
        let cpu = run(&[0xA9, 0x10, 0xC9, 0x20], 2);
        assert!(!cpu.flag(Flag::Zero));
        assert!(!cpu.flag(Flag::Carry));
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_cpx_cpy_greater() {
        // LDX #$30; CPX #$20; LDY #$01; CPY $40
        let mut cpu = cpu_with(&[0xA2, 0x30, 0xE0, 0x20, 0xA0, 0x01, 0xC4, 0x40]);
        cpu.memory.write_byte(0x0040u16, 0x02);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert!(cpu.flag(Flag::Carry));
        assert!(!cpu.flag(Flag::Zero));
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert!(!cpu.flag(Flag::Carry));
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_logical_operations() {
        // LDA #$F0; AND #$3C; ORA #$01; EOR #$FF
        let mut cpu = cpu_with(&[0xA9, 0xF0, 0x29, 0x3C, 0x09, 0x01, 0x49, 0xFF]);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0x30);
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0x31);
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0xCE);
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_bit() {
        // LDA #$01; BIT $10
        let mut cpu = cpu_with(&[0xA9, 0x01, 0x24, 0x10]);
        cpu.memory.write_byte(0x0010u16, 0b1100_0000);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert!(cpu.flag(Flag::Zero));
        assert!(cpu.flag(Flag::Overflow));
        assert!(cpu.flag(Flag::Negative));
        assert_eq!(cpu.a, 0x01);
    }

    #[test]
    fn test_asl_accumulator() {
        // LDA #$81; ASL A
        let cpu = run(&[0xA9, 0x81, 0x0A], 2);
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.flag(Flag::Carry));
        assert!(!cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_lsr_memory() {
        // LSR $20
        let mut cpu = cpu_with(&[0x46, 0x20]);
        cpu.memory.write_byte(0x0020u16, 0x01);
        cpu.step().unwrap();
        assert_eq!(cpu.memory.read_byte(0x0020u16), 0x00);
        assert!(cpu.flag(Flag::Carry));
        assert!(cpu.flag(Flag::Zero));
        assert_eq!(cpu.a, 0x00);
    }

    #[test]
    fn test_rotate_through_carry() {
        // SEC; LDA #$80; ROL A; ROR A
        let mut cpu = cpu_with(&[0x38, 0xA9, 0x80, 0x2A, 0x6A]);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.a, 0x01);
        assert!(cpu.flag(Flag::Carry));
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.flag(Flag::Carry));
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_ror_absolute_x() {
        // LDX #$02; ROR $1234,X
        let mut cpu = cpu_with(&[0xA2, 0x02, 0x7E, 0x34, 0x12]);
        cpu.memory.write_byte(0x1236u16, 0x03);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.memory.read_byte(0x1236u16), 0x01);
        assert!(cpu.flag(Flag::Carry));
    }

    #[test]
    fn test_inc_dec_memory_wrap() {
        // INC $10; DEC $11
        let mut cpu = cpu_with(&[0xE6, 0x10, 0xC6, 0x11]);
        cpu.memory.write_byte(0x0010u16, 0xFF);
        cpu.memory.write_byte(0x0011u16, 0x00);
        cpu.step().unwrap();
        assert_eq!(cpu.memory.read_byte(0x0010u16), 0x00);
        assert!(cpu.flag(Flag::Zero));
        cpu.step().unwrap();
        assert_eq!(cpu.memory.read_byte(0x0011u16), 0xFF);
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_register_increments_wrap() {
        // DEX; INY; DEY; DEY
        let mut cpu = cpu_with(&[0xCA, 0xC8, 0x88, 0x88]);
        cpu.step().unwrap();
        assert_eq!(cpu.x, 0xFF);
        assert!(cpu.flag(Flag::Negative));
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.y, 0x00);
        assert!(cpu.flag(Flag::Zero));
        cpu.step().unwrap();
        assert_eq!(cpu.y, 0xFF);

        // LDX #$FF; INX
        let cpu = run(&[0xA2, 0xFF, 0xE8], 2);
        assert_eq!(cpu.x, 0x00);
        assert!(cpu.flag(Flag::Zero));
    }

    #[test]
    fn test_transfers() {
        // LDA #$80; TAX; TAY; LDA #$00; TXA
        let mut cpu = cpu_with(&[0xA9, 0x80, 0xAA, 0xA8, 0xA9, 0x00, 0x8A]);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!((cpu.x, cpu.y), (0x80, 0x80));
        assert!(cpu.flag(Flag::Negative));
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0x80);
    }

    #[test]
    fn test_txs_leaves_flags_tsx_sets_them() {
        // LDX #$00; LDA #$01; TXS; TSX
        let mut cpu = cpu_with(&[0xA2, 0x00, 0xA9, 0x01, 0x9A, 0xBA]);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.sp(), 0x00);
        assert!(!cpu.flag(Flag::Zero));
        cpu.step().unwrap();
        assert!(cpu.flag(Flag::Zero));
    }

    #[test]
    fn test_flag_instructions() {
        // SEC; SED; SEI; CLC; CLD; CLI
        let mut cpu = cpu_with(&[0x38, 0xF8, 0x78, 0x18, 0xD8, 0x58]);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.status(), 0b0000_1101);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.status(), 0);
    }

    #[test]
    fn test_clv() {
        // LDA #$40; ADC #$40; CLV
        let mut cpu = cpu_with(&[0xA9, 0x40, 0x69, 0x40, 0xB8]);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert!(cpu.flag(Flag::Overflow));
        cpu.step().unwrap();
        assert!(!cpu.flag(Flag::Overflow));
        assert!(cpu.flag(Flag::Negative));
    }

    #[test]
    fn test_branch_not_taken() {
        let mut cpu = cpu_with(&[]);
        cpu.set_pc(0x0300);
        // BEQ +5 with Z clear
        cpu.memory.load(&[0xF0, 0x05], 0x0300).unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x0302);
    }

    #[test]
    fn test_branch_taken() {
        let mut cpu = cpu_with(&[]);
        cpu.set_pc(0x0300);
        // BNE +5 with Z clear
        cpu.memory.load(&[0xD0, 0x05], 0x0300).unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x0307);
    }

    #[test]
    fn test_branch_conditions() {
        let cases = [
            (0x10, Flag::Negative, false), // BPL
            (0x30, Flag::Negative, true),  // BMI
            (0x50, Flag::Overflow, false), // BVC
            (0x70, Flag::Overflow, true),  // BVS
            (0x90, Flag::Carry, false),    // BCC
            (0xB0, Flag::Carry, true),     // BCS
            (0xD0, Flag::Zero, false),     // BNE
            (0xF0, Flag::Zero, true),      // BEQ
        ];

        for (opcode, flag, taken_when_set) in cases {
            for set in [false, true] {
                let mut cpu = cpu_with(&[]);
                cpu.set_pc(0x0300);
                cpu.memory.load(&[opcode, 0x05], 0x0300).unwrap();
                cpu.p = if set { flag.mask() } else { 0 };
                let status = cpu.status();

                cpu.step().unwrap();

                let expected = if set == taken_when_set { 0x0307 } else { 0x0302 };
                assert_eq!(cpu.pc(), expected, "opcode {:#04x}, {:?} set: {}", opcode, flag, set);
                assert_eq!(cpu.status(), status, "opcode {:#04x} changed flags", opcode);
            }
        }
    }

    #[test]
    fn test_branch_backward_loop() {
        // LDX #$03; DEX; BNE -3
        let mut cpu = cpu_with(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD]);
        cpu.step().unwrap();
        for _ in 0..3 {
            cpu.step().unwrap();
            cpu.step().unwrap();
        }
        assert_eq!(cpu.x, 0);
        assert_eq!(cpu.pc(), ORIGIN + 5);
    }

    #[test]
    fn test_jmp_absolute_and_indirect() {
        let cpu = run(&[0x4C, 0x34, 0x12], 1);
        assert_eq!(cpu.pc(), 0x1234);

        let mut cpu = cpu_with(&[0x6C, 0x00, 0x02]);
        cpu.memory.load(&[0x78, 0x56], 0x0200).unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x5678);
    }

    #[test]
    fn test_jsr_rts() {
        let mut cpu = cpu_with(&[0x20, 0x34, 0x12]);
        cpu.memory.write_byte(0x1234u16, 0x60);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x1234);
        assert_eq!(cpu.sp(), 0xFB);
        assert_eq!(cpu.memory.read_byte(0x01FDu16), 0x06);
        assert_eq!(cpu.memory.read_byte(0x01FCu16), 0x02);

        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x0603);
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn test_pha_pla_round_trip() {
        // LDA #$C3; LDX #$11; LDY #$22; PHA; LDA #$00; PLA
        let mut cpu = cpu_with(&[0xA9, 0xC3, 0xA2, 0x11, 0xA0, 0x22, 0x48, 0xA9, 0x00, 0x68]);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        let sp = cpu.sp();
        cpu.step().unwrap();
        assert_eq!(cpu.sp(), sp.wrapping_sub(1));
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.a, 0xC3);
        assert_eq!(cpu.sp(), sp);
        assert_eq!((cpu.x, cpu.y), (0x11, 0x22));
        assert!(cpu.flag(Flag::Negative));
        assert!(!cpu.flag(Flag::Zero));
    }

    #[test]
    fn test_php_plp() {
        // SEC; PHP; CLC; PLP
        let mut cpu = cpu_with(&[0x38, 0x08, 0x18, 0x28]);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.memory.read_byte(0x01FDu16), 0b0011_0001);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert!(cpu.flag(Flag::Carry));
        assert!(!cpu.flag(Flag::Break));
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn test_stack_wraps_within_page() {
        // LDX #$00; TXS; PHA
        let cpu = run(&[0xA2, 0x00, 0x9A, 0x48], 3);
        assert_eq!(cpu.sp(), 0xFF);

        // LDX #$FF; TXS; PLA
        let mut cpu = cpu_with(&[0xA2, 0xFF, 0x9A, 0x68]);
        cpu.memory.write_byte(0x0100u16, 0x5A);
        for _ in 0..3 {
            cpu.step().unwrap();
        }
        assert_eq!(cpu.sp(), 0x00);
        assert_eq!(cpu.a, 0x5A);
    }

    #[test]
    fn test_cycles_accumulate_base_counts() {
        // LDA #$01 (2); STA $0200 (4); INC $0200,X (7); NOP (2)
        let cpu = run(&[0xA9, 0x01, 0x8D, 0x00, 0x02, 0xFE, 0x00, 0x02, 0xEA], 4);
        assert_eq!(cpu.cycles(), 15);
    }

    #[test]
    fn test_illegal_opcode_leaves_state_unchanged() {
        let mut cpu = cpu_with(&[0xA9, 0x42, 0x02]);
        cpu.step().unwrap();
        let before = cpu.state();
        let err = cpu.step().unwrap_err();
        assert_eq!(err, EmuError::IllegalOpcode { opcode: 0x02, state: before });
        assert_eq!(cpu.state(), before);
    }

    #[test]
    fn test_brk_without_vectors_is_unimplemented() {
        let mut cpu = cpu_with(&[0x00]);
        let before = cpu.state();
        let err = cpu.step().unwrap_err();
        assert!(matches!(
            err,
            EmuError::UnimplementedInstruction { opcode: 0x00, mnemonic: "BRK", .. }
        ));
        assert_eq!(cpu.state(), before);
        assert_eq!(cpu.memory.read_byte(0x01FDu16), 0);
    }

    #[test]
    fn test_decimal_mode_arithmetic_is_unimplemented() {
        // SED; ADC #$01
        let mut cpu = cpu_with(&[0xF8, 0x69, 0x01]);
        cpu.step().unwrap();
        let before = cpu.state();
        let err = cpu.step().unwrap_err();
        assert!(matches!(err, EmuError::UnimplementedInstruction { opcode: 0x69, .. }));
        assert_eq!(cpu.state(), before);
    }

    fn cpu_with_vectors(program: &[u8]) -> Cpu {
        let mut cpu = Cpu::new(CpuConfig {
            entry: 0,
            vectors: true,
        });
        cpu.memory.load(program, ORIGIN as usize).unwrap();
        cpu.memory.load(&[0x00, 0x06], RESET_VECTOR as usize).unwrap();
        cpu.memory.load(&[0x00, 0x80], IRQ_VECTOR as usize).unwrap();
        cpu.memory.load(&[0x00, 0x90], NMI_VECTOR as usize).unwrap();
        cpu.reset();
        cpu
    }

    #[test]
    fn test_reset_uses_vector_when_enabled() {
        let cpu = cpu_with_vectors(&[]);
        assert_eq!(cpu.pc(), ORIGIN);
    }

    #[test]
    fn test_brk_and_rti_with_vectors() {
        let _ = env_logger::builder().is_test(true).try_init();
        // SEC; BRK; <padding>; at $8000: RTI
        let mut cpu = cpu_with_vectors(&[0x38, 0x00, 0xEA]);
        cpu.memory.write_byte(0x8000u16, 0x40);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x8000);
        assert!(cpu.flag(Flag::IrqDisable));
        assert_eq!(cpu.memory.read_byte(0x01FDu16), 0x06);
        assert_eq!(cpu.memory.read_byte(0x01FCu16), 0x03);
        assert_eq!(cpu.memory.read_byte(0x01FBu16), 0b0011_0001);
        assert_eq!(cpu.cycles(), 2 + 7);

        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x0603);
        assert!(cpu.flag(Flag::Carry));
        assert!(!cpu.flag(Flag::IrqDisable));
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn test_irq_respects_disable_flag() {
        let mut cpu = cpu_with_vectors(&[0x78]);
        assert!(cpu.irq());
        assert_eq!(cpu.pc(), 0x8000);
        assert_eq!(cpu.memory.read_byte(0x01FBu16) & Flag::Break.mask(), 0);
        assert!(!cpu.irq());

        let mut cpu = cpu_with_vectors(&[0x78]);
        cpu.step().unwrap();
        assert!(!cpu.irq());
        assert_eq!(cpu.pc(), ORIGIN + 1);
    }

    #[test]
    fn test_nmi() {
        let mut cpu = cpu_with_vectors(&[0x78]);
        cpu.step().unwrap();
        assert!(cpu.nmi());
        assert_eq!(cpu.pc(), 0x9000);
        assert_eq!(cpu.cycles(), 2 + 7);
    }

    #[test]
    fn test_interrupts_ignored_without_vectors() {
        let mut cpu = cpu_with(&[0xEA]);
        assert!(!cpu.irq());
        assert!(!cpu.nmi());
        assert_eq!(cpu.pc(), ORIGIN);
        assert_eq!(cpu.sp(), 0xFD);
    }

    #[test]
    fn test_current_opcode() {
        let cpu = cpu_with(&[0x6C, 0x00, 0x02]);
        assert_eq!(cpu.current_opcode().mnemonic(), "JMP");
    }
}
