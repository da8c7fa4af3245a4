//! # Addressing Modes
//! Turns the operand bytes after an opcode into an [`Operand`], leaving PC
//! just past the instruction.

use crate::cpu::Cpu;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No operand bytes. Also covers the accumulator form of ASL/LSR/ROL/ROR.
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// JMP only.
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    pub const fn operand_len(self) -> u16 {
        match self {
            Mode::Implied => 0,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::Relative => 1,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 2,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Reads as the accumulator.
    Implied,
    Immediate(u8),
    /// Effective address. For branches this is the target.
    Address(u16),
}

impl Cpu {
    pub(crate) fn next_byte(&mut self) -> u8 {
        let value = self.memory.read_byte(self.pc);
        self.increment_pc();
        value
    }

    pub(crate) fn next_word(&mut self) -> u16 {
        let lo = self.next_byte() as u16;
        let hi = self.next_byte() as u16;
        (hi << 8) | lo
    }

    pub(crate) fn increment_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    pub(crate) fn resolve(&mut self, mode: Mode) -> Operand {
        match mode {
            Mode::Implied => Operand::Implied,
            Mode::Immediate => Operand::Immediate(self.next_byte()),
            Mode::ZeroPage => Operand::Address(self.next_byte() as u16),
            Mode::ZeroPageX => Operand::Address(low_byte(offset(self.next_byte(), self.x))),
            Mode::ZeroPageY => Operand::Address(low_byte(offset(self.next_byte(), self.y))),
            Mode::Absolute => Operand::Address(self.next_word()),
            Mode::AbsoluteX => Operand::Address(offset(self.next_word(), self.x)),
            Mode::AbsoluteY => Operand::Address(offset(self.next_word(), self.y)),
            Mode::Indirect => {
                let i = self.next_word();
                Operand::Address(self.memory.read_word(i))
            }
            Mode::IndirectX => {
                let i = self.next_byte().wrapping_add(self.x);
                Operand::Address(self.memory.read_noncontinuous_word(i, i.wrapping_add(1)))
            }
            Mode::IndirectY => {
                let i = self.next_byte();
                let base = self.memory.read_noncontinuous_word(i, i.wrapping_add(1));
                Operand::Address(offset(base, self.y))
            }
            Mode::Relative => {
                let displacement = self.next_byte() as i8;
                Operand::Address(self.pc.wrapping_add(displacement as u16))
            }
        }
    }
}

fn offset<T: Into<u16>>(base: T, offset: u8) -> u16 {
    base.into().wrapping_add(offset as u16)
}

fn low_byte<T: Into<u16>>(value: T) -> u16 {
    value.into() & 0xFF
}
