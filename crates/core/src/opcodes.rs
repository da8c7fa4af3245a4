//! # Opcode Table
//! Every byte value maps to exactly one entry. Unassigned slots map to
//! `Instruction::Illegal`, which the CPU reports as a fault.

use crate::addressing::Mode;

#[rustfmt::skip]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    Illegal,
}

impl Instruction {
    #[rustfmt::skip]
    pub const fn mnemonic(self) -> &'static str {
        use Instruction::*;
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD",
            Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC",
            Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR", Lda => "LDA",
            Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP", Ora => "ORA",
            Pha => "PHA", Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stx => "STX", Sty => "STY",
            Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA", Txs => "TXS",
            Tya => "TYA", Illegal => "???",
        }
    }
}

/// One slot of the opcode table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub mode: Mode,
    /// Base cycle count; page-crossing and branch-taken penalties are not modelled.
    pub cycles: u8,
}

impl Opcode {
    pub const ILLEGAL: Opcode = Opcode {
        instruction: Instruction::Illegal,
        mode: Mode::Implied,
        cycles: 0,
    };

    pub const fn mnemonic(&self) -> &'static str {
        self.instruction.mnemonic()
    }

    pub fn is_legal(&self) -> bool {
        self.instruction != Instruction::Illegal
    }

    /// Opcode byte plus operand bytes.
    pub fn len(&self) -> u16 {
        1 + self.mode.operand_len()
    }
}

const fn op(instruction: Instruction, mode: Mode, cycles: u8) -> Opcode {
    Opcode { instruction, mode, cycles }
}

const XXX: Opcode = Opcode::ILLEGAL;

pub fn lookup(opcode: u8) -> &'static Opcode {
    &OPCODES[opcode as usize]
}

use Instruction::*;
use Mode::*;

#[rustfmt::skip]
pub static OPCODES: [Opcode; 256] = [
    // 0x00
    op(Brk, Implied, 7),    op(Ora, IndirectX, 6),  XXX,                    XXX,
    XXX,                    op(Ora, ZeroPage, 3),   op(Asl, ZeroPage, 5),   XXX,
    op(Php, Implied, 3),    op(Ora, Immediate, 2),  op(Asl, Implied, 2),    XXX,
    XXX,                    op(Ora, Absolute, 4),   op(Asl, Absolute, 6),   XXX,
    // 0x10
    op(Bpl, Relative, 2),   op(Ora, IndirectY, 5),  XXX,                    XXX,
    XXX,                    op(Ora, ZeroPageX, 4),  op(Asl, ZeroPageX, 6),  XXX,
    op(Clc, Implied, 2),    op(Ora, AbsoluteY, 4),  XXX,                    XXX,
    XXX,                    op(Ora, AbsoluteX, 4),  op(Asl, AbsoluteX, 7),  XXX,
    // 0x20
    op(Jsr, Absolute, 6),   op(And, IndirectX, 6),  XXX,                    XXX,
    op(Bit, ZeroPage, 3),   op(And, ZeroPage, 3),   op(Rol, ZeroPage, 5),   XXX,
    op(Plp, Implied, 4),    op(And, Immediate, 2),  op(Rol, Implied, 2),    XXX,
    op(Bit, Absolute, 4),   op(And, Absolute, 4),   op(Rol, Absolute, 6),   XXX,
    // 0x30
    op(Bmi, Relative, 2),   op(And, IndirectY, 5),  XXX,                    XXX,
    XXX,                    op(And, ZeroPageX, 4),  op(Rol, ZeroPageX, 6),  XXX,
    op(Sec, Implied, 2),    op(And, AbsoluteY, 4),  XXX,                    XXX,
    XXX,                    op(And, AbsoluteX, 4),  op(Rol, AbsoluteX, 7),  XXX,
    // 0x40
    op(Rti, Implied, 6),    op(Eor, IndirectX, 6),  XXX,                    XXX,
    XXX,                    op(Eor, ZeroPage, 3),   op(Lsr, ZeroPage, 5),   XXX,
    op(Pha, Implied, 3),    op(Eor, Immediate, 2),  op(Lsr, Implied, 2),    XXX,
    op(Jmp, Absolute, 3),   op(Eor, Absolute, 4),   op(Lsr, Absolute, 6),   XXX,
    // 0x50
    op(Bvc, Relative, 2),   op(Eor, IndirectY, 5),  XXX,                    XXX,
    XXX,                    op(Eor, ZeroPageX, 4),  op(Lsr, ZeroPageX, 6),  XXX,
    op(Cli, Implied, 2),    op(Eor, AbsoluteY, 4),  XXX,                    XXX,
    XXX,                    op(Eor, AbsoluteX, 4),  op(Lsr, AbsoluteX, 7),  XXX,
    // 0x60
    op(Rts, Implied, 6),    op(Adc, IndirectX, 6),  XXX,                    XXX,
    XXX,                    op(Adc, ZeroPage, 3),   op(Ror, ZeroPage, 5),   XXX,
    op(Pla, Implied, 4),    op(Adc, Immediate, 2),  op(Ror, Implied, 2),    XXX,
    op(Jmp, Indirect, 5),   op(Adc, Absolute, 4),   op(Ror, Absolute, 6),   XXX,
    // 0x70
    op(Bvs, Relative, 2),   op(Adc, IndirectY, 5),  XXX,                    XXX,
    XXX,                    op(Adc, ZeroPageX, 4),  op(Ror, ZeroPageX, 6),  XXX,
    op(Sei, Implied, 2),    op(Adc, AbsoluteY, 4),  XXX,                    XXX,
    XXX,                    op(Adc, AbsoluteX, 4),  op(Ror, AbsoluteX, 7),  XXX,
    // 0x80
    XXX,                    op(Sta, IndirectX, 6),  XXX,                    XXX,
    op(Sty, ZeroPage, 3),   op(Sta, ZeroPage, 3),   op(Stx, ZeroPage, 3),   XXX,
    op(Dey, Implied, 2),    XXX,                    op(Txa, Implied, 2),    XXX,
    op(Sty, Absolute, 4),   op(Sta, Absolute, 4),   op(Stx, Absolute, 4),   XXX,
    // 0x90
    op(Bcc, Relative, 2),   op(Sta, IndirectY, 6),  XXX,                    XXX,
    op(Sty, ZeroPageX, 4),  op(Sta, ZeroPageX, 4),  op(Stx, ZeroPageY, 4),  XXX,
    op(Tya, Implied, 2),    op(Sta, AbsoluteY, 5),  op(Txs, Implied, 2),    XXX,
    XXX,                    op(Sta, AbsoluteX, 5),  XXX,                    XXX,
    // 0xA0
    op(Ldy, Immediate, 2),  op(Lda, IndirectX, 6),  op(Ldx, Immediate, 2),  XXX,
    op(Ldy, ZeroPage, 3),   op(Lda, ZeroPage, 3),   op(Ldx, ZeroPage, 3),   XXX,
    op(Tay, Implied, 2),    op(Lda, Immediate, 2),  op(Tax, Implied, 2),    XXX,
    op(Ldy, Absolute, 4),   op(Lda, Absolute, 4),   op(Ldx, Absolute, 4),   XXX,
    // 0xB0
    op(Bcs, Relative, 2),   op(Lda, IndirectY, 5),  XXX,                    XXX,
    op(Ldy, ZeroPageX, 4),  op(Lda, ZeroPageX, 4),  op(Ldx, ZeroPageY, 4),  XXX,
    op(Clv, Implied, 2),    op(Lda, AbsoluteY, 4),  op(Tsx, Implied, 2),    XXX,
    op(Ldy, AbsoluteX, 4),  op(Lda, AbsoluteX, 4),  op(Ldx, AbsoluteY, 4),  XXX,
    // 0xC0
    op(Cpy, Immediate, 2),  op(Cmp, IndirectX, 6),  XXX,                    XXX,
    op(Cpy, ZeroPage, 3),   op(Cmp, ZeroPage, 3),   op(Dec, ZeroPage, 5),   XXX,
    op(Iny, Implied, 2),    op(Cmp, Immediate, 2),  op(Dex, Implied, 2),    XXX,
    op(Cpy, Absolute, 4),   op(Cmp, Absolute, 4),   op(Dec, Absolute, 6),   XXX,
    // 0xD0
    op(Bne, Relative, 2),   op(Cmp, IndirectY, 5),  XXX,                    XXX,
    XXX,                    op(Cmp, ZeroPageX, 4),  op(Dec, ZeroPageX, 6),  XXX,
    op(Cld, Implied, 2),    op(Cmp, AbsoluteY, 4),  XXX,                    XXX,
    XXX,                    op(Cmp, AbsoluteX, 4),  op(Dec, AbsoluteX, 7),  XXX,
    // 0xE0
    op(Cpx, Immediate, 2),  op(Sbc, IndirectX, 6),  XXX,                    XXX,
    op(Cpx, ZeroPage, 3),   op(Sbc, ZeroPage, 3),   op(Inc, ZeroPage, 5),   XXX,
    op(Inx, Implied, 2),    op(Sbc, Immediate, 2),  op(Nop, Implied, 2),    XXX,
    op(Cpx, Absolute, 4),   op(Sbc, Absolute, 4),   op(Inc, Absolute, 6),   XXX,
    // 0xF0
    op(Beq, Relative, 2),   op(Sbc, IndirectY, 5),  XXX,                    XXX,
    XXX,                    op(Sbc, ZeroPageX, 4),  op(Inc, ZeroPageX, 6),  XXX,
    op(Sed, Implied, 2),    op(Sbc, AbsoluteY, 4),  XXX,                    XXX,
    XXX,                    op(Sbc, AbsoluteX, 4),  op(Inc, AbsoluteX, 7),  XXX,
];
