//! # CPU State Snapshot
//! Registers, status flags and cycle count captured between instructions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status register bits. Bit 5 is unused and never read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flag {
    Carry      = 0b00000001,
    Zero       = 0b00000010,
    IrqDisable = 0b00000100,
    Decimal    = 0b00001000,
    Break      = 0b00010000,
    Unused     = 0b00100000,
    Overflow   = 0b01000000,
    Negative   = 0b10000000,
}

impl Flag {
    /// Flags in display order, most significant bit first.
    pub const ALL: [Flag; 8] = [
        Flag::Negative,
        Flag::Overflow,
        Flag::Unused,
        Flag::Break,
        Flag::Decimal,
        Flag::IrqDisable,
        Flag::Zero,
        Flag::Carry,
    ];

    pub fn mask(self) -> u8 {
        self as u8
    }

    fn letter(self) -> char {
        match self {
            Flag::Negative => 'N',
            Flag::Overflow => 'V',
            Flag::Unused => '-',
            Flag::Break => 'B',
            Flag::Decimal => 'D',
            Flag::IrqDisable => 'I',
            Flag::Zero => 'Z',
            Flag::Carry => 'C',
        }
    }
}

/// Value copy of the register file.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub p: u8,
    pub cycles: u64,
}

impl CpuState {
    pub fn flag(&self, flag: Flag) -> bool {
        self.p & flag.mask() != 0
    }

    /// `NV-BDIZC` with set flags in upper case and clear flags in lower case.
    pub fn flags_string(&self) -> String {
        Flag::ALL
            .iter()
            .map(|&flag| match (flag, self.flag(flag)) {
                (Flag::Unused, _) => '-',
                (_, true) => flag.letter(),
                (_, false) => flag.letter().to_ascii_lowercase(),
            })
            .collect()
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC: {:04X}  A: {:02X}  X: {:02X}  Y: {:02X}  SP: {:02X}  P: {:02X} [{}]  CYC: {}",
            self.pc,
            self.a,
            self.x,
            self.y,
            self.sp,
            self.p,
            self.flags_string(),
            self.cycles
        )
    }
}
