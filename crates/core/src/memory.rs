//! # Memory
//! Flat 64KB address space. No mirroring, no memory-mapped devices.

use crate::error::{EmuError, Result};

pub const MEMORY_SIZE: usize = 0x10000;

pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            data: vec![0; MEMORY_SIZE],
        }
    }

    pub fn read_byte<T: Into<u16>>(&self, address: T) -> u8 {
        self.data[address.into() as usize]
    }

    pub fn write_byte<T: Into<u16>>(&mut self, address: T, value: u8) {
        self.data[address.into() as usize] = value;
    }

    pub fn read_noncontinuous_word<T: Into<u16>, U: Into<u16>>(&self, a: T, b: U) -> u16 {
        (self.read_byte(a) as u16) | (self.read_byte(b) as u16) << 8
    }

    /// Little-endian word; the high byte address wraps at 0xFFFF.
    pub fn read_word<T: Into<u16>>(&self, address: T) -> u16 {
        let address = address.into();
        self.read_noncontinuous_word(address, address.wrapping_add(1))
    }

    /// Copies `data` to `offset`. Nothing is written when the range does not fit.
    pub fn load(&mut self, data: &[u8], offset: usize) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= MEMORY_SIZE)
            .ok_or(EmuError::OutOfRangeLoad {
                offset,
                len: data.len(),
            })?;
        self.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// 16 bytes per line: address, hex bytes, ASCII column. Clipped at $FFFF.
    pub fn hex_dump(&self, start: u16, length: usize) -> String {
        let start = start as usize;
        let end = start.saturating_add(length).min(MEMORY_SIZE);
        let mut result = String::new();

        for addr in (start..end).step_by(16) {
            result.push_str(&format!("{:04X}: ", addr));

            for i in 0..16 {
                if addr + i < end {
                    result.push_str(&format!("{:02X} ", self.data[addr + i]));
                } else {
                    result.push_str("   ");
                }
                if i == 7 {
                    result.push(' ');
                }
            }

            result.push_str(" |");
            for b in &self.data[addr..(addr + 16).min(end)] {
                if b.is_ascii_graphic() || *b == b' ' {
                    result.push(*b as char);
                } else {
                    result.push('.');
                }
            }
            result.push_str("|\n");
        }

        result
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
