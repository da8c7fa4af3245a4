//! エラー型の定義

use crate::state::CpuState;
use thiserror::Error;

/// 6502エミュレータのエラー型
///
/// 命令の途中で発生することはない。`state` は常に命令実行前のスナップショット。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmuError {
    #[error("Illegal opcode: {opcode:#04x} [{state}]")]
    IllegalOpcode { opcode: u8, state: CpuState },

    #[error("Unimplemented instruction: {mnemonic} ({opcode:#04x}), {reason} [{state}]")]
    UnimplementedInstruction {
        opcode: u8,
        mnemonic: &'static str,
        reason: &'static str,
        state: CpuState,
    },

    #[error("Load out of range: {len} bytes at offset {offset:#06x} exceed the 64KB address space")]
    OutOfRangeLoad { offset: usize, len: usize },
}

impl EmuError {
    /// フォールト発生時のCPU状態（ロードエラーの場合は `None`）
    pub fn state(&self) -> Option<&CpuState> {
        match self {
            EmuError::IllegalOpcode { state, .. } => Some(state),
            EmuError::UnimplementedInstruction { state, .. } => Some(state),
            EmuError::OutOfRangeLoad { .. } => None,
        }
    }
}

/// Result型のエイリアス
pub type Result<T> = std::result::Result<T, EmuError>;
