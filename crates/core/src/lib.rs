//! # m6502 Core
//! MOS 6502 命令セットインタプリタ（64KBフラットメモリ、10進モード非対応）

pub mod addressing;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod opcodes;
pub mod state;

pub use cpu::{Cpu, CpuConfig};
pub use error::{EmuError, Result};
pub use opcodes::{Instruction, Opcode};
pub use state::{CpuState, Flag};

/// 実行ループの停止理由
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Halt {
    /// 命令実行後もPCが同じアドレス（自分自身へのジャンプ/分岐）
    Trap { pc: u16 },
    /// 指定ステップ数を実行した
    StepLimit,
}

/// 6502エミュレータのメインインスタンス
pub struct Machine {
    cpu: Cpu,
    steps: u64,
}

impl Machine {
    /// 新しいインスタンスを作成（エントリポイント $0000、ベクタ無効）
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    pub fn with_config(config: CpuConfig) -> Self {
        Self {
            cpu: Cpu::new(config),
            steps: 0,
        }
    }

    /// バイト列をメモリの `offset` にロード。範囲外なら何も書き込まない
    pub fn load(&mut self, data: &[u8], offset: usize) -> Result<()> {
        self.cpu.memory.load(data, offset)?;
        log::debug!("Loaded {} bytes at {:#06x}", data.len(), offset);
        Ok(())
    }

    /// レジスタをリセット（メモリは保持）
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.steps = 0;
    }

    /// 1命令実行し、実行後の状態を返す
    pub fn step(&mut self) -> Result<CpuState> {
        self.cpu.step()?;
        self.steps += 1;
        Ok(self.cpu.state())
    }

    /// トラップまたはフォールトまで実行
    pub fn run(&mut self) -> Result<Halt> {
        self.run_until(None)
    }

    /// 最大 `max_steps` 命令まで実行
    pub fn run_for(&mut self, max_steps: u64) -> Result<Halt> {
        self.run_until(Some(max_steps))
    }

    fn run_until(&mut self, max_steps: Option<u64>) -> Result<Halt> {
        let mut executed = 0u64;
        loop {
            if max_steps.is_some_and(|max| executed >= max) {
                return Ok(Halt::StepLimit);
            }

            let pc = self.cpu.pc();
            self.step()?;
            executed += 1;

            if self.cpu.pc() == pc {
                log::info!(
                    "Trap at PC={:#06x} after {} instructions, {} cycles",
                    pc,
                    self.steps,
                    self.cpu.cycles()
                );
                return Ok(Halt::Trap { pc });
            }
        }
    }

    /// IRQを要求（ベクタ無効時またはIフラグ設定時は無視）
    pub fn irq(&mut self) -> bool {
        self.cpu.irq()
    }

    /// NMIを要求（ベクタ無効時は無視）
    pub fn nmi(&mut self) -> bool {
        self.cpu.nmi()
    }

    /// CPU状態の取得（デバッグ用）
    pub fn cpu_state(&self) -> CpuState {
        self.cpu.state()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// リセット以降に実行した命令数
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    pub fn sp(&self) -> u8 {
        self.cpu.sp()
    }

    pub fn a(&self) -> u8 {
        self.cpu.a()
    }

    pub fn x(&self) -> u8 {
        self.cpu.x()
    }

    pub fn y(&self) -> u8 {
        self.cpu.y()
    }

    pub fn status(&self) -> u8 {
        self.cpu.status()
    }

    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.cpu.flag(flag)
    }

    /// オペコードテーブルの参照（トレース用）
    pub fn opcode(&self, byte: u8) -> &'static Opcode {
        opcodes::lookup(byte)
    }

    // ========== メモリ API ==========

    pub fn peek(&self, address: u16) -> u8 {
        self.cpu.memory.read_byte(address)
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.cpu.memory.write_byte(address, value);
    }

    /// メモリ範囲を読み取り（$FFFFで折り返す）
    pub fn read_memory_range(&self, start: u16, length: usize) -> Vec<u8> {
        (0..length)
            .map(|i| self.peek(start.wrapping_add(i as u16)))
            .collect()
    }

    /// メモリダンプを16進数文字列で取得
    pub fn hex_dump(&self, start: u16, length: usize) -> String {
        self.cpu.memory.hex_dump(start, length)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
