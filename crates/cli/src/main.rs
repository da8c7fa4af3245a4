//! # m6502 CLI
//!
//! ROMファイルをロードして実行するコマンドラインフロントエンド

mod stepper;

use anyhow::{Context, Result};
use clap::Parser;
use m6502_core::{CpuConfig, Halt, Machine};
use std::path::PathBuf;

/// MOS 6502 インタプリタ CLI
#[derive(Parser, Debug)]
#[command(name = "m6502")]
#[command(about = "MOS 6502 instruction-set interpreter", long_about = None)]
struct Args {
    /// ROMファイルのパス（生バイナリ）
    #[arg(value_name = "ROM")]
    rom_path: PathBuf,

    /// ロード先アドレス（0x1234, $1234, 4660 形式）
    #[arg(short, long, default_value = "0x0000", value_parser = parse_address)]
    load_address: u16,

    /// 実行開始アドレス（--vectors 指定時はリセットベクタを優先）
    #[arg(short, long, default_value = "0x0400", value_parser = parse_address)]
    entry: u16,

    /// 最大実行命令数
    #[arg(long)]
    max_steps: Option<u64>,

    /// BRK/IRQ/NMI/RESET ベクタを有効化
    #[arg(long)]
    vectors: bool,

    /// ステップ実行モード
    #[arg(short, long)]
    step: bool,

    /// 終了時のCPU状態をJSONで出力
    #[arg(long)]
    dump_state: bool,

    /// デバッグログ
    #[arg(short, long)]
    verbose: bool,

    /// 命令ごとのトレースログ
    #[arg(long)]
    trace: bool,
}

fn parse_address(s: &str) -> std::result::Result<u16, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('$'))
    {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse::<u16>()
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

fn init_logger(args: &Args) {
    let level = if args.trace {
        "trace"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args);

    // ROMの読み込み
    let rom_data = std::fs::read(&args.rom_path)
        .with_context(|| format!("Failed to read ROM: {}", args.rom_path.display()))?;
    log::info!("Loaded ROM: {:?} ({} bytes)", args.rom_path, rom_data.len());

    let mut machine = Machine::with_config(CpuConfig {
        entry: args.entry,
        vectors: args.vectors,
    });
    machine
        .load(&rom_data, args.load_address as usize)
        .context("ROM does not fit in memory")?;
    // ベクタ有効時はロード済みROMのリセットベクタを読む
    machine.reset();

    if args.step {
        let stdin = std::io::stdin();
        stepper::run(&mut machine, stdin.lock(), std::io::stdout(), args.max_steps)?;
        return finish(&machine, &args);
    }

    log::info!("Starting emulation at {:#06x}", machine.pc());
    let result = match args.max_steps {
        Some(max_steps) => machine.run_for(max_steps),
        None => machine.run(),
    };

    match result {
        Ok(Halt::Trap { pc }) => println!("Trapped at ${:04X}", pc),
        Ok(Halt::StepLimit) => println!("Step limit reached"),
        Err(e) => {
            log::error!("Emulation error: {}", e);
            finish(&machine, &args)?;
            return Err(e.into());
        }
    }

    log::info!("Emulation stopped");
    finish(&machine, &args)
}

fn finish(machine: &Machine, args: &Args) -> Result<()> {
    println!("{}", machine.cpu_state());
    println!("Instructions: {}", machine.steps());
    if args.dump_state {
        println!("{}", serde_json::to_string_pretty(&machine.cpu_state())?);
    }
    Ok(())
}
