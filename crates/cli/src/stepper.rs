//! 対話型ステップ実行
//!
//! Enter/s: 1命令実行, c: 停止まで実行, r: リセット, q: 終了

use anyhow::Result;
use m6502_core::Machine;
use std::io::{BufRead, Write};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Command {
    Step,
    Continue,
    Reset,
    Quit,
}

impl Command {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "" | "s" => Some(Command::Step),
            "c" => Some(Command::Continue),
            "r" => Some(Command::Reset),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// 入力が尽きるか `q` で終了。フォールトは表示してその状態に留まる
pub fn run<R: BufRead, W: Write>(
    machine: &mut Machine,
    input: R,
    mut output: W,
    max_steps: Option<u64>,
) -> Result<()> {
    print_status(machine, &mut output)?;

    for line in input.lines() {
        let line = line?;
        match Command::parse(line.trim()) {
            Some(Command::Step) => match machine.step() {
                Ok(_) => print_status(machine, &mut output)?,
                Err(e) => writeln!(output, "Fault: {}", e)?,
            },
            Some(Command::Continue) => {
                let result = match max_steps {
                    Some(max_steps) => machine.run_for(max_steps),
                    None => machine.run(),
                };
                match result {
                    Ok(halt) => writeln!(output, "Halted: {:?}", halt)?,
                    Err(e) => writeln!(output, "Fault: {}", e)?,
                }
                print_status(machine, &mut output)?;
            }
            Some(Command::Reset) => {
                machine.reset();
                print_status(machine, &mut output)?;
            }
            Some(Command::Quit) => break,
            None => writeln!(
                output,
                "Unknown command: {:?} (Enter/s=step, c=continue, r=reset, q=quit)",
                line.trim()
            )?,
        }
    }

    Ok(())
}

fn print_status<W: Write>(machine: &Machine, output: &mut W) -> Result<()> {
    let pc = machine.pc();
    let opcode = machine.cpu().current_opcode();
    let bytes = machine.read_memory_range(pc, opcode.len() as usize);
    let bytes: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();

    writeln!(output, "{}", machine.cpu_state())?;
    writeln!(
        output,
        "next: {:04X}  {:<8}  {} {:?}",
        pc,
        bytes.join(" "),
        opcode.mnemonic(),
        opcode.mode
    )?;
    write!(output, "{}", machine.hex_dump(pc & 0xFFF0, 32))?;
    output.flush()?;
    Ok(())
}
