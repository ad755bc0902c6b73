use ls8::definitions::DEFAULT_CLOCK_HZ;
use ls8::io::{ByteRead, ByteWrite, Poll};
use ls8::{translate, Cpu, CpuResult, RuntimeError};

use clap::{arg, command, value_parser, ArgAction};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use crossterm::tty::IsTty;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;
use std::thread;
use std::time::{Duration, Instant};

// longest single catch-up the scheduler will attempt
const MAX_TICK: Duration = Duration::from_millis(250);

/// Non-blocking keyboard on top of the raw-mode terminal. Raw mode is only
/// entered when stdin actually is a terminal, and is restored on drop.
struct TerminalKeys {
    raw_mode: bool,
}

impl TerminalKeys {
    fn new() -> Self {
        let raw_mode = io::stdin().is_tty() && terminal::enable_raw_mode().is_ok();
        Self { raw_mode }
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = terminal::disable_raw_mode();
        }
    }
}

impl ByteRead for TerminalKeys {
    fn read_byte(&mut self) -> io::Result<Poll> {
        if !self.raw_mode {
            return Ok(Poll::WouldBlock);
        }

        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }

            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
            }

            let byte = match key.code {
                KeyCode::Char(c) if c.is_ascii() => c as u8,
                KeyCode::Enter => b'\n',
                KeyCode::Backspace => 0x08,
                KeyCode::Tab => b'\t',
                KeyCode::Esc => 0x1B,
                _ => continue,
            };
            return Ok(Poll::Byte(byte));
        }

        Ok(Poll::WouldBlock)
    }
}

struct StdoutWriter {
    raw_mode: bool,
}

impl ByteWrite for StdoutWriter {
    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut stdout = io::stdout();
        if self.raw_mode {
            // raw mode disables output post-processing, so newlines need an
            // explicit carriage return
            for &byte in bytes {
                let _ = if byte == b'\n' {
                    stdout.write_all(b"\r\n")
                } else {
                    stdout.write_all(&[byte])
                };
            }
        } else {
            let _ = stdout.write_all(bytes);
        }
        let _ = stdout.flush();
    }
}

/// Drive the CPU against wall-clock time: every tick runs as many steps as
/// the configured clock rate owes since the last tick, with a cap on how
/// far a single tick may catch up.
fn run(cpu: &mut Cpu<TerminalKeys, StdoutWriter>, hz: u64, trace: bool) -> CpuResult {
    let mut last_tick = Instant::now();

    while !cpu.halted() {
        let elapsed = last_tick.elapsed().min(MAX_TICK);
        last_tick = Instant::now();

        let steps = (elapsed.as_secs_f64() * hz as f64).ceil() as u64;
        for _ in 0..steps {
            if trace {
                eprintln!("{}", cpu.trace());
            }
            cpu.step()?;
            if cpu.halted() {
                break;
            }
        }

        thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

fn main() {
    let file_arg = arg!(<file> "The .ls8 assembly source to run")
        .value_parser(value_parser!(PathBuf));
    let hz_arg = arg!(--hz <HZ> "Clock rate in instructions per second")
        .required(false)
        .value_parser(value_parser!(u64));
    let trace_arg =
        arg!(--trace "Print a state line for every step to stderr").action(ArgAction::SetTrue);

    let matches = command!()
        .arg(file_arg)
        .arg(hz_arg)
        .arg(trace_arg)
        .get_matches();

    let path = matches.get_one::<PathBuf>("file").unwrap();
    let hz = matches
        .get_one::<u64>("hz")
        .copied()
        .unwrap_or(DEFAULT_CLOCK_HZ);
    let trace = *matches.get_one::<bool>("trace").unwrap();

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{} {}: {}", "error".red().bold(), path.display(), error);
            exit(1);
        }
    };

    eprintln!("{:>12} {}", "Assembling".green().bold(), path.display());
    let program = match translate(&source) {
        Ok(program) => program,
        Err(errors) => {
            for error in errors.iter() {
                eprintln!("{} {}", "error".red().bold(), error);
            }
            exit(1);
        }
    };

    let keys = TerminalKeys::new();
    let writer = StdoutWriter {
        raw_mode: keys.raw_mode,
    };

    let mut cpu = Cpu::new(keys, writer);
    cpu.set_clock_rate(hz);
    if let Err(error) = cpu.load(&program) {
        drop(cpu);
        eprintln!("{} {}", "error".red().bold(), error);
        exit(1);
    }

    match run(&mut cpu, hz, trace) {
        Ok(()) => {}
        Err(RuntimeError::Io(error)) if error.kind() == io::ErrorKind::Interrupted => {
            drop(cpu);
            exit(130);
        }
        Err(error) => {
            drop(cpu);
            eprintln!("{} {}", "error".red().bold(), error);
            exit(1);
        }
    }
}
