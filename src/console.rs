//! Local stand-in for the message bus: text commands on stdin plus a
//! periodic status tick, merged into the kernel's inbound channel.

use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::message::Inbound;

pub const HELP: &str = "\
commands:
  noop                      no operation
  reset                     zero counters
  radio-tlm                 send radio configuration telemetry
  lna <0-1>                 set low noise amplifier mode
  mod <sf 5-12> <bw 0-3> <cr 1-7>
                            set modulation parameters
  ramp <0-7>                set power amp ramp time
  reg <0-1>                 set power regulator mode
  freq <mhz>                set radio frequency
  standby <0-1>             set standby mode
  start                     trigger the transmit demo
  stop                      clear the demo active flag
  help                      show this text";

/// Parse one console line. Blank lines yield `Ok(None)`.
///
/// Values are passed through unvalidated so out-of-range requests reach the
/// kernel and are rejected there.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb, args.as_slice()) {
        ("noop", []) => Command::NoOp,
        ("reset", []) => Command::Reset,
        ("radio-tlm", []) => Command::SendRadioTelemetry,
        ("lna", [v]) => Command::SetLowNoiseAmpMode(parse_arg(v)?),
        ("mod", [sf, bw, cr]) => Command::SetModulationParams {
            spreading_factor: parse_arg(sf)?,
            bandwidth: parse_arg(bw)?,
            coding_rate: parse_arg(cr)?,
        },
        ("ramp", [v]) => Command::SetPowerAmpRampTime(parse_arg(v)?),
        ("reg", [v]) => Command::SetPowerRegulatorMode(parse_arg(v)?),
        ("freq", [v]) => Command::SetRadioFrequency(parse_arg(v)?),
        ("standby", [v]) => Command::SetStandbyMode(parse_arg(v)?),
        ("start", []) => Command::StartTxDemo,
        ("stop", []) => Command::StopTxDemo,
        _ => return Err(format!("unrecognised command: {}", line.trim())),
    };
    Ok(Some(command))
}

fn parse_arg<T: std::str::FromStr>(word: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("bad argument: {word}"))
}

/// Feeds the kernel's inbound channel from a line reader and a tick timer.
pub struct InputHandler {
    handles: Vec<JoinHandle<()>>,
}

impl InputHandler {
    pub fn new<R>(reader: R, tick: Duration, tx: tokio_mpsc::Sender<Inbound>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        // Line reader task. The kernel sees the pipe close once input ends.
        let tx_lines = tx.clone();
        let lines_task = tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("console read failed: {e}");
                        break;
                    }
                };
                if line.trim() == "help" {
                    println!("{HELP}");
                    continue;
                }
                match parse_line(&line) {
                    Ok(Some(command)) => {
                        debug!("console command {command}");
                        if tx_lines.send(Inbound::Command(command)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{e} (try 'help')"),
                }
            }
        });

        // Status tick task.
        let tick_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                if tx.send(Inbound::OneHz).await.is_err() {
                    break;
                }
            }
        });

        Self {
            handles: vec![lines_task, tick_task],
        }
    }

    /// Wait for the line reader to reach end of input, then stop the tick.
    pub async fn finished(mut self) {
        let mut handles = self.handles.drain(..);
        if let Some(lines) = handles.next() {
            let _ = lines.await;
        }
        for handle in handles {
            handle.abort();
        }
    }
}
