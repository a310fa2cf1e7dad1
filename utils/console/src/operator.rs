use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, PoisonError};

use colored::*;
use kernel::ConsoleDevice;
use types::Pid;

/// Console device backed by the operator.
///
/// In blocking mode a read prompts on stdin directly. In continuous mode the
/// prompt stays with the command loop, so reads wait for a value sent by the
/// `in` command.
pub struct OperatorConsole {
    continuous: Arc<AtomicBool>,
    input: Mutex<Receiver<i32>>,
}

impl OperatorConsole {
    pub fn new(continuous: Arc<AtomicBool>, input: Receiver<i32>) -> Self {
        Self {
            continuous,
            input: Mutex::new(input),
        }
    }

    fn prompt_stdin(pid: Pid) -> i32 {
        let stdin = io::stdin();
        loop {
            print!("{} ", format!("P{} input>", pid).yellow());
            let _ = io::stdout().flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return 0,
                Ok(_) => {}
            }
            match line.trim().parse() {
                Ok(value) => return value,
                Err(_) => println!("{}", "enter an integer".red()),
            }
        }
    }
}

impl ConsoleDevice for OperatorConsole {
    fn read(&self, pid: Pid) -> i32 {
        if !self.continuous.load(Ordering::SeqCst) {
            return Self::prompt_stdin(pid);
        }
        println!("{}", format!("P{} waiting for input (in <value>)", pid).yellow());
        // The sender goes away on exit; unblock with 0.
        let input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        input.recv().unwrap_or(0)
    }

    fn write(&self, pid: Pid, value: i32) {
        println!("{} P{}: {}", "OUT".green().bold(), pid, value);
    }
}
