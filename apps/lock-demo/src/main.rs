use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::Context;
use ao_active::{ActiveConfig, ExecutionMode, ThreadPriority};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use lock_ctrl_service::{
    LockCtrlService, LockState, SelfTestOutcome, SelfTestResult, SimulatedLockDriver,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive the lock controller service from the console")]
struct Args {
    /// Outcome reported by the simulated driver's self-test
    #[arg(long = "self-test", value_enum, default_value_t = SimulatedOutcome::Pass)]
    self_test: SimulatedOutcome,

    /// Log driver calls and service lifecycle
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SimulatedOutcome {
    Pass,
    FailPower,
    FailMotor,
}

impl From<SimulatedOutcome> for SelfTestOutcome {
    fn from(outcome: SimulatedOutcome) -> Self {
        match outcome {
            SimulatedOutcome::Pass => SelfTestOutcome::Passed,
            SimulatedOutcome::FailPower => SelfTestOutcome::FailedPower,
            SimulatedOutcome::FailMotor => SelfTestOutcome::FailedMotor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Unlock,
    Lock,
    SelfTest,
    Exit,
}

impl Action {
    fn parse(input: &str) -> Self {
        match input.trim().chars().next() {
            Some('0') => Action::Unlock,
            Some('1') => Action::Lock,
            Some('2') => Action::SelfTest,
            _ => Action::Exit,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(&args);

    let driver = SimulatedLockDriver::with_outcome(args.self_test.into());
    let config = ActiveConfig::builder()
        .name("lock-ctrl")
        .priority(ThreadPriority::Normal)
        .build();

    let mut service = LockCtrlService::builder(driver)
        .config(config)
        .on_state_change(|state| {
            // Runs on the service thread.
            println!("{} {}", "Lock state changed:".cyan(), paint_state(state));
        })
        .on_self_test_result(|result| {
            let text = match result {
                SelfTestResult::Pass => result.to_string().green(),
                SelfTestResult::Fail => result.to_string().red(),
            };
            println!("{} {}", "Self test result:".cyan(), text);
        })
        .build();

    service
        .start(ExecutionMode::Background)
        .context("failed to start lock controller")?;

    let (tx, rx) = mpsc::channel();
    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
        log::info!("received interrupt, shutting down");
        let _ = interrupt.send(Action::Exit);
    })
    .context("failed to install Ctrl-C handler")?;
    spawn_input_reader(tx);

    loop {
        print_menu(service.get_state())?;

        let action = rx.recv().unwrap_or(Action::Exit);
        let result = match action {
            Action::Unlock => service.request_unlocked_async(),
            Action::Lock => service.request_locked_async(),
            Action::SelfTest => service.request_self_test_async(),
            Action::Exit => break,
        };
        if let Err(err) = result {
            eprintln!("{} {err}", "request rejected:".red());
        }
    }

    service.stop();
    println!("bye");
    Ok(())
}

fn setup_tracing(args: &Args) {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

/// Forward console selections to the main loop; end of input means exit.
fn spawn_input_reader(tx: Sender<Action>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let action = match line {
                Ok(line) => Action::parse(&line),
                Err(err) => {
                    log::warn!("stdin read failed: {err}");
                    Action::Exit
                }
            };
            if tx.send(action).is_err() || action == Action::Exit {
                return;
            }
        }
        let _ = tx.send(Action::Exit);
    });
}

fn print_menu(state: LockState) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "Lock state is: {}", paint_state(state))?;
    writeln!(out, "0: Unlock the lock")?;
    writeln!(out, "1: Lock the lock")?;
    writeln!(out, "2: Self Test the lock")?;
    writeln!(out, "3: Exit")?;
    writeln!(out)?;
    out.flush()
}

fn paint_state(state: LockState) -> colored::ColoredString {
    match state {
        LockState::Locked => state.to_string().green(),
        LockState::Unlocked => state.to_string().yellow(),
        LockState::Unknown => state.to_string().dimmed(),
    }
}
