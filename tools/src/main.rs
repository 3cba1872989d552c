//! pump-runner: headless host loop for the lockstep frame pump.
//!
//! Drives a pump from a seeded jitter clock, standing in for a game's
//! frame loop. With the lock gate on, the gate is released after a few
//! gated frames, standing in for a peer delivering the turn's data.
//!
//! Usage:
//!   pump-runner --seed 12345 --frames 600 --lock-gate --release-after 3
//!   pump-runner --config pump.json --monotonic --json
//!   pump-runner --seed 12345 --ipc-mode

use anyhow::Result;
use lockstep_core::{
    EventLog, FramePump, HostCommand, JitterClock, PumpConfig, PumpEvent, PumpStatus, TimeMode,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Frames { count: u64 },
    Command { command: HostCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct IpcReply {
    clock_millis: u64,
    status:       PumpStatus,
    events:       Vec<PumpEvent>,
}

#[derive(Debug, Default)]
struct RunStats {
    frames:              u64,
    gated_frames:        u64,
    releases:            u64,
    max_steps_per_frame: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = build_config(&args)?;
    let seed = parse_arg(&args, "--seed", 42u64);
    let frames = parse_arg(&args, "--frames", 600u64);
    let min_frame = parse_arg(&args, "--min-frame-ms", 8u64);
    let max_frame = parse_arg(&args, "--max-frame-ms", 40u64);
    let stall_chance = parse_arg(&args, "--stall-chance", 0.0f64);
    let stall_ms = parse_arg(&args, "--stall-ms", 500u64);
    let release_after = parse_arg(&args, "--release-after", 3u64);
    let json = has_flag(&args, "--json");
    let ipc_mode = has_flag(&args, "--ipc-mode");

    if !ipc_mode && !json {
        println!("lockstep frame pump — pump-runner");
        println!("  seed:          {seed}");
        println!("  frames:        {frames}");
        println!("  fixed step:    {}s ({}ms)", config.fixed_step_seconds, config.fixed_step_millis());
        println!("  turn:          {}ms", config.turn_duration_millis);
        println!("  lock gate:     {}", config.use_lock_gate);
        println!("  time mode:     {:?}", config.time_mode);
        println!("  frame range:   {min_frame}..={max_frame}ms");
        println!();
    }

    let log = EventLog::new();
    let clock = JitterClock::new(seed, min_frame, max_frame).with_stalls(stall_chance, stall_ms);
    let mut pump = FramePump::new(config, clock, log.step_recorder())?;

    let turns = log.clone();
    pump.register_turn_callback(move |turn| {
        log::info!("turn {turn} reached");
        turns.push(PumpEvent::TurnCrossed { turn });
    });
    pump.start_check_time()?;

    if ipc_mode {
        run_ipc_loop(&mut pump, &log)?;
    } else {
        let stats = run_frames(&mut pump, &log, frames, release_after)?;
        if json {
            for line in log.to_json_lines()? {
                println!("{line}");
            }
        } else {
            print_summary(&pump, &log, &stats);
        }
    }

    Ok(())
}

fn build_config(args: &[String]) -> Result<PumpConfig> {
    let mut config = match find_arg(args, "--config") {
        Some(path) => PumpConfig::load(path)?,
        None => PumpConfig::default(),
    };
    if let Some(seconds) = parse_opt(args, "--fixed-step") {
        config.fixed_step_seconds = seconds;
    }
    if let Some(millis) = parse_opt(args, "--turn-ms") {
        config.turn_duration_millis = millis;
    }
    if has_flag(args, "--lock-gate") {
        config.use_lock_gate = true;
    }
    if has_flag(args, "--monotonic") {
        config.time_mode = TimeMode::Monotonic;
    }
    Ok(config)
}

fn run_frames(
    pump: &mut FramePump<JitterClock>,
    log: &EventLog,
    frames: u64,
    release_after: u64,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let mut waiting = 0;

    for _ in 0..frames {
        pump.clock_mut().next_frame();
        let report = pump.tick()?;
        stats.frames += 1;
        stats.max_steps_per_frame = stats.max_steps_per_frame.max(report.steps);

        if report.gated {
            stats.gated_frames += 1;
            waiting += 1;
            if waiting >= release_after {
                if let Some(event) = HostCommand::Release.apply(pump)? {
                    log.push(event);
                }
                stats.releases += 1;
                waiting = 0;
            }
        }
    }
    Ok(stats)
}

fn run_ipc_loop(pump: &mut FramePump<JitterClock>, log: &EventLog) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let outcome = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Ok(()),
            IpcCommand::Frames { count } => (0..count).try_for_each(|_| {
                pump.clock_mut().next_frame();
                pump.tick().map(|_| ())
            }),
            IpcCommand::Command { command } => command.apply(pump).map(|event| {
                if let Some(event) = event {
                    log.push(event);
                }
            }),
        };

        match outcome {
            Ok(()) => {
                let reply = IpcReply {
                    clock_millis: pump.clock().now(),
                    status:       pump.status(),
                    events:       log.drain(),
                };
                writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
            }
            Err(e) => {
                log::warn!("command failed: {e}");
                write_error(&mut stdout, &e.to_string())?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(pump: &FramePump<JitterClock>, log: &EventLog, stats: &RunStats) {
    let status = pump.status();
    let turns = log.turns();

    println!("=== RUN SUMMARY ===");
    println!("  frames run:      {}", stats.frames);
    println!("  host time:       {}ms", pump.clock().now());
    println!("  steps:           {}", status.step_count);
    println!("  simulated:       {}ms", status.simulated_millis);
    println!("  observed:        {}ms", status.observed_elapsed_millis);
    println!("  backlog:         {}ms", status.backlog_millis());
    println!("  turns crossed:   {}", turns.len());
    println!("  last turn:       {}", turns.last().map_or("-".to_string(), |t| t.to_string()));
    println!("  gated frames:    {}", stats.gated_frames);
    println!("  releases:        {}", stats.releases);
    println!("  max steps/frame: {}", stats.max_steps_per_frame);
    println!("  gate closed now: {}", status.is_gated());
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_opt<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    find_arg(args, flag).and_then(|v| v.parse().ok())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    parse_opt(args, flag).unwrap_or(default)
}
