//! Passcode Autotyper
//!
//! Types sequential numeric codes into the focused window, waits, captures
//! the screen and compares it with a reference "unlocked" image. Runs as an
//! egui window by default, or headless with `--cli`.

mod automation;
mod candidate;
mod capture;
mod cli;
mod detection;
mod error;
mod gui;
mod input;
mod paths;

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use automation::{AttemptConfig, AttemptState};
use cli::{Cli, Mode};

const LOG_FILE_NAME: &str = "passcode_autotyper.log";

/// Exit code when a session ends in `Failed`.
const EXIT_SESSION_FAILED: u8 = 2;
/// Exit code when the configuration is rejected.
const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when `--check` finds a problem.
const EXIT_CHECK_FAILED: u8 = 3;

/// Writes every log line to stderr and, when available, the log file.
struct LogTee {
    file: Option<File>,
}

impl Write for LogTee {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_logs_dir().join(LOG_FILE_NAME))
        .ok();

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(LogTee { file })))
        .init();
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log::error!("[PANIC]{} {}", location, msg);
    }));
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: failed to create output directories: {}", e);
    }
    init_logging(cli.verbose);
    install_panic_hook();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(paths::get_default_config_path);
    let mut config = match AttemptConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    cli.apply_overrides(&mut config);

    let result = match cli.mode() {
        Mode::Gui => run_gui(config, config_path),
        Mode::Cli => run_cli(config, cli.verbose),
        Mode::Info => run_info(&config),
        Mode::Check => Ok(run_check(&config)),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_gui(config: AttemptConfig, config_path: PathBuf) -> Result<ExitCode> {
    log::info!("Starting GUI application...");
    gui::run_gui(config, config_path).map_err(|e| anyhow::anyhow!("GUI error: {}", e))?;
    log::info!("GUI application exited normally");
    Ok(ExitCode::SUCCESS)
}

/// Runs a session in the terminal. With `verbose`, progress is printed as
/// one JSON status object per line.
fn run_cli(config: AttemptConfig, verbose: bool) -> Result<ExitCode> {
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return Ok(ExitCode::from(EXIT_CONFIG_ERROR));
    }

    if !config.demo_mode {
        log::info!("Move the cursor to the top-left corner to abort.");
    }

    let injector = input::platform_injector(config.failsafe_enabled);
    let sampler = Box::new(capture::DesktopSampler::new(config.capture_region));
    let handle = match automation::start_session(config, injector, sampler, &paths::get_output_dir())
    {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("{}", e);
            return Ok(ExitCode::from(EXIT_CONFIG_ERROR));
        }
    };

    let signals = handle.signals();
    ctrlc::set_handler(move || {
        signals.request_stop();
    })
    .context("Failed to install Ctrl+C handler")?;

    let mut last_reported = 0;
    while !handle.is_finished() {
        thread::sleep(Duration::from_millis(500));
        let snapshot = handle.snapshot();
        if snapshot.attempts != last_reported {
            last_reported = snapshot.attempts;
            if verbose {
                println!("{}", serde_json::to_string(&snapshot)?);
                continue;
            }
            println!(
                "{}/{} attempts | current {} | {:.2}/s | {}",
                snapshot.attempts,
                snapshot.max_attempts,
                snapshot.current_candidate.as_deref().unwrap_or("-"),
                snapshot.rate_per_second,
                snapshot.elapsed_text()
            );
        }
    }

    let report = handle.join();
    println!(
        "Finished: {} after {} attempts in {:.1}s",
        report.state, report.attempts, report.elapsed_seconds
    );
    if let Some(dir) = &report.session_dir {
        println!("Session folder: {}", dir.display());
    }

    Ok(match report.state {
        AttemptState::Failed(_) => ExitCode::from(EXIT_SESSION_FAILED),
        _ => ExitCode::SUCCESS,
    })
}

fn run_info(config: &AttemptConfig) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("Configuration:\n{}", json);
    println!();
    if let Ok(()) = config.validate() {
        println!(
            "Candidate space: {} values of length {}",
            candidate::space_size(config.password_length),
            config.password_length
        );
    }
    println!("Executable dir:  {}", paths::get_exe_dir().display());
    println!("Output dir:      {}", paths::get_output_dir().display());
    println!("Log file:        {}", paths::get_logs_dir().join(LOG_FILE_NAME).display());
    println!(
        "Input injection: {}",
        if input::is_supported() { "supported" } else { "unsupported" }
    );
    println!(
        "Screen capture:  {}",
        if capture::is_supported() { "supported" } else { "unsupported" }
    );
    Ok(ExitCode::SUCCESS)
}

/// Runs each dependency check, printing OK/FAIL lines.
fn run_check(config: &AttemptConfig) -> ExitCode {
    let mut ok = true;

    match config.validate() {
        Ok(()) => println!("[OK]   configuration"),
        Err(e) => {
            println!("[FAIL] configuration: {}", e);
            ok = false;
        }
    }

    match detection::load_image(&config.reference_image_path) {
        Ok(image) => println!(
            "[OK]   reference image {} ({}x{})",
            config.reference_image_path.display(),
            image.width(),
            image.height()
        ),
        Err(e) => {
            println!("[FAIL] reference image: {}", e);
            ok = false;
        }
    }

    match capture::capture_screen(config.capture_region.as_ref()) {
        Ok(frame) => println!("[OK]   screen capture ({}x{})", frame.width(), frame.height()),
        Err(e) => {
            println!("[FAIL] screen capture: {}", e);
            ok = false;
        }
    }

    if input::is_supported() {
        println!("[OK]   input injection");
    } else {
        println!("[FAIL] input injection is not supported on this platform");
        ok = false;
    }

    if ok {
        log::info!("All checks passed");
        ExitCode::SUCCESS
    } else {
        log::warn!("One or more checks failed");
        ExitCode::from(EXIT_CHECK_FAILED)
    }
}
