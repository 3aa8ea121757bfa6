use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use actiongrid::cli::Args;
use actiongrid::config::{LOG_FILE, PathConfig, SETTINGS_FILE, Settings};
use actiongrid::core::player::{FRAME_INTERVAL, PlaybackStatus};
use actiongrid::entities::Project;
use actiongrid::report::GridLabel;
use actiongrid::{Session, report};

/// Virtual milliseconds between progress lines during headless playback
const PROGRESS_EVERY_MS: f64 = 1000.0;

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = path_config.ensure_dirs() {
        eprintln!("Warning: Failed to create application directories: {:#}", e);
    }

    init_logger(&args, &path_config)?;

    info!("actiongrid {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    let settings_path = path_config.config_file(SETTINGS_FILE);
    info!("Config path: {}", settings_path.display());
    let settings = apply_overrides(Settings::load(&settings_path), &args);
    if args.save_settings {
        settings.save(&settings_path)?;
        println!("Saved settings to {}", settings_path.display());
    }

    let project = if args.demo {
        info!("Using demo project");
        Project::demo()
    } else if let Some(path) = &args.project {
        Project::load(path)?
    } else {
        info!("No project provided, starting with empty project");
        Project::new()
    };
    let mut session = Session::with_project(project, &settings);

    println!("Project: {} (v{})", session.project().name, session.project().version);
    print!("{}", report::schedule_table(&session));

    for &t in &args.at {
        println!();
        print!("{}", report::occupancy_grid(&session, t, session.fill_mode(), settings.grid_label));
    }

    if args.play || settings.autoplay {
        println!();
        run_headless(&mut session, args.max_ticks, settings.grid_label);
    }

    if let Some(path) = &args.save {
        session.save_project(path)?;
        println!("Saved project to {}", path.display());
    }

    Ok(())
}

/// Initialize logger based on --log and -v flags.
/// 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
fn init_logger(args: &Args, path_config: &PathConfig) -> Result<()> {
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| path_config.data_file(LOG_FILE));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// CLI flags win over stored settings for this run.
fn apply_overrides(mut settings: Settings, args: &Args) -> Settings {
    if let Some(mode) = args.fill_mode {
        settings.fill_mode = mode;
    }
    if let Some(label) = args.label {
        settings.grid_label = label;
    }
    if let Some(speed) = args.speed {
        settings.speed = speed;
    }
    if args.loop_playback {
        settings.loop_enabled = true;
    }
    settings.sanitized()
}

/// Drive the clock at the nominal frame interval until it pauses at the end
/// or `max_ticks` frames have elapsed.
fn run_headless(session: &mut Session, max_ticks: Option<u64>, label: GridLabel) {
    let total = session.total_duration();
    if session.play().is_playing {
        info!("Headless playback: {:.2} ms timeline", total);
    } else {
        println!("Nothing to play (empty timeline)");
        return;
    }

    let mut ticks = 0u64;
    let mut next_report = 0.0;
    while session.player().status() == PlaybackStatus::Playing {
        if max_ticks.is_some_and(|max| ticks >= max) {
            session.pause();
            break;
        }
        std::thread::sleep(FRAME_INTERVAL);
        let Some(t) = session.update() else { continue };
        ticks += 1;

        // Looping wraps time back below the next report mark
        if t < next_report - PROGRESS_EVERY_MS {
            next_report = 0.0;
        }
        if t >= next_report {
            println!("{}", report::progress_line(&session.player().state(), total));
            next_report = (t / PROGRESS_EVERY_MS).floor() * PROGRESS_EVERY_MS + PROGRESS_EVERY_MS;
        }
    }

    println!("{}", report::progress_line(&session.player().state(), total));
    print!("{}", report::occupancy_grid(session, session.player().current_time(), session.fill_mode(), label));
    info!("Headless playback finished after {} ticks", ticks);
}
