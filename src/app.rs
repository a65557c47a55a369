use crate::cli::{Cli, Commands};
use ffmirror::config::Config;
use ffmirror::engine::{
    self, ConversionEngine, ConversionSummary, EngineEvent, EventSink, FfmpegInvoker, LogLevel,
    RunLog, RunSettings, Strategy, TargetFormat, TranscoderSettings,
    worker::{ConversionWorker, WorkerMessage},
};
use std::path::{Path, PathBuf};
use std::process;

pub fn run(cli: Cli) {
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Convert {
            source,
            dest,
            format,
            ffmpeg,
            timeout,
            allow_same_dir,
            log_file,
            json,
        } => handle_convert(
            &config,
            ConvertArgs {
                source,
                dest,
                format,
                ffmpeg,
                timeout,
                allow_same_dir,
                log_file,
                json,
            },
        ),
        Commands::Scan { source } => handle_scan(&config, &source),
        Commands::DryRun {
            source,
            dest,
            format,
            ffmpeg,
        } => handle_dry_run(&config, &source, &dest, format, ffmpeg),
        Commands::CheckFfmpeg { ffmpeg } => handle_check_ffmpeg(&config, ffmpeg),
        Commands::Formats => handle_formats(&config),
        Commands::InitConfig => handle_init_config(),
    }
}

struct ConvertArgs {
    source: PathBuf,
    dest: PathBuf,
    format: Option<TargetFormat>,
    ffmpeg: Option<PathBuf>,
    timeout: Option<u64>,
    allow_same_dir: bool,
    log_file: Option<PathBuf>,
    json: bool,
}

fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match loaded {
        Ok(config) => config,
        Err(e) if path.is_some() => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
        Err(e) => {
            tracing::warn!("Falling back to built-in config: {:#}", e);
            Config::default()
        }
    }
}

fn transcoder_settings(config: &Config, ffmpeg: Option<PathBuf>) -> TranscoderSettings {
    let mut settings = config.transcoder.to_settings().unwrap_or_else(|e| {
        eprintln!("Error in transcoder config: {:#}", e);
        process::exit(2);
    });
    if let Some(path) = ffmpeg {
        settings.executable = path;
    }
    settings
}

/// Resolve a folder for comparison even if it does not exist yet
fn resolved(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn handle_convert(config: &Config, args: ConvertArgs) {
    if !args.allow_same_dir && resolved(&args.source) == resolved(&args.dest) {
        eprintln!(
            "Error: source and destination are the same folder ({}); converted files could \
             overwrite or mix with the originals. Pass --allow-same-dir to continue anyway.",
            args.source.display()
        );
        process::exit(2);
    }

    let mut settings = transcoder_settings(config, args.ffmpeg);
    if let Some(secs) = args.timeout {
        settings.timeout = Some(std::time::Duration::from_secs(secs));
    }

    match engine::transcoder_version(&settings.executable) {
        Ok(version) => tracing::info!("Using {}", version),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }

    let mut run_log = match args.log_file.or_else(|| config.defaults.log_file.clone()) {
        Some(path) => match RunLog::open(&path) {
            Ok(log) => {
                println!("Run log: {}", log.path().display());
                Some(log)
            }
            Err(e) => {
                eprintln!("Warning: {:#}", e);
                None
            }
        },
        None => None,
    };

    let target = args.format.unwrap_or(config.defaults.target_format);
    let run_settings = RunSettings::new(args.source, args.dest, target)
        .with_formats(config.defaults.formats());
    let engine = ConversionEngine::new(run_settings, FfmpegInvoker::new(settings));

    let worker = ConversionWorker::new();
    let handle = match worker.start(engine) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut outcome: Result<ConversionSummary, String> = Err("run ended unexpectedly".into());
    for message in worker.receiver().iter() {
        match message {
            WorkerMessage::Event(event) => {
                print_event(&event);
                if let Some(log) = run_log.as_mut() {
                    log.emit(event);
                }
            }
            WorkerMessage::Finished(summary) => {
                outcome = Ok(summary);
                break;
            }
            WorkerMessage::Failed { error } => {
                outcome = Err(error);
                break;
            }
        }
    }

    if handle.join().is_err() {
        eprintln!("Error: conversion thread panicked");
        process::exit(1);
    }

    match outcome {
        Ok(summary) => {
            if args.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Failed to serialize summary: {}", e),
                }
            }
            if !summary.all_succeeded() {
                process::exit(1);
            }
        }
        Err(_) => process::exit(1),
    }
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::Log(line) => match line.level {
            LogLevel::Info => println!("{}", line.message),
            LogLevel::Warn | LogLevel::Error => eprintln!("{}", line.message),
        },
        EngineEvent::Progress { completed, total } => {
            let pct = *completed as f64 / *total as f64 * 100.0;
            println!("Progress: {}/{} ({:.0}%)", completed, total, pct);
        }
        // The engine logs the summary line itself
        EngineEvent::Summary(_) => {}
    }
}

fn handle_scan(config: &Config, source: &Path) {
    println!("Scanning directory: {}", source.display());

    match engine::discover(source, &config.defaults.formats()) {
        Ok(files) => {
            for file in &files {
                println!("- {}", file.display());
            }
            println!("Total files: {}", files.len());
        }
        Err(e) => {
            eprintln!("Error scanning directory: {}", e);
            process::exit(1);
        }
    }
}

fn handle_dry_run(
    config: &Config,
    source: &Path,
    dest: &Path,
    format: Option<TargetFormat>,
    ffmpeg: Option<PathBuf>,
) {
    let target = format.unwrap_or(config.defaults.target_format);
    let run_settings =
        RunSettings::new(source, dest, target).with_formats(config.defaults.formats());
    let engine = ConversionEngine::new(
        run_settings,
        FfmpegInvoker::new(transcoder_settings(config, ffmpeg)),
    );

    let planned = engine.settings();
    println!(
        "Dry run: {} -> {} as {}",
        planned.source_root.display(),
        planned.dest_root.display(),
        planned.target
    );

    let settings = engine.transcoder().settings();
    match engine.plan() {
        Ok(jobs) => {
            for job in &jobs {
                println!("# {}", job.input_path.display());
                for strategy in [Strategy::Fast, Strategy::Full] {
                    let cmd = engine::build_transcode_cmd(settings, job, strategy);
                    println!("[{}] {}", strategy, engine::format_transcode_cmd(&cmd));
                }
            }
            println!("Total files: {}", jobs.len());
        }
        Err(e) => {
            eprintln!("Error scanning directory: {}", e);
            process::exit(1);
        }
    }
}

fn handle_check_ffmpeg(config: &Config, ffmpeg: Option<PathBuf>) {
    let settings = transcoder_settings(config, ffmpeg);
    match engine::transcoder_version(&settings.executable) {
        Ok(version) => println!("ffmpeg found: {}", version),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_formats(config: &Config) {
    let formats = config.defaults.formats();
    println!("Recognized input extensions ({}):", formats.len());
    println!("  {}", formats.iter().collect::<Vec<_>>().join(" "));
    println!("Output formats:");
    println!(
        "  {}",
        TargetFormat::ALL.map(|f| f.extension()).join(" ")
    );
    println!("Subfolders are searched recursively and recreated under the destination.");
    println!("Source files are never modified or deleted.");
}

fn handle_init_config() {
    match Config::config_path() {
        Ok(path) if Config::exists() => match Config::load_from(&path) {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                eprintln!("Config invalid: {:#}", e);
                process::exit(1);
            }
        },
        Ok(path) => {
            println!("Creating default config...");
            if let Err(err) = Config::default().save_to(&path) {
                eprintln!("Failed to save default config: {:#}", err);
                process::exit(1);
            }
            println!("Default config saved to {}", path.display());
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
