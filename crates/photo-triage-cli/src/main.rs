use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use photo_triage_core::archive::ArchiveBatchReport;
use photo_triage_core::config::LogLevel;
use photo_triage_core::discovery::expand_sources;
use photo_triage_core::import::ImportMode;
use photo_triage_core::logging::{init_logger, LOG_ENV};
use photo_triage_core::reporter::{Event, LogReporter, Reporter};
use photo_triage_core::{Config, PhotoTriage};

mod review;

#[derive(Parser)]
#[command(name = "photo-triage")]
#[command(about = "Import, rename, archive and review digital photos")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename files to their capture time and link them into the archive
    Rename {
        /// Files and directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Report what would be done without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Use the file's modification time when no metadata has a date
        #[arg(long)]
        use_mtime: bool,

        /// Root of the date-indexed archive
        #[arg(long)]
        archive_root: Option<PathBuf>,
    },

    /// Bring camera files into the staging directory
    Import {
        /// Directory of the camera card
        source: PathBuf,

        /// Copy instead of moving
        #[arg(long)]
        copy: bool,

        /// Rename and archive the imported files
        #[arg(long)]
        rename: bool,

        /// Report what would be done without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Review and tag pictures, reading commands from standard input
    Review {
        /// Directory to pick pictures up from
        src: PathBuf,

        /// Directory kept and taken pictures go to
        dst: PathBuf,

        /// Report what commit would do without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "photo-triage.json")]
        path: PathBuf,
    },
}

fn load_config(path: Option<&Path>, verbose: u8) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Set log level based on verbosity
    config.log_level = match verbose {
        0 => config.log_level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    Ok(config)
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let level: log::LevelFilter = config.log_level.into();
    match &config.log_dir {
        Some(dir) => init_logger(dir, level).map_err(|e| anyhow::anyhow!("{}", e))?,
        None => env_logger::Builder::new()
            .filter_level(level)
            .parse_env(LOG_ENV)
            .init(),
    }
    Ok(())
}

/// Forwards events to the log and prints failures above the progress bar
struct ProgressReporter {
    bar: ProgressBar,
}

impl Reporter for ProgressReporter {
    fn report(&mut self, event: Event) {
        match &event {
            Event::Skipped { path, reason } => {
                self.bar.println(format!("skipped {}: {}", path.display(), reason))
            }
            Event::Failed {
                operation,
                path,
                error,
            } => self
                .bar
                .println(format!("{} failed for {}: {}", operation, path.display(), error)),
            _ => {}
        }
        LogReporter.report(event);
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar
}

/// Archive `paths` one file at a time with a progress bar
fn rename(triage: &PhotoTriage, paths: &[PathBuf]) -> ArchiveBatchReport {
    let expansion = expand_sources(paths, triage.config().max_depth);
    let mut reporter = ProgressReporter {
        bar: progress_bar(expansion.files.len()),
    };

    let mut archiver = triage.archiver();
    let mut report = ArchiveBatchReport::default();
    report.reject(expansion.rejected, &mut reporter);
    for file in &expansion.files {
        reporter.bar.set_message(file.display().to_string());
        let result = archiver.archive(file, &mut reporter);
        report.record(result, &mut reporter);
        reporter.bar.inc(1);
    }
    reporter.bar.finish_and_clear();

    report
}

fn exit_status(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> Result<ExitCode, anyhow::Error> {
    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename {
            paths,
            dry_run,
            use_mtime,
            archive_root,
        } => {
            let mut config = load_config(cli.config.as_deref(), cli.verbose)?;
            config.dry_run |= dry_run;
            config.use_mtime_fallback |= use_mtime;
            if let Some(root) = archive_root {
                config.archive_root = root;
            }
            config.validate()?;
            init_logging(&config)?;

            let triage = PhotoTriage::new(config);
            let report = rename(&triage, &paths);
            println!("{}", report);

            Ok(exit_status(report.has_failures()))
        }

        Commands::Import {
            source,
            copy,
            rename: then_rename,
            dry_run,
        } => {
            let mut config = load_config(cli.config.as_deref(), cli.verbose)?;
            config.dry_run |= dry_run;
            config.validate()?;
            init_logging(&config)?;

            let triage = PhotoTriage::new(config);
            let mode = if copy { ImportMode::Copy } else { ImportMode::Move };
            let imported = triage.import(&source, mode, &mut LogReporter)?;
            println!("{}", imported);

            let mut failed = imported.failed > 0;
            if then_rename && !triage.config().dry_run {
                let report = rename(&triage, &imported.imported);
                println!("{}", report);
                failed |= report.has_failures();
            }

            Ok(exit_status(failed))
        }

        Commands::Review { src, dst, dry_run } => {
            let mut config = load_config(cli.config.as_deref(), cli.verbose)?;
            config.dry_run |= dry_run;
            config.validate()?;
            init_logging(&config)?;

            let triage = PhotoTriage::new(config);
            info!("Reviewing {} into {}", src.display(), dst.display());
            let mut console = review::Console::open(&triage, src, dst)?;

            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            console.run(stdin.lock(), stdout.lock())?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
