use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process;
use tarkeep::{Archiver, CleanupContext, TarArchiver, TarkeepError};

fn main() {
    let result = run();
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(error) => {
            eprintln!("Error: {error}");

            // Show suggestions if available
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                eprintln!("\nSuggestions:");
                for suggestion in suggestions {
                    eprintln!("  - {suggestion}");
                }
            }

            process::exit(error.exit_code());
        }
    }
}

fn run() -> Result<i32, TarkeepError> {
    let matches = Command::new("tarkeep")
        .version("0.1.0")
        .about("Timestamped tar backups of project directories with rotation and integrity checks")
        .long_about(
            "tarkeep archives a project directory into a timestamped tar.gz,\n\
             skipping development artifacts, keeping only the newest archives\n\
             and verifying the result.\n\
             Example: tarkeep → ../Backup/myproj_backup_20260830_142530.tar.gz",
        )
        .arg(
            Arg::new("source")
                .help("Project directory to back up (defaults to the current directory)")
                .required(false)
                .value_name("DIR"),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Show what would be done without writing anything")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('v')
                .long("debug")
                .help("Show detailed progress information")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress all output except errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-config")
                .long("dump-config")
                .help("Display current configuration settings and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let dump_config_flag = matches.get_flag("dump-config");
    let dry_run = matches.get_flag("dry-run");
    let debug = matches.get_flag("debug");
    let quiet = matches.get_flag("quiet");

    // Resolve the source directory up front; every later step depends on it
    let source_dir = match matches.get_one::<String>("source") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let source_dir = source_dir.canonicalize().map_err(|e| {
        TarkeepError::filesystem(&source_dir, format!("cannot resolve source directory: {e}"))
    })?;

    // tar is a hard precondition; fail before doing any other work
    let archiver = TarArchiver::new();
    if !archiver.is_available() {
        return Err(TarkeepError::ToolMissing {
            message: "tar was not found on PATH".to_string(),
        });
    }

    // A malformed config file degrades to defaults with a warning
    let mut config = match tarkeep::load_config(&source_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not load config, using defaults: {e}");
            tarkeep::default_config()
        }
    };
    if debug {
        config.debug = true;
    }

    if dump_config_flag {
        tarkeep::dump_config(&source_dir, &config);
        return Ok(0);
    }

    if dry_run {
        tarkeep::dry_run(&source_dir, &config)?;
        return Ok(0);
    }

    // One cancellation point for the whole run: delete the in-progress
    // archive (if any) and terminate.
    let ctx = CleanupContext::new();
    setup_signal_handler(&ctx);

    let report = tarkeep::run_backup(&source_dir, &config, &archiver, &ctx, quiet)?;

    if !quiet {
        println!("{}", report.summary());
        println!("Duration: {:.1}s", report.duration.as_secs_f64());
    }

    Ok(0)
}

fn setup_signal_handler(ctx: &CleanupContext) {
    let handler_ctx = ctx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_ctx.set_interrupted(true);
        eprintln!("\nInterrupted by user. Cleaning up...");
        if let Some(path) = handler_ctx.remove_current() {
            eprintln!("Removed incomplete archive: {}", path.display());
        }
        process::exit(130);
    }) {
        eprintln!("Warning: could not install interrupt handler: {e}");
    }
}
