use crate::archive::Archiver;
use crate::cleanup::CleanupContext;
use crate::config::Config;
use crate::error::TarkeepError;
use crate::rotate::{archive_name, list_backups, rotate, BackupRecord};
use crate::space::check_space;
use crate::utils::{
    ensure_backup_dir, format_mod_time, format_size, format_timestamp, project_name,
    validate_project_name,
};
use crate::Result;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of a completed backup run
#[derive(Debug)]
pub struct RunReport {
    pub archive_path: PathBuf,
    pub archive_size: u64,
    pub source_size: u64,
    pub duration: Duration,
    pub rotated: Vec<PathBuf>,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Created backup: {} ({})",
            self.archive_path.display(),
            format_size(self.archive_size)
        )
    }
}

/// Resolve the backup directory: configured path, or a sibling `Backup`
/// directory next to the project.
pub fn resolve_backup_dir(source_dir: &Path, config: &Config) -> PathBuf {
    match &config.backup_dir {
        Some(dir) => dir.clone(),
        None => source_dir
            .parent()
            .unwrap_or(Path::new("."))
            .join("Backup"),
    }
}

/// Perform one backup run, start to finish. Strictly sequential; any failure
/// is terminal and performs its cleanup before propagating. The archive path
/// is tracked in `ctx` from the moment the destination is known until
/// verification succeeds, so the interrupt handler can delete a partial
/// artifact at any point in between.
pub fn run_backup(
    source_dir: &Path,
    config: &Config,
    archiver: &dyn Archiver,
    ctx: &CleanupContext,
    quiet: bool,
) -> Result<RunReport> {
    // Name validation comes first: nothing may be created or deleted on
    // behalf of a project whose name cannot form a safe archive filename.
    let project = project_name(source_dir)?;
    validate_project_name(&project)?;

    let backup_dir = resolve_backup_dir(source_dir, config);
    if !quiet {
        println!("Project: {project}");
        println!("Source: {}", source_dir.display());
        println!("Backup directory: {}", backup_dir.display());
    }

    ensure_backup_dir(&backup_dir)?;

    let rotated = rotate(&backup_dir, &project, config.max_backups)?;
    if !quiet {
        for old in &rotated {
            println!("Rotated out: {}", old.display());
        }
    }

    let source_size = check_space(source_dir, &backup_dir)?;
    if config.debug && !quiet {
        println!("DEBUG: source size {}", format_size(source_size));
    }

    let timestamp = format_timestamp(Local::now(), &config.time_format);
    let dest = backup_dir.join(archive_name(&project, &timestamp));
    ctx.track(&dest);

    if ctx.is_interrupted() {
        ctx.remove_current();
        return Err(TarkeepError::Interrupted);
    }

    if !quiet {
        println!("Creating archive {}", dest.display());
        if config.debug {
            println!("DEBUG: excludes: {}", config.excludes.join(", "));
        }
    }

    let duration = archiver.build(source_dir, &dest, &config.excludes).map_err(|e| {
        // The builder removes its own partial output; clearing the tracked
        // path here covers archivers that could not.
        ctx.remove_current();
        e
    })?;

    if ctx.is_interrupted() {
        ctx.remove_current();
        return Err(TarkeepError::Interrupted);
    }

    if !quiet {
        println!("Archive written in {:.1}s, verifying...", duration.as_secs_f64());
    }

    // Final correctness gate: a known-corrupt artifact must not survive
    if let Err(e) = archiver.verify(&dest) {
        ctx.remove_current();
        return Err(e);
    }
    ctx.finish();

    let archive_size = fs::metadata(&dest)
        .map_err(|e| TarkeepError::filesystem(&dest, format!("cannot stat archive: {e}")))?
        .len();

    let remaining = list_backups(&backup_dir, &project)?;
    if !quiet {
        print_listing(&remaining);
    }

    Ok(RunReport {
        archive_path: dest,
        archive_size,
        source_size,
        duration,
        rotated,
    })
}

/// Show what a run would do without touching the filesystem
pub fn dry_run(source_dir: &Path, config: &Config) -> Result<()> {
    let project = project_name(source_dir)?;
    validate_project_name(&project)?;

    let backup_dir = resolve_backup_dir(source_dir, config);
    let timestamp = format_timestamp(Local::now(), &config.time_format);
    let dest = backup_dir.join(archive_name(&project, &timestamp));

    println!("Would create: {}", dest.display());

    let existing = list_backups(&backup_dir, &project)?;
    for candidate in existing.iter().skip(config.max_backups) {
        println!("Would rotate out: {}", candidate.path.display());
    }

    let source_size = crate::space::estimate_source_size(source_dir)?;
    println!("Source size: {}", format_size(source_size));

    Ok(())
}

fn print_listing(records: &[BackupRecord]) {
    if records.is_empty() {
        return;
    }

    println!();
    println!("Current backups:");
    let mut total = 0;
    for record in records {
        total += record.size;
        let name = record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.path.display().to_string());
        println!(
            "  {name}  {}  ({})",
            format_mod_time(record.mod_time),
            format_size(record.size)
        );
    }
    println!("Total: {} backups, {}", records.len(), format_size(total));
}
