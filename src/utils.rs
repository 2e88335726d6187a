use crate::config::DEFAULT_TIME_FORMAT;
use crate::error::TarkeepError;
use crate::Result;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Characters that corrupt the archive filename or are rejected outright by
/// common filesystems.
const INVALID_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Format byte size in human-readable binary units
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB", "EB"];
    const THRESHOLD: u64 = 1024;

    if bytes < THRESHOLD {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    format!("{size:.1} {unit}")
}

/// Format a file modification time for listings
pub fn format_mod_time(time: SystemTime) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render a timestamp for the archive name. Config loading rejects broken
/// format strings, but a `Config` built programmatically can still carry
/// one; chrono's `Display` panics on unrecognized specifiers, so they are
/// caught here and the default format used instead.
pub fn format_timestamp(time: DateTime<Local>, format: &str) -> String {
    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        eprintln!("Warning: invalid time_format {format:?}, using default");
        return time.format(DEFAULT_TIME_FORMAT).to_string();
    }
    time.format_with_items(items.into_iter()).to_string()
}

/// Validate that a project name is safe to embed in an archive filename
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(INVALID_NAME_CHARS) {
        return Err(TarkeepError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Derive the project name from the source directory's base name
pub fn project_name(source_dir: &Path) -> Result<String> {
    source_dir
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| TarkeepError::InvalidName {
            name: source_dir.display().to_string(),
        })
}

/// Create the backup directory if needed and probe that it is readable and
/// writable by round-tripping a small temp file.
pub fn ensure_backup_dir(backup_dir: &Path) -> Result<()> {
    fs::create_dir_all(backup_dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => TarkeepError::PermissionDenied {
            path: backup_dir.to_path_buf(),
        },
        _ => TarkeepError::Io(e),
    })?;

    let process_id = std::process::id();
    let probe_path = backup_dir.join(format!(".tarkeep_probe_{process_id}"));

    match fs::write(&probe_path, b"probe") {
        Ok(()) => {
            let readable = fs::read(&probe_path).is_ok();
            let _ = fs::remove_file(&probe_path);
            if readable {
                Ok(())
            } else {
                Err(TarkeepError::PermissionDenied {
                    path: backup_dir.to_path_buf(),
                })
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(TarkeepError::PermissionDenied {
                path: backup_dir.to_path_buf(),
            })
        }
        Err(e) => Err(TarkeepError::Io(e)),
    }
}
