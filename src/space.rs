use crate::error::TarkeepError;
use crate::Result;
use fs2::available_space;
use std::fs;
use std::path::Path;

/// Floor for the required-space threshold. Small projects still need
/// headroom for archive metadata and filesystem slack.
const MIN_REQUIRED_SPACE: u64 = 50 * 1024 * 1024;

/// Compression safety margin, as a fraction of the source size: compressed
/// output is normally smaller than the source, but incompressible content
/// can come close to 1:1.
const SAFETY_MARGIN_DIVISOR: u64 = 10;

/// Sum the sizes of all regular files under `source_dir`. Directories
/// contribute nothing; a total of zero signals a likely misconfiguration.
pub fn estimate_source_size(source_dir: &Path) -> Result<u64> {
    let mut total = 0;
    sum_directory(source_dir, &mut total)?;

    if total == 0 {
        return Err(TarkeepError::EmptySource {
            path: source_dir.to_path_buf(),
        });
    }

    Ok(total)
}

fn sum_directory(dir: &Path, total: &mut u64) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| TarkeepError::filesystem(dir, format!("cannot read directory: {e}")))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| TarkeepError::filesystem(dir, format!("cannot read entry: {e}")))?;
        let path = entry.path();
        let metadata = entry
            .metadata()
            .map_err(|e| TarkeepError::filesystem(&path, format!("cannot stat: {e}")))?;

        if metadata.is_file() {
            *total += metadata.len();
        } else if metadata.is_dir() {
            sum_directory(&path, total)?;
        }
        // Symlinks and special files are skipped; tar stores them without
        // meaningful payload.
    }

    Ok(())
}

/// Required free space for archiving a source of the given size. Integer
/// arithmetic keeps the 10% margin exact for multi-TiB sources, where f64
/// would lose precision.
pub(crate) fn required_space(source_size: u64) -> u64 {
    let with_margin = source_size.saturating_add(source_size / SAFETY_MARGIN_DIVISOR);
    with_margin.max(MIN_REQUIRED_SPACE)
}

/// Check that `backup_dir`'s filesystem has room for an archive of
/// `source_dir`. Read-only; exact equality counts as sufficient.
pub fn check_space(source_dir: &Path, backup_dir: &Path) -> Result<u64> {
    let source_size = estimate_source_size(source_dir)?;
    let required = required_space(source_size);

    let available = available_space(backup_dir)
        .map_err(|e| TarkeepError::filesystem(backup_dir, format!("cannot query free space: {e}")))?;

    if available < required {
        return Err(TarkeepError::InsufficientSpace {
            required,
            available,
        });
    }

    Ok(source_size)
}
