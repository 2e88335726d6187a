use crate::error::TarkeepError;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension shared by every archive this tool produces
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// A backup archive found on disk. Reconstructed from filesystem metadata on
/// every run; ordering by `mod_time` defines recency.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub path: PathBuf,
    pub mod_time: SystemTime,
    pub size: u64,
}

/// Compose the archive filename for a project and timestamp
pub fn archive_name(project: &str, timestamp: &str) -> String {
    format!("{project}_backup_{timestamp}{ARCHIVE_SUFFIX}")
}

/// Check whether a filename matches the project's archive pattern
fn matches_project(file_name: &str, project: &str) -> bool {
    let prefix = format!("{project}_backup_");
    file_name.starts_with(&prefix) && file_name.ends_with(ARCHIVE_SUFFIX)
}

/// List the project's archives in `backup_dir`, newest first. Entries that
/// cannot be stat'd are skipped with a warning rather than failing the run.
/// Ties on mod_time are broken by path so the ordering is reproducible.
pub fn list_backups(backup_dir: &Path, project: &str) -> Result<Vec<BackupRecord>> {
    let mut records = Vec::new();

    if !backup_dir.exists() {
        return Ok(records);
    }

    let entries = fs::read_dir(backup_dir)
        .map_err(|e| TarkeepError::filesystem(backup_dir, format!("cannot read directory: {e}")))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| TarkeepError::filesystem(backup_dir, format!("cannot read entry: {e}")))?;

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !matches_project(name, project) {
            continue;
        }

        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Warning: cannot stat {}: {e}", path.display());
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let mod_time = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Warning: cannot read mtime of {}: {e}", path.display());
                continue;
            }
        };

        records.push(BackupRecord {
            path,
            mod_time,
            size: metadata.len(),
        });
    }

    records.sort_by(|a, b| {
        b.mod_time
            .cmp(&a.mod_time)
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(records)
}

/// Delete the project's archives beyond the retention count, keeping the
/// `max_backups` most recently modified. Must run before the new archive is
/// written so it is never itself a rotation candidate. A failed deletion is
/// fatal; silently keeping excess archives would hide a real problem.
/// Returns the deleted paths.
pub fn rotate(backup_dir: &Path, project: &str, max_backups: usize) -> Result<Vec<PathBuf>> {
    let records = list_backups(backup_dir, project)?;

    let mut deleted = Vec::new();
    for record in records.iter().skip(max_backups) {
        fs::remove_file(&record.path).map_err(|e| {
            TarkeepError::filesystem(&record.path, format!("cannot delete old archive: {e}"))
        })?;
        deleted.push(record.path.clone());
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Create an archive file with a deterministic mtime offset (seconds
    /// before the given base time)
    fn create_archive(dir: &Path, name: &str, base: SystemTime, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "archive bytes").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(base - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(
            archive_name("myproj", "20260830_120000"),
            "myproj_backup_20260830_120000.tar.gz"
        );
    }

    #[test]
    fn test_matches_project() {
        assert!(matches_project("proj_backup_20260830_120000.tar.gz", "proj"));
        assert!(!matches_project("other_backup_20260830_120000.tar.gz", "proj"));
        assert!(!matches_project("proj_backup_20260830_120000.zip", "proj"));
        assert!(!matches_project("proj_20260830_120000.tar.gz", "proj"));

        // Prefix match must be exact: "proj2" archives are not "proj" archives
        assert!(!matches_project("proj2_backup_20260830.tar.gz", "proj"));
        assert!(matches_project("proj2_backup_20260830.tar.gz", "proj2"));
    }

    #[test]
    fn test_list_backups_sorted_newest_first() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        create_archive(dir.path(), "p_backup_1.tar.gz", now, 300);
        create_archive(dir.path(), "p_backup_2.tar.gz", now, 100);
        create_archive(dir.path(), "p_backup_3.tar.gz", now, 200);

        let records = list_backups(dir.path(), "p").unwrap();
        let names: Vec<_> = records
            .iter()
            .map(|r| r.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["p_backup_2.tar.gz", "p_backup_3.tar.gz", "p_backup_1.tar.gz"]
        );
    }

    #[test]
    fn test_list_backups_ignores_foreign_files() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        create_archive(dir.path(), "p_backup_1.tar.gz", now, 10);
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("q_backup_1.tar.gz"), "x").unwrap();
        fs::create_dir(dir.path().join("p_backup_dir.tar.gz")).unwrap();

        let records = list_backups(dir.path(), "p").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_list_backups_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let records = list_backups(&dir.path().join("nope"), "p").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_rotate_keeps_most_recent() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        // Five archives, ages 10..50 seconds
        for i in 1..=5u64 {
            create_archive(
                dir.path(),
                &format!("p_backup_{i}.tar.gz"),
                now,
                i * 10,
            );
        }

        let deleted = rotate(dir.path(), "p", 3).unwrap();
        assert_eq!(deleted.len(), 2);

        let survivors = list_backups(dir.path(), "p").unwrap();
        let names: Vec<_> = survivors
            .iter()
            .map(|r| r.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["p_backup_1.tar.gz", "p_backup_2.tar.gz", "p_backup_3.tar.gz"]
        );
    }

    #[test]
    fn test_rotate_under_limit_deletes_nothing() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        create_archive(dir.path(), "p_backup_1.tar.gz", now, 10);
        create_archive(dir.path(), "p_backup_2.tar.gz", now, 20);

        let deleted = rotate(dir.path(), "p", 5).unwrap();
        assert!(deleted.is_empty());
        assert_eq!(list_backups(dir.path(), "p").unwrap().len(), 2);
    }

    #[test]
    fn test_rotate_exact_limit_deletes_nothing() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        create_archive(dir.path(), "p_backup_1.tar.gz", now, 10);
        create_archive(dir.path(), "p_backup_2.tar.gz", now, 20);
        create_archive(dir.path(), "p_backup_3.tar.gz", now, 30);

        let deleted = rotate(dir.path(), "p", 3).unwrap();
        assert!(deleted.is_empty());
        assert_eq!(list_backups(dir.path(), "p").unwrap().len(), 3);
    }

    #[test]
    fn test_rotate_retention_one() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        for i in 1..=4u64 {
            create_archive(dir.path(), &format!("p_backup_{i}.tar.gz"), now, i * 10);
        }

        rotate(dir.path(), "p", 1).unwrap();

        let survivors = list_backups(dir.path(), "p").unwrap();
        assert_eq!(survivors.len(), 1);
        assert!(survivors[0]
            .path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .contains("p_backup_1"));
    }

    #[test]
    fn test_rotate_does_not_touch_other_projects() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        for i in 1..=3u64 {
            create_archive(dir.path(), &format!("p_backup_{i}.tar.gz"), now, i * 10);
        }
        create_archive(dir.path(), "q_backup_1.tar.gz", now, 500);

        rotate(dir.path(), "p", 1).unwrap();

        assert_eq!(list_backups(dir.path(), "p").unwrap().len(), 1);
        assert_eq!(list_backups(dir.path(), "q").unwrap().len(), 1);
    }

    #[test]
    fn test_rotate_tie_broken_by_path() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();

        // Identical mtimes: ordering falls back to path, ascending
        create_archive(dir.path(), "p_backup_a.tar.gz", now, 100);
        create_archive(dir.path(), "p_backup_b.tar.gz", now, 100);
        create_archive(dir.path(), "p_backup_c.tar.gz", now, 100);

        rotate(dir.path(), "p", 2).unwrap();

        let survivors = list_backups(dir.path(), "p").unwrap();
        let names: Vec<_> = survivors
            .iter()
            .map(|r| r.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["p_backup_a.tar.gz", "p_backup_b.tar.gz"]);
    }
}
