use crate::error::TarkeepError;
use crate::Result;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Capability interface over the external archiving tool. Injectable so the
/// orchestrator can be exercised with a test double.
pub trait Archiver {
    /// Check that the tool can be invoked at all
    fn is_available(&self) -> bool;

    /// Archive `source`'s contents into `dest`, omitting paths whose
    /// segments match any exclude pattern. On failure no partial `dest`
    /// may remain. Returns the wall-clock build duration.
    fn build(&self, source: &Path, dest: &Path, excludes: &[String]) -> Result<Duration>;

    /// Confirm the archive's structure is readable
    fn verify(&self, archive: &Path) -> Result<()>;

    /// List the entry paths stored in the archive
    fn list_entries(&self, archive: &Path) -> Result<Vec<String>>;
}

/// `tar` invoked as a subprocess. Exclusion patterns are passed through as
/// `--exclude=` arguments, which GNU and BSD tar match per path segment.
pub struct TarArchiver {
    program: String,
}

impl TarArchiver {
    pub fn new() -> Self {
        Self {
            program: "tar".to_string(),
        }
    }

    /// Use a different binary name, e.g. `gtar` on macOS
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TarArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver for TarArchiver {
    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn build(&self, source: &Path, dest: &Path, excludes: &[String]) -> Result<Duration> {
        let mut command = Command::new(&self.program);
        command.arg("-czf").arg(dest).arg("-C").arg(source);
        for pattern in excludes {
            command.arg(format!("--exclude={pattern}"));
        }
        command.arg(".");

        let started = Instant::now();
        let output = command.output();

        let failure = match output {
            Ok(output) if output.status.success() => return Ok(started.elapsed()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                TarkeepError::build(format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ))
            }
            Err(e) => TarkeepError::build(format!("cannot run {}: {e}", self.program)),
        };

        // Never leave a half-written archive behind
        if dest.exists() {
            let _ = fs::remove_file(dest);
        }
        Err(failure)
    }

    fn verify(&self, archive: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("-tzf")
            .arg(archive)
            .stdout(Stdio::null())
            .output()
            .map_err(|e| TarkeepError::build(format!("cannot run {}: {e}", self.program)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TarkeepError::CorruptArchive {
                path: archive.to_path_buf(),
            })
        }
    }

    fn list_entries(&self, archive: &Path) -> Result<Vec<String>> {
        let output = Command::new(&self.program)
            .arg("-tzf")
            .arg(archive)
            .output()
            .map_err(|e| TarkeepError::build(format!("cannot run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(TarkeepError::CorruptArchive {
                path: archive.to_path_buf(),
            });
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(listing.lines().map(str::to_string).collect())
    }
}
