use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TarkeepError {
    #[error("Archiving tool not available: {message}")]
    ToolMissing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    #[error("Source directory appears to be empty: {path}")]
    EmptySource { path: PathBuf },

    #[error("Insufficient disk space: need {required} bytes, have {available}")]
    InsufficientSpace { required: u64, available: u64 },

    #[error("Invalid project name: {name}")]
    InvalidName { name: String },

    #[error("Archive build failed: {message}")]
    Build { message: String },

    #[error("Archive failed verification: {path}")]
    CorruptArchive { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl TarkeepError {
    /// Create a configuration error with a custom message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a build error with a custom message
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    /// Create a filesystem error carrying the affected path
    pub fn filesystem(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Filesystem {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error aborts the run (everything except config load problems)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TarkeepError::Config { .. })
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TarkeepError::Interrupted => 130,
            _ => 1,
        }
    }

    /// Provide helpful suggestions for resolving the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            TarkeepError::ToolMissing { .. } => vec![
                "Install tar via your system package manager".to_string(),
                "Ensure tar is on PATH for this shell".to_string(),
            ],
            TarkeepError::InsufficientSpace { .. } => vec![
                "Free up disk space".to_string(),
                "Point backup_dir at a different filesystem".to_string(),
                "Lower max_backups so rotation deletes more old archives".to_string(),
            ],
            TarkeepError::PermissionDenied { .. } => vec![
                "Check directory permissions".to_string(),
                "Ensure the backup directory is writable".to_string(),
            ],
            TarkeepError::EmptySource { .. } => vec![
                "Check that you are running from the intended project directory".to_string(),
            ],
            TarkeepError::InvalidName { name } => vec![format!(
                "Rename the project directory to avoid the characters \\ / : * ? \" < > | ({name})"
            )],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_contains_context() {
        let space = TarkeepError::InsufficientSpace {
            required: 1000,
            available: 500,
        };
        let display = format!("{space}");
        assert!(display.contains("1000"));
        assert!(display.contains("500"));

        let fs_error = TarkeepError::filesystem("/some/path", "stat failed");
        let display = format!("{fs_error}");
        assert!(display.contains("/some/path"));
        assert!(display.contains("stat failed"));

        let corrupt = TarkeepError::CorruptArchive {
            path: PathBuf::from("/backups/proj_backup_x.tar.gz"),
        };
        assert!(format!("{corrupt}").contains("proj_backup_x.tar.gz"));
    }

    #[test]
    fn test_constructors() {
        match TarkeepError::config("bad value") {
            TarkeepError::Config { message } => assert_eq!(message, "bad value"),
            _ => panic!("Expected Config error"),
        }

        match TarkeepError::build("tar exited with status 2") {
            TarkeepError::Build { message } => assert!(message.contains("status 2")),
            _ => panic!("Expected Build error"),
        }
    }

    #[test]
    fn test_fatality() {
        assert!(!TarkeepError::config("parse failure").is_fatal());

        assert!(TarkeepError::Interrupted.is_fatal());
        assert!(TarkeepError::EmptySource {
            path: PathBuf::from("/p")
        }
        .is_fatal());
        assert!(TarkeepError::InvalidName {
            name: "a/b".to_string()
        }
        .is_fatal());
        assert!(TarkeepError::InsufficientSpace {
            required: 2,
            available: 1
        }
        .is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(TarkeepError::Interrupted.exit_code(), 130);
        assert_eq!(TarkeepError::config("x").exit_code(), 1);
        assert_eq!(TarkeepError::build("x").exit_code(), 1);
        assert_eq!(
            TarkeepError::ToolMissing {
                message: "not found".to_string()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_suggestions() {
        let space = TarkeepError::InsufficientSpace {
            required: 1000,
            available: 500,
        };
        assert!(space.suggestions().iter().any(|s| s.contains("disk space")));

        let missing = TarkeepError::ToolMissing {
            message: "no tar".to_string(),
        };
        assert!(missing.suggestions().iter().any(|s| s.contains("tar")));

        assert!(TarkeepError::Interrupted.suggestions().is_empty());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "missing");
        let error: TarkeepError = io_error.into();
        match error {
            TarkeepError::Io(_) => (),
            _ => panic!("Expected IO error conversion"),
        }
    }
}
