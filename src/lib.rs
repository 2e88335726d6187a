pub mod archive;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod rotate;
pub mod run;
pub mod space;
pub mod utils;

pub use archive::{Archiver, TarArchiver};
pub use cleanup::CleanupContext;
pub use config::{default_config, dump_config, load_config, Config};
pub use error::TarkeepError;
pub use rotate::{list_backups, rotate, BackupRecord};
pub use run::{dry_run, run_backup, RunReport};
pub use space::{check_space, estimate_source_size};
pub use utils::{format_size, validate_project_name};

/// Main library result type
pub type Result<T> = std::result::Result<T, TarkeepError>;
