use crate::error::TarkeepError;
use crate::Result;
use chrono::format::{Item, StrftimeItems};
use configparser::ini::Ini;
use std::path::{Path, PathBuf};

/// Name of the per-project configuration file, looked up in the source directory.
pub const CONFIG_FILE_NAME: &str = "tarkeep.ini";

/// Timestamp format for archive names: `YYYYMMDD_HHMMSS`, numeric and
/// lexically sortable.
pub const DEFAULT_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone)]
pub struct Config {
    pub max_backups: usize,
    pub debug: bool,
    pub excludes: Vec<String>,
    pub backup_dir: Option<PathBuf>,
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_backups: 10,
            debug: false,
            excludes: default_excludes(),
            backup_dir: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

/// Patterns excluded from archives by default: development environment
/// artifacts that are regenerated rather than backed up.
pub fn default_excludes() -> Vec<String> {
    [
        // IDEs and editors
        ".idea",
        ".vscode",
        ".eclipse",
        ".settings",
        "*.sublime-workspace",
        "*.sublime-project",
        ".atom",
        ".project",
        "*.iml",
        // Version control
        ".git",
        ".gitignore",
        ".svn",
        ".hg",
        // Temporary files
        "*.tmp",
        "*.temp",
        "*.swp",
        "*~",
        // Logs
        "*.log",
        "logs",
        // Python
        "venv",
        ".venv",
        "__pycache__",
        "*.pyc",
        "*.pyo",
        "*.pyd",
        ".Python",
        "pip-log.txt",
        ".tox",
        ".coverage",
        ".pytest_cache",
        // Node.js
        "node_modules",
        "npm-debug.log",
        "yarn-debug.log",
        "yarn-error.log",
        ".npm",
        // Rust
        "target",
        "Cargo.lock",
        "*.rs.bk",
        // Go
        "bin",
        "pkg",
        "*.exe",
        "*.test",
        "*.prof",
        // Zig
        "zig-cache",
        "zig-out",
        // Build output
        "build",
        "dist",
        "out",
        // Environment files
        ".env",
        ".env.local",
        ".env.*",
        "config.local.*",
        // OS cruft
        ".DS_Store",
        "Thumbs.db",
        "desktop.ini",
        // Compiled objects
        "*.o",
        "*.a",
        "*.so",
        "*.dylib",
        "*.dll",
        "*.class",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Get default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Load configuration from `tarkeep.ini` in the source directory, falling
/// back to defaults when the file does not exist. A present but malformed
/// file is an error; the caller degrades it to defaults with a warning.
/// The INI parser itself is lenient with free-form text, so malformed in
/// practice means values it reads but this tool cannot use: a non-numeric
/// or zero `max_backups`, or a `time_format` with unrecognized specifiers.
pub fn load_config(source_dir: &Path) -> Result<Config> {
    let config_path = source_dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        return Ok(default_config());
    }

    let mut conf = Ini::new();
    conf.load(&config_path)
        .map_err(|e| TarkeepError::config(format!("Failed to parse config file: {e}")))?;

    let mut config = default_config();

    if let Some(value) = conf.get("tarkeep", "max_backups") {
        let parsed: usize = value
            .parse()
            .map_err(|_| TarkeepError::config(format!("Invalid max_backups: {value}")))?;
        if parsed == 0 {
            return Err(TarkeepError::config("max_backups must be at least 1"));
        }
        config.max_backups = parsed;
    }

    if let Some(value) = conf.get("tarkeep", "debug") {
        config.debug = parse_bool(&value).unwrap_or(config.debug);
    }

    if let Some(value) = conf.get("tarkeep", "excludes") {
        config.excludes = parse_excludes(&value);
    }

    if let Some(value) = conf.get("tarkeep", "backup_dir") {
        if !value.trim().is_empty() {
            config.backup_dir = Some(PathBuf::from(value.trim()));
        }
    }

    if let Some(value) = conf.get("tarkeep", "time_format") {
        validate_time_format(&value)?;
        config.time_format = value;
    }

    Ok(config)
}

/// Reject time formats that chrono cannot render; formatting them later
/// would panic mid-run, after rotation has already deleted old archives.
pub fn validate_time_format(format: &str) -> Result<()> {
    let broken = StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if broken {
        return Err(TarkeepError::config(format!(
            "Invalid time_format: {format}"
        )));
    }
    Ok(())
}

/// Parse a boolean value from INI string
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a comma-separated exclude list, preserving order
fn parse_excludes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Display the current configuration in a user-friendly format
pub fn dump_config(source_dir: &Path, config: &Config) {
    let config_path = source_dir.join(CONFIG_FILE_NAME);

    println!("tarkeep Configuration");
    println!("=====================");
    println!();

    if config_path.exists() {
        println!("Config file: {} (found)", config_path.display());
    } else {
        println!(
            "Config file: {} (not found, using defaults)",
            config_path.display()
        );
    }
    println!();

    println!("Current Settings:");
    println!("-----------------");
    println!("max_backups = {}", config.max_backups);
    println!("debug       = {}", config.debug);
    match &config.backup_dir {
        Some(dir) => println!("backup_dir  = {}", dir.display()),
        None => println!("backup_dir  = (sibling \"Backup\" directory)"),
    }
    println!("time_format = {}", config.time_format);
    println!("excludes    = {}", config.excludes.join(", "));
    println!();

    println!("Archives are named <project>_backup_<timestamp>.tar.gz");
}
