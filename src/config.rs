//! Daemon configuration and on-disk layout

use crate::{Error, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root used when neither the command line nor a config file names one.
/// Packagers can override it at build time through `REPORTD_DEFAULT_ROOT`.
pub const DEFAULT_ROOT: &str = match option_env!("REPORTD_DEFAULT_ROOT") {
    Some(root) => root,
    None => "/var/report_system",
};

pub const DEFAULT_PID_FILE: &str = "/var/run/report_daemon.pid";

pub const DEFAULT_DEPARTMENTS: [&str; 4] = ["Warehouse", "Manufacturing", "Sales", "Distribution"];

/// Permission bits applied by the directory lock controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockModes {
    pub inbox: u32,
    pub dashboard: u32,
    pub locked: u32,
}

impl Default for LockModes {
    fn default() -> Self {
        Self {
            inbox: 0o777,
            dashboard: 0o755,
            locked: 0o000,
        }
    }
}

/// Options for running the daemon
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub root: PathBuf,
    pub pid_file: PathBuf,
    /// Local time of day at which the transfer and backup cycle runs.
    pub transfer_at: NaiveTime,
    pub detection_interval: Duration,
    pub poll_quantum: Duration,
    pub expected_departments: Vec<String>,
    pub modes: LockModes,
    /// Also audit changes made directly in the dashboard.
    pub watch_dashboard: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            transfer_at: NaiveTime::from_hms_opt(1, 0, 0).unwrap_or_default(),
            detection_interval: Duration::from_secs(5),
            poll_quantum: Duration::from_secs(1),
            expected_departments: DEFAULT_DEPARTMENTS.iter().map(ToString::to_string).collect(),
            modes: LockModes::default(),
            watch_dashboard: false,
        }
    }
}

/// Config file representation; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub root: Option<PathBuf>,
    pub pid_file: Option<PathBuf>,
    pub transfer_time: Option<String>,
    pub detection_interval_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub departments: Option<Vec<String>>,
    pub inbox_mode: Option<u32>,
    pub dashboard_mode: Option<u32>,
    pub locked_mode: Option<u32>,
    pub watch_dashboard: Option<bool>,
}

impl DaemonConfig {
    /// Load a JSON config file on top of the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidInput(format!("malformed config: {e}")))?;
        let mut config = Self::default();
        config.apply(file)?;
        Ok(config)
    }

    pub fn apply(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(root) = file.root {
            self.root = root;
        }
        if let Some(pid_file) = file.pid_file {
            self.pid_file = pid_file;
        }
        if let Some(time) = file.transfer_time {
            self.transfer_at = parse_time_of_day(&time)?;
        }
        if let Some(secs) = file.detection_interval_secs {
            self.detection_interval = positive_secs(secs, "detection_interval_secs")?;
        }
        if let Some(ms) = file.poll_interval_ms {
            if ms == 0 {
                return Err(Error::InvalidInput(
                    "poll_interval_ms must be greater than zero".to_string(),
                ));
            }
            self.poll_quantum = Duration::from_millis(ms);
        }
        if let Some(departments) = file.departments {
            self.expected_departments = departments;
        }
        if let Some(mode) = file.inbox_mode {
            self.modes.inbox = checked_mode(mode, "inbox_mode")?;
        }
        if let Some(mode) = file.dashboard_mode {
            self.modes.dashboard = checked_mode(mode, "dashboard_mode")?;
        }
        if let Some(mode) = file.locked_mode {
            self.modes.locked = checked_mode(mode, "locked_mode")?;
        }
        if let Some(watch) = file.watch_dashboard {
            self.watch_dashboard = watch;
        }
        Ok(())
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(&self.root)
    }
}

/// Parse `HH:MM` into a time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| Error::InvalidInput(format!("expected HH:MM, got '{value}'")))
}

pub fn positive_secs(secs: u64, name: &str) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::InvalidInput(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn checked_mode(mode: u32, name: &str) -> Result<u32> {
    if mode > 0o7777 {
        return Err(Error::InvalidInput(format!(
            "{name} {mode:o} is not a permission mode"
        )));
    }
    Ok(mode)
}

/// Fixed directory layout below the daemon root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub inbox: PathBuf,
    pub dashboard: PathBuf,
    pub backup: PathBuf,
    pub logs: PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            inbox: root.join("upload"),
            dashboard: root.join("dashboard"),
            backup: root.join("backup"),
            logs: root.join("logs"),
        }
    }

    #[must_use]
    pub fn operation_log(&self) -> PathBuf {
        self.logs.join("operations.log")
    }

    #[must_use]
    pub fn error_log(&self) -> PathBuf {
        self.logs.join("error.log")
    }

    #[must_use]
    pub fn change_log(&self) -> PathBuf {
        self.logs.join("changes.log")
    }

    /// Create any missing directory. Returns the directories that were created.
    pub fn ensure(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for dir in [&self.inbox, &self.dashboard, &self.backup, &self.logs] {
            match fs::metadata(dir) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return Err(Error::InvalidInput(format!(
                        "{} exists but is not a directory",
                        dir.display()
                    )));
                }
                Err(_) => {
                    fs::create_dir_all(dir)?;
                    created.push(dir.clone());
                }
            }
        }
        Ok(created)
    }
}
