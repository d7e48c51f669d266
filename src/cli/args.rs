//! CLI argument parsing

use crate::config::{DaemonConfig, parse_time_of_day, positive_secs};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
    pub common: CommonArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the scheduler loop.
    Run(RunArgs),
    /// Run one transfer-and-backup cycle now.
    Cycle,
    /// Run one manual dashboard backup now.
    Backup,
    /// Report missing department submissions.
    Check,
    /// Print a snapshot of a directory.
    Scan(ScanArgs),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub foreground: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanArgs {
    pub dir: String,
}

/// Options accepted by every command.
#[derive(Debug, Clone, Default)]
pub struct CommonArgs {
    pub root: Option<String>,
    pub config: Option<String>,
    pub pid_file: Option<String>,
    pub transfer_time: Option<String>,
    pub interval_secs: Option<u64>,
    pub json: bool,
}

impl CommonArgs {
    /// Defaults, then the config file, then command line overrides.
    pub fn resolve(&self) -> crate::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_json_file(Path::new(path))?,
            None => DaemonConfig::default(),
        };

        if let Some(root) = &self.root {
            config.root = PathBuf::from(root);
        }
        if let Some(pid_file) = &self.pid_file {
            config.pid_file = PathBuf::from(pid_file);
        }
        if let Some(time) = &self.transfer_time {
            config.transfer_at = parse_time_of_day(time)?;
        }
        if let Some(secs) = self.interval_secs {
            config.detection_interval = positive_secs(secs, "--interval")?;
        }

        Ok(config)
    }
}

/// Parse command line arguments
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    let name = args[1].as_str();
    if !matches!(name, "run" | "cycle" | "backup" | "check" | "scan") {
        return Err(format!("Unknown command: {name}"));
    }

    let mut common = CommonArgs::default();
    let mut foreground = false;
    let mut positional: Option<String> = None;
    let rest = &args[2..];
    let mut i = 0;

    while i < rest.len() {
        match rest[i].as_str() {
            "--root" => {
                common.root = Some(option_value(rest, &mut i, "--root requires a directory")?);
            }
            "--config" => {
                common.config = Some(option_value(rest, &mut i, "--config requires a file path")?);
            }
            "--pid-file" => {
                common.pid_file =
                    Some(option_value(rest, &mut i, "--pid-file requires a file path")?);
            }
            "--transfer-time" => {
                let value = option_value(rest, &mut i, "--transfer-time requires HH:MM")?;
                parse_time_of_day(&value).map_err(|e| e.to_string())?;
                common.transfer_time = Some(value);
            }
            "--interval" => {
                let value = option_value(rest, &mut i, "--interval requires a value")?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| "--interval must be a positive integer".to_string())?;
                if secs == 0 {
                    return Err("--interval must be greater than zero".to_string());
                }
                common.interval_secs = Some(secs);
            }
            "--json" => {
                common.json = true;
            }
            "--foreground" | "-f" if name == "run" => {
                foreground = true;
            }
            arg if !arg.starts_with('-') && name == "scan" => {
                if positional.is_some() {
                    return Err(format!("Unexpected argument: {arg}"));
                }
                positional = Some(arg.to_string());
            }
            arg if !arg.starts_with('-') => {
                return Err(format!("Unexpected argument: {arg}"));
            }
            _ => return Err(format!("Unknown option: {}", rest[i])),
        }
        i += 1;
    }

    let command = match name {
        "run" => Command::Run(RunArgs { foreground }),
        "cycle" => Command::Cycle,
        "backup" => Command::Backup,
        "check" => Command::Check,
        _ => {
            let dir = positional.ok_or_else(|| "Missing required argument: DIR".to_string())?;
            Command::Scan(ScanArgs { dir })
        }
    };

    Ok(CliArgs { command, common })
}

fn option_value(args: &[String], i: &mut usize, missing: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| missing.to_string())
}
