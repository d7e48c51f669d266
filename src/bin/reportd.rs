//! Report collection daemon (reportd) - Main binary entry point

use chrono::Local;
use daemonize::Daemonize;
use reportd::cli::args::{CliArgs, Command, RunArgs, parse_args};
use reportd::cli::output::{
    format_backup, format_cycle, format_json, format_missing, format_snapshot,
};
use reportd::daemon::{self, ControlHandle, PidGuard, Scheduler, signals};
use reportd::io::journal::{FileJournal, Journal, SharedJournal};
use reportd::services::{missing, scan};
use reportd::{DaemonConfig, Error, OutcomeStatus};
use std::process;
use std::sync::Arc;

fn main() {
    // Initialize logger (controlled by RUST_LOG environment variable)
    // Example: RUST_LOG=debug reportd run --foreground
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "--help" | "-h" => {
            print_help();
            return;
        }
        "--version" | "-v" => {
            print_version();
            return;
        }
        _ => {}
    }

    let cli_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            process::exit(2);
        }
    };

    let config = match cli_args.common.resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };

    let exit_code = execute(&cli_args, config);
    process::exit(exit_code);
}

fn execute(cli_args: &CliArgs, config: DaemonConfig) -> i32 {
    let json = cli_args.common.json;
    match &cli_args.command {
        Command::Run(run_args) => handle_run(config, run_args),
        Command::Cycle => handle_cycle(config, json),
        Command::Backup => handle_backup(&config, json),
        Command::Check => handle_check(&config, json),
        Command::Scan(scan_args) => handle_scan(&scan_args.dir, json),
    }
}

fn error_code(err: &Error) -> i32 {
    match err {
        Error::InvalidInput(_) | Error::PathTooLong { .. } => 2,
        _ => 4,
    }
}

fn status_code(status: OutcomeStatus) -> i32 {
    match status {
        OutcomeStatus::Success => 0,
        OutcomeStatus::Partial => 3,
        OutcomeStatus::Failure => 4,
    }
}

fn fail(err: &Error) -> i32 {
    eprintln!("Error: {err}");
    if matches!(err, Error::AlreadyRunning { .. }) {
        eprintln!("Signal the running daemon instead (SIGUSR1 backup, SIGUSR2 cycle)");
    }
    error_code(err)
}

/// Take the instance lock and prepare the layout for a one-shot command.
fn open_instance(config: &DaemonConfig) -> Result<(PidGuard, SharedJournal), Error> {
    let guard = PidGuard::acquire(&config.pid_file)?;
    let journal: SharedJournal = Arc::new(FileJournal::new(&config.layout()));
    daemon::prepare(config, journal.as_ref())?;
    Ok((guard, journal))
}

fn handle_run(mut config: DaemonConfig, args: &RunArgs) -> i32 {
    // Daemonizing moves the working directory to `/`.
    if let Err(e) = config.layout().ensure() {
        return fail(&e);
    }
    config.root = match std::fs::canonicalize(&config.root) {
        Ok(root) => root,
        Err(e) => return fail(&Error::Io(e)),
    };
    config.pid_file = match std::path::absolute(&config.pid_file) {
        Ok(path) => path,
        Err(e) => return fail(&Error::Io(e)),
    };

    let mut guard = match PidGuard::acquire(&config.pid_file) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };

    if !args.foreground {
        let no_mask: libc::mode_t = 0;
        if let Err(e) = Daemonize::new().working_directory("/").umask(no_mask).start() {
            return fail(&Error::Daemonize(e.to_string()));
        }
        if let Err(e) = guard.write_pid() {
            log::error!("Failed to update pid file: {e}");
        }
    }

    let journal: SharedJournal = Arc::new(FileJournal::new(&config.layout()));
    journal.operation("Report daemon starting");

    if let Err(e) = daemon::prepare(&config, journal.as_ref()) {
        journal.error(&format!("Initialization failed: {e}"));
        return error_code(&e);
    }

    let control = ControlHandle::new();
    if let Err(e) = signals::install(&control) {
        journal.error(&format!("Failed to install signal handlers: {e}"));
        return error_code(&e);
    }

    let mut scheduler = Scheduler::new(config, control, Arc::clone(&journal));
    scheduler.run();

    journal.operation("Daemon shutdown complete");
    drop(guard);
    0
}

fn handle_cycle(config: DaemonConfig, json: bool) -> i32 {
    let (guard, journal) = match open_instance(&config) {
        Ok(opened) => opened,
        Err(e) => return fail(&e),
    };

    let mut scheduler = Scheduler::new(config, ControlHandle::new(), journal);
    let report = scheduler.run_cycle(Local::now());
    scheduler.drain_events();
    drop(guard);

    if json {
        println!("{}", format_json(&report));
    } else {
        print!("{}", format_cycle(&report));
    }
    status_code(report.status())
}

fn handle_backup(config: &DaemonConfig, json: bool) -> i32 {
    let (_guard, journal) = match open_instance(config) {
        Ok(opened) => opened,
        Err(e) => return fail(&e),
    };

    match daemon::manual_backup(&config.layout(), config.modes, Local::now(), journal.as_ref()) {
        Ok(outcome) => {
            if json {
                println!("{}", format_json(&outcome));
            } else {
                print!("{}", format_backup(&outcome));
            }
            status_code(outcome.status())
        }
        Err(e) => fail(&e),
    }
}

fn handle_check(config: &DaemonConfig, json: bool) -> i32 {
    let layout = config.layout();
    let snapshot = match scan::read_snapshot(&layout.dashboard) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    // Only journal when the log directory is already there.
    if layout.logs.is_dir() {
        let journal = FileJournal::new(&layout);
        missing::check_missing(&snapshot, &config.expected_departments, &journal);
    }

    let absent = missing::missing_departments(&snapshot, &config.expected_departments);
    if json {
        println!("{}", format_json(&absent));
    } else {
        print!("{}", format_missing(&absent));
    }

    if absent.is_empty() { 0 } else { 3 }
}

fn handle_scan(dir: &str, json: bool) -> i32 {
    let snapshot = match scan::read_snapshot(dir) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if json {
        println!("{}", format_json(&snapshot));
    } else {
        print!("{}", format_snapshot(&snapshot));
    }

    if snapshot.errors.is_empty() { 0 } else { 3 }
}

fn print_help() {
    println!("Report collection daemon (reportd) - Collect department reports into a dashboard");
    println!();
    println!("USAGE:");
    println!("    reportd run [--foreground] [OPTIONS]");
    println!("    reportd cycle [OPTIONS]");
    println!("    reportd backup [OPTIONS]");
    println!("    reportd check [OPTIONS]");
    println!("    reportd scan <DIR> [--json]");
    println!();
    println!("COMMANDS:");
    println!("    run       Start the scheduler (daily transfer, backups, change audit)");
    println!("    cycle     Lock, transfer reports, check submissions, back up, unlock");
    println!("    backup    Back up the dashboard into a timestamped directory");
    println!("    check     List departments with no report in the dashboard");
    println!("    scan      Print the regular files of a directory with owner and department");
    println!();
    println!("GLOBAL OPTIONS:");
    println!("    -h, --help                 Show this help message");
    println!("    -v, --version              Show version information");
    println!();
    println!("OPTIONS:");
    println!("    --root <DIR>              Daemon root (default: {})", reportd::config::DEFAULT_ROOT);
    println!("    --config <FILE>           JSON config file; flags override it");
    println!("    --pid-file <FILE>         Instance lock (default: {})", reportd::config::DEFAULT_PID_FILE);
    println!("    --transfer-time <HH:MM>   Daily cycle time (default: 01:00)");
    println!("    --interval <SECS>         Change detection interval (default: 5)");
    println!("    --json                    Emit machine-readable output");
    println!("    -f, --foreground          Do not detach (run only)");
    println!();
    println!("SIGNALS (run):");
    println!("    SIGTERM, SIGINT           Shut down after the current step");
    println!("    SIGUSR1                   Manual backup");
    println!("    SIGUSR2                   Transfer-and-backup cycle now");
    println!("    SIGHUP                    Change detection pass now");
    println!();
    println!("EXIT CODES:");
    println!("    0 success, 2 usage or config error, 3 partial failure, 4 error");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DATE: &str = env!("GIT_DATE");
    const BUILD_TARGET: &str = env!("BUILD_TARGET");

    println!("reportd {VERSION}");
    println!("Commit: {GIT_HASH} ({GIT_DATE})");
    println!("Target: {BUILD_TARGET}");

    #[cfg(debug_assertions)]
    println!("Build: debug");
    #[cfg(not(debug_assertions))]
    println!("Build: release");
}
