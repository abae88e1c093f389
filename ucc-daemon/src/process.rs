//! Process-level hardening and CLI handling, split out of `main.rs` so the
//! pure pieces (argument parsing, pid-file lifecycle against an arbitrary
//! path) can be exercised from integration tests without root or real
//! hardware.

use std::path::Path;

use tracing::{debug, info, warn};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PID_FILE: &str = "/run/uccd.pid";

// ============================================================================
// Security hardening
// ============================================================================

/// Strip environment variables that could redirect dynamic linking or
/// locale-dependent parsing, then pin a minimal `PATH` and a fixed locale.
pub fn sanitize_environment() {
    const DANGEROUS_VARS: &[&str] = &[
        "LD_PRELOAD",
        "LD_LIBRARY_PATH",
        "LD_AUDIT",
        "LD_DEBUG",
        "LD_PROFILE",
        "MALLOC_CHECK_",
        "HOSTALIASES",
        "LOCALDOMAIN",
        "RES_OPTIONS",
        "TMPDIR",
        "IFS",
        "PATH",
    ];
    for var in DANGEROUS_VARS {
        std::env::remove_var(var);
    }
    std::env::set_var("PATH", "/usr/sbin:/usr/bin:/sbin:/bin");
    std::env::set_var("LC_ALL", "C");
    std::env::set_var("LANG", "C");
    debug!("environment sanitized");
}

pub fn set_rlimit(resource: i32, soft: u64, hard: u64) {
    let limit = libc::rlimit { rlim_cur: soft as libc::rlim_t, rlim_max: hard as libc::rlim_t };
    // SAFETY: `resource` is always a valid RLIMIT_* constant and `limit` is fully initialized.
    unsafe {
        #[allow(clippy::useless_conversion)]
        if libc::setrlimit(resource as libc::__rlimit_resource_t, &limit) != 0 {
            warn!(resource, "failed to set rlimit");
        }
    }
}

pub fn set_resource_limits() {
    set_rlimit(libc::RLIMIT_CORE as i32, 0, 0);
    set_rlimit(libc::RLIMIT_NOFILE as i32, 1024, 1024);
    set_rlimit(libc::RLIMIT_AS as i32, 256 * 1024 * 1024, 256 * 1024 * 1024);
    set_rlimit(libc::RLIMIT_DATA as i32, 64 * 1024 * 1024, 64 * 1024 * 1024);
    debug!("resource limits applied");
}

pub fn set_secure_umask() {
    // SAFETY: umask takes no pointers and cannot fail.
    unsafe { libc::umask(0o077) };
    debug!("umask set to 0077");
}

pub fn secure_working_directory() {
    if std::env::set_current_dir("/").is_err() {
        warn!("could not chdir to /");
    }
}

pub fn verify_privileges() -> Result<(), &'static str> {
    // SAFETY: geteuid/getuid take no arguments and cannot fail.
    let euid = unsafe { libc::geteuid() };
    let uid = unsafe { libc::getuid() };
    if euid != 0 {
        return Err("daemon must run as root (euid=0) for embedded-controller access");
    }
    if uid != 0 {
        warn!("running setuid root; not recommended");
    }
    info!(uid, euid, "running as root");
    Ok(())
}

// ============================================================================
// PID file
// ============================================================================

/// Writes `pid_file` with the current process id, refusing to clobber a
/// still-running instance. Parameterized over the path so tests can point
/// it at a scratch file; production always calls this with [`PID_FILE`].
pub fn write_pid_file(pid_file: &Path) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    if pid_file.exists() {
        if let Ok(content) = std::fs::read_to_string(pid_file) {
            if let Ok(old_pid) = content.trim().parse::<i32>() {
                // SAFETY: signal 0 only probes for existence, it is never delivered.
                if unsafe { libc::kill(old_pid, 0) } == 0 {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::AddrInUse,
                        format!("another instance is running (pid {old_pid})"),
                    ));
                }
            }
        }
        let _ = std::fs::remove_file(pid_file);
    }

    let mut file = std::fs::OpenOptions::new().write(true).create_new(true).mode(0o644).open(pid_file)?;
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()?;
    debug!(pid_file = %pid_file.display(), "pid file written");
    Ok(())
}

pub fn remove_pid_file(pid_file: &Path) {
    if pid_file.exists() {
        if let Err(e) = std::fs::remove_file(pid_file) {
            warn!(error = %e, "failed to remove pid file");
        }
    }
}

/// Sends `SIGTERM` to the pid recorded in `pid_file`; used by `--stop`
/// and by the service unit's `ExecStartPre` to reap a stale instance.
pub fn signal_running_instance(pid_file: &Path) {
    let Ok(content) = std::fs::read_to_string(pid_file) else {
        info!("no pid file found, nothing to stop");
        return;
    };
    let Ok(pid) = content.trim().parse::<i32>() else {
        warn!("pid file contents unreadable, removing");
        remove_pid_file(pid_file);
        return;
    };
    // SAFETY: SIGTERM delivery to a pid read from our own pid file.
    if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
        info!(pid, "sent SIGTERM to running instance");
    } else {
        info!(pid, "no running instance at that pid, cleaning up stale pid file");
        remove_pid_file(pid_file);
    }
}

// ============================================================================
// CLI
// ============================================================================

pub fn print_help() {
    eprintln!("uccd {VERSION} - privileged control daemon");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    uccd --start | --stop");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --start         Run the daemon in the foreground (default)");
    eprintln!("    --stop          Signal a running instance and exit");
    eprintln!("    -v, --version   Print version");
    eprintln!("    -h, --help      Print this help");
}

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Start,
    Stop,
}

/// Outcome of parsing the process argument list, before any side effects
/// (printing help/version, exiting) are applied. Kept pure so the matching
/// logic is unit-testable; [`parse_args`] drives the side effects from it.
#[derive(Debug, PartialEq, Eq)]
pub enum ArgOutcome {
    Run(Mode),
    PrintHelp,
    PrintVersion,
    Unknown(String),
}

pub fn mode_from_args(args: &[String]) -> ArgOutcome {
    let mut mode = Mode::Start;
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return ArgOutcome::PrintHelp,
            "-v" | "--version" => return ArgOutcome::PrintVersion,
            "--start" => mode = Mode::Start,
            "--stop" => mode = Mode::Stop,
            other => return ArgOutcome::Unknown(other.to_string()),
        }
    }
    ArgOutcome::Run(mode)
}

pub fn parse_args() -> Mode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match mode_from_args(&args) {
        ArgOutcome::Run(mode) => mode,
        ArgOutcome::PrintHelp => {
            print_help();
            std::process::exit(0);
        }
        ArgOutcome::PrintVersion => {
            println!("uccd {VERSION}");
            std::process::exit(0);
        }
        ArgOutcome::Unknown(other) => {
            eprintln!("unknown argument: {other}");
            print_help();
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_defaults_to_start() {
        assert_eq!(mode_from_args(&[]), ArgOutcome::Run(Mode::Start));
    }

    #[test]
    fn stop_flag_selects_stop_mode() {
        let args = vec!["--stop".to_string()];
        assert_eq!(mode_from_args(&args), ArgOutcome::Run(Mode::Stop));
    }

    #[test]
    fn later_flag_overrides_earlier_one() {
        let args = vec!["--stop".to_string(), "--start".to_string()];
        assert_eq!(mode_from_args(&args), ArgOutcome::Run(Mode::Start));
    }

    #[test]
    fn unknown_flag_is_reported() {
        let args = vec!["--bogus".to_string()];
        assert_eq!(mode_from_args(&args), ArgOutcome::Unknown("--bogus".to_string()));
    }

    #[test]
    fn help_short_circuits_regardless_of_position() {
        let args = vec!["--start".to_string(), "--help".to_string()];
        assert_eq!(mode_from_args(&args), ArgOutcome::PrintHelp);
    }

    #[test]
    fn pid_file_round_trip_detects_stale_and_live_instances() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("uccd.pid");

        write_pid_file(&pid_path).unwrap();
        let recorded: i32 = std::fs::read_to_string(&pid_path).unwrap().trim().parse().unwrap();
        assert_eq!(recorded, std::process::id() as i32);

        // our own pid is alive, so writing again must refuse to clobber it
        assert!(write_pid_file(&pid_path).is_err());

        remove_pid_file(&pid_path);
        assert!(!pid_path.exists());
    }

    #[test]
    fn stale_pid_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("uccd.pid");
        // i32::MAX is never an assignable pid, so the liveness probe fails and
        // the stale entry gets replaced.
        std::fs::write(&pid_path, format!("{}\n", i32::MAX)).unwrap();
        assert!(write_pid_file(&pid_path).is_ok());
    }
}
