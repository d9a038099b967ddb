use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

/// Run a command and capture its output, whatever the exit status
pub fn run_output(cmd: &str, args: &[&str]) -> Result<Output> {
    log::trace!("exec: {} {}", cmd, args.join(" "));
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))
}

/// Start a command in `dir` without waiting for it, appending its output to `log_file`
pub fn spawn_logged(cmd: &str, args: &[&str], dir: &Path, log_file: &Path) -> Result<Child> {
    let log = File::options()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Could not open {}", log_file.display()))?;
    let log_err = log
        .try_clone()
        .with_context(|| format!("Could not open {}", log_file.display()))?;

    Command::new(cmd)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))
}
