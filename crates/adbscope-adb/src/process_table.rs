//! Blocking process table snapshots over adb

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

/// Columns requested from ps on the device
pub const PS_COLUMNS: &str = "USER,PID,PPID,NAME";

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments for one process table snapshot
pub fn ps_args() -> [&'static str; 4] {
    ["shell", "ps", "-o", PS_COLUMNS]
}

/// Captures the device process table, one blocking snapshot per call
#[derive(Clone, Debug)]
pub struct AdbProcessTable {
    adb: PathBuf,
    timeout: Duration,
}

impl AdbProcessTable {
    pub fn new(adb: PathBuf) -> Self {
        Self {
            adb,
            timeout: SNAPSHOT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `adb shell ps` and return its full output. Blocks the calling
    /// thread for up to the configured timeout; callers on the runtime
    /// should go through spawn_blocking.
    pub fn snapshot(&self) -> Result<String> {
        let mut child = Command::new(&self.adb)
            .args(ps_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.adb.display()))?;

        let mut stdout = child.stdout.take().context("ps subprocess has no stdout")?;

        // Read on a helper thread so a hung device cannot block forever
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let read = stdout.read_to_end(&mut buf).map(|_| buf);
            let _ = tx.send(read);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(read) => {
                let buf = read.context("failed to read ps output")?;
                let status = child.wait().context("failed to wait for ps")?;
                if !status.success() {
                    bail!("ps exited with {status}");
                }
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                bail!("ps timed out after {:?}", self.timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ps_args_request_the_four_columns() {
        assert_eq!(ps_args(), ["shell", "ps", "-o", "USER,PID,PPID,NAME"]);
    }

    #[cfg(unix)]
    #[test]
    fn snapshot_captures_child_stdout() {
        // echo prints its arguments and exits cleanly, standing in for adb
        let table = AdbProcessTable::new(PathBuf::from("/bin/echo"));
        let out = table.snapshot().unwrap();
        assert_eq!(out.trim_end(), "shell ps -o USER,PID,PPID,NAME");
    }

    #[cfg(unix)]
    #[test]
    fn snapshot_fails_for_missing_binary() {
        let table = AdbProcessTable::new(PathBuf::from("/nonexistent/adb"));
        assert!(table.snapshot().is_err());
    }
}
