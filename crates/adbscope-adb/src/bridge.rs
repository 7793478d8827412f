//! Locating adb and spawning the logcat subprocess

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use crate::process_table::AdbProcessTable;

#[cfg(windows)]
const ADB_BINARY: &str = "adb.exe";
#[cfg(not(windows))]
const ADB_BINARY: &str = "adb";

/// Logcat ring buffers requested from the device
pub const LOGCAT_BUFFERS: &str = "default,events";

/// Arguments for the streaming logcat invocation
pub fn logcat_args() -> [&'static str; 4] {
    ["shell", "logcat", "-b", LOGCAT_BUFFERS]
}

/// Path of the adb binary under an SDK root
fn adb_under(sdk_root: impl Into<PathBuf>) -> PathBuf {
    sdk_root.into().join("platform-tools").join(ADB_BINARY)
}

/// Entry point to the device. Locates the adb binary once and hands out
/// the subprocess handles built on it.
#[derive(Clone, Debug)]
pub struct AdbBridge {
    adb: PathBuf,
}

impl AdbBridge {
    /// Locate adb under the standard SDK layout
    pub fn from_env() -> Result<Self> {
        let sdk_root = std::env::var("ANDROID_SDK_ROOT")
            .context("ANDROID_SDK_ROOT is not set. Is the Android SDK installed?")?;
        Ok(Self {
            adb: adb_under(sdk_root),
        })
    }

    /// Use an explicit adb binary instead of the SDK layout
    pub fn with_adb(adb: impl Into<PathBuf>) -> Self {
        Self { adb: adb.into() }
    }

    pub fn adb_path(&self) -> &Path {
        &self.adb
    }

    /// Spawn the streaming logcat subprocess. The child is killed if the
    /// handle is dropped without an explicit terminate.
    pub fn spawn_logcat(&self) -> Result<LogcatProcess> {
        debug!("spawning {} logcat", self.adb.display());
        let child = Command::new(&self.adb)
            .args(logcat_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.adb.display()))?;
        Ok(LogcatProcess { child })
    }

    /// Process table reader bound to the same adb binary
    pub fn process_table(&self) -> AdbProcessTable {
        AdbProcessTable::new(self.adb.clone())
    }
}

/// Handle to the running logcat subprocess
pub struct LogcatProcess {
    child: Child,
}

impl LogcatProcess {
    /// Take the stdout pipe for line-based reading.
    /// Returns None if it was already taken.
    pub fn take_stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.child.stdout.take().map(BufReader::new)
    }

    /// Stop the subprocess. Safe to call when it has already exited.
    pub async fn terminate(&mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logcat_args_request_both_buffers() {
        assert_eq!(logcat_args(), ["shell", "logcat", "-b", "default,events"]);
    }

    #[test]
    fn explicit_adb_path_is_used_verbatim() {
        let bridge = AdbBridge::with_adb("/opt/sdk/platform-tools/adb");
        assert_eq!(
            bridge.adb_path(),
            Path::new("/opt/sdk/platform-tools/adb")
        );
    }

    #[test]
    fn sdk_layout_places_adb_under_platform_tools() {
        let adb = adb_under("/opt/android-sdk");
        assert!(adb.ends_with(Path::new("platform-tools").join(ADB_BINARY)));
    }
}
