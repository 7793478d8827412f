//! Android device access for adbscope
//!
//! This crate locates the adb binary and drives the two device-facing
//! subprocesses: the streaming logcat reader and blocking process table
//! snapshots.

mod bridge;
mod process_table;

pub use bridge::{AdbBridge, LOGCAT_BUFFERS, LogcatProcess, logcat_args};
pub use process_table::{AdbProcessTable, PS_COLUMNS, ps_args};
