//! Error types for the process-control core.

use std::fmt;
use thiserror::Error;

/// Result type for process-control operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Step of the token adjustment chain that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeStage {
    OpenToken,
    LookupValue,
    Adjust,
}

impl fmt::Display for PrivilegeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrivilegeStage::OpenToken => "OpenProcessToken",
            PrivilegeStage::LookupValue => "LookupPrivilegeValue",
            PrivilegeStage::Adjust => "AdjustTokenPrivileges",
        };
        f.write_str(name)
    }
}

/// Failures of the locate / elevate / open / apply chain.
///
/// `code` fields hold the Win32 error code reported by the OS, `status`
/// holds a raw NTSTATUS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("process not found: {name}")]
    NotFound { name: String },

    #[error("failed to snapshot process list (os error {code})")]
    Snapshot { code: u32 },

    #[error("{stage} failed (os error {code})")]
    Privilege { stage: PrivilegeStage, code: u32 },

    #[error("failed to open process {pid} (os error {code})")]
    OpenProcess { pid: u32, code: u32 },

    #[error("failed to set affinity of process {pid} (os error {code})")]
    SetAffinity { pid: u32, code: u32 },

    #[error("failed to suspend process {pid} (status {status:#010x})")]
    Suspend { pid: u32, status: i32 },

    #[error("unsupported cpu topology: {cpu_count} logical cores")]
    InvalidTopology { cpu_count: usize },
}

impl ControlError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
