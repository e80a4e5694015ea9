// Error types for launch and injection operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while creating game instances
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Game executable path is empty")]
    EmptyExecutablePath,

    #[error("Game executable {} could not be found", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("CreateProcessW failed for {}", path.display())]
    CreateProcessFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort the injection phase.
///
/// Per-pair failures that the coordinator can step over are reported as
/// [`InjectionOutcome`](crate::injection::InjectionOutcome) values instead.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("LoadLibraryW address not found in kernel32.dll")]
    LoadLibraryNotFound,

    #[error("VirtualAllocEx failed in process {pid}")]
    MemoryAllocationFailed {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("WriteProcessMemory failed in process {pid}")]
    MemoryWriteFailed {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("VirtualFreeEx failed in process {pid}")]
    MemoryFreeFailed {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("ResumeThread failed for process {pid}")]
    ResumeFailed {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Knowledge library operation failed")]
    Knowledge(#[from] KnowledgeError),
}

/// Errors raised by the knowledge extension library.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("LoadLibraryW failed for knowledge library {}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FreeLibrary failed for knowledge library")]
    FreeFailed(#[source] std::io::Error),
}
