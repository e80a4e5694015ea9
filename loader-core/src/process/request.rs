// Launch request and per-instance command line

use crate::error::LaunchError;
use crate::memory::wide::to_wide;
use std::path::{Path, PathBuf};

/// Upper bound on instances when the settings do not say otherwise
pub const DEFAULT_MAX_INSTANCES: usize = 8;

/// What to launch and how many times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    executable: PathBuf,
    arguments: Option<String>,
    instance_count: usize,
}

impl LaunchRequest {
    /// Builds a request, clamping `instance_count` to `[1, max_instances]`
    ///
    /// An empty argument string is treated as no arguments.
    ///
    /// # Returns
    /// * `Err(LaunchError::EmptyExecutablePath)` - `executable` is empty
    pub fn new(
        executable: impl Into<PathBuf>,
        arguments: Option<String>,
        instance_count: usize,
        max_instances: usize,
    ) -> Result<Self, LaunchError> {
        let executable = executable.into();
        if executable.as_os_str().is_empty() {
            return Err(LaunchError::EmptyExecutablePath);
        }

        let clamped = instance_count.clamp(1, max_instances.max(1));
        if clamped != instance_count {
            log::warn!(
                "Instance count {} clamped to {}",
                instance_count,
                clamped
            );
        }

        Ok(Self {
            executable,
            arguments: arguments.filter(|args| !args.is_empty()),
            instance_count: clamped,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// The command line as text: the quoted executable, then the arguments
    /// verbatim
    pub fn command_line_text(&self) -> String {
        let mut command_line = format!("\"{}\"", self.executable.display());
        if let Some(args) = &self.arguments {
            command_line.push(' ');
            command_line.push_str(args);
        }
        command_line
    }

    /// A fresh NUL-terminated UTF-16 command line.
    ///
    /// CreateProcessW may write into the buffer, so every instance gets its
    /// own copy.
    pub fn command_line(&self) -> Vec<u16> {
        to_wide(&self.command_line_text())
    }
}
