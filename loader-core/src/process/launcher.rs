//! Creates game instances from a [`LaunchRequest`].

use crate::error::LaunchError;
use crate::process::LaunchRequest;
use std::path::Path;
use std::time::Duration;

/// Delay between readiness checks of a running instance.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// OS process creation, as the launcher needs it.
pub trait ProcessSpawner {
    /// A created process.
    type Process;

    /// Create one process from `executable` with a mutable `command_line`.
    ///
    /// # Errors
    /// Returns the OS error from process creation.
    fn spawn(
        &self,
        executable: &Path,
        command_line: &mut [u16],
        suspended: bool,
    ) -> std::io::Result<Self::Process>;

    /// Whether the process can be opened for queries yet.
    fn is_queryable(&self, process: &Self::Process) -> bool;

    /// Dispose of an instance created before a later instance failed.
    fn discard(&self, process: Self::Process);
}

/// Launches every instance of a request.
#[derive(Debug)]
pub struct Launcher<S> {
    spawner: S,
    poll_interval: Duration,
}

impl<S: ProcessSpawner> Launcher<S> {
    pub fn new(spawner: S) -> Self {
        Self {
            spawner,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Create `request.instance_count()` processes.
    ///
    /// Suspended instances are returned as soon as they exist. Running
    /// instances are returned once each one can be opened for queries.
    ///
    /// # Errors
    /// The first creation failure stops the launch. Instances created before
    /// it are discarded.
    pub fn launch(
        &self,
        request: &LaunchRequest,
        suspended: bool,
    ) -> Result<Vec<S::Process>, LaunchError> {
        let mut processes = Vec::with_capacity(request.instance_count());

        for instance in 0..request.instance_count() {
            let mut command_line = request.command_line();

            match self
                .spawner
                .spawn(request.executable(), &mut command_line, suspended)
            {
                Ok(process) => {
                    log::debug!("Created instance {} (suspended: {})", instance + 1, suspended);
                    processes.push(process);
                }
                Err(source) => {
                    log::error!("Failed to create instance {}: {}", instance + 1, source);

                    for process in processes.drain(..) {
                        self.spawner.discard(process);
                    }

                    return Err(classify_spawn_error(request.executable(), source));
                }
            }
        }

        if !suspended {
            for process in &processes {
                self.wait_until_queryable(process);
            }
        }

        log::info!("{} game instance(s) created", processes.len());
        Ok(processes)
    }

    fn wait_until_queryable(&self, process: &S::Process) {
        while !self.spawner.is_queryable(process) {
            std::thread::sleep(self.poll_interval);
        }
    }
}

/// `ERROR_FILE_NOT_FOUND`
const ERROR_FILE_NOT_FOUND: i32 = 2;

fn classify_spawn_error(executable: &Path, source: std::io::Error) -> LaunchError {
    if source.raw_os_error() == Some(ERROR_FILE_NOT_FOUND) {
        LaunchError::ExecutableNotFound(executable.to_path_buf())
    } else {
        LaunchError::CreateProcessFailed {
            path: executable.to_path_buf(),
            source,
        }
    }
}
