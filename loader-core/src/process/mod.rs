// Process launching module

mod launcher;
mod lifecycle;
mod request;

#[cfg(windows)]
mod handle;
#[cfg(windows)]
mod win32;

pub use launcher::{Launcher, ProcessSpawner, DEFAULT_POLL_INTERVAL};
pub use lifecycle::{release_instances, Resumable};
pub use request::{LaunchRequest, DEFAULT_MAX_INSTANCES};

#[cfg(windows)]
pub use handle::{ProcessHandle, ThreadHandle};
#[cfg(windows)]
pub use win32::{LaunchedProcess, Win32Spawner};
