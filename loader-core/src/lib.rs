// Core library for launching game instances and injecting libraries

pub mod error;
pub mod injection;
pub mod memory;
pub mod process;

#[cfg(windows)]
pub mod context;
#[cfg(windows)]
pub mod knowledge;

pub use error::{InjectionError, KnowledgeError, LaunchError};
pub use injection::{
    inject_all, run_injection_phase, InjectionOutcome, InjectionPhase, InjectionReport,
    LibraryInjector, ModuleLoader, RemoteThreadInjector, WriteFailurePolicy,
};
pub use process::{
    release_instances, LaunchRequest, Launcher, ProcessSpawner, Resumable, DEFAULT_MAX_INSTANCES,
};

#[cfg(windows)]
pub use context::LoaderContext;
#[cfg(windows)]
pub use knowledge::KnowledgeLibrary;
#[cfg(windows)]
pub use process::{LaunchedProcess, Win32Spawner};
