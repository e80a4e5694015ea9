//! Library injection protocol, coordinator and override phase.

pub mod coordinator;
pub mod loader;
pub mod phase;
pub mod remote_thread;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{inject_all, InjectionReport, LibraryReport, PairOutcome};
pub use loader::ModuleLoader;
pub use phase::{run_injection_phase, InjectionOverride, InjectionPhase, OverrideOutcome};
pub use remote_thread::{RemoteThreadInjector, WriteFailurePolicy};
pub use traits::{
    InjectionOutcome, InjectionResult, LibraryInjector, RemoteAddress, RemoteProcess,
};
