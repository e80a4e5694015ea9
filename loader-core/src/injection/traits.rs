//! Core injection traits and types.

use crate::injection::ModuleLoader;
use crate::InjectionError;
use std::path::Path;

/// Result type for injection operations.
pub type InjectionResult<T> = Result<T, InjectionError>;

/// Outcome of injecting one library into one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// The remote loader thread ran to completion.
    Success,
    /// This pair failed; other pairs are still attempted.
    Failed,
    /// The system lacks remote allocation entirely. Every later pair would
    /// fail the same way, so the pass stops.
    EnvironmentUnsupported,
}

impl InjectionOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Address of an allocation inside a target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteAddress(usize);

impl RemoteAddress {
    pub fn new(address: usize) -> Self {
        Self(address)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// Cross-process operations the injection protocol needs from a target.
///
/// Errors are raw OS errors; the injector decides which of them are
/// recoverable.
pub trait RemoteProcess {
    /// Handle to a thread created inside the target.
    type Thread;

    /// Process identifier, used for logging and error reports.
    fn pid(&self) -> u32;

    /// Whether the target shares the injector's pointer width.
    fn matches_architecture(&self) -> std::io::Result<bool> {
        Ok(true)
    }

    /// Commit `size` bytes of read-write memory in the target.
    fn allocate(&self, size: usize) -> std::io::Result<RemoteAddress>;

    /// Copy `data` to `address`, returning the number of bytes written.
    fn write(&self, address: RemoteAddress, data: &[u8]) -> std::io::Result<usize>;

    /// Start a thread in the target at the module loader with `parameter`.
    fn spawn_thread(
        &self,
        start: ModuleLoader,
        parameter: RemoteAddress,
    ) -> std::io::Result<Self::Thread>;

    /// Block until `thread` exits and return its exit code.
    fn join_thread(&self, thread: Self::Thread) -> std::io::Result<u32>;

    /// Release an allocation made by [`RemoteProcess::allocate`].
    fn free(&self, address: RemoteAddress) -> std::io::Result<()>;
}

/// Injects one library into one target.
pub trait LibraryInjector<T: ?Sized> {
    /// Inject `library` into `target`.
    ///
    /// # Errors
    /// Returns `InjectionError` only for failures that must abort the whole
    /// injection phase. Per-pair failures are reported through the outcome.
    fn inject_one(&self, library: &Path, target: &T) -> InjectionResult<InjectionOutcome>;

    /// Get the name of this injection method.
    fn name(&self) -> &'static str;
}
