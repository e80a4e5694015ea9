//! CreateRemoteThread injection method.
//!
//! The target loads the library with its own loader:
//! 1. Allocate memory in the target for the library path
//! 2. Write the UTF-16 path into that memory
//! 3. Create a remote thread starting at LoadLibraryW with the path as parameter
//! 4. Wait for the thread to exit
//! 5. Free the path memory

use crate::injection::{
    InjectionOutcome, InjectionResult, LibraryInjector, ModuleLoader, RemoteProcess,
};
use crate::memory::wide::path_to_wide;
use crate::memory::{write_wide_string, RemoteBuffer};
use crate::InjectionError;
use std::path::Path;

/// `ERROR_CALL_NOT_IMPLEMENTED`, raised by systems without VirtualAllocEx.
const ERROR_CALL_NOT_IMPLEMENTED: i32 = 0x78;

/// How a failed path write is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteFailurePolicy {
    /// Free the buffer and report the pair as failed.
    #[default]
    Lenient,
    /// Abort the injection phase.
    Strict,
}

/// CreateRemoteThread injection method.
#[derive(Debug, Clone)]
pub struct RemoteThreadInjector {
    loader: ModuleLoader,
    write_policy: WriteFailurePolicy,
}

impl RemoteThreadInjector {
    /// Create an injector that starts remote threads at `loader`.
    pub fn new(loader: ModuleLoader) -> Self {
        Self {
            loader,
            write_policy: WriteFailurePolicy::default(),
        }
    }

    pub fn with_write_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    pub fn write_policy(&self) -> WriteFailurePolicy {
        self.write_policy
    }

    /// Run the loader thread against an already written buffer.
    fn run_loader<P: RemoteProcess + ?Sized>(
        &self,
        library: &Path,
        target: &P,
        buffer: &RemoteBuffer<'_, P>,
    ) -> InjectionOutcome {
        let thread = match target.spawn_thread(self.loader, buffer.address()) {
            Ok(thread) => thread,
            Err(e) => {
                log::warn!(
                    "CreateRemoteThread failed in process {}: {}",
                    target.pid(),
                    e
                );
                return InjectionOutcome::Failed;
            }
        };

        log::debug!("Remote thread created in process {}", target.pid());

        match target.join_thread(thread) {
            Ok(0) => {
                log::warn!(
                    "LoadLibraryW returned NULL in process {} for {}",
                    target.pid(),
                    library.display()
                );
                InjectionOutcome::Success
            }
            Ok(exit_code) => {
                log::debug!("Remote thread exited with 0x{:X}", exit_code);
                InjectionOutcome::Success
            }
            Err(e) => {
                log::warn!(
                    "Waiting on remote thread failed in process {}: {}",
                    target.pid(),
                    e
                );
                InjectionOutcome::Failed
            }
        }
    }
}

impl<P: RemoteProcess + ?Sized> LibraryInjector<P> for RemoteThreadInjector {
    fn inject_one(&self, library: &Path, target: &P) -> InjectionResult<InjectionOutcome> {
        let pid = target.pid();
        log::debug!("Injecting {} into process {}", library.display(), pid);

        match target.matches_architecture() {
            Ok(true) => {}
            Ok(false) => {
                log::warn!(
                    "Process {} does not match the loader's architecture",
                    pid
                );
                return Ok(InjectionOutcome::Failed);
            }
            Err(e) => {
                log::warn!("Could not query architecture of process {}: {}", pid, e);
                return Ok(InjectionOutcome::Failed);
            }
        }

        let wide = path_to_wide(library);
        let required_size = wide.len() * std::mem::size_of::<u16>();

        let buffer = match RemoteBuffer::allocate(target, required_size) {
            Ok(buffer) => buffer,
            Err(e) if e.raw_os_error() == Some(ERROR_CALL_NOT_IMPLEMENTED) => {
                log::error!("VirtualAllocEx is not implemented on this system");
                return Ok(InjectionOutcome::EnvironmentUnsupported);
            }
            Err(source) => {
                return Err(InjectionError::MemoryAllocationFailed { pid, source });
            }
        };

        if let Err(source) = write_wide_string(target, buffer.address(), &wide) {
            match self.write_policy {
                // The buffer is freed when it goes out of scope.
                WriteFailurePolicy::Strict => {
                    return Err(InjectionError::MemoryWriteFailed { pid, source });
                }
                WriteFailurePolicy::Lenient => {
                    log::warn!("WriteProcessMemory failed in process {}: {}", pid, source);
                    buffer
                        .release()
                        .map_err(|source| InjectionError::MemoryFreeFailed { pid, source })?;
                    return Ok(InjectionOutcome::Failed);
                }
            }
        }

        let outcome = self.run_loader(library, target, &buffer);

        buffer
            .release()
            .map_err(|source| InjectionError::MemoryFreeFailed { pid, source })?;

        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "CreateRemoteThread"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injection::testing::FakeProcess;

    const LOADER: usize = 0x7FFA_0000;

    fn injector() -> RemoteThreadInjector {
        RemoteThreadInjector::new(ModuleLoader::from_address(LOADER))
    }

    #[test]
    fn test_injector_name() {
        let name = <RemoteThreadInjector as LibraryInjector<FakeProcess>>::name(&injector());
        assert_eq!(name, "CreateRemoteThread");
    }

    #[test]
    fn test_default_policy_is_lenient() {
        assert_eq!(injector().write_policy(), WriteFailurePolicy::Lenient);
    }

    #[test]
    fn test_success_starts_loader_with_path_buffer() {
        let process = FakeProcess::new(10);

        let outcome = injector().inject_one(Path::new("mods/a.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::Success);
        let threads = process.threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].0, ModuleLoader::from_address(LOADER));
        assert_eq!(process.written(threads[0].1), Some("mods/a.dll".to_string()));
    }

    #[test]
    fn test_success_frees_buffer() {
        let process = FakeProcess::new(10);
        injector().inject_one(Path::new("a.dll"), &process).unwrap();

        assert_eq!(process.allocations(), 1);
        assert_eq!(process.frees(), 1);
        assert_eq!(process.live_allocations(), 0);
    }

    #[test]
    fn test_null_module_is_still_success() {
        let process = FakeProcess::new(10).loader_returns(0);
        let outcome = injector().inject_one(Path::new("a.dll"), &process).unwrap();
        assert_eq!(outcome, InjectionOutcome::Success);
    }

    #[test]
    fn test_not_implemented_is_environment_unsupported() {
        let process = FakeProcess::new(10).fail_allocation(ERROR_CALL_NOT_IMPLEMENTED);

        let outcome = injector().inject_one(Path::new("a.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::EnvironmentUnsupported);
        assert_eq!(process.free_attempts(), 0);
        assert!(process.threads().is_empty());
    }

    #[test]
    fn test_other_allocation_failure_is_fatal() {
        let process = FakeProcess::new(10).fail_allocation(5);

        let result = injector().inject_one(Path::new("a.dll"), &process);

        match result {
            Err(InjectionError::MemoryAllocationFailed { pid: 10, source }) => {
                assert_eq!(source.raw_os_error(), Some(5));
            }
            other => panic!("Expected MemoryAllocationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_write_failure_fails_pair_and_frees() {
        let process = FakeProcess::new(10).fail_write(299);

        let outcome = injector().inject_one(Path::new("bad.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::Failed);
        assert_eq!(process.allocations(), process.frees());
        assert!(process.threads().is_empty());
    }

    #[test]
    fn test_short_write_fails_pair() {
        let process = FakeProcess::new(10).short_write();
        let outcome = injector().inject_one(Path::new("a.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::Failed);
        assert_eq!(process.live_allocations(), 0);
    }

    #[test]
    fn test_strict_write_failure_is_fatal_and_frees() {
        let process = FakeProcess::new(10).fail_write(299);
        let strict = injector().with_write_policy(WriteFailurePolicy::Strict);

        let result = strict.inject_one(Path::new("bad.dll"), &process);

        assert!(matches!(result, Err(InjectionError::MemoryWriteFailed { pid: 10, .. })));
        assert_eq!(process.allocations(), process.frees());
    }

    #[test]
    fn test_thread_failure_fails_pair_and_frees() {
        let process = FakeProcess::new(10).fail_thread(8);

        let outcome = injector().inject_one(Path::new("a.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::Failed);
        assert_eq!(process.allocations(), process.frees());
    }

    #[test]
    fn test_wait_failure_fails_pair_and_frees() {
        let process = FakeProcess::new(10).fail_join(6);

        let outcome = injector().inject_one(Path::new("a.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::Failed);
        assert_eq!(process.allocations(), process.frees());
    }

    #[test]
    fn test_free_failure_is_fatal() {
        let process = FakeProcess::new(10).fail_free();

        let result = injector().inject_one(Path::new("a.dll"), &process);

        assert!(matches!(result, Err(InjectionError::MemoryFreeFailed { pid: 10, .. })));
        assert_eq!(process.free_attempts(), 1);
    }

    #[test]
    fn test_architecture_mismatch_touches_nothing() {
        let process = FakeProcess::new(10).foreign_architecture();

        let outcome = injector().inject_one(Path::new("a.dll"), &process).unwrap();

        assert_eq!(outcome, InjectionOutcome::Failed);
        assert_eq!(process.allocations(), 0);
    }

    #[test]
    fn test_one_thread_per_injection() {
        // No extra remote threads are started beyond the loader thread.
        let process = FakeProcess::new(10);
        for _ in 0..3 {
            injector().inject_one(Path::new("a.dll"), &process).unwrap();
        }
        assert_eq!(process.threads().len(), 3);
    }
}
