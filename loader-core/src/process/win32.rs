//! Win32 process creation and cross-process memory access.

use crate::error::InjectionError;
use crate::injection::{ModuleLoader, RemoteAddress, RemoteProcess};
use crate::memory::wide::path_to_wide;
use crate::process::{ProcessHandle, ProcessSpawner, Resumable, ThreadHandle};
use std::ffi::c_void;
use std::path::Path;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, BOOL, HANDLE, WAIT_FAILED};
use windows::Win32::System::Diagnostics::Debug::WriteProcessMemory;
use windows::Win32::System::Memory::{
    VirtualAllocEx, VirtualFreeEx, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};
use windows::Win32::System::Threading::*;

/// A game instance: process and primary thread handles.
///
/// Both handles are closed when the value is dropped.
pub struct LaunchedProcess {
    info: PROCESS_INFORMATION,
}

unsafe impl Send for LaunchedProcess {}

impl LaunchedProcess {
    pub fn pid(&self) -> u32 {
        self.info.dwProcessId
    }

    /// Copy of the raw handles, for passing to extension code.
    ///
    /// The handles stay owned by `self`.
    pub fn raw_info(&self) -> PROCESS_INFORMATION {
        self.info
    }

    fn terminate(&self) {
        unsafe {
            if let Err(e) = TerminateProcess(self.info.hProcess, 1) {
                log::warn!("Failed to terminate process {}: {}", self.pid(), e);
            }
        }
    }
}

impl Resumable for LaunchedProcess {
    fn resume(&self) -> Result<u32, InjectionError> {
        let previous = unsafe { ResumeThread(self.info.hThread) };

        if previous == u32::MAX {
            return Err(InjectionError::ResumeFailed {
                pid: self.pid(),
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!(
            "Process {} resumed (previous suspend count: {})",
            self.pid(),
            previous
        );
        Ok(previous)
    }
}

impl Drop for LaunchedProcess {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.info.hThread);
            let _ = CloseHandle(self.info.hProcess);
        }
    }
}

fn is_wow64(process: HANDLE) -> std::io::Result<bool> {
    let mut is_wow64 = BOOL::from(false);

    unsafe {
        IsWow64Process(process, &mut is_wow64).map_err(|_| std::io::Error::last_os_error())?;
    }

    Ok(is_wow64.as_bool())
}

impl RemoteProcess for LaunchedProcess {
    type Thread = ThreadHandle;

    fn pid(&self) -> u32 {
        self.info.dwProcessId
    }

    fn matches_architecture(&self) -> std::io::Result<bool> {
        // Same WoW64 state means same pointer width on any host.
        let target = is_wow64(self.info.hProcess)?;
        let injector = is_wow64(unsafe { GetCurrentProcess() })?;
        Ok(target == injector)
    }

    fn allocate(&self, size: usize) -> std::io::Result<RemoteAddress> {
        let address = unsafe {
            VirtualAllocEx(
                self.info.hProcess,
                None,
                size,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };

        if address.is_null() {
            return Err(std::io::Error::last_os_error());
        }

        Ok(RemoteAddress::new(address as usize))
    }

    fn write(&self, address: RemoteAddress, data: &[u8]) -> std::io::Result<usize> {
        let mut bytes_written = 0;

        unsafe {
            WriteProcessMemory(
                self.info.hProcess,
                address.as_usize() as *const c_void,
                data.as_ptr() as *const c_void,
                data.len(),
                Some(&mut bytes_written),
            )
            .map_err(|_| std::io::Error::last_os_error())?;
        }

        Ok(bytes_written)
    }

    fn spawn_thread(
        &self,
        start: ModuleLoader,
        parameter: RemoteAddress,
    ) -> std::io::Result<ThreadHandle> {
        let handle = unsafe {
            let start_routine = std::mem::transmute::<
                usize,
                unsafe extern "system" fn(*mut c_void) -> u32,
            >(start.address());

            CreateRemoteThread(
                self.info.hProcess,
                None,
                0,
                Some(start_routine),
                Some(parameter.as_usize() as *const c_void),
                0,
                None,
            )
            .map_err(|_| std::io::Error::last_os_error())?
        };

        Ok(ThreadHandle::from_raw(handle))
    }

    fn join_thread(&self, thread: ThreadHandle) -> std::io::Result<u32> {
        unsafe {
            if WaitForSingleObject(thread.as_handle(), INFINITE) == WAIT_FAILED {
                return Err(std::io::Error::last_os_error());
            }

            let mut exit_code = 0;
            GetExitCodeThread(thread.as_handle(), &mut exit_code)
                .map_err(|_| std::io::Error::last_os_error())?;

            Ok(exit_code)
        }
    }

    fn free(&self, address: RemoteAddress) -> std::io::Result<()> {
        unsafe {
            VirtualFreeEx(
                self.info.hProcess,
                address.as_usize() as *mut c_void,
                0,
                MEM_RELEASE,
            )
            .map_err(|_| std::io::Error::last_os_error())
        }
    }
}

/// Creates processes with `CreateProcessW`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Spawner;

impl ProcessSpawner for Win32Spawner {
    type Process = LaunchedProcess;

    fn spawn(
        &self,
        executable: &Path,
        command_line: &mut [u16],
        suspended: bool,
    ) -> std::io::Result<LaunchedProcess> {
        let application = path_to_wide(executable);

        let startup_info = STARTUPINFOW {
            cb: std::mem::size_of::<STARTUPINFOW>() as u32,
            ..Default::default()
        };
        let mut info = PROCESS_INFORMATION::default();

        let flags = if suspended {
            CREATE_SUSPENDED
        } else {
            PROCESS_CREATION_FLAGS(0)
        };

        unsafe {
            CreateProcessW(
                PCWSTR(application.as_ptr()),
                PWSTR(command_line.as_mut_ptr()),
                None,
                None,
                true,
                flags,
                None,
                PCWSTR::null(),
                &startup_info,
                &mut info,
            )
            .map_err(|_| std::io::Error::last_os_error())?;
        }

        log::info!(
            "Process created: PID {} TID {}",
            info.dwProcessId,
            info.dwThreadId
        );

        Ok(LaunchedProcess { info })
    }

    fn is_queryable(&self, process: &LaunchedProcess) -> bool {
        ProcessHandle::open(process.pid(), PROCESS_QUERY_INFORMATION).is_ok()
    }

    fn discard(&self, process: LaunchedProcess) {
        process.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{LaunchRequest, Launcher, DEFAULT_MAX_INSTANCES};
    use std::path::PathBuf;

    fn request(executable: PathBuf) -> LaunchRequest {
        LaunchRequest::new(executable, None, 1, DEFAULT_MAX_INSTANCES).unwrap()
    }

    fn windows_dir() -> PathBuf {
        PathBuf::from(std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into()))
    }

    #[test]
    fn test_missing_executable_is_not_found() {
        let request = request(windows_dir().join("nonexistent_game.exe"));

        let result = Launcher::new(Win32Spawner).launch(&request, true);

        assert!(matches!(
            result,
            Err(crate::LaunchError::ExecutableNotFound(_))
        ));
    }

    #[test]
    fn test_missing_directory_is_a_creation_failure() {
        let request = request(PathBuf::from("C:\\nonexistent\\path\\game.exe"));

        let result = Launcher::new(Win32Spawner).launch(&request, true);

        assert!(matches!(
            result,
            Err(crate::LaunchError::CreateProcessFailed { .. })
        ));
    }
}
