//! Knowledge extension library.
//!
//! An optional DLL that knows about a specific game. Every export is
//! optional:
//! - `Knowledge_Init(const wchar_t* game_path)`
//! - `Knowledge_Deinit(const PROCESS_INFORMATION*, size_t)`
//! - `Knowledge_PrintGameInfo(void)`
//! - `Knowledge_InjectLibrariesToProcesses(const wchar_t**, size_t,
//!   const PROCESS_INFORMATION*, size_t) -> int`
//!
//! A non-zero return from the injection export means the extension injected
//! the libraries itself.

use crate::error::KnowledgeError;
use crate::injection::{InjectionOverride, OverrideOutcome};
use crate::memory::wide::path_to_wide;
use crate::process::LaunchedProcess;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use windows::core::{s, PCSTR, PCWSTR};
use windows::Win32::Foundation::{ERROR_MOD_NOT_FOUND, FARPROC, HMODULE};
use windows::Win32::System::LibraryLoader::{FreeLibrary, GetProcAddress, LoadLibraryW};
use windows::Win32::System::Threading::PROCESS_INFORMATION;

type InitFn = unsafe extern "C" fn(game_path: *const u16);
type DeinitFn = unsafe extern "C" fn(processes: *const PROCESS_INFORMATION, count: usize);
type PrintGameInfoFn = unsafe extern "C" fn();
type InjectFn = unsafe extern "C" fn(
    libraries: *const *const u16,
    library_count: usize,
    processes: *const PROCESS_INFORMATION,
    process_count: usize,
) -> i32;

/// A loaded knowledge library and the exports it provides.
pub struct KnowledgeLibrary {
    module: HMODULE,
    init: Option<InitFn>,
    deinit: Option<DeinitFn>,
    print_game_info: Option<PrintGameInfoFn>,
    inject: Option<InjectFn>,
}

impl KnowledgeLibrary {
    /// Load the library at `path` and resolve its exports.
    ///
    /// # Returns
    /// * `Ok(None)` - The library could not be found
    /// * `Err(KnowledgeError::LoadFailed)` - Any other load failure
    pub fn load(path: &Path) -> Result<Option<Self>, KnowledgeError> {
        log::info!("Loading knowledge library from {}", path.display());

        let wide_path = path_to_wide(path);
        let module = match unsafe { LoadLibraryW(PCWSTR(wide_path.as_ptr())) } {
            Ok(module) => module,
            Err(e) if e.code() == ERROR_MOD_NOT_FOUND.to_hresult() => {
                log::warn!("Knowledge library {} not found", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(KnowledgeError::LoadFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::other(e),
                });
            }
        };

        // SAFETY: each export is transmuted to the signature documented for it.
        let library = unsafe {
            Self {
                module,
                init: export(module, s!("Knowledge_Init"))
                    .map(|f| std::mem::transmute::<_, InitFn>(f)),
                deinit: export(module, s!("Knowledge_Deinit"))
                    .map(|f| std::mem::transmute::<_, DeinitFn>(f)),
                print_game_info: export(module, s!("Knowledge_PrintGameInfo"))
                    .map(|f| std::mem::transmute::<_, PrintGameInfoFn>(f)),
                inject: export(module, s!("Knowledge_InjectLibrariesToProcesses"))
                    .map(|f| std::mem::transmute::<_, InjectFn>(f)),
            }
        };

        Ok(Some(library))
    }

    /// Call `Knowledge_Init` with the game path, if exported.
    pub fn init(&self, game_path: &Path) {
        if let Some(init) = self.init {
            let wide_path = path_to_wide(game_path);
            unsafe { init(wide_path.as_ptr()) };
        }
    }

    /// Call `Knowledge_PrintGameInfo`, if exported.
    pub fn print_game_info(&self) {
        if let Some(print_game_info) = self.print_game_info {
            unsafe { print_game_info() };
        }
    }

    /// The injection override, present only if the export exists.
    pub fn injection_override(&self) -> Option<KnowledgeOverride<'_>> {
        self.inject.map(|inject| KnowledgeOverride {
            inject,
            _library: PhantomData,
        })
    }

    /// Call `Knowledge_Deinit` with the game instances, if exported.
    pub fn deinit(&self, processes: &[LaunchedProcess]) {
        if let Some(deinit) = self.deinit {
            let infos: Vec<PROCESS_INFORMATION> =
                processes.iter().map(LaunchedProcess::raw_info).collect();
            unsafe { deinit(infos.as_ptr(), infos.len()) };
        }
    }

    /// Drop every export and free the module.
    pub fn unload(mut self) -> Result<(), KnowledgeError> {
        let result = self.release();
        std::mem::forget(self);
        result
    }

    fn release(&mut self) -> Result<(), KnowledgeError> {
        self.init = None;
        self.deinit = None;
        self.print_game_info = None;
        self.inject = None;

        unsafe {
            FreeLibrary(self.module)
                .map_err(|_| KnowledgeError::FreeFailed(std::io::Error::last_os_error()))?;
        }

        log::debug!("Knowledge library unloaded");
        Ok(())
    }
}

impl Drop for KnowledgeLibrary {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("{}", e);
        }
    }
}

/// Resolve an export, reporting a missing one.
unsafe fn export(module: HMODULE, name: PCSTR) -> FARPROC {
    let address = GetProcAddress(module, name);
    if address.is_none() {
        log::warn!("Unable to load {}", name.display());
    }
    address
}

/// The `Knowledge_InjectLibrariesToProcesses` export.
///
/// Borrows the library so the export cannot outlive the module.
pub struct KnowledgeOverride<'a> {
    inject: InjectFn,
    _library: PhantomData<&'a KnowledgeLibrary>,
}

impl InjectionOverride<LaunchedProcess> for KnowledgeOverride<'_> {
    fn inject_libraries(
        &self,
        libraries: &[PathBuf],
        targets: &[LaunchedProcess],
    ) -> OverrideOutcome {
        let wide_paths: Vec<Vec<u16>> = libraries.iter().map(|p| path_to_wide(p)).collect();
        let path_ptrs: Vec<*const u16> = wide_paths.iter().map(|p| p.as_ptr()).collect();
        let infos: Vec<PROCESS_INFORMATION> =
            targets.iter().map(LaunchedProcess::raw_info).collect();

        let handled = unsafe {
            (self.inject)(
                path_ptrs.as_ptr(),
                path_ptrs.len(),
                infos.as_ptr(),
                infos.len(),
            )
        };

        if handled != 0 {
            OverrideOutcome::Handled
        } else {
            OverrideOutcome::NotHandled
        }
    }
}
