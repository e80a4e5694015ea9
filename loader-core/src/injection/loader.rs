//! Module loader entry point used as the remote thread start address.

/// Address of the target's `LoadLibraryW`.
///
/// `kernel32.dll` is mapped at the same base in every process of a session,
/// so the address resolved in the loader is valid in the targets it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleLoader(usize);

impl ModuleLoader {
    pub fn from_address(address: usize) -> Self {
        Self(address)
    }

    pub fn address(self) -> usize {
        self.0
    }

    /// Resolve `LoadLibraryW` from the mapped `kernel32.dll`.
    ///
    /// # Errors
    /// Returns `InjectionError::LoadLibraryNotFound` if either the module or
    /// the export cannot be found.
    #[cfg(windows)]
    pub fn resolve() -> Result<Self, crate::InjectionError> {
        use windows::core::{s, w};
        use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};

        unsafe {
            let kernel32 = GetModuleHandleW(w!("kernel32.dll"))
                .map_err(|_| crate::InjectionError::LoadLibraryNotFound)?;

            let load_library = GetProcAddress(kernel32, s!("LoadLibraryW"))
                .ok_or(crate::InjectionError::LoadLibraryNotFound)?;

            let loader = Self(load_library as usize);
            log::debug!("LoadLibraryW address: 0x{:X}", loader.0);
            Ok(loader)
        }
    }
}
