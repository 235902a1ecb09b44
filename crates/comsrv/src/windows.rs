//! Windows glue for the hosting DLL module.
//!
//! The module handle is captured once in `DllMain` and used afterwards to
//! resolve the module's own on-disk path for self-registration and
//! type-library loading.

use crate::error::{hresult, ComError, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::GetModuleFileNameW;

static DLL_MODULE: OnceLock<isize> = OnceLock::new();

/// Record the module handle from `DllMain` / `DLL_PROCESS_ATTACH`.
pub fn set_module_handle(module: HMODULE) {
    let _ = DLL_MODULE.set(module.0 as isize);
}

/// Resolve the hosting module's own on-disk path.
pub fn module_path() -> Result<PathBuf> {
    let handle = HMODULE(*DLL_MODULE.get().unwrap_or(&0) as *mut _);
    let mut buffer = [0u16; 1024];
    let len = unsafe { GetModuleFileNameW(handle, &mut buffer) } as usize;
    if len == 0 || len >= buffer.len() {
        return Err(ComError::Platform {
            status: hresult::E_FAIL,
            message: "failed to resolve the module path".to_string(),
        });
    }
    Ok(PathBuf::from(String::from_utf16_lossy(&buffer[..len])))
}
