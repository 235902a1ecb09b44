//! Windows backends for the classes store and the type-library catalog.

use crate::catalog::TypeLibCatalog;
use crate::error::{hresult, RegError, Result};
use crate::guid::Guid;
use crate::store::{ClassesStore, RegScope};
use std::path::Path;
use windows::core::{GUID, HSTRING, PCWSTR};
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS, WIN32_ERROR};
use windows::Win32::System::Ole::{
    LoadTypeLib, RegisterTypeLib, RegisterTypeLibForUser, UnRegisterTypeLib,
    UnRegisterTypeLibForUser,
};
use windows::Win32::System::Com::SYS_WIN32;
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteKeyW, RegGetValueW, RegSetValueExW, HKEY,
    HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_WRITE, REG_OPTION_NON_VOLATILE, REG_SZ,
    RRF_RT_REG_SZ,
};

fn scope_root(scope: RegScope) -> HKEY {
    match scope {
        RegScope::Machine => HKEY_LOCAL_MACHINE,
        RegScope::User => HKEY_CURRENT_USER,
    }
}

fn classes_path(key: &str) -> String {
    format!("Software\\Classes\\{key}")
}

fn store_err(status: WIN32_ERROR, key: &str) -> RegError {
    RegError::Store {
        status: hresult::from_win32(status.0),
        path: key.to_string(),
    }
}

fn os_guid(guid: &Guid) -> GUID {
    GUID {
        data1: guid.data1,
        data2: guid.data2,
        data3: guid.data3,
        data4: guid.data4,
    }
}

/// Classes store backed by the real registry.
#[derive(Default)]
pub struct WindowsClassesStore;

impl WindowsClassesStore {
    /// Create the store
    pub fn new() -> Self {
        Self
    }

    fn set_value(&self, scope: RegScope, key: &str, name: Option<&str>, value: &str) -> Result<()> {
        let path = HSTRING::from(classes_path(key));
        let mut hkey = HKEY::default();
        let status = unsafe {
            RegCreateKeyExW(
                scope_root(scope),
                &path,
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                None,
                &mut hkey,
                None,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(store_err(status, key));
        }

        // REG_SZ data is the UTF-16 string plus its terminator, as bytes.
        let wide: Vec<u16> = value.encode_utf16().chain(std::iter::once(0)).collect();
        let data =
            unsafe { std::slice::from_raw_parts(wide.as_ptr() as *const u8, wide.len() * 2) };
        let value_name = name.map(HSTRING::from);
        let value_name = value_name
            .as_ref()
            .map_or(PCWSTR::null(), |n| PCWSTR(n.as_ptr()));

        let status = unsafe { RegSetValueExW(hkey, value_name, 0, REG_SZ, Some(data)) };
        unsafe {
            let _ = RegCloseKey(hkey);
        }
        if status != ERROR_SUCCESS {
            return Err(store_err(status, key));
        }
        Ok(())
    }
}

impl ClassesStore for WindowsClassesStore {
    fn set_default_value(&self, scope: RegScope, key: &str, value: &str) -> Result<()> {
        self.set_value(scope, key, None, value)
    }

    fn set_string_value(&self, scope: RegScope, key: &str, name: &str, value: &str) -> Result<()> {
        self.set_value(scope, key, Some(name), value)
    }

    fn default_value(&self, scope: RegScope, key: &str) -> Result<Option<String>> {
        let path = HSTRING::from(classes_path(key));
        let mut size = 0u32;
        let status = unsafe {
            RegGetValueW(
                scope_root(scope),
                &path,
                PCWSTR::null(),
                RRF_RT_REG_SZ,
                None,
                None,
                Some(&mut size),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if status != ERROR_SUCCESS {
            return Err(store_err(status, key));
        }

        let mut data = vec![0u16; (size as usize).div_ceil(2)];
        let status = unsafe {
            RegGetValueW(
                scope_root(scope),
                &path,
                PCWSTR::null(),
                RRF_RT_REG_SZ,
                None,
                Some(data.as_mut_ptr() as *mut _),
                Some(&mut size),
            )
        };
        if status != ERROR_SUCCESS {
            return Err(store_err(status, key));
        }

        let len = data.iter().position(|&c| c == 0).unwrap_or(data.len());
        Ok(Some(String::from_utf16_lossy(&data[..len])))
    }

    fn delete_key(&self, scope: RegScope, key: &str) -> Result<bool> {
        let path = HSTRING::from(classes_path(key));
        let status = unsafe { RegDeleteKeyW(scope_root(scope), &path) };
        match status {
            ERROR_SUCCESS => Ok(true),
            ERROR_FILE_NOT_FOUND => Ok(false),
            status => Err(store_err(status, key)),
        }
    }
}

/// Type-library catalog backed by the OS type-library manager.
#[derive(Default)]
pub struct WindowsTypeLibCatalog;

impl WindowsTypeLibCatalog {
    /// Create the catalog
    pub fn new() -> Self {
        Self
    }
}

impl TypeLibCatalog for WindowsTypeLibCatalog {
    fn register(&self, scope: RegScope, file: &Path) -> Result<()> {
        let wide = HSTRING::from(file.as_os_str());
        let typelib = unsafe { LoadTypeLib(&wide) }.map_err(|err| RegError::TypeLibLoad {
            status: err.code().0 as u32,
            path: file.to_path_buf(),
        })?;

        let result = match scope {
            RegScope::Machine => unsafe {
                RegisterTypeLib(&typelib, &wide, PCWSTR::null())
            },
            RegScope::User => unsafe {
                RegisterTypeLibForUser(&typelib, &wide, PCWSTR::null())
            },
        };
        result.map_err(|err| RegError::TypeLibRegister {
            status: err.code().0 as u32,
            path: file.to_path_buf(),
        })
    }

    fn unregister(&self, scope: RegScope, libid: &Guid, major: u16, minor: u16) -> Result<()> {
        let guid = os_guid(libid);
        let result = match scope {
            RegScope::Machine => unsafe { UnRegisterTypeLib(&guid, major, minor, 0, SYS_WIN32) },
            RegScope::User => unsafe {
                UnRegisterTypeLibForUser(&guid, major, minor, 0, SYS_WIN32)
            },
        };
        result.map_err(|err| RegError::TypeLibUnregister {
            status: err.code().0 as u32,
            libid: *libid,
        })
    }
}
