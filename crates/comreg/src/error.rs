//! Registration error types and HRESULT status codes.

use crate::guid::Guid;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for registration operations
pub type Result<T> = std::result::Result<T, RegError>;

/// Errors raised by the registry store and type-library catalog
#[derive(Error, Debug)]
pub enum RegError {
    /// Registry store access failed
    #[error("registry access failed for '{path}' [{status:#010X}]")]
    Store { status: u32, path: String },

    /// A type library file could not be loaded
    #[error("failed to load the type library '{path}' [{status:#010X}]")]
    TypeLibLoad { status: u32, path: PathBuf },

    /// A type library could not be added to the catalog
    #[error("failed to register the type library '{path}' [{status:#010X}]")]
    TypeLibRegister { status: u32, path: PathBuf },

    /// A type library could not be removed from the catalog
    #[error("failed to unregister the type library {libid} [{status:#010X}]")]
    TypeLibUnregister { status: u32, libid: Guid },

    /// A GUID string did not parse
    #[error("invalid GUID string: {0}")]
    InvalidGuid(String),
}

impl RegError {
    /// The HRESULT carried by this error
    pub fn hresult(&self) -> u32 {
        match self {
            Self::Store { status, .. }
            | Self::TypeLibLoad { status, .. }
            | Self::TypeLibRegister { status, .. }
            | Self::TypeLibUnregister { status, .. } => *status,
            Self::InvalidGuid(_) => hresult::E_INVALIDARG,
        }
    }
}

/// HRESULT codes used by COM servers
pub mod hresult {
    /// Operation successful
    pub const S_OK: u32 = 0x00000000;
    /// Operation successful, returning false
    pub const S_FALSE: u32 = 0x00000001;
    /// Not implemented
    pub const E_NOTIMPL: u32 = 0x80004001;
    /// No such interface supported
    pub const E_NOINTERFACE: u32 = 0x80004002;
    /// Invalid pointer
    pub const E_POINTER: u32 = 0x80004003;
    /// Unspecified error
    pub const E_FAIL: u32 = 0x80004005;
    /// Unexpected failure
    pub const E_UNEXPECTED: u32 = 0x8000FFFF;
    /// Out of memory
    pub const E_OUTOFMEMORY: u32 = 0x8007000E;
    /// Invalid argument
    pub const E_INVALIDARG: u32 = 0x80070057;
    /// Aggregation is not supported
    pub const CLASS_E_NOAGGREGATION: u32 = 0x80040110;
    /// Requested class is not available
    pub const CLASS_E_CLASSNOTAVAILABLE: u32 = 0x80040111;
    /// Class not registered
    pub const REGDB_E_CLASSNOTREG: u32 = 0x80040154;
    /// Self-registration could not register the type library
    pub const SELFREG_E_TYPELIB: u32 = 0x80040200;
    /// Self-registration could not register a class
    pub const SELFREG_E_CLASS: u32 = 0x80040201;
    /// Dispatch member not found
    pub const DISP_E_MEMBERNOTFOUND: u32 = 0x80020003;
    /// Dispatch argument type mismatch
    pub const DISP_E_TYPEMISMATCH: u32 = 0x80020005;
    /// Unknown dispatch member name
    pub const DISP_E_UNKNOWNNAME: u32 = 0x80020006;
    /// Invalid type information index
    pub const DISP_E_BADINDEX: u32 = 0x8002000B;
    /// Type library registry access failed
    pub const TYPE_E_REGISTRYACCESS: u32 = 0x8002801C;
    /// Element not found in the type library
    pub const TYPE_E_ELEMENTNOTFOUND: u32 = 0x8002802B;
    /// Type library could not be loaded
    pub const TYPE_E_CANTLOADLIBRARY: u32 = 0x80029C4A;

    /// Whether a status code reports success
    pub fn succeeded(hr: u32) -> bool {
        hr & 0x8000_0000 == 0
    }

    /// Map a Win32 error code into the HRESULT space
    pub fn from_win32(error: u32) -> u32 {
        if error == 0 {
            S_OK
        } else {
            0x8007_0000 | (error & 0xFFFF)
        }
    }
}
