//! COM server error types.

use crate::typelib::DispId;
use comreg::{Guid, RegError};
use std::path::PathBuf;
use thiserror::Error;

pub use comreg::hresult;

/// Result type for COM server operations
pub type Result<T> = std::result::Result<T, ComError>;

/// COM server failures.
///
/// Every variant maps to the HRESULT a client observes across the module
/// boundary; the message becomes the thread error record's description.
#[derive(Error, Debug)]
pub enum ComError {
    /// Underlying registration error
    #[error("registration error: {0}")]
    Registry(#[from] RegError),

    /// Interface not supported by the object
    #[error("no such interface: {0}")]
    NoInterface(Guid),

    /// No class object available for the CLSID
    #[error("class not available: {0}")]
    ClassNotAvailable(Guid),

    /// The server could not manufacture an instance
    #[error("failed to create an instance of {0}")]
    ObjectCreation(Guid),

    /// Aggregation was requested but is not supported
    #[error("aggregation is not supported")]
    AggregationNotSupported,

    /// Type information index out of range
    #[error("invalid type information index: {0}")]
    BadTypeInfoIndex(u32),

    /// The module's type library could not be loaded
    #[error("failed to load the type library '{path}' [{status:#010X}]")]
    TypeLibLoad { status: u32, path: PathBuf },

    /// The type library holds no information for the interface
    #[error("failed to get the type information for {iid} [{name}]")]
    TypeInfoNotFound { status: u32, iid: Guid, name: String },

    /// A member name could not be resolved
    #[error("unknown member name: {0}")]
    UnknownName(String),

    /// A dispatch identifier does not name an invokable member
    #[error("member not found: dispatch id {0}")]
    MemberNotFound(DispId),

    /// A dispatch argument had the wrong type
    #[error("dispatch argument {index} has the wrong type")]
    TypeMismatch { index: usize },

    /// A platform call failed
    #[error("{message} [{status:#010X}]")]
    Platform { status: u32, message: String },
}

impl ComError {
    /// The HRESULT reported across the module boundary
    pub fn hresult(&self) -> u32 {
        match self {
            Self::Registry(err) => err.hresult(),
            Self::NoInterface(_) => hresult::E_NOINTERFACE,
            Self::ClassNotAvailable(_) => hresult::CLASS_E_CLASSNOTAVAILABLE,
            Self::ObjectCreation(_) => hresult::E_FAIL,
            Self::AggregationNotSupported => hresult::CLASS_E_NOAGGREGATION,
            Self::BadTypeInfoIndex(_) => hresult::DISP_E_BADINDEX,
            Self::TypeLibLoad { status, .. } => *status,
            Self::TypeInfoNotFound { status, .. } => *status,
            Self::UnknownName(_) => hresult::DISP_E_UNKNOWNNAME,
            Self::MemberNotFound(_) => hresult::DISP_E_MEMBERNOTFOUND,
            Self::TypeMismatch { .. } => hresult::DISP_E_TYPEMISMATCH,
            Self::Platform { status, .. } => *status,
        }
    }
}
