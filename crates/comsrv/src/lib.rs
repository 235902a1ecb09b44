//! Base classes and entry points for in-process COM servers.
//!
//! An in-process COM server is a DLL exporting four (optionally five) fixed
//! functions the COM runtime resolves by name. Everything behind those
//! exports is mechanical: reference-counted objects answering interface
//! queries, a class factory manufacturing them, a lock count deciding when
//! the module may unload, registry self-registration, and late-bound
//! dispatch through the module's own type library. This crate supplies that
//! machinery; the embedding DLL supplies its coclasses and a registration
//! table.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 COM runtime (external)                      │
//! │   DllGetClassObject / DllCanUnloadNow / DllRegisterServer   │
//! │   DllUnregisterServer / DllInstall                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  comsrv (this crate)                        │
//! │  Entry-point shim   │  ClassFactory    │  DispatchAdapter   │
//! │  - HRESULT boundary │  - CreateInstance│  - lazy type info  │
//! │  - error info       │  - LockServer    │  - name → DISPID   │
//! ├─────────────────────┴──────────────────┴────────────────────┤
//! │  ServerContext: lock count, class table, host collaborators │
//! ├─────────────────────────────────────────────────────────────┤
//! │             comreg: GUIDs, registry schema, catalog         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **ObjectRef / InterfaceRef**: counted ownership handles replacing raw
//!   `IUnknown` pointers; the count transitions drive the server lock
//! - **ServerContext**: the per-module server state, passed explicitly to
//!   every operation instead of hiding behind a process global
//! - **ComServer**: the trait a concrete server implements — its library
//!   identity, coclass table and object factory
//! - **HostModule**: the collaborators owned by the hosting module — its
//!   file path, registry store, type-library catalog and loader
//!
//! # Modules
//!
//! - [`object`]: reference-counted object base and interface queries
//! - [`server`]: the server context and embedding-server trait
//! - [`factory`]: the `IClassFactory` implementation
//! - [`typelib`]: type-library and type-information seams
//! - [`dispatch`]: the late-binding (`IDispatch`) adapter
//! - [`inproc`]: the DLL entry points and module-boundary translation
//! - [`error`]: the failure taxonomy and HRESULT mapping
//! - [`error_info`]: per-thread error records

pub mod dispatch;
pub mod error;
pub mod error_info;
pub mod factory;
pub mod inproc;
pub mod object;
pub mod server;
pub mod typelib;

#[cfg(windows)]
pub mod windows;

#[cfg(test)]
pub(crate) mod testing;

pub use comreg::{Guid, RegScope};
pub use dispatch::DispatchAdapter;
pub use error::{hresult, ComError, Result};
pub use error_info::ErrorInfo;
pub use factory::ClassFactory;
pub use object::{ComObject, InterfaceRef, ObjectRef};
pub use server::{ComServer, HostModule, ServerContext};
pub use typelib::{DispId, InvokeKind, TypeInfo, TypeLibLoader, TypeLibrary, Variant};

/// Well-known interface identifiers
pub mod iid {
    use comreg::Guid;

    /// IUnknown
    pub const IUNKNOWN: Guid = Guid::new(
        0x00000000,
        0x0000,
        0x0000,
        [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
    );
    /// IClassFactory
    pub const ICLASSFACTORY: Guid = Guid::new(
        0x00000001,
        0x0000,
        0x0000,
        [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
    );
    /// IDispatch
    pub const IDISPATCH: Guid = Guid::new(
        0x00020400,
        0x0000,
        0x0000,
        [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
    );
    /// ISupportErrorInfo
    pub const ISUPPORTERRORINFO: Guid = Guid::new(
        0xDF0B3D60,
        0x548F,
        0x101B,
        [0x8E, 0x65, 0x08, 0x00, 0x2B, 0x2B, 0xD1, 0x19],
    );
}
