//! Type-library catalog.
//!
//! The OS type-library manager is an external collaborator: registering a
//! library means loading the file and recording it in the per-scope catalog
//! so late-bound clients can find it. The trait is the seam; the in-memory
//! implementation backs tests, the Windows implementation drives the real
//! catalog.

use crate::error::{hresult, RegError, Result};
use crate::guid::Guid;
use crate::store::RegScope;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Identity of a type library: LIBID plus major/minor version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeLibId {
    pub libid: Guid,
    pub major: u16,
    pub minor: u16,
}

impl TypeLibId {
    /// Create a type library identity
    pub fn new(libid: Guid, major: u16, minor: u16) -> Self {
        Self {
            libid,
            major,
            minor,
        }
    }
}

/// The OS type-library manager seam.
pub trait TypeLibCatalog: Send + Sync {
    /// Load the type library file and add it to the catalog under `scope`
    fn register(&self, scope: RegScope, file: &Path) -> Result<()>;

    /// Remove a registered type library from the catalog
    fn unregister(&self, scope: RegScope, libid: &Guid, major: u16, minor: u16) -> Result<()>;
}

/// In-memory type-library catalog
#[derive(Default)]
pub struct MemoryTypeLibCatalog {
    /// Library files the catalog can "load", keyed by path
    libraries: RwLock<HashMap<PathBuf, TypeLibId>>,
    /// Registered libraries per scope
    registered: RwLock<HashMap<(RegScope, Guid), (TypeLibId, PathBuf)>>,
}

impl MemoryTypeLibCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a library file the catalog can load
    pub fn add_library(&self, file: impl Into<PathBuf>, id: TypeLibId) {
        let mut libraries = self.libraries.write().unwrap();
        libraries.insert(file.into(), id);
    }

    /// Whether a library is currently registered under the scope
    pub fn is_registered(&self, scope: RegScope, libid: &Guid) -> bool {
        let registered = self.registered.read().unwrap();
        registered.contains_key(&(scope, *libid))
    }
}

impl TypeLibCatalog for MemoryTypeLibCatalog {
    fn register(&self, scope: RegScope, file: &Path) -> Result<()> {
        let id = {
            let libraries = self.libraries.read().unwrap();
            libraries.get(file).copied()
        };
        let id = id.ok_or_else(|| RegError::TypeLibLoad {
            status: hresult::TYPE_E_CANTLOADLIBRARY,
            path: file.to_path_buf(),
        })?;

        let mut registered = self.registered.write().unwrap();
        registered.insert((scope, id.libid), (id, file.to_path_buf()));
        Ok(())
    }

    fn unregister(&self, scope: RegScope, libid: &Guid, major: u16, minor: u16) -> Result<()> {
        let mut registered = self.registered.write().unwrap();
        let matches = registered
            .get(&(scope, *libid))
            .map_or(false, |(id, _)| id.major == major && id.minor == minor);
        if matches {
            registered.remove(&(scope, *libid));
            Ok(())
        } else {
            Err(RegError::TypeLibUnregister {
                status: hresult::TYPE_E_REGISTRYACCESS,
                libid: *libid,
            })
        }
    }
}
