//! The server context and the embedding-server trait.
//!
//! A concrete server supplies its library identity, a static coclass table
//! and an object factory; the context owns the module-wide lock count and
//! the host collaborators, and is passed explicitly to every operation that
//! used to reach for a process global.

use crate::error::{ComError, Result};
use crate::factory::ClassFactory;
use crate::object::{ComObject, ObjectRef};
use crate::typelib::{TypeLibLoader, TypeLibrary};
use comreg::{ClassRegInfo, ClassesStore, Guid, LibraryInfo, TypeLibCatalog};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// What an embedding server implements.
pub trait ComServer: Send + Sync + 'static {
    /// Identity of the hosting library
    fn library(&self) -> LibraryInfo;

    /// The coclass registration table
    fn classes(&self) -> &[ClassRegInfo];

    /// Manufacture a new object for the CLSID; `None` when the first-match
    /// walk over the class table finds nothing
    fn create_object(&self, clsid: &Guid, ctx: &Arc<ServerContext>) -> Option<Box<dyn ComObject>>;

    /// The class object handed out for the CLSID.
    ///
    /// The default answers a [`ClassFactory`] for every CLSID present in
    /// the class table and `None` otherwise; servers with custom factories
    /// override this.
    fn class_object(&self, clsid: &Guid, ctx: &Arc<ServerContext>) -> Option<Box<dyn ComObject>> {
        if self.classes().iter().any(|class| class.clsid == *clsid) {
            Some(Box::new(ClassFactory::new(*clsid, ctx.clone())))
        } else {
            None
        }
    }
}

/// The hosting module's collaborators, passed in by the embedder.
pub struct HostModule {
    /// Absolute path of the hosting module's own file
    pub path: PathBuf,
    /// The classes-root registry store
    pub classes_store: Arc<dyn ClassesStore>,
    /// The OS type-library catalog
    pub typelib_catalog: Arc<dyn TypeLibCatalog>,
    /// Loader for the module's embedded type library
    pub typelib_loader: Arc<dyn TypeLibLoader>,
}

/// Per-module server state.
///
/// Owns the outstanding-object lock count the unload decision reads, and
/// threads the host collaborators through every operation.
pub struct ServerContext {
    server: Arc<dyn ComServer>,
    module: HostModule,
    lock_count: AtomicI64,
}

impl ServerContext {
    /// Create the context for a concrete server and its host module
    pub fn new(server: Arc<dyn ComServer>, module: HostModule) -> Arc<Self> {
        Arc::new(Self {
            server,
            module,
            lock_count: AtomicI64::new(0),
        })
    }

    /// The embedding server
    pub fn server(&self) -> &Arc<dyn ComServer> {
        &self.server
    }

    /// The hosting module's collaborators
    pub fn module(&self) -> &HostModule {
        &self.module
    }

    /// Mark the server busy: a live object or an explicit client lock
    pub fn lock(&self) {
        self.lock_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Release one lock. Unlocking below zero is a usage bug.
    pub fn unlock(&self) {
        let previous = self.lock_count.fetch_sub(1, Ordering::SeqCst);
        assert!(previous > 0, "server lock count underflow");
    }

    /// Current lock count
    pub fn lock_count(&self) -> i64 {
        self.lock_count.load(Ordering::SeqCst)
    }

    /// Whether the hosting module may be unloaded
    pub fn can_unload(&self) -> bool {
        self.lock_count() == 0
    }

    /// Manufacture a new object for the CLSID
    pub fn create_object(self: &Arc<Self>, clsid: &Guid) -> Result<ObjectRef> {
        match self.server.create_object(clsid, self) {
            Some(object) => Ok(ObjectRef::new(self, object)),
            None => Err(ComError::ObjectCreation(*clsid)),
        }
    }

    /// The class object for the CLSID, `None` when the class is unknown
    pub fn class_object(self: &Arc<Self>, clsid: &Guid) -> Option<ObjectRef> {
        self.server
            .class_object(clsid, self)
            .map(|object| ObjectRef::new(self, object))
    }

    /// Load the hosting module's own type library
    pub fn load_type_library(&self) -> Result<Arc<dyn TypeLibrary>> {
        self.module.typelib_loader.load(&self.module.path)
    }
}
