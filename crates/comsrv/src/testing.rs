//! Shared fixtures for the crate's unit tests.

use crate::error::ComError;
use crate::object::ComObject;
use crate::server::{ComServer, HostModule, ServerContext};
use crate::typelib::{DispId, MemoryTypeInfo, MemoryTypeLibLoader, MemoryTypeLibrary, Variant};
use comreg::{
    ClassRegInfo, Guid, LibraryInfo, MemoryClassesStore, MemoryTypeLibCatalog, ThreadingModel,
    TypeLibId,
};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const CLSID_TEST: Guid = Guid::new(
    0x12345678,
    0x1234,
    0x1234,
    [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
);

pub const IID_ITEST: Guid = Guid::new(
    0x87654321,
    0x4321,
    0x4321,
    [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01],
);

pub const LIBID_TEST: Guid = Guid::new(
    0x11112222,
    0x3333,
    0x4444,
    [0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC],
);

pub const MODULE_PATH: &str = "C:\\test\\server.dll";

static TEST_INTERFACES: [Guid; 1] = [IID_ITEST];

/// Test object with an observable destructor.
pub struct TestObject {
    destroyed: Arc<AtomicBool>,
}

impl TestObject {
    pub fn new(destroyed: Arc<AtomicBool>) -> Self {
        Self { destroyed }
    }
}

impl Drop for TestObject {
    fn drop(&mut self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

impl ComObject for TestObject {
    fn interfaces(&self) -> &[Guid] {
        &TEST_INTERFACES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static TEST_CLASSES: [ClassRegInfo; 1] = [ClassRegInfo {
    clsid: CLSID_TEST,
    name: "TestClass",
    version: "1",
    threading: ThreadingModel::Both,
}];

/// Test server exposing a single coclass.
pub struct TestServer {
    probe: Arc<AtomicBool>,
}

impl ComServer for TestServer {
    fn library(&self) -> LibraryInfo {
        LibraryInfo::new("TestLib", LIBID_TEST, 1, 0)
    }

    fn classes(&self) -> &[ClassRegInfo] {
        &TEST_CLASSES
    }

    fn create_object(&self, clsid: &Guid, _ctx: &Arc<ServerContext>) -> Option<Box<dyn ComObject>> {
        if *clsid == CLSID_TEST {
            Some(Box::new(TestObject::new(self.probe.clone())))
        } else {
            None
        }
    }
}

/// A fully assembled in-memory host for tests.
pub struct TestHost {
    pub ctx: Arc<ServerContext>,
    pub store: Arc<MemoryClassesStore>,
    pub catalog: Arc<MemoryTypeLibCatalog>,
    pub loader: Arc<MemoryTypeLibLoader>,
    /// Set once the server's test object has been destroyed
    pub probe: Arc<AtomicBool>,
}

/// Build a server context over fresh in-memory collaborators.
///
/// The type-library catalog and loader are seeded with the test library
/// (`Echo` method, `Count` property on `IID_ITEST`) at the module path.
pub fn test_context() -> TestHost {
    let store = Arc::new(MemoryClassesStore::new());
    let catalog = Arc::new(MemoryTypeLibCatalog::new());
    let loader = Arc::new(MemoryTypeLibLoader::new());

    catalog.add_library(MODULE_PATH, TypeLibId::new(LIBID_TEST, 1, 0));

    let info = MemoryTypeInfo::builder(IID_ITEST)
        .method("Echo", DispId(1), |_target, args| {
            let input = args
                .first()
                .and_then(Variant::as_str)
                .ok_or(ComError::TypeMismatch { index: 0 })?;
            Ok(Variant::from(format!("ECHO: {input}")))
        })
        .property_get("Count", DispId(2), |_target, _args| Ok(Variant::I4(42)))
        .build();
    let mut library = MemoryTypeLibrary::new(TypeLibId::new(LIBID_TEST, 1, 0));
    library.add_interface(info);
    loader.add_library(MODULE_PATH, Arc::new(library));

    let probe = Arc::new(AtomicBool::new(false));
    let module = HostModule {
        path: MODULE_PATH.into(),
        classes_store: store.clone(),
        typelib_catalog: catalog.clone(),
        typelib_loader: loader.clone(),
    };
    let ctx = ServerContext::new(
        Arc::new(TestServer {
            probe: probe.clone(),
        }),
        module,
    );

    TestHost {
        ctx,
        store,
        catalog,
        loader,
        probe,
    }
}
