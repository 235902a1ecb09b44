//! Hello COM Server
//!
//! A minimal embedding server driven end to end against the in-memory
//! collaborators: self-registration, class-factory activation, late-bound
//! invocation through the type library, then unregistration. On Windows the
//! same server code runs over the real registry by swapping the store,
//! catalog and loader.
//!
//! Run with: `cargo run -p hello-server -- --name World`

use std::any::Any;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use comreg::{
    ClassRegInfo, ClassesStore, Guid, LibraryInfo, MemoryClassesStore, MemoryTypeLibCatalog,
    RegScope, ThreadingModel, TypeLibId,
};
use comsrv::typelib::{MemoryTypeInfo, MemoryTypeLibLoader, MemoryTypeLibrary};
use comsrv::{
    hresult, iid, inproc, ClassFactory, ComError, ComObject, ComServer, DispId, DispatchAdapter,
    HostModule, InvokeKind, ServerContext, Variant,
};

const CLSID_HELLO: Guid = Guid::new(
    0x6E1F57A0,
    0x8D2B,
    0x4C3E,
    [0x9F, 0x10, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77],
);

const IID_IHELLO: Guid = Guid::new(
    0x6E1F57A1,
    0x8D2B,
    0x4C3E,
    [0x9F, 0x10, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77],
);

const LIBID_HELLOLIB: Guid = Guid::new(
    0x6E1F57A2,
    0x8D2B,
    0x4C3E,
    [0x9F, 0x10, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77],
);

const MODULE_PATH: &str = "C:\\hello\\hellolib.dll";

const DISPID_SAY_HELLO: DispId = DispId(1);

static HELLO_INTERFACES: [Guid; 2] = [IID_IHELLO, iid::IDISPATCH];

/// The one coclass this server exposes.
struct Hello {
    adapter: DispatchAdapter,
}

impl Hello {
    fn new(ctx: Arc<ServerContext>) -> Self {
        Self {
            adapter: DispatchAdapter::new(IID_IHELLO, ctx),
        }
    }

    fn say_hello(&self, name: &str) -> String {
        format!("Hello, {name}! Welcome to COM!")
    }
}

impl ComObject for Hello {
    fn interfaces(&self) -> &[Guid] {
        &HELLO_INTERFACES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static HELLO_CLASSES: [ClassRegInfo; 1] = [ClassRegInfo {
    clsid: CLSID_HELLO,
    name: "Hello",
    version: "1",
    threading: ThreadingModel::Both,
}];

struct HelloServer;

impl ComServer for HelloServer {
    fn library(&self) -> LibraryInfo {
        LibraryInfo::new("HelloLib", LIBID_HELLOLIB, 1, 0)
    }

    fn classes(&self) -> &[ClassRegInfo] {
        &HELLO_CLASSES
    }

    fn create_object(&self, clsid: &Guid, ctx: &Arc<ServerContext>) -> Option<Box<dyn ComObject>> {
        if *clsid == CLSID_HELLO {
            Some(Box::new(Hello::new(ctx.clone())))
        } else {
            None
        }
    }
}

/// Describe IHello the way the module's type library would.
fn hello_type_library() -> MemoryTypeLibrary {
    let info = MemoryTypeInfo::builder(IID_IHELLO)
        .method("SayHello", DISPID_SAY_HELLO, |target, args| {
            let hello = target.downcast_ref::<Hello>().expect("target is Hello");
            let name = args
                .first()
                .and_then(Variant::as_str)
                .ok_or(ComError::TypeMismatch { index: 0 })?;
            Ok(Variant::from(hello.say_hello(name)))
        })
        .build();

    let mut library = MemoryTypeLibrary::new(TypeLibId::new(LIBID_HELLOLIB, 1, 0));
    library.add_interface(info);
    library
}

#[derive(Parser)]
#[command(name = "hello-server")]
#[command(about = "Example in-process COM server")]
struct Args {
    /// Name to greet through the late-bound call
    #[arg(short, long, default_value = "World")]
    name: String,

    /// Register under the per-user scope instead of machine-wide
    #[arg(long)]
    user: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting Hello COM server");
    info!("CLSID: {}", CLSID_HELLO);
    info!("LIBID: {}", LIBID_HELLOLIB);

    // Assemble the host module the way a DLL would, over in-memory
    // collaborators.
    let store = Arc::new(MemoryClassesStore::new());
    let catalog = Arc::new(MemoryTypeLibCatalog::new());
    let loader = Arc::new(MemoryTypeLibLoader::new());
    catalog.add_library(MODULE_PATH, TypeLibId::new(LIBID_HELLOLIB, 1, 0));
    loader.add_library(MODULE_PATH, Arc::new(hello_type_library()));

    let module = HostModule {
        path: MODULE_PATH.into(),
        classes_store: store.clone(),
        typelib_catalog: catalog.clone(),
        typelib_loader: loader.clone(),
    };
    let ctx = ServerContext::new(Arc::new(HelloServer), module);

    // Self-registration, as DllRegisterServer / DllInstall would run it.
    let command = args.user.then_some("user");
    let hr = inproc::dll_install(&ctx, true, command);
    assert_eq!(hr, hresult::S_OK);
    let scope = if args.user { RegScope::User } else { RegScope::Machine };
    info!(
        "Registered {} keys under {}",
        store.key_count(scope),
        scope.classes_root()
    );
    info!(
        "ProgID HelloLib.Hello -> {}",
        store
            .default_value(scope, "HelloLib.Hello\\CLSID")?
            .unwrap_or_default()
    );

    // Activation, as the COM runtime would drive it.
    let (hr, factory) = inproc::dll_get_class_object(&ctx, &CLSID_HELLO, &iid::ICLASSFACTORY);
    assert_eq!(hr, hresult::S_OK);
    let factory = factory.expect("factory present on S_OK");

    let hello = factory
        .downcast::<ClassFactory>()
        .expect("class object is the stock factory")
        .create_instance(None, &IID_IHELLO)?;
    info!("Created an instance, server busy: {}", !ctx.can_unload());

    // Late-bound call through the type library.
    let object = hello.downcast::<Hello>().expect("instance is Hello");
    let ids = object.adapter.get_ids_of_names(&["SayHello"])?;
    let greeting = object.adapter.invoke(
        object.as_any(),
        ids[0],
        InvokeKind::Method,
        &[Variant::from(args.name.as_str())],
    )?;
    info!("SayHello returned: {:?}", greeting);

    // Release everything and unregister.
    drop(hello);
    drop(factory);
    info!(
        "All references released, can unload: {}",
        inproc::dll_can_unload_now(&ctx) == hresult::S_OK
    );

    let hr = inproc::dll_install(&ctx, false, command);
    assert_eq!(hr, hresult::S_OK);
    info!("Unregistered, store empty: {}", store.is_empty());

    Ok(())
}
