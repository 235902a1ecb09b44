//! The in-process server entry points.
//!
//! The COM runtime loads an in-process server with `LoadLibrary` and
//! resolves four fixed exports — `DllGetClassObject`, `DllCanUnloadNow`,
//! `DllRegisterServer`, `DllUnregisterServer` — plus the optional
//! `DllInstall`. The operations here implement those entry points over a
//! [`ServerContext`]; the embedding DLL's exports are one screen of
//! forwarding glue:
//!
//! ```ignore
//! #[no_mangle]
//! extern "system" fn DllCanUnloadNow() -> HRESULT {
//!     HRESULT(comsrv::inproc::dll_can_unload_now(module_context()) as i32)
//! }
//!
//! #[no_mangle]
//! extern "system" fn DllRegisterServer() -> HRESULT {
//!     HRESULT(comsrv::inproc::dll_register_server(module_context()) as i32)
//! }
//! ```
//!
//! Every `dll_*` function converts failures exactly once into an HRESULT
//! and installs the thread error record; no error propagates past this
//! boundary.

use crate::error::{hresult, ComError, Result};
use crate::error_info;
use crate::object::InterfaceRef;
use crate::server::ServerContext;
use comreg::{Guid, RegScope, ServerKind, ServerRegInfo};
use std::sync::Arc;
use tracing::{debug, error};

/// Look up the class object for a CLSID and acquire `iid` on it.
pub fn get_class_object(
    ctx: &Arc<ServerContext>,
    clsid: &Guid,
    iid: &Guid,
) -> Result<InterfaceRef> {
    let factory = ctx
        .class_object(clsid)
        .ok_or(ComError::ClassNotAvailable(*clsid))?;
    factory.query_interface(iid)
}

/// Whether the hosting module may be unloaded
pub fn can_unload_now(ctx: &ServerContext) -> bool {
    ctx.can_unload()
}

/// Register every coclass in the server's table, then its type library.
pub fn register_server(ctx: &ServerContext, scope: RegScope) -> Result<()> {
    let info = server_reg_info(ctx);
    let module = ctx.module();

    for class in ctx.server().classes() {
        comreg::register_clsid(
            module.classes_store.as_ref(),
            scope,
            &info,
            &class.clsid,
            class.name,
            class.version,
            class.threading,
        )?;
    }
    comreg::register_type_lib(module.typelib_catalog.as_ref(), scope, &info.file)?;

    debug!(library = %info.library.name, ?scope, "server registered");
    Ok(())
}

/// Unregister every coclass in the server's table, then its type library.
pub fn unregister_server(ctx: &ServerContext, scope: RegScope) -> Result<()> {
    let info = server_reg_info(ctx);
    let module = ctx.module();

    for class in ctx.server().classes() {
        comreg::unregister_clsid(
            module.classes_store.as_ref(),
            scope,
            &info,
            &class.clsid,
            class.name,
            class.version,
        );
    }
    comreg::unregister_type_lib(
        module.typelib_catalog.as_ref(),
        scope,
        &info.library.libid,
        info.library.major,
        info.library.minor,
    )?;

    debug!(library = %info.library.name, ?scope, "server unregistered");
    Ok(())
}

fn server_reg_info(ctx: &ServerContext) -> ServerRegInfo {
    ServerRegInfo::new(
        ServerKind::InprocServer,
        ctx.module().path.clone(),
        ctx.server().library(),
    )
}

/// `DllGetClassObject`: the class factory for `clsid`, queried for `iid`.
pub fn dll_get_class_object(
    ctx: &Arc<ServerContext>,
    clsid: &Guid,
    iid: &Guid,
) -> (u32, Option<InterfaceRef>) {
    match hresult_boundary("dll_get_class_object", get_class_object(ctx, clsid, iid)) {
        Ok(interface) => (hresult::S_OK, Some(interface)),
        Err(hr) => (hr, None),
    }
}

/// `DllCanUnloadNow`: S_OK when idle, S_FALSE while objects or locks live.
pub fn dll_can_unload_now(ctx: &ServerContext) -> u32 {
    if ctx.can_unload() {
        hresult::S_OK
    } else {
        hresult::S_FALSE
    }
}

/// `DllRegisterServer`: machine-scope registration.
pub fn dll_register_server(ctx: &ServerContext) -> u32 {
    status_only("dll_register_server", register_server(ctx, RegScope::Machine))
}

/// `DllUnregisterServer`: machine-scope unregistration.
pub fn dll_unregister_server(ctx: &ServerContext) -> u32 {
    status_only(
        "dll_unregister_server",
        unregister_server(ctx, RegScope::Machine),
    )
}

/// `DllInstall`: register or unregister, per-user when the command line
/// carries the case-insensitive `user` token.
pub fn dll_install(ctx: &ServerContext, install: bool, command: Option<&str>) -> u32 {
    let per_user = command.map_or(false, |token| token.trim().eq_ignore_ascii_case("user"));
    let scope = if per_user {
        RegScope::User
    } else {
        RegScope::Machine
    };

    if install {
        status_only("dll_install", register_server(ctx, scope))
    } else {
        status_only("dll_install", unregister_server(ctx, scope))
    }
}

/// Convert a failure into its HRESULT, logging it and installing the thread
/// error record. The single translation step at the module boundary.
pub fn hresult_boundary<T>(source: &str, result: Result<T>) -> std::result::Result<T, u32> {
    result.map_err(|err| {
        let hr = err.hresult();
        error!(source, hresult = hr, error = %err, "call failed at module boundary");
        error_info::set_error_info(source, &err.to_string());
        hr
    })
}

fn status_only(source: &str, result: Result<()>) -> u32 {
    match hresult_boundary(source, result) {
        Ok(()) => hresult::S_OK,
        Err(hr) => hr,
    }
}
