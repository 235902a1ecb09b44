//! Registering and unregistering COM classes, monikers and type libraries.
//!
//! The key layout written here is the standard classes-root schema: a
//! version-independent ProgID tree (`<Library>.<Class>`) and a versioned one
//! (`<Library>.<Class>.<Version>`), both aliasing a `CLSID\{guid}` tree that
//! names the server file, threading model and type library.

use crate::catalog::TypeLibCatalog;
use crate::error::Result;
use crate::guid::Guid;
use crate::info::{ServerRegInfo, ThreadingModel};
use crate::store::{ClassesStore, RegScope};
use std::path::Path;
use tracing::{debug, warn};

/// Register a CLSID with its ProgID aliases.
pub fn register_clsid(
    store: &dyn ClassesStore,
    scope: RegScope,
    info: &ServerRegInfo,
    clsid: &Guid,
    class: &str,
    version: &str,
    model: ThreadingModel,
) -> Result<()> {
    let clsid_str = clsid.to_string();
    let libid_str = info.library.libid.to_string();
    let prog_id = format!("{}.{}", info.library.name, class);
    let ver_prog_id = format!("{prog_id}.{version}");
    let description = format!("{class} Class");
    let clsid_key = format!("CLSID\\{clsid_str}");
    let server_key = format!("{}\\{}", clsid_key, info.kind.registry_key());
    let file = info.file.display().to_string();

    // Version independent ProgID section.
    store.set_default_value(scope, &prog_id, &description)?;
    store.set_default_value(scope, &format!("{prog_id}\\CLSID"), &clsid_str)?;
    store.set_default_value(scope, &format!("{prog_id}\\CurVer"), &ver_prog_id)?;

    // Version dependent ProgID section.
    store.set_default_value(scope, &ver_prog_id, &description)?;
    store.set_default_value(scope, &format!("{ver_prog_id}\\CLSID"), &clsid_str)?;

    // CLSID section.
    store.set_default_value(scope, &clsid_key, class)?;
    store.set_default_value(scope, &server_key, &file)?;
    store.set_string_value(scope, &server_key, "ThreadingModel", model.registry_value())?;
    store.set_default_value(scope, &format!("{clsid_key}\\ProgID"), &ver_prog_id)?;
    store.set_default_value(
        scope,
        &format!("{clsid_key}\\VersionIndependentProgID"),
        &prog_id,
    )?;
    store.set_default_value(scope, &format!("{clsid_key}\\TypeLib"), &libid_str)?;

    debug!(clsid = %clsid_str, prog_id = %prog_id, ?scope, "registered coclass");
    Ok(())
}

/// Unregister a CLSID and its ProgID aliases.
///
/// Deletion is best-effort: the registry may already be partially clean
/// from an earlier run, so missing keys and delete failures are logged and
/// never surfaced.
pub fn unregister_clsid(
    store: &dyn ClassesStore,
    scope: RegScope,
    info: &ServerRegInfo,
    clsid: &Guid,
    class: &str,
    version: &str,
) {
    let clsid_str = clsid.to_string();
    let prog_id = format!("{}.{}", info.library.name, class);
    let ver_prog_id = format!("{prog_id}.{version}");
    let clsid_key = format!("CLSID\\{clsid_str}");
    let server_key = format!("{}\\{}", clsid_key, info.kind.registry_key());

    // Version independent ProgID section.
    delete_key(store, scope, &format!("{prog_id}\\CLSID"));
    delete_key(store, scope, &format!("{prog_id}\\CurVer"));
    delete_key(store, scope, &prog_id);

    // Version dependent ProgID section.
    delete_key(store, scope, &format!("{ver_prog_id}\\CLSID"));
    delete_key(store, scope, &ver_prog_id);

    // CLSID section.
    delete_key(store, scope, &server_key);
    delete_key(store, scope, &format!("{clsid_key}\\ProgID"));
    delete_key(store, scope, &format!("{clsid_key}\\VersionIndependentProgID"));
    delete_key(store, scope, &format!("{clsid_key}\\TypeLib"));
    delete_key(store, scope, &clsid_key);

    debug!(clsid = %clsid_str, prog_id = %prog_id, ?scope, "unregistered coclass");
}

/// Register a moniker prefix resolving to a CLSID.
///
/// The key layout matches the ProgID section, keyed by the arbitrary
/// prefix string a custom moniker parser claims.
pub fn register_moniker_prefix(
    store: &dyn ClassesStore,
    scope: RegScope,
    prefix: &str,
    class: &str,
    clsid: &Guid,
) -> Result<()> {
    let description = format!("{class} Class");

    store.set_default_value(scope, prefix, &description)?;
    store.set_default_value(scope, &format!("{prefix}\\CLSID"), &clsid.to_string())?;
    Ok(())
}

/// Unregister a moniker prefix. Best-effort, like [`unregister_clsid`].
pub fn unregister_moniker_prefix(store: &dyn ClassesStore, scope: RegScope, prefix: &str) {
    delete_key(store, scope, &format!("{prefix}\\CLSID"));
    delete_key(store, scope, prefix);
}

/// Load a type library file and add it to the OS catalog.
pub fn register_type_lib(
    catalog: &dyn TypeLibCatalog,
    scope: RegScope,
    file: &Path,
) -> Result<()> {
    debug!(file = %file.display(), ?scope, "registering type library");
    catalog.register(scope, file)
}

/// Remove a type library from the OS catalog.
pub fn unregister_type_lib(
    catalog: &dyn TypeLibCatalog,
    scope: RegScope,
    libid: &Guid,
    major: u16,
    minor: u16,
) -> Result<()> {
    debug!(%libid, major, minor, ?scope, "unregistering type library");
    catalog.unregister(scope, libid, major, minor)
}

/// Look up the registered display name for a CLSID.
///
/// The empty string is the defined not-found signal.
pub fn lookup_clsid_name(store: &dyn ClassesStore, clsid: &Guid) -> String {
    read_name(store, &format!("CLSID\\{clsid}"))
}

/// Look up the registered display name for an interface ID.
///
/// The empty string is the defined not-found signal.
pub fn lookup_iid_name(store: &dyn ClassesStore, iid: &Guid) -> String {
    read_name(store, &format!("Interface\\{iid}"))
}

fn read_name(store: &dyn ClassesStore, key: &str) -> String {
    store
        .default_value(RegScope::Machine, key)
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn delete_key(store: &dyn ClassesStore, scope: RegScope, key: &str) {
    match store.delete_key(scope, key) {
        Ok(true) => {}
        Ok(false) => debug!(key, ?scope, "key already absent"),
        Err(err) => warn!(key, ?scope, error = %err, "failed to delete key"),
    }
}
