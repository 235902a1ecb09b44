//! Registration tests: the classes-root key layout, round-trip idempotence
//! and scope selection.

mod common;

use common::*;
use comreg::{lookup_clsid_name, lookup_iid_name, ClassesStore, RegScope};
use comsrv::{hresult, inproc};

#[test]
fn register_server_writes_the_expected_tree() {
    let host = widget_host();
    assert_eq!(inproc::dll_register_server(&host.ctx), hresult::S_OK);

    let clsid_key = format!("CLSID\\{CLSID_WIDGET}");

    // ProgID trees.
    assert_eq!(
        host.store
            .default_value(RegScope::Machine, "WidgetLib.Widget")
            .unwrap()
            .as_deref(),
        Some("Widget Class")
    );
    assert_eq!(
        host.store
            .default_value(RegScope::Machine, "WidgetLib.Widget\\CurVer")
            .unwrap()
            .as_deref(),
        Some("WidgetLib.Widget.1")
    );
    assert_eq!(
        host.store
            .default_value(RegScope::Machine, "WidgetLib.Widget.1\\CLSID")
            .unwrap()
            .as_deref(),
        Some(CLSID_WIDGET.to_string().as_str())
    );

    // CLSID tree.
    assert_eq!(
        host.store
            .default_value(RegScope::Machine, &format!("{clsid_key}\\InprocServer32"))
            .unwrap()
            .as_deref(),
        Some(MODULE_PATH)
    );
    assert_eq!(
        host.store
            .string_value(
                RegScope::Machine,
                &format!("{clsid_key}\\InprocServer32"),
                "ThreadingModel"
            )
            .as_deref(),
        Some("Apartment")
    );
    assert_eq!(
        host.store
            .default_value(RegScope::Machine, &format!("{clsid_key}\\ProgID"))
            .unwrap()
            .as_deref(),
        Some("WidgetLib.Widget.1")
    );
    assert_eq!(
        host.store
            .default_value(RegScope::Machine, &format!("{clsid_key}\\TypeLib"))
            .unwrap()
            .as_deref(),
        Some(LIBID_WIDGETLIB.to_string().as_str())
    );

    // The type library lands in the catalog.
    assert!(host.catalog.is_registered(RegScope::Machine, &LIBID_WIDGETLIB));
}

#[test]
fn register_then_unregister_leaves_no_residue() {
    let host = widget_host();

    assert_eq!(inproc::dll_register_server(&host.ctx), hresult::S_OK);
    assert_eq!(inproc::dll_unregister_server(&host.ctx), hresult::S_OK);

    assert!(
        host.store.is_empty(),
        "leftover keys: {:?}",
        host.store.keys(RegScope::Machine)
    );
    assert!(!host.catalog.is_registered(RegScope::Machine, &LIBID_WIDGETLIB));
}

#[test]
fn registering_twice_is_idempotent() {
    let host = widget_host();

    assert_eq!(inproc::dll_register_server(&host.ctx), hresult::S_OK);
    let count = host.store.key_count(RegScope::Machine);

    assert_eq!(inproc::dll_register_server(&host.ctx), hresult::S_OK);
    assert_eq!(host.store.key_count(RegScope::Machine), count);
}

#[test]
fn install_round_trip_under_the_user_scope() {
    let host = widget_host();

    assert_eq!(inproc::dll_install(&host.ctx, true, Some("User")), hresult::S_OK);
    assert_eq!(host.store.key_count(RegScope::Machine), 0);
    assert!(host.store.key_count(RegScope::User) > 0);
    assert!(host.catalog.is_registered(RegScope::User, &LIBID_WIDGETLIB));

    assert_eq!(inproc::dll_install(&host.ctx, false, Some("USER")), hresult::S_OK);
    assert!(host.store.is_empty());
}

#[test]
fn lookups_resolve_names_after_registration() {
    let host = widget_host();
    assert_eq!(inproc::dll_register_server(&host.ctx), hresult::S_OK);

    assert_eq!(lookup_clsid_name(host.store.as_ref(), &CLSID_WIDGET), "Widget");
    assert_eq!(lookup_clsid_name(host.store.as_ref(), &comreg::Guid::generate()), "");
    assert_eq!(lookup_iid_name(host.store.as_ref(), &IID_IWIDGET), "");
}
