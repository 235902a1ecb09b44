//! Late-binding tests: name resolution and invocation through the module's
//! type library, end to end from factory activation to member dispatch.

mod common;

use common::*;
use comsrv::{hresult, ComError, InvokeKind, Variant};

#[test]
fn members_resolve_and_invoke_through_the_type_library() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let ids = widget.get_ids_of_names(&["Add", "Total"]).unwrap();
    assert_eq!(ids, vec![DISPID_ADD, DISPID_TOTAL]);

    let result = widget
        .invoke(DISPID_ADD, InvokeKind::Method, &[Variant::I4(7)])
        .unwrap();
    assert_eq!(result, Variant::I4(7));

    widget
        .invoke(DISPID_ADD, InvokeKind::Method, &[Variant::I4(35)])
        .unwrap();

    let total = widget
        .invoke(DISPID_TOTAL, InvokeKind::PropertyGet, &[])
        .unwrap();
    assert_eq!(total, Variant::I4(42));
}

#[test]
fn name_resolution_is_case_insensitive() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let ids = widget.get_ids_of_names(&["add", "TOTAL"]).unwrap();
    assert_eq!(ids, vec![DISPID_ADD, DISPID_TOTAL]);
}

#[test]
fn unknown_member_name_fails_with_unknown_name() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let err = widget.get_ids_of_names(&["Frobnicate"]).unwrap_err();
    assert_eq!(err.hresult(), hresult::DISP_E_UNKNOWNNAME);
}

#[test]
fn invoking_with_the_wrong_argument_type_fails() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let err = widget
        .invoke(DISPID_ADD, InvokeKind::Method, &[Variant::from("seven")])
        .unwrap_err();
    assert_eq!(err.hresult(), hresult::DISP_E_TYPEMISMATCH);
}

#[test]
fn type_info_is_loaded_once_and_shared() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let first = widget.adapter().get_type_info(0).unwrap();
    let second = widget.adapter().get_type_info(0).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn bad_type_info_index_is_rejected() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let err = widget.adapter().get_type_info(1).unwrap_err();
    assert!(matches!(err, ComError::BadTypeInfoIndex(1)));
}

#[test]
fn missing_type_library_surfaces_load_failure() {
    let host = widget_host();

    // A module whose file carries no type library.
    let bare = comsrv::HostModule {
        path: "C:\\widgets\\bare.dll".into(),
        classes_store: host.store.clone(),
        typelib_catalog: host.catalog.clone(),
        typelib_loader: host.loader.clone(),
    };
    let ctx = comsrv::ServerContext::new(
        std::sync::Arc::new(WidgetServer {
            destroyed: host.destroyed.clone(),
        }),
        bare,
    );

    let object = ctx.create_object(&CLSID_WIDGET).unwrap();
    let widget = object.downcast::<Widget>().unwrap();

    let err = widget.get_ids_of_names(&["Add"]).unwrap_err();
    assert_eq!(err.hresult(), hresult::TYPE_E_CANTLOADLIBRARY);
    assert!(err.to_string().contains("bare.dll"));
}
