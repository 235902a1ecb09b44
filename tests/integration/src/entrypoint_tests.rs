//! Entry-point tests: the full client path from `DllGetClassObject` through
//! factory activation, with boundary error translation and error records.

mod common;

use common::*;
use comsrv::error_info::take_error_info;
use comsrv::{hresult, iid, inproc, ClassFactory, Guid};

#[test]
fn full_activation_path() {
    let host = widget_host();

    let (hr, factory) = inproc::dll_get_class_object(&host.ctx, &CLSID_WIDGET, &iid::ICLASSFACTORY);
    assert_eq!(hr, hresult::S_OK);
    let factory = factory.unwrap();

    let widget_iface = factory
        .downcast::<ClassFactory>()
        .unwrap()
        .create_instance(None, &IID_IWIDGET)
        .unwrap();
    assert_eq!(widget_iface.iid(), IID_IWIDGET);
    assert!(widget_iface.downcast::<Widget>().is_some());

    // Factory and instance both hold the server busy.
    assert_eq!(inproc::dll_can_unload_now(&host.ctx), hresult::S_FALSE);

    drop(widget_iface);
    drop(factory);
    assert_eq!(inproc::dll_can_unload_now(&host.ctx), hresult::S_OK);
}

#[test]
fn unknown_class_reports_class_not_available() {
    let host = widget_host();

    let (hr, factory) = inproc::dll_get_class_object(&host.ctx, &Guid::generate(), &iid::IUNKNOWN);
    assert_eq!(hr, hresult::CLASS_E_CLASSNOTAVAILABLE);
    assert!(factory.is_none());

    let info = take_error_info().unwrap();
    assert_eq!(info.source, "dll_get_class_object");
    assert!(info.description.contains("class not available"));
}

#[test]
fn factory_rejects_interfaces_it_does_not_carry() {
    let host = widget_host();

    let (hr, factory) = inproc::dll_get_class_object(&host.ctx, &CLSID_WIDGET, &IID_IWIDGET);
    assert_eq!(hr, hresult::E_NOINTERFACE);
    assert!(factory.is_none());
}

#[test]
fn aggregation_request_is_translated_at_the_boundary() {
    let host = widget_host();

    let (_, factory) = inproc::dll_get_class_object(&host.ctx, &CLSID_WIDGET, &iid::ICLASSFACTORY);
    let factory = factory.unwrap();
    let outer = host.ctx.create_object(&CLSID_WIDGET).unwrap();

    let result = factory
        .downcast::<ClassFactory>()
        .unwrap()
        .create_instance(Some(&outer), &IID_IWIDGET);
    let hr = inproc::hresult_boundary("create_instance", result).unwrap_err();
    assert_eq!(hr, hresult::CLASS_E_NOAGGREGATION);

    let info = take_error_info().unwrap();
    assert_eq!(info.source, "create_instance");
    assert_eq!(info.description, "aggregation is not supported");
}

#[test]
fn lock_server_keeps_the_module_loaded() {
    let host = widget_host();

    let (_, factory) = inproc::dll_get_class_object(&host.ctx, &CLSID_WIDGET, &iid::ICLASSFACTORY);
    let factory = factory.unwrap();
    let concrete = factory.downcast::<ClassFactory>().unwrap();

    let base = host.ctx.lock_count();
    concrete.lock_server(true);
    assert_eq!(host.ctx.lock_count(), base + 1);
    assert_eq!(inproc::dll_can_unload_now(&host.ctx), hresult::S_FALSE);

    concrete.lock_server(false);
    assert_eq!(host.ctx.lock_count(), base);
}

#[test]
fn boundary_failures_never_panic_and_always_return_a_status() {
    let host = widget_host();

    // Unregistering a server that was never registered: class keys are
    // tolerated, the absent type library is the reported failure.
    let hr = inproc::dll_unregister_server(&host.ctx);
    assert_eq!(hr, hresult::TYPE_E_REGISTRYACCESS);
    assert!(take_error_info().is_some());
}
