//! Object lifecycle tests: reference counting, destruction and the
//! coupling between live objects and the server lock count.

mod common;

use common::*;
use comsrv::{hresult, iid, inproc, ComError};
use std::sync::atomic::Ordering;

#[test]
fn acquiring_and_releasing_interfaces_restores_the_count() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();

    let start = object.ref_count();
    let ifaces: Vec<_> = (0..5)
        .map(|_| object.query_interface(&IID_IWIDGET).unwrap())
        .collect();
    assert_eq!(object.ref_count(), start + 5);

    drop(ifaces);
    assert_eq!(object.ref_count(), start);
}

#[test]
fn releasing_the_last_reference_destroys_the_object() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    let iface = object.query_interface(&iid::IUNKNOWN).unwrap();

    drop(object);
    assert!(!host.destroyed.load(Ordering::SeqCst));

    drop(iface);
    assert!(host.destroyed.load(Ordering::SeqCst));
}

#[test]
fn object_lifetime_drives_the_lock_count_only_at_the_edges() {
    let host = widget_host();
    assert_eq!(host.ctx.lock_count(), 0);

    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    assert_eq!(host.ctx.lock_count(), 1);

    // 1 -> 2 -> 1 transitions leave the lock count unchanged.
    let extra = object.query_interface(&IID_IWIDGET).unwrap();
    assert_eq!(host.ctx.lock_count(), 1);
    drop(extra);
    assert_eq!(host.ctx.lock_count(), 1);

    drop(object);
    assert_eq!(host.ctx.lock_count(), 0);
}

#[test]
fn can_unload_now_samples_the_lock_count() {
    let host = widget_host();
    assert_eq!(inproc::dll_can_unload_now(&host.ctx), hresult::S_OK);

    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();
    assert_eq!(inproc::dll_can_unload_now(&host.ctx), hresult::S_FALSE);

    drop(object);
    assert_eq!(inproc::dll_can_unload_now(&host.ctx), hresult::S_OK);
}

#[test]
fn query_interface_matches_the_declared_set_in_order() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();

    assert!(object.query_interface(&iid::IUNKNOWN).is_ok());
    assert!(object.query_interface(&iid::ISUPPORTERRORINFO).is_ok());
    assert!(object.query_interface(&IID_IWIDGET).is_ok());
    assert!(object.query_interface(&iid::IDISPATCH).is_ok());

    let count = object.ref_count();
    let err = object.query_interface(&iid::ICLASSFACTORY).unwrap_err();
    assert!(matches!(err, ComError::NoInterface(_)));
    assert_eq!(object.ref_count(), count, "failed query must not add a reference");
}

#[test]
fn interfaces_can_be_requeried_from_an_interface_handle() {
    let host = widget_host();
    let object = host.ctx.create_object(&CLSID_WIDGET).unwrap();

    let widget = object.query_interface(&IID_IWIDGET).unwrap();
    let dispatch = widget.query_interface(&iid::IDISPATCH).unwrap();
    assert_eq!(dispatch.iid(), iid::IDISPATCH);
    assert_eq!(object.ref_count(), 3);
}
