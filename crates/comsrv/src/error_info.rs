//! Per-thread COM error records.
//!
//! COM failures surface to clients as an HRESULT plus, when the client asks
//! for it, a per-logical-thread record naming the failing source and a
//! human-readable description. The record is installed exactly once, at the
//! module boundary, and read destructively the way `GetErrorInfo` hands
//! ownership to the caller.

use std::cell::RefCell;

/// The error record installed for the calling thread
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Name of the failing function
    pub source: String,
    /// Human-readable description
    pub description: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<ErrorInfo>> = const { RefCell::new(None) };
}

/// Install the error record for the calling thread
pub fn set_error_info(source: &str, description: &str) {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(ErrorInfo {
            source: source.to_string(),
            description: description.to_string(),
        });
    });
}

/// Take the error record, clearing the slot
pub fn take_error_info() -> Option<ErrorInfo> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take())
}

/// Clear the error record without reading it
pub fn clear_error_info() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}
