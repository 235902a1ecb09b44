//! Reference-counted COM objects.
//!
//! Every object a server exposes follows the same lifecycle contract:
//! interface acquisitions atomically increment a reference count, releases
//! decrement it, the last release destroys the object, and the first/last
//! transitions notify the server so it knows live objects exist. Here the
//! contract is carried by ownership handles: an [`ObjectRef`] is a counted
//! reference, a clone is an `AddRef`, a drop is a `Release`, and destruction
//! is the drop of the owned object when the count reaches zero.

use crate::error::{ComError, Result};
use crate::iid;
use crate::server::ServerContext;
use comreg::Guid;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A COM-visible object.
///
/// Implementations declare the finite set of interface identifiers they
/// answer to beyond the universally supported `IUnknown` and
/// `ISupportErrorInfo`.
pub trait ComObject: Send + Sync + 'static {
    /// Interface identifiers this object supports, in match order
    fn interfaces(&self) -> &[Guid];

    /// Typed view of the object, for dispatch targets and downcasts
    fn as_any(&self) -> &dyn Any;

    /// Whether error info can be retrieved through the given interface.
    ///
    /// Always affirmative: every interface exposed through this base
    /// participates in the thread error-record protocol.
    fn interface_supports_error_info(&self, iid: &Guid) -> bool {
        let _ = iid;
        true
    }
}

struct ObjectShared {
    object: Box<dyn ComObject>,
    refs: AtomicI64,
    ctx: Arc<ServerContext>,
}

/// A counted owning handle to a COM object.
///
/// Creating the handle sets the reference count to 1 and locks the server
/// (object-alive accounting); cloning increments; dropping decrements,
/// unlocking the server and destroying the object on the final release.
pub struct ObjectRef {
    shared: Arc<ObjectShared>,
}

impl ObjectRef {
    /// Take ownership of a newly manufactured object.
    pub fn new(ctx: &Arc<ServerContext>, object: Box<dyn ComObject>) -> Self {
        ctx.lock();
        Self {
            shared: Arc::new(ObjectShared {
                object,
                refs: AtomicI64::new(1),
                ctx: ctx.clone(),
            }),
        }
    }

    /// Current reference count, observable for lifecycle verification
    pub fn ref_count(&self) -> i64 {
        self.shared.refs.load(Ordering::SeqCst)
    }

    /// Query the object for an interface.
    ///
    /// Matches `IUnknown` first, then `ISupportErrorInfo`, then the
    /// object's declared set in order. A match acquires a new counted
    /// reference; no match has no side effect.
    pub fn query_interface(&self, iid: &Guid) -> Result<InterfaceRef> {
        if *iid == iid::IUNKNOWN
            || *iid == iid::ISUPPORTERRORINFO
            || self.shared.object.interfaces().contains(iid)
        {
            Ok(InterfaceRef {
                object: self.clone(),
                iid: *iid,
            })
        } else {
            Err(ComError::NoInterface(*iid))
        }
    }

    /// Whether error info is available through the given interface
    pub fn supports_error_info(&self, iid: &Guid) -> bool {
        self.shared.object.interface_supports_error_info(iid)
    }

    /// The underlying object
    pub fn object(&self) -> &dyn ComObject {
        self.shared.object.as_ref()
    }

    /// Typed access to the underlying object
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.shared.object.as_any().downcast_ref()
    }

    /// The server context this object notifies
    pub fn context(&self) -> &Arc<ServerContext> {
        &self.shared.ctx
    }
}

impl Clone for ObjectRef {
    fn clone(&self) -> Self {
        self.shared.refs.fetch_add(1, Ordering::SeqCst);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        let previous = self.shared.refs.fetch_sub(1, Ordering::SeqCst);
        assert!(previous > 0, "object reference count underflow");
        if previous == 1 {
            // Last release: the object destructs when the shared state
            // drops right after this, mirroring unlock-then-delete order.
            self.shared.ctx.unlock();
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef(refs={})", self.ref_count())
    }
}

/// A counted handle acquired as a specific interface.
#[derive(Clone)]
pub struct InterfaceRef {
    object: ObjectRef,
    iid: Guid,
}

impl InterfaceRef {
    /// The interface identifier this handle was acquired as
    pub fn iid(&self) -> Guid {
        self.iid
    }

    /// The object handle behind this interface
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Current reference count of the underlying object
    pub fn ref_count(&self) -> i64 {
        self.object.ref_count()
    }

    /// Query for another interface on the same object
    pub fn query_interface(&self, iid: &Guid) -> Result<InterfaceRef> {
        self.object.query_interface(iid)
    }

    /// Typed access to the underlying object
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.object.downcast()
    }
}

impl fmt::Debug for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceRef({}, refs={})", self.iid, self.ref_count())
    }
}
