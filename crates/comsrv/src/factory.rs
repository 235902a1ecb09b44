//! The class factory.
//!
//! The one concrete object every server needs: constructed for a fixed
//! CLSID, it manufactures instances through the server context and proxies
//! client lock requests.

use crate::error::{ComError, Result};
use crate::iid;
use crate::object::{ComObject, InterfaceRef, ObjectRef};
use crate::server::ServerContext;
use comreg::Guid;
use std::any::Any;
use std::sync::Arc;

static FACTORY_INTERFACES: [Guid; 1] = [iid::ICLASSFACTORY];

/// Class factory for a single CLSID.
pub struct ClassFactory {
    clsid: Guid,
    ctx: Arc<ServerContext>,
}

impl ClassFactory {
    /// Create a factory manufacturing objects of `clsid`
    pub fn new(clsid: Guid, ctx: Arc<ServerContext>) -> Self {
        Self { clsid, ctx }
    }

    /// The CLSID this factory manufactures
    pub fn clsid(&self) -> Guid {
        self.clsid
    }

    /// Create an instance of the class and acquire `iid` on it.
    ///
    /// Aggregation is not supported: a non-empty `outer` always fails with
    /// [`ComError::AggregationNotSupported`] and yields nothing.
    pub fn create_instance(&self, outer: Option<&ObjectRef>, iid: &Guid) -> Result<InterfaceRef> {
        if outer.is_some() {
            return Err(ComError::AggregationNotSupported);
        }

        let object = self.ctx.create_object(&self.clsid)?;
        object.query_interface(iid)
    }

    /// Lock or unlock the server on a client's behalf. Always succeeds.
    pub fn lock_server(&self, lock: bool) {
        if lock {
            self.ctx.lock();
        } else {
            self.ctx.unlock();
        }
    }
}

impl ComObject for ClassFactory {
    fn interfaces(&self) -> &[Guid] {
        &FACTORY_INTERFACES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
