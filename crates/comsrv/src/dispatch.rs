//! The late-binding adapter.
//!
//! Objects exposing a dual interface embed a [`DispatchAdapter`] and forward
//! the four `IDispatch` operations to it. The adapter lazily loads the
//! hosting module's type library on first use, caches the interface's type
//! information for its lifetime and delegates name resolution and
//! invocation entirely to it.

use crate::error::{ComError, Result};
use crate::error_info;
use crate::server::ServerContext;
use crate::typelib::{DispId, InvokeKind, TypeInfo, TypeLibrary, Variant};
use comreg::Guid;
use std::any::Any;
use std::sync::{Arc, RwLock};

struct Loaded {
    // The library handle is held so the type info's source outlives it.
    #[allow(dead_code)]
    library: Arc<dyn TypeLibrary>,
    type_info: Arc<dyn TypeInfo>,
}

/// Late-binding adapter for one dual interface.
pub struct DispatchAdapter {
    diid: Guid,
    ctx: Arc<ServerContext>,
    loaded: RwLock<Option<Loaded>>,
}

impl DispatchAdapter {
    /// Create an adapter resolving members of the dual interface `diid`
    pub fn new(diid: Guid, ctx: Arc<ServerContext>) -> Self {
        Self {
            diid,
            ctx,
            loaded: RwLock::new(None),
        }
    }

    /// The dual interface this adapter binds
    pub fn diid(&self) -> Guid {
        self.diid
    }

    /// Number of type information sources: always exactly one
    pub fn get_type_info_count(&self) -> u32 {
        1
    }

    /// The type information; only index 0 exists
    pub fn get_type_info(&self, index: u32) -> Result<Arc<dyn TypeInfo>> {
        if index != 0 {
            return Err(ComError::BadTypeInfoIndex(index));
        }
        self.load()
    }

    /// Resolve member names, delegating entirely to the type information
    pub fn get_ids_of_names(&self, names: &[&str]) -> Result<Vec<DispId>> {
        self.load()?.ids_of_names(names)
    }

    /// Invoke a member with the hosting object as the dispatch target.
    ///
    /// Any stale thread error record is cleared before delegating.
    pub fn invoke(
        &self,
        target: &dyn Any,
        member: DispId,
        kind: InvokeKind,
        args: &[Variant],
    ) -> Result<Variant> {
        let type_info = self.load()?;
        error_info::clear_error_info();
        type_info.invoke(target, member, kind, args)
    }

    fn load(&self) -> Result<Arc<dyn TypeInfo>> {
        if let Some(loaded) = self.loaded.read().unwrap().as_ref() {
            return Ok(loaded.type_info.clone());
        }

        let mut slot = self.loaded.write().unwrap();
        if let Some(loaded) = slot.as_ref() {
            return Ok(loaded.type_info.clone());
        }

        let library = self.ctx.load_type_library()?;
        let type_info = library
            .type_info_of_guid(&self.diid)
            .map_err(|err| match err {
                ComError::TypeInfoNotFound { status, iid, .. } => {
                    // Enrich the diagnostic with the registered name, when
                    // the interface is known to the registry at all.
                    let name = comreg::lookup_iid_name(
                        self.ctx.module().classes_store.as_ref(),
                        &iid,
                    );
                    ComError::TypeInfoNotFound { status, iid, name }
                }
                other => other,
            })?;

        *slot = Some(Loaded {
            library,
            type_info: type_info.clone(),
        });
        Ok(type_info)
    }
}
