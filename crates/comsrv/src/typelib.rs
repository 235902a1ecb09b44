//! Type libraries and type information.
//!
//! Late binding resolves member names to dispatch identifiers and invokes
//! them through type information loaded from the hosting module's own type
//! library. The library, its per-interface type information and the loader
//! are seams to the OS type-library machinery; the in-memory
//! implementations here describe interfaces directly in Rust for tests,
//! demos and servers that carry no binary type library.

use crate::error::{hresult, ComError, Result};
use comreg::{Guid, TypeLibId};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// A member's dispatch identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DispId(pub i32);

impl DispId {
    /// The default member
    pub const VALUE: Self = Self(0);
    /// The unknown member
    pub const UNKNOWN: Self = Self(-1);
}

impl fmt::Display for DispId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a member is invoked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// Plain method call (DISPATCH_METHOD)
    Method,
    /// Property read (DISPATCH_PROPERTYGET)
    PropertyGet,
    /// Property write by value (DISPATCH_PROPERTYPUT)
    PropertyPut,
    /// Property write by reference (DISPATCH_PROPERTYPUTREF)
    PropertyPutRef,
}

impl InvokeKind {
    /// The DISPATCH_* wire flag for this kind
    pub fn flag(&self) -> u16 {
        match self {
            Self::Method => 0x1,
            Self::PropertyGet => 0x2,
            Self::PropertyPut => 0x4,
            Self::PropertyPutRef => 0x8,
        }
    }
}

/// A late-bound value
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Variant {
    /// VT_EMPTY
    #[default]
    Empty,
    /// VT_NULL
    Null,
    /// VT_BOOL
    Bool(bool),
    /// VT_I4
    I4(i32),
    /// VT_I8
    I8(i64),
    /// VT_R8
    R8(f64),
    /// VT_BSTR
    Str(String),
}

impl Variant {
    /// The boolean payload, if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The 32-bit integer payload, if this is an I4
    pub fn as_i4(&self) -> Option<i32> {
        match self {
            Self::I4(value) => Some(*value),
            _ => None,
        }
    }

    /// The string payload, if this is a Str
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::I4(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Self::R8(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Handler backing one member of an in-memory type info
pub type MemberHandler = Arc<dyn Fn(&dyn Any, &[Variant]) -> Result<Variant> + Send + Sync>;

/// Type information for one interface
pub trait TypeInfo: fmt::Debug + Send + Sync {
    /// The interface this type information describes
    fn guid(&self) -> Guid;

    /// Resolve member names to dispatch identifiers, case-insensitively.
    /// Fails with `UnknownName` on the first unresolvable name.
    fn ids_of_names(&self, names: &[&str]) -> Result<Vec<DispId>>;

    /// Invoke a member with the hosting object as the dispatch target
    fn invoke(
        &self,
        target: &dyn Any,
        member: DispId,
        kind: InvokeKind,
        args: &[Variant],
    ) -> Result<Variant>;
}

/// A loaded type library
pub trait TypeLibrary: fmt::Debug + Send + Sync {
    /// The library identifier
    fn libid(&self) -> Guid;

    /// Major and minor version
    fn version(&self) -> (u16, u16);

    /// Type information for the interface with the given identifier
    fn type_info_of_guid(&self, iid: &Guid) -> Result<Arc<dyn TypeInfo>>;
}

/// Loads a module's embedded type library from its file path
pub trait TypeLibLoader: Send + Sync {
    /// Load the type library held by the file
    fn load(&self, path: &Path) -> Result<Arc<dyn TypeLibrary>>;
}

/// In-memory type information, built from registered members.
pub struct MemoryTypeInfo {
    guid: Guid,
    names: HashMap<String, DispId>,
    handlers: HashMap<(DispId, InvokeKind), MemberHandler>,
}

impl MemoryTypeInfo {
    /// Start describing an interface
    pub fn builder(guid: Guid) -> MemoryTypeInfoBuilder {
        MemoryTypeInfoBuilder {
            info: Self {
                guid,
                names: HashMap::new(),
                handlers: HashMap::new(),
            },
        }
    }
}

/// Builder registering the members of a [`MemoryTypeInfo`]
pub struct MemoryTypeInfoBuilder {
    info: MemoryTypeInfo,
}

impl MemoryTypeInfoBuilder {
    /// Register a method member
    pub fn method(
        self,
        name: &str,
        id: DispId,
        handler: impl Fn(&dyn Any, &[Variant]) -> Result<Variant> + Send + Sync + 'static,
    ) -> Self {
        self.member(name, id, InvokeKind::Method, handler)
    }

    /// Register a property getter
    pub fn property_get(
        self,
        name: &str,
        id: DispId,
        handler: impl Fn(&dyn Any, &[Variant]) -> Result<Variant> + Send + Sync + 'static,
    ) -> Self {
        self.member(name, id, InvokeKind::PropertyGet, handler)
    }

    /// Register a property setter
    pub fn property_put(
        self,
        name: &str,
        id: DispId,
        handler: impl Fn(&dyn Any, &[Variant]) -> Result<Variant> + Send + Sync + 'static,
    ) -> Self {
        self.member(name, id, InvokeKind::PropertyPut, handler)
    }

    /// Register a member under an explicit invoke kind
    pub fn member(
        mut self,
        name: &str,
        id: DispId,
        kind: InvokeKind,
        handler: impl Fn(&dyn Any, &[Variant]) -> Result<Variant> + Send + Sync + 'static,
    ) -> Self {
        self.info.names.insert(name.to_ascii_lowercase(), id);
        self.info.handlers.insert((id, kind), Arc::new(handler));
        self
    }

    /// Finish the description
    pub fn build(self) -> Arc<MemoryTypeInfo> {
        Arc::new(self.info)
    }
}

impl fmt::Debug for MemoryTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTypeInfo")
            .field("guid", &self.guid)
            .field("members", &self.handlers.len())
            .finish()
    }
}

impl TypeInfo for MemoryTypeInfo {
    fn guid(&self) -> Guid {
        self.guid
    }

    fn ids_of_names(&self, names: &[&str]) -> Result<Vec<DispId>> {
        names
            .iter()
            .map(|name| {
                self.names
                    .get(&name.to_ascii_lowercase())
                    .copied()
                    .ok_or_else(|| ComError::UnknownName((*name).to_string()))
            })
            .collect()
    }

    fn invoke(
        &self,
        target: &dyn Any,
        member: DispId,
        kind: InvokeKind,
        args: &[Variant],
    ) -> Result<Variant> {
        let handler = self
            .handlers
            .get(&(member, kind))
            .ok_or(ComError::MemberNotFound(member))?;
        handler(target, args)
    }
}

/// In-memory type library: a set of interface descriptions under one LIBID.
pub struct MemoryTypeLibrary {
    id: TypeLibId,
    infos: HashMap<Guid, Arc<dyn TypeInfo>>,
}

impl MemoryTypeLibrary {
    /// Create an empty library
    pub fn new(id: TypeLibId) -> Self {
        Self {
            id,
            infos: HashMap::new(),
        }
    }

    /// Add an interface description
    pub fn add_interface(&mut self, info: Arc<dyn TypeInfo>) {
        self.infos.insert(info.guid(), info);
    }
}

impl fmt::Debug for MemoryTypeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTypeLibrary")
            .field("id", &self.id)
            .field("interfaces", &self.infos.len())
            .finish()
    }
}

impl TypeLibrary for MemoryTypeLibrary {
    fn libid(&self) -> Guid {
        self.id.libid
    }

    fn version(&self) -> (u16, u16) {
        (self.id.major, self.id.minor)
    }

    fn type_info_of_guid(&self, iid: &Guid) -> Result<Arc<dyn TypeInfo>> {
        self.infos
            .get(iid)
            .cloned()
            .ok_or_else(|| ComError::TypeInfoNotFound {
                status: hresult::TYPE_E_ELEMENTNOTFOUND,
                iid: *iid,
                name: String::new(),
            })
    }
}

/// In-memory loader mapping file paths to libraries.
#[derive(Default)]
pub struct MemoryTypeLibLoader {
    libraries: RwLock<HashMap<PathBuf, Arc<dyn TypeLibrary>>>,
}

impl MemoryTypeLibLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a library loadable from the given path
    pub fn add_library(&self, path: impl Into<PathBuf>, library: Arc<dyn TypeLibrary>) {
        let mut libraries = self.libraries.write().unwrap();
        libraries.insert(path.into(), library);
    }
}

impl TypeLibLoader for MemoryTypeLibLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn TypeLibrary>> {
        let libraries = self.libraries.read().unwrap();
        libraries
            .get(path)
            .cloned()
            .ok_or_else(|| ComError::TypeLibLoad {
                status: hresult::TYPE_E_CANTLOADLIBRARY,
                path: path.to_path_buf(),
            })
    }
}
