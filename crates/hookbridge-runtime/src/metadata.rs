//! Method metadata and signature-based resolution.
//!
//! Methods are described by a static [`MethodTable`] instead of runtime
//! reflection. A table can be built in code or loaded from TOML files that
//! list each type and its methods:
//!
//! ```toml
//! [[type]]
//! namespace = "Game"
//! name = "Player"
//!
//! [[type.method]]
//! name = "Damage"
//! params = ["System.Single"]
//! returns = "System.Boolean"
//! ```

use crate::error::{MetadataError, MetadataResult, ResolutionError};
use crate::value::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Opaque identity of one intercepted method, issued by the interception
/// installer. Never reused for a different method within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodToken(pub u64);

impl fmt::Display for MethodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    NonPublic,
}

impl Visibility {
    pub fn from_public(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::NonPublic
        }
    }
}

/// Whether a method binds to an instance or to its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Instance,
    Static,
}

impl Binding {
    pub fn from_instance(instance: bool) -> Self {
        if instance {
            Binding::Instance
        } else {
            Binding::Static
        }
    }
}

/// Description of one native method. Immutable once placed in a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub declaring_type: TypeRef,
    pub name: String,
    pub params: Vec<TypeRef>,
    pub binding: Binding,
    pub visibility: Visibility,
    /// `System.Void` for methods without a return value.
    pub return_type: TypeRef,
    /// Implemented outside managed code (extern or native stub).
    pub external: bool,
    /// Explicitly marked as non-hookable, on the method or its declaring type.
    pub no_hook: bool,
}

impl MethodDescriptor {
    /// A public, parameterless, void instance method.
    pub fn new(declaring_type: TypeRef, name: impl Into<String>) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            params: Vec::new(),
            binding: Binding::Instance,
            visibility: Visibility::Public,
            return_type: TypeRef::void(),
            external: false,
            no_hook: false,
        }
    }

    pub fn with_params<I, T>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn returning(mut self, return_type: impl Into<TypeRef>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn no_hook(mut self) -> Self {
        self.no_hook = true;
        self
    }

    pub fn is_static(&self) -> bool {
        self.binding == Binding::Static
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// `Namespace.Type::Method`
    pub fn full_name(&self) -> String {
        format!("{}::{}", self.declaring_type, self.name)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring_type, self.name)?;
        write_params(f, &self.params)?;
        f.write_str(")")
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[TypeRef]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", param)?;
    }
    Ok(())
}

/// A structural method signature to resolve.
#[derive(Debug, Clone, Copy)]
pub struct MethodQuery<'a> {
    pub declaring_type: &'a TypeRef,
    pub name: &'a str,
    /// Exact parameter types. `None` picks the first method with this name.
    pub params: Option<&'a [TypeRef]>,
    pub binding: Binding,
    pub visibility: Visibility,
}

impl MethodQuery<'_> {
    /// Check whether a method satisfies every filter of this query.
    pub fn matches(&self, method: &MethodDescriptor) -> bool {
        method.name == self.name
            && method.binding == self.binding
            && method.visibility == self.visibility
            && self
                .params
                .map_or(true, |params| method.params.as_slice() == params)
    }
}

impl fmt::Display for MethodQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visibility = match self.visibility {
            Visibility::Public => "public",
            Visibility::NonPublic => "non-public",
        };
        let binding = match self.binding {
            Binding::Instance => "instance",
            Binding::Static => "static",
        };
        write!(f, "{} {} {}::{}", visibility, binding, self.declaring_type, self.name)?;
        match self.params {
            Some(params) => {
                f.write_str("(")?;
                write_params(f, params)?;
                f.write_str(")")
            }
            None => f.write_str("(..)"),
        }
    }
}

/// Finds the unique method descriptor for a structural signature.
pub trait MethodResolver: Send + Sync {
    fn resolve(&self, query: &MethodQuery<'_>) -> Result<Arc<MethodDescriptor>, ResolutionError>;
}

/// Static method-metadata table, keyed by declaring type.
///
/// Methods keep declaration order within each type, so name-only resolution
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    types: HashMap<TypeRef, Vec<Arc<MethodDescriptor>>>,
}

impl MethodTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register a type with no methods yet.
    pub fn declare_type(&mut self, type_ref: TypeRef) {
        self.types.entry(type_ref).or_default();
    }

    /// Append a method to its declaring type.
    pub fn insert(&mut self, method: MethodDescriptor) -> Arc<MethodDescriptor> {
        let method = Arc::new(method);
        self.types
            .entry(method.declaring_type.clone())
            .or_default()
            .push(Arc::clone(&method));
        method
    }

    /// Merge another table into this one. Methods of a type present in both
    /// are appended after the existing ones.
    pub fn merge(&mut self, other: MethodTable) {
        for (type_ref, methods) in other.types {
            self.types.entry(type_ref).or_default().extend(methods);
        }
    }

    /// Load a table from a TOML file.
    pub fn from_file(path: &Path) -> MetadataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a table from a TOML string.
    pub fn from_str(content: &str) -> MetadataResult<Self> {
        let file: MetadataFile = toml::from_str(content)?;
        let mut table = Self::new();

        for entry in file.types {
            if entry.name.is_empty() {
                return Err(MetadataError::Invalid(
                    "Type name cannot be empty".to_string(),
                ));
            }
            if entry.name.contains('.') {
                return Err(MetadataError::Invalid(format!(
                    "Type name {} cannot contain '.'; declare the prefix as its namespace",
                    entry.name
                )));
            }
            let type_ref = TypeRef::new(entry.namespace, entry.name);
            table.declare_type(type_ref.clone());

            for method in entry.methods {
                if method.name.is_empty() {
                    return Err(MetadataError::Invalid(format!(
                        "Method name cannot be empty in type {}",
                        type_ref
                    )));
                }
                table.insert(MethodDescriptor {
                    declaring_type: type_ref.clone(),
                    name: method.name,
                    params: method.params,
                    binding: Binding::from_instance(!method.is_static),
                    visibility: Visibility::from_public(method.public),
                    return_type: method.returns.unwrap_or_else(TypeRef::void),
                    external: method.external,
                    no_hook: method.no_hook || entry.no_hook,
                });
            }
        }

        Ok(table)
    }

    /// Check if a type is known.
    pub fn contains_type(&self, type_ref: &TypeRef) -> bool {
        self.types.contains_key(type_ref)
    }

    /// Methods declared on a type, in declaration order.
    pub fn methods_of(&self, type_ref: &TypeRef) -> &[Arc<MethodDescriptor>] {
        self.types.get(type_ref).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get the number of known types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Get the number of methods across all types.
    pub fn len(&self) -> usize {
        self.types.values().map(Vec::len).sum()
    }

    /// Check if the table holds no methods.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every method.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.types.values().flatten()
    }
}

impl MethodResolver for MethodTable {
    fn resolve(&self, query: &MethodQuery<'_>) -> Result<Arc<MethodDescriptor>, ResolutionError> {
        let methods = self
            .types
            .get(query.declaring_type)
            .ok_or_else(|| ResolutionError::UnknownType(query.declaring_type.full_name()))?;

        methods
            .iter()
            .find(|method| query.matches(method))
            .cloned()
            .ok_or_else(|| ResolutionError::NoMatch(query.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct MetadataFile {
    #[serde(default, rename = "type")]
    types: Vec<TypeEntry>,
}

#[derive(Debug, Deserialize)]
struct TypeEntry {
    #[serde(default)]
    namespace: String,
    name: String,
    /// Marks every method of the type as non-hookable.
    #[serde(default)]
    no_hook: bool,
    #[serde(default, rename = "method")]
    methods: Vec<MethodEntry>,
}

#[derive(Debug, Deserialize)]
struct MethodEntry {
    name: String,
    #[serde(default)]
    params: Vec<TypeRef>,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default = "default_true")]
    public: bool,
    #[serde(default)]
    returns: Option<TypeRef>,
    #[serde(default)]
    external: bool,
    #[serde(default)]
    no_hook: bool,
}

fn default_true() -> bool {
    true
}
