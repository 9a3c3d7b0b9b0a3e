//! Native values and type references.
//!
//! These are the host-side halves of everything that crosses the bridge: the
//! receiver and arguments of an intercepted call, the override value a hook
//! hands back, and the type handles used to describe method signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Full name of the native `void` type.
const VOID: &str = "System.Void";

/// A native type, identified by namespace and simple name.
///
/// Serialized as its dotted full name (`"Game.Player"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeRef {
    namespace: String,
    name: String,
}

impl TypeRef {
    /// Create a type reference from its parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a dotted full name. The last segment is the simple name; a name
    /// without dots lives in the global namespace.
    pub fn parse(full_name: &str) -> Self {
        match full_name.rsplit_once('.') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::new("", full_name),
        }
    }

    /// The `void` return type.
    pub fn void() -> Self {
        Self::parse(VOID)
    }

    /// Check whether this is the `void` type.
    pub fn is_void(&self) -> bool {
        self.namespace == "System" && self.name == "Void"
    }

    /// The namespace, empty for the global namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted full name.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

impl From<&str> for TypeRef {
    fn from(full_name: &str) -> Self {
        Self::parse(full_name)
    }
}

impl From<String> for TypeRef {
    fn from(full_name: String) -> Self {
        Self::parse(&full_name)
    }
}

impl From<TypeRef> for String {
    fn from(type_ref: TypeRef) -> Self {
        type_ref.full_name()
    }
}

/// Reference to a live host object.
///
/// The handle is issued by the host; the bridge only carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Runtime type of the object.
    pub type_ref: TypeRef,
    /// Host-issued identity.
    pub handle: u64,
}

/// A value on the native side of the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Null reference.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Any other host object.
    Object(ObjectRef),
}

impl NativeValue {
    /// Check if this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            NativeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            NativeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            NativeValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Short name of the value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) => "int",
            NativeValue::Float(_) => "float",
            NativeValue::String(_) => "string",
            NativeValue::Object(_) => "object",
        }
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Int(i)
    }
}

impl From<i32> for NativeValue {
    fn from(i: i32) -> Self {
        NativeValue::Int(i64::from(i))
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> Self {
        NativeValue::Float(f)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<ObjectRef> for NativeValue {
    fn from(o: ObjectRef) -> Self {
        NativeValue::Object(o)
    }
}
