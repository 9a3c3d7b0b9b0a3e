//! Hook registration requests.
//!
//! A [`HookRequest`] is the validated form of what a script submits when it
//! asks to hook a method. Requests can also be listed in a TOML hook
//! manifest:
//!
//! ```toml
//! [[hook]]
//! type = "Game.Player"
//! method = "Damage"
//! args = ["System.Int32"]
//! returns = true
//! ```

use crate::error::{MetadataError, MetadataResult, RegistrationError, RegistrationResult};
use crate::metadata::{Binding, MethodDescriptor, MethodQuery, MethodResolver, Visibility};
use crate::policy::SecurityPolicy;
use crate::value::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A request to hook one native method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRequest {
    /// Declaring type of the target method.
    #[serde(rename = "type")]
    pub target: TypeRef,

    /// Method name.
    pub method: String,

    /// Exact parameter types. Absent means "first method with this name".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<TypeRef>>,

    /// Instance (true) or static (false) method.
    #[serde(default = "default_true")]
    pub instance: bool,

    /// Public (true) or non-public (false) method.
    #[serde(default = "default_true")]
    pub public: bool,

    /// Whether the hook's first result overrides the native return value.
    #[serde(default)]
    pub returns: bool,
}

fn default_true() -> bool {
    true
}

impl HookRequest {
    /// A request for a public instance method, resolved by name only.
    pub fn new(target: impl Into<TypeRef>, method: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
            args: None,
            instance: true,
            public: true,
            returns: false,
        }
    }

    pub fn with_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeRef>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn static_method(mut self) -> Self {
        self.instance = false;
        self
    }

    pub fn non_public(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn overriding_return(mut self) -> Self {
        self.returns = true;
        self
    }

    pub fn binding(&self) -> Binding {
        Binding::from_instance(self.instance)
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::from_public(self.public)
    }

    /// The resolution query for this request.
    pub fn query(&self) -> MethodQuery<'_> {
        MethodQuery {
            declaring_type: &self.target,
            name: &self.method,
            params: self.args.as_deref(),
            binding: self.binding(),
            visibility: self.visibility(),
        }
    }

    /// Validate the request shape.
    pub fn validate(&self) -> RegistrationResult<()> {
        if self.target.name().is_empty() {
            return Err(RegistrationError::invalid("type", "target type cannot be empty"));
        }

        if self.method.is_empty() {
            return Err(RegistrationError::invalid(
                "method",
                "method name must be a non-empty string",
            ));
        }

        Ok(())
    }
}

impl fmt::Display for HookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query(), f)
    }
}

/// Resolve a request and run it through the security policy.
///
/// This is the pure part of registration: no dispatch handler is installed
/// and no hook table is touched.
pub fn admit(
    resolver: &dyn MethodResolver,
    policy: &SecurityPolicy,
    request: &HookRequest,
) -> RegistrationResult<Arc<MethodDescriptor>> {
    request.validate()?;

    let method = resolver.resolve(&request.query()).map_err(|e| {
        debug!("Resolution failed for {}: {}", request, e);
        RegistrationError::from(e)
    })?;

    if let Some(reason) = policy.is_forbidden(&method) {
        debug!("Policy rejected {}: {}", method, reason);
        return Err(RegistrationError::Forbidden {
            method: method.to_string(),
            reason,
        });
    }

    Ok(method)
}

/// A list of hook requests loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookManifest {
    #[serde(default, rename = "hook")]
    pub hooks: Vec<HookRequest>,
}

impl HookManifest {
    /// Load a manifest from a TOML file.
    pub fn from_file(path: &Path) -> MetadataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a manifest from a TOML string.
    pub fn from_str(content: &str) -> MetadataResult<Self> {
        let manifest: HookManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> MetadataResult<()> {
        for (i, hook) in self.hooks.iter().enumerate() {
            hook.validate().map_err(|e| {
                MetadataError::InvalidManifest(format!("hook #{}: {}", i + 1, e))
            })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
