//! Security policy for hook targets.
//!
//! The policy decides, before any dispatch handler is installed, whether a
//! method may be intercepted at all. Checks run in a fixed order and the
//! first match wins:
//!
//! 1. The declaring type lives in a denied namespace or a dotted
//!    sub-namespace of one.
//! 2. The method is marked as non-hookable, either in its metadata or via
//!    the policy's out-of-band method deny-list.
//! 3. The method is externally implemented and has no interceptable body.

use crate::metadata::MethodDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespaces denied by [`SecurityPolicy::default`]: the bridge framework,
/// the host's base library and the texture-mod layer.
pub const DEFAULT_DENIED_NAMESPACES: &[&str] = &["ETGMod", "System", "TexMod"];

/// Why a method may not be hooked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    #[error("namespace '{namespace}' is protected (denied by '{entry}')")]
    DeniedNamespace { namespace: String, entry: String },

    #[error("method is marked as non-hookable")]
    NotHookable,

    #[error("method is externally implemented and has no interceptable body")]
    ExternallyImplemented,
}

/// Allow/forbid predicate over method descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    /// Namespace prefixes that may never be hooked.
    denied_namespaces: Vec<String>,

    /// Methods that may never be hooked, as `Namespace.Type::Method`.
    denied_methods: Vec<String>,
}

impl SecurityPolicy {
    /// Create a policy that denies nothing by namespace or name. Methods that
    /// are marked non-hookable or externally implemented are still rejected.
    pub fn new() -> Self {
        Self {
            denied_namespaces: Vec::new(),
            denied_methods: Vec::new(),
        }
    }

    /// Create a policy from a list of denied namespace prefixes.
    pub fn from_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denied_namespaces = namespaces
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        Self {
            denied_namespaces,
            denied_methods: Vec::new(),
        }
    }

    /// Deny a namespace and all its sub-namespaces.
    pub fn deny_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        if !self.denied_namespaces.contains(&namespace) {
            self.denied_namespaces.push(namespace);
        }
    }

    /// Deny a single method by `Namespace.Type::Method`.
    pub fn deny_method(&mut self, full_name: impl Into<String>) {
        let full_name = full_name.into();
        if !self.denied_methods.contains(&full_name) {
            self.denied_methods.push(full_name);
        }
    }

    /// Get the denied namespace prefixes.
    pub fn denied_namespaces(&self) -> &[String] {
        &self.denied_namespaces
    }

    /// Get the denied method names.
    pub fn denied_methods(&self) -> &[String] {
        &self.denied_methods
    }

    /// Find the deny-list entry covering a namespace, if any.
    pub fn denied_entry_for(&self, namespace: &str) -> Option<&str> {
        self.denied_namespaces
            .iter()
            .map(String::as_str)
            .find(|entry| covers(entry, namespace))
    }

    /// Decide whether a method is forbidden. Pure; no side effects.
    pub fn is_forbidden(&self, method: &MethodDescriptor) -> Option<ForbiddenReason> {
        let namespace = method.declaring_type.namespace();
        if let Some(entry) = self.denied_entry_for(namespace) {
            return Some(ForbiddenReason::DeniedNamespace {
                namespace: namespace.to_string(),
                entry: entry.to_string(),
            });
        }

        if method.no_hook || self.denied_methods.contains(&method.full_name()) {
            return Some(ForbiddenReason::NotHookable);
        }

        if method.external {
            return Some(ForbiddenReason::ExternallyImplemented);
        }

        None
    }

    /// Check if a method may be hooked.
    pub fn allows(&self, method: &MethodDescriptor) -> bool {
        self.is_forbidden(method).is_none()
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::from_namespaces(DEFAULT_DENIED_NAMESPACES)
    }
}

/// `namespace == entry || namespace.starts_with(entry + ".")`
fn covers(entry: &str, namespace: &str) -> bool {
    match namespace.strip_prefix(entry) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
