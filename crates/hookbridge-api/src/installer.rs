//! Interception installer capability.
//!
//! The installer is the component that physically redirects a native
//! method's control flow into [`HookManager::try_run`](crate::HookManager::try_run).
//! The bridge only asks it to install a handler and to name the method.

use hookbridge_runtime::{InstallError, MethodDescriptor, MethodToken};

/// Redirects native methods into the bridge's dispatcher.
pub trait InterceptionInstaller: Send + Sync {
    /// Install the dispatch handler for a method.
    ///
    /// Must be idempotent: installing twice for the same method is safe and
    /// keeps the same identity token.
    fn install_dispatch_handler(&self, method: &MethodDescriptor) -> Result<(), InstallError>;

    /// The stable identity token of a method.
    fn identity_token_of(&self, method: &MethodDescriptor) -> MethodToken;
}
