//! Hook manager: registration and dispatch.
//!
//! One manager exists per scripting environment. It owns the hook table and
//! the security policy, and is dropped (or [disposed](HookManager::dispose))
//! when the environment tears down.

use crate::installer::InterceptionInstaller;
use crate::marshal::{marshal_arguments, unmarshal_override, DispatchFrame};
use crate::parse::parse_request;
use crate::script::{Retained, ScopedList, ScriptRuntime};
use crate::table::{HookEntry, HookInfo, HookTable};
use hookbridge_runtime::{
    admit, DispatchError, HookRequest, MethodResolver, MethodToken, NativeValue,
    RegistrationError, RegistrationResult, SecurityPolicy,
};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Result of dispatching an intercepted call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// No hook is registered for the method.
    NotHooked,
    /// The hook ran; the native implementation runs as usual.
    Observed,
    /// The hook replaced the native return value.
    Overridden(NativeValue),
}

impl DispatchOutcome {
    /// Whether the native return value was overridden.
    pub fn is_overridden(&self) -> bool {
        matches!(self, DispatchOutcome::Overridden(_))
    }

    /// The override value, if any.
    pub fn value(&self) -> Option<&NativeValue> {
        match self {
            DispatchOutcome::Overridden(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<NativeValue> {
        match self {
            DispatchOutcome::Overridden(value) => Some(value),
            _ => None,
        }
    }
}

/// Registers script hooks on native methods and dispatches intercepted calls
/// to them.
pub struct HookManager<R: ScriptRuntime> {
    runtime: Arc<R>,
    installer: Arc<dyn InterceptionInstaller>,
    resolver: Arc<dyn MethodResolver>,
    policy: SecurityPolicy,
    table: HookTable<R>,
}

impl<R: ScriptRuntime> HookManager<R> {
    /// Create a manager with the default security policy.
    pub fn new(
        runtime: Arc<R>,
        installer: Arc<dyn InterceptionInstaller>,
        resolver: Arc<dyn MethodResolver>,
    ) -> Self {
        Self {
            runtime,
            installer,
            resolver,
            policy: SecurityPolicy::default(),
            table: HookTable::new(),
        }
    }

    /// Replace the security policy.
    pub fn with_policy(mut self, policy: SecurityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn runtime(&self) -> &Arc<R> {
        &self.runtime
    }

    /// Register `callback` as the hook described by a script descriptor.
    ///
    /// Both values stay owned by the caller; the manager takes its own
    /// reference to the callback.
    pub fn add(&self, descriptor: &R::Value, callback: &R::Value) -> RegistrationResult<MethodToken> {
        let request = parse_request(&*self.runtime, descriptor).map_err(|e| {
            debug!("Rejected hook descriptor: {}", e);
            e
        })?;
        self.add_request(&request, callback)
    }

    /// Register `callback` for an already-parsed request.
    ///
    /// On error nothing is installed and the hook table is unchanged. A
    /// second registration for the same method replaces the first.
    pub fn add_request(
        &self,
        request: &HookRequest,
        callback: &R::Value,
    ) -> RegistrationResult<MethodToken> {
        let method = admit(&*self.resolver, &self.policy, request)?;
        let return_type = request.returns.then(|| method.return_type.clone());

        let callback = Retained::retain(&self.runtime, callback)
            .map_err(|source| RegistrationError::Script {
                field: "callback",
                source,
            })?;

        self.installer
            .install_dispatch_handler(&method)
            .map_err(|source| RegistrationError::Install {
                method: method.to_string(),
                source,
            })?;
        let token = self.installer.identity_token_of(&method);

        let entry = HookEntry::new(token, Arc::clone(&method), callback, return_type);
        if let Some(previous) = self.table.insert(entry) {
            warn!(
                "Replaced existing hook on {} (token {})",
                previous.method(),
                token
            );
        }

        info!("Hooked {} as token {}", method, token);
        Ok(token)
    }

    /// Dispatch an intercepted call to its hook.
    ///
    /// Called by the interception installer on the calling native thread.
    /// A method without a hook returns [`DispatchOutcome::NotHooked`] without
    /// touching the script engine. Values marshaled for the call are
    /// released before this returns, including when the hook fails.
    pub fn try_run(
        &self,
        token: MethodToken,
        frame: DispatchFrame<'_>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(entry) = self.table.get(token) else {
            return Ok(DispatchOutcome::NotHooked);
        };

        trace!("Dispatching {} to hook (token {})", entry.method(), token);

        let runtime = &*self.runtime;
        let args = marshal_arguments(runtime, entry.method(), &frame)?;

        let results = runtime
            .call(entry.callback(), args.as_slice())
            .map_err(|source| DispatchError::Invocation {
                method: entry.method().to_string(),
                source,
            })?;
        let results = ScopedList::from_vec(runtime, results);

        match entry.return_type() {
            Some(return_type) => {
                unmarshal_override(runtime, entry.method(), results, return_type)
                    .map(DispatchOutcome::Overridden)
            }
            None => Ok(DispatchOutcome::Observed),
        }
    }

    /// Check if a method token has a hook.
    pub fn is_hooked(&self, token: MethodToken) -> bool {
        self.table.contains(token)
    }

    /// Get the number of registered hooks.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// List registered hooks.
    pub fn hooks(&self) -> Vec<HookInfo> {
        self.table.infos()
    }

    /// Drop every hook and release the callbacks they hold.
    ///
    /// Callbacks still in use by an in-flight dispatch are released when
    /// that dispatch finishes. Calling this again is a no-op.
    pub fn dispose(&self) -> usize {
        let released = self.table.clear();
        if released > 0 {
            info!("Disposed {} hooks", released);
        }
        released
    }
}
