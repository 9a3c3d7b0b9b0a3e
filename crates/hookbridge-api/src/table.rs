//! Hook table mapping method tokens to registered hooks.
//!
//! The table is shared between registration (writer) and dispatch (readers,
//! possibly on many native threads). Locks are held only long enough to
//! clone an entry's `Arc`; callbacks never run under the lock.

use crate::script::{Retained, ScriptRuntime};
use hookbridge_runtime::{MethodDescriptor, MethodToken, TypeRef};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered hook.
///
/// The callback reference is released when the last `Arc` to the entry is
/// dropped: on replacement, on disposal, or after an in-flight dispatch
/// that still held it completes.
pub struct HookEntry<R: ScriptRuntime> {
    token: MethodToken,
    method: Arc<MethodDescriptor>,
    callback: Retained<R>,
    return_type: Option<TypeRef>,
}

impl<R: ScriptRuntime> HookEntry<R> {
    pub fn new(
        token: MethodToken,
        method: Arc<MethodDescriptor>,
        callback: Retained<R>,
        return_type: Option<TypeRef>,
    ) -> Self {
        Self {
            token,
            method,
            callback,
            return_type,
        }
    }

    pub fn token(&self) -> MethodToken {
        self.token
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn callback(&self) -> &R::Value {
        self.callback.get()
    }

    /// Native type an override value is coerced to, when the hook overrides
    /// the return value.
    pub fn return_type(&self) -> Option<&TypeRef> {
        self.return_type.as_ref()
    }

    pub fn info(&self) -> HookInfo {
        HookInfo {
            token: self.token,
            method: self.method.to_string(),
            return_type: self.return_type.clone(),
        }
    }
}

/// Summary of a registered hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInfo {
    pub token: MethodToken,
    pub method: String,
    pub return_type: Option<TypeRef>,
}

/// Registry of hooks keyed by method token.
pub struct HookTable<R: ScriptRuntime> {
    entries: RwLock<HashMap<MethodToken, Arc<HookEntry<R>>>>,
}

impl<R: ScriptRuntime> HookTable<R> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store an entry under its token, returning the entry it replaced.
    ///
    /// The replaced entry is returned rather than dropped so its callback
    /// is released after the write lock is gone.
    pub fn insert(&self, entry: HookEntry<R>) -> Option<Arc<HookEntry<R>>> {
        self.entries.write().insert(entry.token, Arc::new(entry))
    }

    /// Look up the entry for a token.
    pub fn get(&self, token: MethodToken) -> Option<Arc<HookEntry<R>>> {
        self.entries.read().get(&token).cloned()
    }

    /// Check if a token has a hook.
    pub fn contains(&self, token: MethodToken) -> bool {
        self.entries.read().contains_key(&token)
    }

    /// Get the number of hooks.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// List all hooks, ordered by token.
    pub fn infos(&self) -> Vec<HookInfo> {
        let mut infos: Vec<HookInfo> = self.entries.read().values().map(|e| e.info()).collect();
        infos.sort_by_key(|info| info.token);
        infos
    }

    /// Remove every entry. Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.write());
        let count = drained.len();
        drop(drained);
        count
    }
}

impl<R: ScriptRuntime> Default for HookTable<R> {
    fn default() -> Self {
        Self::new()
    }
}
