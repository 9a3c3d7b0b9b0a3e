//! Script runtime capability and release guards.
//!
//! The bridge never manipulates script values directly. It asks the
//! [`ScriptRuntime`] to wrap, read, call and coerce them, and hands every
//! value it receives to a guard that calls [`ScriptRuntime::release`] when
//! the guard is dropped.

use hookbridge_runtime::{NativeValue, ScriptError, TypeRef};
use std::ops::Deref;
use std::sync::Arc;

/// Operations the embedded script engine provides to the bridge.
///
/// Every method that returns a `Self::Value` hands ownership of one
/// reference to the caller, which must eventually pass it to
/// [`release`](ScriptRuntime::release).
pub trait ScriptRuntime: Send + Sync {
    /// Handle to a value living inside the script engine.
    type Value: Send + Sync;

    /// Wrap a native value for the script side.
    fn wrap(&self, value: &NativeValue) -> Result<Self::Value, ScriptError>;

    /// Convert a script value to a native value of the expected type.
    fn coerce(&self, value: &Self::Value, expected: &TypeRef) -> Result<NativeValue, ScriptError>;

    /// Call a script function. Returns every result value, in order.
    fn call(
        &self,
        function: &Self::Value,
        args: &[Self::Value],
    ) -> Result<Vec<Self::Value>, ScriptError>;

    /// Take an additional reference to a value so it outlives the call that
    /// produced it.
    fn retain(&self, value: &Self::Value) -> Result<Self::Value, ScriptError>;

    /// Give a reference back to the engine.
    fn release(&self, value: Self::Value);

    /// Check whether a value is nil.
    fn is_nil(&self, value: &Self::Value) -> bool;

    /// Read a named field of a table. Missing fields read as nil.
    fn get_field(&self, table: &Self::Value, key: &str) -> Result<Self::Value, ScriptError>;

    /// Read the element at a zero-based position of a sequence. Positions
    /// past the end read as nil.
    fn get_index(&self, sequence: &Self::Value, index: usize) -> Result<Self::Value, ScriptError>;

    /// Read a value as a native type handle.
    fn to_type(&self, value: &Self::Value) -> Option<TypeRef>;

    /// Read a value as a string.
    fn to_str(&self, value: &Self::Value) -> Option<String>;

    /// Read a value as a boolean.
    fn to_bool(&self, value: &Self::Value) -> Option<bool>;
}

/// A script value released when the guard is dropped.
pub struct Scoped<'rt, R: ScriptRuntime> {
    runtime: &'rt R,
    // Always `Some` until drop.
    value: Option<R::Value>,
}

impl<'rt, R: ScriptRuntime> Scoped<'rt, R> {
    pub fn new(runtime: &'rt R, value: R::Value) -> Self {
        Self {
            runtime,
            value: Some(value),
        }
    }

    pub fn get(&self) -> &R::Value {
        self.value.as_ref().unwrap_or_else(|| unreachable!("value taken before drop"))
    }
}

impl<R: ScriptRuntime> Deref for Scoped<'_, R> {
    type Target = R::Value;

    fn deref(&self) -> &R::Value {
        self.get()
    }
}

impl<R: ScriptRuntime> Drop for Scoped<'_, R> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.runtime.release(value);
        }
    }
}

/// An ordered list of script values, all released when the list is dropped.
///
/// Values stay contiguous so the list can be passed straight to
/// [`ScriptRuntime::call`].
pub struct ScopedList<'rt, R: ScriptRuntime> {
    runtime: &'rt R,
    values: Vec<R::Value>,
}

impl<'rt, R: ScriptRuntime> ScopedList<'rt, R> {
    pub fn with_capacity(runtime: &'rt R, capacity: usize) -> Self {
        Self {
            runtime,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Take ownership of values the runtime already handed out.
    pub fn from_vec(runtime: &'rt R, values: Vec<R::Value>) -> Self {
        Self { runtime, values }
    }

    pub fn push(&mut self, value: R::Value) {
        self.values.push(value);
    }

    pub fn as_slice(&self) -> &[R::Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Move the first value out into its own guard.
    pub fn take_first(&mut self) -> Option<Scoped<'rt, R>> {
        if self.values.is_empty() {
            None
        } else {
            Some(Scoped::new(self.runtime, self.values.remove(0)))
        }
    }
}

impl<R: ScriptRuntime> Drop for ScopedList<'_, R> {
    fn drop(&mut self) {
        for value in self.values.drain(..) {
            self.runtime.release(value);
        }
    }
}

/// A long-lived script value owned by the bridge, such as a hook callback.
///
/// Holds its runtime so it can be released from whichever thread drops the
/// last reference.
pub struct Retained<R: ScriptRuntime> {
    runtime: Arc<R>,
    // Always `Some` until drop.
    value: Option<R::Value>,
}

impl<R: ScriptRuntime> Retained<R> {
    /// Take a bridge-owned reference to `value`. The caller keeps its own.
    pub fn retain(runtime: &Arc<R>, value: &R::Value) -> Result<Self, ScriptError> {
        let value = runtime.retain(value)?;
        Ok(Self {
            runtime: Arc::clone(runtime),
            value: Some(value),
        })
    }

    pub fn get(&self) -> &R::Value {
        self.value.as_ref().unwrap_or_else(|| unreachable!("value taken before drop"))
    }
}

impl<R: ScriptRuntime> Drop for Retained<R> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.runtime.release(value);
        }
    }
}
