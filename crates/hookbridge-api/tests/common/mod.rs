//! Shared fixtures for the hookbridge-api integration tests.
//!
//! [`LedgerRuntime`] is an in-memory script engine that records every handle
//! it hands out and every handle given back, so tests can assert that the
//! bridge releases exactly what it obtained.

#![allow(dead_code)]

use hookbridge_api::{HookManager, InterceptionInstaller, ScriptRuntime};
use hookbridge_runtime::{
    InstallError, MethodDescriptor, MethodTable, MethodToken, NativeValue, ScriptError, TypeRef,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ==============================================================================
// Ledger Script Runtime
// ==============================================================================

pub type HostFn = Arc<dyn Fn(&[Slot]) -> Result<Vec<Slot>, ScriptError> + Send + Sync>;

/// A value stored in the ledger.
#[derive(Clone)]
pub enum Slot {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Type(TypeRef),
    Table {
        fields: HashMap<String, Slot>,
        items: Vec<Slot>,
    },
    Native(NativeValue),
    Function(HostFn),
}

impl Slot {
    pub fn str(value: &str) -> Self {
        Slot::Str(value.to_string())
    }

    pub fn ty(full_name: &str) -> Self {
        Slot::Type(TypeRef::parse(full_name))
    }

    pub fn record(fields: Vec<(&str, Slot)>) -> Self {
        Slot::Table {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            items: Vec::new(),
        }
    }

    pub fn list(items: Vec<Slot>) -> Self {
        Slot::Table {
            fields: HashMap::new(),
            items,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Slot::Nil => "nil",
            Slot::Bool(_) => "boolean",
            Slot::Int(_) => "number",
            Slot::Str(_) => "string",
            Slot::Type(_) => "type",
            Slot::Table { .. } => "table",
            Slot::Native(_) => "userdata",
            Slot::Function(_) => "function",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Slot::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_native(&self) -> Option<&NativeValue> {
        match self {
            Slot::Native(v) => Some(v),
            _ => None,
        }
    }
}

/// Handle to a ledger slot. Not `Clone`, so each handle is one reference.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle(u64);

#[derive(Default)]
pub struct LedgerRuntime {
    slots: Mutex<HashMap<u64, Slot>>,
    next: AtomicU64,
    allocated: AtomicUsize,
    released: AtomicUsize,
    interactions: AtomicUsize,
    wraps_before_failure: Mutex<Option<usize>>,
}

impl LedgerRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocate a handle owned by the test.
    pub fn alloc(&self, slot: Slot) -> Handle {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().unwrap().insert(id, slot);
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Handle(id)
    }

    /// Allocate a script function backed by a closure.
    pub fn function<F>(&self, f: F) -> Handle
    where
        F: Fn(&[Slot]) -> Result<Vec<Slot>, ScriptError> + Send + Sync + 'static,
    {
        self.alloc(Slot::Function(Arc::new(f)))
    }

    /// Release a handle owned by the test.
    pub fn free(&self, handle: Handle) {
        self.release(handle);
    }

    pub fn slot(&self, handle: &Handle) -> Slot {
        self.slots
            .lock()
            .unwrap()
            .get(&handle.0)
            .cloned()
            .unwrap_or_else(|| panic!("use of released handle {}", handle.0))
    }

    /// Number of handles not yet released.
    pub fn live(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of calls the bridge made into the runtime.
    pub fn interactions(&self) -> usize {
        self.interactions.load(Ordering::SeqCst)
    }

    /// Let the next `count` wraps succeed, then fail every wrap after.
    pub fn fail_wraps_after(&self, count: usize) {
        *self.wraps_before_failure.lock().unwrap() = Some(count);
    }

    fn touch(&self) {
        self.interactions.fetch_add(1, Ordering::SeqCst);
    }

    fn read(&self, handle: &Handle) -> Slot {
        self.slot(handle)
    }
}

impl ScriptRuntime for LedgerRuntime {
    type Value = Handle;

    fn wrap(&self, value: &NativeValue) -> Result<Handle, ScriptError> {
        self.touch();
        {
            let mut budget = self.wraps_before_failure.lock().unwrap();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(ScriptError::new("out of memory"));
                }
                *remaining -= 1;
            }
        }

        let slot = match value {
            NativeValue::Null => Slot::Nil,
            NativeValue::Bool(b) => Slot::Bool(*b),
            NativeValue::Int(i) => Slot::Int(*i),
            NativeValue::String(s) => Slot::Str(s.clone()),
            other => Slot::Native(other.clone()),
        };
        Ok(self.alloc(slot))
    }

    fn coerce(&self, value: &Handle, expected: &TypeRef) -> Result<NativeValue, ScriptError> {
        self.touch();
        let slot = self.read(value);
        let converted = match (expected.full_name().as_str(), &slot) {
            ("System.Int32" | "System.Int64", Slot::Int(i)) => Some(NativeValue::Int(*i)),
            ("System.Int32" | "System.Int64", Slot::Str(s)) => {
                s.trim().parse::<i64>().ok().map(NativeValue::Int)
            }
            ("System.Boolean", Slot::Bool(b)) => Some(NativeValue::Bool(*b)),
            ("System.String", Slot::Str(s)) => Some(NativeValue::String(s.clone())),
            ("System.String", Slot::Int(i)) => Some(NativeValue::String(i.to_string())),
            (_, Slot::Nil) => Some(NativeValue::Null),
            (_, Slot::Native(v)) => Some(v.clone()),
            _ => None,
        };
        converted.ok_or_else(|| {
            ScriptError::new(format!("cannot convert {} to {}", slot.kind(), expected))
        })
    }

    fn call(&self, function: &Handle, args: &[Handle]) -> Result<Vec<Handle>, ScriptError> {
        self.touch();
        let Slot::Function(f) = self.read(function) else {
            return Err(ScriptError::new("attempt to call a non-function value"));
        };
        let args: Vec<Slot> = args.iter().map(|h| self.read(h)).collect();
        let results = f(&args)?;
        Ok(results.into_iter().map(|slot| self.alloc(slot)).collect())
    }

    fn retain(&self, value: &Handle) -> Result<Handle, ScriptError> {
        self.touch();
        let slot = self.read(value);
        Ok(self.alloc(slot))
    }

    fn release(&self, value: Handle) {
        if self.slots.lock().unwrap().remove(&value.0).is_none() {
            panic!("double release of handle {}", value.0);
        }
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn is_nil(&self, value: &Handle) -> bool {
        matches!(self.read(value), Slot::Nil)
    }

    fn get_field(&self, table: &Handle, key: &str) -> Result<Handle, ScriptError> {
        self.touch();
        match self.read(table) {
            Slot::Table { fields, .. } => {
                Ok(self.alloc(fields.get(key).cloned().unwrap_or(Slot::Nil)))
            }
            other => Err(ScriptError::new(format!(
                "attempt to index a {} value",
                other.kind()
            ))),
        }
    }

    fn get_index(&self, sequence: &Handle, index: usize) -> Result<Handle, ScriptError> {
        self.touch();
        match self.read(sequence) {
            Slot::Table { items, .. } => {
                Ok(self.alloc(items.get(index).cloned().unwrap_or(Slot::Nil)))
            }
            other => Err(ScriptError::new(format!(
                "attempt to index a {} value",
                other.kind()
            ))),
        }
    }

    fn to_type(&self, value: &Handle) -> Option<TypeRef> {
        match self.read(value) {
            Slot::Type(t) => Some(t),
            _ => None,
        }
    }

    fn to_str(&self, value: &Handle) -> Option<String> {
        match self.read(value) {
            Slot::Str(s) => Some(s),
            _ => None,
        }
    }

    fn to_bool(&self, value: &Handle) -> Option<bool> {
        match self.read(value) {
            Slot::Bool(b) => Some(b),
            _ => None,
        }
    }
}

/// Run `f` and assert every handle it allocated was also released.
pub fn assert_balanced<T>(runtime: &LedgerRuntime, f: impl FnOnce() -> T) -> T {
    let allocated = runtime.allocated();
    let released = runtime.released();
    let result = f();
    assert_eq!(
        runtime.allocated() - allocated,
        runtime.released() - released,
        "handles allocated during the call were not all released"
    );
    result
}

// ==============================================================================
// Recording Installer
// ==============================================================================

#[derive(Default)]
pub struct RecordingInstaller {
    tokens: Mutex<HashMap<String, MethodToken>>,
    installs: Mutex<Vec<String>>,
    refused: Mutex<Vec<String>>,
}

impl RecordingInstaller {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail installs for a method, by full name (`Ns.Type::Name`).
    pub fn refuse(&self, full_name: &str) {
        self.refused.lock().unwrap().push(full_name.to_string());
    }

    /// Signatures installed so far, in order.
    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().unwrap().clone()
    }
}

impl InterceptionInstaller for RecordingInstaller {
    fn install_dispatch_handler(&self, method: &MethodDescriptor) -> Result<(), InstallError> {
        if self.refused.lock().unwrap().contains(&method.full_name()) {
            return Err(InstallError(format!("cannot patch {}", method.full_name())));
        }
        self.installs.lock().unwrap().push(method.to_string());
        Ok(())
    }

    fn identity_token_of(&self, method: &MethodDescriptor) -> MethodToken {
        let mut tokens = self.tokens.lock().unwrap();
        let next = MethodToken(0x0600_0001 + tokens.len() as u64);
        *tokens.entry(method.to_string()).or_insert(next)
    }
}

// ==============================================================================
// Bridge Fixture
// ==============================================================================

pub const GAME_METADATA: &str = r#"
[[type]]
namespace = "Game"
name = "Foo"

[[type.method]]
name = "Bar"
params = ["System.Int32"]
returns = "System.Int32"

[[type.method]]
name = "Bar"
params = ["System.String"]
returns = "System.String"

[[type.method]]
name = "Reset"

[[type.method]]
name = "Create"
static = true
returns = "Game.Foo"

[[type.method]]
name = "Tick"
public = false

[[type.method]]
name = "Secret"
no_hook = true

[[type.method]]
name = "Poll"
static = true
external = true

[[type]]
namespace = "Game.Tools"
name = "Util"

[[type.method]]
name = "Describe"
static = true
params = ["System.Int32"]
returns = "System.String"

[[type]]
namespace = "ETGMod"
name = "Loader"

[[type.method]]
name = "Load"

[[type]]
namespace = "System"
name = "Console"

[[type.method]]
name = "WriteLine"
static = true
params = ["System.String"]

[[type]]
namespace = "TexMod.Atlas"
name = "Packer"

[[type.method]]
name = "Pack"
"#;

pub fn game_table() -> Arc<MethodTable> {
    Arc::new(MethodTable::from_str(GAME_METADATA).unwrap())
}

pub struct Bridge {
    pub runtime: Arc<LedgerRuntime>,
    pub installer: Arc<RecordingInstaller>,
    pub manager: HookManager<LedgerRuntime>,
}

pub fn bridge() -> Bridge {
    let runtime = LedgerRuntime::new();
    let installer = RecordingInstaller::new();
    let manager = HookManager::new(runtime.clone(), installer.clone(), game_table());
    Bridge {
        runtime,
        installer,
        manager,
    }
}

/// Allocate a registration descriptor table.
pub fn descriptor(runtime: &LedgerRuntime, fields: Vec<(&str, Slot)>) -> Handle {
    runtime.alloc(Slot::record(fields))
}

/// Calls seen by a recording callback, one argument list per call.
pub type CallLog = Arc<Mutex<Vec<Vec<Slot>>>>;

/// A callback that records its arguments and returns `results`.
pub fn recording_callback(runtime: &LedgerRuntime, results: Vec<Slot>) -> (Handle, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&log);
    let handle = runtime.function(move |args| {
        seen.lock().unwrap().push(args.to_vec());
        Ok(results.clone())
    });
    (handle, log)
}

pub fn calls(log: &CallLog) -> usize {
    log.lock().unwrap().len()
}
