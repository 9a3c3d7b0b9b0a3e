//! # hookbridge-api
//!
//! The bridge between an embedded script engine and intercepted native
//! methods.
//!
//! This crate provides:
//!
//! - The [`ScriptRuntime`] and [`InterceptionInstaller`] capabilities the
//!   bridge consumes
//! - Scoped release guards for every script value that crosses the boundary
//! - The [`HookManager`], which registers hooks (`add`) and dispatches
//!   intercepted calls to them (`try_run`)
//!
//! ## Value Ownership
//!
//! Script values handed out by the runtime are not reclaimed automatically.
//! Every value the bridge obtains is held by a guard ([`Scoped`],
//! [`ScopedList`] or [`Retained`]) that releases it exactly once when the
//! guard goes out of scope, on success and error paths alike.

pub mod installer;
pub mod manager;
pub mod marshal;
pub mod parse;
pub mod script;
pub mod table;

pub use installer::InterceptionInstaller;
pub use manager::{DispatchOutcome, HookManager};
pub use marshal::DispatchFrame;
pub use parse::parse_request;
pub use script::{Retained, Scoped, ScopedList, ScriptRuntime};
pub use table::{HookEntry, HookInfo, HookTable};

pub use hookbridge_runtime::{
    DispatchError, HookError, HookRequest, MethodDescriptor, MethodToken, NativeValue,
    RegistrationError, ScriptError, SecurityPolicy, TypeRef,
};
