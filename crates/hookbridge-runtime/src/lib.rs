//! # hookbridge-runtime
//!
//! Engine-agnostic data layer for the hookbridge method interception bridge.
//!
//! This crate provides:
//! - Native values and type references exchanged with intercepted methods
//! - Method descriptors and a static method-metadata table
//! - Signature-based method resolution
//! - The hook security policy (namespace deny-list, non-hookable markers)
//! - Typed hook registration requests and hook manifests
//! - Metadata discovery from well-known paths
//!
//! ## Registration Path
//!
//! A registration request is resolved against a [`MethodResolver`], then
//! checked by the [`SecurityPolicy`]. Only requests that pass both steps may
//! have a dispatch handler installed; see [`admit`].
//!
//! Nothing in this crate talks to a script engine. The bridge itself lives in
//! `hookbridge-api`.

pub mod discovery;
pub mod error;
pub mod metadata;
pub mod policy;
pub mod request;
pub mod value;

pub use discovery::{discover_metadata, metadata_dir};
pub use error::{
    DispatchError, HookError, InstallError, MetadataError, MetadataResult, RegistrationError,
    RegistrationResult, ResolutionError, ScriptError,
};
pub use metadata::{
    Binding, MethodDescriptor, MethodQuery, MethodResolver, MethodTable, MethodToken, Visibility,
};
pub use policy::{ForbiddenReason, SecurityPolicy, DEFAULT_DENIED_NAMESPACES};
pub use request::{admit, HookManifest, HookRequest};
pub use value::{NativeValue, ObjectRef, TypeRef};
