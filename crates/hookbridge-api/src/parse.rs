//! Parsing hook registration descriptors supplied by scripts.
//!
//! A script registers a hook with a table such as
//!
//! ```text
//! { type = Player, method = "Damage", args = { Int32 }, returns = true }
//! ```
//!
//! Every field read here is released before the parser returns, whether
//! the descriptor is valid or not.

use crate::script::{Scoped, ScriptRuntime};
use hookbridge_runtime::{HookRequest, RegistrationError, RegistrationResult, TypeRef};

/// Read and validate a registration descriptor, applying defaults.
///
/// | field      | required | default |
/// |------------|----------|---------|
/// | `type`     | yes      |         |
/// | `method`   | yes      |         |
/// | `args`     | no       | resolve by name only |
/// | `instance` | no       | `true`  |
/// | `public`   | no       | `true`  |
/// | `returns`  | no       | `false` |
pub fn parse_request<R: ScriptRuntime>(
    runtime: &R,
    descriptor: &R::Value,
) -> RegistrationResult<HookRequest> {
    let target = read_type(runtime, descriptor)?;
    let method = read_method(runtime, descriptor)?;
    let args = read_args(runtime, descriptor)?;
    let instance = read_bool(runtime, descriptor, "instance", true)?;
    let public = read_bool(runtime, descriptor, "public", true)?;
    let returns = read_bool(runtime, descriptor, "returns", false)?;

    let request = HookRequest {
        target,
        method,
        args,
        instance,
        public,
        returns,
    };
    request.validate()?;
    Ok(request)
}

fn field<'rt, R: ScriptRuntime>(
    runtime: &'rt R,
    descriptor: &R::Value,
    name: &'static str,
) -> RegistrationResult<Scoped<'rt, R>> {
    runtime
        .get_field(descriptor, name)
        .map(|value| Scoped::new(runtime, value))
        .map_err(|source| RegistrationError::Script {
            field: name,
            source,
        })
}

fn read_type<R: ScriptRuntime>(runtime: &R, descriptor: &R::Value) -> RegistrationResult<TypeRef> {
    let value = field(runtime, descriptor, "type")?;
    if runtime.is_nil(value.get()) {
        return Err(RegistrationError::invalid("type", "target type is required"));
    }
    runtime
        .to_type(value.get())
        .ok_or_else(|| RegistrationError::invalid("type", "target must be a type handle"))
}

fn read_method<R: ScriptRuntime>(runtime: &R, descriptor: &R::Value) -> RegistrationResult<String> {
    let value = field(runtime, descriptor, "method")?;
    if runtime.is_nil(value.get()) {
        return Err(RegistrationError::invalid("method", "method name is required"));
    }
    match runtime.to_str(value.get()) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(RegistrationError::invalid(
            "method",
            "method name must be a non-empty string",
        )),
    }
}

/// Collect `args` up to the first nil element.
fn read_args<R: ScriptRuntime>(
    runtime: &R,
    descriptor: &R::Value,
) -> RegistrationResult<Option<Vec<TypeRef>>> {
    let list = field(runtime, descriptor, "args")?;
    if runtime.is_nil(list.get()) {
        return Ok(None);
    }

    let mut args = Vec::new();
    loop {
        let index = args.len();
        let element = runtime
            .get_index(list.get(), index)
            .map(|value| Scoped::new(runtime, value))
            .map_err(|source| RegistrationError::Script {
                field: "args",
                source,
            })?;

        if runtime.is_nil(element.get()) {
            break;
        }

        let arg = runtime.to_type(element.get()).ok_or_else(|| {
            RegistrationError::invalid(
                "args",
                format!("element {} is not a type handle", index + 1),
            )
        })?;
        args.push(arg);
    }

    Ok(Some(args))
}

fn read_bool<R: ScriptRuntime>(
    runtime: &R,
    descriptor: &R::Value,
    name: &'static str,
    default: bool,
) -> RegistrationResult<bool> {
    let value = field(runtime, descriptor, name)?;
    if runtime.is_nil(value.get()) {
        return Ok(default);
    }
    runtime
        .to_bool(value.get())
        .ok_or_else(|| RegistrationError::invalid(name, "expected a boolean"))
}
