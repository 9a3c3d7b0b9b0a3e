//! Dispatch marshaling between native call frames and script values.

use crate::script::{ScopedList, ScriptRuntime};
use hookbridge_runtime::{DispatchError, MethodDescriptor, NativeValue, TypeRef};

/// One intercepted native call.
#[derive(Debug, Clone, Copy)]
pub struct DispatchFrame<'a> {
    /// Receiver of an instance call; `None` for static calls.
    pub target: Option<&'a NativeValue>,
    /// Native arguments, in declaration order.
    pub args: &'a [NativeValue],
}

impl<'a> DispatchFrame<'a> {
    pub fn instance(target: &'a NativeValue, args: &'a [NativeValue]) -> Self {
        Self {
            target: Some(target),
            args,
        }
    }

    pub fn static_call(args: &'a [NativeValue]) -> Self {
        Self { target: None, args }
    }

    /// Number of script arguments this frame marshals to.
    pub fn arity(&self) -> usize {
        self.args.len() + usize::from(self.target.is_some())
    }
}

/// Marshal a call frame into script arguments.
///
/// The receiver, when present, is argument 0. If any value fails to wrap,
/// everything wrapped so far is released before the error is returned.
pub fn marshal_arguments<'rt, R: ScriptRuntime>(
    runtime: &'rt R,
    method: &MethodDescriptor,
    frame: &DispatchFrame<'_>,
) -> Result<ScopedList<'rt, R>, DispatchError> {
    let mut marshaled = ScopedList::with_capacity(runtime, frame.arity());

    for (index, value) in frame.target.into_iter().chain(frame.args).enumerate() {
        let wrapped = runtime.wrap(value).map_err(|source| DispatchError::Marshal {
            method: method.to_string(),
            index,
            source,
        })?;
        marshaled.push(wrapped);
    }

    Ok(marshaled)
}

/// Turn a hook's results into the override value for the native caller.
///
/// The first result is coerced to `return_type`; no result means null.
/// Every result, the first included, is released before this returns.
pub fn unmarshal_override<R: ScriptRuntime>(
    runtime: &R,
    method: &MethodDescriptor,
    mut results: ScopedList<'_, R>,
    return_type: &TypeRef,
) -> Result<NativeValue, DispatchError> {
    let Some(first) = results.take_first() else {
        return Ok(NativeValue::Null);
    };

    runtime
        .coerce(first.get(), return_type)
        .map_err(|source| DispatchError::Coercion {
            method: method.to_string(),
            expected: return_type.full_name(),
            source,
        })
}
