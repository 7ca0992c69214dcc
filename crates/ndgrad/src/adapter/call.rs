//! Calling annotated functions.

use super::signature::Signature;
use crate::autodiff::Tensor;
use crate::error::CallError;
use crate::value::Value;
use std::any::Any;
use std::fmt::{self, Debug};

/// Arguments as supplied by the caller: positional values plus keywords.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument, replacing an earlier one of the same name.
    pub fn kwarg(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.keywords.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.keywords.push((name.to_owned(), value)),
        }
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(String, Value)] {
        &self.keywords
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// The view a wrapped function gets of its arguments.
///
/// A name resolves to its keyword argument, else the positional argument at
/// the parameter's declared position, else the declared default. Coerced
/// calls pass everything by keyword; fallback calls pass the caller's
/// arguments in their original shape.
pub struct Arguments<'a> {
    signature: &'a Signature,
    args: &'a CallArgs,
}

impl<'a> Arguments<'a> {
    pub fn new(signature: &'a Signature, args: &'a CallArgs) -> Self {
        Self { signature, args }
    }

    pub fn value(&self, name: &str) -> Result<&'a Value, CallError> {
        let positional = || {
            self.signature
                .position(name)
                .and_then(|i| self.args.positional().get(i))
        };
        let default = || self.signature.param(name).and_then(|p| p.default());
        self.args
            .keyword(name)
            .or_else(positional)
            .or_else(default)
            .ok_or_else(|| CallError::MissingArgument {
                name: name.to_owned(),
            })
    }

    pub fn tensor(&self, name: &str) -> Result<&'a Tensor, CallError> {
        let value = self.value(name)?;
        value.as_tensor().ok_or_else(|| wrong_type(name, "tensor", value))
    }

    pub fn str(&self, name: &str) -> Result<&'a str, CallError> {
        let value = self.value(name)?;
        value.as_str().ok_or_else(|| wrong_type(name, "str", value))
    }

    pub fn f64(&self, name: &str) -> Result<f64, CallError> {
        let value = self.value(name)?;
        value.as_f64().ok_or_else(|| wrong_type(name, "number", value))
    }

    /// Downcast an object argument.
    pub fn object<T: Any>(&self, name: &str) -> Result<&'a T, CallError> {
        let value = self.value(name)?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_type(name, std::any::type_name::<T>(), value))
    }
}

fn wrong_type(name: &str, expected: &'static str, value: &Value) -> CallError {
    CallError::WrongType {
        name: name.to_owned(),
        expected,
        actual: value.kind().to_owned(),
    }
}

/// Result of [`TensorFn::invoke`].
#[derive(Debug)]
pub enum Invocation<R> {
    /// The target ran on coerced arguments.
    Coerced(R),
    /// Coercion failed; the target ran on the original arguments.
    Fallback { value: R, cause: CallError },
}

impl<R> Invocation<R> {
    pub fn into_value(self) -> R {
        match self {
            Invocation::Coerced(value) | Invocation::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Invocation::Fallback { .. })
    }
}

type Target<R> = dyn Fn(&Arguments<'_>) -> Result<R, CallError>;

/// A function whose arguments are coerced according to a [`Signature`]
/// before every call.
///
/// # Example
///
/// ```
/// use ndgrad::adapter::{CallArgs, Signature, Tag, TensorFn};
///
/// let sig = Signature::builder()
///     .param("a", [Tag::Tensor])
///     .param_with_default("sign", [Tag::Any], "positive")
///     .build()
///     .unwrap();
/// let flip = TensorFn::new(sig, |args| {
///     let a = args.tensor("a")?;
///     Ok(match args.str("sign")? {
///         "negative" => a.neg(),
///         _ => a.clone(),
///     })
/// });
///
/// let out = flip.call(&CallArgs::new().arg(2).kwarg("sign", "negative")).unwrap();
/// assert_eq!(out.item_f64().unwrap(), -2.0);
///
/// let out = flip.call(&CallArgs::new().kwarg("a", 3)).unwrap();
/// assert_eq!(out.item_f64().unwrap(), 3.0);
/// ```
pub struct TensorFn<R> {
    signature: Signature,
    target: Box<Target<R>>,
}

impl<R> TensorFn<R> {
    pub fn new<F>(signature: Signature, target: F) -> Self
    where
        F: Fn(&Arguments<'_>) -> Result<R, CallError> + 'static,
    {
        Self {
            signature,
            target: Box::new(target),
        }
    }

    /// Declared parameters and their resolved annotations.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Bind, coerce and call, without recovering from failures.
    pub fn try_call(&self, args: &CallArgs) -> Result<R, CallError> {
        let bound = self.signature.bind(args)?;
        let coerced = self.signature.coerce(bound)?.into_call_args();
        self.call_target(&coerced)
    }

    /// Call with coerced arguments, or with the original arguments when
    /// binding, coercion or the coerced call fails.
    ///
    /// The failure is logged together with the attempted binding. An error
    /// from the fallback call itself is returned.
    pub fn invoke(&self, args: &CallArgs) -> Result<Invocation<R>, CallError> {
        match self.try_call(args) {
            Ok(value) => Ok(Invocation::Coerced(value)),
            Err(cause) => {
                log::warn!("{cause}; calling with the original arguments");
                log::warn!("bound arguments: {:?}", BindingDump(&self.signature, args));
                let value = self.call_target(args)?;
                Ok(Invocation::Fallback { value, cause })
            }
        }
    }

    /// Like [`invoke`](Self::invoke), keeping only the value.
    pub fn call(&self, args: &CallArgs) -> Result<R, CallError> {
        self.invoke(args).map(Invocation::into_value)
    }

    fn call_target(&self, args: &CallArgs) -> Result<R, CallError> {
        (self.target)(&Arguments::new(&self.signature, args))
    }
}

impl<R> Debug for TensorFn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorFn")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

struct BindingDump<'a>(&'a Signature, &'a CallArgs);

impl Debug for BindingDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.0.merge(self.1) {
            match value {
                Some(value) => map.entry(&name, value),
                None => map.entry(&name, &format_args!("<unbound>")),
            };
        }
        map.finish()
    }
}
