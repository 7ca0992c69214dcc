//! Declared parameters, argument binding and per-parameter coercion.

use super::annotation::{Annotation, Tag, parse_tags};
use super::call::CallArgs;
use crate::coerce::to_tensor;
use crate::error::CallError;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt::{self, Debug};

/// A declared parameter with its resolved annotation.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    tags: Vec<Tag>,
    annotation: Annotation,
    default: Option<Value>,
}

impl Param {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tags as declared.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn annotation(&self) -> Annotation {
        self.annotation
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered parameter list of an annotated function.
///
/// Every declared parameter carries exactly one annotation; this is checked
/// once by [`SignatureBuilder::build`].
///
/// ```
/// use ndgrad::adapter::{Annotation, Signature, Tag};
///
/// let sig = Signature::builder()
///     .param("a", [Tag::Tensor])
///     .param_with_default("sign", [Tag::Any], "positive")
///     .build()
///     .unwrap();
/// assert_eq!(sig.names().collect::<Vec<_>>(), ["a", "sign"]);
/// assert_eq!(sig.param("sign").unwrap().annotation(), Annotation::PassThrough);
/// ```
#[derive(Debug, Clone)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn builder() -> SignatureBuilder {
        Default::default()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Map call arguments onto parameter names.
    ///
    /// Precedence, lowest first: declared default, positional argument,
    /// keyword argument.
    pub fn bind(&self, args: &CallArgs) -> Result<BoundArgs, CallError> {
        if args.positional().len() > self.params.len() {
            return Err(CallError::TooManyPositional {
                expected: self.params.len(),
                actual: args.positional().len(),
            });
        }
        if let Some((name, _)) = args
            .keywords()
            .iter()
            .find(|(name, _)| self.position(name).is_none())
        {
            return Err(CallError::UnexpectedKeyword { name: name.clone() });
        }

        let values = self
            .merge(args)
            .into_iter()
            .map(|(name, value)| match value {
                Some(value) => Ok((name.to_owned(), value.clone())),
                None => Err(CallError::MissingArgument {
                    name: name.to_owned(),
                }),
            })
            .collect::<Result<_, _>>()?;
        Ok(BoundArgs { values })
    }

    /// Best-effort view of the binding, for diagnostics.
    pub(crate) fn merge<'a>(&'a self, args: &'a CallArgs) -> Vec<(&'a str, Option<&'a Value>)> {
        self.params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let value = args
                    .keyword(&p.name)
                    .or_else(|| args.positional().get(i))
                    .or(p.default.as_ref());
                (p.name.as_str(), value)
            })
            .collect()
    }

    /// Apply each parameter's annotation to its bound value, in declaration
    /// order.
    pub fn coerce(&self, bound: BoundArgs) -> Result<BoundArgs, CallError> {
        let values = self
            .params
            .iter()
            .zip(bound.values)
            .map(|(param, (name, value))| -> Result<(String, Value), CallError> {
                let value = match param.annotation {
                    Annotation::PassThrough => value,
                    Annotation::ToTensor(options) => Value::Tensor(to_tensor(&value, &options)?),
                };
                Ok((name, value))
            })
            .collect::<Result<_, _>>()?;
        Ok(BoundArgs { values })
    }
}

/// Builder for [`Signature`].
///
/// Parameters can be declared and annotated in one step with
/// [`param`](Self::param), or separately with [`declare`](Self::declare)
/// and [`annotate`](Self::annotate).
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    declared: Vec<String>,
    annotations: Vec<(String, Vec<Tag>)>,
    defaults: Vec<(String, Value)>,
    error: Option<CallError>,
}

impl SignatureBuilder {
    /// Declare and annotate a parameter.
    pub fn param(self, name: &str, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.declare(name).annotate(name, tags)
    }

    /// Declare and annotate a parameter with a default value.
    pub fn param_with_default(
        self,
        name: &str,
        tags: impl IntoIterator<Item = Tag>,
        default: impl Into<Value>,
    ) -> Self {
        self.param(name, tags).default(name, default)
    }

    /// Declare and annotate a parameter from a comma-separated tag list.
    pub fn param_str(mut self, name: &str, tags: &str) -> Self {
        match parse_tags(tags) {
            Ok(tags) => self.param(name, tags),
            Err(err) => {
                self.error.get_or_insert(err);
                self.declare(name)
            }
        }
    }

    /// Declare a parameter without annotating it.
    pub fn declare(mut self, name: &str) -> Self {
        self.declared.push(name.to_owned());
        self
    }

    pub fn annotate(mut self, name: &str, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.annotations
            .push((name.to_owned(), tags.into_iter().collect()));
        self
    }

    pub fn default(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.defaults.push((name.to_owned(), value.into()));
        self
    }

    /// Check the declaration and resolve every annotation.
    ///
    /// # Errors
    ///
    /// - [`CallError::DuplicateParameter`] for a name declared or annotated twice
    /// - [`CallError::MissingAnnotation`] for a declared, unannotated parameter
    /// - [`CallError::UnknownParameter`] for an annotation or default naming
    ///   no declared parameter
    /// - [`CallError::UnsupportedAnnotation`] for tags without `tensor` or `any`
    /// - [`CallError::UnknownTag`] from [`param_str`](Self::param_str)
    pub fn build(self) -> Result<Signature, CallError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut seen = HashSet::new();
        for name in &self.declared {
            if !seen.insert(name.as_str()) {
                return Err(CallError::DuplicateParameter { name: name.clone() });
            }
        }
        let mut annotated = HashSet::new();
        for (name, _) in &self.annotations {
            if !seen.contains(name.as_str()) {
                return Err(CallError::UnknownParameter { name: name.clone() });
            }
            if !annotated.insert(name.as_str()) {
                return Err(CallError::DuplicateParameter { name: name.clone() });
            }
        }
        if let Some((name, _)) = self
            .defaults
            .iter()
            .find(|(name, _)| !seen.contains(name.as_str()))
        {
            return Err(CallError::UnknownParameter { name: name.clone() });
        }

        let mut params = Vec::with_capacity(self.declared.len());
        for name in &self.declared {
            let tags = self
                .annotations
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, tags)| tags.clone())
                .ok_or_else(|| CallError::MissingAnnotation { name: name.clone() })?;
            let annotation = Annotation::from_tags(name, &tags)?;
            // Later defaults replace earlier ones
            let default = self
                .defaults
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone());
            params.push(Param {
                name: name.clone(),
                tags,
                annotation,
                default,
            });
        }
        Ok(Signature { params })
    }
}

/// Arguments bound to parameter names, in declaration order.
#[derive(Clone)]
pub struct BoundArgs {
    values: Vec<(String, Value)>,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pass every value by keyword.
    pub fn into_call_args(self) -> CallArgs {
        self.values
            .into_iter()
            .fold(CallArgs::new(), |args, (name, value)| args.kwarg(&name, value))
    }
}

impl Debug for BoundArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
