//! Parameter annotations: the tag vocabulary and its resolved form.

use crate::coerce::CoerceOptions;
use crate::error::CallError;
use crate::scalar::DType;
use std::fmt::{self, Display};
use std::str::FromStr;

/// One marker in a parameter's annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Coerce the argument into a tensor.
    Tensor,
    /// Pass the argument through untouched.
    Any,
    /// Detach the coerced tensor.
    Detach,
    /// Track gradients on a freshly built tensor.
    RequiresGrad,
    /// Target representation of the coerced tensor.
    DType(DType),
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Tensor => write!(f, "tensor"),
            Tag::Any => write!(f, "any"),
            Tag::Detach => write!(f, "detach"),
            Tag::RequiresGrad => write!(f, "requires_grad"),
            Tag::DType(dtype) => write!(f, "dtype={dtype}"),
        }
    }
}

impl FromStr for Tag {
    type Err = CallError;

    /// Parse `tensor`, `any`, `detach`, `requires_grad` or `dtype=<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((key, name)) = s.split_once('=') {
            if key.trim() != "dtype" {
                return Err(CallError::UnknownTag(s.to_owned()));
            }
            return Ok(Tag::DType(name.trim().parse()?));
        }
        match s {
            "tensor" => Ok(Tag::Tensor),
            "any" => Ok(Tag::Any),
            "detach" => Ok(Tag::Detach),
            "requires_grad" => Ok(Tag::RequiresGrad),
            _ => Err(CallError::UnknownTag(s.to_owned())),
        }
    }
}

/// Parse a comma-separated tag list such as `"tensor, detach, dtype=float64"`.
pub fn parse_tags(s: &str) -> Result<Vec<Tag>, CallError> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// What happens to an argument before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    PassThrough,
    ToTensor(CoerceOptions),
}

impl Annotation {
    /// Resolve the tags of parameter `name`.
    ///
    /// `tensor` wins over `any` when both are present. The first `dtype`
    /// tag counts; without one the default representation is used.
    ///
    /// # Errors
    ///
    /// [`CallError::UnsupportedAnnotation`] when neither `tensor` nor `any`
    /// is present.
    pub fn from_tags(name: &str, tags: &[Tag]) -> Result<Self, CallError> {
        if tags.contains(&Tag::Tensor) {
            let dtype = tags
                .iter()
                .find_map(|tag| match tag {
                    Tag::DType(dtype) => Some(*dtype),
                    _ => None,
                })
                .unwrap_or_default();
            return Ok(Annotation::ToTensor(CoerceOptions {
                dtype,
                detach: tags.contains(&Tag::Detach),
                requires_grad: tags.contains(&Tag::RequiresGrad),
            }));
        }
        if tags.contains(&Tag::Any) {
            return Ok(Annotation::PassThrough);
        }

        let rendered = tags
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        log::warn!("unsupported annotation [{rendered}] for parameter '{name}'");
        Err(CallError::UnsupportedAnnotation {
            name: name.to_owned(),
            tags: format!("[{rendered}]"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags("tensor, detach, dtype=float64").unwrap(),
            vec![Tag::Tensor, Tag::Detach, Tag::DType(DType::Float64)]
        );
        assert_eq!(parse_tags(" any ").unwrap(), vec![Tag::Any]);
        assert!(parse_tags("").unwrap().is_empty());
        assert_eq!(
            "requires_grad".parse::<Tag>().unwrap(),
            Tag::RequiresGrad
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("float".parse::<Tag>(), Err(CallError::UnknownTag(_))));
        assert!(matches!("shape=3".parse::<Tag>(), Err(CallError::UnknownTag(_))));
        assert!(matches!(
            "dtype=int8".parse::<Tag>(),
            Err(CallError::Tensor(_))
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let tag = Tag::DType(DType::Complex128);
        assert_eq!(tag.to_string().parse::<Tag>().unwrap(), tag);
    }

    #[test]
    fn test_tensor_defaults() {
        let a = Annotation::from_tags("x", &[Tag::Tensor]).unwrap();
        assert_eq!(a, Annotation::ToTensor(CoerceOptions::default()));
    }

    #[test]
    fn test_tensor_modifiers() {
        let tags = [
            Tag::RequiresGrad,
            Tag::DType(DType::Complex64),
            Tag::Tensor,
            Tag::DType(DType::Float64),
        ];
        let a = Annotation::from_tags("x", &tags).unwrap();
        assert_eq!(
            a,
            Annotation::ToTensor(CoerceOptions {
                dtype: DType::Complex64,
                detach: false,
                requires_grad: true,
            })
        );
    }

    #[test]
    fn test_tensor_wins_over_any() {
        let a = Annotation::from_tags("x", &[Tag::Any, Tag::Tensor]).unwrap();
        assert!(matches!(a, Annotation::ToTensor(_)));
        assert_eq!(
            Annotation::from_tags("x", &[Tag::Any, Tag::Detach]).unwrap(),
            Annotation::PassThrough
        );
    }

    #[test]
    fn test_unsupported() {
        let err = Annotation::from_tags("x", &[Tag::Detach]).unwrap_err();
        assert_eq!(
            err,
            CallError::UnsupportedAnnotation {
                name: "x".into(),
                tags: "[detach]".into(),
            }
        );
        assert!(Annotation::from_tags("x", &[]).is_err());
    }
}
