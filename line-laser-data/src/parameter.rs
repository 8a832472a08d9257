use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A constant parameter value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParameterLiteral {
    String(String),
    Integer(i64),
    Bool(bool),
    Double(f64),
}

impl fmt::Display for ParameterLiteral {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterLiteral::String(s) => write!(f, "{}", s),
            ParameterLiteral::Integer(i) => write!(f, "{}", i),
            ParameterLiteral::Bool(b) => write!(f, "{}", b),
            // Keep a trailing ".0" so the value is still read back as a double.
            ParameterLiteral::Double(d) if d.fract() == 0.0 && d.is_finite() => {
                write!(f, "{:.1}", d)
            }
            ParameterLiteral::Double(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for ParameterLiteral {
    fn from(value: &str) -> Self {
        ParameterLiteral::String(value.to_string())
    }
}

impl From<String> for ParameterLiteral {
    fn from(value: String) -> Self {
        ParameterLiteral::String(value)
    }
}

impl From<i64> for ParameterLiteral {
    fn from(value: i64) -> Self {
        ParameterLiteral::Integer(value)
    }
}

impl From<bool> for ParameterLiteral {
    fn from(value: bool) -> Self {
        ParameterLiteral::Bool(value)
    }
}

impl From<f64> for ParameterLiteral {
    fn from(value: f64) -> Self {
        ParameterLiteral::Double(value)
    }
}

/// Value of a process parameter before resolution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParameterValue {
    /// Passed to the process as is.
    Literal(ParameterLiteral),
    /// Name of a launch argument, substituted when the launch is resolved.
    Reference(String),
}

impl ParameterValue {
    pub fn literal(value: impl Into<ParameterLiteral>) -> Self {
        ParameterValue::Literal(value.into())
    }

    pub fn reference(argument_name: impl Into<String>) -> Self {
        ParameterValue::Reference(argument_name.into())
    }

    pub fn referenced_argument(&self) -> Option<&str> {
        match self {
            ParameterValue::Reference(name) => Some(name),
            ParameterValue::Literal(_) => None,
        }
    }
}
