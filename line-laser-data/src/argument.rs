#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value type an argument accepts.
///
/// The kind only constrains which strings are accepted. Resolved values are
/// always passed on as the string that was supplied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArgumentKind {
    #[default]
    String,
    Integer,
}

/// A named launch argument with its default value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfigurationArgument {
    pub name: String,
    pub default_value: String,
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: ArgumentKind,
    /// Accepted values. Empty means any value of `kind`.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub choices: Vec<String>,
}

impl ConfigurationArgument {
    pub fn new(
        name: impl Into<String>,
        default_value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        ConfigurationArgument {
            name: name.into(),
            default_value: default_value.into(),
            description: description.into(),
            kind: ArgumentKind::String,
            choices: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ArgumentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}
