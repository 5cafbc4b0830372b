//! Action descriptors as sent by the backend.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// How an action obtains its form.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormSpec {
    /// The action takes no form.
    #[default]
    None,
    /// The form must be retrieved with a `form` transport call first.
    FetchOnDemand,
    /// The form descriptor was prefetched with the report.
    Descriptor(Value),
}

impl FormSpec {
    pub fn is_some(&self) -> bool {
        !matches!(self, FormSpec::None)
    }
}

impl Serialize for FormSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FormSpec::None => serializer.serialize_bool(false),
            FormSpec::FetchOnDemand => serializer.serialize_bool(true),
            FormSpec::Descriptor(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FormSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null | Value::Bool(false) => FormSpec::None,
            Value::Bool(true) => FormSpec::FetchOnDemand,
            Value::String(s) if s.is_empty() => FormSpec::None,
            other => FormSpec::Descriptor(other),
        })
    }
}

/// Confirmation requirement: a bare flag or the rendered prompt text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Confirm {
    #[default]
    No,
    Yes,
    Prompt(String),
}

impl Confirm {
    pub fn is_required(&self) -> bool {
        !matches!(self, Confirm::No)
    }
}

impl Serialize for Confirm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Confirm::No => serializer.serialize_bool(false),
            Confirm::Yes => serializer.serialize_bool(true),
            Confirm::Prompt(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for Confirm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(true) => Confirm::Yes,
            Value::String(s) if !s.is_empty() => Confirm::Prompt(s),
            _ => Confirm::No,
        })
    }
}

/// An action offered for an item or for a bulk selection.
///
/// Immutable once received; per-invocation state lives in the engine's
/// form and confirmation sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Unique key within its action list.
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,

    #[serde(default)]
    pub form: FormSpec,

    #[serde(default)]
    pub form_via_ajax: bool,

    #[serde(default)]
    pub confirm: Confirm,

    /// Link action: executing it navigates instead of calling the backend.
    #[serde(default)]
    pub is_regular_view: bool,

    /// Expand the following item after a successful run.
    #[serde(default)]
    pub next_on_success: bool,

    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl ActionDescriptor {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_form(mut self, form: FormSpec) -> Self {
        self.form = form;
        self
    }

    pub fn with_confirm(mut self, confirm: Confirm) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn as_link(mut self) -> Self {
        self.is_regular_view = true;
        self
    }

    pub fn with_next_on_success(mut self) -> Self {
        self.next_on_success = true;
        self
    }

    pub fn with_form_via_ajax(mut self) -> Self {
        self.form_via_ajax = true;
        self
    }

    pub fn is_link_action(&self) -> bool {
        self.is_regular_view
    }

    /// Rendered as a button (no form, or a form opened in a dialog).
    pub fn is_button_action(&self) -> bool {
        !self.form.is_some() || self.form_via_ajax
    }

    /// Rendered with its form inline in the expanded row.
    pub fn is_inline_form_action(&self) -> bool {
        self.form.is_some() && !self.form_via_ajax
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirm.is_required()
    }

    /// Prompt text, when the backend rendered one.
    pub fn confirm_message(&self) -> Option<&str> {
        match &self.confirm {
            Confirm::Prompt(text) => Some(text),
            _ => None,
        }
    }
}

/// Lookup helper over an action list.
pub trait ActionList {
    fn by_method(&self, method: &str) -> Option<&ActionDescriptor>;
}

impl ActionList for [ActionDescriptor] {
    fn by_method(&self, method: &str) -> Option<&ActionDescriptor> {
        self.iter().find(|a| a.method == method)
    }
}

impl ActionList for Vec<ActionDescriptor> {
    fn by_method(&self, method: &str) -> Option<&ActionDescriptor> {
        self.as_slice().by_method(method)
    }
}
