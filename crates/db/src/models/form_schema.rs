use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;

/// Kind of input a form field collects.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Email,
    Phone,
    Date,
    Time,
    Select,
    Radio,
    Checkbox,
    Textarea,
    Boolean,
}

impl FieldKind {
    /// Kinds whose answers come from a closed set and can be tallied.
    pub fn is_enumerable(self) -> bool {
        matches!(self, FieldKind::Boolean | FieldKind::Select | FieldKind::Radio)
    }

    /// Kinds that render a declared option list.
    pub fn has_options(self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }
}

/// One field of a form as authored in the builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, rename = "helpText", skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("field #{index} has an empty identifier")]
    EmptyIdentifier { index: usize },
    #[error("duplicate field identifier: {0}")]
    DuplicateIdentifier(String),
    #[error("field {0} has an empty label")]
    EmptyLabel(String),
}

/// Ordered field list persisted as the JSON document on a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
pub struct FormSchema(pub Vec<FieldDescriptor>);

impl FormSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self(fields)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for (index, field) in self.0.iter().enumerate() {
            if field.id.trim().is_empty() {
                return Err(SchemaError::EmptyIdentifier { index });
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateIdentifier(field.id.clone()));
            }
            if field.label.trim().is_empty() {
                return Err(SchemaError::EmptyLabel(field.id.clone()));
            }
        }
        Ok(())
    }

    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.0.iter().find(|f| f.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.0
    }

    pub fn fields_mut(&mut self) -> &mut Vec<FieldDescriptor> {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a FormSchema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
