//! Administrator-side authoring of a form before it is saved.

use chrono::NaiveDate;
use db::models::{
    form::{CreateForm, FormStatus},
    form_schema::{FieldDescriptor, FieldKind, FormSchema, SchemaError},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use super::form_renderer::FALLBACK_OPTIONS;

const FIELD_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
pub const DEFAULT_EVENT_TYPE: &str = "Sunday Service";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuilderError {
    #[error("Form title is required")]
    MissingTitle,
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("position {index} is out of range for {len} fields")]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Partial update of a single field. Absent values are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
    pub help_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FormBuilder {
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub event_date: Option<NaiveDate>,
    pub allow_multiple_submissions: bool,
    pub created_by: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl FormBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            event_date: None,
            allow_multiple_submissions: true,
            created_by: None,
            fields: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Append a field of `kind` with builder defaults and return it.
    pub fn add_field(&mut self, kind: FieldKind) -> &FieldDescriptor {
        let id = self.fresh_id();
        self.fields.push(FieldDescriptor {
            id,
            kind,
            label: format!("New {} Field", capitalize(&kind.to_string())),
            placeholder: Some(String::new()),
            required: false,
            options: Some(FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect()),
            help_text: None,
        });
        &self.fields[self.fields.len() - 1]
    }

    pub fn remove_field(&mut self, id: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id != id);
        self.fields.len() != before
    }

    pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> Result<(), BuilderError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| BuilderError::UnknownField(id.to_string()))?;

        if let Some(label) = patch.label {
            field.label = label;
        }
        if let Some(placeholder) = patch.placeholder {
            field.placeholder = Some(placeholder);
        }
        if let Some(required) = patch.required {
            field.required = required;
        }
        if let Some(options) = patch.options {
            field.options = Some(options);
        }
        if let Some(help_text) = patch.help_text {
            field.help_text = Some(help_text).filter(|h| !h.is_empty());
        }
        Ok(())
    }

    /// Drag-and-drop reorder.
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        let len = self.fields.len();
        for index in [from, to] {
            if index >= len {
                return Err(BuilderError::OutOfRange { index, len });
            }
        }
        let field = self.fields.remove(from);
        self.fields.insert(to, field);
        Ok(())
    }

    pub fn schema(&self) -> FormSchema {
        FormSchema::new(self.fields.clone())
    }

    /// Produce the insert payload. `Draft` is "Save Draft", `Active` is "Publish".
    pub fn build(&self, status: FormStatus) -> Result<CreateForm, BuilderError> {
        if self.title.trim().is_empty() {
            return Err(BuilderError::MissingTitle);
        }
        let schema = self.schema();
        schema.validate()?;

        Ok(CreateForm {
            title: self.title.trim().to_string(),
            description: self.description.clone().filter(|d| !d.trim().is_empty()),
            event_type: Some(self.event_type.clone()),
            event_date: self.event_date,
            status: Some(status),
            form_schema: schema,
            allow_multiple_submissions: Some(self.allow_multiple_submissions),
            created_by: self.created_by.clone(),
        })
    }

    fn fresh_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..FIELD_ID_LEN)
                .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
                .collect();
            if !self.fields.iter().any(|f| f.id == id) {
                return id;
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_fields_get_builder_defaults() {
        let mut builder = FormBuilder::new("Sunday Service Attendance");
        let field = builder.add_field(FieldKind::Boolean).clone();

        assert_eq!(field.id.len(), FIELD_ID_LEN);
        assert!(
            field
                .id
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert_eq!(field.label, "New Boolean Field");
        assert!(!field.required);
        assert_eq!(
            field.options,
            Some(vec!["Option 1".to_string(), "Option 2".to_string()])
        );
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut builder = FormBuilder::new("Census");
        for _ in 0..50 {
            builder.add_field(FieldKind::Text);
        }
        assert!(builder.schema().validate().is_ok());
    }

    #[test]
    fn update_move_and_remove() {
        let mut builder = FormBuilder::new("Survey");
        let a = builder.add_field(FieldKind::Text).id.clone();
        let b = builder.add_field(FieldKind::Radio).id.clone();

        builder
            .update_field(
                &b,
                FieldPatch {
                    label: Some("Which service?".into()),
                    required: Some(true),
                    options: Some(vec!["First".into(), "Second".into()]),
                    ..Default::default()
                },
            )
            .unwrap();
        builder.move_field(1, 0).unwrap();

        let ids: Vec<_> = builder.fields().iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids, vec![b.clone(), a.clone()]);
        assert_eq!(builder.fields()[0].label, "Which service?");
        assert!(builder.fields()[0].required);

        assert_eq!(
            builder.move_field(0, 2),
            Err(BuilderError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            builder.update_field("nope", FieldPatch::default()),
            Err(BuilderError::UnknownField("nope".into()))
        );

        assert!(builder.remove_field(&a));
        assert!(!builder.remove_field(&a));
        assert_eq!(builder.fields().len(), 1);
    }

    #[test]
    fn build_requires_title() {
        let builder = FormBuilder::new("   ");
        let err = builder.build(FormStatus::Draft).unwrap_err();
        assert_eq!(err, BuilderError::MissingTitle);
        assert_eq!(err.to_string(), "Form title is required");
    }

    #[test]
    fn build_rejects_blank_labels() {
        let mut builder = FormBuilder::new("Survey");
        let id = builder.add_field(FieldKind::Text).id.clone();
        builder
            .update_field(
                &id,
                FieldPatch {
                    label: Some(" ".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            builder.build(FormStatus::Active),
            Err(BuilderError::Schema(SchemaError::EmptyLabel(id)))
        );
    }

    #[test]
    fn publish_produces_active_payload() {
        let mut builder = FormBuilder::new(" Midweek Service ");
        builder.allow_multiple_submissions = false;
        builder.add_field(FieldKind::Email);

        let payload = builder.build(FormStatus::Active).unwrap();
        assert_eq!(payload.title, "Midweek Service");
        assert_eq!(payload.status, Some(FormStatus::Active));
        assert_eq!(payload.event_type.as_deref(), Some(DEFAULT_EVENT_TYPE));
        assert_eq!(payload.allow_multiple_submissions, Some(false));
        assert_eq!(payload.form_schema.len(), 1);
    }
}
