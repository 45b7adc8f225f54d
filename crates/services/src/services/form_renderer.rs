//! Projects a form schema onto concrete input controls bound to an answer map.

use db::models::{
    form_response::{AnswerMap, AnswerValue},
    form_schema::{FieldDescriptor, FieldKind, FormSchema},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Shown when a select/radio field was saved without options.
pub const FALLBACK_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

const TEXTAREA_ROWS: u8 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Email,
    Tel,
    Date,
    Time,
    Checkbox,
}

impl InputType {
    fn for_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Number => InputType::Number,
            FieldKind::Email => InputType::Email,
            FieldKind::Phone => InputType::Tel,
            FieldKind::Date => InputType::Date,
            FieldKind::Time => InputType::Time,
            FieldKind::Checkbox => InputType::Checkbox,
            _ => InputType::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    /// Yes / No pair.
    BinaryChoice,
    OptionList { options: Vec<String> },
    MultiLine { rows: u8 },
    SingleLine { input_type: InputType },
}

impl Control {
    fn for_field(field: &FieldDescriptor) -> Self {
        match field.kind {
            FieldKind::Boolean => Control::BinaryChoice,
            FieldKind::Select | FieldKind::Radio => {
                let options = match field.options.as_deref() {
                    Some(opts) if !opts.is_empty() => opts.to_vec(),
                    _ => FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect(),
                };
                Control::OptionList { options }
            }
            FieldKind::Textarea => Control::MultiLine {
                rows: TEXTAREA_ROWS,
            },
            kind => Control::SingleLine {
                input_type: InputType::for_kind(kind),
            },
        }
    }

    /// Controls that carry the browser's native `required` attribute.
    fn enforces_required(&self) -> bool {
        matches!(self, Control::MultiLine { .. } | Control::SingleLine { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct RenderedField {
    /// Answer-map key this control writes to.
    pub field_id: String,
    pub kind: FieldKind,
    pub label: String,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub required: bool,
    #[serde(flatten)]
    pub control: Control,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct RenderedForm {
    pub fields: Vec<RenderedField>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("no control is bound to field {0}")]
    UnboundField(String),
}

/// One control per schema field, in schema order.
pub fn render(schema: &FormSchema) -> RenderedForm {
    let fields = schema
        .iter()
        .map(|field| RenderedField {
            field_id: field.id.clone(),
            kind: field.kind,
            label: field.label.clone(),
            placeholder: field.placeholder.clone().filter(|p| !p.is_empty()),
            help_text: field.help_text.clone(),
            required: field.required,
            control: Control::for_field(field),
        })
        .collect();
    RenderedForm { fields }
}

impl RenderedForm {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field_id: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }

    /// Answer map as the page first shows it: every bound key present.
    pub fn initial_answers(&self) -> AnswerMap {
        self.fields
            .iter()
            .map(|f| (f.field_id.clone(), AnswerValue::initial_for(f.kind)))
            .collect()
    }

    /// An interaction with the control bound to `field_id`. The value replaces
    /// whatever was there; it is not checked against the field kind.
    pub fn apply(
        &self,
        answers: &mut AnswerMap,
        field_id: &str,
        value: AnswerValue,
    ) -> Result<(), RenderError> {
        if self.field(field_id).is_none() {
            return Err(RenderError::UnboundField(field_id.to_string()));
        }
        answers.set(field_id, value);
        Ok(())
    }

    /// Required fields the browser would refuse to submit empty.
    pub fn missing_required(&self, answers: &AnswerMap) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required && f.control.enforces_required())
            .filter(|f| answers.get(&f.field_id).is_none_or(AnswerValue::is_blank))
            .map(|f| f.field_id.clone())
            .collect()
    }
}
