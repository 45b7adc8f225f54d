//! Frequency tables for the enumerable fields of a form.

use db::models::{
    form_response::{AnswerValue, FormResponse},
    form_schema::{FieldDescriptor, FieldKind, FormSchema},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const YES: &str = "Yes";
pub const NO: &str = "No";
pub const NO_ANSWER: &str = "No answer";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct FrequencyBucket {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct FieldFrequency {
    pub field_id: String,
    pub label: String,
    pub kind: FieldKind,
    pub total: u64,
    /// In order of first appearance.
    pub buckets: Vec<FrequencyBucket>,
}

impl FieldFrequency {
    fn new(field: &FieldDescriptor) -> Self {
        Self {
            field_id: field.id.clone(),
            label: field.label.clone(),
            kind: field.kind,
            total: 0,
            buckets: Vec::new(),
        }
    }

    fn tally(&mut self, name: String) {
        self.total += 1;
        match self.buckets.iter_mut().find(|b| b.name == name) {
            Some(bucket) => bucket.value += 1,
            None => self.buckets.push(FrequencyBucket { name, value: 1 }),
        }
    }

    pub fn count(&self, name: &str) -> u64 {
        self.buckets
            .iter()
            .find(|b| b.name == name)
            .map_or(0, |b| b.value)
    }
}

/// Any non-empty string is truthy, whitespace included.
fn is_truthy(answer: Option<&AnswerValue>) -> bool {
    match answer {
        Some(AnswerValue::Boolean(b)) => *b,
        Some(AnswerValue::Number(n)) => *n != 0.0 && !n.is_nan(),
        Some(AnswerValue::Text(s) | AnswerValue::Choice(s)) => !s.is_empty(),
        None => false,
    }
}

fn label_for(kind: FieldKind, answer: Option<&AnswerValue>) -> String {
    if kind == FieldKind::Boolean {
        return if is_truthy(answer) { YES } else { NO }.to_string();
    }
    match answer {
        Some(v) if !v.is_blank() => v.display(),
        _ => NO_ANSWER.to_string(),
    }
}

/// One table per boolean/select/radio field, in schema order. Every response
/// adds exactly one tally to every table.
pub fn aggregate(schema: &FormSchema, responses: &[FormResponse]) -> Vec<FieldFrequency> {
    let mut tables: Vec<FieldFrequency> = schema
        .iter()
        .filter(|f| f.kind.is_enumerable())
        .map(FieldFrequency::new)
        .collect();

    for response in responses {
        for table in tables.iter_mut() {
            let answer = response.response_data.get(&table.field_id);
            table.tally(label_for(table.kind, answer));
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::models::form_response::AnswerMap;
    use uuid::Uuid;

    use super::*;

    fn field(id: &str, kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            kind,
            label: format!("{id}?"),
            placeholder: None,
            required: false,
            options: None,
            help_text: None,
        }
    }

    fn response(answers: &[(&str, AnswerValue)]) -> FormResponse {
        FormResponse {
            id: Uuid::new_v4(),
            form_id: Uuid::nil(),
            response_data: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<AnswerMap>(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn boolean_yes_no_counts() {
        let schema = FormSchema::new(vec![field("attend", FieldKind::Boolean)]);
        let responses = vec![
            response(&[("attend", AnswerValue::Boolean(true))]),
            response(&[("attend", AnswerValue::Boolean(true))]),
            response(&[("attend", AnswerValue::Boolean(false))]),
        ];

        let tables = aggregate(&schema, &responses);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].buckets,
            vec![
                FrequencyBucket {
                    name: "Yes".into(),
                    value: 2
                },
                FrequencyBucket {
                    name: "No".into(),
                    value: 1
                },
            ]
        );
    }

    #[test]
    fn boolean_tables_sum_to_response_count() {
        let schema = FormSchema::new(vec![field("attend", FieldKind::Boolean)]);
        let responses = vec![
            response(&[("attend", AnswerValue::Boolean(true))]),
            response(&[]),
            response(&[("attend", AnswerValue::Text("yes".into()))]),
            response(&[("attend", AnswerValue::Text(String::new()))]),
            response(&[("attend", AnswerValue::Number(0.0))]),
            response(&[("attend", AnswerValue::Text(" ".into()))]),
        ];

        let table = &aggregate(&schema, &responses)[0];
        let sum: u64 = table.buckets.iter().map(|b| b.value).sum();
        assert_eq!(sum, responses.len() as u64);
        assert_eq!(table.total, responses.len() as u64);
        assert_eq!(table.count(YES), 3);
        assert_eq!(table.count(NO), 3);
    }

    #[test]
    fn only_enumerable_fields_in_schema_order() {
        let schema = FormSchema::new(vec![
            field("svc", FieldKind::Radio),
            field("name", FieldKind::Text),
            field("agree", FieldKind::Checkbox),
            field("hall", FieldKind::Select),
            field("attend", FieldKind::Boolean),
        ]);
        let ids: Vec<_> = aggregate(&schema, &[])
            .into_iter()
            .map(|t| t.field_id)
            .collect();
        assert_eq!(ids, vec!["svc", "hall", "attend"]);
    }

    #[test]
    fn choice_labels_in_first_seen_order_with_missing_bucket() {
        let schema = FormSchema::new(vec![field("svc", FieldKind::Select)]);
        let responses = vec![
            response(&[("svc", AnswerValue::Choice("Second".into()))]),
            response(&[("svc", AnswerValue::Choice("First".into()))]),
            response(&[("svc", AnswerValue::Choice("Second".into()))]),
            response(&[("svc", AnswerValue::Choice(String::new()))]),
            response(&[]),
        ];

        let table = &aggregate(&schema, &responses)[0];
        let names: Vec<_> = table.buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First", NO_ANSWER]);
        assert_eq!(table.count("Second"), 2);
        assert_eq!(table.count(NO_ANSWER), 2);
        assert_eq!(table.total, 5);
    }
}
