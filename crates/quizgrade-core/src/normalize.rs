//! Field normalization.
//!
//! Turns tracker-shaped custom fields into one `FieldValue` per question.

use std::collections::HashMap;

use crate::model::{FieldPayload, FieldValue, RawField};

/// Submitted answers keyed by question identifier.
pub type NormalizedFields = HashMap<String, FieldValue>;

/// Normalize a list of raw fields. Later fields with the same name win.
pub fn normalize_fields(fields: &[RawField]) -> NormalizedFields {
    fields
        .iter()
        .map(|field| (field.name.clone(), normalize_payload(&field.payload)))
        .collect()
}

/// Normalize a single payload.
pub fn normalize_payload(payload: &FieldPayload) -> FieldValue {
    match payload {
        FieldPayload::SingleChoice {
            selected: Some(label),
        } => FieldValue::Choice(label.clone()),
        FieldPayload::MultiChoice { selected } if !selected.is_empty() => {
            FieldValue::MultiChoice(selected.iter().cloned().collect())
        }
        FieldPayload::Text { value: Some(text) } if !text.is_empty() => {
            FieldValue::Text(text.clone())
        }
        _ => FieldValue::Missing,
    }
}
