use crate::error::{Result, StoreError};
use serde_json::{Map, Value};

/// Fields the store owns; a patch can never change them.
pub const PROTECTED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// A shallow partial update: top-level fields to overwrite, keyed by their
/// persisted (camelCase) names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Map<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Build a patch from a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::InvalidPayload(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Overlay this patch on `target`, skipping store-owned fields.
    pub fn apply_to(&self, target: &mut Map<String, Value>) {
        for (field, value) in &self.0 {
            if PROTECTED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            target.insert(field.clone(), value.clone());
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_overwrites_and_adds_fields() {
        let mut target = json!({"name": "Old", "isActive": true})
            .as_object()
            .cloned()
            .unwrap();
        Patch::new()
            .set("name", "New")
            .set("location", "Wing C")
            .apply_to(&mut target);

        assert_eq!(target["name"], "New");
        assert_eq!(target["location"], "Wing C");
        assert_eq!(target["isActive"], true);
    }

    #[test]
    fn apply_skips_protected_fields() {
        let mut target = json!({"id": "shops_1", "createdAt": "t0"})
            .as_object()
            .cloned()
            .unwrap();
        Patch::new()
            .set("id", "hijacked")
            .set("createdAt", "t9")
            .apply_to(&mut target);

        assert_eq!(target["id"], "shops_1");
        assert_eq!(target["createdAt"], "t0");
    }

    #[test]
    fn from_value_requires_object() {
        assert!(Patch::from_value(json!({"a": 1})).is_ok());
        let err = Patch::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payload: expected a JSON object, got an array");
    }
}
