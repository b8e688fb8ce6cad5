//! Fills missing object properties from `default` (spec §4.5). Applied
//! bottom-up: nested objects are defaulted first, so a parent's `default`
//! for a key that is itself an object schema sees fully-defaulted
//! children if it needed to look.

use crate::schema::Schema;
use crate::value::Value;

/// Returns a new value with missing `properties[k].default` values
/// injected. Never overwrites a key already present in `value`.
pub fn apply_defaults(value: &Value, schema: &Schema) -> Value {
    apply(value, schema.value())
}

fn apply(value: &Value, schema: &Value) -> Value {
    let Some(schema_obj) = schema.as_object() else {
        return value.clone();
    };
    match value {
        Value::Object(obj) => {
            let mut result = obj.clone();
            if let Some(Value::Object(props)) = schema_obj.get("properties") {
                for (key, sub_schema) in props.iter() {
                    if let Some(existing) = result.get(key) {
                        let updated = apply(existing, sub_schema);
                        result.insert(key.to_string(), updated);
                    } else if let Some(default_value) =
                        sub_schema.as_object().and_then(|o| o.get("default"))
                    {
                        result.insert(key.to_string(), default_value.clone());
                    }
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema_obj.get("items") {
                Value::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::Object(_) => apply(item, item_schema),
                            other => other.clone(),
                        })
                        .collect(),
                )
            } else {
                value.clone()
            }
        }
        other => other.clone(),
    }
}
