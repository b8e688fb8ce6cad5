//! Repair suggestion synthesizer (spec §4.6): runs the validator in
//! collect-all mode and attempts a local fix per violation, gated by
//! [`ValidationRepairConfig`]. Fixes are dispatched by the internal
//! [`Violation::keyword`] the validator already computed, rather than by
//! re-parsing the public error's message text.

use crate::error::{ErrorKind, ValidationError};
use crate::options::ValidationRepairConfig;
use crate::path::Path;
use crate::schema::defaulter::apply_defaults;
use crate::schema::validator::{Validator, Violation};
use crate::schema::Schema;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct RepairSuggestion {
    pub path: String,
    pub error_kind: ErrorKind,
    pub message: String,
    pub suggestion: String,
    pub original_value: Option<Value>,
    pub suggested_value: Option<Value>,
    pub auto_fixable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairSynthesisResult {
    pub valid: bool,
    pub fully_repaired: bool,
    pub repaired_value: Value,
    pub suggestions: Vec<RepairSuggestion>,
    pub unfixable_errors: Vec<ValidationError>,
}

/// Attempts to repair `value` against `schema` using the validator's
/// collect-all violations and the fixes enabled in `cfg`.
pub fn repair_with_schema(
    value: &Value,
    schema: &Schema,
    validator: &Validator,
    cfg: &ValidationRepairConfig,
) -> RepairSynthesisResult {
    let initially_valid = validator.collect(value, schema).is_empty();
    let mut working = value.clone();

    if cfg.use_defaults {
        working = apply_defaults(&working, schema);
    }

    let mut suggestions = Vec::new();
    let mut unfixable_errors = Vec::new();

    // A handful of passes: fixing one violation (e.g. removing an extra
    // property) can change which violations remain, so we iterate until a
    // pass makes no further progress or we hit a small cap.
    for _ in 0..4 {
        let violations = validator.collect(&working, schema);
        if violations.is_empty() {
            break;
        }
        let mut progressed = false;
        let mut still_unfixable = Vec::new();
        for violation in violations {
            match try_fix(&mut working, schema, &violation, cfg) {
                Some(suggestion) => {
                    suggestions.push(suggestion);
                    progressed = true;
                }
                None => still_unfixable.push(violation),
            }
        }
        unfixable_errors = still_unfixable.into_iter().map(Violation::into_error).collect();
        if !progressed {
            break;
        }
    }

    if cfg.max_suggestions > 0 && suggestions.len() > cfg.max_suggestions {
        suggestions.truncate(cfg.max_suggestions);
    }

    let valid = validator.collect(&working, schema).is_empty();
    let fully_repaired = unfixable_errors.is_empty() && (!suggestions.is_empty() || initially_valid) && valid;

    RepairSynthesisResult {
        valid,
        fully_repaired,
        repaired_value: working,
        suggestions,
        unfixable_errors,
    }
}

fn schema_at_path<'a>(schema: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = schema;
    for segment in path.segments_for_schema_lookup() {
        match segment {
            PathLookupSegment::Key(key) => {
                let props = current.as_object()?.get("properties")?.as_object()?;
                current = props.get(key.as_str())?;
            }
            PathLookupSegment::Index(_) => {
                current = current.as_object()?.get("items")?;
            }
        }
    }
    Some(current)
}

fn value_at_path_mut<'a>(value: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in path.segments_for_schema_lookup() {
        current = match (segment, current) {
            (PathLookupSegment::Key(key), Value::Object(obj)) => obj.get_mut(key.as_str())?,
            (PathLookupSegment::Index(i), Value::Array(items)) => items.get_mut(i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn parent_and_key(path: &Path) -> Option<(Path, String)> {
    let segs = path.segments_for_schema_lookup();
    let last = segs.last()?;
    let key = match last {
        PathLookupSegment::Key(k) => k.clone(),
        PathLookupSegment::Index(_) => return None,
    };
    let mut parent = path.clone();
    parent.pop();
    Some((parent, key))
}

fn try_fix(
    working: &mut Value,
    schema: &Schema,
    violation: &Violation,
    cfg: &ValidationRepairConfig,
) -> Option<RepairSuggestion> {
    match violation.keyword {
        "additionalProperties" if cfg.remove_extra_properties => {
            let (parent_path, key) = parent_and_key(&violation.path)?;
            let parent = value_at_path_mut(working, &parent_path)?;
            let original = parent.as_object_mut()?.remove(&key)?;
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("remove additional property '{}'", key),
                original_value: Some(original),
                suggested_value: None,
                auto_fixable: true,
            })
        }
        "minimum" | "maximum" if cfg.clamp_numbers => {
            let local_schema = schema_at_path(schema.value(), &violation.path)?;
            let target = value_at_path_mut(working, &violation.path)?;
            let n = target.as_f64()?;
            let bound = local_schema
                .as_object()?
                .get(violation.keyword)
                .and_then(Value::as_f64)?;
            let original = target.clone();
            *target = Value::Number(bound);
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("clamp {} to {} {}", n, violation.keyword, bound),
                original_value: Some(original),
                suggested_value: Some(Value::Number(bound)),
                auto_fixable: true,
            })
        }
        "maxLength" if cfg.truncate_strings => {
            let local_schema = schema_at_path(schema.value(), &violation.path)?;
            let max = local_schema.as_object()?.get("maxLength").and_then(Value::as_f64)? as usize;
            let target = value_at_path_mut(working, &violation.path)?;
            let s = target.as_str()?.to_string();
            let truncated: String = s.chars().take(max).collect();
            let original = target.clone();
            *target = Value::String(truncated.clone());
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("truncate string to {} characters", max),
                original_value: Some(original),
                suggested_value: Some(Value::String(truncated)),
                auto_fixable: true,
            })
        }
        "maxItems" if cfg.truncate_arrays => {
            let local_schema = schema_at_path(schema.value(), &violation.path)?;
            let max = local_schema.as_object()?.get("maxItems").and_then(Value::as_f64)? as usize;
            let target = value_at_path_mut(working, &violation.path)?;
            let items = target.as_array()?.to_vec();
            let truncated: Vec<Value> = items.into_iter().take(max).collect();
            let original = target.clone();
            *target = Value::Array(truncated.clone());
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("truncate array to {} items", max),
                original_value: Some(original),
                suggested_value: Some(Value::Array(truncated)),
                auto_fixable: true,
            })
        }
        "enum" if cfg.fix_enums => {
            let local_schema = schema_at_path(schema.value(), &violation.path)?;
            let Value::Array(members) = local_schema.as_object()?.get("enum")? else { return None };
            let target = value_at_path_mut(working, &violation.path)?;
            let s = target.as_str()?.to_string();
            let matched = members.iter().find_map(|m| {
                m.as_str().filter(|ms| ms.eq_ignore_ascii_case(&s)).map(|ms| ms.to_string())
            })?;
            let original = target.clone();
            *target = Value::String(matched.clone());
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("snap '{}' to enum member '{}'", s, matched),
                original_value: Some(original),
                suggested_value: Some(Value::String(matched)),
                auto_fixable: true,
            })
        }
        "format" if cfg.fix_formats => {
            let local_schema = schema_at_path(schema.value(), &violation.path)?;
            let format = local_schema.as_object()?.get("format")?.as_str()?;
            let target = value_at_path_mut(working, &violation.path)?;
            let s = target.as_str()?.to_string();
            let fixed = fix_format(format, &s)?;
            let original = target.clone();
            *target = Value::String(fixed.clone());
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("normalize {} format", format),
                original_value: Some(original),
                suggested_value: Some(Value::String(fixed)),
                auto_fixable: true,
            })
        }
        "type" if cfg.coerce_types => {
            let local_schema = schema_at_path(schema.value(), &violation.path)?;
            let target = value_at_path_mut(working, &violation.path)?;
            let coerced = coerce_type(target, local_schema)?;
            let original = target.clone();
            *target = coerced.clone();
            Some(RepairSuggestion {
                path: violation.path.to_path_string(),
                error_kind: violation.kind,
                message: violation.message.clone(),
                suggestion: format!("coerce {} to {}", original.type_name(), coerced.type_name()),
                original_value: Some(original),
                suggested_value: Some(coerced),
                auto_fixable: true,
            })
        }
        _ => None,
    }
}

/// Coercion matrix per spec §4.6: `string -> number/boolean/integer`,
/// `number -> string`. Array/scalar reshaping is explicitly excluded.
fn coerce_type(value: &Value, local_schema: &Value) -> Option<Value> {
    let wanted = local_schema.as_object()?.get("type")?.as_str()?;
    match (value, wanted) {
        (Value::String(s), "number") => s.trim().parse::<f64>().ok().map(Value::Number),
        (Value::String(s), "integer") => {
            let n: f64 = s.trim().parse().ok()?;
            if n.trunc() == n {
                Some(Value::Number(n))
            } else {
                None
            }
        }
        (Value::String(s), "boolean") => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        (Value::Number(_), "string") => Some(Value::String(value.to_json_string())),
        _ => None,
    }
}

fn fix_format(format: &str, s: &str) -> Option<String> {
    match format {
        "email" => Some(s.trim().to_ascii_lowercase()),
        "uuid" => {
            let hex: String = s.chars().filter(|c| c.is_ascii_hexdigit()).collect();
            if hex.len() == 32 {
                Some(format!(
                    "{}-{}-{}-{}-{}",
                    &hex[0..8],
                    &hex[8..12],
                    &hex[12..16],
                    &hex[16..20],
                    &hex[20..32]
                ))
            } else {
                None
            }
        }
        _ => None,
    }
}

enum PathLookupSegment {
    Key(String),
    Index(usize),
}

impl Path {
    fn segments_for_schema_lookup(&self) -> Vec<PathLookupSegment> {
        // Re-derive segments from the rendered path string; `Path` keeps
        // its internal segment list private, so we walk the public
        // `$.a[0].b` grammar the same way `path::path_str_to_pointer` does.
        let rendered = self.to_path_string();
        let rest = rendered.strip_prefix('$').unwrap_or(&rendered);
        let chars: Vec<char> = rest.chars().collect();
        let n = chars.len();
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < n {
            match chars[i] {
                '.' => {
                    let start = i + 1;
                    let mut j = start;
                    while j < n && chars[j] != '.' && chars[j] != '[' {
                        j += 1;
                    }
                    out.push(PathLookupSegment::Key(chars[start..j].iter().collect()));
                    i = j;
                }
                '[' => {
                    let mut j = i + 1;
                    if j < n && chars[j] == '"' {
                        j += 1;
                        let start = j;
                        while j < n && chars[j] != '"' {
                            if chars[j] == '\\' {
                                j += 1;
                            }
                            j += 1;
                        }
                        let raw: String = chars[start..j].iter().collect();
                        out.push(PathLookupSegment::Key(raw.replace("\\\"", "\"").replace("\\\\", "\\")));
                        j += 1;
                        if j < n && chars[j] == ']' {
                            j += 1;
                        }
                    } else {
                        let start = j;
                        while j < n && chars[j] != ']' {
                            j += 1;
                        }
                        let token: String = chars[start..j].iter().collect();
                        if let Ok(idx) = token.parse::<usize>() {
                            out.push(PathLookupSegment::Index(idx));
                        }
                        if j < n {
                            j += 1;
                        }
                    }
                    i = j;
                }
                _ => i += 1,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(Object::from_iter(pairs.into_iter().map(|(k, v)| (k.to_string(), v))))
    }

    #[test]
    fn s8_coerce_clamp_and_remove_extra() {
        let schema = Schema::new(obj(vec![
            ("required", Value::Array(vec![Value::String("name".into()), Value::String("age".into())])),
            ("additionalProperties", Value::Bool(false)),
            (
                "properties",
                obj(vec![
                    ("name", obj(vec![("type", Value::String("string".into()))])),
                    (
                        "age",
                        obj(vec![
                            ("type", Value::String("integer".into())),
                            ("minimum", Value::Number(0.0)),
                            ("maximum", Value::Number(120.0)),
                        ]),
                    ),
                ]),
            ),
        ]));
        let value = obj(vec![
            ("name", Value::String("  Bob  ".into())),
            ("age", Value::String("200".into())),
            ("extra", Value::String("x".into())),
        ]);
        let validator = Validator::new();
        let cfg = ValidationRepairConfig {
            coerce_types: true,
            clamp_numbers: true,
            remove_extra_properties: true,
            ..Default::default()
        };
        let result = repair_with_schema(&value, &schema, &validator, &cfg);
        assert!(result.valid);
        let repaired = result.repaired_value.as_object().unwrap();
        assert_eq!(repaired.get("name").unwrap().as_str(), Some("  Bob  "));
        assert_eq!(repaired.get("age").unwrap().as_f64(), Some(120.0));
        assert!(repaired.get("extra").is_none());
        assert!(result.suggestions.iter().any(|s| s.path == "$.age"));
        assert!(result.suggestions.iter().any(|s| s.path == "$.extra"));
    }

    #[test]
    fn unfixable_errors_remain_when_no_matching_option_enabled() {
        let schema = Schema::new(obj(vec![("properties", obj(vec![("n", obj(vec![("minimum", Value::Number(10.0))]))]))]));
        let value = obj(vec![("n", Value::Number(1.0))]);
        let validator = Validator::new();
        let cfg = ValidationRepairConfig::default();
        let result = repair_with_schema(&value, &schema, &validator, &cfg);
        assert!(!result.valid);
        assert_eq!(result.unfixable_errors.len(), 1);
        assert!(result.suggestions.is_empty());
    }
}
