//! The schema walker (spec §4.4): a single recursive function produces an
//! ordered list of low-level [`Violation`]s; `validate_all` turns those
//! into public [`ValidationError`]s and `validate` is fail-fast sugar over
//! `validate_all` (return the first error, if any). Keeping one internal
//! representation means the repair synthesizer (schema/repair_synth.rs)
//! can dispatch fixes by `keyword` without re-parsing error messages.

use std::cell::RefCell;
use std::collections::HashMap;

use regex::Regex;

use crate::error::{ErrorKind, ValidationError};
use crate::path::Path;
use crate::schema::Schema;
use crate::value::{Object, Value};

/// Internal pre-error record: keyword name (for repair-synthesis
/// dispatch), the path at which it failed, and the human message/kind
/// that will become the public [`ValidationError`].
#[derive(Debug, Clone)]
pub struct Violation {
    pub keyword: &'static str,
    pub path: Path,
    pub message: String,
    pub kind: ErrorKind,
}

impl Violation {
    fn new(keyword: &'static str, path: &Path, message: impl Into<String>) -> Self {
        Self { keyword, path: path.clone(), message: message.into(), kind: ErrorKind::Type }
    }

    fn schema(keyword: &'static str, path: &Path, message: impl Into<String>) -> Self {
        Self { keyword, path: path.clone(), message: message.into(), kind: ErrorKind::Schema }
    }

    pub fn into_error(self) -> ValidationError {
        ValidationError::new(self.kind, self.message, &self.path)
    }
}

/// Owns the regex compilation cache for `pattern`/`format` keywords (spec
/// §9 "Regex compilation caches may be per-validator instance; they must
/// not be process-global mutable singletons").
pub struct Validator {
    pattern_cache: RefCell<HashMap<String, Option<Regex>>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self { pattern_cache: RefCell::new(HashMap::new()) }
    }

    /// Fail-fast entry point: the first collected violation, if any.
    pub fn validate(&self, value: &Value, schema: &Schema) -> Result<(), ValidationError> {
        match self.collect(value, schema).into_iter().next() {
            Some(v) => Err(v.into_error()),
            None => Ok(()),
        }
    }

    /// Collect-all entry point: every violation, in document order
    /// (depth-first, pre-order per failed keyword at each node).
    pub fn validate_all(&self, value: &Value, schema: &Schema) -> Vec<ValidationError> {
        self.collect(value, schema).into_iter().map(Violation::into_error).collect()
    }

    /// Low-level collect-all used internally by the repair synthesizer.
    pub fn collect(&self, value: &Value, schema: &Schema) -> Vec<Violation> {
        let mut out = Vec::new();
        self.walk(value, schema.value(), &Path::root(), &mut out);
        for v in &out {
            tracing::trace!("validator: {} failed at {} ({})", v.keyword, v.path.to_path_string(), v.message);
        }
        tracing::debug!("validator: collected {} violation(s)", out.len());
        out
    }

    fn with_pattern(&self, pattern: &str, f: impl FnOnce(Option<&Regex>)) {
        let mut cache = self.pattern_cache.borrow_mut();
        let entry = cache
            .entry(pattern.to_string())
            .or_insert_with(|| Regex::new(pattern).ok());
        f(entry.as_ref());
    }

    fn walk(&self, value: &Value, schema: &Value, path: &Path, out: &mut Vec<Violation>) {
        let schema_obj = match schema.as_object() {
            Some(o) => o,
            None => return,
        };

        if let Some(t) = schema_obj.get("type") {
            self.check_type(t, value, path, out);
        }
        if let Some(e) = schema_obj.get("enum") {
            self.check_enum(e, value, path, out);
        }
        if let Some(c) = schema_obj.get("const") {
            self.check_const(c, value, path, out);
        }

        self.check_numeric(schema_obj, value, path, out);
        self.check_string(schema_obj, value, path, out);
        self.check_container(schema_obj, value, path, out);
        self.check_composition(schema_obj, value, path, out);
        self.check_dependent_required(schema_obj, value, path, out);
    }

    fn check_type(&self, t: &Value, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        let allowed: Vec<&str> = match t {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(|v| v.as_str()).collect(),
            _ => return,
        };
        let matches = allowed.iter().any(|&ty| type_matches(ty, value));
        if !matches {
            out.push(Violation::new(
                "type",
                path,
                format!("expected type {}, found {}", allowed.join(" or "), value.type_name()),
            ));
        }
    }

    fn check_enum(&self, e: &Value, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        if let Value::Array(items) = e {
            if !items.iter().any(|item| item == value) {
                out.push(Violation::new("enum", path, "value is not one of the enum members"));
            }
        }
    }

    fn check_const(&self, c: &Value, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        if c != value {
            out.push(Violation::new("const", path, "value does not match const"));
        }
    }

    fn check_numeric(&self, schema_obj: &Object, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        let Value::Number(n) = value else { return };
        if let Some(min) = schema_obj.get("minimum").and_then(Value::as_f64) {
            if *n < min {
                out.push(Violation::new("minimum", path, format!("{} is less than minimum {}", n, min)));
            }
        }
        if let Some(max) = schema_obj.get("maximum").and_then(Value::as_f64) {
            if *n > max {
                out.push(Violation::new("maximum", path, format!("{} is greater than maximum {}", n, max)));
            }
        }
        if let Some(m) = schema_obj.get("multipleOf").and_then(Value::as_f64) {
            if m > 0.0 {
                let ratio = n / m;
                if (ratio - ratio.round()).abs() > 1e-9 {
                    out.push(Violation::new(
                        "multipleOf",
                        path,
                        format!("{} is not a multiple of {}", n, m),
                    ));
                }
            }
        }
    }

    fn check_string(&self, schema_obj: &Object, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        let Value::String(s) = value else { return };
        let len = s.chars().count();
        if let Some(min) = schema_obj.get("minLength").and_then(Value::as_f64) {
            if (len as f64) < min {
                out.push(Violation::new("minLength", path, format!("length {} is less than minLength {}", len, min)));
            }
        }
        if let Some(max) = schema_obj.get("maxLength").and_then(Value::as_f64) {
            if (len as f64) > max {
                out.push(Violation::new("maxLength", path, format!("length {} is greater than maxLength {}", len, max)));
            }
        }
        if let Some(Value::String(pattern)) = schema_obj.get("pattern") {
            let mut failed = false;
            let mut schema_error = false;
            self.with_pattern(pattern, |re| match re {
                Some(re) => failed = !re.is_match(s),
                None => schema_error = true,
            });
            if schema_error {
                out.push(Violation::schema("pattern", path, format!("invalid regex pattern: {}", pattern)));
            } else if failed {
                out.push(Violation::new("pattern", path, format!("value does not match pattern {}", pattern)));
            }
        }
        if let Some(Value::String(format)) = schema_obj.get("format") {
            if let Some(ok) = check_format(format, s) {
                if !ok {
                    out.push(Violation::new("format", path, format!("value does not match format {}", format)));
                }
            }
        }
    }

    fn check_container(&self, schema_obj: &Object, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        match value {
            Value::Object(obj) => self.check_object(schema_obj, obj, path, out),
            Value::Array(items) => self.check_array(schema_obj, items, path, out),
            _ => {}
        }
    }

    fn check_object(&self, schema_obj: &Object, obj: &Object, path: &Path, out: &mut Vec<Violation>) {
        if let Some(Value::Array(required)) = schema_obj.get("required") {
            for key in required {
                if let Some(k) = key.as_str() {
                    if !obj.contains_key(k) {
                        out.push(Violation::new(
                            "required",
                            path,
                            format!("missing required property '{}'", k),
                        ));
                    }
                }
            }
        }

        let properties = schema_obj.get("properties").and_then(Value::as_object);
        if let Some(props) = properties {
            for (key, value) in obj.iter() {
                if let Some(sub) = props.get(key) {
                    self.walk(value, sub, &path.with_key(key), out);
                }
            }
        }

        if let Some(additional) = schema_obj.get("additionalProperties") {
            let known: Vec<&str> = properties.map(|p| p.keys().collect()).unwrap_or_default();
            match additional {
                Value::Bool(false) => {
                    for (key, _) in obj.iter() {
                        if !known.contains(&key) {
                            out.push(Violation::new(
                                "additionalProperties",
                                &path.with_key(key),
                                format!("unexpected additional property '{}'", key),
                            ));
                        }
                    }
                }
                Value::Object(_) => {
                    for (key, value) in obj.iter() {
                        if !known.contains(&key) {
                            self.walk(value, additional, &path.with_key(key), out);
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(Value::Object(names_schema)) = schema_obj.get("propertyNames") {
            for (key, _) in obj.iter() {
                self.walk(
                    &Value::String(key.to_string()),
                    &Value::Object(names_schema.clone()),
                    &path.with_key(key),
                    out,
                );
            }
        }

        if let Some(min) = schema_obj.get("minProperties").and_then(Value::as_f64) {
            if (obj.len() as f64) < min {
                out.push(Violation::new(
                    "minProperties",
                    path,
                    format!("object has {} properties, fewer than minProperties {}", obj.len(), min),
                ));
            }
        }
        if let Some(max) = schema_obj.get("maxProperties").and_then(Value::as_f64) {
            if (obj.len() as f64) > max {
                out.push(Violation::new(
                    "maxProperties",
                    path,
                    format!("object has {} properties, more than maxProperties {}", obj.len(), max),
                ));
            }
        }
    }

    fn check_array(&self, schema_obj: &Object, items: &[Value], path: &Path, out: &mut Vec<Violation>) {
        if let Some(item_schema) = schema_obj.get("items") {
            for (i, item) in items.iter().enumerate() {
                self.walk(item, item_schema, &path.with_index(i), out);
            }
        }
        if let Some(min) = schema_obj.get("minItems").and_then(Value::as_f64) {
            if (items.len() as f64) < min {
                out.push(Violation::new(
                    "minItems",
                    path,
                    format!("array has {} items, fewer than minItems {}", items.len(), min),
                ));
            }
        }
        if let Some(max) = schema_obj.get("maxItems").and_then(Value::as_f64) {
            if (items.len() as f64) > max {
                out.push(Violation::new(
                    "maxItems",
                    path,
                    format!("array has {} items, more than maxItems {}", items.len(), max),
                ));
            }
        }

        if let Some(contains_schema) = schema_obj.get("contains") {
            let min_contains = schema_obj.get("minContains").and_then(Value::as_f64).unwrap_or(1.0);
            if min_contains == 0.0 {
                // Open Question resolution (spec §9): minContains:0 is
                // unconditionally successful, the `contains` schema is not
                // even evaluated.
                return;
            }
            let max_contains = schema_obj.get("maxContains").and_then(Value::as_f64);
            let matches = items
                .iter()
                .filter(|item| self.collect_sub(item, contains_schema).is_empty())
                .count();
            if (matches as f64) < min_contains {
                out.push(Violation::new(
                    "contains",
                    path,
                    format!("only {} item(s) match 'contains', need at least {}", matches, min_contains),
                ));
            } else if let Some(max_c) = max_contains {
                if (matches as f64) > max_c {
                    out.push(Violation::new(
                        "contains",
                        path,
                        format!("{} item(s) match 'contains', more than maxContains {}", matches, max_c),
                    ));
                }
            }
        }
    }

    fn collect_sub(&self, value: &Value, schema: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        self.walk(value, schema, &Path::root(), &mut out);
        out
    }

    fn check_composition(&self, schema_obj: &Object, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        if let Some(Value::Array(schemas)) = schema_obj.get("allOf") {
            for sub in schemas {
                self.walk(value, sub, path, out);
            }
        }
        if let Some(Value::Array(schemas)) = schema_obj.get("anyOf") {
            let any_ok = schemas.iter().any(|s| self.collect_sub(value, s).is_empty());
            if !any_ok {
                out.push(Violation::new("anyOf", path, "value does not match any schema in anyOf"));
            }
        }
        if let Some(Value::Array(schemas)) = schema_obj.get("oneOf") {
            let matches = schemas.iter().filter(|s| self.collect_sub(value, s).is_empty()).count();
            if matches == 0 {
                out.push(Violation::new("oneOf", path, "value does not match any schema in oneOf"));
            } else if matches > 1 {
                // Open Question resolution (spec §9): >1 matches is a type failure.
                out.push(Violation::new(
                    "oneOf",
                    path,
                    format!("value matches {} schemas in oneOf, expected exactly 1", matches),
                ));
            }
        }
        if let Some(if_schema) = schema_obj.get("if") {
            let if_ok = self.collect_sub(value, if_schema).is_empty();
            if if_ok {
                if let Some(then_schema) = schema_obj.get("then") {
                    self.walk(value, then_schema, path, out);
                }
            } else if let Some(else_schema) = schema_obj.get("else") {
                self.walk(value, else_schema, path, out);
            }
        }
    }

    fn check_dependent_required(&self, schema_obj: &Object, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        let Value::Object(obj) = value else { return };
        let Some(Value::Object(deps)) = schema_obj.get("dependentRequired") else { return };
        for (key, required) in deps.iter() {
            if !obj.contains_key(key) {
                continue;
            }
            if let Value::Array(required) = required {
                for req_key in required {
                    if let Some(rk) = req_key.as_str() {
                        if !obj.contains_key(rk) {
                            out.push(Violation::new(
                                "dependentRequired",
                                path,
                                format!("presence of '{}' requires '{}'", key, rk),
                            ));
                        }
                    }
                }
            }
        }
    }
}

fn type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "integer" => value.is_integer(),
        other => other == value.type_name(),
    }
}

/// Returns `None` for unknown format names (accepted, warn-only per spec
/// §4.4), `Some(bool)` for a known one.
fn check_format(format: &str, s: &str) -> Option<bool> {
    match format {
        "email" => {
            let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
            Some(re.is_match(s))
        }
        "uuid" => {
            let re = Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            )
            .unwrap();
            Some(re.is_match(s))
        }
        "date-time" => {
            let re = Regex::new(
                r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$",
            )
            .unwrap();
            Some(re.is_match(s))
        }
        _ => None,
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
    fn s3_required_and_additional_properties_and_minimum() {
        let validator = Validator::new();
        let schema = Schema::new(obj(vec![
            ("required", Value::Array(vec![Value::String("name".into())])),
            ("additionalProperties", Value::Bool(false)),
            (
                "properties",
                obj(vec![
                    ("name", obj(vec![("type", Value::String("string".into())), ("minLength", Value::Number(2.0))])),
                    ("age", obj(vec![("type", Value::String("integer".into())), ("minimum", Value::Number(0.0))])),
                ]),
            ),
        ]));
        let value = obj(vec![("age", Value::Number(-1.0)), ("extra", Value::Number(1.0))]);
        let errors = validator.validate_all(&value, &schema);
        assert!(errors.len() >= 2);
        assert!(errors.iter().any(|e| e.path == "$.name" && e.json_pointer == "/name"));
    }

    #[test]
    fn fail_fast_and_collect_all_agree_on_validity() {
        let validator = Validator::new();
        let schema = Schema::new(obj(vec![("type", Value::String("string".into()))]));
        assert!(validator.validate(&Value::Number(1.0), &schema).is_err());
        assert!(!validator.validate_all(&Value::Number(1.0), &schema).is_empty());
        assert!(validator.validate(&Value::String("x".into()), &schema).is_ok());
        assert!(validator.validate_all(&Value::String("x".into()), &schema).is_empty());
    }

    #[test]
    fn min_contains_zero_short_circuits() {
        let validator = Validator::new();
        let schema = Schema::new(obj(vec![
            ("type", Value::String("array".into())),
            ("contains", obj(vec![("type", Value::String("string".into()))])),
            ("minContains", Value::Number(0.0)),
        ]));
        let value = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert!(validator.validate_all(&value, &schema).is_empty());
    }

    #[test]
    fn one_of_with_more_than_one_match_is_a_failure() {
        let validator = Validator::new();
        let schema = Schema::new(obj(vec![(
            "oneOf",
            Value::Array(vec![
                obj(vec![("type", Value::String("number".into()))]),
                obj(vec![("minimum", Value::Number(0.0))]),
            ]),
        )]));
        let errors = validator.validate_all(&Value::Number(5.0), &schema);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Type);
    }

    #[test]
    fn invalid_pattern_is_a_schema_error() {
        let validator = Validator::new();
        let schema = Schema::new(obj(vec![("pattern", Value::String("(".into()))]));
        let errors = validator.validate_all(&Value::String("x".into()), &schema);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Schema);
    }
}
