//! Lenient, schema-driven parsing and validation for messy LLM-generated
//! text. The core covers JSON end to end (extraction, permissive repair,
//! schema validation, defaulting, repair suggestions, and chunked
//! streaming); YAML/TOML/XML/Markdown/key=value/SQL are external
//! collaborators this crate only defines interfaces for (see
//! [`collaborators`] and [`stream::sql`]).
//!
//! The typical entry points:
//! - [`repair_json`] / [`repair_json_all`] — extract + repair + parse.
//! - [`schema::Validator`] — fail-fast or collect-all schema validation.
//! - [`schema::apply_defaults`] / [`schema::repair_with_schema`] — defaulting
//!   and best-effort repair-suggestion synthesis.
//! - [`stream::json`] / [`stream::sql`] — incremental collectors over
//!   chunked input.

mod classify;
pub mod collaborators;
pub mod error;
mod extract;
mod lexer;
pub mod options;
pub mod path;
mod parser;
mod prepass;
mod repair;
pub mod schema;
pub mod stream;
pub mod value;

pub use error::{ErrorKind, LimitInfo, LimitKind, ValidationError};
pub use options::{DuplicateKeyPolicy, RepairConfig, RepairMetadata, StreamLimits, ValidationRepairConfig};
pub use path::Path;
pub use schema::{apply_defaults, repair_with_schema, RepairSuggestion, RepairSynthesisResult, Schema, Validator};
pub use value::{Object, Value};

/// Extracts the first JSON candidate from `text` (fenced block, or a
/// balanced-brace scan fallback), applies the configured repairs, and
/// strictly parses the result (spec §4.3).
pub fn repair_json(text: &str, cfg: &RepairConfig) -> Result<(Value, String, RepairMetadata), ValidationError> {
    repair::parse(text, cfg)
}

/// Runs [`repair_json`] over every candidate found in `text` (spec §4.3
/// step D).
pub fn repair_json_all(
    text: &str,
    cfg: &RepairConfig,
) -> Result<(Vec<Value>, Vec<String>, Vec<RepairMetadata>), ValidationError> {
    repair::parse_all(text, cfg)
}

/// Convenience wrapper around [`repair_json`] that discards the fixed text
/// and repair metadata, returning only the parsed value.
pub fn parse_json(text: &str, cfg: &RepairConfig) -> Result<Value, ValidationError> {
    repair::parse(text, cfg).map(|(value, _fixed, _meta)| value)
}

/// [`parse_json`] followed by [`schema::apply_defaults`] (spec S2).
pub fn parse_json_with_defaults(text: &str, cfg: &RepairConfig, schema: &Schema) -> Result<Value, ValidationError> {
    let value = parse_json(text, cfg)?;
    Ok(schema::apply_defaults(&value, schema))
}

/// [`repair_json`] followed by [`schema::repair_with_schema`] (spec S8).
pub fn parse_and_repair(
    text: &str,
    repair_cfg: &RepairConfig,
    schema: &Schema,
    validation_cfg: &ValidationRepairConfig,
) -> Result<RepairSynthesisResult, ValidationError> {
    let value = parse_json(text, repair_cfg)?;
    let validator = Validator::new();
    Ok(schema::repair_with_schema(&value, schema, &validator, validation_cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(Object::from_iter(pairs.into_iter().map(|(k, v)| (k.to_string(), v))))
    }

    #[test]
    fn s1_top_level_repair_json() {
        let cfg = RepairConfig { drop_trailing_commas: true, ..Default::default() };
        let (value, _fixed, meta) = repair_json("```json\n{\"name\":\"Ada\",\"age\":12,}\n```", &cfg).unwrap();
        let result = value.as_object().unwrap();
        assert_eq!(result.get("name").unwrap().as_str(), Some("Ada"));
        assert_eq!(result.get("age").unwrap().as_f64(), Some(12.0));
        assert!(meta.extracted_from_fence);
        assert!(meta.dropped_trailing_commas);
    }

    #[test]
    fn s2_top_level_parse_with_defaults() {
        let schema = Schema::new(obj(vec![
            ("required", Value::Array(vec![Value::String("name".into()), Value::String("age".into())])),
            (
                "properties",
                obj(vec![
                    ("name", obj(vec![("type", Value::String("string".into()))])),
                    (
                        "age",
                        obj(vec![("type", Value::String("integer".into())), ("default", Value::Number(18.0))]),
                    ),
                ]),
            ),
        ]));
        let value = parse_json_with_defaults("```json\n{\"name\":\"Ada\"}\n```", &RepairConfig::default(), &schema).unwrap();
        let result = value.as_object().unwrap();
        assert_eq!(result.get("name").unwrap().as_str(), Some("Ada"));
        assert_eq!(result.get("age").unwrap().as_f64(), Some(18.0));
    }

    #[test]
    fn s8_top_level_parse_and_repair() {
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
        let validation_cfg = ValidationRepairConfig {
            coerce_types: true,
            clamp_numbers: true,
            remove_extra_properties: true,
            ..Default::default()
        };
        let result = parse_and_repair(
            "```json\n{\"name\":\"  Bob  \",\"age\":\"200\",\"extra\":\"x\"}\n```",
            &RepairConfig::default(),
            &schema,
            &validation_cfg,
        )
        .unwrap();
        assert!(result.valid);
        let repaired = result.repaired_value.as_object().unwrap();
        assert_eq!(repaired.get("name").unwrap().as_str(), Some("  Bob  "));
        assert_eq!(repaired.get("age").unwrap().as_f64(), Some(120.0));
        assert!(repaired.get("extra").is_none());
    }
}
