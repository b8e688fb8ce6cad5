//! Orchestrates the repairing parser pipeline end to end (spec §4.3):
//! extract a candidate, apply the configured text pre-passes in order,
//! then strictly parse the result, recording a full [`RepairMetadata`]
//! trace.

use crate::error::ValidationError;
use crate::extract::{self, Format};
use crate::options::{RepairConfig, RepairMetadata};
use crate::parser::parse_strict;
use crate::prepass;
use crate::value::Value;

/// Runs the full pipeline on `text`, returning the parsed value, the
/// "fixed" text (the textual image after pre-pass rewrites, not a
/// reserialization of the value), and the repair metadata trace.
pub fn parse(text: &str, cfg: &RepairConfig) -> Result<(Value, String, RepairMetadata), ValidationError> {
    let (candidate, extracted_from_fence) = extract::extract_first_candidate(text, Format::Json);
    parse_candidate(&candidate, extracted_from_fence, cfg)
}

/// Repeats extraction + pre-pass + parse for every candidate found in
/// `text`, returning parallel vectors of values, fixed text, and metadata
/// (spec §4.3 step D).
pub fn parse_all(
    text: &str,
    cfg: &RepairConfig,
) -> Result<(Vec<Value>, Vec<String>, Vec<RepairMetadata>), ValidationError> {
    let candidates = extract::extract_candidates(text, Format::Json);
    if candidates.is_empty() {
        let (value, fixed, meta) = parse_candidate(text, false, cfg)?;
        return Ok((vec![value], vec![fixed], vec![meta]));
    }
    let mut values = Vec::with_capacity(candidates.len());
    let mut fixed_texts = Vec::with_capacity(candidates.len());
    let mut metas = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let (value, fixed, meta) = parse_candidate(&candidate, true, cfg)?;
        values.push(value);
        fixed_texts.push(fixed);
        metas.push(meta);
    }
    Ok((values, fixed_texts, metas))
}

pub(crate) fn parse_candidate(
    candidate: &str,
    extracted_from_fence: bool,
    cfg: &RepairConfig,
) -> Result<(Value, String, RepairMetadata), ValidationError> {
    let mut meta = RepairMetadata {
        extracted_from_fence,
        duplicate_key_policy: cfg.duplicate_key_policy,
        ..Default::default()
    };
    let mut s = candidate.to_string();

    if cfg.fix_smart_quotes {
        let (s2, applied) = prepass::smart_quotes(&s);
        s = s2;
        meta.fixed_smart_quotes = applied;
    }
    if cfg.strip_json_comments {
        let (s2, applied) = prepass::strip_json_comments(&s);
        s = s2;
        meta.stripped_comments = applied;
    }
    if cfg.replace_python_literals {
        let (s2, applied) = prepass::replace_python_literals(&s);
        s = s2;
        meta.replaced_python_literals = applied;
    }
    if cfg.convert_kv_object_to_json {
        let (s2, applied) = prepass::convert_kv_to_json(&s);
        s = s2;
        meta.converted_kv_object = applied;
    }
    if cfg.quote_unquoted_keys {
        let (s2, applied) = prepass::quote_unquoted_keys(&s);
        s = s2;
        meta.quoted_unquoted_keys = applied;
    }
    if cfg.drop_trailing_commas {
        let (s2, applied) = prepass::drop_trailing_commas(&s);
        s = s2;
        meta.dropped_trailing_commas = applied;
    }
    if cfg.allow_single_quotes {
        let (s2, _applied) = prepass::allow_single_quotes(&s);
        s = s2;
    }

    tracing::debug!(
        "repair pre-passes applied: fence={} smart_quotes={} comments={} python={} kv={} keys={} trailing_commas={}",
        meta.extracted_from_fence,
        meta.fixed_smart_quotes,
        meta.stripped_comments,
        meta.replaced_python_literals,
        meta.converted_kv_object,
        meta.quoted_unquoted_keys,
        meta.dropped_trailing_commas,
    );

    let (value, dup_count) = parse_strict(&s, cfg.duplicate_key_policy)?;
    meta.duplicate_key_count = dup_count;
    Ok((value, s, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DuplicateKeyPolicy;

    fn cfg_all() -> RepairConfig {
        RepairConfig {
            fix_smart_quotes: true,
            strip_json_comments: true,
            replace_python_literals: true,
            convert_kv_object_to_json: true,
            quote_unquoted_keys: true,
            drop_trailing_commas: true,
            allow_single_quotes: true,
            duplicate_key_policy: DuplicateKeyPolicy::FirstWins,
        }
    }

    #[test]
    fn s1_fenced_json_with_trailing_comma() {
        let cfg = RepairConfig { drop_trailing_commas: true, ..Default::default() };
        let (value, _fixed, meta) =
            parse("```json\n{\"name\":\"Ada\",\"age\":12,}\n```", &cfg).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("name").unwrap().as_str(), Some("Ada"));
        assert_eq!(obj.get("age").unwrap().as_f64(), Some(12.0));
        assert!(meta.extracted_from_fence);
        assert!(meta.dropped_trailing_commas);
    }

    #[test]
    fn repairs_python_literals_and_unquoted_keys_together() {
        let cfg = cfg_all();
        let (value, _fixed, meta) = parse("{a: True, b: None}", &cfg).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("a").unwrap().as_bool(), Some(true));
        assert!(obj.get("b").unwrap().is_null());
        assert!(meta.quoted_unquoted_keys);
        assert!(meta.replaced_python_literals);
    }

    #[test]
    fn parse_all_collects_every_fenced_candidate() {
        let cfg = RepairConfig::default();
        let text = "```json\n{\"a\":1}\n```\n```json\n{\"b\":2}\n```";
        let (values, _fixed, metas) = parse_all(text, &cfg).unwrap();
        assert_eq!(values.len(), 2);
        assert!(metas.iter().all(|m| m.extracted_from_fence));
    }
}
