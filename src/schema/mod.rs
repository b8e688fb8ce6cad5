//! The JSON-Schema-like dialect (spec §4.4–§4.6, §6): a validator, a
//! defaulter, and a repair synthesizer, all walking the same `Schema`
//! shape. No inheritance hierarchy (spec §9 "Tagged variants over
//! inheritance") — the validator dispatches on which schema keywords are
//! present at a node, not on a schema subtype.

mod defaulter;
mod repair_synth;
mod validator;

pub use defaulter::apply_defaults;
pub use repair_synth::{repair_with_schema, RepairSuggestion, RepairSynthesisResult};
pub use validator::{Validator, Violation};

use crate::value::Value;

/// An Object-shaped [`Value`] interpreted as a recursive schema. A
/// non-object value is treated as an empty (always-passing) schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema(pub Value);

impl Schema {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Schema {
    fn from(v: Value) -> Self {
        Schema(v)
    }
}
