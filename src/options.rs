//! Configuration records (spec §3, §6). Plain option structs with
//! `Default` impls, in the same idiom as the donor crate's `Options`:
//! booleans default to `false`, enums pick their first documented variant.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    #[default]
    FirstWins,
    LastWins,
    Error,
}

/// Gates each textual pre-pass of the repairing parser (spec §4.3 step B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairConfig {
    pub fix_smart_quotes: bool,
    pub strip_json_comments: bool,
    pub replace_python_literals: bool,
    pub convert_kv_object_to_json: bool,
    pub quote_unquoted_keys: bool,
    pub drop_trailing_commas: bool,
    pub allow_single_quotes: bool,
    pub duplicate_key_policy: DuplicateKeyPolicy,
}

/// Per-parse repair trace (spec §3 `RepairMetadata`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairMetadata {
    pub extracted_from_fence: bool,
    pub fixed_smart_quotes: bool,
    pub stripped_comments: bool,
    pub replaced_python_literals: bool,
    pub converted_kv_object: bool,
    pub quoted_unquoted_keys: bool,
    pub dropped_trailing_commas: bool,
    pub duplicate_key_count: usize,
    pub duplicate_key_policy: DuplicateKeyPolicy,
}

/// Gates each local fix the repair synthesizer is allowed to apply (spec
/// §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationRepairConfig {
    pub coerce_types: bool,
    pub use_defaults: bool,
    pub clamp_numbers: bool,
    pub truncate_strings: bool,
    pub truncate_arrays: bool,
    pub remove_extra_properties: bool,
    pub fix_enums: bool,
    pub fix_formats: bool,
    /// 0 = unlimited.
    pub max_suggestions: usize,
}

/// `{maxBufferBytes?, maxItems?}`. `None` or `Some(0)` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamLimits {
    pub max_buffer_bytes: Option<u64>,
    pub max_items: Option<u64>,
}

impl StreamLimits {
    pub fn max_buffer_bytes_effective(&self) -> Option<u64> {
        self.max_buffer_bytes.filter(|&m| m > 0)
    }

    pub fn max_items_effective(&self) -> Option<u64> {
        self.max_items.filter(|&m| m > 0)
    }
}
