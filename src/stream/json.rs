//! JSON stream collectors (spec §4.8): four variants sharing one
//! [`StreamCore`], differing only in when they emit and whether they
//! apply schema defaults.

use crate::error::{ErrorKind, LimitKind, ValidationError};
use crate::options::{RepairConfig, StreamLimits};
use crate::repair;
use crate::schema::{apply_defaults, Schema, Validator};
use crate::stream::{StreamCore, StreamOutcome};
use crate::value::Value;

fn parse_validate(
    span: &str,
    cfg: &RepairConfig,
    schema: &Schema,
    validator: &Validator,
    with_defaults: bool,
) -> Result<Value, ValidationError> {
    let (mut value, _fixed, _meta) = repair::parse_candidate(span, false, cfg)?;
    if with_defaults {
        value = apply_defaults(&value, schema);
    }
    validator.validate(&value, schema)?;
    Ok(value)
}

fn incomplete_error(core: &StreamCore) -> ValidationError {
    if core.has_unconsumed_non_whitespace() {
        ValidationError::from_path_str(ErrorKind::Parse, "stream finished with an incomplete value", "$.stream.incomplete")
    } else {
        ValidationError::from_path_str(ErrorKind::Parse, "stream finished before any value was parsed", "$.stream.incomplete")
    }
}

fn items_limit_error(current: u64, max: u64) -> ValidationError {
    ValidationError::limit_error("$.stream.maxItems", LimitKind::MaxItems, current, max)
}

/// Emits a single value as soon as the first complete top-level value
/// parses and validates. `finish()` without a value is an error.
pub struct JsonStreamParser {
    core: StreamCore,
    schema: Schema,
    cfg: RepairConfig,
    validator: Validator,
    outcome: Option<StreamOutcome<Value>>,
}

impl JsonStreamParser {
    pub fn new(schema: Schema, cfg: RepairConfig, limits: StreamLimits) -> Self {
        Self { core: StreamCore::new(limits), schema, cfg, validator: Validator::new(), outcome: None }
    }

    pub fn append(&mut self, chunk: &str) -> StreamOutcome<Value> {
        if let Some(done) = &self.outcome {
            return done.clone();
        }
        if let Some(err) = self.core.append(chunk) {
            let outcome = StreamOutcome::failure(err);
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        StreamOutcome::pending()
    }

    pub fn finish(&mut self) {
        self.core.finish();
    }

    pub fn poll(&mut self) -> StreamOutcome<Value> {
        if let Some(done) = &self.outcome {
            return done.clone();
        }
        if let Some(span) = self.core.next_value_span() {
            let outcome = match parse_validate(&span, &self.cfg, &self.schema, &self.validator, false) {
                Ok(value) => StreamOutcome::done_ok(value),
                Err(err) => StreamOutcome::failure(err),
            };
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        if self.core.is_finished() {
            let outcome = StreamOutcome::failure(incomplete_error(&self.core));
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        StreamOutcome::pending()
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.outcome = None;
    }
}

/// Emits the full array of values, but only once `close()` has been called.
pub struct JsonStreamCollector {
    core: StreamCore,
    schema: Schema,
    cfg: RepairConfig,
    validator: Validator,
    items: Vec<Value>,
    closed: bool,
    outcome: Option<StreamOutcome<Vec<Value>>>,
}

impl JsonStreamCollector {
    pub fn new(schema: Schema, cfg: RepairConfig, limits: StreamLimits) -> Self {
        Self {
            core: StreamCore::new(limits),
            schema,
            cfg,
            validator: Validator::new(),
            items: Vec::new(),
            closed: false,
            outcome: None,
        }
    }

    pub fn append(&mut self, chunk: &str) -> StreamOutcome<()> {
        if let Some(done) = &self.outcome {
            return StreamOutcome {
                done: done.done,
                ok: done.ok,
                value: None,
                error: done.error.clone(),
            };
        }
        if let Some(err) = self.core.append(chunk) {
            let outcome = StreamOutcome::failure(err.clone());
            self.outcome = Some(StreamOutcome::failure(err));
            return outcome;
        }
        if let Err(err) = self.drain() {
            let outcome = StreamOutcome::failure(err.clone());
            self.outcome = Some(StreamOutcome::failure(err));
            return outcome;
        }
        StreamOutcome::pending()
    }

    pub fn close(&mut self) {
        self.core.finish();
        self.closed = true;
    }

    pub fn poll(&mut self) -> StreamOutcome<Vec<Value>> {
        if let Some(done) = &self.outcome {
            return done.clone();
        }
        if let Err(err) = self.drain() {
            let outcome = StreamOutcome::failure(err);
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        if self.closed {
            let outcome = if self.core.has_unconsumed_non_whitespace() {
                StreamOutcome::failure(incomplete_error(&self.core))
            } else {
                StreamOutcome::done_ok(std::mem::take(&mut self.items))
            };
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        StreamOutcome::pending()
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.items.clear();
        self.closed = false;
        self.outcome = None;
    }

    fn drain(&mut self) -> Result<(), ValidationError> {
        while let Some(span) = self.core.next_value_span() {
            let value = parse_validate(&span, &self.cfg, &self.schema, &self.validator, false)?;
            if let Some(max) = self.core.max_items_effective() {
                let current = self.items.len() as u64 + 1;
                if current > max {
                    return Err(items_limit_error(current, max));
                }
            }
            self.items.push(value);
        }
        Ok(())
    }
}

/// Emits the batch of newly-completed items on every `poll()`.
pub struct JsonStreamBatchCollector {
    core: StreamCore,
    schema: Schema,
    cfg: RepairConfig,
    validator: Validator,
    total_count: u64,
    closed: bool,
    apply_defaults: bool,
    outcome: Option<StreamOutcome<Vec<Value>>>,
}

impl JsonStreamBatchCollector {
    pub fn new(schema: Schema, cfg: RepairConfig, limits: StreamLimits) -> Self {
        Self::new_with_defaults(schema, cfg, limits, false)
    }

    fn new_with_defaults(schema: Schema, cfg: RepairConfig, limits: StreamLimits, apply_defaults: bool) -> Self {
        Self {
            core: StreamCore::new(limits),
            schema,
            cfg,
            validator: Validator::new(),
            total_count: 0,
            closed: false,
            apply_defaults,
            outcome: None,
        }
    }

    pub fn append(&mut self, chunk: &str) -> StreamOutcome<Vec<Value>> {
        if let Some(done) = &self.outcome {
            return done.clone();
        }
        if let Some(err) = self.core.append(chunk) {
            let outcome = StreamOutcome::failure(err);
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        StreamOutcome::pending()
    }

    pub fn close(&mut self) {
        self.core.finish();
        self.closed = true;
    }

    pub fn poll(&mut self) -> StreamOutcome<Vec<Value>> {
        if let Some(done) = &self.outcome {
            return done.clone();
        }
        let mut batch = Vec::new();
        while let Some(span) = self.core.next_value_span() {
            match parse_validate(&span, &self.cfg, &self.schema, &self.validator, self.apply_defaults) {
                Ok(value) => {
                    if let Some(max) = self.core.max_items_effective() {
                        if self.total_count + 1 > max {
                            let outcome = StreamOutcome::failure(items_limit_error(self.total_count + 1, max));
                            self.outcome = Some(outcome.clone());
                            return outcome;
                        }
                    }
                    self.total_count += 1;
                    batch.push(value);
                }
                Err(err) => {
                    let outcome = StreamOutcome::failure(err);
                    self.outcome = Some(outcome.clone());
                    return outcome;
                }
            }
        }
        if self.closed {
            let outcome = StreamOutcome::done_ok(batch);
            self.outcome = Some(outcome.clone());
            return outcome;
        }
        StreamOutcome::open_value(batch)
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.total_count = 0;
        self.closed = false;
        self.outcome = None;
    }
}

/// Like [`JsonStreamBatchCollector`], but applies schema defaults (spec
/// §4.5) to each item before validating it.
pub struct JsonStreamValidatedBatchCollector(JsonStreamBatchCollector);

impl JsonStreamValidatedBatchCollector {
    pub fn new(schema: Schema, cfg: RepairConfig, limits: StreamLimits) -> Self {
        Self(JsonStreamBatchCollector::new_with_defaults(schema, cfg, limits, true))
    }

    pub fn append(&mut self, chunk: &str) -> StreamOutcome<Vec<Value>> {
        self.0.append(chunk)
    }

    pub fn close(&mut self) {
        self.0.close()
    }

    pub fn poll(&mut self) -> StreamOutcome<Vec<Value>> {
        self.0.poll()
    }

    pub fn reset(&mut self) {
        self.0.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(Object::from_iter(pairs.into_iter().map(|(k, v)| (k.to_string(), v))))
    }

    fn age_schema() -> Schema {
        Schema::new(obj(vec![(
            "properties",
            obj(vec![("age", obj(vec![("type", Value::String("integer".into()))]))]),
        )]))
    }

    #[test]
    fn s4_emit_first_trips_max_buffer_bytes() {
        let mut parser =
            JsonStreamParser::new(age_schema(), RepairConfig::default(), StreamLimits { max_buffer_bytes: Some(8), max_items: None });
        let outcome = parser.append("0123456789");
        assert!(outcome.done);
        assert!(!outcome.ok);
        let err = outcome.error.unwrap();
        assert_eq!(err.path, "$.stream.maxBufferBytes");
        assert_eq!(err.limit.unwrap().max, 8);
    }

    #[test]
    fn s5_collector_trips_max_items() {
        let mut collector =
            JsonStreamCollector::new(age_schema(), RepairConfig::default(), StreamLimits { max_buffer_bytes: None, max_items: Some(1) });
        collector.append("{\"age\":1}\n{\"age\":2}\n");
        collector.close();
        let outcome = collector.poll();
        assert!(outcome.done);
        assert!(!outcome.ok);
        let err = outcome.error.unwrap();
        assert_eq!(err.path, "$.stream.maxItems");
        let limit = err.limit.unwrap();
        assert_eq!(limit.current, 2);
        assert_eq!(limit.max, 1);
    }

    #[test]
    fn s6_batch_collector_emits_incrementally() {
        let mut collector = JsonStreamBatchCollector::new(age_schema(), RepairConfig::default(), StreamLimits::default());
        collector.append("{\"age\":1}\n");
        let first = collector.poll();
        assert!(!first.done);
        assert!(first.ok);
        assert_eq!(first.value.unwrap().len(), 1);

        collector.append("{\"age\":2}\n");
        let second = collector.poll();
        assert!(!second.done);
        assert_eq!(second.value.unwrap().len(), 1);

        let third = collector.poll();
        assert!(!third.done);
        assert!(third.value.unwrap().is_empty());

        collector.close();
        let fourth = collector.poll();
        assert!(fourth.done);
        assert!(fourth.ok);
    }

    #[test]
    fn emit_first_finish_without_value_is_incomplete() {
        let mut parser = JsonStreamParser::new(age_schema(), RepairConfig::default(), StreamLimits::default());
        parser.append("not json at all");
        parser.finish();
        let outcome = parser.poll();
        assert!(outcome.done);
        assert!(!outcome.ok);
        assert_eq!(outcome.error.unwrap().path, "$.stream.incomplete");
    }

    #[test]
    fn validated_batch_collector_applies_defaults() {
        let schema = Schema::new(obj(vec![(
            "properties",
            obj(vec![(
                "age",
                obj(vec![("type", Value::String("integer".into())), ("default", Value::Number(18.0))]),
            )]),
        )]));
        let mut collector = JsonStreamValidatedBatchCollector::new(schema, RepairConfig::default(), StreamLimits::default());
        collector.append("{}\n");
        let outcome = collector.poll();
        let batch = outcome.value.unwrap();
        assert_eq!(batch[0].as_object().unwrap().get("age").unwrap().as_f64(), Some(18.0));
    }
}
