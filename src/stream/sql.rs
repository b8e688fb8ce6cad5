//! SQL streaming (spec §4.8's SQL paragraph, §6's SQL contract): a
//! degenerate stream segmented on `;` rather than JSON depth, handed to an
//! external [`SqlValidator`] collaborator. [`BasicSqlValidator`] is a
//! reference implementation so the path is exercisable end to end without
//! pulling in a real SQL parser (spec.md's extractor/parser non-goal is
//! about format-specific *parsing*, not this validation contract).

use regex::Regex;

use crate::error::ValidationError;
use crate::options::StreamLimits;
use crate::stream::{StreamCore, StreamOutcome};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlValidationSchema {
    pub allowed_statements: Vec<String>,
    pub require_limit: bool,
    pub require_where: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatementSummary {
    pub sql: String,
    pub statement_type: String,
    pub has_where: bool,
    pub has_from: bool,
    pub has_limit: bool,
    pub limit: Option<Value>,
    pub has_union: bool,
    pub has_comments: bool,
    pub has_subquery: bool,
    pub tables: Vec<String>,
}

/// The collaborator contract (spec §6): given SQL text and a schema,
/// either summarize the statement or fail with a [`ValidationError`]
/// anchored at the violated field (e.g. `$.limit`).
pub trait SqlValidator {
    fn validate(&self, sql: &str, schema: &SqlValidationSchema) -> Result<SqlStatementSummary, ValidationError>;
}

/// Keyword/regex heuristics: detects statement type from the first
/// keyword, table names from `FROM`/`JOIN`, and `LIMIT n` via regex. Not a
/// SQL parser — a minimal reference collaborator.
#[derive(Debug, Default)]
pub struct BasicSqlValidator;

impl BasicSqlValidator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlValidator for BasicSqlValidator {
    fn validate(&self, sql: &str, schema: &SqlValidationSchema) -> Result<SqlStatementSummary, ValidationError> {
        let trimmed = sql.trim();
        let statement_type = first_keyword(trimmed).to_ascii_lowercase();

        if !schema.allowed_statements.is_empty()
            && !schema.allowed_statements.iter().any(|s| s.eq_ignore_ascii_case(&statement_type))
        {
            return Err(ValidationError::from_path_str(
                crate::error::ErrorKind::Type,
                format!("statement type '{}' is not allowed", statement_type),
                "$.statementType",
            ));
        }

        let upper = trimmed.to_ascii_uppercase();
        let has_where = upper.contains("WHERE");
        let has_from = upper.contains("FROM");
        let has_union = upper.contains("UNION");
        let has_comments = trimmed.contains("--") || trimmed.contains("/*");
        let has_subquery = count_occurrences(&upper, "SELECT") > 1;

        let limit_re = Regex::new(r"(?i)\bLIMIT\s+(\d+)").unwrap();
        let limit_value = limit_re.captures(trimmed).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse::<f64>().ok());
        let has_limit = limit_value.is_some();

        let tables = extract_tables(trimmed);

        if schema.require_limit && !has_limit {
            return Err(ValidationError::from_path_str(
                crate::error::ErrorKind::Type,
                "statement is missing a required LIMIT clause",
                "$.limit",
            ));
        }
        if schema.require_where && !has_where {
            return Err(ValidationError::from_path_str(
                crate::error::ErrorKind::Type,
                "statement is missing a required WHERE clause",
                "$.where",
            ));
        }

        Ok(SqlStatementSummary {
            sql: trimmed.to_string(),
            statement_type,
            has_where,
            has_from,
            has_limit,
            limit: limit_value.map(Value::Number),
            has_union,
            has_comments,
            has_subquery,
            tables,
        })
    }
}

fn first_keyword(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or("")
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn extract_tables(sql: &str) -> Vec<String> {
    let re = Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    re.captures_iter(sql).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()).collect()
}

/// Segments the stream on `;` (or EOF after `finish()`), validating each
/// statement through an `SqlValidator` collaborator.
pub struct SqlStreamParser<V: SqlValidator> {
    core: StreamCore,
    schema: SqlValidationSchema,
    validator: V,
    outcome: Option<StreamOutcome<SqlStatementSummary>>,
}

impl SqlStreamParser<BasicSqlValidator> {
    pub fn new(schema: SqlValidationSchema, limits: StreamLimits) -> Self {
        Self::with_validator(schema, limits, BasicSqlValidator::new())
    }
}

impl<V: SqlValidator> SqlStreamParser<V> {
    pub fn with_validator(schema: SqlValidationSchema, limits: StreamLimits, validator: V) -> Self {
        Self { core: StreamCore::new(limits), schema, validator, outcome: None }
    }

    pub fn append(&mut self, chunk: &str) -> StreamOutcome<SqlStatementSummary> {
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

    pub fn poll(&mut self) -> StreamOutcome<SqlStatementSummary> {
        if let Some(done) = &self.outcome {
            return done.clone();
        }
        if let Some(stmt) = self.core.next_sql_statement() {
            let outcome = match self.validator.validate(&stmt, &self.schema) {
                Ok(summary) => StreamOutcome::done_ok(summary),
                Err(err) => StreamOutcome::failure(err),
            };
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s7_missing_required_limit_fails() {
        let schema = SqlValidationSchema {
            allowed_statements: vec!["select".to_string()],
            require_limit: true,
            require_where: false,
        };
        let mut parser = SqlStreamParser::new(schema, StreamLimits::default());
        parser.append("SELECT id FROM users WHERE id=1;");
        let outcome = parser.poll();
        assert!(outcome.done);
        assert!(!outcome.ok);
        let err = outcome.error.unwrap();
        assert_eq!(err.path, "$.limit");
        assert_eq!(err.json_pointer, "/limit");
    }

    #[test]
    fn basic_validator_summarizes_a_passing_statement() {
        let validator = BasicSqlValidator::new();
        let schema = SqlValidationSchema::default();
        let summary = validator.validate("SELECT id FROM users JOIN orders ON 1=1 LIMIT 10", &schema).unwrap();
        assert_eq!(summary.statement_type, "select");
        assert!(summary.has_from);
        assert!(summary.has_limit);
        assert_eq!(summary.limit, Some(Value::Number(10.0)));
        assert!(summary.tables.contains(&"users".to_string()));
        assert!(summary.tables.contains(&"orders".to_string()));
    }
}
