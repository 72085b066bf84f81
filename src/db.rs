//! In-memory stand-in for the storefront database.
//!
//! Tables are plain vectors of JSON objects. Statements are pseudo-SQL and
//! only the shapes the API service issues are understood:
//!
//! - `SELECT * FROM <table> [WHERE ...] [ORDER BY <col> [ASC|DESC]] [LIMIT n]`
//! - `INSERT INTO <table>` with the row object as the first parameter
//! - `UPDATE <table> SET col = ?, col = col - ? [WHERE ...]`
//! - `DELETE FROM <table> [WHERE ...]`
//!
//! `WHERE` clauses are disjunctions (`OR`) of conjunctions (`AND`) of
//! `col <op> ?|literal` and `col IS NULL`. Placeholders bind parameters in
//! the order they appear. There are no transactions and no indexes.

use std::{
    cmp::Ordering as CmpOrdering,
    collections::{HashMap, VecDeque},
    sync::{
        LazyLock, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::DateTime;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

mod seed;

pub type Row = Value;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DbError {
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("connection lost: {0}")]
    Connection(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Malformed row in {table}: {reason}")]
    MalformedRow { table: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Typed variants decide directly. Untyped `Other` errors fall back to
    /// matching on the message: anything mentioning validation or a required
    /// field is final, timeouts and connectivity problems are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            DbError::Timeout(_) | DbError::Connection(_) | DbError::Network(_) => true,
            DbError::Validation(_)
            | DbError::UnsupportedStatement(_)
            | DbError::MalformedRow { .. } => false,
            DbError::Other(message) => {
                if message.contains("validation")
                    || message.contains("Invalid")
                    || message.contains("required")
                {
                    return false;
                }
                message.contains("timeout")
                    || message.contains("connection")
                    || message.contains("network")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub insert_id: Option<String>,
    pub affected_rows: u64,
}

static FROM_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\s+(\w+)").expect("valid from regex"));
static INTO_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bINTO\s+(\w+)").expect("valid into regex"));
static UPDATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*UPDATE\s+(\w+)").expect("valid update regex"));
static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\w+)\s*(<=|>=|!=|=|<|>)\s*(\?|'[^']*'|-?\d+(?:\.\d+)?|true|false)$")
        .expect("valid condition regex")
});
static IS_NULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\w+)\s+IS\s+NULL$").expect("valid is-null regex"));
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\w+)\s*=\s*(?:(\w+)\s*([-+])\s*)?\?$").expect("valid assignment regex")
});
static ORDER_BY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bORDER\s+BY\s+(\w+)(?:\s+(ASC|DESC))?").expect("valid order regex")
});
static LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)").expect("valid limit regex"));

#[derive(Debug)]
pub struct MockDatabase {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    faults: Mutex<VecDeque<DbError>>,
    latency_ms: AtomicU64,
    calls: AtomicU64,
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDatabase {
    /// A database pre-populated with the storefront catalogue.
    pub fn new() -> Self {
        Self::with_tables(seed::tables())
    }

    /// A database with every table present but empty.
    pub fn empty() -> Self {
        let tables = seed::TABLES
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self::with_tables(tables)
    }

    fn with_tables(tables: HashMap<String, Vec<Row>>) -> Self {
        Self {
            tables: RwLock::new(tables),
            faults: Mutex::new(VecDeque::new()),
            latency_ms: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    /// Queue errors returned by the next calls, one per call.
    pub fn fail_next(&self, errors: impl IntoIterator<Item = DbError>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.extend(errors);
        }
    }

    /// Delay applied to every call before it touches the tables.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of statements received, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        self.before_call().await?;

        let table = capture_table(&FROM_TABLE, sql)?;
        let mut binds = Binds::new(params);
        let filter = Filter::parse(sql, &mut binds)?;

        let tables = self.tables.read().await;
        let Some(rows) = tables.get(&table) else {
            tracing::debug!(table = %table, "query against unknown table");
            return Ok(Vec::new());
        };

        let mut selected: Vec<Row> = rows.iter().filter(|row| filter.matches(row)).cloned().collect();

        if let Some(caps) = ORDER_BY.captures(sql) {
            let column = caps[1].to_string();
            let descending = caps
                .get(2)
                .is_some_and(|dir| dir.as_str().eq_ignore_ascii_case("desc"));
            selected.sort_by(|a, b| {
                let ord = compare(field(a, &column), field(b, &column)).unwrap_or(CmpOrdering::Equal);
                if descending { ord.reverse() } else { ord }
            });
        }

        if let Some(caps) = LIMIT.captures(sql) {
            if let Ok(limit) = caps[1].parse::<usize>() {
                selected.truncate(limit);
            }
        }

        Ok(selected)
    }

    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DbError> {
        self.before_call().await?;

        let verb = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match verb.as_str() {
            "INSERT" => self.insert(sql, params).await,
            "UPDATE" => self.update(sql, params).await,
            "DELETE" => self.delete(sql, params).await,
            _ => Err(DbError::UnsupportedStatement(sql.to_string())),
        }
    }

    async fn before_call(&self) -> Result<(), DbError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let fault = self
            .faults
            .lock()
            .map_err(|_| DbError::Other("fault queue poisoned".to_string()))?
            .pop_front();
        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn insert(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DbError> {
        let table = capture_table(&INTO_TABLE, sql)?;
        let Some(Value::Object(record)) = params.first() else {
            return Err(DbError::Validation(format!(
                "INSERT INTO {table} requires a row object"
            )));
        };

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        let next_id = rows
            .iter()
            .filter_map(|row| field(row, "id").as_str()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = next_id.to_string();

        let mut record = record.clone();
        record.insert("id".to_string(), Value::String(id.clone()));
        rows.push(Value::Object(record));

        Ok(ExecResult {
            insert_id: Some(id),
            affected_rows: 1,
        })
    }

    async fn update(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DbError> {
        let table = capture_table(&UPDATE_TABLE, sql)?;
        let upper = sql.to_ascii_uppercase();
        let set_start = find_keyword(&upper, "SET")
            .ok_or_else(|| DbError::UnsupportedStatement(sql.to_string()))?;
        let set_end = find_keyword(&upper, "WHERE").unwrap_or(sql.len());
        let set_clause = &sql[set_start + 3..set_end];

        let mut binds = Binds::new(params);
        let assignments = set_clause
            .split(',')
            .map(|part| Assignment::parse(part.trim(), &mut binds))
            .collect::<Result<Vec<_>, _>>()?;
        let filter = Filter::parse(sql, &mut binds)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(ExecResult {
                insert_id: None,
                affected_rows: 0,
            });
        };

        let mut affected = 0;
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            let Value::Object(fields) = row else { continue };
            for assignment in &assignments {
                assignment.apply(fields);
            }
            affected += 1;
        }

        Ok(ExecResult {
            insert_id: None,
            affected_rows: affected,
        })
    }

    async fn delete(&self, sql: &str, params: &[Value]) -> Result<ExecResult, DbError> {
        let table = capture_table(&FROM_TABLE, sql)?;
        let mut binds = Binds::new(params);
        let filter = Filter::parse(sql, &mut binds)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(ExecResult {
                insert_id: None,
                affected_rows: 0,
            });
        };

        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok(ExecResult {
            insert_id: None,
            affected_rows: (before - rows.len()) as u64,
        })
    }
}

fn capture_table(pattern: &Regex, sql: &str) -> Result<String, DbError> {
    pattern
        .captures(sql)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| DbError::UnsupportedStatement(sql.to_string()))
}

/// Byte offset of a standalone keyword in an upper-cased statement.
fn find_keyword(upper: &str, keyword: &str) -> Option<usize> {
    let bytes = upper.as_bytes();
    let mut from = 0;
    while let Some(pos) = upper[from..].find(keyword) {
        let start = from + pos;
        let end = start + keyword.len();
        let before_ok = start == 0 || !is_word_byte(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        if before_ok && after_ok {
            return Some(start);
        }
        from = end;
    }
    None
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn field<'a>(row: &'a Row, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Number(_), _) | (_, Value::Number(_)) => as_number(a)?.partial_cmp(&as_number(b)?),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(CmpOrdering::Equal),
        _ => None,
    }
}

struct Binds<'a> {
    params: std::slice::Iter<'a, Value>,
}

impl<'a> Binds<'a> {
    fn new(params: &'a [Value]) -> Self {
        Self {
            params: params.iter(),
        }
    }

    fn next(&mut self) -> Result<Value, DbError> {
        self.params
            .next()
            .cloned()
            .ok_or_else(|| DbError::Validation("missing statement parameter".to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug)]
enum Condition {
    Compare { column: String, op: Op, value: Value },
    IsNull(String),
}

impl Condition {
    fn parse(text: &str, binds: &mut Binds<'_>) -> Result<Self, DbError> {
        if let Some(caps) = IS_NULL.captures(text) {
            return Ok(Condition::IsNull(caps[1].to_string()));
        }
        let caps = CONDITION
            .captures(text)
            .ok_or_else(|| DbError::UnsupportedStatement(format!("condition `{text}`")))?;
        let op = match &caps[2] {
            "=" => Op::Eq,
            "!=" => Op::Ne,
            "<" => Op::Lt,
            "<=" => Op::Le,
            ">" => Op::Gt,
            _ => Op::Ge,
        };
        let raw = &caps[3];
        let value = if raw == "?" {
            binds.next()?
        } else if let Some(text) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            Value::String(text.to_string())
        } else if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
            Value::Bool(raw.eq_ignore_ascii_case("true"))
        } else {
            serde_json::from_str(raw).unwrap_or(Value::Null)
        };
        Ok(Condition::Compare {
            column: caps[1].to_string(),
            op,
            value,
        })
    }

    fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::IsNull(column) => field(row, column).is_null(),
            Condition::Compare { column, op, value } => {
                let actual = field(row, column);
                let ord = compare(actual, value);
                match op {
                    Op::Eq => ord == Some(CmpOrdering::Equal) || actual == value,
                    Op::Ne => !(ord == Some(CmpOrdering::Equal) || actual == value),
                    Op::Lt => ord == Some(CmpOrdering::Less),
                    Op::Le => matches!(ord, Some(CmpOrdering::Less | CmpOrdering::Equal)),
                    Op::Gt => ord == Some(CmpOrdering::Greater),
                    Op::Ge => matches!(ord, Some(CmpOrdering::Greater | CmpOrdering::Equal)),
                }
            }
        }
    }
}

/// `WHERE` clause as OR-of-ANDs. An empty filter matches every row.
#[derive(Debug, Default)]
struct Filter {
    any_of: Vec<Vec<Condition>>,
}

impl Filter {
    fn parse(sql: &str, binds: &mut Binds<'_>) -> Result<Self, DbError> {
        let upper = sql.to_ascii_uppercase();
        let Some(start) = find_keyword(&upper, "WHERE") else {
            return Ok(Filter::default());
        };
        let body_start = start + "WHERE".len();
        let end = [
            find_keyword(&upper[body_start..], "ORDER"),
            find_keyword(&upper[body_start..], "LIMIT"),
        ]
        .into_iter()
        .flatten()
        .min()
        .map_or(sql.len(), |offset| body_start + offset);

        let clause = &sql[body_start..end];
        let clause_upper = &upper[body_start..end];

        let mut any_of = Vec::new();
        for (group, group_upper) in split_keyword(clause, clause_upper, "OR") {
            let mut all_of = Vec::new();
            for (condition, _) in split_keyword(group, group_upper, "AND") {
                all_of.push(Condition::parse(condition.trim(), binds)?);
            }
            any_of.push(all_of);
        }
        Ok(Filter { any_of })
    }

    fn matches(&self, row: &Row) -> bool {
        self.any_of.is_empty()
            || self
                .any_of
                .iter()
                .any(|all_of| all_of.iter().all(|condition| condition.matches(row)))
    }
}

/// Splits on a standalone keyword, keeping the upper-cased twin aligned.
fn split_keyword<'a>(text: &'a str, upper: &'a str, keyword: &str) -> Vec<(&'a str, &'a str)> {
    let mut parts = Vec::new();
    let mut rest = (text, upper);
    while let Some(pos) = find_keyword(rest.1, keyword) {
        parts.push((&rest.0[..pos], &rest.1[..pos]));
        let next = pos + keyword.len();
        rest = (&rest.0[next..], &rest.1[next..]);
    }
    parts.push(rest);
    parts
}

#[derive(Debug)]
struct Assignment {
    column: String,
    delta: Option<(String, char)>,
    value: Value,
}

impl Assignment {
    fn parse(text: &str, binds: &mut Binds<'_>) -> Result<Self, DbError> {
        let caps = ASSIGNMENT
            .captures(text)
            .ok_or_else(|| DbError::UnsupportedStatement(format!("assignment `{text}`")))?;
        let delta = match (caps.get(2), caps.get(3)) {
            (Some(base), Some(sign)) => Some((
                base.as_str().to_string(),
                sign.as_str().chars().next().unwrap_or('+'),
            )),
            _ => None,
        };
        Ok(Assignment {
            column: caps[1].to_string(),
            delta,
            value: binds.next()?,
        })
    }

    fn apply(&self, fields: &mut Map<String, Value>) {
        let new_value = match &self.delta {
            None => self.value.clone(),
            Some((base, sign)) => {
                let current = fields.get(base).unwrap_or(&Value::Null);
                arithmetic(current, &self.value, *sign)
            }
        };
        fields.insert(self.column.clone(), new_value);
    }
}

/// `current ± operand`, clamped at zero for subtraction.
fn arithmetic(current: &Value, operand: &Value, sign: char) -> Value {
    if let (Some(a), Some(b)) = (current.as_i64(), operand.as_i64()) {
        let result = if sign == '-' { (a - b).max(0) } else { a + b };
        return Value::from(result);
    }
    let a = as_number(current).unwrap_or(0.0);
    let b = as_number(operand).unwrap_or(0.0);
    let result = if sign == '-' { (a - b).max(0.0) } else { a + b };
    Value::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn seeded_catalogue_is_queryable() {
        let db = MockDatabase::new();
        let plants = db.query("SELECT * FROM plants", &[]).await.unwrap();
        assert_eq!(plants.len(), 6);
        let categories = db.query("SELECT * FROM categories", &[]).await.unwrap();
        assert_eq!(categories.len(), 4);
    }

    #[tokio::test]
    async fn where_clause_binds_parameters_in_order() {
        let db = MockDatabase::new();
        let rows = db
            .query(
                "SELECT * FROM plants WHERE category = ? AND stock > ?",
                &[json!("indoor"), json!(10)],
            )
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "6"]);
    }

    #[tokio::test]
    async fn or_is_null_matches_missing_user() {
        let db = MockDatabase::empty();
        db.execute(
            "INSERT INTO user_preferences",
            &[json!({ "user_id": null, "language": "ne" })],
        )
        .await
        .unwrap();
        let rows = db
            .query(
                "SELECT * FROM user_preferences WHERE user_id = ? OR user_id IS NULL LIMIT 1",
                &[json!("someone")],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["language"], "ne");
    }

    #[tokio::test]
    async fn order_by_and_limit() {
        let db = MockDatabase::new();
        let rows = db
            .query("SELECT * FROM plants ORDER BY price DESC LIMIT 2", &[])
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Fiddle Leaf Fig", "Monstera Deliciosa"]);
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_per_table() {
        let db = MockDatabase::new();
        let first = db
            .execute("INSERT INTO orders", &[json!({ "order_number": "MG1" })])
            .await
            .unwrap();
        let second = db
            .execute("INSERT INTO orders", &[json!({ "order_number": "MG2" })])
            .await
            .unwrap();
        assert_eq!(first.insert_id.as_deref(), Some("1"));
        assert_eq!(second.insert_id.as_deref(), Some("2"));

        let plant = db
            .execute("INSERT INTO plants", &[json!({ "name": "Aloe" })])
            .await
            .unwrap();
        assert_eq!(plant.insert_id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn insert_without_row_is_a_validation_error() {
        let db = MockDatabase::new();
        let err = db.execute("INSERT INTO orders", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn stock_decrement_clamps_at_zero() {
        let db = MockDatabase::new();
        let result = db
            .execute(
                "UPDATE plants SET stock = stock - ?, updated_at = ? WHERE id = ?",
                &[json!(100), json!("2026-01-01T00:00:00Z"), json!("4")],
            )
            .await
            .unwrap();
        assert_eq!(result.affected_rows, 1);

        let rows = db
            .query("SELECT * FROM plants WHERE id = ?", &[json!("4")])
            .await
            .unwrap();
        assert_eq!(rows[0]["stock"], json!(0));
        assert_eq!(rows[0]["updated_at"], json!("2026-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn delete_with_and_without_filter() {
        let db = MockDatabase::new();
        let one = db
            .execute("DELETE FROM plants WHERE id = ?", &[json!("1")])
            .await
            .unwrap();
        assert_eq!(one.affected_rows, 1);
        let rest = db.execute("DELETE FROM plants", &[]).await.unwrap();
        assert_eq!(rest.affected_rows, 5);
    }

    #[tokio::test]
    async fn injected_faults_are_consumed_one_per_call() {
        let db = MockDatabase::new();
        db.fail_next([DbError::Connection("reset".into())]);
        assert!(db.query("SELECT * FROM plants", &[]).await.is_err());
        assert!(db.query("SELECT * FROM plants", &[]).await.is_ok());
        assert_eq!(db.call_count(), 2);
    }

    #[tokio::test]
    async fn unknown_statements_are_rejected() {
        let db = MockDatabase::new();
        let err = db.execute("TRUNCATE plants", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::UnsupportedStatement(_)));
    }

    #[test]
    fn retry_classification_for_untyped_errors() {
        assert!(DbError::Other("socket timeout".into()).is_retryable());
        assert!(DbError::Other("network unreachable".into()).is_retryable());
        assert!(!DbError::Other("Invalid connection string".into()).is_retryable());
        assert!(!DbError::Other("name is required".into()).is_retryable());
        assert!(!DbError::Other("disk full".into()).is_retryable());
    }
}
