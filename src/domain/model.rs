use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

pub const MISSING_IDENTITY_REASON: &str = "Missing email, first name, or last name";

/// 輸入表格中的一列聯絡人資料，讀入後不再修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRecord {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
}

impl InputRecord {
    /// 至少要有 email、名或姓其中一項才會送出請求
    pub fn is_identifiable(&self) -> bool {
        self.email.is_some() || self.first_name.is_some() || self.last_name.is_some()
    }
}

/// 送給 API 的查詢身分，每筆記錄只會選出一種
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Email {
        email: String,
        company_name: Option<String>,
    },
    FullName {
        first_name: String,
        last_name: String,
        company_name: Option<String>,
    },
    FirstName {
        first_name: String,
        company_name: Option<String>,
    },
    LastName {
        last_name: String,
        company_name: Option<String>,
    },
}

impl Identity {
    /// Priority: email > first & last name > first name > last name.
    pub fn select(record: &InputRecord) -> Option<Self> {
        let company_name = record.company_name.clone();

        match (&record.email, &record.first_name, &record.last_name) {
            (Some(email), _, _) => Some(Identity::Email {
                email: email.clone(),
                company_name,
            }),
            (None, Some(first), Some(last)) => Some(Identity::FullName {
                first_name: first.clone(),
                last_name: last.clone(),
                company_name,
            }),
            (None, Some(first), None) => Some(Identity::FirstName {
                first_name: first.clone(),
                company_name,
            }),
            (None, None, Some(last)) => Some(Identity::LastName {
                last_name: last.clone(),
                company_name,
            }),
            (None, None, None) => None,
        }
    }

    pub fn company_name(&self) -> Option<&str> {
        match self {
            Identity::Email { company_name, .. }
            | Identity::FullName { company_name, .. }
            | Identity::FirstName { company_name, .. }
            | Identity::LastName { company_name, .. } => company_name.as_deref(),
        }
    }

    /// 查詢參數 (不含 apikey)
    pub fn query_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = match self {
            Identity::Email { email, .. } => vec![("email", email.as_str())],
            Identity::FullName {
                first_name,
                last_name,
                ..
            } => vec![
                ("firstName", first_name.as_str()),
                ("lastName", last_name.as_str()),
            ],
            Identity::FirstName { first_name, .. } => vec![("firstName", first_name.as_str())],
            Identity::LastName { last_name, .. } => vec![("lastName", last_name.as_str())],
        };

        if let Some(company) = self.company_name() {
            params.push(("companyName", company));
        }
        params
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Email { email, .. } => write!(f, "{}", email),
            Identity::FullName {
                first_name,
                last_name,
                ..
            } => write!(f, "{} {}", first_name, last_name),
            Identity::FirstName { first_name, .. } => write!(f, "{}", first_name),
            Identity::LastName { last_name, .. } => write!(f, "{}", last_name),
        }
    }
}

/// 單筆記錄的處理結果，`row` 是該記錄在輸入檔中的位置 (從 0 開始)
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    Success {
        row: usize,
        payload: Map<String, Value>,
    },
    Failure {
        row: usize,
        reason: String,
        record: InputRecord,
    },
}

impl EnrichmentOutcome {
    pub fn missing_identity(row: usize, record: InputRecord) -> Self {
        EnrichmentOutcome::Failure {
            row,
            reason: MISSING_IDENTITY_REASON.to_string(),
            record,
        }
    }

    pub fn row(&self) -> usize {
        match self {
            EnrichmentOutcome::Success { row, .. } | EnrichmentOutcome::Failure { row, .. } => {
                *row
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EnrichmentOutcome::Success { .. })
    }

    /// Top-level fields, in the order they become output columns.
    pub fn envelope(&self) -> Vec<(&'static str, Value)> {
        match self {
            EnrichmentOutcome::Success { row, payload } => vec![
                ("row", Value::from(*row)),
                ("success", Value::Bool(true)),
                ("data", Value::Object(payload.clone())),
            ],
            EnrichmentOutcome::Failure {
                row,
                reason,
                record,
            } => vec![
                ("row", Value::from(*row)),
                ("success", Value::Bool(false)),
                ("error", Value::String(reason.clone())),
                ("email", optional(&record.email)),
                ("firstName", optional(&record.first_name)),
                ("lastName", optional(&record.last_name)),
                ("companyName", optional(&record.company_name)),
            ],
        }
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

// 中繼 JSON 檔案直接使用 envelope 的欄位
impl Serialize for EnrichmentOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let fields = self.envelope();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// 攤平後的一列，欄位依第一次寫入的順序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedRow {
    cells: Vec<(String, Value)>,
}

impl FlattenedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value in place when the column already exists.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn status(&self) -> Option<&str> {
        self.get("status").and_then(Value::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// CSV 儲存格文字；缺少的欄位輸出空字串
    pub fn cell(&self, column: &str) -> String {
        self.get(column).map(render_cell).unwrap_or_default()
    }
}

pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlattenedRow>,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub outcomes: Vec<EnrichmentOutcome>,
    pub table: OutputTable,
    pub artifact_path: PathBuf,
}
