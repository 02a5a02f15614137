// src/models/report.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use std::{fmt, str::FromStr};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Sales,
    Inventory,
    Activity,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Sales => "sales",
            ReportKind::Inventory => "inventory",
            ReportKind::Activity => "activity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Sales => "Sales Report",
            ReportKind::Inventory => "Inventory Report",
            ReportKind::Activity => "Activity Report",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(ReportKind::Sales),
            "inventory" => Ok(ReportKind::Inventory),
            "activity" => Ok(ReportKind::Activity),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    // HTML pronto para "imprimir como PDF"
    Pdf,
}

impl ReportFormat {
    /// Qualquer valor desconhecido cai no JSON (pré-visualização).
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some("csv") => ReportFormat::Csv,
            Some("pdf") => ReportFormat::Pdf,
            _ => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some("week") => TimeRange::Week,
            Some("year") => TimeRange::Year,
            _ => TimeRange::Month,
        }
    }
}

// Parâmetros da query string. Datas chegam como texto para que `startDate=`
// (vazio) seja tratado como ausente.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// json | csv | pdf
    pub format: Option<String>,
    /// week | month | year
    pub time_range: Option<String>,
    /// YYYY-MM-DD
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    pub end_date: Option<String>,
    pub subsidiary_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportCell {
    Text(String),
    Number(i64),
}

impl fmt::Display for ReportCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportCell::Text(text) => f.write_str(text),
            ReportCell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for ReportCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReportCell::Text(text) => serializer.serialize_str(text),
            ReportCell::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

impl From<String> for ReportCell {
    fn from(value: String) -> Self {
        ReportCell::Text(value)
    }
}

impl From<&str> for ReportCell {
    fn from(value: &str) -> Self {
        ReportCell::Text(value.to_string())
    }
}

impl From<i32> for ReportCell {
    fn from(value: i32) -> Self {
        ReportCell::Number(value.into())
    }
}

/// Tabela achatada: colunas fixas por tipo de relatório, linhas na mesma ordem.
#[derive(Debug, Clone)]
pub struct ReportDataset {
    pub kind: ReportKind,
    pub window: ReportWindow,
    pub range_label: String,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<ReportCell>>,
}

// Serializa como array de objetos preservando a ordem das colunas
impl Serialize for ReportDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'a>(&'a [&'static str], &'a [ReportCell]);

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (column, cell) in self.0.iter().zip(self.1) {
                    map.serialize_entry(column, cell)?;
                }
                map.end()
            }
        }

        serializer.collect_seq(self.rows.iter().map(|row| Row(self.columns, row)))
    }
}
