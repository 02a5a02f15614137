// src/services/report_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::StorageHandle,
    models::report::{
        ReportCell, ReportDataset, ReportKind, ReportQuery, ReportWindow, TimeRange,
    },
};

const SALES_COLUMNS: &[&str] = &["Date", "Subsidiary", "Sold By", "Quantity", "Sale Price", "Total"];
const INVENTORY_COLUMNS: &[&str] = &[
    "Subsidiary",
    "Product Name",
    "SKU",
    "Quantity",
    "Sale Price",
    "Total Value",
];
const ACTIVITY_COLUMNS: &[&str] = &["Date", "Subsidiary", "User", "Action", "Details"];

pub const CUSTOM_RANGE: &str = "custom";

fn money(value: Decimal) -> String {
    format!("${:.2}", value)
}

fn day(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

// Aceita "YYYY-MM-DD" ou um timestamp RFC 3339 (o front envia `toISOString()`)
fn parse_day(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|d| d.with_timezone(&Utc).date_naive()))
        .map_err(|_| AppError::BadRequest("Invalid date format. Use YYYY-MM-DD".into()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve a janela do relatório e o rótulo usado no nome do arquivo.
pub fn resolve_window(
    query: &ReportQuery,
    now: DateTime<Utc>,
) -> Result<(ReportWindow, String), AppError> {
    if let (Some(start), Some(end)) = (non_empty(&query.start_date), non_empty(&query.end_date)) {
        let (start, end) = (parse_day(start)?, parse_day(end)?);
        if start > end {
            return Err(AppError::BadRequest(
                "startDate must not be after endDate".into(),
            ));
        }
        let window = ReportWindow {
            start: start_of_day(start),
            end: end_of_day(end),
        };
        return Ok((window, CUSTOM_RANGE.to_string()));
    }

    let range = TimeRange::parse_lenient(non_empty(&query.time_range));
    let start = match range {
        TimeRange::Week => now - Duration::days(7),
        TimeRange::Month => now
            .checked_sub_months(Months::new(1))
            .unwrap_or(now - Duration::days(30)),
        TimeRange::Year => now
            .checked_sub_months(Months::new(12))
            .unwrap_or(now - Duration::days(365)),
    };
    let label = match range {
        TimeRange::Week => "week",
        TimeRange::Month => "month",
        TimeRange::Year => "year",
    };

    let window = ReportWindow {
        start,
        end: end_of_day(now.date_naive()),
    };
    Ok((window, label.to_string()))
}

#[derive(Clone)]
pub struct ReportService {
    db: StorageHandle,
}

impl ReportService {
    pub fn new(db: StorageHandle) -> Self {
        Self { db }
    }

    pub async fn build(
        &self,
        kind: ReportKind,
        query: &ReportQuery,
        now: DateTime<Utc>,
    ) -> Result<ReportDataset, AppError> {
        let storage = self.db.get()?;
        let (window, range_label) = resolve_window(query, now)?;

        // Carrega as referências uma vez só
        let mut subsidiaries = storage.list_subsidiaries().await?;
        if let Some(id) = query.subsidiary_id {
            subsidiaries.retain(|s| s.id == id);
            if subsidiaries.is_empty() {
                return Err(AppError::NotFound("Subsidiary"));
            }
        }
        let usernames: HashMap<i32, String> = storage
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut rows: Vec<Vec<ReportCell>> = Vec::new();

        let columns = match kind {
            ReportKind::Sales => {
                for subsidiary in &subsidiaries {
                    for sale in storage.list_sales_by_subsidiary(subsidiary.id).await? {
                        if !window.contains(sale.timestamp) {
                            continue;
                        }
                        let total = Decimal::from(sale.quantity) * sale.sale_price;
                        rows.push(vec![
                            day(sale.timestamp).into(),
                            subsidiary.name.as_str().into(),
                            usernames
                                .get(&sale.user_id)
                                .map(String::as_str)
                                .unwrap_or("Unknown")
                                .into(),
                            sale.quantity.into(),
                            money(sale.sale_price).into(),
                            money(total).into(),
                        ]);
                    }
                }
                SALES_COLUMNS
            }

            // Retrato do estoque atual (não filtra pela janela)
            ReportKind::Inventory => {
                for subsidiary in &subsidiaries {
                    for item in storage.list_inventory_by_subsidiary(subsidiary.id).await? {
                        let total = Decimal::from(item.quantity) * item.sale_price;
                        rows.push(vec![
                            subsidiary.name.as_str().into(),
                            item.name.into(),
                            item.sku.into(),
                            item.quantity.into(),
                            money(item.sale_price).into(),
                            money(total).into(),
                        ]);
                    }
                }
                INVENTORY_COLUMNS
            }

            ReportKind::Activity => {
                let names: HashMap<i32, &str> = subsidiaries
                    .iter()
                    .map(|s| (s.id, s.name.as_str()))
                    .collect();

                for log in storage.list_activity_logs(query.subsidiary_id).await? {
                    if !window.contains(log.timestamp) {
                        continue;
                    }
                    let subsidiary = log
                        .subsidiary_id
                        .and_then(|id| names.get(&id).copied())
                        .unwrap_or("MHC");
                    rows.push(vec![
                        day(log.timestamp).into(),
                        subsidiary.into(),
                        usernames
                            .get(&log.user_id)
                            .map(String::as_str)
                            .unwrap_or("System")
                            .into(),
                        log.action.into(),
                        log.details.unwrap_or_default().into(),
                    ]);
                }
                ACTIVITY_COLUMNS
            }
        };

        tracing::info!(report = kind.as_str(), rows = rows.len(), "📊 Relatório gerado");

        Ok(ReportDataset {
            kind,
            window,
            range_label,
            columns,
            rows,
        })
    }
}

// ---
// Saídas (CSV e HTML para impressão)
// ---

pub fn file_name(dataset: &ReportDataset, extension: &str) -> String {
    format!(
        "{}-report-{}.{}",
        dataset.kind.as_str(),
        dataset.range_label,
        extension
    )
}

fn csv_field(cell: &ReportCell) -> String {
    match cell {
        ReportCell::Number(n) => n.to_string(),
        ReportCell::Text(text) => {
            if text.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", text.replace('"', "\"\""))
            } else {
                text.clone()
            }
        }
    }
}

/// Conjunto vazio gera corpo vazio (nem cabeçalho).
pub fn to_csv(dataset: &ReportDataset) -> String {
    if dataset.rows.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(dataset.rows.len() + 1);
    lines.push(dataset.columns.join(","));
    for row in &dataset.rows {
        lines.push(row.iter().map(csv_field).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const PRINT_STYLE: &str = r#"
      body { font-family: Arial, sans-serif; line-height: 1.6; margin: 40px; }
      .header { text-align: center; margin-bottom: 30px; }
      .report-title { font-size: 24px; font-weight: bold; margin-bottom: 10px; }
      .metadata { color: #666; margin-bottom: 20px; }
      table { width: 100%; border-collapse: collapse; margin-top: 20px; }
      th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
      th { background-color: #f5f5f5; }
      .summary { margin: 20px 0; padding: 15px; background: #f9f9f9; border-radius: 4px; }
      @media print { body { margin: 0; } .header { margin-top: 0; } }
"#;

/// Documento HTML pronto para "imprimir como PDF".
pub fn to_html(dataset: &ReportDataset, generated_at: DateTime<Utc>) -> String {
    let title = dataset.kind.title();
    let start = day(dataset.window.start);
    let end = day(dataset.window.end);
    let range = if dataset.range_label == CUSTOM_RANGE {
        format!("{start} to {end}")
    } else {
        dataset.range_label.clone()
    };

    let header: String = dataset
        .columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape_html(c)))
        .collect();
    let body: String = dataset
        .rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape_html(&cell.to_string())))
                .collect();
            format!("        <tr>{cells}</tr>\n")
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{PRINT_STYLE}    </style>
  </head>
  <body>
    <div class="header">
      <div class="report-title">{title}</div>
      <div class="metadata">
        Generated on {generated}<br>
        Time Range: {range}
      </div>
    </div>
    <div class="summary">
      <strong>Summary:</strong><br>
      Total Records: {count}<br>
      Date Range: {start} - {end}
    </div>
    <table>
      <thead>
        <tr>{header}</tr>
      </thead>
      <tbody>
{body}      </tbody>
    </table>
  </body>
</html>
"#,
        generated = day(generated_at),
        range = escape_html(&range),
        count = dataset.rows.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::MemoryStorage, models::auth::Role};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn dataset(rows: Vec<Vec<ReportCell>>) -> ReportDataset {
        ReportDataset {
            kind: ReportKind::Activity,
            window: ReportWindow {
                start: fixed_now() - Duration::days(7),
                end: fixed_now(),
            },
            range_label: "week".into(),
            columns: ACTIVITY_COLUMNS,
            rows,
        }
    }

    #[test]
    fn custom_dates_cover_whole_days() {
        let query = ReportQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let (window, label) = resolve_window(&query, fixed_now()).unwrap();

        assert_eq!(label, "custom");
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn default_range_is_the_last_month_until_end_of_today() {
        let (window, label) = resolve_window(&ReportQuery::default(), fixed_now()).unwrap();

        assert_eq!(label, "month");
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 2, 15, 10, 30, 0).unwrap());
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 3, 15, 23, 0, 0).unwrap()));
    }

    #[test]
    fn empty_dates_fall_back_to_the_time_range() {
        let query = ReportQuery {
            time_range: Some("week".into()),
            start_date: Some(String::new()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let (window, label) = resolve_window(&query, fixed_now()).unwrap();
        assert_eq!(label, "week");
        assert_eq!(window.start, fixed_now() - Duration::days(7));
    }

    #[test]
    fn invalid_dates_are_bad_requests() {
        let query = ReportQuery {
            start_date: Some("31/01/2024".into()),
            end_date: Some("2024-02-01".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_window(&query, fixed_now()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn csv_quotes_fields_with_commas_so_they_survive() {
        let csv = to_csv(&dataset(vec![vec![
            "2024-03-10".into(),
            "Acme, Inc".into(),
            "admin".into(),
            "CREATE_SALE".into(),
            "said \"hi\"".into(),
        ]]));

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Subsidiary,User,Action,Details"));
        let row = lines.next().unwrap();
        assert_eq!(row, r#"2024-03-10,"Acme, Inc",admin,CREATE_SALE,"said ""hi""""#);

        // O campo entre aspas volta inteiro
        let quoted = row.split('"').nth(1).unwrap();
        assert_eq!(quoted, "Acme, Inc");
    }

    #[test]
    fn empty_dataset_yields_empty_csv() {
        assert_eq!(to_csv(&dataset(Vec::new())), "");
    }

    #[test]
    fn html_escapes_cell_values() {
        let html = to_html(
            &dataset(vec![vec![
                "2024-03-10".into(),
                "<b>Acme</b>".into(),
                "admin".into(),
                "CREATE_USER".into(),
                "x & y".into(),
            ]]),
            fixed_now(),
        );

        assert!(html.contains("<title>Activity Report</title>"));
        assert!(html.contains("Total Records: 1"));
        assert!(html.contains("<td>&lt;b&gt;Acme&lt;/b&gt;</td>"));
        assert!(html.contains("<td>x &amp; y</td>"));
        assert!(!html.contains("<b>Acme</b>"));
    }

    #[tokio::test]
    async fn inventory_report_flattens_every_subsidiary() {
        let storage = Arc::new(MemoryStorage::new());
        let acme = storage.seed_subsidiary("Acme", "TX1").id;
        let globex = storage.seed_subsidiary("Globex", "TX2").id;
        storage.seed_item(acme, "Widget", 3, Decimal::new(250, 2));
        storage.seed_item(globex, "Gadget", 2, Decimal::new(1000, 2));
        storage.seed_user("admin", Role::MhcAdmin, None);

        let service = ReportService::new(StorageHandle::ready(storage));
        let report = service
            .build(ReportKind::Inventory, &ReportQuery::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0][0], ReportCell::from("Acme"));
        assert_eq!(report.rows[0][3], ReportCell::Number(3));
        assert_eq!(report.rows[0][5], ReportCell::from("$7.50"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.starts_with(r#"[{"Subsidiary":"Acme","Product Name":"Widget""#));
    }

    #[tokio::test]
    async fn activity_outside_the_window_is_dropped() {
        let storage = Arc::new(MemoryStorage::new());
        let acme = storage.seed_subsidiary("Acme", "TX1").id;
        let admin = storage.seed_user("admin", Role::MhcAdmin, None);
        crate::db::Storage::create_activity_log(
            storage.as_ref(),
            &crate::models::activity::NewActivityLog::new(
                admin.id,
                Some(acme),
                crate::models::activity::ActivityAction::CreateSubsidiary,
                "Created subsidiary: Acme",
            ),
        )
        .await
        .unwrap();

        let service = ReportService::new(StorageHandle::ready(storage));

        let current = service
            .build(ReportKind::Activity, &ReportQuery::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(current.rows.len(), 1);
        assert_eq!(current.rows[0][2], ReportCell::from("admin"));

        let past = ReportQuery {
            start_date: Some("2001-01-01".into()),
            end_date: Some("2001-12-31".into()),
            ..Default::default()
        };
        let old = service
            .build(ReportKind::Activity, &past, Utc::now())
            .await
            .unwrap();
        assert!(old.rows.is_empty());
    }
}
