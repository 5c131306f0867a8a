//! Text rendering of result rows
//!
//! Results are handed to the language model as text, so rows are rendered as
//! a list of tuples: `[('C001', 'TCS', 50000.00), ('C002', 'INFY', 1200.50)]`.
//! An empty result renders as an empty string.

use crate::format::format_date;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::MySqlRow;
use sqlx::types::Decimal;
use sqlx::{Column, Row, ValueRef};

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Number(String),
}

impl CellValue {
    /// Tuple-style rendering: text quoted, numbers bare, NULL as `None`
    pub fn repr(&self) -> String {
        match self {
            CellValue::Null => "None".to_string(),
            CellValue::Text(s) => format!("'{}'", s.replace('\'', "\\'")),
            CellValue::Number(n) => n.clone(),
        }
    }

    /// Unquoted rendering used in schema sample rows
    pub fn plain(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Text(s) | CellValue::Number(s) => s.clone(),
        }
    }
}

/// Decode one column of a MySQL row, trying the types the transactions
/// table and its aggregates produce.
pub fn decode_cell(row: &MySqlRow, idx: usize) -> CellValue {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return CellValue::Null,
        Ok(_) => {}
        Err(_) => return CellValue::Null,
    }

    if let Ok(v) = row.try_get::<String, _>(idx) {
        return CellValue::Text(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return CellValue::Number(v.to_string());
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return CellValue::Number(v.to_string());
    }
    if let Ok(v) = row.try_get::<Decimal, _>(idx) {
        return CellValue::Number(v.to_string());
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return CellValue::Number(v.to_string());
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
        return CellValue::Text(format_date(v));
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
        return CellValue::Text(v.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        return CellValue::Text(String::from_utf8_lossy(&v).into_owned());
    }

    CellValue::Null
}

pub fn decode_row(row: &MySqlRow) -> Vec<CellValue> {
    (0..row.columns().len()).map(|i| decode_cell(row, i)).collect()
}

pub fn column_names(row: &MySqlRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// `[('a', 1), ('b', 2)]`; single-column rows keep the trailing comma: `('a',)`
pub fn render_tuples(rows: &[Vec<CellValue>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let tuples: Vec<String> = rows
        .iter()
        .map(|cells| {
            let inner: Vec<String> = cells.iter().map(CellValue::repr).collect();
            if inner.len() == 1 {
                format!("({},)", inner[0])
            } else {
                format!("({})", inner.join(", "))
            }
        })
        .collect();

    format!("[{}]", tuples.join(", "))
}

/// Sample-rows block appended to a table's DDL in the schema description
pub fn render_sample_block(table: &str, columns: &[String], rows: &[Vec<CellValue>]) -> String {
    let mut out = format!("/*\n{} rows from {} table:\n", rows.len(), table);
    out.push_str(&columns.join("\t"));
    out.push('\n');

    for cells in rows {
        let line: Vec<String> = cells.iter().map(CellValue::plain).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }

    out.push_str("*/");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tuples() {
        let rows = vec![
            vec![
                CellValue::Text("C001".to_string()),
                CellValue::Number("50000.00".to_string()),
                CellValue::Text("2025-01-15".to_string()),
            ],
            vec![
                CellValue::Text("C002".to_string()),
                CellValue::Null,
                CellValue::Text("2025-02-01".to_string()),
            ],
        ];

        assert_eq!(
            render_tuples(&rows),
            "[('C001', 50000.00, '2025-01-15'), ('C002', None, '2025-02-01')]"
        );
    }

    #[test]
    fn test_render_single_column_and_empty() {
        let rows = vec![vec![CellValue::Number("42".to_string())]];
        assert_eq!(render_tuples(&rows), "[(42,)]");
        assert_eq!(render_tuples(&[]), "");
    }

    #[test]
    fn test_text_quotes_escaped() {
        assert_eq!(CellValue::Text("O'Brien".to_string()).repr(), "'O\\'Brien'");
    }

    #[test]
    fn test_amount_and_date_survive_rendering() {
        let rows = vec![vec![
            CellValue::Number("2500000".to_string()),
            CellValue::Text(format_date(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap())),
        ]];
        let text = render_tuples(&rows);

        assert!(text.contains("2500000"));
        let date_text = text.split('\'').nth(1).unwrap();
        assert_eq!(
            crate::format::parse_date(date_text),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
    }

    #[test]
    fn test_sample_block() {
        let block = render_sample_block(
            "transactions",
            &["transaction_id".to_string(), "amount_invested".to_string()],
            &[vec![CellValue::Text("T001".to_string()), CellValue::Number("1000".to_string())]],
        );
        assert_eq!(
            block,
            "/*\n1 rows from transactions table:\ntransaction_id\tamount_invested\nT001\t1000\n*/"
        );
    }
}
