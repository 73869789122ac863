//! Reshape the wide timeline into a long transaction log.

use anyhow::Result;
use std::collections::HashSet;
use tablero_core::{DuplicateLabel, TransactionRecord, find_duplicate_labels};

use crate::period::PeriodParser;
use crate::types::{LogSummary, WideTimeline};

/// One record per (category, period) cell. Period-major order: every row
/// of the first period, then every row of the second, and so on.
pub fn to_long(timeline: &WideTimeline, parser: &PeriodParser) -> Vec<TransactionRecord> {
    let mut out = Vec::with_capacity(timeline.rows.len() * timeline.periods.len());
    for (i, period) in timeline.periods.iter().enumerate() {
        let calendar = parser.parse(period);
        for row in &timeline.rows {
            let amount = row.values.get(i).copied().unwrap_or(0.0);
            out.push(TransactionRecord::new(&row.label, period, amount, calendar.clone()));
        }
    }
    out
}

/// Report labels that differ only in case, accents or surrounding spaces.
/// Such labels share one slot in the classification index, so all but one
/// of them will be classified with another label's mapping.
pub fn validate_duplicates<'a, I>(labels: I) -> Vec<DuplicateLabel>
where
    I: IntoIterator<Item = &'a str>,
{
    let duplicates = find_duplicate_labels(labels);
    if duplicates.is_empty() {
        tracing::info!("duplicate validation: no colliding category labels");
        return duplicates;
    }

    tracing::warn!(
        count = duplicates.len(),
        "category labels collide after normalization; the classifier keeps only one mapping per name"
    );
    for dup in &duplicates {
        tracing::warn!(normalized = %dup.normalized, variants = ?dup.variants, "duplicate category label");
    }
    tracing::warn!("rename the variants so they are unique, e.g. 'Mantenimiento Auto' / 'Mantenimiento Casa'");
    duplicates
}

/// Full pipeline: melt, check for colliding labels, sort by date then label.
/// Records whose period could not be dated sort last.
pub fn build_transaction_log(timeline: &WideTimeline) -> Result<Vec<TransactionRecord>> {
    let parser = PeriodParser::new()?;
    let mut records = to_long(timeline, &parser);
    validate_duplicates(timeline.labels());

    records.sort_by(|a, b| {
        let ka = (a.calendar.date.is_none(), a.calendar.date);
        let kb = (b.calendar.date.is_none(), b.calendar.date);
        ka.cmp(&kb).then_with(|| a.label.cmp(&b.label))
    });

    tracing::info!(records = records.len(), "transaction log built");
    Ok(records)
}

pub fn summarize(records: &[TransactionRecord]) -> LogSummary {
    let labels: HashSet<&str> = records.iter().map(|r| r.label.as_str()).collect();
    let periods: HashSet<&str> = records.iter().map(|r| r.period.as_str()).collect();
    let dates = records.iter().filter_map(|r| r.calendar.date);
    let date_range = dates.clone().min().zip(dates.max());

    LogSummary {
        records: records.len(),
        unique_labels: labels.len(),
        unique_periods: periods.len(),
        date_range,
        total_expenses: records.iter().filter(|r| r.is_expense()).map(|r| r.amount).sum(),
        total_income: records.iter().filter(|r| r.is_income()).map(|r| r.amount).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimelineRow;
    use chrono::NaiveDate;

    fn timeline() -> WideTimeline {
        WideTimeline {
            periods: vec![
                "1/2/2024-29/2/2024".to_string(),
                "1/1/2024-31/1/2024".to_string(),
                "Total".to_string(),
            ],
            rows: vec![
                TimelineRow { label: "Sueldo".to_string(), values: vec![1000.0, 900.0, 1900.0] },
                TimelineRow { label: "Combustible".to_string(), values: vec![-50.0, -40.0, -90.0] },
            ],
        }
    }

    #[test]
    fn test_to_long_is_period_major() {
        let parser = PeriodParser::new().unwrap();
        let long = to_long(&timeline(), &parser);
        assert_eq!(long.len(), 6);
        assert_eq!(long[0].label, "Sueldo");
        assert_eq!(long[1].label, "Combustible");
        assert_eq!(long[1].amount, -50.0);
        assert_eq!(long[2].period, "1/1/2024-31/1/2024");
        assert_eq!(long[2].calendar.month_name, "Enero");
    }

    #[test]
    fn test_build_log_sorts_by_date_then_label() {
        let log = build_transaction_log(&timeline()).unwrap();
        let order: Vec<_> = log
            .iter()
            .map(|r| (r.calendar.sort_key, r.label.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (202401, "Combustible"),
                (202401, "Sueldo"),
                (202402, "Combustible"),
                (202402, "Sueldo"),
                (0, "Combustible"),
                (0, "Sueldo"),
            ]
        );
    }

    #[test]
    fn test_validate_duplicates_returns_collisions() {
        let dups = validate_duplicates(["Educación", "Combustible", "educacion"]);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].variants, vec!["Educación", "educacion"]);
    }

    #[test]
    fn test_summarize() {
        let log = build_transaction_log(&timeline()).unwrap();
        let s = summarize(&log);
        assert_eq!(s.records, 6);
        assert_eq!(s.unique_labels, 2);
        assert_eq!(s.unique_periods, 3);
        assert_eq!(
            s.date_range,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
            ))
        );
        assert_eq!(s.total_expenses, -180.0);
        assert_eq!(s.total_income, 3800.0);
    }
}
