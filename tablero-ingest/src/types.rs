use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tablero_core::parse_locale_amount;

/// One category row of the wide sheet: a label and one amount per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub label: String,
    /// Chronological, same length as `WideTimeline::periods`
    pub values: Vec<f64>,
}

/// The source spreadsheet as-is: rows are categories, columns are periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WideTimeline {
    /// Period headers, chronological ("1/1/2024-31/1/2024", ...)
    pub periods: Vec<String>,
    pub rows: Vec<TimelineRow>,
}

impl WideTimeline {
    /// Build from text cells, parsing each with the locale amount rules.
    /// Short rows are padded with zeros, long rows truncated.
    pub fn from_text_rows<L, C>(periods: Vec<String>, rows: Vec<(L, Vec<C>)>) -> Self
    where
        L: Into<String>,
        C: AsRef<str>,
    {
        let width = periods.len();
        let rows = rows
            .into_iter()
            .map(|(label, cells)| {
                let mut values: Vec<f64> = cells
                    .iter()
                    .take(width)
                    .map(|c| parse_locale_amount(c.as_ref()))
                    .collect();
                values.resize(width, 0.0);
                TimelineRow { label: label.into(), values }
            })
            .collect();
        Self { periods, rows }
    }

    /// First row carrying exactly this label.
    pub fn row(&self, label: &str) -> Option<&TimelineRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.label.as_str())
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }
}

/// Headline numbers for a transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub records: usize,
    pub unique_labels: usize,
    pub unique_periods: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Sum of negative amounts (stays negative)
    pub total_expenses: f64,
    pub total_income: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_rows_pads_and_parses() {
        let t = WideTimeline::from_text_rows(
            vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
            vec![("Combustible", vec!["-1.234,50", "80"]), ("Sueldo", vec!["1", "2", "3", "4"])],
        );
        assert_eq!(t.row("Combustible").unwrap().values, vec![-1234.5, 80.0, 0.0]);
        assert_eq!(t.row("Sueldo").unwrap().values, vec![1.0, 2.0, 3.0]);
        assert!(t.row("Nope").is_none());
        assert_eq!(t.labels().collect::<Vec<_>>(), vec!["Combustible", "Sueldo"]);
    }
}
