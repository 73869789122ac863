//! Read the wide category timeline CSV.
//!
//! Layout: a header row whose first cell names the label column
//! ("Categorías") and whose remaining cells are period headers, then one
//! row per category with one amount per period.

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;
use tablero_core::try_parse_locale_amount;

use crate::types::{TimelineRow, WideTimeline};

pub fn read_timeline_csv(path: impl AsRef<Path>) -> Result<WideTimeline> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let timeline = parse_timeline(file).with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = timeline.rows.len(),
        periods = timeline.periods.len(),
        "timeline loaded"
    );
    Ok(timeline)
}

pub fn parse_timeline<R: Read>(reader: R) -> Result<WideTimeline> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading header row")?.clone();
    if headers.len() < 2 {
        bail!("timeline needs a label column and at least one period column");
    }
    let periods: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let label = record.get(0).unwrap_or("").trim();
        if label.is_empty() {
            continue;
        }

        let values = (0..periods.len())
            .map(|i| {
                let cell = record.get(i + 1).unwrap_or("");
                try_parse_locale_amount(cell).unwrap_or_else(|| {
                    tracing::warn!(label = %label, period = %periods[i], cell = %cell, "unparsable amount, using 0");
                    0.0
                })
            })
            .collect();

        rows.push(TimelineRow {
            label: label.to_string(),
            values,
        });
    }

    Ok(WideTimeline { periods, rows })
}
