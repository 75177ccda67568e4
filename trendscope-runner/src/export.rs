//! Artifact export — barometer and returns tables as CSV, selections and
//! params as JSON.

use std::fs;
use std::path::Path;

use thiserror::Error;

use trendscope_core::barometer::Barometer;
use trendscope_core::returns::ReturnsTable;

use crate::config::RunParams;
use crate::pipeline::PipelineResult;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write the barometer as CSV: one row per instrument, sector labels at
/// every level, the signed score, and the raw indicator columns.
pub fn barometer_to_csv(barometer: &Barometer, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "ticker".to_string(),
        "name".to_string(),
        "level_1".to_string(),
        "level_2".to_string(),
        "level_3".to_string(),
        "level_4".to_string(),
        "level_5".to_string(),
        "trend_score".to_string(),
    ];
    if let Some(first) = barometer.rows.first() {
        header.extend(first.raw.iter().map(|(name, _)| name.clone()));
    }
    writer.write_record(&header)?;

    for row in &barometer.rows {
        let mut record = vec![row.ticker.clone(), row.name.clone()];
        for level in 1..=5u8 {
            record.push(row.sectors.level(level).unwrap_or("").to_string());
        }
        record.push(format!("{:.6}", row.trend_score));
        record.extend(row.raw.iter().map(|(_, v)| format!("{v:.6}")));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the returns table as CSV: instrument label plus one column per
/// tenor label, in tenor declaration order.
pub fn returns_to_csv(table: &ReturnsTable, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["label".to_string()];
    header.extend(table.labels.iter().cloned());
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.values.iter().map(|v| format!("{v:.4}")));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Persist a run's outputs under `dir`: barometer.csv, top_trends.json,
/// params.json.
pub fn save_artifacts(
    result: &PipelineResult,
    params: &RunParams,
    dir: &Path,
) -> Result<(), ExportError> {
    fs::create_dir_all(dir)?;

    barometer_to_csv(&result.barometer, &dir.join("barometer.csv"))?;

    let selections = serde_json::json!({
        "params_id": result.params_id,
        "start": result.start,
        "end": result.end,
        "top_trends": result.top_trends,
        "chart_trends": result.chart_trends,
        "dropped": result.dropped,
    });
    fs::write(
        dir.join("top_trends.json"),
        serde_json::to_string_pretty(&selections)?,
    )?;

    fs::write(
        dir.join("params.json"),
        serde_json::to_string_pretty(params)?,
    )?;

    Ok(())
}
