//! Export: trade ledger CSV, report JSON and the printed run summary.
//!
//! The engine never writes anything; everything that reaches disk goes
//! through here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tradesim_core::domain::TradeRecord;

use crate::runner::BacktestResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger as CSV.
///
/// Columns: index, action, timestamp, price, reason. `reason` is empty for buys.
pub fn export_ledger_csv(ledger: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "action", "timestamp", "price", "reason"])?;

    for (i, t) in ledger.iter().enumerate() {
        wtr.write_record([
            i.to_string().as_str(),
            t.action.as_str(),
            t.timestamp.format(TIMESTAMP_FORMAT).to_string().as_str(),
            t.price.to_string().as_str(),
            t.reason.map(|r| r.as_str()).unwrap_or(""),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_report_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Read back a result written by `export_report_json`.
pub fn import_report_json(json: &str) -> Result<BacktestResult> {
    serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a run: `{symbol}_{strategy}_{hash prefix}`.
pub fn artifact_dir_name(result: &BacktestResult) -> String {
    let symbol = if result.symbol.is_empty() {
        "bars"
    } else {
        result.symbol.as_str()
    };
    let hash: String = result.config_hash.chars().take(12).collect();
    format!("{symbol}_{}_{hash}", result.strategy.strategy_type)
}

/// Save the artifact set for a single backtest run.
///
/// Creates `{output_dir}/{artifact_dir_name}/` containing:
/// - `trade_history.csv`: the trade ledger
/// - `report.json`: the full `BacktestResult`
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let csv = export_ledger_csv(&result.ledger)?;
    let csv_path = run_dir.join("trade_history.csv");
    std::fs::write(&csv_path, csv)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let json = export_report_json(result)?;
    let json_path = run_dir.join("report.json");
    std::fs::write(&json_path, json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_report_json(&json)
}

// ─── Text summary ───────────────────────────────────────────────────

/// Plain-text run summary, one `label: value` per line.
pub fn format_summary(result: &BacktestResult) -> String {
    let r = &result.report;
    let mut out = String::new();
    out.push_str(&format!("Strategy: {}\n", r.strategy_name));
    if !result.symbol.is_empty() {
        out.push_str(&format!("Pair: {}\n", result.symbol));
    }
    out.push_str(&format!("Start Time: {}\n", result.start.format(TIMESTAMP_FORMAT)));
    out.push_str(&format!("End Time: {}\n", result.end.format(TIMESTAMP_FORMAT)));
    out.push_str(&format!("Final balance (USD): {:.2}\n", r.balance));
    out.push_str(&format!("Performance (%): {:.2}\n", r.performance_pct));
    out.push_str(&format!("Just-hold Performance (%): {:.2}\n", r.hold_performance_pct));
    out.push_str(&format!("Amount of trades: {}\n", result.trade_count()));
    out.push_str(&format!("Total fees (USD): {:.4}\n", r.total_fees));
    out
}
