use chrono::{DateTime, Utc};
use emabot_domain::entities::metrics::MetricsSummary;
use emabot_domain::services::audit::AuditEvent;
use emabot_domain::value_objects::equity_point::EquityPoint;
use emabot_domain::value_objects::trade::{ClosedTrade, Trade};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

fn format_ts(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn write_audit_jsonl(path: &Path, events: &[AuditEvent]) -> Result<(), String> {
    let mut file =
        fs::File::create(path).map_err(|err| format!("failed to create logs: {}", err))?;
    for event in events {
        let line = serde_json::to_string(event)
            .map_err(|err| format!("failed to serialize audit event: {}", err))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .map_err(|err| format!("failed to write audit event: {}", err))?;
    }
    Ok(())
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create trades csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "datetime",
        "symbol",
        "side",
        "qty",
        "price",
        "commission",
        "order_id",
        "strategy_id",
    ])
    .map_err(|err| format!("failed to write trades csv header: {}", err))?;

    for trade in trades {
        wtr.write_record([
            format_ts(trade.timestamp),
            trade.symbol.clone(),
            trade.side.to_string(),
            trade.quantity.to_string(),
            trade.price.to_string(),
            trade.fee.to_string(),
            trade.order_id.to_string(),
            trade.strategy_id.clone(),
        ])
        .map_err(|err| format!("failed to write trades row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush trades csv: {}", err))
}

pub fn write_closed_trades_csv(path: &Path, trades: &[ClosedTrade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path).map_err(|err| {
        format!("failed to create closed trades csv {}: {}", path.display(), err)
    })?;
    wtr.write_record([
        "symbol",
        "opened_at",
        "closed_at",
        "qty",
        "entry_price",
        "exit_price",
        "pnl_gross",
        "pnl_net",
    ])
    .map_err(|err| format!("failed to write closed trades header: {}", err))?;

    for trade in trades {
        wtr.write_record([
            trade.symbol.clone(),
            format_ts(trade.opened_at),
            format_ts(trade.closed_at),
            trade.quantity.to_string(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            trade.pnl.to_string(),
            trade.pnl_net.to_string(),
        ])
        .map_err(|err| format!("failed to write closed trades row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush closed trades csv: {}", err))
}

pub fn write_equity_csv(path: &Path, points: &[EquityPoint]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create equity csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "datetime",
        "equity",
        "cash",
        "position_qty",
        "unrealized_pnl",
        "realized_pnl",
    ])
    .map_err(|err| format!("failed to write equity csv header: {}", err))?;

    for point in points {
        wtr.write_record([
            format_ts(point.timestamp),
            point.equity.to_string(),
            point.cash.to_string(),
            point.position_qty.to_string(),
            point.unrealized_pnl.to_string(),
            point.realized_pnl.to_string(),
        ])
        .map_err(|err| format!("failed to write equity row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush equity csv: {}", err))
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    meta: Option<&'a serde_json::Value>,
    summary: &'a MetricsSummary,
}

pub fn write_summary_json(
    path: &Path,
    summary: &MetricsSummary,
    meta: Option<&serde_json::Value>,
) -> Result<(), String> {
    let document = SummaryDocument { meta, summary };
    let json = serde_json::to_string_pretty(&document)
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    fs::write(path, json).map_err(|err| format!("failed to write summary: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emabot_domain::value_objects::side::Side;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("emabot_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn trades_csv_has_header_and_readable_dates() {
        let path = unique_tmp_path("trades.csv");
        let trades = vec![Trade {
            timestamp: 1_704_153_600,
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            quantity: 10.0,
            price: 101.5,
            fee: 1.015,
            strategy_id: "ema_cross".to_string(),
            order_id: 1,
        }];
        write_trades_csv(&path, &trades).expect("write trades");
        let contents = fs::read_to_string(&path).expect("read trades");
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("datetime,symbol,side,qty,price,commission,order_id,strategy_id")
        );
        assert_eq!(
            lines.next(),
            Some("2024-01-02 00:00:00,AAPL,BUY,10,101.5,1.015,1,ema_cross")
        );
    }

    #[test]
    fn summary_json_nests_meta_and_metrics() {
        let path = unique_tmp_path("summary.json");
        let summary = MetricsSummary {
            starting_value: 100.0,
            final_value: 110.0,
            ..MetricsSummary::default()
        };
        let meta = serde_json::json!({"run_id": "r1"});
        write_summary_json(&path, &summary, Some(&meta)).expect("write summary");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(value["meta"]["run_id"], "r1");
        assert_eq!(value["summary"]["final_value"], 110.0);
    }
}
