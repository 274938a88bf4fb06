//! Trade ledger CSV export.

use std::io::Write;
use std::path::Path;

use crate::domain::error::TraderError;
use crate::domain::ledger::TradeLedger;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn write_trades<W: Write>(ledger: &TradeLedger, out: W) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "entry_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "pnl_percent",
        "exit_reason",
    ])?;
    for trade in ledger {
        wtr.write_record([
            trade.entry_time().format(TIME_FORMAT).to_string(),
            trade.exit_time().format(TIME_FORMAT).to_string(),
            trade.entry_price().to_string(),
            trade.exit_price().to_string(),
            trade.pnl_percent().to_string(),
            trade.exit_reason().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_trades(ledger: &TradeLedger, path: &Path) -> Result<(), TraderError> {
    let file = std::fs::File::create(path)?;
    write_trades(ledger, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::{ExitReason, Trade};
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_rows() {
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let mut ledger = TradeLedger::new();
        ledger.record(Trade::close(
            day.and_hms_opt(1, 0, 0).unwrap(),
            100.0,
            day.and_hms_opt(5, 0, 0).unwrap(),
            96.0,
            ExitReason::TrailingStop,
        ));

        let mut buf = Vec::new();
        write_trades(&ledger, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "entry_time,exit_time,entry_price,exit_price,pnl_percent,exit_reason"
        );
        assert!(lines[1].starts_with("2024-04-02 01:00:00,2024-04-02 05:00:00,100,96,"));
        assert!(lines[1].ends_with(",Trailing Stop"));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn export_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        export_trades(&TradeLedger::new(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
