//! Plain-text report adapter implementing ReportPort.
//!
//! Renders the labelled metric rows as an aligned table between `=` rules,
//! optionally followed by a trade log.

use std::fmt::Write as _;
use std::io::Write;

use crate::domain::error::TraderError;
use crate::domain::ledger::TradeLedger;
use crate::domain::metrics::Evaluation;
use crate::ports::report_port::ReportPort;

const RULE_WIDTH: usize = 30;
const LABEL_WIDTH: usize = 28;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct TextReport<W: Write> {
    out: W,
    title: String,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W, title: impl Into<String>) -> Self {
        TextReport {
            out,
            title: title.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn render_summary(title: &str, evaluation: &Evaluation) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut output = String::new();

    let report = match evaluation {
        Evaluation::Completed(report) => report,
        Evaluation::NoTrades => {
            let _ = writeln!(output, "No trades were executed.");
            return output;
        }
    };

    let _ = writeln!(output, "{rule}");
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{rule}");
    for (label, value) in report.rows() {
        let _ = writeln!(output, "{label:<width$}: {value}", width = LABEL_WIDTH);
    }
    let _ = writeln!(output, "{rule}");
    output
}

pub fn render_trade_log(ledger: &TradeLedger) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<17}  {:<17}  {:>12}  {:>12}  {:>8}  {}",
        "Entry", "Exit", "Entry Px", "Exit Px", "PnL %", "Reason"
    );
    for trade in ledger {
        let _ = writeln!(
            output,
            "{:<17}  {:<17}  {:>12.2}  {:>12.2}  {:>8.2}  {}",
            trade.entry_time().format(TIME_FORMAT).to_string(),
            trade.exit_time().format(TIME_FORMAT).to_string(),
            trade.entry_price(),
            trade.exit_price(),
            trade.pnl_percent() * 100.0,
            trade.exit_reason(),
        );
    }
    output
}

impl<W: Write> ReportPort for TextReport<W> {
    fn write(&mut self, evaluation: &Evaluation) -> Result<(), TraderError> {
        self.out
            .write_all(render_summary(&self.title, evaluation).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn write_with_trades(
        &mut self,
        evaluation: &Evaluation,
        ledger: &TradeLedger,
    ) -> Result<(), TraderError> {
        if !ledger.is_empty() {
            self.out.write_all(render_trade_log(ledger).as_bytes())?;
            self.out.write_all(b"\n")?;
        }
        self.write(evaluation)
    }
}
