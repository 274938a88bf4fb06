//! Report generation port trait.

use crate::domain::error::TraderError;
use crate::domain::ledger::TradeLedger;
use crate::domain::metrics::Evaluation;

/// Port for writing a backtest or session report.
pub trait ReportPort {
    fn write(&mut self, evaluation: &Evaluation) -> Result<(), TraderError>;

    /// Default implementation: ignores the individual trades.
    fn write_with_trades(
        &mut self,
        evaluation: &Evaluation,
        _ledger: &TradeLedger,
    ) -> Result<(), TraderError> {
        self.write(evaluation)
    }
}
