//! Performance metrics over a trade ledger.
//!
//! Fees are charged per side, so each trade's return is reduced by
//! `2 * fee_percent / 100`. The balance compounds trade by trade from the
//! initial balance, which is the full-equity sizing a backtest assumes.

use super::ledger::{ExitReason, TradeLedger};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    pub fee_percent: f64,
    pub initial_balance: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            fee_percent: 0.1,
            initial_balance: 5.0,
        }
    }
}

/// Result of evaluating a ledger. An empty ledger is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    NoTrades,
    Completed(Report),
}

impl Evaluation {
    pub fn report(&self) -> Option<&Report> {
        match self {
            Evaluation::Completed(report) => Some(report),
            Evaluation::NoTrades => None,
        }
    }
}

/// Ratios are plain fractions (0.05 = 5%) except `win_rate`, which is
/// already a percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub max_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub risk_reward: f64,
    pub expectancy: f64,
    pub final_balance: f64,
    pub balance_curve: Vec<f64>,
    pub stop_exits: usize,
    pub signal_exits: usize,
}

pub fn net_pnl(gross_pnl: f64, fee_percent: f64) -> f64 {
    gross_pnl - 2.0 * (fee_percent / 100.0)
}

pub fn evaluate(ledger: &TradeLedger, config: &MetricsConfig) -> Evaluation {
    if ledger.is_empty() {
        return Evaluation::NoTrades;
    }

    let net: Vec<f64> = ledger
        .iter()
        .map(|t| net_pnl(t.pnl_percent(), config.fee_percent))
        .collect();

    let balance_curve = compound_balance(&net, config.initial_balance);
    let max_drawdown = compute_drawdown(&balance_curve);
    let final_balance = balance_curve
        .last()
        .copied()
        .unwrap_or(config.initial_balance);

    let mut winning_trades = 0usize;
    let mut losing_trades = 0usize;
    let mut total_wins = 0.0_f64;
    let mut total_losses = 0.0_f64;
    let mut max_loss = f64::INFINITY;

    for &pnl in &net {
        if pnl > 0.0 {
            winning_trades += 1;
            total_wins += pnl;
        } else {
            losing_trades += 1;
            total_losses += pnl;
        }
        max_loss = max_loss.min(pnl);
    }

    let total_trades = net.len();
    let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

    let gross_loss = total_losses.abs();
    let profit_factor = if gross_loss > 0.0 {
        total_wins / gross_loss
    } else {
        f64::INFINITY
    };

    let avg_win = if winning_trades > 0 {
        total_wins / winning_trades as f64
    } else {
        0.0
    };
    let avg_loss = if losing_trades > 0 {
        gross_loss / losing_trades as f64
    } else {
        0.0
    };

    let risk_reward = if avg_loss > 0.0 {
        avg_win / avg_loss
    } else {
        f64::INFINITY
    };

    let hit = win_rate / 100.0;
    let expectancy = hit * avg_win - (1.0 - hit) * avg_loss;

    let stop_exits = ledger
        .iter()
        .filter(|t| t.exit_reason() == ExitReason::TrailingStop)
        .count();

    Evaluation::Completed(Report {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate,
        profit_factor,
        max_drawdown,
        max_loss,
        avg_win,
        avg_loss,
        risk_reward,
        expectancy,
        final_balance,
        balance_curve,
        stop_exits,
        signal_exits: total_trades - stop_exits,
    })
}

/// Balance after each trade, starting with the initial balance.
fn compound_balance(net: &[f64], initial_balance: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(net.len() + 1);
    let mut balance = initial_balance;
    curve.push(balance);
    for pnl in net {
        balance *= 1.0 + pnl;
        curve.push(balance);
    }
    curve
}

fn compute_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &balance in curve {
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            let dd = (peak - balance) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

impl Report {
    /// Labelled, formatted values in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Trades", self.total_trades.to_string()),
            ("Win Rate (%)", format!("{:.2}", self.win_rate)),
            ("Profit Factor", format_ratio(self.profit_factor)),
            (
                "Maximum Drawdown (%)",
                format!("{:.2}", self.max_drawdown * 100.0),
            ),
            (
                "Maximum Loss per Trade (%)",
                format!("{:.2}", self.max_loss * 100.0),
            ),
            ("Average Win (%)", format!("{:.2}", self.avg_win * 100.0)),
            ("Average Loss (%)", format!("{:.2}", self.avg_loss * 100.0)),
            ("Risk:Reward Ratio", format_ratio(self.risk_reward)),
            ("Expectancy (%)", format!("{:.2}", self.expectancy * 100.0)),
            ("Final Balance ($)", format_money(self.final_balance)),
        ]
    }
}

fn format_ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// Two decimals with comma thousands separators, e.g. `12,345.68`.
pub fn format_money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::Trade;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn ledger_from_gross(pnls: &[f64]) -> TradeLedger {
        let mut ledger = TradeLedger::new();
        for (i, pnl) in pnls.iter().enumerate() {
            let day = (i as u32) * 2 + 1;
            ledger.record(Trade::close(
                at(day),
                100.0,
                at(day + 1),
                100.0 * (1.0 + pnl),
                ExitReason::TrailingStop,
            ));
        }
        ledger
    }

    fn no_fees(initial_balance: f64) -> MetricsConfig {
        MetricsConfig {
            fee_percent: 0.0,
            initial_balance,
        }
    }

    #[test]
    fn empty_ledger_is_no_trades() {
        let evaluation = evaluate(&TradeLedger::new(), &MetricsConfig::default());
        assert_eq!(evaluation, Evaluation::NoTrades);
        assert!(evaluation.report().is_none());
    }

    #[test]
    fn fee_is_charged_on_both_sides() {
        let ledger = ledger_from_gross(&[0.05]);
        let config = MetricsConfig {
            fee_percent: 0.1,
            initial_balance: 1000.0,
        };
        let report = evaluate(&ledger, &config).report().cloned().unwrap();

        assert_relative_eq!(report.final_balance, 1000.0 * 1.048, epsilon = 1e-9);
        assert_relative_eq!(report.avg_win, 0.048, epsilon = 1e-12);
        assert_eq!(report.balance_curve.len(), 2);
    }

    #[test]
    fn win_rate_profit_factor_expectancy() {
        let ledger = ledger_from_gross(&[0.10, -0.05]);
        let report = evaluate(&ledger, &no_fees(100.0)).report().cloned().unwrap();

        assert_eq!(report.total_trades, 2);
        assert_eq!(report.winning_trades, 1);
        assert_eq!(report.losing_trades, 1);
        assert_relative_eq!(report.win_rate, 50.0);
        assert_relative_eq!(report.profit_factor, 2.0, epsilon = 1e-9);
        assert_relative_eq!(report.risk_reward, 2.0, epsilon = 1e-9);
        assert_relative_eq!(report.expectancy, 0.025, epsilon = 1e-9);
        assert_relative_eq!(report.max_loss, -0.05, epsilon = 1e-9);
    }

    #[test]
    fn no_losers_gives_infinite_ratios() {
        let ledger = ledger_from_gross(&[0.02, 0.03]);
        let report = evaluate(&ledger, &no_fees(100.0)).report().cloned().unwrap();

        assert!(report.profit_factor.is_infinite());
        assert!(report.risk_reward.is_infinite());
        assert_relative_eq!(report.avg_loss, 0.0);
        assert_relative_eq!(report.max_drawdown, 0.0);
    }

    #[test]
    fn breakeven_counts_as_loser() {
        let ledger = ledger_from_gross(&[0.0, 0.04]);
        let report = evaluate(&ledger, &no_fees(100.0)).report().cloned().unwrap();
        assert_eq!(report.losing_trades, 1);
        assert_relative_eq!(report.win_rate, 50.0);
    }

    #[test]
    fn all_losers_zero_profit_factor() {
        let ledger = ledger_from_gross(&[-0.02, -0.03]);
        let report = evaluate(&ledger, &no_fees(100.0)).report().cloned().unwrap();
        assert_relative_eq!(report.profit_factor, 0.0);
        assert_relative_eq!(report.risk_reward, 0.0);
        assert_relative_eq!(report.win_rate, 0.0);
        assert_relative_eq!(report.expectancy, -0.025, epsilon = 1e-9);
    }

    #[test]
    fn max_drawdown_from_peak() {
        // 100 → 110 → 88 → 96.8
        let ledger = ledger_from_gross(&[0.10, -0.20, 0.10]);
        let report = evaluate(&ledger, &no_fees(100.0)).report().cloned().unwrap();

        assert_relative_eq!(report.max_drawdown, 0.20, epsilon = 1e-9);
        assert_relative_eq!(report.final_balance, 96.8, epsilon = 1e-9);
        assert_eq!(report.balance_curve.len(), 4);
    }

    #[test]
    fn drawdown_counts_loss_on_first_trade() {
        let curve = compound_balance(&[-0.10], 100.0);
        assert_relative_eq!(compute_drawdown(&curve), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn exit_reason_counts() {
        let mut ledger = ledger_from_gross(&[0.01]);
        ledger.record(Trade::close(at(20), 10.0, at(21), 11.0, ExitReason::Signal));
        let report = evaluate(&ledger, &no_fees(1.0)).report().cloned().unwrap();
        assert_eq!(report.stop_exits, 1);
        assert_eq!(report.signal_exits, 1);
    }

    #[test]
    fn rows_are_labelled_and_formatted() {
        let ledger = ledger_from_gross(&[0.10, -0.05]);
        let report = evaluate(&ledger, &no_fees(10_000.0)).report().cloned().unwrap();
        let rows = report.rows();

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0], ("Total Trades", "2".to_string()));
        assert_eq!(rows[1], ("Win Rate (%)", "50.00".to_string()));
        assert_eq!(rows[2], ("Profit Factor", "2.00".to_string()));
        assert_eq!(rows[8], ("Expectancy (%)", "2.50".to_string()));
        // 10000 * 1.1 * 0.95
        assert_eq!(rows[9], ("Final Balance ($)", "10,450.00".to_string()));
    }

    #[test]
    fn infinite_ratio_renders_inf() {
        let ledger = ledger_from_gross(&[0.10]);
        let report = evaluate(&ledger, &no_fees(1.0)).report().cloned().unwrap();
        let rows = report.rows();
        assert_eq!(rows[2].1, "inf");
        assert_eq!(rows[7].1, "inf");
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(5.0), "5.00");
        assert_eq!(format_money(1234.567), "1,234.57");
        assert_eq!(format_money(1_234_567.0), "1,234,567.00");
        assert_eq!(format_money(-9876.5), "-9,876.50");
        assert_eq!(format_money(999.999), "1,000.00");
    }
}
