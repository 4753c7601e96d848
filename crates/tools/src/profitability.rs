use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ProfitabilityInput {
    /// Monthly revenue.
    #[serde(default)]
    pub revenue: f64,
    /// Monthly fixed costs.
    #[serde(default)]
    pub fixed_costs: f64,
    /// Variable costs as a percentage of revenue.
    #[serde(default)]
    pub variable_costs_percent: f64,
    #[serde(default)]
    pub investment: f64,
    /// Analysis period in months.
    #[serde(default)]
    pub duration_months: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ProfitabilityReport {
    pub monthly_profit: f64,
    pub gross_margin_percent: f64,
    /// `None` when variable costs eat the whole revenue, so no revenue
    /// ever covers the fixed costs.
    pub break_even_revenue: Option<f64>,
    pub total_profitability: f64,
    /// `None` when there is no investment to measure against.
    pub roi_percent: Option<f64>,
    pub verdict: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfitabilityError {
    #[error("Le chiffre d'affaires mensuel doit être supérieur à 0.")]
    NonPositiveRevenue,
}

const BREAK_EVEN_WARNING: &str =
    " Attention, votre chiffre d'affaires est inférieur au seuil de rentabilité.";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn verdict_for(roi: f64) -> &'static str {
    if roi > 50.0 {
        "🚀 Excellent rendement ! Le projet est très rentable."
    } else if roi > 20.0 {
        "✅ Rentabilité satisfaisante. Le projet génère un bon retour."
    } else if roi > 0.0 {
        "⚠️ Rentabilité faible. Il est conseillé d'optimiser les coûts ou d'augmenter les revenus."
    } else {
        "❌ Non rentable pour le moment. Le projet perd de l'argent sur la période analysée."
    }
}

pub fn analyze(input: &ProfitabilityInput) -> Result<ProfitabilityReport, ProfitabilityError> {
    if input.revenue <= 0.0 || !input.revenue.is_finite() {
        return Err(ProfitabilityError::NonPositiveRevenue);
    }

    let variable_ratio = input.variable_costs_percent / 100.0;
    let variable_costs = input.revenue * variable_ratio;
    let monthly_profit = input.revenue - (input.fixed_costs + variable_costs);
    let gross_margin = (input.revenue - variable_costs) / input.revenue * 100.0;
    let break_even = (variable_ratio < 1.0).then(|| input.fixed_costs / (1.0 - variable_ratio));
    let total = monthly_profit * input.duration_months - input.investment;

    // Without an investment the return is unbounded and rated as excellent.
    let roi = (input.investment > 0.0).then(|| total / input.investment * 100.0);

    let mut verdict = verdict_for(roi.unwrap_or(f64::INFINITY)).to_string();
    if break_even.is_none_or(|threshold| threshold > input.revenue) {
        verdict.push_str(BREAK_EVEN_WARNING);
    }

    Ok(ProfitabilityReport {
        monthly_profit: round2(monthly_profit),
        gross_margin_percent: round2(gross_margin),
        break_even_revenue: break_even.map(round2),
        total_profitability: round2(total),
        roi_percent: roi.map(round2),
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_all_figures() {
        let report = analyze(&ProfitabilityInput {
            revenue: 10_000.0,
            fixed_costs: 3_000.0,
            variable_costs_percent: 20.0,
            investment: 20_000.0,
            duration_months: 12.0,
        })
        .unwrap();

        assert_eq!(report.monthly_profit, 5_000.0);
        assert_eq!(report.gross_margin_percent, 80.0);
        assert_eq!(report.break_even_revenue, Some(3_750.0));
        assert_eq!(report.total_profitability, 40_000.0);
        assert_eq!(report.roi_percent, Some(200.0));
        assert!(report.verdict.starts_with("🚀"));
    }

    #[test]
    fn roi_is_absent_without_investment() {
        let report = analyze(&ProfitabilityInput {
            revenue: 1_000.0,
            duration_months: 1.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(report.roi_percent, None);
        assert!(report.verdict.starts_with("🚀"));
    }

    #[test]
    fn warns_when_revenue_is_below_break_even() {
        let report = analyze(&ProfitabilityInput {
            revenue: 1_000.0,
            fixed_costs: 2_000.0,
            investment: 500.0,
            duration_months: 6.0,
            ..Default::default()
        })
        .unwrap();
        assert!(report.verdict.starts_with("❌"));
        assert!(report.verdict.ends_with(BREAK_EVEN_WARNING));
    }

    #[test]
    fn break_even_is_unreachable_when_variable_costs_take_everything() {
        for percent in [100.0, 120.0] {
            let report = analyze(&ProfitabilityInput {
                revenue: 1_000.0,
                fixed_costs: 200.0,
                variable_costs_percent: percent,
                duration_months: 1.0,
                ..Default::default()
            })
            .unwrap();
            assert_eq!(report.break_even_revenue, None);
            assert!(report.verdict.ends_with(BREAK_EVEN_WARNING));
            assert!(report.monthly_profit.is_finite());
        }
    }

    #[test]
    fn rejects_zero_revenue() {
        let err = analyze(&ProfitabilityInput::default()).unwrap_err();
        assert_eq!(err, ProfitabilityError::NonPositiveRevenue);
    }
}
