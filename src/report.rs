use std::fmt::Write as _;

use crate::core::{
    ComparisonReport, DepletionOutcome, PerpetualReturn, Phase, SimulationStepRecord,
};

/// Renders an amount in lakhs (`L`), thousands (`K`) or plain units, always
/// with two decimals. Negative values fall through to the plain rendering.
pub fn format_amount(amount: f64) -> String {
    if amount >= 100_000.0 {
        format!("{:.2}L", amount / 100_000.0)
    } else if amount >= 1_000.0 {
        format!("{:.2}K", amount / 1_000.0)
    } else {
        format!("{amount:.2}")
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Employee => "Employee",
        Phase::Spouse => "Spouse",
    }
}

pub fn render_depletion_table(steps: &[SimulationStepRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Year-by-year NPS corpus analysis:");
    let _ = writeln!(
        out,
        "{:>4}  {:>12}  {:>12}  {:>12}  {:>12}  {:>14}  {:>8}",
        "Year", "UPS monthly", "NPS monthly", "Yearly gap", "Interest", "Corpus", "Phase"
    );
    let _ = writeln!(out, "{}", "-".repeat(88));
    for step in steps {
        let _ = writeln!(
            out,
            "{:>4}  {:>12}  {:>12}  {:>12}  {:>12}  {:>14}  {:>8}",
            step.year,
            format_amount(step.db_monthly),
            format_amount(step.annuity_monthly),
            format_amount(step.yearly_gap),
            format_amount(step.interest_earned),
            format_amount(step.closing_balance),
            phase_label(step.phase),
        );
    }
    out
}

pub fn render_summary(report: &ComparisonReport) -> String {
    let mut out = String::new();
    let ups = &report.ups;
    let nps = &report.nps;

    let _ = writeln!(out, "Estimated results at retirement:");
    let _ = writeln!(
        out,
        "  Final basic salary: {}",
        format_amount(report.projection.final_salary)
    );
    let _ = writeln!(
        out,
        "  UPS monthly pension (employee): {}",
        format_amount(ups.monthly_pension)
    );
    let _ = writeln!(
        out,
        "  UPS monthly pension (spouse): {}",
        format_amount(ups.spouse_monthly_pension)
    );
    let _ = writeln!(out, "  UPS lump sum: {}", format_amount(ups.lump_sum));
    let _ = writeln!(
        out,
        "  NPS accumulated corpus: {}",
        format_amount(nps.accumulated_corpus)
    );
    let _ = writeln!(
        out,
        "  NPS monthly annuity (constant for both): {}",
        format_amount(nps.monthly_annuity)
    );
    let _ = writeln!(
        out,
        "  NPS lump sum invested: {}",
        format_amount(nps.investable_lump_sum)
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Life expectancy analysis:");
    let _ = writeln!(
        out,
        "  Employee expected to live {} years after retirement",
        report.employee_life_years
    );
    let _ = writeln!(
        out,
        "  Spouse expected to live an additional {} years",
        report.spouse_additional_years
    );
    let _ = writeln!(
        out,
        "  Total years of pension coverage needed: {}",
        report.coverage_years_needed
    );
    if report.spouse_phase_skipped {
        let _ = writeln!(
            out,
            "  Note: spouse years are negative, so coverage ends with the employee"
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Post-retirement analysis:");
    match report.depletion.outcome {
        DepletionOutcome::PerpetuallySufficient => {
            let _ = writeln!(
                out,
                "  The NPS corpus will NEVER deplete: investment returns cover the pension gap perpetually"
            );
        }
        DepletionOutcome::Exhausted { year } => {
            let _ = writeln!(out, "  The NPS corpus is depleted after {year} years");
        }
        DepletionOutcome::HorizonReached { year } => {
            let _ = writeln!(
                out,
                "  The NPS corpus lasts the full {year} year horizon while covering the pension gap"
            );
        }
    }
    if let Some(shortfall) = report.shortfall_years {
        let _ = writeln!(
            out,
            "  WARNING: this is {shortfall} years short of the total coverage period"
        );
    }
    match report.minimum_perpetual_return {
        PerpetualReturn::Rate(rate) => {
            let _ = writeln!(
                out,
                "  Corpus return needed for perpetual cover: {:.2}%",
                rate * 100.0
            );
        }
        PerpetualReturn::Undefined => {
            let _ = writeln!(
                out,
                "  Corpus return needed for perpetual cover: undefined (no net lump sum invested)"
            );
        }
    }
    match report.break_even.solved_rate {
        Some(rate) if report.break_even.feasible && report.ups.lump_sum > 0.0 => {
            // The UPS lump sum earns the same return, so the rate is sufficient
            // but not necessarily the smallest one.
            let _ = writeln!(
                out,
                "  A corpus return of {:.2}% lasts the horizon",
                rate * 100.0
            );
        }
        Some(rate) if report.break_even.feasible => {
            let _ = writeln!(
                out,
                "  Corpus return needed to last the horizon: {:.2}%",
                rate * 100.0
            );
        }
        _ => {
            let _ = writeln!(out, "  {}", report.break_even.message);
        }
    }
    out
}
