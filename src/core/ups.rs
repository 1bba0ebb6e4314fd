use super::types::{PensionFigures, SchemeRules};

/// Monthly UPS pension. Service above the cap earns the full pension; zero or
/// negative service flows through the proration unchanged.
pub fn defined_benefit_monthly_pension(
    final_salary: f64,
    years_of_service: i32,
    rules: &SchemeRules,
) -> f64 {
    let proration = (f64::from(years_of_service) / f64::from(rules.service_cap_years)).min(1.0);
    proration * rules.pension_factor * final_salary / rules.months()
}

/// One-time UPS lump sum: a fraction of final monthly salary for each
/// completed six-month period of service. Not capped.
pub fn defined_benefit_lump_sum(
    final_salary: f64,
    years_of_service: i32,
    rules: &SchemeRules,
) -> f64 {
    let half_years = f64::from(years_of_service) * 2.0;
    rules.lump_sum_fraction * (final_salary / rules.months()) * half_years
}

pub fn pension_figures(
    final_salary: f64,
    years_of_service: i32,
    rules: &SchemeRules,
) -> PensionFigures {
    let monthly_pension = defined_benefit_monthly_pension(final_salary, years_of_service, rules);
    PensionFigures {
        monthly_pension,
        spouse_monthly_pension: monthly_pension * rules.survivor_factor,
        lump_sum: defined_benefit_lump_sum(final_salary, years_of_service, rules),
    }
}
