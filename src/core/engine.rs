use tracing::debug;

use super::depletion::{minimum_perpetual_return, simulate_corpus_depletion};
use super::nps::{accumulate_contribution_corpus, corpus_figures};
use super::salary::project_final_salary;
use super::solver::solve_break_even_return;
use super::types::{
    BreakEvenConfig, ComparisonReport, CorpusFigures, DepletionInputs, PensionFigures,
    ProjectionResult, RetirementProfile, SchemeRules,
};
use super::ups::pension_figures;

pub fn run_comparison(profile: &RetirementProfile, rules: &SchemeRules) -> ComparisonReport {
    run_comparison_with(profile, rules, BreakEvenConfig::default())
}

pub fn run_comparison_with(
    profile: &RetirementProfile,
    rules: &SchemeRules,
    break_even_config: BreakEvenConfig,
) -> ComparisonReport {
    let final_salary = project_final_salary(
        profile.current_salary,
        profile.salary_growth_rate,
        profile.years_to_retirement,
    );
    let ups = pension_figures(final_salary, profile.years_of_service, rules);

    let corpus = accumulate_contribution_corpus(
        profile.current_salary,
        profile.salary_growth_rate,
        profile.years_to_retirement,
        profile.contribution_rate,
        profile.annual_return_rate,
        profile.existing_corpus,
    );
    let nps = corpus_figures(corpus, profile.annuity_conversion_rate, rules);
    debug!(
        final_salary,
        ups_monthly = ups.monthly_pension,
        ups_lump_sum = ups.lump_sum,
        nps_corpus = nps.accumulated_corpus,
        nps_monthly = nps.monthly_annuity,
        "derived scheme figures"
    );

    let depletion_inputs = depletion_inputs_for(profile, &ups, &nps);
    let depletion = simulate_corpus_depletion(&depletion_inputs, rules);

    let employee_years = i64::from(profile.employee_life_years);
    let coverage_years_needed =
        employee_years.max(employee_years + i64::from(profile.spouse_additional_years));
    let shortfall_years = depletion
        .outcome
        .years()
        .map(i64::from)
        .filter(|years| *years < coverage_years_needed)
        .map(|years| coverage_years_needed - years);

    ComparisonReport {
        projection: ProjectionResult { final_salary },
        ups,
        nps,
        employee_life_years: profile.employee_life_years,
        spouse_additional_years: profile.spouse_additional_years,
        coverage_years_needed,
        shortfall_years,
        spouse_phase_skipped: profile.spouse_additional_years < 0,
        minimum_perpetual_return: minimum_perpetual_return(&depletion_inputs, rules),
        break_even: solve_break_even_return(&depletion_inputs, rules, break_even_config),
        depletion,
    }
}

fn depletion_inputs_for(
    profile: &RetirementProfile,
    ups: &PensionFigures,
    nps: &CorpusFigures,
) -> DepletionInputs {
    DepletionInputs {
        investable_lump_sum: nps.investable_lump_sum,
        initial_db_monthly: ups.monthly_pension,
        annuity_monthly: nps.monthly_annuity,
        employee_life_years: profile.employee_life_years,
        spouse_additional_years: profile.spouse_additional_years,
        pension_growth: profile.post_retirement_pension_growth,
        corpus_return: profile.post_retirement_corpus_return,
        db_lump_sum: ups.lump_sum,
    }
}
