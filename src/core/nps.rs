use super::types::{CorpusFigures, SchemeRules};

/// NPS corpus at retirement. The existing balance compounds for the whole
/// horizon; each year's contribution lands at year-end and compounds for the
/// years that remain.
pub fn accumulate_contribution_corpus(
    current_salary: f64,
    growth_rate: f64,
    years: i32,
    contribution_rate: f64,
    return_rate: f64,
    existing_corpus: f64,
) -> f64 {
    let mut corpus = existing_corpus * (1.0 + return_rate).powi(years);
    for year in 1..=years {
        let salary = current_salary * (1.0 + growth_rate).powi(year);
        let contribution = contribution_rate * salary;
        corpus += contribution * (1.0 + return_rate).powi(years - year);
    }
    corpus
}

pub fn contribution_monthly_annuity(corpus: f64, annuity_rate: f64, rules: &SchemeRules) -> f64 {
    annuity_rate * rules.annuity_portion * corpus / rules.months()
}

pub fn investable_lump_sum(corpus: f64, rules: &SchemeRules) -> f64 {
    rules.lump_sum_portion * corpus
}

pub fn corpus_figures(corpus: f64, annuity_rate: f64, rules: &SchemeRules) -> CorpusFigures {
    CorpusFigures {
        accumulated_corpus: corpus,
        monthly_annuity: contribution_monthly_annuity(corpus, annuity_rate, rules),
        investable_lump_sum: investable_lump_sum(corpus, rules),
    }
}
