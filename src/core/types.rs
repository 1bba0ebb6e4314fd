use serde::{Deserialize, Serialize};

/// Scheme constants shared by every component. Defaults follow the current
/// UPS/NPS rules; override a field to model an alternate rule set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeRules {
    pub pension_factor: f64,
    pub survivor_factor: f64,
    pub annuity_portion: f64,
    pub lump_sum_portion: f64,
    pub months_per_year: u32,
    pub service_cap_years: u32,
    /// Share of one month's final salary paid per completed six-month period.
    pub lump_sum_fraction: f64,
}

impl Default for SchemeRules {
    fn default() -> Self {
        Self {
            pension_factor: 0.5,
            survivor_factor: 0.6,
            annuity_portion: 0.4,
            lump_sum_portion: 0.6,
            months_per_year: 12,
            service_cap_years: 25,
            lump_sum_fraction: 0.1,
        }
    }
}

impl SchemeRules {
    pub fn months(&self) -> f64 {
        f64::from(self.months_per_year)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetirementProfile {
    pub current_salary: f64,
    pub salary_growth_rate: f64,
    pub years_to_retirement: i32,
    pub years_of_service: i32,
    pub contribution_rate: f64,
    pub annual_return_rate: f64,
    pub existing_corpus: f64,
    pub annuity_conversion_rate: f64,
    pub post_retirement_pension_growth: f64,
    pub post_retirement_corpus_return: f64,
    pub employee_life_years: u32,
    pub spouse_additional_years: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub final_salary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionFigures {
    pub monthly_pension: f64,
    pub spouse_monthly_pension: f64,
    pub lump_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusFigures {
    pub accumulated_corpus: f64,
    pub monthly_annuity: f64,
    pub investable_lump_sum: f64,
}

/// Inputs of one depletion run. `new` fills the post-retirement defaults
/// (5% pension growth, 8% corpus return, no DB-side lump sum).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepletionInputs {
    pub investable_lump_sum: f64,
    pub initial_db_monthly: f64,
    pub annuity_monthly: f64,
    pub employee_life_years: u32,
    pub spouse_additional_years: i32,
    pub pension_growth: f64,
    pub corpus_return: f64,
    pub db_lump_sum: f64,
}

impl DepletionInputs {
    pub const DEFAULT_PENSION_GROWTH: f64 = 0.05;
    pub const DEFAULT_CORPUS_RETURN: f64 = 0.08;

    pub fn new(
        investable_lump_sum: f64,
        initial_db_monthly: f64,
        annuity_monthly: f64,
        employee_life_years: u32,
        spouse_additional_years: i32,
    ) -> Self {
        Self {
            investable_lump_sum,
            initial_db_monthly,
            annuity_monthly,
            employee_life_years,
            spouse_additional_years,
            pension_growth: Self::DEFAULT_PENSION_GROWTH,
            corpus_return: Self::DEFAULT_CORPUS_RETURN,
            db_lump_sum: 0.0,
        }
    }

    pub fn total_years(&self) -> i64 {
        i64::from(self.employee_life_years) + i64::from(self.spouse_additional_years)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Employee,
    Spouse,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStepRecord {
    pub year: u32,
    pub phase: Phase,
    pub db_monthly: f64,
    pub annuity_monthly: f64,
    pub db_yearly_income: f64,
    pub dc_yearly_income: f64,
    /// DB-side minus DC-side income; positive means the corpus must fund it.
    pub yearly_gap: f64,
    pub withdrawal: f64,
    pub opening_balance: f64,
    pub interest_earned: f64,
    pub closing_balance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DepletionOutcome {
    PerpetuallySufficient,
    Exhausted { year: u32 },
    HorizonReached { year: u32 },
}

impl DepletionOutcome {
    /// Finite year count, or `None` for the perpetual sentinel.
    pub fn years(self) -> Option<u32> {
        match self {
            DepletionOutcome::PerpetuallySufficient => None,
            DepletionOutcome::Exhausted { year } | DepletionOutcome::HorizonReached { year } => {
                Some(year)
            }
        }
    }

    pub fn is_perpetual(self) -> bool {
        matches!(self, DepletionOutcome::PerpetuallySufficient)
    }

    pub fn years_or_infinity(self) -> f64 {
        self.years().map_or(f64::INFINITY, f64::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionRun {
    pub outcome: DepletionOutcome,
    pub steps: Vec<SimulationStepRecord>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rate", rename_all = "camelCase")]
pub enum PerpetualReturn {
    Rate(f64),
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakEvenConfig {
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for BreakEvenConfig {
    fn default() -> Self {
        Self {
            search_min: 0.0,
            search_max: 1.0,
            tolerance: 1e-6,
            max_iterations: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_rate: f64,
    pub outcome: DepletionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenResult {
    pub solved_rate: Option<f64>,
    pub iterations: Vec<BreakEvenIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub projection: ProjectionResult,
    pub ups: PensionFigures,
    pub nps: CorpusFigures,
    pub depletion: DepletionRun,
    pub employee_life_years: u32,
    pub spouse_additional_years: i32,
    pub coverage_years_needed: i64,
    pub shortfall_years: Option<i64>,
    pub spouse_phase_skipped: bool,
    pub minimum_perpetual_return: PerpetualReturn,
    pub break_even: BreakEvenResult,
}
