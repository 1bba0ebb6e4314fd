mod depletion;
mod engine;
mod nps;
mod salary;
mod solver;
mod types;
mod ups;

pub use depletion::{minimum_perpetual_return, simulate_corpus_depletion};
pub use engine::{run_comparison, run_comparison_with};
pub use nps::{
    accumulate_contribution_corpus, contribution_monthly_annuity, corpus_figures,
    investable_lump_sum,
};
pub use salary::project_final_salary;
pub use solver::solve_break_even_return;
pub use types::{
    BreakEvenConfig, BreakEvenIteration, BreakEvenResult, ComparisonReport, CorpusFigures,
    DepletionInputs, DepletionOutcome, DepletionRun, PensionFigures, PerpetualReturn, Phase,
    ProjectionResult, RetirementProfile, SchemeRules, SimulationStepRecord,
};
pub use ups::{defined_benefit_lump_sum, defined_benefit_monthly_pension, pension_figures};
