use tracing::debug;

use super::types::{
    DepletionInputs, DepletionOutcome, DepletionRun, PerpetualReturn, Phase, SchemeRules,
    SimulationStepRecord,
};

#[derive(Debug)]
struct SimulationState {
    balance: f64,
    year: u32,
    db_monthly: f64,
}

impl SimulationState {
    fn start(inputs: &DepletionInputs) -> Self {
        Self {
            balance: inputs.investable_lump_sum,
            year: 0,
            db_monthly: inputs.initial_db_monthly,
        }
    }

    fn running(&self, total_years: i64) -> bool {
        self.balance > 0.0 && i64::from(self.year) < total_years
    }
}

/// Runs the year-by-year draw-down of the invested NPS lump sum against the
/// UPS income it has to match.
///
/// The corpus funds the shortfall between DB-side income (UPS pension, reduced
/// by the survivor factor in the spouse phase, plus returns on the UPS lump
/// sum) and DC-side income (the flat NPS annuity plus returns on the corpus).
/// The shortfall is withdrawn before the year's growth is applied.
///
/// Perpetual sufficiency is only tested in the first simulated year. A zero
/// or negative horizon, or a non-positive starting balance, returns year 0
/// without evaluating it.
pub fn simulate_corpus_depletion(inputs: &DepletionInputs, rules: &SchemeRules) -> DepletionRun {
    let total_years = inputs.total_years();
    let months = rules.months();
    let rate = inputs.corpus_return;
    let db_lump_sum_return = inputs.db_lump_sum * rate;
    let annuity_yearly = inputs.annuity_monthly * months;

    let mut state = SimulationState::start(inputs);
    let mut steps = Vec::with_capacity(total_years.clamp(0, 200) as usize);

    while state.running(total_years) {
        let phase = if state.year >= inputs.employee_life_years {
            Phase::Spouse
        } else {
            Phase::Employee
        };
        let factor = match phase {
            Phase::Employee => 1.0,
            Phase::Spouse => rules.survivor_factor,
        };
        let db_income = state.db_monthly * factor;
        let db_yearly = db_income * months + db_lump_sum_return;
        let interest_on_opening = state.balance * rate;
        let dc_yearly = annuity_yearly + interest_on_opening;
        let yearly_gap = db_yearly - dc_yearly;
        let opening_balance = state.balance;

        if state.year == 0 && dc_yearly >= db_yearly {
            steps.push(SimulationStepRecord {
                year: state.year,
                phase,
                db_monthly: db_income,
                annuity_monthly: inputs.annuity_monthly,
                db_yearly_income: db_yearly,
                dc_yearly_income: dc_yearly,
                yearly_gap,
                withdrawal: 0.0,
                opening_balance,
                interest_earned: interest_on_opening,
                closing_balance: opening_balance,
            });
            debug!(
                balance = opening_balance,
                db_yearly, dc_yearly, "corpus returns cover the gap perpetually"
            );
            return DepletionRun {
                outcome: DepletionOutcome::PerpetuallySufficient,
                steps,
            };
        }

        let withdrawal = yearly_gap.max(0.0);
        let after_withdrawal = state.balance - withdrawal;
        let interest_earned = after_withdrawal * rate;
        state.balance = after_withdrawal * (1.0 + rate);

        steps.push(SimulationStepRecord {
            year: state.year,
            phase,
            db_monthly: db_income,
            annuity_monthly: inputs.annuity_monthly,
            db_yearly_income: db_yearly,
            dc_yearly_income: dc_yearly,
            yearly_gap,
            withdrawal,
            opening_balance,
            interest_earned,
            closing_balance: state.balance,
        });
        debug!(
            year = state.year,
            ?phase,
            withdrawal,
            balance = state.balance,
            "simulated year"
        );

        state.db_monthly *= 1.0 + inputs.pension_growth;
        state.year += 1;
    }

    let outcome = if state.balance > 0.0 {
        DepletionOutcome::HorizonReached { year: state.year }
    } else {
        DepletionOutcome::Exhausted { year: state.year }
    };
    debug!(?outcome, balance = state.balance, "depletion run finished");

    DepletionRun { outcome, steps }
}

/// Smallest corpus return at which the year-0 perpetuity test passes.
///
/// At year 0 the test is `annuity*m + L*r >= db*m + D*r`, so the threshold is
/// `(db - annuity) * m / (L - D)`. It is undefined when `L - D` is not
/// positive, since no rate then satisfies the inequality by growth alone.
pub fn minimum_perpetual_return(
    inputs: &DepletionInputs,
    rules: &SchemeRules,
) -> PerpetualReturn {
    let months = rules.months();
    let yearly_gap = (inputs.initial_db_monthly - inputs.annuity_monthly) * months;
    let effective_lump_sum = inputs.investable_lump_sum - inputs.db_lump_sum;
    if !(effective_lump_sum > 0.0) {
        return PerpetualReturn::Undefined;
    }
    let rate = yearly_gap / effective_lump_sum;
    if rate.is_finite() {
        PerpetualReturn::Rate(rate)
    } else {
        PerpetualReturn::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assume, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn flat_inputs(
        lump_sum: f64,
        db_monthly: f64,
        annuity: f64,
        employee: u32,
        spouse: i32,
    ) -> DepletionInputs {
        let mut inputs = DepletionInputs::new(lump_sum, db_monthly, annuity, employee, spouse);
        inputs.pension_growth = 0.0;
        inputs.corpus_return = 0.0;
        inputs
    }

    // 36L salary, 7% growth over 7 years, 32 years of service, 24% contributions
    // at 9.5% and a 7% annuity rate.
    fn reference_inputs() -> DepletionInputs {
        DepletionInputs::new(
            19_842_151.957_613_934,
            240_867.221_471_764_58,
            77_163.924_279_609_75,
            20,
            10,
        )
    }

    #[test]
    fn zero_corpus_exhausts_immediately() {
        let inputs = DepletionInputs::new(0.0, 100_000.0, 50_000.0, 20, 10);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::Exhausted { year: 0 });
        assert!(run.steps.is_empty());
    }

    #[test]
    fn negative_corpus_exhausts_immediately() {
        let inputs = DepletionInputs::new(-250_000.0, 100_000.0, 150_000.0, 20, 10);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::Exhausted { year: 0 });
        assert!(run.steps.is_empty());
    }

    #[test]
    fn balance_hitting_zero_in_final_year_is_exhausted() {
        // 300k drawn per year for two years.
        let inputs = flat_inputs(600_000.0, 25_000.0, 0.0, 2, 0);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::Exhausted { year: 2 });
        assert_eq!(run.steps.len(), 2);
        assert_approx(run.steps[1].closing_balance, 0.0);

        let inputs = flat_inputs(600_001.0, 25_000.0, 0.0, 2, 0);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::HorizonReached { year: 2 });
        assert_approx(run.steps[1].closing_balance, 1.0);
    }

    #[test]
    fn annuity_above_pension_is_perpetual() {
        let inputs = DepletionInputs::new(10_000_000.0, 50_000.0, 100_000.0, 20, 10);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::PerpetuallySufficient);
        assert!(run.outcome.years().is_none());
        assert_eq!(run.steps.len(), 1);
        let step = run.steps[0];
        assert_eq!(step.year, 0);
        assert_eq!(step.withdrawal, 0.0);
        assert_approx(step.closing_balance, 10_000_000.0);
    }

    #[test]
    fn exhausts_when_gap_outgrows_returns() {
        let inputs = DepletionInputs::new(1_000_000.0, 100_000.0, 50_000.0, 20, 10);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::Exhausted { year: 2 });
        assert_eq!(run.steps.len(), 2);

        let first = run.steps[0];
        assert_approx(first.db_yearly_income, 1_200_000.0);
        assert_approx(first.dc_yearly_income, 680_000.0);
        assert_approx(first.withdrawal, 520_000.0);
        assert_approx(first.closing_balance, 518_400.0);

        let second = run.steps[1];
        assert_approx(second.db_monthly, 105_000.0);
        assert_approx(second.closing_balance, -108_138.24);
    }

    #[test]
    fn withdrawal_is_deducted_before_growth() {
        let mut inputs = DepletionInputs::new(1_000_000.0, 20_000.0, 10_000.0, 1, 0);
        inputs.corpus_return = 0.10;
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        // gap = 240k - (120k + 100k) = 20k; (1_000k - 20k) * 1.1
        assert_eq!(run.outcome, DepletionOutcome::HorizonReached { year: 1 });
        assert_approx(run.steps[0].closing_balance, 1_078_000.0);
        assert_approx(run.steps[0].interest_earned, 98_000.0);
    }

    #[test]
    fn reaches_horizon_with_survivor_factor_in_spouse_phase() {
        let inputs = flat_inputs(5_000_000.0, 50_000.0, 20_000.0, 10, 5);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::HorizonReached { year: 15 });
        assert_eq!(run.steps.len(), 15);
        assert_eq!(run.steps[9].phase, Phase::Employee);
        assert_eq!(run.steps[10].phase, Phase::Spouse);
        assert_approx(run.steps[10].db_monthly, 30_000.0);
        assert_approx(run.steps[14].closing_balance, 800_000.0);
    }

    #[test]
    fn negative_spouse_years_shorten_horizon() {
        let inputs = flat_inputs(5_000_000.0, 50_000.0, 20_000.0, 10, -3);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::HorizonReached { year: 7 });
        assert!(run.steps.iter().all(|s| s.phase == Phase::Employee));
    }

    #[test]
    fn non_positive_horizon_skips_perpetuity_check() {
        // Would be perpetual at year 0, but the loop never runs.
        let inputs = DepletionInputs::new(100_000_000.0, 50_000.0, 20_000.0, 10, -10);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::HorizonReached { year: 0 });
        assert!(run.steps.is_empty());

        let inputs = DepletionInputs::new(100_000_000.0, 50_000.0, 20_000.0, 10, -15);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome.years(), Some(0));
    }

    #[test]
    fn perpetuity_is_only_checked_in_first_year() {
        // From the spouse phase on, the annuity exceeds the reduced pension and
        // nothing is withdrawn, yet the run continues to the horizon.
        let inputs = flat_inputs(1_000_000.0, 30_000.0, 25_000.0, 2, 3);
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::HorizonReached { year: 5 });
        assert_approx(run.steps[1].closing_balance, 880_000.0);
        for step in &run.steps[2..] {
            assert!(step.yearly_gap < 0.0);
            assert_eq!(step.withdrawal, 0.0);
            assert_approx(step.closing_balance, 880_000.0);
        }
    }

    #[test]
    fn db_lump_sum_returns_widen_the_gap() {
        let without = reference_inputs();
        let mut with = without;
        with.db_lump_sum = 3_083_100.434_838_587;

        let rules = SchemeRules::default();
        let run_without = simulate_corpus_depletion(&without, &rules);
        let run_with = simulate_corpus_depletion(&with, &rules);
        assert_eq!(run_with.outcome, DepletionOutcome::Exhausted { year: 24 });
        assert!(run_without.outcome.years_or_infinity() >= 24.0);
        assert_approx_tol(run_with.steps[23].closing_balance, -3_052_813.456_675_503, 1e-2);
    }

    #[test]
    fn high_return_is_perpetual_with_db_lump_sum() {
        let mut inputs = reference_inputs();
        inputs.db_lump_sum = 3_083_100.434_838_587;
        inputs.corpus_return = 0.20;
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert!(run.outcome.is_perpetual());
    }

    #[test]
    fn nan_rate_terminates_without_panicking() {
        let mut inputs = DepletionInputs::new(1_000_000.0, 100_000.0, 50_000.0, 20, 10);
        inputs.corpus_return = f64::NAN;
        let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
        assert_eq!(run.outcome, DepletionOutcome::Exhausted { year: 1 });
    }

    #[test]
    fn minimum_perpetual_return_from_year_zero_gap() {
        let inputs = DepletionInputs::new(10_000_000.0, 100_000.0, 50_000.0, 20, 10);
        let rules = SchemeRules::default();
        assert_eq!(
            minimum_perpetual_return(&inputs, &rules),
            PerpetualReturn::Rate(0.06)
        );

        let PerpetualReturn::Rate(rate) = minimum_perpetual_return(&inputs, &rules) else {
            panic!("expected a defined rate");
        };
        let mut at_threshold = inputs;
        at_threshold.corpus_return = rate;
        assert!(simulate_corpus_depletion(&at_threshold, &rules).outcome.is_perpetual());
    }

    #[test]
    fn minimum_perpetual_return_undefined_for_zero_lump_sum() {
        let rules = SchemeRules::default();
        let inputs = DepletionInputs::new(0.0, 100_000.0, 50_000.0, 20, 10);
        assert_eq!(minimum_perpetual_return(&inputs, &rules), PerpetualReturn::Undefined);

        let mut inputs = DepletionInputs::new(1_000_000.0, 100_000.0, 50_000.0, 20, 10);
        inputs.db_lump_sum = 2_000_000.0;
        assert_eq!(minimum_perpetual_return(&inputs, &rules), PerpetualReturn::Undefined);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_higher_return_never_shortens_depletion(
            lump_sum in 0u32..50_000_000,
            db_monthly in 0u32..400_000,
            annuity in 0u32..200_000,
            employee in 0u32..40,
            spouse in -10i32..20,
            growth_bp in 0i32..1_000,
            low_bp in 0i32..2_000,
            bump_bp in 0i32..1_000
        ) {
            let mut low = DepletionInputs::new(
                f64::from(lump_sum),
                f64::from(db_monthly),
                f64::from(annuity),
                employee,
                spouse,
            );
            low.pension_growth = f64::from(growth_bp) / 10_000.0;
            low.corpus_return = f64::from(low_bp) / 10_000.0;
            let mut high = low;
            high.corpus_return = f64::from(low_bp + bump_bp) / 10_000.0;

            let rules = SchemeRules::default();
            let low_years = simulate_corpus_depletion(&low, &rules).outcome.years_or_infinity();
            let high_years = simulate_corpus_depletion(&high, &rules).outcome.years_or_infinity();
            prop_assert!(high_years >= low_years);
        }

        #[test]
        fn prop_run_terminates_within_horizon(
            lump_sum in 1u32..50_000_000,
            db_monthly in 0u32..400_000,
            annuity in 0u32..200_000,
            employee in 0u32..40,
            spouse in -10i32..20,
            return_bp in 0i32..2_000
        ) {
            let mut inputs = DepletionInputs::new(
                f64::from(lump_sum),
                f64::from(db_monthly),
                f64::from(annuity),
                employee,
                spouse,
            );
            inputs.corpus_return = f64::from(return_bp) / 10_000.0;
            let total = inputs.total_years();
            prop_assume!(total > 0);

            let run = simulate_corpus_depletion(&inputs, &SchemeRules::default());
            prop_assert!(run.steps.len() as i64 <= total);
            for (idx, step) in run.steps.iter().enumerate() {
                prop_assert!(step.year as usize == idx);
                prop_assert!(step.withdrawal >= 0.0);
            }
            match run.outcome {
                DepletionOutcome::PerpetuallySufficient => prop_assert!(run.steps.len() == 1),
                DepletionOutcome::Exhausted { year } => {
                    prop_assert!(year as usize == run.steps.len());
                    prop_assert!(run.steps.last().map_or(true, |s| s.closing_balance <= 0.0));
                }
                DepletionOutcome::HorizonReached { year } => {
                    prop_assert!(i64::from(year) == total);
                    prop_assert!(run.steps.iter().all(|s| s.closing_balance > 0.0));
                }
            }
        }
    }
}
