pub fn project_final_salary(current_salary: f64, growth_rate: f64, years: i32) -> f64 {
    current_salary * (1.0 + growth_rate).powi(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn compounds_salary_over_horizon() {
        assert_approx(project_final_salary(3_600_000.0, 0.07, 7), 5_780_813.315_322_35);
        assert_approx(project_final_salary(100_000.0, 0.05, 5), 127_628.156_25);
    }

    #[test]
    fn zero_years_returns_current_salary() {
        assert_approx(project_final_salary(3_600_000.0, 0.07, 0), 3_600_000.0);
    }

    #[test]
    fn zero_growth_keeps_salary_flat() {
        assert_approx(project_final_salary(3_600_000.0, 0.0, 7), 3_600_000.0);
    }

    #[test]
    fn negative_years_shrink_salary() {
        let shrunk = project_final_salary(3_600_000.0, 0.07, -1);
        assert_approx(shrunk, 3_600_000.0 / 1.07);
        assert!(shrunk < 3_600_000.0);
    }

    #[test]
    fn negative_inputs_pass_through() {
        assert!(project_final_salary(-1_000_000.0, 0.07, 5) < 0.0);
        assert!(project_final_salary(1_000_000.0, -0.1, 5) < 1_000_000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_doubling_salary_doubles_projection(
            salary in 0u32..50_000_000,
            growth_bp in -500i32..2_000,
            years in 0i32..40
        ) {
            let salary = f64::from(salary);
            let growth = f64::from(growth_bp) / 10_000.0;
            let base = project_final_salary(salary, growth, years);
            let doubled = project_final_salary(2.0 * salary, growth, years);
            prop_assert!((doubled - 2.0 * base).abs() <= 1e-9 * base.abs().max(1.0));
        }
    }
}
