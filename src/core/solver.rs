use super::depletion::simulate_corpus_depletion;
use super::types::{
    BreakEvenConfig, BreakEvenIteration, BreakEvenResult, DepletionInputs, DepletionOutcome,
    SchemeRules,
};

fn covers_horizon(outcome: DepletionOutcome) -> bool {
    match outcome {
        DepletionOutcome::PerpetuallySufficient | DepletionOutcome::HorizonReached { .. } => true,
        DepletionOutcome::Exhausted { .. } => false,
    }
}

fn evaluate_rate(inputs: &DepletionInputs, rules: &SchemeRules, rate: f64) -> DepletionOutcome {
    let mut candidate = *inputs;
    candidate.corpus_return = rate;
    simulate_corpus_depletion(&candidate, rules).outcome
}

/// Bisects the post-retirement corpus return for the lowest rate at which the
/// invested lump sum lasts the whole horizon.
///
/// Assumes coverage is monotone in the rate, which holds when there is no UPS
/// lump sum earning the same return on the DB side.
pub fn solve_break_even_return(
    inputs: &DepletionInputs,
    rules: &SchemeRules,
    config: BreakEvenConfig,
) -> BreakEvenResult {
    if !config.search_min.is_finite()
        || !config.search_max.is_finite()
        || config.search_max < config.search_min
    {
        return BreakEvenResult {
            solved_rate: None,
            iterations: Vec::new(),
            converged: false,
            feasible: false,
            message: "Search bounds must be finite with min <= max.".to_string(),
        };
    }

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);

    if covers_horizon(evaluate_rate(inputs, rules, config.search_min)) {
        return BreakEvenResult {
            solved_rate: Some(config.search_min),
            iterations,
            converged: true,
            feasible: true,
            message: "Already covers the horizon at the lower return bound.".to_string(),
        };
    }
    if !covers_horizon(evaluate_rate(inputs, rules, config.search_max)) {
        return BreakEvenResult {
            solved_rate: None,
            iterations,
            converged: false,
            feasible: false,
            message: "No return within the search bounds covers the horizon.".to_string(),
        };
    }

    let mut lo = config.search_min;
    let mut hi = config.search_max;
    let mut converged = false;
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        let outcome = evaluate_rate(inputs, rules, mid);
        iterations.push(BreakEvenIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_rate: mid,
            outcome,
        });

        if covers_horizon(outcome) {
            hi = mid;
        } else {
            lo = mid;
        }

        if (hi - lo).abs() <= config.tolerance {
            converged = true;
            break;
        }
    }

    let message = if converged {
        "Solved break-even corpus return.".to_string()
    } else {
        "Reached max iterations before tolerance was met; returning best estimate.".to_string()
    };

    BreakEvenResult {
        solved_rate: Some(hi),
        iterations,
        converged,
        feasible: true,
        message,
    }
}
