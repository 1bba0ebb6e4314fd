use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    BreakEvenResult, ComparisonReport, CorpusFigures, DepletionOutcome, PensionFigures,
    PerpetualReturn, RetirementProfile, SchemeRules, SimulationStepRecord, run_comparison,
};
use crate::error::{InputError, InputResult};
use crate::report::{format_amount, render_depletion_table, render_summary};

/// Upper bound on ages and life-expectancy years. The simulator keeps one
/// record per simulated year.
const MAX_YEARS: u32 = 150;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    current_age: Option<u32>,
    retirement_age: Option<u32>,
    current_salary: Option<f64>,
    salary_growth: Option<f64>,
    existing_corpus: Option<f64>,
    years_of_service: Option<i32>,

    employee_contribution: Option<f64>,
    employer_contribution: Option<f64>,
    annual_return: Option<f64>,
    annuity_rate: Option<f64>,

    pension_growth: Option<f64>,
    corpus_return: Option<f64>,
    employee_life_years: Option<u32>,
    spouse_additional_years: Option<i32>,

    pension_factor: Option<f64>,
    survivor_factor: Option<f64>,
    annuity_portion: Option<f64>,
    lump_sum_portion: Option<f64>,
    lump_sum_fraction: Option<f64>,
    service_cap_years: Option<u32>,
    months_per_year: Option<u32>,

    include_steps: Option<bool>,
}

#[derive(Parser, Debug)]
#[command(
    name = "upsnps",
    about = "Compare a UPS defined-benefit pension with an NPS corpus and project how long the NPS lump sum lasts"
)]
pub struct Cli {
    #[arg(long, default_value_t = 53)]
    current_age: u32,
    #[arg(long, default_value_t = 60)]
    retirement_age: u32,
    #[arg(
        long,
        default_value_t = 3_600_000.0,
        help = "Current annual basic + DA salary"
    )]
    current_salary: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual salary growth in percent"
    )]
    salary_growth_rate: f64,
    #[arg(long, default_value_t = 12_000_000.0, help = "Current NPS corpus")]
    existing_corpus: f64,
    #[arg(
        long,
        default_value_t = 32,
        allow_negative_numbers = true,
        help = "Completed years of service at retirement"
    )]
    years_of_service: i32,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Employee NPS contribution in percent of salary"
    )]
    employee_contribution_rate: f64,
    #[arg(
        long,
        default_value_t = 14.0,
        help = "Employer NPS contribution in percent of salary"
    )]
    employer_contribution_rate: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Expected annual return on NPS contributions in percent"
    )]
    annual_return_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Annuity conversion rate at retirement in percent"
    )]
    annuity_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Post-retirement UPS pension growth in percent"
    )]
    post_retirement_pension_growth: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Return on the invested NPS lump sum after retirement in percent"
    )]
    post_retirement_corpus_return: f64,
    #[arg(long, default_value_t = 20, help = "Expected years of life after retirement")]
    employee_life_years: u32,
    #[arg(
        long,
        default_value_t = 10,
        allow_negative_numbers = true,
        help = "Additional years the spouse may live after the employee"
    )]
    spouse_additional_years: i32,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "UPS pension as percent of final salary at full service"
    )]
    pension_factor: f64,
    #[arg(
        long,
        default_value_t = 60.0,
        help = "Spouse survivor pension in percent of the employee pension"
    )]
    survivor_factor: f64,
    #[arg(
        long,
        default_value_t = 40.0,
        help = "Percent of the NPS corpus used to buy the annuity"
    )]
    annuity_portion: f64,
    #[arg(
        long,
        default_value_t = 60.0,
        help = "Percent of the NPS corpus taken as an invested lump sum"
    )]
    lump_sum_portion: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "UPS lump sum per six months of service in percent of final monthly salary"
    )]
    lump_sum_fraction: f64,
    #[arg(long, default_value_t = 25, help = "Service years for a full UPS pension")]
    service_cap_years: u32,
    #[arg(long, default_value_t = 12)]
    months_per_year: u32,
    #[arg(long, help = "Print the comparison as JSON instead of a text report")]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayAmounts {
    final_salary: String,
    ups_monthly_pension: String,
    ups_spouse_monthly_pension: String,
    ups_lump_sum: String,
    nps_corpus: String,
    nps_monthly_annuity: String,
    nps_lump_sum: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    final_salary: f64,
    ups: PensionFigures,
    nps: CorpusFigures,
    outcome: DepletionOutcome,
    depletion_years: Option<u32>,
    perpetual: bool,
    coverage_years_needed: i64,
    shortfall_years: Option<i64>,
    spouse_phase_skipped: bool,
    minimum_perpetual_return: PerpetualReturn,
    break_even: BreakEvenResult,
    rules: SchemeRules,
    display: DisplayAmounts,
    steps: Vec<SimulationStepRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct CompareRequest {
    profile: RetirementProfile,
    rules: SchemeRules,
    include_steps: bool,
}

fn finite(flag: &'static str, value: f64) -> InputResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite { flag })
    }
}

fn percent_rate(flag: &'static str, percent: f64) -> InputResult<f64> {
    let percent = finite(flag, percent)?;
    if percent <= -100.0 {
        return Err(InputError::RateTooLow { flag });
    }
    Ok(percent / 100.0)
}

fn percent_share(flag: &'static str, percent: f64) -> InputResult<f64> {
    let percent = finite(flag, percent)?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(InputError::OutOfRange { flag, max: 100.0 });
    }
    Ok(percent / 100.0)
}

fn non_negative(flag: &'static str, value: f64) -> InputResult<f64> {
    let value = finite(flag, value)?;
    if value < 0.0 {
        return Err(InputError::Negative { flag });
    }
    Ok(value)
}

fn build_rules(cli: &Cli) -> InputResult<SchemeRules> {
    if cli.service_cap_years == 0 {
        return Err(InputError::NotPositive {
            flag: "--service-cap-years",
        });
    }
    if cli.months_per_year == 0 {
        return Err(InputError::NotPositive {
            flag: "--months-per-year",
        });
    }
    Ok(SchemeRules {
        pension_factor: percent_share("--pension-factor", cli.pension_factor)?,
        survivor_factor: percent_share("--survivor-factor", cli.survivor_factor)?,
        annuity_portion: percent_share("--annuity-portion", cli.annuity_portion)?,
        lump_sum_portion: percent_share("--lump-sum-portion", cli.lump_sum_portion)?,
        months_per_year: cli.months_per_year,
        service_cap_years: cli.service_cap_years,
        lump_sum_fraction: percent_share("--lump-sum-fraction", cli.lump_sum_fraction)?,
    })
}

fn bounded_years(flag: &'static str, years: u32) -> InputResult<u32> {
    if years > MAX_YEARS {
        return Err(InputError::OutOfRange {
            flag,
            max: f64::from(MAX_YEARS),
        });
    }
    Ok(years)
}

fn bounded_signed_years(flag: &'static str, years: i32) -> InputResult<i32> {
    if years.unsigned_abs() > MAX_YEARS {
        return Err(InputError::OutsideBounds {
            flag,
            min: -f64::from(MAX_YEARS),
            max: f64::from(MAX_YEARS),
        });
    }
    Ok(years)
}

pub fn build_profile(cli: &Cli) -> InputResult<(RetirementProfile, SchemeRules)> {
    let current_age = bounded_years("--current-age", cli.current_age)?;
    let retirement_age = bounded_years("--retirement-age", cli.retirement_age)?;
    if retirement_age <= current_age {
        return Err(InputError::RetirementNotAfterCurrentAge);
    }
    let years_to_retirement = i32::try_from(retirement_age - current_age).map_err(|_| {
        InputError::OutOfRange {
            flag: "--retirement-age",
            max: f64::from(MAX_YEARS),
        }
    })?;
    let employee_life_years = bounded_years("--employee-life-years", cli.employee_life_years)?;
    let spouse_additional_years =
        bounded_signed_years("--spouse-additional-years", cli.spouse_additional_years)?;

    let employee_rate =
        percent_rate("--employee-contribution-rate", cli.employee_contribution_rate)?;
    let employer_rate =
        percent_rate("--employer-contribution-rate", cli.employer_contribution_rate)?;

    let profile = RetirementProfile {
        current_salary: non_negative("--current-salary", cli.current_salary)?,
        salary_growth_rate: percent_rate("--salary-growth-rate", cli.salary_growth_rate)?,
        years_to_retirement,
        years_of_service: cli.years_of_service,
        contribution_rate: employee_rate + employer_rate,
        annual_return_rate: percent_rate("--annual-return-rate", cli.annual_return_rate)?,
        existing_corpus: non_negative("--existing-corpus", cli.existing_corpus)?,
        annuity_conversion_rate: percent_rate("--annuity-rate", cli.annuity_rate)?,
        post_retirement_pension_growth: percent_rate(
            "--post-retirement-pension-growth",
            cli.post_retirement_pension_growth,
        )?,
        post_retirement_corpus_return: percent_rate(
            "--post-retirement-corpus-return",
            cli.post_retirement_corpus_return,
        )?,
        employee_life_years,
        spouse_additional_years,
    };

    Ok((profile, build_rules(cli)?))
}

/// Parses the process arguments, runs one comparison and prints it.
pub fn run_cli() -> InputResult<()> {
    let cli = Cli::parse();
    let (profile, rules) = build_profile(&cli)?;
    let report = run_comparison(&profile, &rules);

    if cli.json {
        let response = build_compare_response(&report, rules, true);
        write_json(io::stdout().lock(), &response)?;
    } else {
        println!("{}", render_depletion_table(&report.depletion.steps));
        print!("{}", render_summary(&report));
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> InputResult<()> {
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| InputError::Output(e.to_string()))?;
    writeln!(writer).map_err(|e| InputError::Output(e.to_string()))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "UPS/NPS comparison API listening");
    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_handler_impl(payload: ComparePayload) -> Response {
    let request = match compare_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(%err, "rejected comparison request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let report = run_comparison(&request.profile, &request.rules);
    let response = build_compare_response(&report, request.rules, request.include_steps);
    json_response(StatusCode::OK, response)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn compare_request_from_json(json: &str) -> InputResult<CompareRequest> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| InputError::Payload(e.to_string()))?;
    compare_request_from_payload(payload)
}

fn compare_request_from_payload(payload: ComparePayload) -> InputResult<CompareRequest> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.current_salary {
        cli.current_salary = v;
    }
    if let Some(v) = payload.salary_growth {
        cli.salary_growth_rate = v;
    }
    if let Some(v) = payload.existing_corpus {
        cli.existing_corpus = v;
    }
    if let Some(v) = payload.years_of_service {
        cli.years_of_service = v;
    }
    if let Some(v) = payload.employee_contribution {
        cli.employee_contribution_rate = v;
    }
    if let Some(v) = payload.employer_contribution {
        cli.employer_contribution_rate = v;
    }
    if let Some(v) = payload.annual_return {
        cli.annual_return_rate = v;
    }
    if let Some(v) = payload.annuity_rate {
        cli.annuity_rate = v;
    }
    if let Some(v) = payload.pension_growth {
        cli.post_retirement_pension_growth = v;
    }
    if let Some(v) = payload.corpus_return {
        cli.post_retirement_corpus_return = v;
    }
    if let Some(v) = payload.employee_life_years {
        cli.employee_life_years = v;
    }
    if let Some(v) = payload.spouse_additional_years {
        cli.spouse_additional_years = v;
    }
    if let Some(v) = payload.pension_factor {
        cli.pension_factor = v;
    }
    if let Some(v) = payload.survivor_factor {
        cli.survivor_factor = v;
    }
    if let Some(v) = payload.annuity_portion {
        cli.annuity_portion = v;
    }
    if let Some(v) = payload.lump_sum_portion {
        cli.lump_sum_portion = v;
    }
    if let Some(v) = payload.lump_sum_fraction {
        cli.lump_sum_fraction = v;
    }
    if let Some(v) = payload.service_cap_years {
        cli.service_cap_years = v;
    }
    if let Some(v) = payload.months_per_year {
        cli.months_per_year = v;
    }

    let (profile, rules) = build_profile(&cli)?;
    Ok(CompareRequest {
        profile,
        rules,
        include_steps: payload.include_steps.unwrap_or(true),
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 53,
        retirement_age: 60,
        current_salary: 3_600_000.0,
        salary_growth_rate: 7.0,
        existing_corpus: 12_000_000.0,
        years_of_service: 32,
        employee_contribution_rate: 10.0,
        employer_contribution_rate: 14.0,
        annual_return_rate: 8.0,
        annuity_rate: 5.0,
        post_retirement_pension_growth: 5.0,
        post_retirement_corpus_return: 8.0,
        employee_life_years: 20,
        spouse_additional_years: 10,
        pension_factor: 50.0,
        survivor_factor: 60.0,
        annuity_portion: 40.0,
        lump_sum_portion: 60.0,
        lump_sum_fraction: 10.0,
        service_cap_years: 25,
        months_per_year: 12,
        json: false,
    }
}

fn build_compare_response(
    report: &ComparisonReport,
    rules: SchemeRules,
    include_steps: bool,
) -> CompareResponse {
    CompareResponse {
        final_salary: report.projection.final_salary,
        ups: report.ups,
        nps: report.nps,
        outcome: report.depletion.outcome,
        depletion_years: report.depletion.outcome.years(),
        perpetual: report.depletion.outcome.is_perpetual(),
        coverage_years_needed: report.coverage_years_needed,
        shortfall_years: report.shortfall_years,
        spouse_phase_skipped: report.spouse_phase_skipped,
        minimum_perpetual_return: report.minimum_perpetual_return,
        break_even: report.break_even.clone(),
        rules,
        display: DisplayAmounts {
            final_salary: format_amount(report.projection.final_salary),
            ups_monthly_pension: format_amount(report.ups.monthly_pension),
            ups_spouse_monthly_pension: format_amount(report.ups.spouse_monthly_pension),
            ups_lump_sum: format_amount(report.ups.lump_sum),
            nps_corpus: format_amount(report.nps.accumulated_corpus),
            nps_monthly_annuity: format_amount(report.nps.monthly_annuity),
            nps_lump_sum: format_amount(report.nps.investable_lump_sum),
        },
        steps: if include_steps {
            report.depletion.steps.clone()
        } else {
            Vec::new()
        },
    }
}
