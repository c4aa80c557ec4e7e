//! Sequential batch execution.
//!
//! One case at a time, in list order: substitute parameters, execute with
//! bounded retries, extract, compare, record. A fault in one case never
//! aborts the batch; only a missing template URL or an empty case list does.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::csv::{row_value, Row};
use crate::domain::{ComparisonConfig, CurlTemplate, ResolvedRequest, TestCase, TestStatus};
use crate::engine::cancel::cancel_requested;
use crate::engine::extract::extract_path;
use crate::engine::http::{build_headers, Transport, FORBIDDEN_HEADERS};
use crate::engine::matcher::value_matches;
use crate::engine::params::substitute_params;

pub const MAX_ATTEMPTS: u32 = 3;
pub const ATTEMPT_DELAY_MS: u64 = 2000;

/// Retry and header-filtering knobs, surfaced as configuration so tests can
/// override them without touching control flow.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub forbidden_headers: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            retry_delay_ms: ATTEMPT_DELAY_MS,
            forbidden_headers: FORBIDDEN_HEADERS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub completed: usize,
    pub cancelled: bool,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

/// Build test cases from parallel input and baseline rows aligned by index.
/// The expected value comes from the baseline row's configured field, then
/// its `description` field, then its first column, then empty. Without
/// baseline rows the input row itself is the baseline source.
pub fn generate_test_cases(
    inputs: &[Row],
    baselines: &[Row],
    expected_field: &str,
) -> Vec<TestCase> {
    let stamp = now_ms();
    let empty = Row::new();

    inputs
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let source = if baselines.is_empty() {
                row
            } else {
                baselines.get(index).unwrap_or(&empty)
            };
            TestCase::new(
                format!("tc-{index}-{stamp}"),
                row.clone(),
                resolve_expected(source, expected_field),
            )
        })
        .collect()
}

fn resolve_expected(source: &[(String, String)], expected_field: &str) -> String {
    for field in [expected_field, "description"] {
        if let Some(value) = row_value(source, field) {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    source.first().map(|(_, value)| value.clone()).unwrap_or_default()
}

/// Substitute one case's parameters into the template URL and headers. The
/// denylisted header names are dropped before substitution; everything uses
/// the same parameter mapping, never a stale one.
fn resolve_request(template: &CurlTemplate, case: &TestCase, config: &RunnerConfig) -> ResolvedRequest {
    let url = substitute_params(&template.url, &case.params);
    let headers = template
        .headers
        .iter()
        .filter(|(name, _)| {
            !config
                .forbidden_headers
                .iter()
                .any(|forbidden| forbidden.eq_ignore_ascii_case(name))
        })
        .map(|(name, value)| (name.clone(), substitute_params(value, &case.params)))
        .collect();

    ResolvedRequest {
        method: template.method.clone(),
        url,
        headers,
    }
}

/// Up to `max_attempts` tries with a fixed delay in between (none after the
/// last). An attempt only counts as a success on HTTP 200 with a non-empty
/// trimmed body; otherwise the last observed status and body are kept, which
/// stay `0`/empty when every attempt failed at the transport level.
async fn fetch_with_retries(
    request: &ResolvedRequest,
    config: &RunnerConfig,
    transport: &dyn Transport,
) -> (u16, String) {
    let mut status = 0u16;
    let mut body = String::new();
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match transport.fetch(request).await {
            Ok(outcome) => {
                status = outcome.status;
                body = outcome.body;
                if status == 200 && !body.trim().is_empty() {
                    return (status, body);
                }
                debug!(status, attempt, "attempt returned an unusable response");
            }
            Err(error) => {
                debug!(attempt, %error, "attempt failed");
            }
        }
        if attempt < max_attempts {
            sleep(Duration::from_millis(config.retry_delay_ms)).await;
        }
    }

    (status, body)
}

/// Steps 4–5 of a case's execution: parse the body as JSON and extract, or
/// fall back to the raw text, then compare and set Passed/Failed.
pub fn evaluate_response(case: &mut TestCase, raw: &str, comparison: &ComparisonConfig) {
    let target = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(document) => extract_path(&document, &comparison.json_path),
        Err(_) => raw.to_string(),
    };

    case.status = if value_matches(&target, &case.expected_result, comparison.strategy) {
        TestStatus::Passed
    } else {
        TestStatus::Failed
    };
    case.compared_value = Some(target);
}

pub async fn run_case(
    case: &mut TestCase,
    template: &CurlTemplate,
    comparison: &ComparisonConfig,
    config: &RunnerConfig,
    transport: &dyn Transport,
) {
    case.status = TestStatus::Running;
    if let Err(message) = execute_case(case, template, comparison, config, transport).await {
        warn!(case = %case.id, error = %message, "case errored");
        case.status = TestStatus::Error;
        case.error_message = Some(message);
    }
}

async fn execute_case(
    case: &mut TestCase,
    template: &CurlTemplate,
    comparison: &ComparisonConfig,
    config: &RunnerConfig,
    transport: &dyn Transport,
) -> Result<(), String> {
    let resolved = resolve_request(template, case, config);
    case.final_url = Some(resolved.url.clone());
    case.final_headers = Some(resolved.headers.clone());

    // Invalid header names abort the case before any attempt is made.
    build_headers(&resolved.headers)?;

    debug!(case = %case.id, url = %resolved.url, "sending request");
    let (status, body) = fetch_with_retries(&resolved, config, transport).await;

    case.status_code = Some(status);
    case.actual_response = Some(body.clone());
    evaluate_response(case, &body, comparison);
    Ok(())
}

/// Run every case strictly in list order, reporting progress after each as
/// `round(i/n*100)`. Cancellation is honored at the top of each iteration;
/// remaining cases stay Pending.
pub async fn run_batch(
    template: &CurlTemplate,
    cases: &mut [TestCase],
    comparison: &ComparisonConfig,
    config: &RunnerConfig,
    transport: &dyn Transport,
    cancel_rx: &mut broadcast::Receiver<()>,
    mut on_progress: impl FnMut(u8, &TestCase),
) -> Result<BatchOutcome, String> {
    if !template.is_usable() {
        return Err("cURL template is incomplete: no URL found".to_string());
    }
    if cases.is_empty() {
        return Err("No test cases loaded".to_string());
    }

    let total = cases.len();
    info!(total, "starting batch run");

    let mut outcome = BatchOutcome::default();
    for (index, case) in cases.iter_mut().enumerate() {
        if cancel_requested(cancel_rx) {
            warn!(completed = outcome.completed, "batch cancelled");
            outcome.cancelled = true;
            break;
        }

        run_case(case, template, comparison, config, transport).await;
        outcome.completed = index + 1;

        let progress = (((index + 1) as f64 / total as f64) * 100.0).round() as u8;
        on_progress(progress, case);
    }

    Ok(outcome)
}

/// Re-resolve one case's status from a literal response body, bypassing the
/// network and retries entirely.
pub fn apply_manual_override(
    cases: &mut [TestCase],
    case_id: &str,
    response: &str,
    comparison: &ComparisonConfig,
) -> Result<TestStatus, String> {
    let case = cases
        .iter_mut()
        .find(|case| case.id == case_id)
        .ok_or_else(|| format!("Unknown test case id `{case_id}`"))?;

    case.actual_response = Some(response.to_string());
    case.status_code = Some(200);
    evaluate_response(case, response, comparison);
    Ok(case.status)
}

/// Report rows for the CSV sink, one per case.
pub fn report_rows(cases: &[TestCase]) -> Vec<Row> {
    cases
        .iter()
        .map(|case| {
            let params: serde_json::Map<String, serde_json::Value> = case
                .params
                .iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                .collect();

            vec![
                ("id".to_string(), case.id.clone()),
                ("params".to_string(), serde_json::Value::Object(params).to_string()),
                ("expected".to_string(), case.expected_result.clone()),
                ("extracted".to_string(), case.compared_value.clone().unwrap_or_default()),
                ("status".to_string(), case.status.to_string()),
                (
                    "statusCode".to_string(),
                    case.status_code.map(|code| code.to_string()).unwrap_or_default(),
                ),
                ("url".to_string(), case.final_url.clone().unwrap_or_default()),
                ("error".to_string(), case.error_message.clone().unwrap_or_default()),
            ]
        })
        .collect()
}
