use std::fmt::{self, Display};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ─── Template Types ───────────────────────────────────────────────────────────

/// A reusable, parameterized request description shared by every test case in
/// a batch. Parsed once from a captured cURL command and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurlTemplate {
    pub url: String,
    pub method: String,
    /// Header values may contain placeholders. Insertion order is preserved;
    /// a duplicate name overwrites the earlier value in place.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for CurlTemplate {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }
}

impl CurlTemplate {
    /// A template without a URL cannot be executed.
    pub fn is_usable(&self) -> bool {
        !self.url.is_empty()
    }
}

/// The concrete request produced by substituting one case's parameters into
/// the template. Captured on the case before the network call so failed runs
/// can still be inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Raw outcome of a single transport attempt.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: u16,
    pub body: String,
}

/// Transport mode, selected once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Issue method, URL and filtered headers as-is.
    Direct,
    /// Route through the CORS relay and unwrap its JSON envelope.
    Proxy,
}

impl Default for FetchMode {
    fn default() -> Self {
        FetchMode::Direct
    }
}

impl Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchMode::Direct => "direct",
            FetchMode::Proxy => "proxy",
        };
        write!(f, "{label}")
    }
}

// ─── Comparison Types ─────────────────────────────────────────────────────────

/// How an extracted value is compared against the expected baseline.
/// All strategies are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStrategy {
    Contains,
    Exact,
    StartsWith,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::Contains
    }
}

impl Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStrategy::Contains => "contains",
            MatchStrategy::Exact => "exact",
            MatchStrategy::StartsWith => "starts-with",
        };
        write!(f, "{label}")
    }
}

/// Batch-global extraction and comparison settings, read-only during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonConfig {
    pub json_path: String,
    pub strategy: MatchStrategy,
}

// ─── Test Case Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Error,
}

impl Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestStatus::Pending => "PENDING",
            TestStatus::Running => "RUNNING",
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::Error => "ERROR",
        };
        write!(f, "{label}")
    }
}

/// One concrete test instance: a parameter row, the expected baseline value,
/// and the accumulated result of executing the template against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub params: Vec<(String, String)>,
    pub expected_result: String,
    pub status: TestStatus,
    #[serde(default)]
    pub compared_value: Option<String>,
    #[serde(default)]
    pub actual_response: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub final_url: Option<String>,
    #[serde(default)]
    pub final_headers: Option<Vec<(String, String)>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl TestCase {
    pub fn new(id: String, params: Vec<(String, String)>, expected_result: String) -> Self {
        Self {
            id,
            params,
            expected_result,
            status: TestStatus::Pending,
            compared_value: None,
            actual_response: None,
            status_code: None,
            final_url: None,
            final_headers: None,
            error_message: None,
        }
    }
}
