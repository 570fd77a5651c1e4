//! External classifier boundary.
//!
//! The classifier is a remote service consumed over HTTP, two calls per
//! function: triage first (`family == "safe"` short-circuits), then a
//! family-guided classification that yields a CWE identifier and confidence.
//! The CWE is resolved locally against a fixed table.

pub mod cwe;

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use cwe::Severity;

/// Errors from the external classification service.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("cannot reach classifier: {0}")]
    Network(#[source] reqwest::Error),
    #[error("classifier request timed out")]
    Timeout,
    #[error("classifier returned HTTP {0}")]
    Status(u16),
    #[error("classifier runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Final verdict on a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Vulnerable,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "safe",
            Verdict::Vulnerable => "vulnerable",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifier output for one function.
///
/// A vulnerable verdict always carries its CWE resolution and confidence;
/// a safe verdict carries nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Safe,
    Vulnerable {
        family: String,
        cwe: String,
        cwe_name: String,
        severity: Severity,
        confidence: f64,
    },
}

impl Classification {
    pub fn verdict(&self) -> Verdict {
        match self {
            Classification::Safe => Verdict::Safe,
            Classification::Vulnerable { .. } => Verdict::Vulnerable,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        matches!(self, Classification::Vulnerable { .. })
    }
}

/// Seam between the orchestrator and the remote service.
///
/// Implemented by [`HttpClassifier`] in production and by fakes in tests.
pub trait Classifier {
    /// One up-front health probe; scans do not start against a dead backend.
    fn health(&self) -> bool;

    /// Run a single function body through triage and classification.
    fn analyze(&self, code: &str) -> Result<Classification, ClassifierError>;
}

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TriageResponse {
    family: Option<String>,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    cwe: Option<String>,
    confidence: Option<f64>,
}

/// Reqwest-backed classifier client.
///
/// Calls block the caller for up to the bounded per-request timeout; the
/// pipeline is synchronous end-to-end, so the async client is driven by a
/// runtime owned here.
pub struct HttpClassifier {
    http: reqwest::Client,
    base_url: String,
    runtime: tokio::runtime::Runtime,
}

impl HttpClassifier {
    pub fn new(base_url: &str) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ccure/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClassifierError::Network)?;
        let runtime = tokio::runtime::Runtime::new()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn triage(&self, code: &str) -> Result<String, ClassifierError> {
        let response = self
            .http
            .post(format!("{}/triage", self.base_url))
            .json(&serde_json::json!({ "code": code }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        let body: TriageResponse = response.json().await.map_err(transport_error)?;
        // A triage response without a family reads as safe.
        Ok(body.family.unwrap_or_else(|| "safe".to_string()))
    }

    async fn classify_family(
        &self,
        code: &str,
        family: &str,
    ) -> Result<ClassifyResponse, ClassifierError> {
        let response = self
            .http
            .post(format!("{}/classify", self.base_url))
            .json(&serde_json::json!({ "code": code, "family": family }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status().as_u16()));
        }

        response.json().await.map_err(transport_error)
    }
}

impl Classifier for HttpClassifier {
    fn health(&self) -> bool {
        self.runtime.block_on(async {
            match self
                .http
                .get(format!("{}/health", self.base_url))
                .timeout(HEALTH_TIMEOUT)
                .send()
                .await
            {
                Ok(response) => response.status().is_success(),
                Err(_) => false,
            }
        })
    }

    fn analyze(&self, code: &str) -> Result<Classification, ClassifierError> {
        self.runtime.block_on(async {
            let family = self.triage(code).await?;
            tracing::debug!(%family, "triage verdict");

            if family == "safe" {
                return Ok(Classification::Safe);
            }

            let raw = self.classify_family(code, &family).await?;
            let cwe = raw.cwe.unwrap_or_default();
            let (cwe_name, severity) = cwe::lookup(&cwe);

            Ok(Classification::Vulnerable {
                family,
                cwe,
                cwe_name: cwe_name.to_string(),
                severity,
                confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            })
        })
    }
}

fn transport_error(e: reqwest::Error) -> ClassifierError {
    if e.is_timeout() {
        ClassifierError::Timeout
    } else {
        ClassifierError::Network(e)
    }
}
