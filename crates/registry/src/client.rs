use crate::{CompanyLookup, HttpResponse, HttpTransport, LookupError, LookupRecord};
use docfill_types::Cnpj;
use std::time::Duration;

/// Public registry endpoint; the normalised CNPJ is appended.
pub const DEFAULT_BASE_URL: &str = "https://www.receitaws.com.br/v1/cnpj/";

/// HTTP statuses worth retrying.
const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry budget for registry requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// The wait after attempt `n` (1-based) is `backoff * (n + 1)`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * (attempt + 1)
    }
}

/// Registry client with a retry budget.
#[derive(Debug, Clone)]
pub struct RegistryClient<T> {
    base_url: String,
    transport: T,
    retry: RetryPolicy,
}

impl<T: HttpTransport> RegistryClient<T> {
    pub fn new(base_url: impl Into<String>, transport: T, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            retry,
        }
    }

    fn url_for(&self, cnpj: &Cnpj) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, cnpj)
        } else {
            format!("{}/{}", self.base_url, cnpj)
        }
    }
}

enum Attempt {
    Done(LookupRecord),
    Retry(String),
}

fn interpret(response: HttpResponse) -> Result<Attempt, LookupError> {
    if response.status != 200 {
        if TRANSIENT_STATUSES.contains(&response.status) {
            return Ok(Attempt::Retry(format!("HTTP status {}", response.status)));
        }
        return Err(LookupError::Status(response.status));
    }

    let value: serde_json::Value = serde_json::from_str(&response.body)
        .map_err(|e| LookupError::MalformedResponse(e.to_string()))?;
    let serde_json::Value::Object(record) = value else {
        return Err(LookupError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    if record.get("status").and_then(|s| s.as_str()) == Some("ERROR") {
        let message = record
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message")
            .to_string();
        return Err(LookupError::Provider(message));
    }

    Ok(Attempt::Done(record))
}

impl<T: HttpTransport> CompanyLookup for RegistryClient<T> {
    fn lookup(&self, cnpj: &Cnpj) -> Result<LookupRecord, LookupError> {
        let url = self.url_for(cnpj);
        let mut last = String::from("no attempt made");

        for attempt in 1..=self.retry.max_attempts {
            tracing::info!("registry lookup for {} (attempt {})", cnpj, attempt);

            let outcome = match self.transport.get(&url) {
                Ok(response) => interpret(response)?,
                Err(e) => Attempt::Retry(e),
            };

            match outcome {
                Attempt::Done(record) => return Ok(record),
                Attempt::Retry(reason) => {
                    last = reason;
                    if attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_after(attempt);
                        tracing::warn!(
                            "registry lookup attempt {} failed ({}), retrying in {:?}",
                            attempt,
                            last,
                            delay
                        );
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        Err(LookupError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last,
        })
    }
}
