#![forbid(unsafe_code)]

use anyhow::Result;
use log::debug;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::utils::parse::NumericInput;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Fixed fallback strings.  The classifier treats all three as valid fun fact
// values, never as errors.
pub const FALLBACK_NOT_AVAILABLE: &str = "No fun fact available.";
pub const FALLBACK_TIMED_OUT: &str = "Fun fact request timed out.";
pub const FALLBACK_FETCH_ERROR: &str = "Error fetching fun fact.";

// ***************************************************************************
//                               Fact Types
// ***************************************************************************
// ---------------------------------------------------------------------------
// FactError:
// ---------------------------------------------------------------------------
/// The three ways a trivia lookup can degrade.  None of them escape past
/// fun_fact(), which maps each to its fixed fallback string.
#[derive(Error, Debug)]
pub enum FactError {
    /// Non-success status or a payload without a usable text field.
    #[error("The trivia service returned no usable fact.")]
    NotAvailable,

    /// The request exceeded the configured timeout.
    #[error("The trivia service did not answer in time.")]
    TimedOut,

    /// Everything else: connection, transport, or protocol failure.
    #[error("Transport failure contacting the trivia service: {}", .0)]
    Transport(#[source] reqwest::Error),
}

// The trivia API's math payload; only the text field matters here.
#[derive(Debug, Deserialize)]
struct FactPayload {
    text: Option<String>,
}

// ---------------------------------------------------------------------------
// FactClient:
// ---------------------------------------------------------------------------
/// Outbound client for the trivia fact service.  Built once at startup and
/// shared across requests; reqwest handles connection reuse internally.
#[derive(Debug, Clone)]
pub struct FactClient {
    client: reqwest::Client,
    base_url: String,
}

impl FactClient {
    /** Create a client whose requests are bounded by the given timeout.
     * The base url is the trivia host, e.g. "http://numbersapi.com".
     */
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // fun_fact:
    // -----------------------------------------------------------------------
    /** Fetch a trivia fact for the number, degrading every failure to one of
     * the fixed fallback strings.  This is the only entry point the
     * classifier uses; it cannot fail.
     */
    pub async fn fun_fact(&self, number: &NumericInput) -> String {
        match self.fetch(number).await {
            Ok(text) => text,
            Err(e) => {
                debug!("Fun fact lookup degraded for '{}': {}", number.raw_text, e);
                match e {
                    FactError::NotAvailable => FALLBACK_NOT_AVAILABLE.to_string(),
                    FactError::TimedOut => FALLBACK_TIMED_OUT.to_string(),
                    FactError::Transport(_) => FALLBACK_FETCH_ERROR.to_string(),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // fetch:
    // -----------------------------------------------------------------------
    /** Single attempt against GET <base_url>/<number>/math?json.  No retries;
     * the fact is decorative and a miss costs nothing.
     */
    pub async fn fetch(&self, number: &NumericInput) -> Result<String, FactError> {
        let url = format!("{}/{}/math?json", self.base_url, url_segment(number));
        debug!("Fetching fun fact from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            return Err(FactError::NotAvailable);
        }

        let payload: FactPayload = response.json().await.map_err(classify_reqwest_error)?;
        payload.text.ok_or(FactError::NotAvailable)
    }
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// url_segment:
// ---------------------------------------------------------------------------
/** The trivia API expects integers without a fractional part ("/371/math"),
 * so integral values are rendered through their i64 form.
 */
fn url_segment(number: &NumericInput) -> String {
    match number.as_i64() {
        Some(n) => n.to_string(),
        None => number.value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// classify_reqwest_error:
// ---------------------------------------------------------------------------
fn classify_reqwest_error(e: reqwest::Error) -> FactError {
    if e.is_timeout() {
        FactError::TimedOut
    } else if e.is_decode() {
        // Malformed payloads degrade the same way as an empty answer.
        FactError::NotAvailable
    } else {
        FactError::Transport(e)
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse;
    use httpmock::prelude::*;

    fn input(raw: &str) -> NumericInput {
        parse::parse(raw).unwrap()
    }

    fn client_for(server: &MockServer) -> FactClient {
        FactClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn returns_fact_text_on_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/371/math");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "text": "371 is a narcissistic number.",
                    "number": 371,
                    "found": true,
                    "type": "math"
                }));
        });

        let fact = client_for(&server).fun_fact(&input("371")).await;
        mock.assert();
        assert_eq!(fact, "371 is a narcissistic number.");
    }

    #[tokio::test]
    async fn non_integral_numbers_keep_their_fraction_in_the_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/3.5/math");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"text": "3.5 is unremarkable."}));
        });

        let fact = client_for(&server).fun_fact(&input("3.5")).await;
        mock.assert();
        assert_eq!(fact, "3.5 is unremarkable.");
    }

    #[tokio::test]
    async fn non_success_status_degrades_to_not_available() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/6/math");
            then.status(404);
        });

        let fact = client_for(&server).fun_fact(&input("6")).await;
        assert_eq!(fact, FALLBACK_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn payload_without_text_degrades_to_not_available() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/6/math");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"found": false}));
        });

        let fact = client_for(&server).fun_fact(&input("6")).await;
        assert_eq!(fact, FALLBACK_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn malformed_payload_degrades_to_not_available() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/6/math");
            then.status(200)
                .header("Content-Type", "application/json")
                .body("this is not json");
        });

        let fact = client_for(&server).fun_fact(&input("6")).await;
        assert_eq!(fact, FALLBACK_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn timeout_degrades_to_timed_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/6/math");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"text": "too late"}))
                .delay(Duration::from_millis(500));
        });

        let client = FactClient::new(&server.base_url(), Duration::from_millis(50)).unwrap();
        let fact = client.fun_fact(&input("6")).await;
        assert_eq!(fact, FALLBACK_TIMED_OUT);
    }

    #[tokio::test]
    async fn unreachable_host_degrades_to_fetch_error() {
        // Nothing listens here; the connection is refused immediately.
        let client =
            FactClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let fact = client.fun_fact(&input("6")).await;
        assert_eq!(fact, FALLBACK_FETCH_ERROR);
    }
}
