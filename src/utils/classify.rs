#![forbid(unsafe_code)]

use crate::utils::facts::FactClient;
use crate::utils::parse::{self, ValidationError};
use crate::utils::properties;

// ***************************************************************************
//                           Classification Types
// ***************************************************************************
// ---------------------------------------------------------------------------
// Classification:
// ---------------------------------------------------------------------------
/// The classification of one numeric input.  Built once per request and
/// handed straight to the response layer; never mutated.
///
/// The integral-only fields hold their inert values for non-integral inputs:
/// is_prime and is_perfect are false, digit_sum is None, and properties
/// carries no parity tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub number: f64,
    pub is_prime: bool,
    pub is_perfect: bool,
    pub properties: Vec<String>,
    pub digit_sum: Option<u64>,
    pub fun_fact: String,
}

// ***************************************************************************
//                              Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// classify:
// ---------------------------------------------------------------------------
/** Classify a raw query value.  One linear pipeline: parse, compute the
 * numeric properties when the value is a 64-bit integer, then attach the
 * trivia fact.  A parse failure propagates immediately and makes no
 * outbound call; a trivia failure never fails the request (see FactClient).
 *
 * The properties sequence is ordered: "armstrong" first when it applies,
 * then the parity tag.  Consumers see this order, so it is a contract.
 */
pub async fn classify(
    raw_text: &str,
    facts: &FactClient,
) -> Result<Classification, ValidationError> {
    let input = parse::parse(raw_text)?;

    let mut is_prime = false;
    let mut is_perfect = false;
    let mut digit_sum = None;
    let mut tags: Vec<String> = Vec::with_capacity(2);

    if let Some(n) = input.as_i64() {
        is_prime = properties::is_prime(n);
        is_perfect = properties::is_perfect(n);
        digit_sum = Some(properties::digit_sum(n));

        if properties::is_armstrong(n) {
            tags.push("armstrong".to_string());
        }
        let parity = if n % 2 == 0 { "even" } else { "odd" };
        tags.push(parity.to_string());
    }

    let fun_fact = facts.fun_fact(&input).await;

    Ok(Classification {
        number: input.value,
        is_prime,
        is_perfect,
        properties: tags,
        digit_sum,
        fun_fact,
    })
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::facts::{FALLBACK_NOT_AVAILABLE, FactClient};
    use httpmock::prelude::*;
    use std::time::Duration;

    /// A mock trivia server answering every math lookup with the same text.
    fn fact_stub(text: &str) -> (MockServer, FactClient) {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_matches(Regex::new("^/.*/math$").unwrap());
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "text": text }));
        });
        let client = FactClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn armstrong_odd_number() {
        let (_server, facts) = fact_stub("371 fact");
        let c = classify("371", &facts).await.unwrap();

        assert_eq!(c.number, 371.0);
        assert!(!c.is_prime);
        assert!(!c.is_perfect);
        assert_eq!(c.properties, vec!["armstrong", "odd"]);
        assert_eq!(c.digit_sum, Some(11));
        assert_eq!(c.fun_fact, "371 fact");
    }

    #[tokio::test]
    async fn perfect_even_number() {
        let (_server, facts) = fact_stub("6 fact");
        let c = classify("6", &facts).await.unwrap();

        assert!(c.is_perfect);
        assert!(!c.is_prime);
        assert_eq!(c.properties, vec!["even"]);
        assert_eq!(c.digit_sum, Some(6));
    }

    #[tokio::test]
    async fn prime_number() {
        let (_server, facts) = fact_stub("7 fact");
        let c = classify("7", &facts).await.unwrap();

        assert!(c.is_prime);
        assert!(!c.is_perfect);
        assert_eq!(c.properties, vec!["odd"]);
    }

    #[tokio::test]
    async fn non_integral_input_gets_no_integer_properties() {
        let (_server, facts) = fact_stub("4.5 fact");
        let c = classify("4.5", &facts).await.unwrap();

        assert_eq!(c.number, 4.5);
        assert!(!c.is_prime);
        assert!(!c.is_perfect);
        assert_eq!(c.digit_sum, None);
        assert!(c.properties.is_empty());
        assert_eq!(c.fun_fact, "4.5 fact");
    }

    #[tokio::test]
    async fn negative_number_classifies() {
        let (_server, facts) = fact_stub("-4 fact");
        let c = classify("-4", &facts).await.unwrap();

        assert!(!c.is_prime);
        assert!(!c.is_perfect);
        assert_eq!(c.digit_sum, Some(4));
        assert_eq!(c.properties, vec!["even"]);
    }

    #[tokio::test]
    async fn invalid_input_propagates_without_calling_the_fact_service() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path_matches(Regex::new(".*").unwrap());
            then.status(200);
        });
        let facts = FactClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();

        let err = classify("abc", &facts).await.unwrap_err();
        assert_eq!(err.raw_text, "abc");
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn degraded_fact_still_classifies() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_matches(Regex::new(".*").unwrap());
            then.status(500);
        });
        let facts = FactClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();

        let c = classify("28", &facts).await.unwrap();
        assert!(c.is_perfect);
        assert_eq!(c.fun_fact, FALLBACK_NOT_AVAILABLE);
    }
}
