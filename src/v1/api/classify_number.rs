#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{param::Query, payload::Json, ApiResponse, Object, OpenApi};
use log::error;

use crate::utils::classify::{self, Classification};
use crate::utils::parse::ValidationError;
use crate::utils::web_utils::{self, RequestDebug};

use crate::RUNTIME_CTX;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct ClassifyNumberApi;

#[derive(Object)]
struct ReqClassifyNumber
{
    number: String,
}

#[derive(Object, Debug)]
pub struct RespClassifyNumber
{
    status: String,
    message: String,
    number: f64,
    is_prime: bool,
    is_perfect: bool,
    properties: Vec<String>,
    digit_sum: Option<u64>,
    fun_fact: String,
}

#[derive(Object, Debug)]
pub struct RespClassifyError
{
    status: String,
    message: String,
    /// The raw query text echoed back to the caller.
    number: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqClassifyNumber {
    type Req = ReqClassifyNumber;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request query:");
        s.push_str("\n    number: ");
        s.push_str(&self.number);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum NumclassResponse {
    #[oai(status = 200)]
    Http200(Json<RespClassifyNumber>),
    #[oai(status = 400)]
    Http400(Json<RespClassifyError>),
}

fn make_http_200(resp: RespClassifyNumber) -> NumclassResponse {
    NumclassResponse::Http200(Json(resp))
}
fn make_http_400(e: ValidationError) -> NumclassResponse {
    NumclassResponse::Http400(Json(RespClassifyError {
        status: "error".to_string(),
        message: e.to_string(),
        number: e.raw_text,
    }))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl ClassifyNumberApi {
    #[oai(path = "/classify-number", method = "get")]
    async fn classify_number_api(&self, http_req: &Request, number: Query<String>) -> NumclassResponse {
        // Package the request parameters.
        let req = ReqClassifyNumber { number: number.0 };

        // -------------------- Process Request ----------------------
        RespClassifyNumber::process(http_req, &req).await
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespClassifyNumber {
    /// Create a new response from a classification.
    fn new(c: Classification) -> Self {
        Self {
            status: "success".to_string(),
            message: "Number classified.".to_string(),
            number: c.number,
            is_prime: c.is_prime,
            is_perfect: c.is_perfect,
            properties: c.properties,
            digit_sum: c.digit_sum,
            fun_fact: c.fun_fact,
        }
    }

    /// Process the request.  The only failure this endpoint can surface is
    /// an unparseable number; a degraded trivia lookup still returns 200.
    async fn process(http_req: &Request, req: &ReqClassifyNumber) -> NumclassResponse {
        // Conditional logging depending on log level.
        web_utils::debug_request(http_req, req);

        match classify::classify(&req.number, &RUNTIME_CTX.facts).await {
            Ok(c) => make_http_200(Self::new(c)),
            Err(e) => {
                error!("{}", e);
                make_http_400(e)
            }
        }
    }
}
