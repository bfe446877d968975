#![forbid(unsafe_code)]

use thiserror::Error;

// ***************************************************************************
//                              Parse Types
// ***************************************************************************
// ---------------------------------------------------------------------------
// ValidationError:
// ---------------------------------------------------------------------------
/// The only error this layer produces: the query text could not be read as
/// a real number.  The offending text is carried so the http layer can echo
/// it back in the 400 response body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to parse '{}' as a number.", .raw_text)]
pub struct ValidationError {
    pub raw_text: String,
}

// ---------------------------------------------------------------------------
// NumericInput:
// ---------------------------------------------------------------------------
/// A validated numeric query value.  Constructed once per request by parse()
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericInput {
    pub raw_text: String,
    pub value: f64,
    pub is_integral: bool,
}

impl NumericInput {
    /** Return the value as an i64 when it is integral and representable.
     * Integral values outside the i64 range classify the same way as
     * non-integral ones, so callers branch on this method rather than on
     * is_integral alone.
     */
    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_integral {
            return None;
        }
        // i64::MAX itself is not exactly representable as f64; the strict
        // upper bound 2^63 is.
        if self.value >= -(2f64.powi(63)) && self.value < 2f64.powi(63) {
            Some(self.value as i64)
        } else {
            None
        }
    }
}

// ***************************************************************************
//                              Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// parse:
// ---------------------------------------------------------------------------
/** Interpret the raw query text as a signed real number.  Accepts an optional
 * sign and decimal point ("371", "-4", "3.5").  Inputs that parse but are not
 * finite ("inf", "NaN") are rejected along with everything else that is not a
 * number.  A value with zero fractional part is flagged integral, so "4.0"
 * classifies exactly like "4".
 */
pub fn parse(raw_text: &str) -> Result<NumericInput, ValidationError> {
    let value: f64 = raw_text
        .trim()
        .parse()
        .map_err(|_| ValidationError { raw_text: raw_text.to_string() })?;

    if !value.is_finite() {
        return Err(ValidationError { raw_text: raw_text.to_string() });
    }

    Ok(NumericInput {
        raw_text: raw_text.to_string(),
        value,
        is_integral: value.fract() == 0.0,
    })
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_input() {
        let n = parse("371").unwrap();
        assert_eq!(n.value, 371.0);
        assert!(n.is_integral);
        assert_eq!(n.as_i64(), Some(371));
        assert_eq!(n.raw_text, "371");
    }

    #[test]
    fn negative_input() {
        let n = parse("-4").unwrap();
        assert!(n.is_integral);
        assert_eq!(n.as_i64(), Some(-4));
    }

    #[test]
    fn real_input() {
        let n = parse("3.5").unwrap();
        assert!(!n.is_integral);
        assert_eq!(n.as_i64(), None);
        assert_eq!(n.value, 3.5);
    }

    #[test]
    fn trailing_zero_fraction_is_integral() {
        let n = parse("4.0").unwrap();
        assert!(n.is_integral);
        assert_eq!(n.as_i64(), Some(4));
    }

    #[test]
    fn malformed_input_fails() {
        let e = parse("abc").unwrap_err();
        assert_eq!(e.raw_text, "abc");
        assert!(parse("").is_err());
        assert!(parse("12abc").is_err());
        assert!(parse("1.2.3").is_err());
    }

    #[test]
    fn non_finite_input_fails() {
        assert!(parse("inf").is_err());
        assert!(parse("-inf").is_err());
        assert!(parse("NaN").is_err());
    }

    #[test]
    fn huge_integral_value_has_no_i64() {
        let n = parse("1e300").unwrap();
        assert!(n.is_integral);
        assert_eq!(n.as_i64(), None);
    }
}
