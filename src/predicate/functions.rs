//! Evaluators behind the value function registry.

use crate::dsl::ValueFunction;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Value of a nullary function.
pub(crate) fn constant(func: ValueFunction) -> Option<f64> {
    match func {
        ValueFunction::Pi => Some(std::f64::consts::PI),
        ValueFunction::E => Some(std::f64::consts::E),
        _ => None,
    }
}

pub(crate) fn unary(func: ValueFunction) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match func {
        ValueFunction::Abs => f64::abs,
        ValueFunction::Acos => f64::acos,
        ValueFunction::Asin => f64::asin,
        ValueFunction::Atan => f64::atan,
        ValueFunction::Ceil => f64::ceil,
        ValueFunction::Cos => f64::cos,
        ValueFunction::Degrees => f64::to_degrees,
        ValueFunction::Exp => f64::exp,
        ValueFunction::Floor => f64::floor,
        ValueFunction::Ln => f64::ln,
        ValueFunction::Log => f64::log10,
        ValueFunction::Radians => f64::to_radians,
        ValueFunction::Round => f64::round,
        ValueFunction::Sign => sign,
        ValueFunction::Sin => f64::sin,
        ValueFunction::Sqrt => f64::sqrt,
        ValueFunction::Tan => f64::tan,
        ValueFunction::Trunc => f64::trunc,
        _ => return None,
    };
    Some(f)
}

pub(crate) fn binary(func: ValueFunction) -> Option<fn(f64, f64) -> f64> {
    let f: fn(f64, f64) -> f64 = match func {
        ValueFunction::Atan2 => f64::atan2,
        ValueFunction::Pow => f64::powf,
        _ => return None,
    };
    Some(f)
}

// f64::signum maps 0.0 to 1.0
fn sign(n: f64) -> f64 {
    if n == 0.0 { 0.0 } else { n.signum() }
}

/// Parse a date or timestamp into nanoseconds since the Unix epoch.
///
/// Accepts RFC 3339 (`2019-01-01T10:00:00+02:00`), a timestamp without
/// offset (`2019-01-01T10:00:00`, taken as UTC) and a plain date
/// (`2019-01-01`, midnight UTC).
pub fn parse_date(text: &str) -> Option<i64> {
    let text = text.trim();
    let instant = if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        dt
    } else if let Ok(dt) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        dt.assume_utc()
    } else {
        Date::parse(text, format_description!("[year]-[month]-[day]"))
            .ok()?
            .midnight()
            .assume_utc()
    };
    i64::try_from(instant.unix_timestamp_nanos()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_function_has_an_evaluator() {
        for func in ValueFunction::ALL {
            let found = match func.arity() {
                0 => constant(func).is_some(),
                1 => unary(func).is_some() || func == ValueFunction::Date,
                _ => binary(func).is_some(),
            };
            assert!(found, "{}", func.name());
        }
    }

    #[test]
    fn sign_of_zero() {
        let sign = unary(ValueFunction::Sign).unwrap();
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(7.5), 1.0);
    }

    #[test]
    fn log_is_base_ten() {
        let log = unary(ValueFunction::Log).unwrap();
        assert_eq!(log(100.0), 2.0);
        let ln = unary(ValueFunction::Ln).unwrap();
        assert_eq!(ln(1.0), 0.0);
    }

    #[test]
    fn ceil_of_pi() {
        let ceil = unary(ValueFunction::Ceil).unwrap();
        assert_eq!(ceil(constant(ValueFunction::Pi).unwrap()), 4.0);
    }

    #[test]
    fn date_formats() {
        let day = parse_date("2019-01-01").unwrap();
        assert_eq!(day, 1_546_300_800_000_000_000);
        assert_eq!(parse_date("2019-01-01T00:00:00"), Some(day));
        assert_eq!(parse_date("2019-01-01T00:00:00Z"), Some(day));
        assert_eq!(parse_date("2019-01-01T02:00:00+02:00"), Some(day));
        assert_eq!(parse_date("2019-01-01T00:00:01Z"), Some(day + 1_000_000_000));
    }

    #[test]
    fn bad_dates() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2019-13-01"), None);
        assert_eq!(parse_date(""), None);
    }
}
