//! Cron expression parsing
//!
//! Accepts five, six or seven whitespace separated fields:
//! - 5 fields: `min hour dom month dow`, seconds default to 0
//! - 6 fields: `sec min hour dom month dow`
//! - 7 fields: `sec min hour dom month dow year`; when that does not parse,
//!   the trailing six fields are used instead

use cron::Schedule;
use std::str::FromStr;

use super::CronError;

/// Parses a cron expression into a schedule
pub fn parse(expression: &str) -> Result<Schedule, CronError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();

    let invalid = |reason: String| CronError::InvalidExpression {
        expression: expression.to_string(),
        reason,
    };

    match fields.len() {
        5 => Schedule::from_str(&format!("0 {}", fields.join(" "))).map_err(|e| invalid(e.to_string())),
        6 => Schedule::from_str(&fields.join(" ")).map_err(|e| invalid(e.to_string())),
        7 => Schedule::from_str(&fields.join(" "))
            .or_else(|_| Schedule::from_str(&fields[1..].join(" ")))
            .map_err(|e| invalid(e.to_string())),
        n => Err(invalid(format!("expected 5 to 7 fields, found {}", n))),
    }
}
