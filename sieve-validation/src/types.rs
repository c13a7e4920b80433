// Type rules: check a value's type and convert it to the canonical one

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sieve_core::{Context, Validator, Value};

/// Value must be a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringRule;

impl Validator for StringRule {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        matches!(ctx.value, Value::String(_))
    }

    fn name(&self) -> &'static str {
        "string"
    }
}

/// Value must be an integer. Integral floats and numeric strings are
/// converted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl Validator for Integer {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        let converted = match &ctx.value {
            Value::Int(_) => return true,
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => *f as i64,
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => n,
                Err(_) => return false,
            },
            _ => return false,
        };
        ctx.value = Value::Int(converted);
        true
    }

    fn name(&self) -> &'static str {
        "integer"
    }

    fn is_type_converting(&self) -> bool {
        true
    }
}

/// Value must be a number. Numeric strings are converted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Numeric;

impl Validator for Numeric {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        let Value::String(s) = &ctx.value else {
            return ctx.value.is_number();
        };
        let s = s.trim();
        let converted = match s.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => match s.parse::<f64>() {
                Ok(f) if f.is_finite() => Value::Float(f),
                _ => return false,
            },
        };
        ctx.value = converted;
        true
    }

    fn name(&self) -> &'static str {
        "numeric"
    }

    fn is_type_converting(&self) -> bool {
        true
    }
}

/// Value must be a boolean. Form-style spellings (`"on"`, `"1"`, ...) and
/// the integers 0 and 1 are converted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

impl Validator for Boolean {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        let converted = match &ctx.value {
            Value::Bool(_) => return true,
            Value::Int(1) => true,
            Value::Int(0) => false,
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "1" | "on" | "true" | "yes" => true,
                "0" | "off" | "false" | "no" => false,
                _ => return false,
            },
            _ => return false,
        };
        ctx.value = Value::Bool(converted);
        true
    }

    fn name(&self) -> &'static str {
        "bool"
    }

    fn is_type_converting(&self) -> bool {
        true
    }
}

/// Value must be a date. Strings are parsed as RFC 3339, `YYYY-MM-DD`, or
/// with a custom `chrono` format, and converted to a UTC date-time.
#[derive(Debug, Clone, Default)]
pub struct Date {
    format: Option<String>,
}

impl Date {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse strings with a `chrono` format such as `%d/%m/%Y`.
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
        }
    }
}

impl Validator for Date {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        let parsed = match &ctx.value {
            Value::Date(_) => return true,
            Value::String(s) => parse_date(s, self.format.as_deref()),
            _ => None,
        };
        match parsed {
            Some(date) => {
                ctx.value = Value::Date(date);
                true
            }
            None => false,
        }
    }

    fn name(&self) -> &'static str {
        "date"
    }

    fn is_type_converting(&self) -> bool {
        true
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        self.format
            .iter()
            .map(|format| (":format", format.clone()))
            .collect()
    }
}

/// Parse a date string. Without a format, RFC 3339 and `YYYY-MM-DD` are
/// accepted; dates without a time are taken at midnight UTC.
pub fn parse_date(input: &str, format: Option<&str>) -> Option<DateTime<Utc>> {
    let input = input.trim();
    match format {
        Some(format) => NaiveDateTime::parse_from_str(input, format)
            .map(|dt| dt.and_utc())
            .ok()
            .or_else(|| midnight(NaiveDate::parse_from_str(input, format).ok()?)),
        None => DateTime::parse_from_rfc3339(input)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| midnight(NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?)),
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// Date held by a value: a converted date or a parseable string.
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(*date),
        Value::String(s) => parse_date(s, None),
        _ => None,
    }
}
