// Size rules: the measured quantity depends on the value's category

use sieve_core::{Context, Validator, Value};

/// Size of a value: numbers measure themselves, strings their character
/// count, arrays and objects their length.
pub fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Sequence(items) => Some(items.len() as f64),
        Value::Map(map) => Some(map.len() as f64),
        _ => None,
    }
}

/// Render a bound without a trailing `.0` for whole numbers.
pub(crate) fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

/// Size at least `min`.
#[derive(Debug, Clone, Copy)]
pub struct Min(pub f64);

impl Validator for Min {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        measure(&ctx.value).is_some_and(|size| size >= self.0)
    }

    fn name(&self) -> &'static str {
        "min"
    }

    fn is_type_dependent(&self) -> bool {
        true
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![(":min", format_bound(self.0))]
    }
}

/// Size at most `max`.
#[derive(Debug, Clone, Copy)]
pub struct Max(pub f64);

impl Validator for Max {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        measure(&ctx.value).is_some_and(|size| size <= self.0)
    }

    fn name(&self) -> &'static str {
        "max"
    }

    fn is_type_dependent(&self) -> bool {
        true
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![(":max", format_bound(self.0))]
    }
}

/// Size within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct Between {
    pub min: f64,
    pub max: f64,
}

impl Between {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Validator for Between {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        measure(&ctx.value).is_some_and(|size| (self.min..=self.max).contains(&size))
    }

    fn name(&self) -> &'static str {
        "between"
    }

    fn is_type_dependent(&self) -> bool {
        true
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![
            (":min", format_bound(self.min)),
            (":max", format_bound(self.max)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_measure_by_category() {
        assert_eq!(measure(&Value::Int(4)), Some(4.0));
        assert_eq!(measure(&Value::from("héllo")), Some(5.0));
        assert_eq!(measure(&Value::from(json!([1, 2]))), Some(2.0));
        assert_eq!(measure(&Value::from(json!({ "a": 1 }))), Some(1.0));
        assert_eq!(measure(&Value::Bool(true)), None);
    }

    #[test]
    fn test_format_bound() {
        assert_eq!(format_bound(3.0), "3");
        assert_eq!(format_bound(2.5), "2.5");
    }
}
