// Argument parsing for declared rules ("min:3", "between:1,5", ...)

use sieve_core::{ConfigError, ConfigResult};

/// Exactly `count` arguments.
pub fn expect_count(rule: &str, args: &[String], count: usize) -> ConfigResult<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(ConfigError::arguments(
            rule,
            format!("expected {} argument(s), got {}", count, args.len()),
        ))
    }
}

/// The single argument of a rule.
pub fn single<'a>(rule: &str, args: &'a [String]) -> ConfigResult<&'a str> {
    expect_count(rule, args, 1)?;
    match args[0].as_str() {
        "" => Err(ConfigError::arguments(rule, "argument cannot be empty")),
        arg => Ok(arg),
    }
}

/// Parse a numeric argument.
pub fn number(rule: &str, arg: &str) -> ConfigResult<f64> {
    match arg.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ConfigError::arguments(
            rule,
            format!("\"{}\" is not a number", arg),
        )),
    }
}

/// At least one non-empty argument.
pub fn non_empty_list(rule: &str, args: &[String]) -> ConfigResult<Vec<String>> {
    if args.is_empty() || args.iter().all(String::is_empty) {
        return Err(ConfigError::arguments(rule, "expected at least one value"));
    }
    Ok(args.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_single() {
        assert_eq!(single("after", &owned(&["start"])).unwrap(), "start");
        assert!(single("after", &owned(&[])).is_err());
        assert!(single("after", &owned(&["a", "b"])).is_err());
        assert!(single("after", &owned(&[""])).is_err());
    }

    #[test]
    fn test_number() {
        assert_eq!(number("min", "3").unwrap(), 3.0);
        assert_eq!(number("min", "-2.5").unwrap(), -2.5);
        let err = number("min", "three").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid arguments for validator \"min\": \"three\" is not a number"
        );
        assert!(number("min", "inf").is_err());
    }

    #[test]
    fn test_non_empty_list() {
        assert_eq!(non_empty_list("in", &owned(&["a", "b"])).unwrap().len(), 2);
        assert!(non_empty_list("in", &owned(&[""])).is_err());
    }
}
