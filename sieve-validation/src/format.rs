// Format rules for string values

use once_cell::sync::Lazy;
use regex::Regex;
use sieve_core::{Context, Validator, Value};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{M}]+$").unwrap());

static ALPHA_NUM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}\p{N}]+$").unwrap());

fn string_matches(value: &Value, regex: &Regex) -> bool {
    value.as_str().is_some_and(|s| regex.is_match(s))
}

/// Declares a validator checking a string against one of the static
/// patterns above.
macro_rules! pattern_rule {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $regex:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl Validator for $ty {
            fn validate(&self, ctx: &mut Context<'_>) -> bool {
                string_matches(&ctx.value, &$regex)
            }

            fn name(&self) -> &'static str {
                $name
            }
        }
    };
}

pattern_rule!(
    /// String shaped like an email address.
    Email,
    "email",
    EMAIL_REGEX
);
pattern_rule!(
    /// `http` or `https` URL.
    Url,
    "url",
    URL_REGEX
);
pattern_rule!(
    /// UUID in its hyphenated form.
    Uuid,
    "uuid",
    UUID_REGEX
);
pattern_rule!(
    /// Letters only.
    Alpha,
    "alpha",
    ALPHA_REGEX
);
pattern_rule!(
    /// Letters and digits only.
    AlphaNum,
    "alpha_num",
    ALPHA_NUM_REGEX
);

/// String matching a caller-supplied pattern.
#[derive(Debug, Clone)]
pub struct Matches(Regex);

impl Matches {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self(Regex::new(pattern)?))
    }
}

impl Validator for Matches {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        string_matches(&ctx.value, &self.0)
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// Scalar whose text form is one of a fixed list.
#[derive(Debug, Clone)]
pub struct In {
    values: Vec<String>,
}

impl In {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for In {
    fn validate(&self, ctx: &mut Context<'_>) -> bool {
        match &ctx.value {
            Value::String(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_) => {
                let text = ctx.value.to_string();
                self.values.iter().any(|v| *v == text)
            }
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "in"
    }

    fn message_placeholders(&self, _ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        vec![(":values", self.values.join(", "))]
    }
}
