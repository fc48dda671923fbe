//! Sensitive data redaction for traced request and response bodies

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// The replacement string used for redacted values
pub const REDACTED: &str = "[REDACTED]";

/// JSON string fields whose values are always masked.
const SECRET_FIELDS: &[&str] = &[
    "SystemSecret",
    "system_secret",
    "systemSecret",
    "Token",
    "token",
    "password",
    "secret",
    "dev_token",
];

static REDACTION_PATTERNS: LazyLock<Vec<RedactionPattern>> = LazyLock::new(|| {
    let mut patterns: Vec<RedactionPattern> = SECRET_FIELDS
        .iter()
        .map(|field| {
            RedactionPattern::new(&format!(r#"("{field}"\s*:\s*")[^"]*""#), |caps| {
                format!("{}{REDACTED}\"", &caps[1])
            })
        })
        .collect();
    // Dev token header
    patterns.push(RedactionPattern::new(
        r"(?i)(ClearBlade-DevToken:\s*)\S+",
        |caps| format!("{}{REDACTED}", &caps[1]),
    ));
    // Credentials in URLs (user:password@host)
    patterns.push(RedactionPattern::new(r"(://[^:/]+:)[^@]+(@)", |caps| {
        format!("{}{REDACTED}{}", &caps[1], &caps[2])
    }));
    patterns
});

/// A pattern for detecting and redacting sensitive data
struct RedactionPattern {
    regex: Regex,
    replacer: Box<dyn Fn(&regex::Captures) -> String + Send + Sync>,
}

impl RedactionPattern {
    fn new<F>(pattern: &str, replacer: F) -> Self
    where
        F: Fn(&regex::Captures) -> String + Send + Sync + 'static,
    {
        Self {
            regex: Regex::new(pattern).expect("Invalid redaction pattern"),
            replacer: Box::new(replacer),
        }
    }

    fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        self.regex
            .replace_all(input, |caps: &regex::Captures| (self.replacer)(caps))
    }
}

/// Redactor for sensitive data in strings
#[derive(Debug, Default, Clone, Copy)]
pub struct Redactor;

impl Redactor {
    pub fn new() -> Self {
        Self
    }

    /// Redact secrets, dev tokens and URL credentials from the input.
    pub fn redact<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut result: Cow<str> = Cow::Borrowed(input);
        for pattern in REDACTION_PATTERNS.iter() {
            let redacted = match pattern.apply(&result) {
                Cow::Owned(owned) => Some(owned),
                Cow::Borrowed(_) => None,
            };
            if let Some(owned) = redacted {
                result = Cow::Owned(owned);
            }
        }
        result
    }

    pub fn redact_string(&self, input: &str) -> String {
        self.redact(input).into_owned()
    }
}
