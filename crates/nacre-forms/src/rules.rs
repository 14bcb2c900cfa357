#![forbid(unsafe_code)]

//! Field rules and form descriptors.

use regex::Regex;

use crate::submit::{Outcome, Submission};

/// Simulated network delay for stock submissions.
pub const STOCK_SUBMIT_DELAY_MS: u64 = 2000;

/// Recipient used by the stock contact descriptor. Override by building the
/// descriptor with your own address.
pub const DEFAULT_CONTACT_RECIPIENT: &str = "hello@example.com";

pub const NEWSLETTER_SUCCESS_MESSAGE: &str = "Successfully subscribed to newsletter!";
pub const CONTACT_SUCCESS_MESSAGE: &str =
    "Thank you for your message! I'll get back to you soon.";
pub const CONTACT_FAILURE_MESSAGE: &str = "Failed to send message. Please try again later.";

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const NAME_PATTERN: &str = r"^[a-zA-Z\s]+$";

/// Validation rule for one named field.
///
/// Checks run in a fixed priority order — required, min length, max length,
/// pattern — and only the first violation is reported. `message` overrides
/// the generated text for everything except the required check.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub message: Option<String>,
}

impl FieldRule {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            message: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Immutable per-form configuration: the rule set (in declaration order) and
/// the submission capability.
#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub name: String,
    pub rules: Vec<FieldRule>,
    pub submission: Submission,
}

impl FormDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, rules: Vec<FieldRule>, submission: Submission) -> Self {
        Self {
            name: name.into(),
            rules,
            submission,
        }
    }

    /// Rule for `field`, if the descriptor has one.
    #[must_use]
    pub fn rule_for(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field)
    }
}

/// Stock contact form: name/email/subject/message, submitted as a mail
/// hand-off to `recipient`.
#[must_use]
pub fn contact_descriptor(recipient: impl Into<String>) -> FormDescriptor {
    FormDescriptor::new(
        "contact",
        vec![
            FieldRule::new("name")
                .required()
                .min_length(2)
                .max_length(50)
                .pattern(Regex::new(NAME_PATTERN).expect("name pattern compiles"))
                .message("Name must be 2-50 characters and contain only letters and spaces"),
            FieldRule::new("email")
                .required()
                .pattern(Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
                .message("Please enter a valid email address"),
            FieldRule::new("subject")
                .required()
                .min_length(5)
                .max_length(100)
                .message("Subject must be 5-100 characters long"),
            FieldRule::new("message")
                .required()
                .min_length(10)
                .max_length(1000)
                .message("Message must be 10-1000 characters long"),
        ],
        Submission::MailClient {
            recipient: recipient.into(),
        },
    )
}

/// Stock newsletter form: a single email field with an always-successful
/// simulated subscription.
#[must_use]
pub fn newsletter_descriptor() -> FormDescriptor {
    FormDescriptor::new(
        "newsletter",
        vec![
            FieldRule::new("email")
                .required()
                .pattern(Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
                .message("Please enter a valid email address"),
        ],
        Submission::Simulated {
            delay_ms: STOCK_SUBMIT_DELAY_MS,
            outcome: Outcome::Always {
                message: NEWSLETTER_SUCCESS_MESSAGE.to_owned(),
            },
        },
    )
}

/// The flaky simulated outcome the stock contact form would use were it not
/// a mail hand-off: 90% success with the stock messages.
#[must_use]
pub fn flaky_contact_outcome() -> Outcome {
    Outcome::Flaky {
        success_rate: 0.9,
        success: CONTACT_SUCCESS_MESSAGE.to_owned(),
        failure: CONTACT_FAILURE_MESSAGE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_rules_in_declaration_order() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let fields: Vec<&str> = descriptor.rules.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "subject", "message"]);
    }

    #[test]
    fn rule_lookup() {
        let descriptor = newsletter_descriptor();
        assert!(descriptor.rule_for("email").is_some());
        assert!(descriptor.rule_for("name").is_none());
    }

    #[test]
    fn email_pattern_accepts_and_rejects() {
        let descriptor = newsletter_descriptor();
        let rule = descriptor.rule_for("email").unwrap();
        let pattern = rule.pattern.as_ref().unwrap();
        assert!(pattern.is_match("jo@x.com"));
        assert!(!pattern.is_match("not-an-email"));
        assert!(!pattern.is_match("a b@x.com"));
        assert!(!pattern.is_match("jo@x"));
    }

    #[test]
    fn name_pattern_letters_and_spaces_only() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let pattern = descriptor.rule_for("name").unwrap().pattern.as_ref().unwrap();
        assert!(pattern.is_match("Jo March"));
        assert!(!pattern.is_match("Jo99"));
    }

    #[test]
    fn flaky_contact_outcome_uses_stock_messages() {
        use crate::submit::resolve_outcome;
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let outcome = flaky_contact_outcome();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            let result = resolve_outcome(&outcome, &mut rng);
            let expected = if result.success {
                CONTACT_SUCCESS_MESSAGE
            } else {
                CONTACT_FAILURE_MESSAGE
            };
            assert_eq!(result.message, expected);
        }
    }
}
