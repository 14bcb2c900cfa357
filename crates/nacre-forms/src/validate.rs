#![forbid(unsafe_code)]

//! Whole-form and single-field validation.
//!
//! Validation results are data, never errors. Each pass recomputes from
//! scratch; nothing is cached.

use ahash::AHashMap;

use nacre_dom::{Document, NodeId};

use crate::rules::FieldRule;

/// Raw field values gathered from a form's controls at submit time. Values
/// are stored untrimmed; validation trims before checking.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: AHashMap<String, String>,
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `name → value` from every named control under `form`.
    #[must_use]
    pub fn collect(doc: &Document, form: NodeId) -> Self {
        let mut values = AHashMap::new();
        for control in doc.controls(form) {
            if let Some(name) = doc.attr(control, "name") {
                values.insert(name, doc.value(control));
            }
        }
        Self { values }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn get_or_empty(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One reported violation. At most one per field per pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Result of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<FieldError>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Message reported for `field`, if any.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Human label for the stock field names; anything else passes through.
#[must_use]
pub fn field_label(field: &str) -> &str {
    match field {
        "name" => "Name",
        "email" => "Email",
        "subject" => "Subject",
        "message" => "Message",
        other => other,
    }
}

/// Validate every rule against the gathered data, in rule declaration order.
///
/// A rule whose field has no corresponding control (no entry in `data`) is
/// skipped entirely — absent controls are not an error.
#[must_use]
pub fn validate(rules: &[FieldRule], data: &FormData) -> ValidationResult {
    let mut errors = Vec::new();
    for rule in rules {
        let Some(raw) = data.get(&rule.field) else {
            continue;
        };
        if let Some(message) = validate_value(rule, raw) {
            errors.push(FieldError {
                field: rule.field.clone(),
                message,
            });
        }
    }
    ValidationResult { errors }
}

/// Check one value against one rule. Returns the first violation's message.
///
/// Priority order: required, min length, max length, pattern. An empty
/// optional value passes unconditionally. The required violation always uses
/// the generated "<Label> is required" text; the others use the rule's
/// message with generated fallbacks.
#[must_use]
pub fn validate_value(rule: &FieldRule, raw: &str) -> Option<String> {
    let value = raw.trim();
    let label = field_label(&rule.field);

    if value.is_empty() {
        return rule.required.then(|| format!("{label} is required"));
    }

    let length = value.chars().count();
    if let Some(min) = rule.min_length
        && length < min
    {
        return Some(message_or(
            rule,
            format!("{label} must be at least {min} characters"),
        ));
    }
    if let Some(max) = rule.max_length
        && length > max
    {
        return Some(message_or(
            rule,
            format!("{label} must be no more than {max} characters"),
        ));
    }
    if let Some(pattern) = &rule.pattern
        && !pattern.is_match(value)
    {
        return Some(message_or(rule, format!("{label} format is invalid")));
    }
    None
}

fn message_or(rule: &FieldRule, fallback: String) -> String {
    rule.message.clone().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{DEFAULT_CONTACT_RECIPIENT, contact_descriptor};
    use proptest::prelude::*;

    fn contact_data(name: &str, email: &str, subject: &str, message: &str) -> FormData {
        let mut data = FormData::new();
        data.insert("name", name);
        data.insert("email", email);
        data.insert("subject", subject);
        data.insert("message", message);
        data
    }

    fn valid_data() -> FormData {
        contact_data(
            "Jo",
            "jo@x.com",
            "Hello there",
            "This is a sufficiently long message.",
        )
    }

    #[test]
    fn all_rules_satisfied_yields_valid_empty() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let result = validate(&descriptor.rules, &valid_data());
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn single_violation_reports_single_error_with_rule_message() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let mut data = valid_data();
        data.insert("email", "not-an-email");

        let result = validate(&descriptor.rules, &data);
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.error_for("email"),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn required_short_circuits_length_and_pattern() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let mut data = valid_data();
        data.insert("name", "   ");

        let result = validate(&descriptor.rules, &data);
        assert_eq!(result.error_for("name"), Some("Name is required"));
        assert_eq!(result.errors().len(), 1, "no second error for name");
    }

    #[test]
    fn empty_optional_field_passes() {
        let rule = FieldRule::new("nickname").min_length(3);
        assert_eq!(validate_value(&rule, ""), None);
        assert_eq!(validate_value(&rule, "  "), None, "whitespace trims to empty");
    }

    #[test]
    fn min_length_beats_pattern() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let rule = descriptor.rule_for("name").unwrap();
        // "7" violates both the min length and the letters-only pattern;
        // only the first check in priority order reports.
        let message = validate_value(rule, "7").unwrap();
        assert_eq!(
            message,
            "Name must be 2-50 characters and contain only letters and spaces"
        );
    }

    #[test]
    fn generated_fallbacks_without_rule_message() {
        let rule = FieldRule::new("bio").min_length(5).max_length(8);
        assert_eq!(
            validate_value(&rule, "abc"),
            Some("bio must be at least 5 characters".to_owned())
        );
        assert_eq!(
            validate_value(&rule, "abcdefghi"),
            Some("bio must be no more than 8 characters".to_owned())
        );
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let rule = FieldRule::new("subject").min_length(5);
        assert_eq!(validate_value(&rule, "héllo"), None);
    }

    #[test]
    fn values_are_trimmed_before_checks() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let rule = descriptor.rule_for("subject").unwrap();
        assert_eq!(validate_value(rule, "  Hello there  "), None);
    }

    #[test]
    fn absent_control_is_skipped() {
        let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
        let mut data = FormData::new();
        data.insert("email", "jo@x.com");

        // Only the email control exists; name/subject/message rules skip.
        let result = validate(&descriptor.rules, &data);
        assert!(result.is_valid());
    }

    #[test]
    fn collect_reads_named_controls() {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.append_child(doc.root(), form);
        let email = doc.create_element("input");
        doc.set_attr(email, "name", "email");
        doc.set_value(email, "jo@x.com");
        doc.append_child(form, email);
        let anonymous = doc.create_element("input");
        doc.append_child(form, anonymous);

        let data = FormData::collect(&doc, form);
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("email"), Some("jo@x.com"));
    }

    proptest! {
        #[test]
        fn at_most_one_error_per_field(value in ".{0,40}") {
            let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
            let mut data = valid_data();
            data.insert("name", value.as_str());

            let result = validate(&descriptor.rules, &data);
            let for_name = result
                .errors()
                .iter()
                .filter(|e| e.field == "name")
                .count();
            prop_assert!(for_name <= 1);
        }

        #[test]
        fn required_error_excludes_other_errors(field in "(name|email|subject|message)") {
            let descriptor = contact_descriptor(DEFAULT_CONTACT_RECIPIENT);
            let mut data = valid_data();
            data.insert(field.as_str(), "");

            let result = validate(&descriptor.rules, &data);
            let message = result.error_for(&field).unwrap();
            prop_assert!(message.ends_with("is required"));
            prop_assert_eq!(result.errors().len(), 1);
        }
    }
}
