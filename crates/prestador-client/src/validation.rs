//! Field-level validity rules for the edit form.
//!
//! | field         | rules                                   |
//! |---------------|-----------------------------------------|
//! | `name`        | required, max 60 chars                  |
//! | `description` | required, max 1000 chars                |
//! | `phone`       | required, pattern `(DD) DDDDD-DDDD`     |
//! | `useEmail`    | none                                    |
//!
//! Length and pattern rules only fire on non-empty values; an empty field
//! reports `required` alone. The gate never blocks anything by itself:
//! [`CommitCoordinator`](crate::CommitCoordinator) asks [`is_valid`](FormValidationGate::is_valid)
//! before writing.

use std::sync::LazyLock;

use regex::Regex;
use strum::{Display, EnumString};

use crate::constants::{DESCRIPTION_MAX_LEN, NAME_MAX_LEN, PHONE_PATTERN};
use crate::form::{Field, FieldValue, FormState};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("PHONE_PATTERN is a valid regex"));

/// Rule names, as reported by [`FormValidationGate::has_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Rule {
    Required,
    MaxLength,
    Pattern,
}

/// Rules attached to one field.
#[derive(Debug, Clone)]
struct FieldRules {
    field: Field,
    required: bool,
    max_length: Option<usize>,
    pattern: Option<&'static Regex>,
}

impl FieldRules {
    fn violations(&self, value: &FieldValue) -> Vec<Rule> {
        let FieldValue::Text(text) = value else {
            return Vec::new();
        };

        if text.is_empty() {
            return if self.required { vec![Rule::Required] } else { Vec::new() };
        }

        let mut errors = Vec::new();
        if let Some(max) = self.max_length
            && text.chars().count() > max
        {
            errors.push(Rule::MaxLength);
        }
        if let Some(re) = self.pattern
            && !re.is_match(text)
        {
            errors.push(Rule::Pattern);
        }
        errors
    }
}

/// Validity rules for the service form.
#[derive(Debug, Clone)]
pub struct FormValidationGate {
    rules: Vec<FieldRules>,
}

impl Default for FormValidationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FormValidationGate {
    pub fn new() -> Self {
        Self {
            rules: vec![
                FieldRules {
                    field: Field::Name,
                    required: true,
                    max_length: Some(NAME_MAX_LEN),
                    pattern: None,
                },
                FieldRules {
                    field: Field::Description,
                    required: true,
                    max_length: Some(DESCRIPTION_MAX_LEN),
                    pattern: None,
                },
                FieldRules {
                    field: Field::Phone,
                    required: true,
                    max_length: None,
                    pattern: Some(&*PHONE_RE),
                },
            ],
        }
    }

    /// Rules `field` currently violates.
    pub fn errors(&self, form: &FormState, field: Field) -> Vec<Rule> {
        self.rules
            .iter()
            .find(|r| r.field == field)
            .map(|r| r.violations(&form.value(field)))
            .unwrap_or_default()
    }

    /// Does `field` currently violate `rule`?
    pub fn violates(&self, form: &FormState, field: Field, rule: Rule) -> bool {
        self.errors(form, field).contains(&rule)
    }

    /// String-keyed query for UI feedback. Unknown names report no error.
    pub fn has_error(&self, form: &FormState, field: &str, rule: &str) -> bool {
        match (field.parse::<Field>(), rule.parse::<Rule>()) {
            (Ok(field), Ok(rule)) => self.violates(form, field, rule),
            _ => false,
        }
    }

    pub fn is_valid(&self, form: &FormState) -> bool {
        Field::ALL.iter().all(|&f| self.errors(form, f).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> FormState {
        FormState {
            name: "Eletricista".into(),
            description: "Reparo elétrico".into(),
            phone: "(11) 98765-4321".into(),
            use_email: false,
        }
    }

    #[test]
    fn test_valid_form() {
        let gate = FormValidationGate::new();
        assert!(gate.is_valid(&valid_form()));
        for field in Field::ALL {
            assert!(gate.errors(&valid_form(), field).is_empty());
        }
    }

    #[test]
    fn test_empty_form_reports_required_only() {
        let gate = FormValidationGate::new();
        let form = FormState::default();
        assert!(!gate.is_valid(&form));
        assert_eq!(gate.errors(&form, Field::Phone), vec![Rule::Required]);
        assert!(gate.has_error(&form, "name", "required"));
        assert!(!gate.has_error(&form, "phone", "pattern"));
        assert!(!gate.has_error(&form, "useEmail", "required"));
    }

    #[test]
    fn test_max_lengths() {
        let gate = FormValidationGate::new();
        let mut form = valid_form();
        form.name = "a".repeat(NAME_MAX_LEN);
        assert!(gate.is_valid(&form));
        form.name.push('a');
        assert!(gate.has_error(&form, "name", "maxlength"));

        let mut form = valid_form();
        form.description = "é".repeat(DESCRIPTION_MAX_LEN);
        assert!(gate.is_valid(&form), "limit counts characters, not bytes");
        form.description.push('x');
        assert!(gate.violates(&form, Field::Description, Rule::MaxLength));
    }

    #[test]
    fn test_phone_pattern() {
        let gate = FormValidationGate::new();
        let mut form = valid_form();
        form.phone = "(11) 9876-4321".into();
        assert!(gate.has_error(&form, "phone", "pattern"));
        form.phone = "11987654321".into();
        assert!(gate.has_error(&form, "phone", "pattern"));
        form.phone = "(11) 98765-4321".into();
        assert!(!gate.has_error(&form, "phone", "pattern"));
    }

    #[test]
    fn test_unknown_names_report_nothing() {
        let gate = FormValidationGate::new();
        let form = FormState::default();
        assert!(!gate.has_error(&form, "nickname", "required"));
        assert!(!gate.has_error(&form, "name", "minlength"));
    }

    #[test]
    fn test_query_does_not_mutate() {
        let gate = FormValidationGate::new();
        let form = valid_form();
        let before = form.clone();
        let _ = gate.has_error(&form, "name", "required");
        assert_eq!(form, before);
    }
}
