use serde::Serialize;

use crate::error::DomainError;

pub mod patterns;
pub mod rules_application;
pub mod rules_enrollment;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

// The structure of a failure
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ValidationError {
    pub code: String,         // e.g., "APP-S1"
    pub severity: Severity,
    pub message: String,      // shown to the user as-is
    pub field: Option<String>, // which input failed?
}

impl ValidationError {
    pub fn error(code: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: message.into(),
            field: Some(field.to_string()),
        }
    }
}

// The contract every rule must fulfill.
// `attachments` names the file fields staged with this submission that are
// not yet reflected in `fields`.
pub trait ValidationRule<F>: Send + Sync {
    fn rule_id(&self) -> &str;
    fn step(&self) -> u8;
    fn check(&self, fields: &F, attachments: &[String]) -> Vec<ValidationError>;
}

// The Engine that holds the registry of all rules
pub struct ValidationEngine<F> {
    rules: Vec<Box<dyn ValidationRule<F>>>,
}

impl<F> Default for ValidationEngine<F> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<F> ValidationEngine<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule<R: ValidationRule<F> + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn has_rules_for(&self, step: u8) -> bool {
        self.rules.iter().any(|rule| rule.step() == step)
    }

    /// Runs the rules registered for a single step.
    pub fn run_step(&self, step: u8, fields: &F, attachments: &[String]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.step() == step) {
            errors.append(&mut rule.check(fields, attachments));
        }
        errors
    }

    /// Runs every rule, in registration order.
    pub fn run_all(&self, fields: &F, attachments: &[String]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for rule in &self.rules {
            errors.append(&mut rule.check(fields, attachments));
        }
        errors
    }
}

/// Turns blocking failures into a domain error; warnings pass.
pub fn ensure_valid(errors: Vec<ValidationError>) -> Result<(), DomainError> {
    let messages: Vec<String> = errors
        .into_iter()
        .filter(|e| e.severity == Severity::Error)
        .map(|e| e.message)
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(messages))
    }
}

/// Trimmed text, `None` when blank.
pub(crate) fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    impl ValidationRule<String> for AlwaysFails {
        fn rule_id(&self) -> &str {
            "TEST-1"
        }
        fn step(&self) -> u8 {
            2
        }
        fn check(&self, _fields: &String, _attachments: &[String]) -> Vec<ValidationError> {
            vec![ValidationError::error(self.rule_id(), "x", "broken")]
        }
    }

    #[test]
    fn engine_filters_by_step() {
        let engine = ValidationEngine::new().add_rule(AlwaysFails);
        assert!(engine.run_step(1, &String::new(), &[]).is_empty());
        assert_eq!(engine.run_step(2, &String::new(), &[]).len(), 1);
        assert_eq!(engine.run_all(&String::new(), &[]).len(), 1);
        assert!(!engine.has_rules_for(1));
    }

    #[test]
    fn warnings_do_not_block() {
        let mut warning = ValidationError::error("W", "x", "heads up");
        warning.severity = Severity::Warning;
        assert!(ensure_valid(vec![warning]).is_ok());
        assert_eq!(
            ensure_valid(vec![ValidationError::error("E", "x", "broken")]),
            Err(DomainError::Validation(vec!["broken".to_string()]))
        );
    }
}
