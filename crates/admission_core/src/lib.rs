pub mod derived;
pub mod error;
pub mod models;
pub mod signature;
pub mod validation;
pub mod wizard;

use models::{ApplicationFields, EnrollmentFields, FormKind};
use validation::{rules_application, rules_enrollment, ValidationEngine};

pub use error::DomainError;

/// The full rule set for the application wizard, steps 1 through 7.
pub fn application_validator() -> ValidationEngine<ApplicationFields> {
    ValidationEngine::new()
        .add_rule(rules_application::RegistrationRule)
        .add_rule(rules_application::BasicDetailsRule)
        .add_rule(rules_application::EducationRule)
        .add_rule(rules_application::ExperienceRule)
        .add_rule(rules_application::UploadsRule)
        .add_rule(rules_application::PaymentModeRule)
        .add_rule(rules_application::DeclarationRule)
}

/// The full rule set for the enrollment wizard, steps 1 through 6.
pub fn enrollment_validator() -> ValidationEngine<EnrollmentFields> {
    ValidationEngine::new()
        .add_rule(rules_enrollment::PersonalDetailsRule)
        .add_rule(rules_enrollment::IdentityRule)
        .add_rule(rules_enrollment::EducationRule)
        .add_rule(rules_enrollment::CourseRule)
        .add_rule(rules_enrollment::PaymentRule)
        .add_rule(rules_enrollment::DeclarationRule)
}

/// Maps an uploaded form field to the object-store folder it belongs in.
/// Unknown fields land in the form's generic `other` folder.
pub fn resolve_upload_folder(kind: FormKind, field: &str) -> String {
    let leaf = match (kind, field) {
        (FormKind::Application, "photo") => "photo",
        (FormKind::Application, "signature") => "signature",
        (FormKind::Application, "marksheet10Plus2") => "marksheet10Plus2",
        (FormKind::Application, "categoryCertificate") => "categoryCertificate",
        (FormKind::Application, "disabilityCertificate") => "disabilityCertificate",
        (FormKind::Application, "experienceProofs") => "experienceProofs",
        (FormKind::Application, "otherDocument") => "otherDocument",

        (FormKind::Enrollment, "aadhaarCard") => "aadhaar",
        (FormKind::Enrollment, "photograph") => "photo",
        (FormKind::Enrollment, "signature") => "signature",
        (FormKind::Enrollment, "marksheet") => "marksheet",
        (FormKind::Enrollment, "paymentReceipt") => "payment",

        _ => "other",
    };
    format!("{}/{}", kind.upload_root(), leaf)
}
