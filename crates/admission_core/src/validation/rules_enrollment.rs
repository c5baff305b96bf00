use crate::models::EnrollmentFields;
use crate::validation::{patterns, text, ValidationError, ValidationRule};

fn min_chars(value: &Option<String>, min: usize) -> bool {
    text(value).is_some_and(|s| s.chars().count() >= min)
}

fn push_unless(
    errors: &mut Vec<ValidationError>,
    ok: bool,
    code: &str,
    field: &str,
    message: &str,
) {
    if !ok {
        errors.push(ValidationError::error(code, field, message));
    }
}

// =========================================================================
// RULE: ENR-S1
// Personal details
// =========================================================================
pub struct PersonalDetailsRule;

impl ValidationRule<EnrollmentFields> for PersonalDetailsRule {
    fn rule_id(&self) -> &str {
        "ENR-S1"
    }

    fn step(&self) -> u8 {
        1
    }

    fn check(&self, f: &EnrollmentFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut e = Vec::new();
        push_unless(&mut e, min_chars(&f.full_name, 2), id, "fullName", "Full name is required");
        push_unless(&mut e, text(&f.date_of_birth).is_some(), id, "dateOfBirth", "Date of birth is required");
        push_unless(&mut e, f.gender.is_some(), id, "gender", "Please select gender");
        push_unless(
            &mut e,
            text(&f.mobile_number).is_some_and(patterns::is_mobile),
            id,
            "mobileNumber",
            "Please enter a valid 10-digit mobile number",
        );
        push_unless(
            &mut e,
            text(&f.email).is_some_and(patterns::is_email),
            id,
            "email",
            "Please enter a valid email address",
        );
        push_unless(&mut e, min_chars(&f.parent_name, 2), id, "parentName", "Parent name is required");
        push_unless(
            &mut e,
            min_chars(&f.permanent_address, 10),
            id,
            "permanentAddress",
            "Please enter complete address",
        );
        push_unless(&mut e, min_chars(&f.city, 2), id, "city", "City is required");
        push_unless(&mut e, text(&f.state).is_some(), id, "state", "Please select state");
        push_unless(
            &mut e,
            text(&f.pin_code).is_some_and(patterns::is_pin_code),
            id,
            "pinCode",
            "Please enter a valid 6-digit PIN code",
        );
        e
    }
}

// =========================================================================
// RULE: ENR-S2
// Aadhaar is mandatory, PAN is not. Identity files are optional.
// =========================================================================
pub struct IdentityRule;

impl ValidationRule<EnrollmentFields> for IdentityRule {
    fn rule_id(&self) -> &str {
        "ENR-S2"
    }

    fn step(&self) -> u8 {
        2
    }

    fn check(&self, f: &EnrollmentFields, _attachments: &[String]) -> Vec<ValidationError> {
        let mut e = Vec::new();
        push_unless(
            &mut e,
            text(&f.aadhaar_number).is_some_and(patterns::is_aadhaar),
            self.rule_id(),
            "aadhaarNumber",
            "Please enter a valid 12-digit Aadhaar number",
        );
        e
    }
}

// =========================================================================
// RULE: ENR-S3
// =========================================================================
pub struct EducationRule;

impl ValidationRule<EnrollmentFields> for EducationRule {
    fn rule_id(&self) -> &str {
        "ENR-S3"
    }

    fn step(&self) -> u8 {
        3
    }

    fn check(&self, f: &EnrollmentFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut e = Vec::new();
        push_unless(
            &mut e,
            text(&f.highest_qualification).is_some(),
            id,
            "highestQualification",
            "Please select qualification",
        );
        push_unless(
            &mut e,
            min_chars(&f.institution_name, 2),
            id,
            "institutionName",
            "Institution name is required",
        );
        push_unless(
            &mut e,
            text(&f.year_of_passing).is_some(),
            id,
            "yearOfPassing",
            "Year of passing is required",
        );
        e
    }
}

// =========================================================================
// RULE: ENR-S4
// =========================================================================
pub struct CourseRule;

impl ValidationRule<EnrollmentFields> for CourseRule {
    fn rule_id(&self) -> &str {
        "ENR-S4"
    }

    fn step(&self) -> u8 {
        4
    }

    fn check(&self, f: &EnrollmentFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut e = Vec::new();
        push_unless(&mut e, text(&f.selected_course).is_some(), id, "selectedCourse", "Please select a course");
        push_unless(&mut e, f.learning_mode.is_some(), id, "learningMode", "Please select learning mode");
        push_unless(&mut e, text(&f.batch_time).is_some(), id, "batchTime", "Please select batch time");
        push_unless(
            &mut e,
            text(&f.hear_about_us).is_some(),
            id,
            "hearAboutUs",
            "Please tell us how you heard about us",
        );
        e
    }
}

// =========================================================================
// RULE: ENR-S5
// =========================================================================
pub struct PaymentRule;

impl ValidationRule<EnrollmentFields> for PaymentRule {
    fn rule_id(&self) -> &str {
        "ENR-S5"
    }

    fn step(&self) -> u8 {
        5
    }

    fn check(&self, f: &EnrollmentFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut e = Vec::new();
        push_unless(&mut e, text(&f.payment_mode).is_some(), id, "paymentMode", "Please select payment mode");
        push_unless(
            &mut e,
            text(&f.transaction_id).is_some(),
            id,
            "transactionId",
            "Transaction ID is required",
        );
        e
    }
}

// =========================================================================
// RULE: ENR-S6
// =========================================================================
pub struct DeclarationRule;

impl ValidationRule<EnrollmentFields> for DeclarationRule {
    fn rule_id(&self) -> &str {
        "ENR-S6"
    }

    fn step(&self) -> u8 {
        6
    }

    fn check(&self, f: &EnrollmentFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut e = Vec::new();
        push_unless(
            &mut e,
            f.info_declaration == Some(true),
            id,
            "infoDeclaration",
            "Please confirm the declaration",
        );
        push_unless(
            &mut e,
            f.terms_accepted == Some(true),
            id,
            "termsAccepted",
            "Please accept terms and conditions",
        );
        e
    }
}
