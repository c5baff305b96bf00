use crate::models::{ApplicationFields, Category, FormFields, Relevance, YesNo};
use crate::validation::{patterns, text, ValidationError, ValidationRule};

fn has_upload(fields: &ApplicationFields, attachments: &[String], name: &str) -> bool {
    fields.has_file(name) || attachments.iter().any(|a| a == name)
}

// =========================================================================
// RULE: APP-S1
// Registration: name, email, mobile, provisional number, password
// =========================================================================
pub struct RegistrationRule;

impl ValidationRule<ApplicationFields> for RegistrationRule {
    fn rule_id(&self) -> &str {
        "APP-S1"
    }

    fn step(&self) -> u8 {
        1
    }

    fn check(&self, f: &ApplicationFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut errors = Vec::new();
        if text(&f.full_name).is_none() {
            errors.push(ValidationError::error(id, "fullName", "Full Name is required."));
        }
        if !text(&f.email).is_some_and(patterns::is_email) {
            errors.push(ValidationError::error(id, "email", "Valid Email ID is required."));
        }
        if !text(&f.mobile).is_some_and(patterns::is_mobile) {
            errors.push(ValidationError::error(
                id,
                "mobile",
                "Valid 10-digit Mobile Number is required.",
            ));
        }
        if text(&f.provisional_reg_no).is_none() {
            errors.push(ValidationError::error(
                id,
                "provisionalRegNo",
                "Provisional Registration Number is required.",
            ));
        }
        if text(&f.password_hash).is_none() {
            errors.push(ValidationError::error(id, "passwordHash", "Password is required."));
        }
        errors
    }
}

// =========================================================================
// RULE: APP-S2
// Basic details
// =========================================================================
pub struct BasicDetailsRule;

impl ValidationRule<ApplicationFields> for BasicDetailsRule {
    fn rule_id(&self) -> &str {
        "APP-S2"
    }

    fn step(&self) -> u8 {
        2
    }

    fn check(&self, f: &ApplicationFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut errors = Vec::new();
        let required = [
            ("fatherOrHusbandName", &f.father_or_husband_name, "Father’s / Husband’s Name is required."),
            ("dob", &f.dob, "Date of Birth is required."),
        ];
        for (field, value, message) in required {
            if text(value).is_none() {
                errors.push(ValidationError::error(id, field, message));
            }
        }
        if f.gender.is_none() {
            errors.push(ValidationError::error(id, "gender", "Gender is required."));
        }
        if f.category.is_none() {
            errors.push(ValidationError::error(id, "category", "Category / Reservation is required."));
        }
        let required = [
            ("domicileState", &f.domicile_state, "Domicile State is required."),
            ("permanentAddress", &f.permanent_address, "Permanent Address is required."),
            ("correspondenceAddress", &f.correspondence_address, "Correspondence Address is required."),
        ];
        for (field, value, message) in required {
            if text(value).is_none() {
                errors.push(ValidationError::error(id, field, message));
            }
        }
        errors
    }
}

// =========================================================================
// RULE: APP-S3
// Education: 10+2 is a hard eligibility gate
// =========================================================================
pub struct EducationRule;

impl ValidationRule<ApplicationFields> for EducationRule {
    fn rule_id(&self) -> &str {
        "APP-S3"
    }

    fn step(&self) -> u8 {
        3
    }

    fn check(&self, f: &ApplicationFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut errors = Vec::new();
        match f.passed_ten_plus_two {
            None => errors.push(ValidationError::error(
                id,
                "passed10Plus2",
                "Please confirm 10+2 qualification.",
            )),
            Some(YesNo::No) => errors.push(ValidationError::error(
                id,
                "passed10Plus2",
                "You are not eligible to apply. Intermediate (10+2) is required.",
            )),
            Some(YesNo::Yes) => {}
        }
        if text(&f.board_name).is_none() {
            errors.push(ValidationError::error(id, "boardName", "Board / University Name is required."));
        }
        if f.exam_type.is_none() {
            errors.push(ValidationError::error(id, "examType", "Examination Type is required."));
        }
        if text(&f.roll_number).is_none() {
            errors.push(ValidationError::error(
                id,
                "rollNumber",
                "Roll Number / Registration Number is required.",
            ));
        }
        if text(&f.year_of_passing).is_none() {
            errors.push(ValidationError::error(id, "yearOfPassing", "Year of Passing is required."));
        }
        if f.marks_obtained.is_none() {
            errors.push(ValidationError::error(id, "marksObtained", "Marks Obtained is required."));
        }
        if f.max_marks.is_none() {
            errors.push(ValidationError::error(id, "maxMarks", "Maximum Marks is required."));
        }
        errors
    }
}

// =========================================================================
// RULE: APP-S4
// Every experience row must say whether it is relevant
// =========================================================================
pub struct ExperienceRule;

impl ValidationRule<ApplicationFields> for ExperienceRule {
    fn rule_id(&self) -> &str {
        "APP-S4"
    }

    fn step(&self) -> u8 {
        4
    }

    fn check(&self, f: &ApplicationFields, _attachments: &[String]) -> Vec<ValidationError> {
        let entries = f.experience_list.as_deref().unwrap_or_default();
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.relevant == Relevance::Unspecified)
            .map(|(idx, _)| {
                ValidationError::error(
                    self.rule_id(),
                    "experienceList",
                    format!(
                        "Please specify if experience row {} is relevant to land/revenue/survey/etc.",
                        idx + 1
                    ),
                )
            })
            .collect()
    }
}

// =========================================================================
// RULE: APP-S5
// Mandatory uploads, plus certificates implied by the category
// =========================================================================
pub struct UploadsRule;

impl ValidationRule<ApplicationFields> for UploadsRule {
    fn rule_id(&self) -> &str {
        "APP-S5"
    }

    fn step(&self) -> u8 {
        5
    }

    fn check(&self, f: &ApplicationFields, attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut errors = Vec::new();
        let mandatory = [
            ("photo", "Please upload Photograph."),
            ("signature", "Please upload Signature."),
            ("marksheet10Plus2", "Please upload 10+2 Marksheet."),
        ];
        for (field, message) in mandatory {
            if !has_upload(f, attachments, field) {
                errors.push(ValidationError::error(id, field, message));
            }
        }

        let category = f.category;
        if category.is_some_and(Category::requires_certificate)
            && !has_upload(f, attachments, "categoryCertificate")
        {
            errors.push(ValidationError::error(
                id,
                "categoryCertificate",
                "Please upload Category / Reservation Certificate for your selected category.",
            ));
        }
        if category == Some(Category::Divyang)
            && !has_upload(f, attachments, "disabilityCertificate")
        {
            errors.push(ValidationError::error(
                id,
                "disabilityCertificate",
                "Please upload Disability Certificate for Divyang quota.",
            ));
        }
        errors
    }
}

// =========================================================================
// RULE: APP-S6
// =========================================================================
pub struct PaymentModeRule;

impl ValidationRule<ApplicationFields> for PaymentModeRule {
    fn rule_id(&self) -> &str {
        "APP-S6"
    }

    fn step(&self) -> u8 {
        6
    }

    fn check(&self, f: &ApplicationFields, _attachments: &[String]) -> Vec<ValidationError> {
        if f.payment_mode.is_none() {
            return vec![ValidationError::error(
                self.rule_id(),
                "paymentMode",
                "Please choose a Payment Mode (Online / Offline).",
            )];
        }
        Vec::new()
    }
}

// =========================================================================
// RULE: APP-S7
// Declarations, and the eligibility gate once more before finalization
// =========================================================================
pub struct DeclarationRule;

impl ValidationRule<ApplicationFields> for DeclarationRule {
    fn rule_id(&self) -> &str {
        "APP-S7"
    }

    fn step(&self) -> u8 {
        7
    }

    fn check(&self, f: &ApplicationFields, _attachments: &[String]) -> Vec<ValidationError> {
        let id = self.rule_id();
        let mut errors = Vec::new();
        if f.confirm_truth != Some(true) {
            errors.push(ValidationError::error(
                id,
                "confirmTruth",
                "You must declare that all information is true and final.",
            ));
        }
        if f.confirm_contact_consent != Some(true) {
            errors.push(ValidationError::error(
                id,
                "confirmContactConsent",
                "You must agree to receive communication on your registered email/mobile.",
            ));
        }
        if f.passed_ten_plus_two != Some(YesNo::Yes) {
            errors.push(ValidationError::error(
                id,
                "passed10Plus2",
                "Not eligible. Minimum qualification is 10+2 (Intermediate).",
            ));
        }
        errors
    }
}
