use serde::{Deserialize, Serialize};
use time::Date;

use crate::derived;
use crate::signature;
use crate::error::DomainError;
use crate::models::form::{lenient, FormFields, FormKind, FormRecord};
use crate::models::upload::FileRef;

pub type ApplicationRecord = FormRecord<ApplicationFields>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Reservation category chosen by the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "General (Unreserved)")]
    General,
    #[serde(rename = "EBC (Economically Backward Class)")]
    Ebc,
    #[serde(rename = "BC (Backward Class)")]
    Bc,
    #[serde(rename = "SC (अनुसूचित जाति)")]
    Sc,
    #[serde(rename = "ST (अनुसूचित जनजाति)")]
    St,
    #[serde(rename = "Female")]
    Female,
    #[serde(rename = "Divyang (Persons with Disability)")]
    Divyang,
    #[serde(rename = "Freedom Fighter Dependent / Ex-Servicemen")]
    FreedomFighterOrExServicemen,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "General (Unreserved)",
            Category::Ebc => "EBC (Economically Backward Class)",
            Category::Bc => "BC (Backward Class)",
            Category::Sc => "SC (अनुसूचित जाति)",
            Category::St => "ST (अनुसूचित जनजाति)",
            Category::Female => "Female",
            Category::Divyang => "Divyang (Persons with Disability)",
            Category::FreedomFighterOrExServicemen => "Freedom Fighter Dependent / Ex-Servicemen",
        }
    }

    /// Every reserved category must back its claim with a certificate.
    pub fn requires_certificate(self) -> bool {
        self != Category::General
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "Intermediate (10+2)")]
    Intermediate,
    #[serde(rename = "Equivalent")]
    Equivalent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Online,
    Offline,
}

/// Whether an experience row is relevant to land / revenue / survey work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    Yes,
    No,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub org_name: String,
    pub designation: String,
    pub nature_of_work: String,
    pub start_date: String,
    pub end_date: String,
    pub currently_working: bool,
    /// Always derived from the dates, e.g. "2 year(s) 3 month(s)".
    pub duration_text: String,
    pub relevant: Relevance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFields {
    // ---------------------------
    // Step 1: Registration
    // ---------------------------
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisional_reg_no: Option<String>,
    /// Raw password on the way in, SHA-256 digest once stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    // ---------------------------
    // Step 2: Basic details
    // ---------------------------
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_or_husband_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domicile_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correspondence_address: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub same_address: Option<bool>,

    // ---------------------------
    // Step 3: Education
    // ---------------------------
    #[serde(rename = "passed10Plus2", default, skip_serializing_if = "Option::is_none")]
    pub passed_ten_plus_two: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<ExamType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_passing: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub marks_obtained: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_marks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<String>,

    // ---------------------------
    // Step 4: Work experience
    // ---------------------------
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_list: Option<Vec<ExperienceEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_relevant_experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_score: Option<u32>,

    // ---------------------------
    // Step 5: Uploads (URLs only)
    // ---------------------------
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_file: Option<String>,
    #[serde(rename = "marksheet10Plus2File", default, skip_serializing_if = "Option::is_none")]
    pub marksheet_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_certificate_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability_certificate_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_proof_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_document_file: Option<String>,

    // ---------------------------
    // Step 6: Payment selection
    // ---------------------------
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_category_for_fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_fee: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentMode>,

    // ---------------------------
    // Step 7: Declaration
    // ---------------------------
    #[serde(
        default,
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub confirm_truth: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub confirm_contact_consent: Option<bool>,
}

const UPLOAD_FIELDS: [&str; 7] = [
    "photo",
    "signature",
    "marksheet10Plus2",
    "categoryCertificate",
    "disabilityCertificate",
    "experienceProofs",
    "otherDocument",
];

impl FormFields for ApplicationFields {
    const KIND: FormKind = FormKind::Application;

    fn restrict_to_step(&self, step: u8) -> Self {
        let s = self.clone();
        match step {
            1 => Self {
                full_name: s.full_name,
                email: s.email,
                mobile: s.mobile,
                provisional_reg_no: s.provisional_reg_no,
                password_hash: s.password_hash,
                ..Default::default()
            },
            2 => Self {
                father_or_husband_name: s.father_or_husband_name,
                dob: s.dob,
                gender: s.gender,
                category: s.category,
                domicile_state: s.domicile_state,
                permanent_address: s.permanent_address,
                correspondence_address: s.correspondence_address,
                same_address: s.same_address,
                ..Default::default()
            },
            3 => Self {
                passed_ten_plus_two: s.passed_ten_plus_two,
                board_name: s.board_name,
                exam_type: s.exam_type,
                roll_number: s.roll_number,
                year_of_passing: s.year_of_passing,
                marks_obtained: s.marks_obtained,
                max_marks: s.max_marks,
                percentage: s.percentage,
                ..Default::default()
            },
            4 => Self {
                experience_list: s.experience_list,
                total_relevant_experience_years: s.total_relevant_experience_years,
                experience_score: s.experience_score,
                ..Default::default()
            },
            5 => Self {
                photo_file: s.photo_file,
                signature_file: s.signature_file,
                marksheet_file: s.marksheet_file,
                category_certificate_file: s.category_certificate_file,
                disability_certificate_file: s.disability_certificate_file,
                experience_proof_files: s.experience_proof_files,
                other_document_file: s.other_document_file,
                ..Default::default()
            },
            6 => Self {
                payment_category_for_fee: s.payment_category_for_fee,
                calculated_fee: s.calculated_fee,
                payment_mode: s.payment_mode,
                ..Default::default()
            },
            7 => Self {
                confirm_truth: s.confirm_truth,
                confirm_contact_consent: s.confirm_contact_consent,
                ..Default::default()
            },
            _ => Self::default(),
        }
    }

    fn file_fields(step: u8) -> &'static [&'static str] {
        if step == 5 {
            &UPLOAD_FIELDS
        } else {
            &[]
        }
    }

    fn is_multi_file(field: &str) -> bool {
        field == "experienceProofs"
    }

    fn attach_file(&mut self, field: &str, file: FileRef) -> Result<(), DomainError> {
        let url = Some(file.url);
        match field {
            "photo" => self.photo_file = url,
            "signature" => self.signature_file = url,
            "marksheet10Plus2" => self.marksheet_file = url,
            "categoryCertificate" => self.category_certificate_file = url,
            "disabilityCertificate" => self.disability_certificate_file = url,
            "otherDocument" => self.other_document_file = url,
            "experienceProofs" => {
                let proofs = self.experience_proof_files.get_or_insert_with(Vec::new);
                proofs.extend(url);
            }
            other => return Err(DomainError::Upload(format!("Unknown upload field: {other}"))),
        }
        Ok(())
    }

    fn has_file(&self, field: &str) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        match field {
            "photo" => present(&self.photo_file),
            "signature" => present(&self.signature_file),
            "marksheet10Plus2" => present(&self.marksheet_file),
            "categoryCertificate" => present(&self.category_certificate_file),
            "disabilityCertificate" => present(&self.disability_certificate_file),
            "otherDocument" => present(&self.other_document_file),
            "experienceProofs" => self
                .experience_proof_files
                .as_ref()
                .is_some_and(|files| !files.is_empty()),
            _ => false,
        }
    }

    fn file_links(&self) -> Vec<(&'static str, &str)> {
        let single = [
            ("photo", &self.photo_file),
            ("signature", &self.signature_file),
            ("marksheet10Plus2", &self.marksheet_file),
            ("categoryCertificate", &self.category_certificate_file),
            ("disabilityCertificate", &self.disability_certificate_file),
            ("otherDocument", &self.other_document_file),
        ];
        let proofs = self.experience_proof_files.iter().flatten();
        single
            .into_iter()
            .filter_map(|(field, value)| value.as_deref().map(|url| (field, url)))
            .chain(proofs.map(|url| ("experienceProofs", url.as_str())))
            .filter(|(_, url)| !url.trim().is_empty())
            .collect()
    }

    fn mobile(&self) -> Option<&str> {
        self.mobile.as_deref()
    }

    fn apply_derived(&mut self, step: u8, today: Date) {
        match step {
            3 => {
                self.percentage = derived::percentage(self.marks_obtained, self.max_marks);
            }
            4 => {
                let entries = self.experience_list.get_or_insert_with(Vec::new);
                for entry in entries.iter_mut() {
                    entry.duration_text = derived::service_span(
                        &entry.start_date,
                        &entry.end_date,
                        entry.currently_working,
                        today,
                    )
                    .map(|span| span.to_string())
                    .unwrap_or_default();
                }
                let summary = derived::experience_summary(entries);
                self.total_relevant_experience_years = Some(summary.total_years);
                self.experience_score = Some(summary.score);
            }
            6 => {
                self.payment_category_for_fee = self.category.map(|c| c.as_str().to_string());
                self.calculated_fee = Some(derived::exam_fee(self.category, self.gender));
            }
            _ => {}
        }
    }

    fn seal(&mut self, user_id: &str) {
        self.password_hash = self
            .password_hash
            .take()
            .filter(|raw| !raw.is_empty())
            .map(|raw| signature::password_digest(user_id, &raw));
    }

    fn redacted(self) -> Self {
        Self {
            password_hash: None,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::form::{merge_fields, to_patch};
    use time::macros::date;

    #[test]
    fn restrict_keeps_only_step_fields() {
        let fields = ApplicationFields {
            full_name: Some("Asha".into()),
            board_name: Some("BSEB".into()),
            ..Default::default()
        };
        let step1 = fields.restrict_to_step(1);
        assert_eq!(step1.full_name.as_deref(), Some("Asha"));
        assert!(step1.board_name.is_none());

        let patch = to_patch(&step1).unwrap();
        assert_eq!(patch.len(), 1);
        assert!(patch.contains_key("fullName"));
    }

    #[test]
    fn merge_overwrites_only_present_keys() {
        let base = ApplicationFields {
            full_name: Some("Asha".into()),
            email: Some("old@example.com".into()),
            ..Default::default()
        };
        let patch = ApplicationFields {
            email: Some("new@example.com".into()),
            ..Default::default()
        };
        let merged = merge_fields(&base, &patch).unwrap();
        assert_eq!(merged.full_name.as_deref(), Some("Asha"));
        assert_eq!(merged.email.as_deref(), Some("new@example.com"));
    }

    #[test]
    fn wire_names_match_the_form() {
        let json = serde_json::json!({
            "passed10Plus2": "yes",
            "examType": "Intermediate (10+2)",
            "category": "SC (अनुसूचित जाति)",
            "marksheet10Plus2File": "https://cdn/x.pdf",
            "experienceList": [{"orgName": "Revenue Office", "relevant": ""}]
        });
        let fields: ApplicationFields = serde_json::from_value(json).unwrap();
        assert_eq!(fields.passed_ten_plus_two, Some(YesNo::Yes));
        assert_eq!(fields.exam_type, Some(ExamType::Intermediate));
        assert_eq!(fields.category, Some(Category::Sc));
        assert!(fields.has_file("marksheet10Plus2"));
        let list = fields.experience_list.unwrap();
        assert_eq!(list[0].relevant, Relevance::Unspecified);
    }

    #[test]
    fn derived_fee_follows_category_and_gender() {
        let mut fields = ApplicationFields {
            category: Some(Category::General),
            gender: Some(Gender::Female),
            ..Default::default()
        };
        fields.apply_derived(6, date!(2025 - 01 - 01));
        assert_eq!(fields.calculated_fee, Some(100));
        assert_eq!(
            fields.payment_category_for_fee.as_deref(),
            Some("General (Unreserved)")
        );
    }

    #[test]
    fn sealing_hashes_the_password() {
        let mut fields = ApplicationFields {
            password_hash: Some("hunter22".into()),
            ..Default::default()
        };
        fields.seal("u1");
        let stored = fields.password_hash.unwrap();
        assert_ne!(stored, "hunter22");
        assert_eq!(stored, signature::password_digest("u1", "hunter22"));
    }

    #[test]
    fn redaction_drops_password() {
        let fields = ApplicationFields {
            password_hash: Some("digest".into()),
            full_name: Some("Asha".into()),
            ..Default::default()
        };
        let clean = fields.redacted();
        assert!(clean.password_hash.is_none());
        assert!(clean.full_name.is_some());
    }
}
