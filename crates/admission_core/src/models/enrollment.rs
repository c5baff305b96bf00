use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::models::form::{lenient, FormFields, FormKind, FormRecord};
use crate::models::upload::FileRef;

pub type EnrollmentRecord = FormRecord<EnrollmentFields>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentGender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningMode {
    Online,
    Offline,
}

/// Course enrollment document. File references sit at the top level so a
/// later step's merge never replaces an earlier step's uploads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentFields {
    // Step 1: personal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<EnrollmentGender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_code: Option<String>,

    // Step 2: identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aadhaar_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aadhaar_card: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photograph: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<FileRef>,

    // Step 3: education
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_qualification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_passing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marksheet: Option<FileRef>,

    // Step 4: course
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_mode: Option<LearningMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hear_about_us: Option<String>,

    // Step 5: payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_receipt: Option<FileRef>,

    // Step 6: declarations
    #[serde(
        default,
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub info_declaration: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub terms_accepted: Option<bool>,
}

impl EnrollmentFields {
    fn file_slot(&mut self, field: &str) -> Option<&mut Option<FileRef>> {
        match field {
            "aadhaarCard" => Some(&mut self.aadhaar_card),
            "photograph" => Some(&mut self.photograph),
            "signature" => Some(&mut self.signature),
            "marksheet" => Some(&mut self.marksheet),
            "paymentReceipt" => Some(&mut self.payment_receipt),
            _ => None,
        }
    }

    /// Every file field across all steps, in step order.
    pub fn all_file_fields() -> impl Iterator<Item = &'static str> {
        FormKind::Enrollment
            .data_steps()
            .flat_map(|step| Self::file_fields(step).iter().copied())
    }
}

impl FormFields for EnrollmentFields {
    const KIND: FormKind = FormKind::Enrollment;

    fn restrict_to_step(&self, step: u8) -> Self {
        let s = self.clone();
        match step {
            1 => Self {
                full_name: s.full_name,
                date_of_birth: s.date_of_birth,
                gender: s.gender,
                mobile_number: s.mobile_number,
                email: s.email,
                parent_name: s.parent_name,
                permanent_address: s.permanent_address,
                city: s.city,
                state: s.state,
                pin_code: s.pin_code,
                ..Default::default()
            },
            2 => Self {
                aadhaar_number: s.aadhaar_number,
                pan_number: s.pan_number,
                aadhaar_card: s.aadhaar_card,
                photograph: s.photograph,
                signature: s.signature,
                ..Default::default()
            },
            3 => Self {
                highest_qualification: s.highest_qualification,
                institution_name: s.institution_name,
                year_of_passing: s.year_of_passing,
                marksheet: s.marksheet,
                ..Default::default()
            },
            4 => Self {
                selected_course: s.selected_course,
                learning_mode: s.learning_mode,
                batch_time: s.batch_time,
                hear_about_us: s.hear_about_us,
                ..Default::default()
            },
            5 => Self {
                payment_mode: s.payment_mode,
                transaction_id: s.transaction_id,
                payment_receipt: s.payment_receipt,
                ..Default::default()
            },
            6 => Self {
                info_declaration: s.info_declaration,
                terms_accepted: s.terms_accepted,
                ..Default::default()
            },
            _ => Self::default(),
        }
    }

    fn file_fields(step: u8) -> &'static [&'static str] {
        match step {
            2 => &["aadhaarCard", "photograph", "signature"],
            3 => &["marksheet"],
            5 => &["paymentReceipt"],
            _ => &[],
        }
    }

    fn attach_file(&mut self, field: &str, file: FileRef) -> Result<(), DomainError> {
        match self.file_slot(field) {
            Some(slot) => {
                *slot = Some(file);
                Ok(())
            }
            None => Err(DomainError::Upload(format!("Unknown upload field: {field}"))),
        }
    }

    fn has_file(&self, field: &str) -> bool {
        let slot = match field {
            "aadhaarCard" => &self.aadhaar_card,
            "photograph" => &self.photograph,
            "signature" => &self.signature,
            "marksheet" => &self.marksheet,
            "paymentReceipt" => &self.payment_receipt,
            _ => return false,
        };
        slot.as_ref().is_some_and(|f| !f.url.is_empty())
    }

    fn file_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("aadhaarCard", &self.aadhaar_card),
            ("photograph", &self.photograph),
            ("signature", &self.signature),
            ("marksheet", &self.marksheet),
            ("paymentReceipt", &self.payment_receipt),
        ]
        .into_iter()
        .filter_map(|(field, slot)| slot.as_ref().map(|f| (field, f.url.as_str())))
        .filter(|(_, url)| !url.trim().is_empty())
        .collect()
    }

    fn mobile(&self) -> Option<&str> {
        self.mobile_number.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::form::merge_fields;

    #[test]
    fn later_steps_do_not_clobber_earlier_files() {
        let mut step2 = EnrollmentFields::default();
        step2
            .attach_file("photograph", FileRef::from_url("https://cdn/p.png"))
            .unwrap();
        let mut step3 = EnrollmentFields {
            institution_name: Some("Patna College".into()),
            ..Default::default()
        };
        step3
            .attach_file("marksheet", FileRef::from_url("https://cdn/m.pdf"))
            .unwrap();

        let merged = merge_fields(&step2, &step3).unwrap();
        assert!(merged.has_file("photograph"));
        assert!(merged.has_file("marksheet"));
    }

    #[test]
    fn multipart_text_booleans_are_accepted() {
        let json = serde_json::json!({"infoDeclaration": "true", "termsAccepted": false});
        let fields: EnrollmentFields = serde_json::from_value(json).unwrap();
        assert_eq!(fields.info_declaration, Some(true));
        assert_eq!(fields.terms_accepted, Some(false));
    }

    #[test]
    fn unknown_file_field_is_rejected() {
        let mut fields = EnrollmentFields::default();
        assert!(fields
            .attach_file("resume", FileRef::from_url("https://cdn/r.pdf"))
            .is_err());
        assert_eq!(
            EnrollmentFields::all_file_fields().collect::<Vec<_>>(),
            ["aadhaarCard", "photograph", "signature", "marksheet", "paymentReceipt"]
        );
    }
}
