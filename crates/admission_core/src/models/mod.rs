pub mod application;
pub mod contact;
pub mod enrollment;
pub mod form;
pub mod payment;
pub mod upload;

pub use application::{
    ApplicationFields, ApplicationRecord, Category, ExamType, ExperienceEntry, Gender,
    PaymentMode, Relevance, YesNo,
};
pub use contact::{ContactSubmission, NewContact};
pub use enrollment::{EnrollmentFields, EnrollmentGender, EnrollmentRecord, LearningMode};
pub use form::{
    merge_fields, to_patch, FormFields, FormKind, FormRecord, StepRequest, StoredForm,
};
pub use payment::{
    to_minor_units, PaymentOrder, PaymentRecord, PaymentStatus, PaymentVerification,
};
pub use upload::{FileRef, ReceiptKey, StagedFile, UploadPolicy, UploadReceipt};
