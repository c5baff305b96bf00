use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use admission_core::models::{
    ApplicationFields, Category, EnrollmentFields, EnrollmentGender, ExamType, FormFields,
    Gender, LearningMode, NewContact, PaymentMode, PaymentStatus, PaymentVerification,
    StagedFile, YesNo,
};
use admission_core::signature::payment_signature;
use admission_core::DomainError;
use admission_service::adapters::{FakePaymentProvider, MemoryBlobStore, MemoryStore};
use admission_service::{AdmissionService, FormPart, ServiceError, ServiceSettings, StepSubmission};

const SECRET: &str = "test-secret";

struct Harness {
    service: AdmissionService,
    store: Arc<MemoryStore>,
    blobs: Arc<MemoryBlobStore>,
    provider: Arc<FakePaymentProvider>,
}

fn harness_with(blobs: MemoryBlobStore, provider: FakePaymentProvider, settings: ServiceSettings) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let blobs = Arc::new(blobs);
    let provider = Arc::new(provider);
    let service = AdmissionService::new(store.clone(), blobs.clone(), provider.clone(), settings);
    Harness {
        service,
        store,
        blobs,
        provider,
    }
}

fn settings() -> ServiceSettings {
    ServiceSettings {
        payment_secret: SECRET.to_string(),
        ..Default::default()
    }
}

fn harness() -> Harness {
    harness_with(MemoryBlobStore::default(), FakePaymentProvider::default(), settings())
}

fn application_step(step: u8) -> ApplicationFields {
    match step {
        1 => ApplicationFields {
            full_name: Some("Asha Kumari".into()),
            email: Some("asha@example.in".into()),
            mobile: Some("9876543210".into()),
            provisional_reg_no: Some("PR-17".into()),
            password_hash: Some("hunter22".into()),
            ..Default::default()
        },
        2 => ApplicationFields {
            father_or_husband_name: Some("Ramesh Prasad".into()),
            dob: Some("1999-02-14".into()),
            gender: Some(Gender::Female),
            category: Some(Category::General),
            domicile_state: Some("Bihar".into()),
            permanent_address: Some("Ward 4, Boring Road, Patna".into()),
            correspondence_address: Some("Ward 4, Boring Road, Patna".into()),
            same_address: Some(true),
            ..Default::default()
        },
        3 => ApplicationFields {
            passed_ten_plus_two: Some(YesNo::Yes),
            board_name: Some("BSEB".into()),
            exam_type: Some(ExamType::Intermediate),
            roll_number: Some("R-1001".into()),
            year_of_passing: Some("2017".into()),
            marks_obtained: Some(380.0),
            max_marks: Some(500.0),
            ..Default::default()
        },
        4 => ApplicationFields {
            experience_list: Some(Vec::new()),
            ..Default::default()
        },
        5 => ApplicationFields::default(),
        6 => ApplicationFields {
            payment_mode: Some(PaymentMode::Online),
            ..Default::default()
        },
        _ => ApplicationFields {
            confirm_truth: Some(true),
            confirm_contact_consent: Some(true),
            ..Default::default()
        },
    }
}

fn png(field: &str) -> StagedFile {
    StagedFile::new(field, format!("{field}.png"), "image/png", vec![0x89, b'P', b'N', b'G'])
}

fn upload_files() -> Vec<StagedFile> {
    vec![png("photo"), png("signature"), png("marksheet10Plus2")]
}

fn submission(user_id: &str, step: u8) -> StepSubmission<ApplicationFields> {
    StepSubmission {
        user_id: user_id.to_string(),
        step,
        fields: application_step(step),
        files: if step == 5 { upload_files() } else { Vec::new() },
        idempotency_key: None,
    }
}

async fn complete_application(service: &AdmissionService, user_id: &str) {
    for step in 1..=7 {
        service
            .submit_application_step(submission(user_id, step))
            .await
            .unwrap_or_else(|e| panic!("step {step} failed: {e}"));
    }
}

fn validation_messages(err: ServiceError) -> Vec<String> {
    match err {
        ServiceError::Domain(DomainError::Validation(messages)) => messages,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn full_application_flow_finalizes_once() {
    let h = harness();
    complete_application(&h.service, "u1").await;

    let record = h.service.finalize_application("u1").await.unwrap();
    assert!(record.is_final_submitted);
    assert!(record.final_submitted_at.is_some());
    assert_eq!(record.current_step, 7);
    assert_eq!(record.fields.percentage.as_deref(), Some("76.00"));
    assert_eq!(record.fields.calculated_fee, Some(100));
    assert_eq!(record.fields.total_relevant_experience_years, Some(0));
    assert!(record.fields.photo_file.as_deref().unwrap().starts_with("memory://applications/photo/"));
    assert!(record.fields.password_hash.is_none(), "password must not leave the service");
    assert_eq!(h.blobs.put_count(), 3);

    let again = h.service.finalize_application("u1").await.unwrap_err();
    assert!(matches!(again, ServiceError::Domain(DomainError::AlreadySubmitted)));
}

#[tokio::test]
async fn stored_password_is_a_digest() {
    let h = harness();
    h.service.submit_application_step(submission("u1", 1)).await.unwrap();

    let forms = h.store.forms.lock().await;
    let stored = forms.values().next().unwrap();
    let hash = stored.document["passwordHash"].as_str().unwrap();
    assert_ne!(hash, "hunter22");
    assert_eq!(hash.len(), 64);
}

#[tokio::test]
async fn repeating_a_step_keeps_one_record() {
    let h = harness();
    let first = h.service.submit_application_step(submission("u1", 1)).await.unwrap();
    let second = h.service.submit_application_step(submission("u1", 1)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.current_step, 1);
    assert_eq!(first.fields, second.fields);
    assert_eq!(h.store.forms.lock().await.len(), 1);
}

#[tokio::test]
async fn current_step_never_moves_backwards() {
    let h = harness();
    for step in 1..=3 {
        h.service.submit_application_step(submission("u1", step)).await.unwrap();
    }
    let mut edit = submission("u1", 1);
    edit.fields.full_name = Some("Asha K.".into());
    let record = h.service.submit_application_step(edit).await.unwrap();

    assert_eq!(record.current_step, 3);
    assert_eq!(record.fields.full_name.as_deref(), Some("Asha K."));
    assert_eq!(record.fields.board_name.as_deref(), Some("BSEB"));
}

#[tokio::test]
async fn later_steps_cannot_write_foreign_fields() {
    let h = harness();
    h.service.submit_application_step(submission("u1", 1)).await.unwrap();

    let mut sneaky = submission("u1", 2);
    sneaky.fields.full_name = Some("Someone Else".into());
    sneaky.fields.calculated_fee = Some(1);
    let record = h.service.submit_application_step(sneaky).await.unwrap();

    assert_eq!(record.fields.full_name.as_deref(), Some("Asha Kumari"));
    assert_eq!(record.fields.calculated_fee, None);
}

#[tokio::test]
async fn finalized_record_refuses_further_steps() {
    let h = harness();
    complete_application(&h.service, "u1").await;
    h.service.finalize_application("u1").await.unwrap();
    let writes = h.store.write_count();

    let err = h.service.submit_application_step(submission("u1", 2)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::AlreadySubmitted)));
    assert_eq!(h.store.write_count(), writes);
}

#[tokio::test]
async fn finalized_mobile_blocks_a_new_registration() {
    let h = harness();
    complete_application(&h.service, "u1").await;
    h.service.finalize_application("u1").await.unwrap();

    let err = h.service.submit_application_step(submission("u2", 1)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::AlreadySubmitted)));
    assert!(h.service.application_for_user("u2").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_user_id_is_rejected() {
    let h = harness();
    let err = h.service.submit_application_step(submission("  ", 1)).await.unwrap_err();
    assert_eq!(
        validation_messages(err),
        vec!["User not found with this userId!! First login".to_string()]
    );
}

#[tokio::test]
async fn unknown_step_is_not_found() {
    let h = harness();
    let err = h.service.submit_application_step(submission("u1", 8)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));
}

#[tokio::test]
async fn invalid_step_writes_nothing() {
    let h = harness();
    let mut bad = submission("u1", 1);
    bad.fields.mobile = Some("12345".into());

    let messages = validation_messages(h.service.submit_application_step(bad).await.unwrap_err());
    assert_eq!(messages, vec!["Valid 10-digit Mobile Number is required.".to_string()]);
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_write() {
    let h = harness();
    let mut sub = submission("u1", 5);
    sub.files[0] = StagedFile::new("photo", "huge.jpg", "image/jpeg", vec![0u8; 6 * 1024 * 1024]);

    let messages = validation_messages(h.service.submit_application_step(sub).await.unwrap_err());
    assert!(messages[0].starts_with("File too large"));
    assert_eq!(h.store.write_count(), 0);
    assert_eq!(h.blobs.put_count(), 0);
}

#[tokio::test]
async fn unlisted_mime_type_is_rejected_before_any_write() {
    let h = harness();
    let mut sub = submission("u1", 5);
    sub.files.push(StagedFile::new(
        "otherDocument",
        "cv.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        vec![1, 2, 3],
    ));

    let messages = validation_messages(h.service.submit_application_step(sub).await.unwrap_err());
    assert!(messages[0].starts_with("Unsupported file type"));
    assert_eq!(h.store.write_count(), 0);
    assert_eq!(h.blobs.put_count(), 0);
}

#[tokio::test]
async fn missing_mandatory_upload_is_reported() {
    let h = harness();
    let mut sub = submission("u1", 5);
    sub.files.retain(|f| f.field != "signature");

    let messages = validation_messages(h.service.submit_application_step(sub).await.unwrap_err());
    assert_eq!(messages, vec!["Please upload Signature.".to_string()]);
}

#[tokio::test]
async fn retried_upload_with_same_key_reuses_objects() {
    let h = harness();
    let keyed = || submission("u1", 5).with_idempotency_key(Some("retry-1".into()));

    let first = h.service.submit_application_step(keyed()).await.unwrap();
    let second = h.service.submit_application_step(keyed()).await.unwrap();

    assert_eq!(h.blobs.put_count(), 3);
    assert_eq!(first.fields.photo_file, second.fields.photo_file);
    assert_eq!(h.blobs.objects.lock().await.len(), 3);
}

#[tokio::test]
async fn retry_with_a_different_file_uploads_it_again() {
    let h = harness();
    let keyed = || submission("u1", 5).with_idempotency_key(Some("retry-2".into()));

    let first = h.service.submit_application_step(keyed()).await.unwrap();

    let mut changed = keyed();
    for file in changed.files.iter_mut().filter(|f| f.field == "photo") {
        file.bytes = vec![0x89, b'P', b'N', b'G', 2];
    }
    let second = h.service.submit_application_step(changed).await.unwrap();

    assert_eq!(h.blobs.put_count(), 4);
    assert_ne!(first.fields.photo_file, second.fields.photo_file);
    assert_eq!(first.fields.signature_file, second.fields.signature_file);

    let third = h.service.submit_application_step(keyed()).await.unwrap();
    assert_eq!(h.blobs.put_count(), 5);
    assert_ne!(third.fields.photo_file, second.fields.photo_file);
}

#[tokio::test]
async fn experience_proofs_keep_arrival_order() {
    let h = harness();
    let mut sub = submission("u1", 5);
    sub.files.push(StagedFile::new("experienceProofs", "a.pdf", "application/pdf", vec![1]));
    sub.files.push(StagedFile::new("experienceProofs", "b.pdf", "application/pdf", vec![2]));

    let record = h.service.submit_application_step(sub).await.unwrap();
    let proofs = record.fields.experience_proof_files.unwrap();
    assert_eq!(proofs.len(), 2);
    let objects = h.blobs.objects.lock().await;
    let first_key = proofs[0].trim_start_matches("memory://");
    assert_eq!(objects[first_key].1, vec![1]);
}

#[tokio::test]
async fn slow_blob_store_times_out() {
    let blobs = MemoryBlobStore {
        delay: Duration::from_millis(500),
        ..Default::default()
    };
    let h = harness_with(
        blobs,
        FakePaymentProvider::default(),
        ServiceSettings {
            upload_timeout: Duration::from_millis(20),
            ..settings()
        },
    );

    let err = h.service.submit_application_step(submission("u1", 5)).await.unwrap_err();
    assert!(matches!(err, ServiceError::UploadTimeout { .. }));
    assert!(h.service.application_for_user("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn blob_failure_surfaces_and_saves_nothing() {
    let h = harness();
    h.blobs.fail.store(true, Ordering::SeqCst);

    let err = h.service.submit_application_step(submission("u1", 5)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Blob(_)));
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn finalize_requires_an_existing_complete_record() {
    let h = harness();
    let err = h.service.finalize_application("nobody").await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(ref m)) if m == "Application not found"));

    for step in 1..=6 {
        h.service.submit_application_step(submission("u1", step)).await.unwrap();
    }
    let messages = validation_messages(h.service.finalize_application("u1").await.unwrap_err());
    assert!(messages.contains(&"You must declare that all information is true and final.".to_string()));
}

#[tokio::test]
async fn finalize_rechecks_every_step() {
    let h = harness();
    let err = h.service.submit_application_step(submission("jumper", 7)).await.unwrap_err();
    assert!(validation_messages(err)
        .contains(&"Not eligible. Minimum qualification is 10+2 (Intermediate).".to_string()));

    h.service.submit_application_step(submission("jumper", 3)).await.unwrap();
    h.service.submit_application_step(submission("jumper", 7)).await.unwrap();

    let messages = validation_messages(h.service.finalize_application("jumper").await.unwrap_err());
    assert!(messages.contains(&"Full Name is required.".to_string()));
    assert!(messages.contains(&"Please upload Photograph.".to_string()));
    assert!(messages.contains(&"Please choose a Payment Mode (Online / Offline).".to_string()));

    let record = h.service.application_for_user("jumper").await.unwrap().unwrap();
    assert!(!record.is_final_submitted);
}

#[tokio::test]
async fn records_are_found_by_user_and_id() {
    let h = harness();
    let saved = h.service.submit_application_step(submission("u1", 1)).await.unwrap();

    let by_id = h.service.application_by_id(saved.id).await.unwrap();
    assert_eq!(by_id.user_id, "u1");
    assert!(by_id.fields.password_hash.is_none());
    assert!(matches!(
        h.service.enrollment_by_id(saved.id).await,
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
}

fn enrollment() -> EnrollmentFields {
    EnrollmentFields {
        full_name: Some("Ravi Kumar".into()),
        date_of_birth: Some("2001-04-12".into()),
        gender: Some(EnrollmentGender::Male),
        mobile_number: Some("9123456780".into()),
        email: Some("ravi@example.in".into()),
        parent_name: Some("Suresh Kumar".into()),
        permanent_address: Some("Ward 4, Boring Road".into()),
        city: Some("Patna".into()),
        state: Some("Bihar".into()),
        pin_code: Some("800001".into()),
        aadhaar_number: Some("123412341234".into()),
        highest_qualification: Some("Graduate".into()),
        institution_name: Some("Patna College".into()),
        year_of_passing: Some("2022".into()),
        selected_course: Some("Amin Training".into()),
        learning_mode: Some(LearningMode::Offline),
        batch_time: Some("Morning".into()),
        hear_about_us: Some("Friend".into()),
        payment_mode: Some("UPI".into()),
        transaction_id: Some("TXN123".into()),
        info_declaration: Some(true),
        terms_accepted: Some(true),
        ..Default::default()
    }
}

#[tokio::test]
async fn enrollment_steps_keep_earlier_uploads() {
    let h = harness();
    let all = enrollment();
    for step in 1..=6 {
        let files = match step {
            2 => vec![png("photograph")],
            3 => vec![StagedFile::new("marksheet", "m.pdf", "application/pdf", vec![1])],
            _ => Vec::new(),
        };
        h.service
            .submit_enrollment_step(StepSubmission {
                user_id: "e1".into(),
                step,
                fields: all.restrict_to_step(step),
                files,
                idempotency_key: None,
            })
            .await
            .unwrap();
    }

    let record = h.service.finalize_enrollment("e1").await.unwrap();
    assert!(record.fields.has_file("photograph"));
    assert!(record.fields.has_file("marksheet"));
    assert_eq!(record.fields.photograph.unwrap().mime_type.as_deref(), Some("image/png"));
    assert_eq!(record.current_step, 6);
}

fn text(name: &str, value: &str) -> FormPart {
    FormPart::Text {
        name: name.into(),
        value: value.into(),
    }
}

fn direct_parts(mobile: &str) -> Vec<FormPart> {
    let mut parts: Vec<FormPart> = serde_json::to_value(EnrollmentFields {
        mobile_number: Some(mobile.into()),
        ..enrollment()
    })
    .unwrap()
    .as_object()
    .unwrap()
    .iter()
    .map(|(k, v)| match v {
        serde_json::Value::String(s) => text(k, s),
        other => text(k, &other.to_string()),
    })
    .collect();
    parts.push(FormPart::File(png("photograph")));
    parts
}

#[tokio::test]
async fn direct_enrollment_creates_a_finalized_record() {
    let h = harness();
    let created = h.service.enroll_direct(direct_parts("9123456780")).await.unwrap();

    let record = h.service.enrollment_by_id(created.enrollment_id).await.unwrap();
    assert!(record.is_final_submitted);
    assert!(record.user_id.starts_with("direct-"));
    assert!(record.fields.has_file("photograph"));

    let err = h.service.enroll_direct(direct_parts("9123456780")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::AlreadySubmitted)));
}

#[tokio::test]
async fn direct_enrollment_reports_every_invalid_field() {
    let h = harness();
    let parts = vec![text("fullName", "R"), text("termsAccepted", "false")];
    let messages = validation_messages(h.service.enroll_direct(parts).await.unwrap_err());
    assert!(messages.len() > 5);
    assert!(messages.contains(&"Please accept terms and conditions".to_string()));
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn orders_are_created_in_paise() {
    let h = harness();
    let order = h.service.create_order(200.0).await.unwrap();
    assert_eq!(order.amount, 20000);
    assert_eq!(order.currency, "INR");
    assert!(order.receipt.unwrap().starts_with("receipt_"));

    let err = h.service.create_order(0.0).await.unwrap_err();
    assert_eq!(validation_messages(err), vec!["Invalid amount".to_string()]);
}

fn verification(order: &str, payment: &str, signature: String) -> PaymentVerification {
    PaymentVerification {
        razorpay_order_id: order.into(),
        razorpay_payment_id: payment.into(),
        razorpay_signature: signature,
    }
}

#[tokio::test]
async fn genuine_signature_stores_a_success() {
    let h = harness_with(
        MemoryBlobStore::default(),
        FakePaymentProvider::default().with_order("order_1", 20000).await,
        settings(),
    );
    let signature = payment_signature(SECRET, "order_1", "pay_1").unwrap();

    let record = h.service.verify_payment(verification("order_1", "pay_1", signature)).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.amount, 20000);
    assert_eq!(h.service.payment_for_order("order_1").await.unwrap().id, record.id);
}

#[tokio::test]
async fn forged_signature_is_recorded_as_failed() {
    let h = harness_with(
        MemoryBlobStore::default(),
        FakePaymentProvider::default().with_order("order_1", 20000).await,
        settings(),
    );
    let forged = payment_signature("wrong-secret", "order_1", "pay_1").unwrap();

    let err = h.service.verify_payment(verification("order_1", "pay_1", forged)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(DomainError::InvalidSignature)));

    let stored = h.service.payment_for_order("order_1").await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Failed);
    assert_eq!(stored.amount, 20000);
}

#[tokio::test]
async fn provider_outage_stores_nothing() {
    let h = harness_with(
        MemoryBlobStore::default(),
        FakePaymentProvider::default().with_order("order_1", 20000).await,
        settings(),
    );
    h.provider.fail_fetch.store(true, Ordering::SeqCst);
    let signature = payment_signature(SECRET, "order_1", "pay_1").unwrap();

    let err = h.service.verify_payment(verification("order_1", "pay_1", signature)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Provider(_)));
    assert!(h.store.payments.lock().await.is_empty());
    assert!(matches!(
        h.service.payment_for_order("order_1").await,
        Err(ServiceError::Domain(DomainError::NotFound(_)))
    ));
}

fn contact(subject: &str) -> NewContact {
    NewContact {
        first_name: "Meera".into(),
        last_name: "Singh".into(),
        email: "meera@example.in".into(),
        phone: "9000000000".into(),
        subject: subject.into(),
        message: "When does the next batch start?".into(),
        course: Some("Amin Training".into()),
        location: None,
    }
}

#[tokio::test]
async fn contacts_are_listed_newest_first() {
    let h = harness();
    h.service.submit_contact(contact("first")).await.unwrap();
    h.service.submit_contact(contact("second")).await.unwrap();

    let listed = h.service.list_contacts().await.unwrap();
    let subjects: Vec<_> = listed.iter().map(|c| c.contact.subject.as_str()).collect();
    assert_eq!(subjects, ["second", "first"]);

    let err = h
        .service
        .submit_contact(NewContact {
            email: String::new(),
            ..contact("third")
        })
        .await
        .unwrap_err();
    assert_eq!(validation_messages(err), vec!["Email is required.".to_string()]);
}
