use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use admission_cli::commands::resume::{drive, Attachment};
use admission_cli::gateway::HttpGateway;
use admission_core::application_validator;
use admission_core::models::{ApplicationFields, PaymentMode};
use admission_core::wizard::{WizardController, WizardState};
use admission_service::adapters::{FakePaymentProvider, MemoryBlobStore, MemoryStore};
use admission_service::{AdmissionService, ServiceSettings};

async fn spawn_api() -> String {
    let service = AdmissionService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryBlobStore::default()),
        Arc::new(FakePaymentProvider::default()),
        ServiceSettings::default(),
    );
    let app = admission_api::router(Arc::new(service), 32 * 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    format!("http://{addr}")
}

fn wizard(base: &str, user: &str) -> WizardController<HttpGateway<ApplicationFields>> {
    let gateway = HttpGateway::new(base).expect("gateway");
    WizardController::new(gateway, user, application_validator())
}

fn early_steps() -> ApplicationFields {
    serde_json::from_value(json!({
        "fullName": "Asha Kumari",
        "email": "asha@example.in",
        "mobile": "9876543210",
        "provisionalRegNo": "PR-17",
        "passwordHash": "hunter22",
        "fatherOrHusbandName": "Ramesh Prasad",
        "dob": "1999-02-14",
        "gender": "Female",
        "category": "General (Unreserved)",
        "domicileState": "Bihar",
        "permanentAddress": "Ward 4, Boring Road, Patna",
        "correspondenceAddress": "Ward 4, Boring Road, Patna",
        "passed10Plus2": "yes",
        "boardName": "BSEB",
        "examType": "Intermediate (10+2)",
        "rollNumber": "R-1001",
        "yearOfPassing": "2017",
        "marksObtained": 340,
        "maxMarks": 500
    }))
    .expect("draft")
}

#[tokio::test]
async fn interrupted_wizard_resumes_where_it_stopped() {
    let base = spawn_api().await;

    // No uploads: step 5 is refused locally, after steps 1-4 are saved.
    let err = drive(wizard(&base, "u1"), Some(early_steps()), Vec::new(), false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Step 5"));

    let mut resumed = wizard(&base, "u1");
    assert_eq!(resumed.resume().await.unwrap(), WizardState::Editing(4));
    assert_eq!(resumed.draft().full_name.as_deref(), Some("Asha Kumari"));
    assert_eq!(resumed.draft().percentage.as_deref(), Some("68.00"));
    assert!(resumed.draft().password_hash.is_none());
}

#[tokio::test]
async fn drive_uploads_and_submits() {
    let base = spawn_api().await;
    let dir = tempdir().expect("tempdir");
    let mut attachments = Vec::new();
    for field in ["photo", "signature", "marksheet10Plus2"] {
        let path = dir.path().join(format!("{field}.png"));
        fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write scan");
        attachments.push(Attachment {
            field: field.to_string(),
            path,
        });
    }
    let mut draft = early_steps();
    draft.payment_mode = Some(PaymentMode::Online);
    draft.confirm_truth = Some(true);
    draft.confirm_contact_consent = Some(true);

    let state = drive(wizard(&base, "u2"), Some(draft), attachments, true)
        .await
        .expect("drive");
    assert_eq!(state, WizardState::Submitted);

    let mut again = wizard(&base, "u2");
    assert_eq!(again.resume().await.unwrap(), WizardState::Submitted);
    let record = again.record().unwrap();
    assert!(record.is_final_submitted);
    assert_eq!(record.fields.calculated_fee, Some(100));
    assert!(record.fields.photo_file.as_deref().unwrap().starts_with("memory://"));
}
