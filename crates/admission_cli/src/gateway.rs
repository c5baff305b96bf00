//! HTTP transport for the wizard controller.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

use admission_core::models::{to_patch, FormFields, FormKind, FormRecord, StagedFile};
use admission_core::wizard::{GatewayError, StepGateway};

/// Route prefix of each wizard on the API server.
pub fn route_prefix(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Application => "application",
        FormKind::Enrollment => "enroll",
    }
}

pub struct HttpGateway<F> {
    client: Client,
    base_url: String,
    _fields: PhantomData<fn() -> F>,
}

impl<F: FormFields> HttpGateway<F> {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            _fields: PhantomData,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, route_prefix(F::KIND), path)
    }

    async fn record_from(&self, response: Response) -> Result<FormRecord<F>, GatewayError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        if !status.is_success() {
            return Err(rejected(status, &body));
        }
        serde_json::from_value(body[F::KIND.envelope_key()].clone())
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

fn rejected(status: StatusCode, body: &Value) -> GatewayError {
    GatewayError::Rejected {
        status: status.as_u16(),
        message: body["message"]
            .as_str()
            .unwrap_or("request failed")
            .to_string(),
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

/// Text parts for a step's fields. Stored file references travel as their
/// URL so the server keeps them. Lists have no multipart form and are left
/// out; the server keeps what it already stored for them.
pub fn text_parts(fields: &Map<String, Value>) -> Vec<(String, String)> {
    let mut parts = Vec::new();
    for (name, value) in fields {
        match value {
            Value::String(text) => parts.push((name.clone(), text.clone())),
            Value::Bool(_) | Value::Number(_) => parts.push((name.clone(), value.to_string())),
            Value::Object(object) => {
                if let Some(url) = object.get("url").and_then(Value::as_str) {
                    parts.push((name.clone(), url.to_string()));
                }
            }
            Value::Array(_) | Value::Null => {}
        }
    }
    parts
}

#[async_trait]
impl<F: FormFields> StepGateway for HttpGateway<F> {
    type Fields = F;

    async fn fetch(&self, user_id: &str) -> Result<Option<FormRecord<F>>, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("me/{user_id}")))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        if !status.is_success() {
            return Err(rejected(status, &body));
        }
        match &body[F::KIND.envelope_key()] {
            Value::Null => Ok(None),
            record => serde_json::from_value(record.clone())
                .map(Some)
                .map_err(|e| GatewayError::Decode(e.to_string())),
        }
    }

    async fn submit_step(
        &self,
        user_id: &str,
        step: u8,
        fields: &F,
        files: Vec<StagedFile>,
    ) -> Result<FormRecord<F>, GatewayError> {
        let patch = to_patch(fields).map_err(|e| GatewayError::Decode(e.to_string()))?;
        let request = self.client.post(self.url(&format!("step/{step}")));
        debug!(user_id, step, files = files.len(), "submitting step");

        let request = if files.is_empty() {
            let mut body = patch;
            body.insert("userId".to_string(), json!(user_id));
            request.json(&Value::Object(body))
        } else {
            let mut form = Form::new().text("userId", user_id.to_string());
            for (name, value) in text_parts(&patch) {
                form = form.text(name, value);
            }
            for file in files {
                let part = Part::bytes(file.bytes)
                    .file_name(file.filename)
                    .mime_str(&file.content_type)
                    .map_err(transport)?;
                form = form.part(file.field, part);
            }
            request.multipart(form)
        };

        let response = request.send().await.map_err(transport)?;
        self.record_from(response).await
    }

    async fn finalize(&self, user_id: &str) -> Result<FormRecord<F>, GatewayError> {
        let response = self
            .client
            .post(self.url("final-submit"))
            .json(&json!({ "userId": user_id }))
            .send()
            .await
            .map_err(transport)?;
        self.record_from(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_files_travel_as_urls() {
        let fields = json!({
            "aadhaarNumber": "123412341234",
            "photograph": {"url": "https://cdn/p.png", "mimeType": "image/png"},
            "experienceProofFiles": ["https://cdn/a.pdf", "https://cdn/b.pdf"],
            "infoDeclaration": true,
            "experienceList": [{"orgName": "Circle Office"}]
        });
        let parts = text_parts(fields.as_object().unwrap());

        assert!(parts.contains(&("photograph".into(), "https://cdn/p.png".into())));
        assert!(parts.contains(&("infoDeclaration".into(), "true".into())));
        assert!(!parts.iter().any(|(n, _)| n == "experienceProofFiles"));
        assert!(!parts.iter().any(|(n, _)| n == "experienceList"));
    }

    #[test]
    fn enrollment_routes_use_the_enroll_prefix() {
        let gateway = HttpGateway::<admission_core::models::EnrollmentFields>::new("http://api/").unwrap();
        assert_eq!(gateway.url("step/2"), "http://api/enroll/step/2");
    }
}
