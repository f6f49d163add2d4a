//! HTTP client for the JiffyBox v1.0 API.
//!
//! The API key is part of the request path: `{base}/{api_key}/v1.0/{path}`.
//! Every response carries `messages` and `result`; a `false` or `null` result
//! means the call failed and the messages say why.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::resource::ReferenceKind;

use super::error::JiffyBoxError;
use super::types::{
    Backup, BackupSlots, BoxSpec, CloneSpec, Distribution, DistributionBody, JiffyBox, Plan,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Power transitions accepted by `PUT jiffyBoxes/{id}`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
enum PowerStatus {
    Shutdown,
    Start,
    Freeze,
    Thaw,
}

#[derive(Debug, Serialize)]
struct PowerChange {
    status: PowerStatus,
    #[serde(rename = "planid", skip_serializing_if = "Option::is_none")]
    plan_id: Option<u64>,
}

/// Thin typed wrapper over the JiffyBox endpoints.
#[derive(Clone, Debug)]
pub struct JiffyBoxClient {
    http: Client,
    root: String,
}

impl JiffyBoxClient {
    /// Builds a client for `base` (for example `https://api.jiffybox.de`).
    ///
    /// # Errors
    ///
    /// Returns [`JiffyBoxError::Http`] when the HTTP client cannot be built.
    pub fn new(base: &str, api_key: &str) -> Result<Self, JiffyBoxError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            root: format!("{}/{api_key}/v1.0", base.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "JiffyBox request");
        self.http.request(method, format!("{}/{path}", self.root))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, JiffyBoxError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(JiffyBoxError::NotFound(format!("HTTP {status}")));
        }
        match result_of(&body) {
            Err(JiffyBoxError::Decode(_)) if !status.is_success() => Err(JiffyBoxError::Api(
                format!("unexpected HTTP status {status}"),
            )),
            other => other,
        }
    }

    /// Lists every box of the account, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the request or decoding fails.
    pub async fn boxes(&self) -> Result<Vec<JiffyBox>, JiffyBoxError> {
        let result = self.send(self.request(Method::GET, "jiffyBoxes")).await?;
        let mut boxes: Vec<JiffyBox> = map_values(result)?
            .into_iter()
            .map(|(_, jiffybox)| jiffybox)
            .collect();
        boxes.sort_by_key(|jiffybox| jiffybox.id);
        Ok(boxes)
    }

    /// Fetches one box.
    ///
    /// # Errors
    ///
    /// Returns [`JiffyBoxError::NotFound`] when the box does not exist.
    pub async fn jiffybox(&self, id: u64) -> Result<JiffyBox, JiffyBoxError> {
        let result = self.send(self.request(Method::GET, &format!("jiffyBoxes/{id}"))).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Creates a box.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn create_box(&self, spec: &BoxSpec) -> Result<JiffyBox, JiffyBoxError> {
        let result = self.send(self.request(Method::POST, "jiffyBoxes").form(spec)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Deletes a box. Deletion completes asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`JiffyBoxError::NotFound`] when the box does not exist.
    pub async fn delete_box(&self, id: u64) -> Result<(), JiffyBoxError> {
        self.send(self.request(Method::DELETE, &format!("jiffyBoxes/{id}"))).await?;
        Ok(())
    }

    async fn change_power(
        &self,
        id: u64,
        status: PowerStatus,
        plan_id: Option<u64>,
    ) -> Result<JiffyBox, JiffyBoxError> {
        let change = PowerChange { status, plan_id };
        let result = self
            .send(self.request(Method::PUT, &format!("jiffyBoxes/{id}")).form(&change))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Shuts a box down.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn shutdown_box(&self, id: u64) -> Result<JiffyBox, JiffyBoxError> {
        self.change_power(id, PowerStatus::Shutdown, None).await
    }

    /// Starts a box on `plan_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn start_box(&self, id: u64, plan_id: u64) -> Result<JiffyBox, JiffyBoxError> {
        self.change_power(id, PowerStatus::Start, Some(plan_id)).await
    }

    /// Freezes a stopped box.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn freeze_box(&self, id: u64) -> Result<JiffyBox, JiffyBoxError> {
        self.change_power(id, PowerStatus::Freeze, None).await
    }

    /// Thaws a frozen box onto `plan_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn thaw_box(&self, id: u64, plan_id: u64) -> Result<JiffyBox, JiffyBoxError> {
        self.change_power(id, PowerStatus::Thaw, Some(plan_id)).await
    }

    /// Clones a box.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn clone_box(&self, id: u64, spec: &CloneSpec) -> Result<JiffyBox, JiffyBoxError> {
        let result = self
            .send(self.request(Method::POST, &format!("jiffyBoxes/{id}")).form(spec))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Lists the tariff plans, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the request or decoding fails.
    pub async fn plans(&self) -> Result<Vec<Plan>, JiffyBoxError> {
        let result = self.send(self.request(Method::GET, "plans")).await?;
        let mut plans: Vec<Plan> = map_values(result)?
            .into_iter()
            .map(|(_, plan)| plan)
            .collect();
        plans.sort_by_key(|plan| plan.id);
        Ok(plans)
    }

    /// Lists the installable distributions, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the request or decoding fails.
    pub async fn distributions(&self) -> Result<Vec<Distribution>, JiffyBoxError> {
        let result = self.send(self.request(Method::GET, "distributions")).await?;
        let bodies: Vec<(String, DistributionBody)> = map_values(result)?;
        Ok(bodies
            .into_iter()
            .map(|(key, body)| Distribution {
                key,
                name: body.name,
                min_disk_size_mb: body.min_disk_size_mb,
                default_kernel: body.default_kernel,
            })
            .collect())
    }

    /// Lists the stored backups of every box.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the request or decoding fails.
    pub async fn backups(&self) -> Result<Vec<Backup>, JiffyBoxError> {
        let result = self.send(self.request(Method::GET, "backups")).await?;
        let slots: Vec<(String, BackupSlots)> = map_values(result)?;
        let mut backups = Vec::new();
        for (key, box_slots) in slots {
            let box_id = key.parse::<u64>().map_err(|err| {
                JiffyBoxError::Decode(serde::de::Error::custom(format!(
                    "backup key {key:?} is not a box id: {err}"
                )))
            })?;
            backups.extend(box_slots.into_backups(box_id));
        }
        Ok(backups)
    }

    /// Starts a manual backup of a box.
    ///
    /// # Errors
    ///
    /// Returns a [`JiffyBoxError`] when the API rejects the request.
    pub async fn create_backup(&self, id: u64) -> Result<(), JiffyBoxError> {
        self.send(self.request(Method::POST, &format!("backups/{id}")))
            .await?;
        Ok(())
    }

    /// Lists a reference catalogue served by JiffyBox.
    ///
    /// # Errors
    ///
    /// Returns [`JiffyBoxError::Unsupported`] for DigitalOcean catalogues.
    pub async fn catalogue(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<crate::resource::ReferenceEntry>, JiffyBoxError> {
        match kind {
            ReferenceKind::Plan => Ok(self.plans().await?.into_iter().map(Into::into).collect()),
            ReferenceKind::Distribution => Ok(self
                .distributions()
                .await?
                .into_iter()
                .map(Into::into)
                .collect()),
            ReferenceKind::Region | ReferenceKind::Size | ReferenceKind::Image => {
                Err(JiffyBoxError::Unsupported(kind.as_str()))
            }
        }
    }
}

/// Extracts `result` from a response body.
fn result_of(body: &str) -> Result<Value, JiffyBoxError> {
    let mut envelope: Value = serde_json::from_str(body)?;
    let result = envelope.get_mut("result").map(Value::take);
    match result {
        Some(Value::Null | Value::Bool(false)) | None => Err(failure(&envelope)),
        Some(result) => Ok(result),
    }
}

fn failure(envelope: &Value) -> JiffyBoxError {
    let messages: Vec<&str> = envelope
        .get("messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter_map(|message| message.get("message").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    let text = if messages.is_empty() {
        String::from("request failed without a message")
    } else {
        messages.join("; ")
    };

    let lowered = text.to_lowercase();
    if lowered.contains("not found") || lowered.contains("nicht gefunden") {
        JiffyBoxError::NotFound(text)
    } else {
        JiffyBoxError::Api(text)
    }
}

/// Decodes an id-keyed object into `(key, value)` pairs. Empty collections
/// arrive as `[]`.
fn map_values<T: DeserializeOwned>(result: Value) -> Result<Vec<(String, T)>, JiffyBoxError> {
    match result {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, value)| Ok((key, serde_json::from_value(value)?)))
            .collect(),
        Value::Array(entries) if entries.is_empty() => Ok(Vec::new()),
        other => Err(JiffyBoxError::Decode(serde::de::Error::custom(format!(
            "expected an object keyed by id, got {other}"
        )))),
    }
}
