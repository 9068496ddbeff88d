use ampli_core::{
    ProviderClient, ProviderError, ProviderOrderState, ProviderOrderStatus, RemoteService,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Client for the conventional SMM-panel API: a single endpoint taking form
/// POSTs with an `action` discriminator and the API key, answering JSON.
pub struct HttpProviderClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpProviderClient {
    pub fn new(http: reqwest::Client, api_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            http,
            api_url,
            api_key,
            timeout,
        }
    }

    async fn call(&self, params: Vec<(&'static str, String)>) -> Result<Value, ProviderError> {
        let mut form: Vec<(&'static str, String)> = vec![("key", self.api_key.clone())];
        form.extend(params);

        let response = self
            .http
            .post(&self.api_url)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::Transient(format!(
                "provider answered {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Rejected(format!(
                "provider answered {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Protocol(format!("malformed provider response: {e}")))?;

        // Panel APIs report failures as 200s with an error field.
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(ProviderError::Rejected(message.to_string()));
        }

        Ok(body)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn place_order(
        &self,
        remote_service_id: &str,
        link: &str,
        quantity: i32,
    ) -> Result<String, ProviderError> {
        let body = self
            .call(vec![
                ("action", "add".to_string()),
                ("service", remote_service_id.to_string()),
                ("link", link.to_string()),
                ("quantity", quantity.to_string()),
            ])
            .await?;

        field_as_string(&body, "order")
            .ok_or_else(|| ProviderError::Protocol("placement response carries no order id".into()))
    }

    async fn order_status(
        &self,
        provider_order_id: &str,
    ) -> Result<ProviderOrderStatus, ProviderError> {
        let body = self
            .call(vec![
                ("action", "status".to_string()),
                ("order", provider_order_id.to_string()),
            ])
            .await?;

        let raw_state = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Protocol("status response carries no status".into()))?;

        Ok(ProviderOrderStatus {
            state: parse_state(raw_state)?,
            start_count: field_as_i32(&body, "start_count"),
            remains: field_as_i32(&body, "remains"),
        })
    }

    async fn list_services(&self) -> Result<Vec<RemoteService>, ProviderError> {
        let body = self.call(vec![("action", "services".to_string())]).await?;

        let entries = body
            .as_array()
            .ok_or_else(|| ProviderError::Protocol("services response is not a list".into()))?;

        entries.iter().map(parse_remote_service).collect()
    }
}

fn classify_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        ProviderError::Transient(e.to_string())
    } else {
        ProviderError::Protocol(e.to_string())
    }
}

/// Panels are loose about numeric typing; ids and counters arrive as either
/// JSON numbers or strings.
fn field_as_string(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_as_i32(body: &Value, key: &str) -> Option<i32> {
    match body.get(key)? {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn field_as_decimal(body: &Value, key: &str) -> Option<Decimal> {
    match body.get(key)? {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn parse_state(raw: &str) -> Result<ProviderOrderState, ProviderError> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" | "queued" => Ok(ProviderOrderState::Pending),
        "in progress" | "inprogress" | "processing" => Ok(ProviderOrderState::InProgress),
        "completed" => Ok(ProviderOrderState::Completed),
        "partial" => Ok(ProviderOrderState::Partial),
        "canceled" | "cancelled" | "refunded" => Ok(ProviderOrderState::Canceled),
        other => Err(ProviderError::Protocol(format!(
            "unknown provider status '{other}'"
        ))),
    }
}

fn parse_remote_service(entry: &Value) -> Result<RemoteService, ProviderError> {
    let remote_id = field_as_string(entry, "service")
        .ok_or_else(|| ProviderError::Protocol("service entry carries no id".into()))?;
    let rate = field_as_decimal(entry, "rate")
        .ok_or_else(|| ProviderError::Protocol(format!("service {remote_id} carries no rate")))?;

    Ok(RemoteService {
        remote_id,
        name: field_as_string(entry, "name").unwrap_or_default(),
        service_type: field_as_string(entry, "type").unwrap_or_else(|| "default".into()),
        category: field_as_string(entry, "category"),
        rate,
        min: field_as_i32(entry, "min").unwrap_or(1),
        max: field_as_i32(entry, "max").unwrap_or(i32::MAX),
        description: field_as_string(entry, "description"),
    })
}
