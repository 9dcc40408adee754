//! Report export to file
//!
//! An export is an asynchronous job on the Power BI side:
//!
//! ```text
//! POST .../ExportTo ──► Running ──poll──► Running ──poll──► Succeeded ──► download
//!                                    │                 │
//!                                    └──► Failed       └──► timed out
//! ```
//!
//! The poll loop sleeps a fixed interval between status requests and gives
//! up once the accumulated wait reaches the maximum. Sleeping goes through
//! [`Sleeper`] so tests can run the loop without waiting.

use super::client::{group_path, PowerBiClient};
use crate::error::{Error, Result, ResultExt};
use crate::http::ApiRequest;
use crate::params::{ParameterSource, ParameterSourceExt};
use crate::types::{is_truthy, BinaryData, JsonObject, JsonValue, OutputRecord};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Message used when a failed job carries no error of its own
const DEFAULT_FAILURE: &str = "Timeout exceeded or unknown error";

// ============================================================================
// Sleeping
// ============================================================================

/// Suspends the poll loop between status requests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Job State
// ============================================================================

/// Status reported for an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ExportStatus {
    #[default]
    Undefined,
    NotStarted,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ExportStatus {
    /// Whether polling should stop
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportStatus::Succeeded | ExportStatus::Failed)
    }
}

/// Error attached to a failed job
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportJobError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// The fields of an export job the poll loop reads
///
/// Each field parses on its own: a null or malformed field falls back to
/// its default without discarding the rest of the job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportJob {
    #[serde(deserialize_with = "or_default")]
    pub id: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub status: ExportStatus,
    #[serde(deserialize_with = "or_default")]
    pub percent_complete: f64,
    #[serde(deserialize_with = "or_default")]
    pub resource_location: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub resource_file_extension: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub report_name: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub error: Option<ExportJobError>,
}

fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl ExportJob {
    /// Read the job fields out of a status response
    ///
    /// A response that is not an object leaves every field at its default,
    /// which keeps the loop polling until the deadline.
    pub fn from_json(value: &JsonValue) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            debug!(error = %e, "Export status did not parse");
            Self::default()
        })
    }
}

/// A job that reached `Succeeded`, with the last raw status response
#[derive(Debug, Clone)]
pub struct FinishedExport {
    pub job: ExportJob,
    pub response: JsonValue,
}

// ============================================================================
// Polling
// ============================================================================

/// Polls one export job until it finishes or the wait runs out
pub struct ExportPoller<'a> {
    client: &'a PowerBiClient,
    sleeper: &'a dyn Sleeper,
    interval_secs: u64,
    max_wait_secs: u64,
}

impl<'a> ExportPoller<'a> {
    /// A zero interval is raised to one second so elapsed time always advances
    pub fn new(
        client: &'a PowerBiClient,
        sleeper: &'a dyn Sleeper,
        interval_secs: u64,
        max_wait_secs: u64,
    ) -> Self {
        Self {
            client,
            sleeper,
            interval_secs: interval_secs.max(1),
            max_wait_secs,
        }
    }

    /// Poll `status_path` starting from the submit response
    pub async fn wait(&self, status_path: &str, submitted: JsonValue) -> Result<FinishedExport> {
        let mut response = submitted;
        let mut job = ExportJob::from_json(&response);
        let mut elapsed = 0;

        while !job.status.is_terminal() && elapsed < self.max_wait_secs {
            self.sleeper
                .sleep(Duration::from_secs(self.interval_secs))
                .await;
            elapsed += self.interval_secs;

            response = self.client.request(ApiRequest::get(status_path)).await?;
            job = ExportJob::from_json(&response);
            info!(
                status = ?job.status,
                percent_complete = job.percent_complete,
                elapsed_secs = elapsed,
                "Polled export status"
            );
        }

        match job.status {
            ExportStatus::Succeeded => Ok(FinishedExport { job, response }),
            ExportStatus::Failed => {
                let message = job
                    .error
                    .and_then(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE.to_string());
                warn!(%message, "Report export failed");
                Err(Error::export_failed(message))
            }
            _ => Err(Error::ExportTimeout {
                max_wait_secs: self.max_wait_secs,
                elapsed_secs: elapsed,
                percent_complete: job.percent_complete.max(0.0) as u64,
            }),
        }
    }
}

// ============================================================================
// Request Body
// ============================================================================

/// MIME type for an exported file extension
pub fn mime_type(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some(".pdf") => "application/pdf",
        Some(".png") => "image/png",
        Some(".pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some(".xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Build the `ExportTo` body for one item
pub fn export_body(params: &dyn ParameterSource, item: usize) -> Result<JsonObject> {
    let mut body = JsonObject::new();
    body.insert("format".into(), json!(params.required_str("exportFormat", item)?));

    if params.str_or("reportType", item, "powerBI") == "powerBI" {
        let config = report_configuration(&params.object_or_empty("powerBIReportConfig", item))?;
        if !config.is_empty() {
            body.insert("powerBIReportConfiguration".into(), JsonValue::Object(config));
        }
    } else {
        let config = paginated_configuration(params, item)?;
        if !config.is_empty() {
            body.insert("paginatedReportConfiguration".into(), JsonValue::Object(config));
        }
    }
    Ok(body)
}

fn report_configuration(options: &JsonObject) -> Result<JsonObject> {
    let flag = |key: &str| options.get(key).and_then(JsonValue::as_bool) == Some(true);
    let text = |key: &str| {
        options
            .get(key)
            .filter(|v| is_truthy(v))
            .cloned()
    };
    let mut config = JsonObject::new();

    let mut settings = JsonObject::new();
    if let Some(hidden) = options.get("includeHiddenPages").filter(|v| !v.is_null()) {
        settings.insert("includeHiddenPages".into(), hidden.clone());
    }
    if let Some(locale) = text("locale") {
        settings.insert("locale".into(), locale);
    }
    if !settings.is_empty() {
        config.insert("settings".into(), JsonValue::Object(settings));
    }

    if flag("exportSpecificPages") {
        if let Some(pages) = embedded_json(options.get("pages"), "pages", "pages")? {
            config.insert("pages".into(), pages);
        }
    }
    if flag("useReportLevelFilters") {
        let filters = embedded_json(options.get("reportLevelFilters"), "reportLevelFilters", "filters")?;
        if let Some(filters) = filters {
            config.insert("reportLevelFilters".into(), filters);
        }
    }
    if flag("useDefaultBookmark") {
        let mut bookmark = JsonObject::new();
        if let Some(name) = text("defaultBookmarkName") {
            bookmark.insert("name".into(), name);
        }
        if let Some(state) = text("defaultBookmarkState") {
            bookmark.insert("state".into(), state);
        }
        if !bookmark.is_empty() {
            config.insert("defaultBookmark".into(), JsonValue::Object(bookmark));
        }
    }
    if flag("useAlternativeDataset") {
        if let Some(dataset) = text("datasetToBind") {
            config.insert("datasetToBind".into(), dataset);
        }
    }
    if flag("useIdentities") {
        if let Some(identities) = embedded_json(options.get("identities"), "identities", "identities")? {
            config.insert("identities".into(), identities);
        }
    }
    Ok(config)
}

fn paginated_configuration(params: &dyn ParameterSource, item: usize) -> Result<JsonObject> {
    let mut config = JsonObject::new();
    if let Some(locale) = params.opt_str("locale", item) {
        config.insert("locale".into(), json!(locale));
    }

    let sections = [
        ("useParameters", "parameterValues", "parameters"),
        ("useFormatSettings", "formatSettings", "format settings"),
        ("useIdentities", "identities", "identities"),
    ];
    for (toggle, name, label) in sections {
        if !params.bool_or(toggle, item, false) {
            continue;
        }
        if let Some(value) = embedded_json(params.parameter(name, item).as_ref(), name, label)? {
            config.insert(name.into(), value);
        }
    }
    Ok(config)
}

/// A JSON sub-document given inline or as a string
///
/// Blank and empty documents are `None`.
fn embedded_json(raw: Option<&JsonValue>, name: &str, label: &str) -> Result<Option<JsonValue>> {
    let value = match raw {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(JsonValue::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(JsonValue::String(s)) => serde_json::from_str(s)
            .map_err(|_| Error::invalid_param(name, format!("Invalid JSON format for {label}")))?,
        Some(other) => other.clone(),
    };
    let empty = match &value {
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    };
    Ok((!empty).then_some(value))
}

// ============================================================================
// Operation
// ============================================================================

/// Run `report:exportToFile` for one item
pub(crate) async fn export_to_file(
    client: &PowerBiClient,
    sleeper: &dyn Sleeper,
    params: &dyn ParameterSource,
    defaults: &crate::config::ExportConfig,
    item: usize,
) -> Result<OutputRecord> {
    let report_id = params.required_str("reportId", item)?;
    let group_id = params.str_or("groupId", item, "");
    let body = export_body(params, item)?;

    let submit_path = group_path(&group_id, &format!("/reports/{report_id}/ExportTo"));
    let submitted = client
        .request(ApiRequest::post(submit_path).json(JsonValue::Object(body)))
        .await
        .map_err(feature_unavailable)?;

    if !params.bool_or("waitForCompletion", item, true) {
        return Ok(OutputRecord::paired(submitted, item));
    }

    let export_id = ExportJob::from_json(&submitted)
        .id
        .ok_or_else(|| Error::export_failed("export request returned no job id"))?;
    let status_path = group_path(&group_id, &format!("/reports/{report_id}/exports/{export_id}"));

    let extra = params.object_or_empty("additionalFields", item);
    let seconds = |key: &str, default: u64| {
        extra
            .get(key)
            .and_then(JsonValue::as_f64)
            .filter(|n| *n > 0.0)
            .map_or(default, |n| n as u64)
    };
    let poller = ExportPoller::new(
        client,
        sleeper,
        seconds("pollingInterval", defaults.polling_interval_secs),
        seconds("maxWaitTime", defaults.max_wait_secs),
    );
    info!(report_id = %report_id, export_id = %export_id, "Waiting for report export");
    let finished = poller.wait(&status_path, submitted).await?;

    let location = finished.job.resource_location.clone();
    match location {
        Some(location) if params.bool_or("downloadFile", item, false) => {
            download(client, finished, &location, item).await
        }
        _ => Ok(OutputRecord::paired(finished.response, item)),
    }
}

async fn download(
    client: &PowerBiClient,
    finished: FinishedExport,
    location: &str,
    item: usize,
) -> Result<OutputRecord> {
    let path = location
        .strip_prefix(client.base_url().trim_end_matches('/'))
        .unwrap_or(location);
    let (bytes, _) = client
        .download(path)
        .await
        .context("Failed to download the exported file")?;

    let extension = finished.job.resource_file_extension.as_deref();
    let file_name = format!(
        "{}{}",
        finished.job.report_name.as_deref().unwrap_or_default(),
        extension.unwrap_or_default()
    );
    debug!(file_name = %file_name, size = bytes.len(), "Downloaded export");

    let binary = BinaryData::new(bytes.to_vec(), mime_type(extension), file_name);
    let mut json = finished.response;
    if let JsonValue::Object(map) = &mut json {
        map.insert("fileBase64".into(), json!(binary.data));
    }
    Ok(OutputRecord::paired(json, item).with_binary(binary))
}

fn feature_unavailable(error: Error) -> Error {
    match error {
        Error::Upstream { ref code, .. } if code == "FeatureNotAvailableError" => {
            Error::export_failed(format!(
                "Export feature not available for this report or format: {error}"
            ))
        }
        other => other,
    }
}
