//! Batch requests: one HTTP call bundling several resource fetches.
//!
//! The server demultiplexes the bundle and answers with an array of
//! independent sub-responses, each free to succeed or fail on its own. The
//! orchestrator maps every sub-response back to its logical resource name
//! and defers sub-errors until the caller actually reads that entry, so one
//! unreachable resource never hides the others.

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use smartcar_core::{
    apply_aliases, build_response, classify, Headers, SmartcarApiError, StructuredValue,
    REQUEST_ID_HEADER,
};

use crate::client::Vehicle;
use crate::error::{Result, SmartcarError};
use crate::registry;

/// Demultiplexed batch outcome: one entry per requested path, keyed by the
/// logical resource name.
///
/// Entries hold either the normalized (and aliased) response or the
/// classified sub-error. [`BatchResult::get`] surfaces a stored error at
/// access time; iteration never fails.
#[derive(Debug)]
pub struct BatchResult {
    entries: Vec<(String, std::result::Result<StructuredValue, SmartcarApiError>)>,
}

impl BatchResult {
    /// Read one entry. A successful sub-response returns its normalized
    /// value; a failed one raises its [`SmartcarApiError`] here, not at
    /// batch-assembly time.
    pub fn get(&self, name: &str) -> Result<&StructuredValue> {
        match self.entries.iter().find(|(entry, _)| entry == name) {
            Some((_, Ok(value))) => Ok(value),
            Some((_, Err(error))) => Err(error.clone().into()),
            None => Err(SmartcarError::InvalidParameterValue(format!(
                "No batch entry for attribute: {name}"
            ))),
        }
    }

    /// Logical names in response order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// All entries, successes and failures alike.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&str, std::result::Result<&StructuredValue, &SmartcarApiError>)>
    {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Vehicle {
    /// Fetch several resources in one request.
    ///
    /// `paths` are resource paths relative to the vehicle, e.g.
    /// `["/odometer", "/location"]` (the leading slash is optional). Every
    /// path must name a batch-eligible registry entry; unknown or
    /// ineligible paths fail the whole call before anything is sent, with
    /// one error naming all of them. An error on the outer request itself
    /// is raised directly; errors inside an otherwise successful batch are
    /// stored per entry and deferred to [`BatchResult::get`].
    #[instrument(skip(self))]
    pub async fn batch(&self, paths: &[&str]) -> Result<BatchResult> {
        let mut unsupported = Vec::new();
        let mut requested = Vec::new();
        for &raw in paths {
            let path = if raw.starts_with('/') {
                raw.to_string()
            } else {
                format!("/{raw}")
            };
            let name = registry::path_to_name(&path);
            match registry::lookup(&name) {
                Some(spec) if spec.batch_eligible => requested.push(path),
                _ => unsupported.push(path.trim_start_matches('/').to_string()),
            }
        }
        if !unsupported.is_empty() {
            return Err(SmartcarError::InvalidParameterValue(format!(
                "Unsupported attribute(s) requested in batch - {}",
                unsupported.join(",")
            )));
        }

        let request_body = json!({
            "requests": requested
                .iter()
                .map(|path| json!({ "path": path }))
                .collect::<Vec<_>>()
        });
        let path = format!("/vehicles/{}/batch", self.id());
        // Flags apply to the batch call like any other resource call.
        let query = self.flags_query();
        let (body, headers) = self
            .send(Method::POST, &path, &query, Some(&request_body), &[], None)
            .await?;
        demux(body, &headers)
    }
}

/// Split a combined batch body into per-resource entries.
pub(crate) fn demux(body: Value, outer_headers: &Headers) -> Result<BatchResult> {
    let outer_request_id = outer_headers.get(REQUEST_ID_HEADER).map(str::to_string);
    let responses = match body.get("responses").and_then(Value::as_array) {
        Some(responses) => responses.clone(),
        None => {
            return Err(SmartcarApiError::sdk(
                200,
                "Batch response is missing the responses array",
                outer_request_id,
            )
            .into())
        }
    };

    let mut entries = Vec::with_capacity(responses.len());
    for item in responses {
        let Some(path) = item.get("path").and_then(Value::as_str) else {
            debug!("skipping batch item without a path");
            continue;
        };
        let name = registry::path_to_name(path);
        let code = item.get("code").and_then(Value::as_u64).unwrap_or(500) as u16;
        // Item headers take precedence over the outer response's headers.
        let item_headers = item
            .get("headers")
            .map(Headers::from_json_object)
            .unwrap_or_default();
        let headers = outer_headers.merged_with(&item_headers);
        let item_body = item.get("body").cloned().unwrap_or(Value::Null);

        let entry = match classify(code, &item_body.to_string(), &headers) {
            None => Ok(apply_aliases(
                build_response(item_body, &headers),
                registry::aliases_for(&name),
            )),
            Some(error) => Err(error),
        };
        entries.push((name, entry));
    }
    Ok(BatchResult { entries })
}
