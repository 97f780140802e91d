//! Transport for validated queries. Any failure to get a usable response is logged and degraded to
//! an empty table so that callers merging several sources can carry on with partial data.

use std::collections::HashSet;

use log::{info, warn};
use polars::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FluviewError, FluviewResult};
use crate::request::EpidataQuery;

/// Result codes of the Epidata response envelope.
pub mod result_codes {
    pub const SUCCESS: i64 = 1;
    /// Success, but the number of rows was capped by the server.
    pub const TRUNCATED: i64 = 2;
    pub const NO_RESULTS: i64 = -2;
}

#[derive(Debug, Deserialize)]
struct EpidataResponse {
    result: i64,
    #[serde(default)]
    epidata: Vec<Map<String, Value>>,
    #[serde(default)]
    message: String,
}

/// Issues `query` and decodes the `epidata` records into a `DataFrame`. Never fails: on any
/// transport failure a warning is logged and an empty table with no columns is returned.
pub async fn fetch_query(client: &Client, base_url: &str, query: &EpidataQuery) -> DataFrame {
    match try_fetch_query(client, base_url, query).await {
        Ok(df) => df,
        Err(err) => {
            warn!("{err}");
            DataFrame::empty()
        }
    }
}

async fn try_fetch_query(
    client: &Client,
    base_url: &str,
    query: &EpidataQuery,
) -> FluviewResult<DataFrame> {
    let endpoint = query.endpoint;
    let failure = |message: String| FluviewError::TransportFailure { endpoint, message };
    let url = endpoint.url(base_url);
    info!("Requesting {url} with {:?}", query.params);

    let response = client
        .get(&url)
        .query(&query.params)
        .send()
        .await
        .map_err(|e| failure(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(failure(format!("{status}. Response: {text}")));
    }
    let body: EpidataResponse = response
        .json()
        .await
        .map_err(|e| failure(format!("undecodable response body: {e}")))?;

    match body.result {
        result_codes::SUCCESS => {}
        result_codes::TRUNCATED => {
            warn!("Results from {endpoint} were truncated: {}", body.message)
        }
        result_codes::NO_RESULTS => {
            info!("No results from {endpoint}: {}", body.message);
            return Ok(DataFrame::empty());
        }
        code => return Err(failure(format!("result code {code}: {}", body.message))),
    }

    let df = records_to_df(&body.epidata).map_err(|e| failure(e.to_string()))?;
    info!("Fetched {endpoint} with shape: {:?}", df.shape());
    Ok(df)
}

/// Builds a table from a list of JSON records. Columns keep the order in which fields are first
/// seen; each column is typed by its non-null values (integer, float, boolean, otherwise string).
/// Fields missing from a record are null.
pub fn records_to_df(records: &[Map<String, Value>]) -> PolarsResult<DataFrame> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut names: Vec<&str> = vec![];
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                names.push(key.as_str());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values: Vec<Option<&Value>> = records
                .iter()
                .map(|record| record.get(name).filter(|v| !v.is_null()))
                .collect();
            values_to_series(name, &values)
        })
        .collect::<Vec<_>>();
    DataFrame::new(columns)
}

fn values_to_series(name: &str, values: &[Option<&Value>]) -> Series {
    let present = || values.iter().flatten();
    let any_present = present().next().is_some();

    if any_present && present().all(|v| v.as_i64().is_some()) {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        Series::new(name, data)
    } else if any_present && present().all(|v| v.is_number()) {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        Series::new(name, data)
    } else if any_present && present().all(|v| v.is_boolean()) {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        Series::new(name, data)
    } else {
        let data: Vec<Option<String>> = values
            .iter()
            .map(|v| {
                v.map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect();
        Series::new(name, data)
    }
}
