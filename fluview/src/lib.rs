use log::debug;
use polars::frame::DataFrame;
use reqwest::Client;

use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::error::FluviewResult;
use crate::merge::{MergeRequest, MergedData};
use crate::params::ExtraArgs;
use crate::request::{EpidataQuery, EpidataRequest};

// Re-exports
pub use column_names as COL;

// Modules
pub mod column_names;
pub mod config;
pub mod endpoint;
pub mod epiweek;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod locations;
pub mod merge;
pub mod params;
pub mod request;

/// Client for the influenza endpoints of the Epidata API
pub struct Fluview {
    pub config: Config,
    client: Client,
}

impl Fluview {
    /// Setup the Fluview object with default configuration
    pub fn new() -> FluviewResult<Self> {
        Self::new_with_config(Config::default())
    }

    /// Setup the Fluview object with custom configuration
    pub fn new_with_config(config: Config) -> FluviewResult<Self> {
        debug!("config: {config:?}");
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Validates `request` and fetches it. Validation failures are returned as errors; transport
    /// failures give an empty table.
    pub async fn fetch(&self, request: EpidataRequest) -> FluviewResult<DataFrame> {
        let query = request.build()?;
        Ok(self.fetch_query(&query).await)
    }

    /// Same as `fetch`, starting from an endpoint name and optional epiweeks.
    pub async fn build_and_fetch(
        &self,
        endpoint: &str,
        start_week: Option<&str>,
        end_week: Option<&str>,
        extra_args: ExtraArgs,
    ) -> FluviewResult<DataFrame> {
        let request = EpidataRequest {
            endpoint: Endpoint::from_name(endpoint)?,
            start_week: start_week.map(String::from),
            end_week: end_week.map(String::from),
            extra_args,
        };
        self.fetch(request).await
    }

    /// Fetches `fluview`, `fluview_clinical` and `flusurv` for the requested locations and merges
    /// them by epiweek and region.
    pub async fn fetch_and_merge(&self, request: &MergeRequest) -> FluviewResult<MergedData> {
        merge::fetch_and_merge(self, request).await
    }

    pub(crate) async fn fetch_query(&self, query: &EpidataQuery) -> DataFrame {
        let query = query.clone().with_default_auth(self.config.auth.as_deref());
        fetch::fetch_query(&self.client, &self.config.base_url, &query).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::error::FluviewError;

    fn fluview_for(server: &MockServer, auth: Option<&str>) -> Fluview {
        Fluview::new_with_config(Config {
            base_url: server.base_url(),
            timeout_secs: Some(5),
            auth: auth.map(String::from),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn build_and_fetch_should_send_built_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/fluview/")
                    .query_param("epiweeks", "202001-202052")
                    .query_param("regions", "nat,CA")
                    .query_param("lag", "1")
                    .query_param("auth", "secret");
                then.status(200).json_body(json!({
                    "result": 1,
                    "message": "success",
                    "epidata": [{"region": "nat", "epiweek": 202001, "lag": 1, "wili": 1.2}]
                }));
            })
            .await;

        let df = fluview_for(&server, Some("secret"))
            .build_and_fetch(
                "fluview",
                Some("202001"),
                Some("202052"),
                ExtraArgs::new()
                    .with("regions", vec!["nat", "CA"])
                    .with("lag", 1_i64),
            )
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(df.shape(), (1, 4));
    }

    #[tokio::test]
    async fn metadata_should_fetch_without_time_range() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/fluview_meta/");
                then.status(200).json_body(json!({
                    "result": 1,
                    "message": "success",
                    "epidata": [{"latest_update": "2020-04-03", "latest_issue": 202013, "table_rows": 953}]
                }));
            })
            .await;

        let df = fluview_for(&server, None)
            .build_and_fetch("fluview_meta", None, None, ExtraArgs::new())
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(df.shape(), (1, 3));
    }

    #[tokio::test]
    async fn unknown_location_should_still_be_requested() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/flusurv/")
                    .query_param("locations", "XX");
                then.status(200)
                    .json_body(json!({"result": -2, "message": "no results"}));
            })
            .await;

        let df = fluview_for(&server, None)
            .build_and_fetch(
                "flusurv",
                Some("202001"),
                Some("202010"),
                ExtraArgs::new().with("locations", vec!["XX"]),
            )
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(df.shape(), (0, 0));
    }

    #[tokio::test]
    async fn validation_errors_should_not_reach_server() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200);
            })
            .await;
        let fluview = fluview_for(&server, None);

        let err = fluview
            .build_and_fetch("flu", Some("202001"), Some("202010"), ExtraArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FluviewError::InvalidEndpoint(_)));

        let err = fluview
            .build_and_fetch(
                "fluview_clinical",
                None,
                Some("202010"),
                ExtraArgs::new().with("regions", "nat"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FluviewError::MissingTimeRange(Endpoint::FluviewClinical)
        ));

        let err = fluview
            .build_and_fetch("fluview", Some("202001"), Some("202010"), ExtraArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FluviewError::MissingMainParameter {
                endpoint: Endpoint::Fluview,
                ..
            }
        ));
        let err = fluview
            .build_and_fetch("fluview_meta", Some("202001"), None, ExtraArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FluviewError::InvalidParameter(_)));
        any.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn slow_response_should_time_out_to_empty_table() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/fluview_meta/");
                then.status(200)
                    .delay(std::time::Duration::from_secs(3))
                    .json_body(json!({"result": 1, "message": "success", "epidata": [{"a": 1}]}));
            })
            .await;
        let fluview = Fluview::new_with_config(Config {
            base_url: server.base_url(),
            timeout_secs: Some(1),
            auth: None,
        })
        .unwrap();

        let df = fluview
            .build_and_fetch("fluview_meta", None, None, ExtraArgs::new())
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(df.shape(), (0, 0));
    }

    #[tokio::test]
    async fn missing_auth_should_not_be_sent() {
        let server = MockServer::start_async().await;
        let with_auth = server
            .mock_async(|when, then| {
                when.method(GET).query_param_exists("auth");
                then.status(500);
            })
            .await;
        let without_auth = server
            .mock_async(|when, then| {
                when.method(GET).path("/fluview_meta/");
                then.status(200)
                    .json_body(json!({"result": 1, "message": "success", "epidata": [{"a": 1}]}));
            })
            .await;

        let df = fluview_for(&server, None)
            .build_and_fetch("fluview_meta", None, None, ExtraArgs::new())
            .await
            .unwrap();
        with_auth.assert_hits_async(0).await;
        without_auth.assert_async().await;
        assert_eq!(df.shape(), (1, 1));
    }
}
