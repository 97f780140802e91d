//! Validation and assembly of endpoint-correct queries.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::epiweek::{TimeRange, EPIWEEKS_PARAM};
use crate::error::{FluviewError, FluviewResult};
use crate::params::{ExtraArgs, ParamValue};

/// Name of the parameter carrying an API key.
pub const AUTH_PARAM: &str = "auth";

/// A logical request to one endpoint before validation. The main location parameter (`regions`
/// or `locations`) is supplied through `extra_args` like any other parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpidataRequest {
    pub endpoint: Endpoint,
    pub start_week: Option<String>,
    pub end_week: Option<String>,
    #[serde(default)]
    pub extra_args: ExtraArgs,
}

impl EpidataRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            start_week: None,
            end_week: None,
            extra_args: ExtraArgs::new(),
        }
    }

    pub fn weeks(mut self, start_week: &str, end_week: &str) -> Self {
        self.start_week = Some(start_week.to_string());
        self.end_week = Some(end_week.to_string());
        self
    }

    pub fn arg(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.extra_args.insert(name, value);
        self
    }

    /// Checks the request against the endpoint contract and serializes it into query parameters.
    ///
    /// The time range is checked first, then the main location parameter. Neither check looks at
    /// the values of the location codes.
    pub fn build(self) -> FluviewResult<EpidataQuery> {
        let EpidataRequest {
            endpoint,
            start_week,
            end_week,
            mut extra_args,
        } = self;

        let time_range = match (start_week.as_deref(), end_week.as_deref()) {
            (Some(start), Some(end)) => Some(TimeRange::parse(start, end)?),
            (None, None) if !endpoint.requires_time_range() => None,
            _ if !endpoint.requires_time_range() => {
                return Err(FluviewError::InvalidParameter(format!(
                    "{endpoint} takes both start_week and end_week or neither"
                )))
            }
            _ => return Err(FluviewError::MissingTimeRange(endpoint)),
        };

        let mut params = BTreeMap::new();
        if let Some(time_range) = time_range {
            params.insert(EPIWEEKS_PARAM.to_string(), time_range.to_param());
        }

        if let Some(main_param) = endpoint.main_param() {
            let value =
                extra_args
                    .remove(main_param)
                    .ok_or(FluviewError::MissingMainParameter {
                        parameter: main_param,
                        endpoint,
                    })?;
            params.insert(main_param.to_string(), value.to_query_value());
        }

        for (name, value) in extra_args {
            if name == EPIWEEKS_PARAM && params.contains_key(EPIWEEKS_PARAM) {
                return Err(FluviewError::InvalidParameter(format!(
                    "'{EPIWEEKS_PARAM}' conflicts with start_week/end_week"
                )));
            }
            params.insert(name, value.to_query_value());
        }

        let query = EpidataQuery { endpoint, params };
        debug!("Built query: {query:?}");
        Ok(query)
    }
}

/// A validated request: every value is already in its wire form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpidataQuery {
    pub endpoint: Endpoint,
    pub params: BTreeMap<String, String>,
}

impl EpidataQuery {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Adds the configured API key unless the caller passed one explicitly.
    pub fn with_default_auth(mut self, auth: Option<&str>) -> Self {
        if let Some(auth) = auth {
            self.params
                .entry(AUTH_PARAM.to_string())
                .or_insert_with(|| auth.to_string());
        }
        self
    }
}
