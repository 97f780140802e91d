//! The closed set of Epidata endpoints and the request contract of each.

use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{FluviewError, FluviewResult};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// ILINet aggregate outpatient influenza-like illness visits
    Fluview,
    /// Clinical laboratory confirmed influenza visits
    FluviewClinical,
    /// FluSurv-NET laboratory confirmed hospitalizations
    Flusurv,
    /// Metadata about the fluview table
    FluviewMeta,
}

impl Endpoint {
    /// Resolves an endpoint identifier, failing with `InvalidEndpoint` outside the closed set.
    pub fn from_name(name: &str) -> FluviewResult<Self> {
        Self::from_str(name).map_err(|_| FluviewError::InvalidEndpoint(name.to_string()))
    }

    /// Name of the parameter carrying the geographic scope of a request, if the endpoint needs one.
    pub fn main_param(&self) -> Option<&'static str> {
        match self {
            Endpoint::Fluview | Endpoint::FluviewClinical => Some("regions"),
            Endpoint::Flusurv => Some("locations"),
            Endpoint::FluviewMeta => None,
        }
    }

    pub fn requires_time_range(&self) -> bool {
        !matches!(self, Endpoint::FluviewMeta)
    }

    /// Path segment appended to the API base address.
    pub fn path(&self) -> &'static str {
        self.into()
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}/", base_url.trim_end_matches('/'), self.path())
    }

    pub fn valid_names() -> String {
        Self::iter().map(|endpoint| endpoint.to_string()).join(", ")
    }
}
