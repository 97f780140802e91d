//! Location vocabularies. FluSurv-NET reports on a closed list of networks, states and city
//! catchments whose codes partly differ from the region codes used by the ILINet endpoints.

use log::warn;
use serde::{Deserialize, Serialize};

/// Every location the `flusurv` endpoint reports on.
pub const FLUSURV_LOCATIONS: &[&str] = &[
    "network_all",
    "network_eip",
    "network_ihsp",
    "CA",
    "CO",
    "CT",
    "GA",
    "IA",
    "ID",
    "MD",
    "MI",
    "MN",
    "NM",
    "NY_albany",
    "NY_rochester",
    "OH",
    "OK",
    "OR",
    "RI",
    "SD",
    "TN",
    "UT",
];

/// FluSurv-NET codes spelled differently in the general region vocabulary.
pub const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("NY_albany", "Albany_NY"),
    ("NY_rochester", "Rochester_NY"),
];

pub fn is_flusurv_location(code: &str) -> bool {
    FLUSURV_LOCATIONS.iter().any(|location| *location == code)
}

/// Translates a FluSurv-NET code into the general vocabulary. Codes without an alias are returned
/// unchanged.
pub fn to_general_code(code: &str) -> &str {
    LOCATION_ALIASES
        .iter()
        .find(|(flusurv, _)| *flusurv == code)
        .map(|(_, general)| *general)
        .unwrap_or(code)
}

/// Requested locations split by whether the hospitalization surveillance endpoint covers them.
/// Both lists keep the order of the request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub covered: Vec<String>,
    pub uncovered: Vec<String>,
}

impl Coverage {
    pub fn partition<S: AsRef<str>>(locations: &[S]) -> Self {
        let (covered, uncovered) = locations
            .iter()
            .map(|location| location.as_ref().to_string())
            .partition(|location| is_flusurv_location(location));
        Self { covered, uncovered }
    }

    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }

    /// Logs the locations without hospitalization surveillance data.
    pub fn report(&self) {
        if !self.is_complete() {
            warn!(
                "No flusurv coverage for requested location(s): {}",
                self.uncovered.join(", ")
            );
        }
    }
}
