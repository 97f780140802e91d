//! Column names of the tables returned by the Epidata endpoints that the merge relies on. These
//! must be kept in sync with the field names in the API responses.

pub const EPIWEEK: &str = "epiweek";
pub const REGION: &str = "region";
pub const LOCATION: &str = "location";

/// Composite key shared by the outpatient and hospitalization tables once the flusurv
/// `location` column has been renamed to `region`.
pub const MERGE_KEYS: [&str; 2] = [EPIWEEK, REGION];
