//! Fan out to the outpatient and hospitalization endpoints for a set of locations and merge the
//! results into one table keyed by (`epiweek`, `region`).

use itertools::Itertools;
use log::{debug, info, warn};
use nonempty::NonEmpty;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::error::{FluviewError, FluviewResult};
use crate::locations::{to_general_code, Coverage};
use crate::params::ExtraArgs;
use crate::request::{EpidataQuery, EpidataRequest};
use crate::{Fluview, COL};

/// Parameters of a merge across `fluview`, `fluview_clinical` and `flusurv`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub start_week: String,
    pub end_week: String,
    /// Locations in the general vocabulary. Used as `regions` for the outpatient endpoints and,
    /// restricted to the covered ones, as `locations` for `flusurv`.
    pub locations: Vec<String>,
    /// Passed through to all three endpoints.
    #[serde(default)]
    pub extra_args: ExtraArgs,
}

impl MergeRequest {
    pub fn new<S: AsRef<str>>(start_week: &str, end_week: &str, locations: &[S]) -> Self {
        Self {
            start_week: start_week.to_string(),
            end_week: end_week.to_string(),
            locations: locations.iter().map(|l| l.as_ref().to_string()).collect(),
            extra_args: ExtraArgs::new(),
        }
    }

    pub fn with_extra_args(mut self, extra_args: ExtraArgs) -> Self {
        self.extra_args = extra_args;
        self
    }

    fn query(
        &self,
        endpoint: Endpoint,
        locations: &NonEmpty<String>,
    ) -> FluviewResult<EpidataQuery> {
        let mut request = EpidataRequest::new(endpoint).weeks(&self.start_week, &self.end_week);
        request.extra_args = self.extra_args.clone();
        if let Some(main_param) = endpoint.main_param() {
            request = request.arg(main_param, Vec::from(locations.clone()));
        }
        request.build()
    }

    fn check_extra_args(&self) -> FluviewResult<()> {
        let location_params = [Endpoint::Fluview, Endpoint::Flusurv]
            .iter()
            .filter_map(Endpoint::main_param)
            .filter(|param| self.extra_args.contains(param))
            .collect_vec();
        if !location_params.is_empty() {
            return Err(FluviewError::InvalidParameter(format!(
                "{} cannot be passed as extra arguments of a merge, use `locations`",
                location_params.join(", ")
            )));
        }
        Ok(())
    }
}

/// The merged table together with the coverage of the requested locations by `flusurv`.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedData {
    pub data: DataFrame,
    pub coverage: Coverage,
}

pub(crate) async fn fetch_and_merge(
    fluview: &Fluview,
    request: &MergeRequest,
) -> FluviewResult<MergedData> {
    request.check_extra_args()?;
    let coverage = Coverage::partition(request.locations.as_slice());
    let Some(locations) = NonEmpty::from_slice(request.locations.as_slice()) else {
        info!("No locations requested, returning an empty table");
        return Ok(MergedData {
            data: empty_keyed_df()?,
            coverage,
        });
    };

    // Validate all three requests before anything is sent
    let primary_query = request.query(Endpoint::Fluview, &locations)?;
    let clinical_query = request.query(Endpoint::FluviewClinical, &locations)?;
    let flusurv_query = NonEmpty::from_slice(coverage.covered.as_slice())
        .map(|covered| request.query(Endpoint::Flusurv, &covered))
        .transpose()?;

    let (primary, clinical, flusurv) = tokio::join!(
        fluview.fetch_query(&primary_query),
        fluview.fetch_query(&clinical_query),
        async {
            match &flusurv_query {
                Some(query) => fluview.fetch_query(query).await,
                None => {
                    debug!("No requested location is covered by flusurv, skipping fetch");
                    DataFrame::empty()
                }
            }
        }
    );

    coverage.report();
    let flusurv = translate_locations(flusurv)?;
    let data = merge_frames(vec![
        (Endpoint::Fluview, keyed(primary, Endpoint::Fluview)?),
        (Endpoint::FluviewClinical, keyed(clinical, Endpoint::FluviewClinical)?),
        (Endpoint::Flusurv, keyed(flusurv, Endpoint::Flusurv)?),
    ])?;
    info!("Merged table with shape: {:?}", data.shape());
    Ok(MergedData { data, coverage })
}

/// Table with only the key columns and no rows. Stands in for a source that returned nothing so
/// that joins always find their keys.
pub fn empty_keyed_df() -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new_empty(COL::EPIWEEK, &DataType::Int64),
        Series::new_empty(COL::REGION, &DataType::String),
    ])
}

/// Rewrites the flusurv `location` column into the general vocabulary and renames it to `region`.
pub fn translate_locations(mut df: DataFrame) -> PolarsResult<DataFrame> {
    if df.column(COL::LOCATION).is_err() {
        return Ok(df);
    }
    let translated: Series = df
        .column(COL::LOCATION)?
        .str()?
        .into_iter()
        .map(|code| code.map(to_general_code))
        .collect::<StringChunked>()
        .into_series()
        .with_name(COL::LOCATION);
    df.with_column(translated)?;
    df.rename(COL::LOCATION, COL::REGION)?;
    Ok(df)
}

/// Makes sure `df` carries both key columns with the types used for joining.
fn keyed(mut df: DataFrame, endpoint: Endpoint) -> PolarsResult<DataFrame> {
    let has_keys = COL::MERGE_KEYS.iter().all(|key| df.column(key).is_ok());
    if !has_keys {
        if df.width() > 0 {
            warn!(
                "Table from {endpoint} has no {} columns, ignoring it for the merge",
                COL::MERGE_KEYS.join("/")
            );
        }
        return empty_keyed_df();
    }
    let epiweek = df.column(COL::EPIWEEK)?.cast(&DataType::Int64)?;
    let region = df.column(COL::REGION)?.cast(&DataType::String)?;
    df.with_column(epiweek)?;
    df.with_column(region)?;

    let duplicates = duplicate_key_count(&df)?;
    if duplicates > 0 {
        warn!("Table from {endpoint} has {duplicates} row(s) with a repeated epiweek/region key");
    }
    Ok(df)
}

/// Number of rows whose (`epiweek`, `region`) key already appeared in an earlier row.
pub fn duplicate_key_count(df: &DataFrame) -> PolarsResult<usize> {
    let epiweeks = df.column(COL::EPIWEEK)?.i64()?;
    let regions = df.column(COL::REGION)?.str()?;
    let unique = epiweeks
        .into_iter()
        .zip(regions.into_iter())
        .unique()
        .count();
    Ok(df.height() - unique)
}

/// Left joins the sources in order onto the first one that has rows, so a single failed source
/// never empties the result. Non-key columns already present on the left get the endpoint name as
/// a suffix.
fn merge_frames(mut sources: Vec<(Endpoint, DataFrame)>) -> PolarsResult<DataFrame> {
    let base = sources
        .iter()
        .position(|(_, df)| df.height() > 0)
        .unwrap_or(0);
    if base > 0 {
        warn!(
            "No rows from {}, merging onto {} instead",
            sources[0].0, sources[base].0
        );
    }
    let (_, mut merged) = sources.remove(base);
    for (endpoint, df) in sources {
        let df = disambiguate_columns(df, &merged, &format!("_{endpoint}"))?;
        merged = merged.join(
            &df,
            COL::MERGE_KEYS,
            COL::MERGE_KEYS,
            JoinArgs::new(JoinType::Left),
        )?;
    }
    Ok(merged)
}

fn disambiguate_columns(
    mut df: DataFrame,
    other: &DataFrame,
    suffix: &str,
) -> PolarsResult<DataFrame> {
    let clashing = df
        .get_column_names()
        .into_iter()
        .filter(|name| !COL::MERGE_KEYS.iter().any(|key| key == name))
        .filter(|name| other.column(name).is_ok())
        .map(String::from)
        .collect_vec();
    for name in clashing {
        df.rename(&name, &format!("{name}{suffix}"))?;
    }
    Ok(df)
}
