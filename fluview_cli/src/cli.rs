use std::{fs::File, io::Write, path::Path};

use anyhow::Context;
use clap::{command, Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use fluview::{
    config::Config,
    endpoint::Endpoint,
    error::FluviewError,
    formatters::{CSVFormatter, JSONFormatter, OutputFormatter, OutputGenerator},
    merge::MergeRequest,
    params::{extra_args_from_pairs, ExtraArgs, ParamPair},
    request::EpidataRequest,
    Fluview,
};
use log::{debug, info};
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{display_coverage, display_endpoints};
use crate::error::FluviewCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";

/// Defines the output formats we are able to produce data in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    Csv,
    Json,
    Stdout,
}

fn write_output<U>(
    format: &OutputFormat,
    mut data: DataFrame,
    output_file: Option<U>,
) -> FluviewCliResult<()>
where
    U: AsRef<Path>,
{
    let output_generator: OutputFormatter = match format {
        OutputFormat::Csv => CSVFormatter.into(),
        OutputFormat::Json => JSONFormatter.into(),
        OutputFormat::Stdout => {
            writeln!(std::io::stdout().lock(), "{data}")?;
            return Ok(());
        }
    };
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        output_generator.save(&mut f, &mut data)?;
    } else {
        // Formatted before writing so that a closed pipe surfaces as an IO error
        let output = output_generator.format(&mut data)?;
        std::io::stdout().lock().write_all(output.as_bytes())?;
    };
    Ok(())
}

fn start_spinner(quiet: bool, message: &str) -> Option<Spinner> {
    (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            message.to_string() + RUNNING_TAIL_STRING,
        )
    })
}

fn stop_spinner(spinner: Option<Spinner>) {
    if let Some(mut s) = spinner {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    async fn run(&self, config: Config) -> FluviewCliResult<()>;
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(
        short = 'f',
        long,
        value_name = "csv|json|stdout",
        default_value = "stdout",
        help = "Output format for the results"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<String>,
}

/// The `endpoints` command lists the supported endpoints and what each of them requires.
#[derive(Args, Debug)]
pub struct EndpointsCommand;

impl RunCommand for EndpointsCommand {
    async fn run(&self, _config: Config) -> FluviewCliResult<()> {
        info!("Running `endpoints` subcommand");
        display_endpoints();
        Ok(())
    }
}

/// The `fetch` command requests a single endpoint.
#[derive(Args, Debug)]
pub struct FetchCommand {
    #[arg(index = 1, help = "Endpoint: fluview, fluview_clinical, flusurv or fluview_meta")]
    endpoint: String,
    #[arg(short, long, value_name = "YYYYWW", help = "First epiweek of the range")]
    start_week: Option<String>,
    #[arg(short, long, value_name = "YYYYWW", help = "Last epiweek of the range")]
    end_week: Option<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Regions for fluview and fluview_clinical, comma-separated"
    )]
    regions: Vec<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Locations for flusurv, comma-separated"
    )]
    locations: Vec<String>,
    #[arg(
        short = 'p',
        long = "param",
        value_name = "KEY=VALUE",
        help = "Additional parameter passed to the API (e.g. issues=202010, lag=1)"
    )]
    params: Vec<ParamPair>,
    #[command(flatten)]
    output: OutputArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl FetchCommand {
    fn request(&self) -> FluviewCliResult<EpidataRequest> {
        let mut extra_args = extra_args_from_pairs(self.params.clone())?;
        for (name, values) in [("regions", &self.regions), ("locations", &self.locations)] {
            if !values.is_empty() && extra_args.insert(name, values.clone()).is_some() {
                return Err(FluviewError::InvalidParameter(format!(
                    "parameter given more than once: {name}"
                ))
                .into());
            }
        }
        Ok(EpidataRequest {
            endpoint: Endpoint::from_name(&self.endpoint)?,
            start_week: self.start_week.clone(),
            end_week: self.end_week.clone(),
            extra_args,
        })
    }
}

impl RunCommand for FetchCommand {
    async fn run(&self, config: Config) -> FluviewCliResult<()> {
        info!("Running `fetch` subcommand");
        let request = self.request()?;
        debug!("{request:#?}");
        let fluview = Fluview::new_with_config(config)?;
        let sp = start_spinner(self.quiet, &format!("Fetching {}", request.endpoint));
        let data = fluview.fetch(request).await;
        stop_spinner(sp);
        write_output(
            &self.output.output_format,
            data?,
            self.output.output_file.as_deref(),
        )
    }
}

/// The `merge` command fetches fluview, fluview_clinical and flusurv for a set of locations and
/// outputs a single table keyed by epiweek and region.
#[derive(Args, Debug)]
pub struct MergeCommand {
    #[arg(short, long, value_name = "YYYYWW", help = "First epiweek of the range")]
    start_week: String,
    #[arg(short, long, value_name = "YYYYWW", help = "Last epiweek of the range")]
    end_week: String,
    #[arg(
        short,
        long,
        value_delimiter = ',',
        required = true,
        help = "Locations to merge, comma-separated"
    )]
    locations: Vec<String>,
    #[arg(
        short = 'p',
        long = "param",
        value_name = "KEY=VALUE",
        help = "Additional parameter passed to every endpoint (e.g. issues=202010, lag=1)"
    )]
    params: Vec<ParamPair>,
    #[command(flatten)]
    output: OutputArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl MergeCommand {
    fn request(&self) -> FluviewCliResult<MergeRequest> {
        let extra_args: ExtraArgs = extra_args_from_pairs(self.params.clone())?;
        let locations = self.locations.as_slice();
        Ok(
            MergeRequest::new(&self.start_week, &self.end_week, locations)
                .with_extra_args(extra_args),
        )
    }
}

impl RunCommand for MergeCommand {
    async fn run(&self, config: Config) -> FluviewCliResult<()> {
        info!("Running `merge` subcommand");
        let request = self.request()?;
        debug!("{request:#?}");
        let fluview = Fluview::new_with_config(config)?;
        let sp = start_spinner(self.quiet, "Fetching and merging");
        let merged = fluview.fetch_and_merge(&request).await;
        stop_spinner(sp);
        let merged = merged?;
        if !self.quiet {
            display_coverage(&merged.coverage);
        }
        write_output(
            &self.output.output_format,
            merged.data,
            self.output.output_file.as_deref(),
        )
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Fetch and merge influenza surveillance data from the Delphi Epidata API", long_about = None, name="fluview")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress or coverage to stderr. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implmement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// List the supported endpoints
    Endpoints(EndpointsCommand),
    /// Fetch a single endpoint
    Fetch(FetchCommand),
    /// Fetch fluview, fluview_clinical and flusurv and merge them by epiweek and region
    Merge(MergeCommand),
}
