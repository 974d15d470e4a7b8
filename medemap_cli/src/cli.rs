use std::{fs::File, io::Write, path::Path};

use anyhow::Context;
use clap::{command, Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use log::{debug, info};
use medemap::{
    error::MedemapError,
    formatters::{
        CSVFormatter, GeoJSONFormatter, GeoJSONSeqFormatter, OutputFormatter, OutputGenerator,
    },
    selection::SelectionOutcome,
    storage::FileStorage,
    views::{
        FeatureRecord, HistogramColorMode, ToRecords, ViewKind, ViewOutput, ViewParams,
    },
    Medemap, COL,
};
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{display_grid, display_selection, display_tables, TableSummary};
use crate::error::{MedemapCliError, MedemapCliResult};

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const FETCHING_DATA_STRING: &str = "Fetching indicator data";

/// The application handle every command runs against.
pub type App = Medemap<FileStorage>;

/// Defines the output formats we are able to produce data in.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    Json,
    GeoJSON,
    GeoJSONSeq,
    Csv,
}

impl OutputFormat {
    /// The record formatter for this format. JSON writes the view output as is.
    fn formatter(self) -> Option<OutputFormatter> {
        match self {
            OutputFormat::Json => None,
            OutputFormat::GeoJSON => Some(OutputFormatter::GeoJSON(GeoJSONFormatter)),
            OutputFormat::GeoJSONSeq => Some(OutputFormatter::GeoJSONSeq(GeoJSONSeqFormatter)),
            OutputFormat::Csv => Some(OutputFormatter::Csv(CSVFormatter)),
        }
    }
}

fn open_output<U: AsRef<Path>>(output_file: Option<U>) -> MedemapCliResult<Box<dyn Write>> {
    Ok(match output_file {
        Some(output_file) => {
            Box::new(File::create(output_file).context("Failed to write output")?)
        }
        None => Box::new(std::io::stdout().lock()),
    })
}

fn write_output<T, U>(
    output_generator: T,
    records: &[FeatureRecord],
    output_file: Option<U>,
) -> MedemapCliResult<()>
where
    T: OutputGenerator,
    U: AsRef<Path>,
{
    let mut writer = open_output(output_file)?;
    output_generator.save(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

fn write_json<U: AsRef<Path>>(output: &ViewOutput, output_file: Option<U>) -> MedemapCliResult<()> {
    let mut writer = open_output(output_file)?;
    serde_json::to_writer_pretty(&mut writer, output)?;
    writeln!(writer)?;
    writer.flush()?;
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

fn stop_spinner(sp: Option<Spinner>) {
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    async fn run(&self, medemap: &mut App) -> MedemapCliResult<()>;
}

/// The `tables` command lists the indicator tables and the indicators that can be selected from
/// each. Selected indicators are marked with `*`.
#[derive(Args, Debug)]
pub struct TablesCommand {
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for TablesCommand {
    async fn run(&self, medemap: &mut App) -> MedemapCliResult<()> {
        info!("Running `tables` subcommand");
        let sp = start_spinner(self.quiet, FETCHING_DATA_STRING);
        let data = medemap.data().await?;
        stop_spinner(sp);
        let mut summaries = vec![];
        for table in data.table_names() {
            summaries.push(TableSummary {
                table,
                rows: data.table(table)?.len(),
                options: medemap.selectable_options(table).await?,
            });
        }
        display_tables(&summaries, medemap.store().selection());
        Ok(())
    }
}

/// The `select` command replaces the selected indicators of one table. An empty list of columns
/// clears the table.
#[derive(Args, Debug)]
pub struct SelectCommand {
    #[arg(index = 1, help = "Indicator table, e.g. `democracy`")]
    table: String,
    #[arg(index = 2, num_args = 0.., help = "Column keys to select")]
    columns: Vec<String>,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for SelectCommand {
    async fn run(&self, medemap: &mut App) -> MedemapCliResult<()> {
        info!("Running `select` subcommand");
        let sp = start_spinner(self.quiet, FETCHING_DATA_STRING);
        let outcome = medemap.select(&self.table, &self.columns).await;
        stop_spinner(sp);
        match outcome? {
            SelectionOutcome::Accepted { .. } => {
                println!("{}", medemap.store().selection().feedback());
                Ok(())
            }
            SelectionOutcome::LimitExceeded { attempted, limit } => {
                Err(MedemapCliError::Rejected(format!(
                    "Selecting these columns would give {attempted} indicators; at most {limit} \
                     can be selected. Remove some first."
                )))
            }
        }
    }
}

/// The `selection` commands inspect and edit the persisted selection.
#[derive(Subcommand, Debug)]
pub enum SelectionCommands {
    /// Show the selected indicators
    Show,
    /// Remove one selected column
    Remove(RemoveArgs),
    /// Clear the whole selection
    Clear,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[arg(index = 1)]
    table: String,
    #[arg(index = 2)]
    column: String,
}

impl RunCommand for SelectionCommands {
    async fn run(&self, medemap: &mut App) -> MedemapCliResult<()> {
        info!("Running `selection` subcommand");
        match self {
            SelectionCommands::Show => display_selection(medemap.store().selection()),
            SelectionCommands::Remove(args) => {
                if !medemap.store_mut().remove_column(&args.table, &args.column)? {
                    return Err(MedemapCliError::Rejected(format!(
                        "{} is not selected in {}",
                        args.column, args.table
                    )));
                }
                display_selection(medemap.store().selection());
            }
            SelectionCommands::Clear => {
                medemap.store_mut().clear_selection()?;
                println!("Selection cleared.");
            }
        }
        Ok(())
    }
}

fn parse_color_range(value: &str) -> Result<(f64, f64), String> {
    let (low, high) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LOW,HIGH but got `{value}`"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid number `{s}`: {err}"))
    };
    Ok((parse(low)?, parse(high)?))
}

/// Command-line arguments that are parsed into `ViewParams`.
#[derive(Args, Debug, Clone)]
pub struct ViewParamsArgs {
    #[arg(
        long,
        default_value_t = 0.4,
        help = "Globe: offset of the bars from the capital, in degrees"
    )]
    bar_spacing: f64,
    #[arg(
        long,
        default_value_t = 10,
        help = "Histogram: number of bins, between 5 and 30"
    )]
    bins: usize,
    #[arg(
        long,
        default_value = "hue",
        value_name = "hue|thresholds",
        help = "Histogram: colour bins by lightness of one hue or by threshold category"
    )]
    color_mode: HistogramColorMode,
    #[arg(
        long,
        value_name = "LOW,HIGH",
        value_parser = parse_color_range,
        help = "Histogram: lightness range in percent used by the hue colour mode"
    )]
    color_range: Option<(f64, f64)>,
    #[arg(long, default_value_t = 210.0, help = "Histogram: hue in degrees")]
    color_hue: f64,
    #[arg(long, help = "Stacked bar: only show series with this indicator name")]
    indicator: Option<String>,
}

impl From<ViewParamsArgs> for ViewParams {
    fn from(args: ViewParamsArgs) -> Self {
        let defaults = ViewParams::default();
        Self {
            bar_spacing: args.bar_spacing,
            bin_count: args.bins,
            color_mode: args.color_mode,
            color_range: args.color_range.unwrap_or(defaults.color_range),
            color_hue: args.color_hue,
            indicator_filter: args.indicator,
        }
    }
}

/// The `view` command derives one view from the selected indicators and outputs it in a given
/// format.
#[derive(Args, Debug)]
pub struct ViewCommand {
    #[arg(
        index = 1,
        value_name = "globe|polygons|choropleth|charts|histogram|mesh|stacked_bar|correlation|pca|table"
    )]
    kind: ViewKind,
    #[arg(
        short = 'f',
        long,
        default_value = "json",
        value_name = "json|geojson|geojsonseq|csv",
        help = "Output format for the results"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<String>,
    #[command(flatten)]
    params: ViewParamsArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for ViewCommand {
    async fn run(&self, medemap: &mut App) -> MedemapCliResult<()> {
        info!("Running `view` subcommand");
        let params: ViewParams = self.params.clone().into();
        let sp = start_spinner(self.quiet, &format!("Deriving {} view", self.kind));
        let output = medemap.view(self.kind, &params).await;
        stop_spinner(sp);
        let output = output?;
        debug!("{output:#?}");
        match self.output_format.formatter() {
            Some(formatter) => {
                write_output(formatter, &output.records(), self.output_file.as_deref())?
            }
            None => write_json(&output, self.output_file.as_deref())?,
        }
        Ok(())
    }
}

/// The `table` command shows an indicator table as a grid, or exports it as CSV.
#[derive(Args, Debug)]
pub struct TableCommand {
    #[arg(index = 1, default_value = COL::BASIC_DATA)]
    table: String,
    #[arg(long, help = "Write the grid as CSV instead of displaying it")]
    csv: bool,
    #[arg(short = 'o', long, help = "Output file for the CSV export")]
    output_file: Option<String>,
    #[arg(long, help = "Show all rows even if there are a large number")]
    full: bool,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for TableCommand {
    async fn run(&self, medemap: &mut App) -> MedemapCliResult<()> {
        info!("Running `table` subcommand");
        let sp = start_spinner(self.quiet, FETCHING_DATA_STRING);
        let output = medemap.view(ViewKind::Table, &ViewParams::default()).await;
        stop_spinner(sp);
        let ViewOutput::Table(output) = output? else {
            return Err(MedemapCliError::Rejected("Expected a table view".into()));
        };
        let grid = output
            .table(&self.table)
            .ok_or_else(|| MedemapError::MissingTable(self.table.clone()))?;
        if self.csv || self.output_file.is_some() {
            let mut writer = open_output(self.output_file.as_deref())?;
            writer.write_all(grid.to_csv()?.as_bytes())?;
            writer.flush()?;
        } else {
            display_grid(grid, (!self.full).then_some(50));
        }
        Ok(())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Medemap explores media and democracy indicators across European countries.", long_about = None, name="medemap")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress bar or welcome message to stdout. Results and logs (when\n\
            `RUST_LOG` is set) will still be printed.",
        global = true
    )]
    pub quiet: bool,
}

/// Commands contains the list of subcommands avaliable for use in the CLI.
/// Each command should implmement the RunCommand trait and specify the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// List indicator tables and their selectable indicators
    Tables(TablesCommand),
    /// Select up to three indicators of a table
    Select(SelectCommand),
    /// Show or edit the current selection
    #[command(subcommand)]
    Selection(SelectionCommands),
    /// Derive a view of the selected indicators
    View(ViewCommand),
    /// Show or export an indicator table
    Table(TableCommand),
}
