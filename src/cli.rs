use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use metagen::{
    FileExtension, InspectionMode, LoadingMode, MetaGen, SampleOptions, TableFormat, inspect,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "metagen", version)]
#[command(about = "A tool to generate metadata for tabular data with the ability to inspect data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true, env = "METAGEN_VERBOSE")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate metadata for tabular data
    Metadata(MetadataArgs),
    /// Inspect a data set
    Inspect(InspectArgs),
    /// Extract head, tail and random sample rows of a data set
    #[command(alias = "extract")]
    Extracts(ExtractsArgs),
    /// Filter a data set with an SQL query
    Filter(FilterArgs),
}

impl Commands {
    /// How frames printed by this command are rendered.
    pub fn table_format(&self) -> TableFormat {
        match self {
            Commands::Metadata(_) => TableFormat {
                rows: 200,
                cols: Some(200),
                ..TableFormat::default()
            },
            Commands::Inspect(args) => TableFormat {
                rows: args.number_rows,
                cols: None,
                str_len: args.fmt_str_lengths,
            },
            Commands::Extracts(_) | Commands::Filter(_) => TableFormat::default(),
        }
    }
}

#[derive(Args)]
pub struct MetadataArgs {
    /// Input file path. Can be of type: .csv, .parquet, .xlsx, .json
    #[arg(short, long, env = "METAGEN_INPUT")]
    pub input: PathBuf,

    /// Output file path. Can be of type: .csv, .parquet, .xlsx, .json
    #[arg(short, long, env = "METAGEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// JSON or CSV file containing descriptions for each column
    #[arg(short, long, env = "METAGEN_DESCRIPTIONS")]
    pub descriptions: Option<PathBuf>,

    /// Whether to use lazy or eager mode
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LoadingMode::Eager, env = "METAGEN_MODE")]
    pub mode: LoadingMode,

    /// Additional output formats, e.g. '.csv,.parquet,.json'
    #[arg(long, alias = "extra_formats", env = "METAGEN_EXTRA_FORMATS")]
    pub extra_formats: Option<String>,

    /// Print the column descriptions
    #[arg(long)]
    pub show_descriptions: bool,

    /// Open a Quick Look preview of the metadata (macOS only)
    #[arg(short = 'P', long)]
    pub preview: bool,

    /// Print the columns with no description
    #[arg(long, alias = "warning_description")]
    pub warning_description: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Input file path. Can be of type: .csv, .parquet, .xlsx, .json
    #[arg(short, long, env = "METAGEN_INPUT")]
    pub input: PathBuf,

    /// Write the extract to this file instead of printing it
    #[arg(short, long, env = "METAGEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Whether to use lazy or eager mode
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LoadingMode::Lazy, env = "METAGEN_MODE")]
    pub mode: LoadingMode,

    /// Maximum number of rows to show
    #[arg(short, long, alias = "number_rows", default_value_t = 10)]
    pub number_rows: usize,

    /// Open a Quick Look preview of the extract (macOS only)
    #[arg(short = 'P', long)]
    pub preview: bool,

    /// Maximum number of characters shown for strings
    #[arg(long, default_value_t = 50)]
    pub fmt_str_lengths: usize,

    /// Take the head, the tail or a random sample of the data
    #[arg(long, value_enum, default_value_t = InspectionMode::Head)]
    pub inspection_mode: InspectionMode,

    /// Seed for the random sample inspection mode
    #[arg(long)]
    pub random_seed: Option<u64>,

    /// Allow rows to be sampled more than once
    #[arg(long)]
    pub with_replacement: bool,
}

#[derive(Args)]
pub struct ExtractsArgs {
    /// Input file path. Can be of type: .csv, .parquet, .xlsx, .json
    #[arg(short, long, env = "METAGEN_INPUT")]
    pub input: PathBuf,

    /// Output file path; each extract is written as <stem>-<mode><suffix>
    #[arg(short, long, env = "METAGEN_OUTPUT")]
    pub output: PathBuf,

    /// Whether to use lazy or eager mode
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LoadingMode::Lazy, env = "METAGEN_MODE")]
    pub mode: LoadingMode,

    /// Number of rows per extract
    #[arg(short, long, alias = "number_rows", default_value_t = 10)]
    pub number_rows: usize,

    /// Seed for the random sample extract
    #[arg(long)]
    pub random_seed: Option<u64>,

    /// Allow rows to be sampled more than once
    #[arg(long)]
    pub with_replacement: bool,

    /// Additional output formats, e.g. '.csv,.parquet,.json'
    #[arg(long, alias = "extra_formats", env = "METAGEN_EXTRA_FORMATS")]
    pub extra_formats: Option<String>,

    /// Comma separated inspection modes to skip, e.g. 'head,tail'
    #[arg(long, alias = "ignore_inspection_modes")]
    pub ignore_inspection_modes: Option<String>,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Input file path. Can be of type: .csv, .parquet, .xlsx, .json
    #[arg(short, long, env = "METAGEN_INPUT")]
    pub input: PathBuf,

    /// Table name used in the query, defaults to the input file stem
    #[arg(short, long)]
    pub table_name: Option<String>,

    /// Write the filtered data to this file instead of printing it
    #[arg(short, long, env = "METAGEN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// SQL query, or a path to a file containing it
    #[arg(short, long)]
    pub query: String,

    /// Whether to use lazy or eager mode for loading
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LoadingMode::Eager, env = "METAGEN_MODE")]
    pub mode: LoadingMode,

    /// Collect the query result eagerly
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub eager: bool,

    /// Open a Quick Look preview of the result (macOS only)
    #[arg(short = 'P', long)]
    pub preview: bool,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string())
}

/// Write to a temporary csv and open it in Quick Look.
fn preview_with<F>(input: &Path, suffix: &str, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> metagen::Result<()>,
{
    println!("Opening Quick Look Preview for file: {}", input.display());
    let dir = tempfile::tempdir()?;
    let stem = file_stem(input).replace('*', "concatenation");
    let path = dir.path().join(format!("{stem}-{suffix}.csv"));
    write(&path)?;
    inspect::quick_look_preview(&path)?;
    Ok(())
}

pub fn metadata_command(args: MetadataArgs) -> Result<()> {
    println!("Generating metadata for {}...", args.input.display());
    let metagen = MetaGen::from_path(&args.input, args.mode, args.descriptions.as_deref())
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let metadata = metagen.compute_metadata()?;

    if args.preview {
        preview_with(&args.input, "metadata", |path| {
            metagen.write_metadata(path, Some(&metadata))
        })?;
    } else if let Some(output) = &args.output {
        let mut formats = match &args.extra_formats {
            Some(formats) => FileExtension::parse_list(formats)?,
            None => Vec::new(),
        };
        let own = FileExtension::from_path(output)?;
        if !formats.contains(&own) {
            formats.push(own);
        }
        for format in formats {
            let path = output.with_extension(format.as_extension());
            metagen
                .write_metadata(&path, Some(&metadata))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "metadata written");
        }
    } else {
        println!("Metadata:");
        println!("{}", metadata.to_dataframe()?);
    }

    if args.show_descriptions {
        println!("Column descriptions:");
        for (name, description) in metadata.descriptions() {
            println!("  {name}: {description:?}");
        }
    }
    if args.warning_description {
        println!("Column without Descriptions:");
        println!("{:?}", metadata.columns_without_description());
    }
    Ok(())
}

pub fn inspect_command(args: InspectArgs) -> Result<()> {
    let mut metagen = MetaGen::from_path(&args.input, args.mode, None)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let sample = SampleOptions {
        seed: args.random_seed,
        with_replacement: args.with_replacement,
    };
    let extract = metagen.extract_data(args.inspection_mode, args.number_rows, sample)?;
    metagen.set_data(extract);

    if let Some(output) = &args.output {
        println!("Writing extract in: {}", output.display());
        metagen.write_data(output, None)?;
    } else if args.preview {
        preview_with(&args.input, "extract", |path| metagen.write_data(path, None))?;
    } else {
        println!("Inspecting file {}:", args.input.display());
        println!("{}", metagen.inspect_data()?);
    }
    Ok(())
}

pub fn extracts_command(args: ExtractsArgs) -> Result<()> {
    let metagen = MetaGen::from_path(&args.input, args.mode, None)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let ignored = match &args.ignore_inspection_modes {
        Some(modes) => InspectionMode::parse_list(Some(modes))?,
        None => Vec::new(),
    };
    let modes = InspectionMode::without(&ignored);
    let formats = match &args.extra_formats {
        Some(formats) => FileExtension::parse_list(formats)?,
        None => Vec::new(),
    };
    let sample = SampleOptions {
        seed: args.random_seed,
        with_replacement: args.with_replacement,
    };

    let written = metagen.write_extracts(&args.output, &modes, &formats, args.number_rows, sample)?;
    for path in written {
        println!("Writing extract in: {}", path.display());
    }
    Ok(())
}

pub fn filter_command(args: FilterArgs) -> Result<()> {
    let mut metagen = MetaGen::from_path(&args.input, args.mode, None)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let table_name = args
        .table_name
        .clone()
        .unwrap_or_else(|| file_stem(&args.input));
    metagen
        .filter_data(&table_name, &args.query, args.eager)
        .context("failed to run query")?;

    if let Some(output) = &args.output {
        println!("Writing filtered data in: {}", output.display());
        metagen.write_data(output, None)?;
    } else if args.preview {
        preview_with(&args.input, "filtered", |path| metagen.write_data(path, None))?;
    } else {
        println!("Filtered data:");
        println!("{}", metagen.inspect_data()?);
    }
    Ok(())
}
