//! CLI entry point for the listing preparation pipeline.

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use listing_prep::{
    BatchOutput, BlockListKind, BlockListStore, BlockLists, DEFAULT_OUTPUT_FILE, Pipeline,
    ProcessingConfig, RawSheet, UpdateOutcome, XlsxExporter, load_shipping_table,
    load_workbook, write_csv,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Batch normalizer and pricing pipeline for reseller listing spreadsheets",
    long_about = "Consolidates marketplace export spreadsheets into a single priced upload file.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  LISTING_SHIPPING_LEGEND    Path to the shipping band table (CSV or XLSX)\n  \
                  LISTING_DATA_DIR           Directory holding the block-list CSV files\n\n\
                  EXAMPLES:\n  \
                  # Process two exports with pricing\n  \
                  listing-prep process -i week1.xlsx -i week2.csv --legend legend.xlsx\n\n  \
                  # Block a brand\n  \
                  listing-prep block add-brand \"Acme\"\n\n  \
                  # Machine-readable summary\n  \
                  listing-prep process -i week1.xlsx --json | jq .total_output_listings"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory holding blocked_brands.csv and blocked_product_ids.csv
    #[arg(long, env = "LISTING_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize, filter, price and export one or more input spreadsheets
    Process(ProcessArgs),

    /// Inspect and edit the block lists
    #[command(subcommand)]
    Block(BlockCommand),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input spreadsheets (CSV, XLSX, XLS, ODS); repeat for several files
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Shipping band table; pricing is disabled when absent
    #[arg(long, env = "LISTING_SHIPPING_LEGEND")]
    legend: Option<PathBuf>,

    /// Output workbook
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Also write the table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Skip block-list filtering
    #[arg(long)]
    no_blocklist: bool,

    /// Keep exact duplicate rows
    #[arg(long)]
    keep_duplicates: bool,

    /// Handling cost added before markup
    #[arg(long, default_value = "0.75")]
    handling_cost: f64,

    /// Retail markup multiplier
    #[arg(long, default_value = "1.35")]
    retail_markup: f64,

    /// Max price markup multiplier applied to the retail price
    #[arg(long, default_value = "1.35")]
    max_price_markup: f64,

    /// Reject shipping tables with gaps between bands
    #[arg(long)]
    strict_bands: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the batch summary.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum BlockCommand {
    /// Print a block list
    List {
        #[arg(value_enum)]
        kind: CliListKind,
    },

    /// Block a brand
    AddBrand { brand: String },

    /// Block a product ID (matched against SKU)
    AddId {
        product_id: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Merge brands from a spreadsheet with a "Blocked Brands" column
    ImportBrands { file: PathBuf },

    /// Merge IDs from a spreadsheet with a "Blocked Product IDs" column
    ImportIds { file: PathBuf },

    /// Export a block list as a formatted workbook
    Export {
        #[arg(value_enum)]
        kind: CliListKind,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// CLI-compatible block list selector
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliListKind {
    Brands,
    Ids,
}

impl From<CliListKind> for BlockListKind {
    fn from(cli: CliListKind) -> Self {
        match cli {
            CliListKind::Brands => BlockListKind::Brands,
            CliListKind::Ids => BlockListKind::ProductIds,
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed arguments
    dotenv().ok();

    let cli = Cli::parse();

    let json = matches!(&cli.command, Command::Process(args) if args.json);
    init_logging(&cli.log_level, cli.quiet, json);

    match &cli.command {
        Command::Process(args) => run_process(&cli, args),
        Command::Block(command) => run_block(&cli, command),
    }
}

fn run_process(cli: &Cli, args: &ProcessArgs) -> Result<()> {
    for input in &args.input {
        if !input.exists() {
            return Err(anyhow!("Input file not found: {}", input.display()));
        }
    }

    let config = ProcessingConfig::builder()
        .handling_cost(args.handling_cost)
        .retail_markup(args.retail_markup)
        .max_price_markup(args.max_price_markup)
        .remove_duplicates(!args.keep_duplicates)
        .allow_band_gaps(!args.strict_bands)
        .build()?;

    let shipping = match &args.legend {
        Some(path) => load_shipping_table(path, config.allow_band_gaps)?,
        None => {
            warn!("No shipping legend configured; pricing columns will be omitted");
            None
        }
    };

    let block_lists = if args.no_blocklist {
        info!("Block-list filtering disabled");
        BlockLists::default()
    } else {
        BlockListStore::open(&cli.data_dir)?.block_lists()?
    };

    let mut sheets: Vec<RawSheet> = Vec::new();
    for input in &args.input {
        info!("Loading {}", input.display());
        let loaded = load_workbook(input)?;
        debug!("{} sheet(s) in {}", loaded.len(), input.display());
        sheets.extend(loaded);
    }

    let pipeline = Pipeline::builder()
        .config(config.clone())
        .shipping_table(shipping.clone())
        .block_lists(block_lists)
        .on_progress(|update| debug!("[{:>3.0}%] {}", update.progress * 100.0, update.message))
        .build()?;

    let output = pipeline.process(sheets)?;

    XlsxExporter::new(&config, shipping.as_ref()).export(
        &output.records,
        output.has_pricing(),
        &args.output,
    )?;
    info!("Workbook written to {}", args.output.display());

    if let Some(csv_path) = &args.csv {
        write_csv(&output, csv_path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output.summary)?);
    } else if !cli.quiet {
        print_human_readable_summary(&output, &args.output);
    }

    Ok(())
}

/// Print a human-readable summary of the batch.
///
/// This is the default output when neither `--json` nor `--quiet` are specified.
fn print_human_readable_summary(output: &BatchOutput, path: &Path) {
    let summary = &output.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("BATCH COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} file(s), {} sheet(s), {} listings",
        summary.files_processed, summary.sheets_processed, summary.total_input_listings
    );
    println!(
        "Output: {} ({} listings)",
        path.display(),
        summary.total_output_listings
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!("  Duplicates removed: {}", summary.duplicates_removed);
    println!(
        "  Blocked brand items removed: {}",
        summary.blocked_brand_items_removed
    );
    println!(
        "  Blocked product IDs removed: {}",
        summary.blocked_product_ids_removed
    );
    println!(
        "  Pricing: {}",
        if summary.pricing_enabled {
            "enabled"
        } else {
            "disabled (no shipping legend)"
        }
    );
    println!();

    if summary.listings_without_weight > 0 || summary.low_price_listings > 0 {
        println!("Needs Review:");
        if summary.listings_without_weight > 0 {
            println!(
                "  {} listing(s) without weight (highlighted red, placed last)",
                summary.listings_without_weight
            );
        }
        if summary.low_price_listings > 0 {
            println!(
                "  {} listing(s) priced under the low-price threshold (highlighted orange)",
                summary.low_price_listings
            );
        }
        println!();
    }

    if !summary.rejected_sheets.is_empty() {
        println!("Skipped Sheets:");
        for rejection in &summary.rejected_sheets {
            println!("  - {}: {}", rejection.sheet, rejection.message);
        }
        println!();
    }

    println!("Generated at {}", summary.generated_at);
    println!("{}", "=".repeat(80));
}

fn run_block(cli: &Cli, command: &BlockCommand) -> Result<()> {
    let store = BlockListStore::open(&cli.data_dir)?;

    match command {
        BlockCommand::List { kind } => {
            let list = store.list((*kind).into())?;
            if list.height() == 0 {
                println!("No entries.");
            } else {
                println!("{}", list);
            }
        }
        BlockCommand::AddBrand { brand } => report_outcome(store.add_brand(brand)?),
        BlockCommand::AddId { product_id, reason } => {
            report_outcome(store.add_product_id(product_id, reason.as_deref())?)
        }
        BlockCommand::ImportBrands { file } => {
            let upload = first_sheet(file)?;
            report_outcome(store.bulk_merge_brands(&upload.frame)?)
        }
        BlockCommand::ImportIds { file } => {
            let upload = first_sheet(file)?;
            report_outcome(store.bulk_merge_product_ids(&upload.frame)?)
        }
        BlockCommand::Export { kind, output } => {
            let kind: BlockListKind = (*kind).into();
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", kind.sheet_name())));
            store.export_xlsx(kind, &path)?;
            println!("Exported to {}", path.display());
        }
    }

    Ok(())
}

fn first_sheet(path: &Path) -> Result<RawSheet> {
    load_workbook(path)?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No sheets found in {}", path.display()))
}

fn report_outcome(outcome: UpdateOutcome) {
    if outcome.applied {
        println!("{}", outcome.message);
    } else {
        eprintln!("{}", outcome.message);
    }
}
