use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use territory_analytics::address::{address_key, normalize_address};
use territory_analytics::parser::{self, parse_date};
use territory_analytics::pipeline::{spawn_analysis, AnalysisInput, AnalysisResult, EtrSmoother};
use territory_analytics::sheets::{
    parse_potential_clients, CoordinateCache, RenameOutcome, SheetsClient, DEFAULT_MAX_CONCURRENCY,
};
use territory_analytics::{xlsx, AnalysisConfig, PotentialClient};

#[derive(Parser)]
#[command(name = "territory")]
#[command(version, about = "Sales territory analytics: coverage, growth potential and churn risk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on a sales file
    Analyze {
        /// Sales file (CSV or Excel)
        #[arg(short, long)]
        input: PathBuf,

        /// Potential-client base as a local CSV or Excel file
        #[arg(long)]
        potential: Option<PathBuf>,

        /// Spreadsheet holding the potential-client base
        #[arg(long, env = "TERRITORY_SHEET_ID")]
        sheet_id: Option<String>,

        /// Range of the potential-client base (e.g. "База!A:G")
        #[arg(long, default_value = "A:G")]
        sheet_range: String,

        /// Google Sheets API key
        #[arg(long, env = "GOOGLE_SHEETS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Spreadsheet with one coordinate-cache sheet per manager
        #[arg(long, env = "TERRITORY_CACHE_SHEET_ID")]
        cache_sheet_id: Option<String>,

        /// Manager sheets to read from the cache spreadsheet
        #[arg(long, value_delimiter = ',')]
        cache_managers: Vec<String>,

        /// Directory of per-manager coordinate cache CSVs
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// JSON file with analysis settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Potential = fact * multiplier when no external potential is given
        #[arg(long)]
        multiplier: Option<f64>,

        /// Reference date for churn scoring (e.g. 2024-03-31)
        #[arg(long)]
        as_of: Option<String>,

        /// Write the full result as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the Excel report
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// Normalize addresses and print the parsed parts
    Normalize {
        /// Free-text addresses
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Show how the columns of a sales file are mapped
    Inspect {
        /// Sales file (CSV or Excel)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Store coordinates for an address in the local cache
    CacheSet {
        #[arg(long)]
        cache_dir: PathBuf,
        #[arg(long)]
        manager: String,
        #[arg(long)]
        address: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Change a cached address, keeping the old one in the history column
    CacheRename {
        #[arg(long)]
        cache_dir: PathBuf,
        #[arg(long)]
        manager: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Soft-delete a cached coordinate
    CacheDelete {
        #[arg(long)]
        cache_dir: PathBuf,
        #[arg(long)]
        manager: String,
        #[arg(long)]
        address: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            potential,
            sheet_id,
            sheet_range,
            api_key,
            cache_sheet_id,
            cache_managers,
            cache_dir,
            config,
            multiplier,
            as_of,
            json,
            xlsx,
        } => {
            let mut settings = match config {
                Some(path) => AnalysisConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => AnalysisConfig::default(),
            };
            if let Some(m) = multiplier {
                settings = settings.with_multiplier(m);
            }
            if let Some(text) = as_of {
                let date = parse_date(&text)
                    .with_context(|| format!("Invalid --as-of date: {}", text))?;
                settings = settings.with_as_of(date);
            }

            let sheets = match &api_key {
                Some(key) => Some(SheetsClient::new(key.as_str())?),
                None => None,
            };

            let mut analysis = AnalysisInput::from_file(&input);
            analysis = analysis.with_potential(load_potential(
                potential.as_deref(),
                sheet_id.as_deref(),
                &sheet_range,
                sheets.as_ref(),
            )?);
            if let Some(cache) = load_cache(
                cache_dir.as_deref(),
                cache_sheet_id.as_deref(),
                &cache_managers,
                sheets.as_ref(),
            )? {
                analysis = analysis.with_cache(cache);
            }

            let result = analyze(analysis, settings)?;
            report(&result, json.as_deref(), xlsx.as_deref())?;
        }
        Commands::Normalize { addresses } => {
            for address in &addresses {
                let output = serde_json::json!({
                    "input": address,
                    "key": address_key(address),
                    "parsed": normalize_address(address),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Commands::Inspect { input } => {
            inspect(&input)?;
        }
        Commands::CacheSet {
            cache_dir,
            manager,
            address,
            lat,
            lon,
        } => {
            let mut cache = CoordinateCache::load_dir(&cache_dir)?;
            cache.upsert(&manager, &address, lat, lon, now());
            cache.save_dir(&cache_dir)?;
            println!("Saved {} ({}, {}) for {}", address, lat, lon, manager);
        }
        Commands::CacheRename {
            cache_dir,
            manager,
            from,
            to,
        } => {
            let mut cache = CoordinateCache::load_dir(&cache_dir)?;
            match cache.rename_address(&manager, &from, &to, now()) {
                RenameOutcome::Renamed => {}
                RenameOutcome::NotFound => {
                    bail!("No cached address '{}' for {}", from, manager)
                }
                RenameOutcome::TargetExists => bail!(
                    "'{}' is already cached for {}; delete it first to keep its history",
                    to,
                    manager
                ),
            }
            cache.save_dir(&cache_dir)?;
            println!("Renamed '{}' to '{}'", from, to);
        }
        Commands::CacheDelete {
            cache_dir,
            manager,
            address,
        } => {
            let mut cache = CoordinateCache::load_dir(&cache_dir)?;
            if !cache.soft_delete(&manager, &address, now()) {
                bail!("No cached address '{}' for {}", address, manager);
            }
            cache.save_dir(&cache_dir)?;
            println!("Marked '{}' deleted", address);
        }
    }

    Ok(())
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn load_potential(
    file: Option<&Path>,
    sheet_id: Option<&str>,
    range: &str,
    sheets: Option<&SheetsClient>,
) -> Result<Vec<PotentialClient>> {
    if let Some(path) = file {
        let cells = parser::read_cells(path)
            .with_context(|| format!("Failed to read potential base {}", path.display()))?;
        let clients = parse_potential_clients(&cells)?;
        println!("Loaded {} potential clients from {}", clients.len(), path.display());
        return Ok(clients);
    }

    match (sheet_id, sheets) {
        (Some(id), Some(client)) => {
            let clients = client
                .fetch_potential_clients(id, range)
                .context("Failed to fetch potential base from Google Sheets")?;
            println!("Loaded {} potential clients from sheet {}", clients.len(), id);
            Ok(clients)
        }
        (Some(_), None) => bail!("--sheet-id needs --api-key"),
        _ => Ok(Vec::new()),
    }
}

fn load_cache(
    dir: Option<&Path>,
    sheet_id: Option<&str>,
    managers: &[String],
    sheets: Option<&SheetsClient>,
) -> Result<Option<CoordinateCache>> {
    if let Some(dir) = dir {
        let cache = CoordinateCache::load_dir(dir)
            .with_context(|| format!("Failed to read cache directory {}", dir.display()))?;
        println!("Loaded {} cached coordinates", cache.len());
        return Ok(Some(cache));
    }

    match (sheet_id, sheets) {
        (Some(id), Some(client)) if !managers.is_empty() => {
            let cache = client
                .fetch_coordinate_cache(id, managers, DEFAULT_MAX_CONCURRENCY)
                .context("Failed to fetch coordinate cache from Google Sheets")?;
            println!("Loaded {} cached coordinates from {} sheets", cache.len(), managers.len());
            Ok(Some(cache))
        }
        (Some(_), Some(_)) => bail!("--cache-sheet-id needs --cache-managers"),
        (Some(_), None) => bail!("--cache-sheet-id needs --api-key"),
        _ => Ok(None),
    }
}

/// Run the analysis in the background with a progress line on stderr
fn analyze(input: AnalysisInput, config: AnalysisConfig) -> Result<AnalysisResult> {
    let start = Instant::now();
    let mut smoother = EtrSmoother::new();

    let handle = spawn_analysis(input, config)?;
    let result = handle.wait(|progress| {
        let (next, remaining) = smoother.update(start.elapsed(), progress.fraction);
        smoother = next;
        let etr = remaining
            .map(|d| format!("~{:.1}s left", d.as_secs_f64()))
            .unwrap_or_default();
        eprint!(
            "\r[{:>3.0}%] {:<20} {:<16}",
            progress.fraction * 100.0,
            progress.stage,
            etr
        );
    });
    eprintln!(); // New line after progress

    let result = result.context("Analysis failed")?;
    eprintln!("Finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(result)
}

fn report(result: &AnalysisResult, json: Option<&Path>, xlsx_path: Option<&Path>) -> Result<()> {
    let totals = &result.totals;
    println!("Clients:            {}", totals.client_count);
    println!("Unidentified rows:  {}", totals.unidentified_count);
    println!("Dropped rows:       {}", totals.dropped_rows);
    println!("Fact:               {:.2}", totals.fact);
    println!("Potential:          {:.2}", totals.potential);
    println!("Growth potential:   {:.2}", totals.growth_potential);
    if totals.potential_count > 0 {
        println!(
            "Coverage:           {:.1}% ({} of {} potential clients covered)",
            totals.coverage_pct, totals.covered_count, totals.potential_count
        );
    }
    println!("Churn risks:        {}", result.churn.len());
    if !result.ambiguous.is_empty() {
        println!("Ambiguous addresses: {}", result.ambiguous.len());
    }
    if !result.unresolved.is_empty() {
        println!("Unresolved regions: {}", result.unresolved.len());
    }

    if let Some(path) = json {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), result)?;
        println!("Wrote JSON: {}", path.display());
    }

    if let Some(path) = xlsx_path {
        xlsx::write_report_to_xlsx(result, path).context("Failed to write Excel file")?;
        println!("Wrote Excel report: {}", path.display());
    }

    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let parsed = parser::parse_file(input)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Column mapping:");
    for (field, header) in parsed.columns.describe() {
        println!("  {:<14} {}", field.name(), header.unwrap_or("-"));
    }
    println!("Rows: {}", parsed.rows.len());
    println!("Dropped (bad volume): {}", parsed.dropped);

    let managers: std::collections::BTreeSet<&str> =
        parsed.rows.iter().map(|r| r.manager.as_str()).collect();
    println!("Managers: {}", managers.len());

    Ok(())
}
