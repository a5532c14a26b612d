//! Command-line entry point.
//!
//! ```bash
//! metric-recon 2024Q3_report.pdf 3Q24_summary.xlsx [--approach no-llm|llm] [--tolerance 0.05]
//!     [--sheet Summary] [--config recon.json] [--json]
//! ```

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use metric_recon::ingestion::{read_document_sentences, read_sheet_grid};
use metric_recon::{Approach, ComparisonRecord, Grid, MetricReconciler, ReconcileConfig, Result};

#[derive(Parser, Debug)]
#[command(name = "metric-recon")]
#[command(about = "Cross-check headline metrics between an earnings report PDF and its summary workbook")]
struct Args {
    /// Quarterly earnings report (PDF)
    pdf: PathBuf,

    /// Quarterly summary workbook (xlsx/xls/ods)
    excel: PathBuf,

    /// Extraction strategy
    #[arg(long, value_enum)]
    approach: Option<ApproachArg>,

    /// Relative tolerance, e.g. 0.05 for 5%
    #[arg(long)]
    tolerance: Option<f64>,

    /// Worksheet holding the summary table
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", env = "METRIC_RECON_CONFIG")]
    config: Option<PathBuf>,

    /// Print the comparison as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ApproachArg {
    NoLlm,
    Llm,
}

impl From<ApproachArg> for Approach {
    fn from(arg: ApproachArg) -> Self {
        match arg {
            ApproachArg::NoLlm => Approach::NoLlm,
            ApproachArg::Llm => Approach::Llm,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    info!(
        "Approach {:?}, tolerance {:.1}%, sheet '{}'",
        config.approach,
        config.tolerance * 100.0,
        config.sheet_name
    );

    let records = match config.approach {
        Approach::NoLlm => run_deterministic(&config, &args.pdf, &args.excel),
        Approach::Llm => run_llm(&config, &args.pdf, &args.excel)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render_table(&records));
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ReconcileConfig> {
    let mut config = match &args.config {
        Some(path) => ReconcileConfig::from_json_file(path)?,
        None => ReconcileConfig::default(),
    };
    if let Some(approach) = args.approach {
        config.approach = approach.into();
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(sheet) = &args.sheet {
        config.sheet_name = sheet.clone();
    }
    config.validate()?;
    Ok(config)
}

// Unreadable inputs count as empty so the other side is still reported.
fn load_sentences(pdf: &Path) -> Vec<String> {
    read_document_sentences(pdf).unwrap_or_else(|e| {
        warn!("{}", e);
        Vec::new()
    })
}

fn load_grid(config: &ReconcileConfig, excel: &Path) -> Grid {
    read_sheet_grid(excel, &config.sheet_name).unwrap_or_else(|e| {
        warn!("{}", e);
        Grid::default()
    })
}

fn run_deterministic(config: &ReconcileConfig, pdf: &Path, excel: &Path) -> Vec<ComparisonRecord> {
    let sentences = load_sentences(pdf);
    let grid = load_grid(config, excel);
    MetricReconciler::standard()
        .with_tolerance(config.tolerance)
        .run(
            &pdf.to_string_lossy(),
            &sentences,
            &excel.to_string_lossy(),
            &grid,
        )
}

#[cfg(feature = "gemini")]
fn run_llm(config: &ReconcileConfig, pdf: &Path, excel: &Path) -> Result<Vec<ComparisonRecord>> {
    use metric_recon::ingestion::read_pdf_text;
    use metric_recon::llm::{GeminiClient, LlmMetricExtractor};
    use metric_recon::{compare_values, prepare_parsed_data, resolve_period_from_path, MetricCatalog};

    let catalog = MetricCatalog::standard();
    let extractor = LlmMetricExtractor::new(GeminiClient::from_env()?, config.gemini_model.clone());

    let text = read_pdf_text(pdf).unwrap_or_else(|e| {
        warn!("{}", e);
        String::new()
    });
    let grid = load_grid(config, excel);

    let runtime = tokio::runtime::Runtime::new()?;

    // The file name wins; the model is asked only when it carries no period.
    let pdf_period = match resolve_period_from_path(pdf) {
        Some(period) => Some(period),
        None => runtime
            .block_on(extractor.extract_period(&text))
            .unwrap_or_else(|e| {
                warn!("Period extraction failed: {}", e);
                None
            }),
    };
    let excel_period = resolve_period_from_path(excel).or_else(|| pdf_period.clone());
    let raw_narrative = runtime
        .block_on(extractor.extract_narrative(&text, pdf_period.as_ref(), catalog))
        .unwrap_or_else(|e| {
            warn!("Narrative extraction failed: {}", e);
            Default::default()
        });
    let raw_tabular = runtime
        .block_on(extractor.extract_tabular(&grid, excel_period.as_ref(), catalog))
        .unwrap_or_else(|e| {
            warn!("Tabular extraction failed: {}", e);
            Default::default()
        });

    let (narrative, tabular) = prepare_parsed_data(&raw_narrative, &raw_tabular);
    Ok(compare_values(&narrative, &tabular, config.tolerance))
}

#[cfg(not(feature = "gemini"))]
fn run_llm(_config: &ReconcileConfig, _pdf: &Path, _excel: &Path) -> Result<Vec<ComparisonRecord>> {
    Err(metric_recon::ReconcileError::InvalidConfig(
        "the llm approach needs a build with the `gemini` feature".to_string(),
    ))
}

fn render_table(records: &[ComparisonRecord]) -> String {
    const MISSING: &str = "N/A";
    let headers = ["Metric", "PDF Value", "Excel Value", "Status"];

    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                r.metric.to_string(),
                r.pdf_display.clone().unwrap_or_else(|| MISSING.to_string()),
                r.excel_display.clone().unwrap_or_else(|| MISSING.to_string()),
                r.match_status.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: [&str; 4]| {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    };

    push_line(headers);
    for row in &rows {
        push_line([&row[0], &row[1], &row[2], &row[3]]);
    }
    out
}
