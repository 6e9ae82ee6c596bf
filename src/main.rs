// ==========================================
// 服务关系提取引擎 - 命令行入口
// ==========================================
// 用法: service-relations <账簿> [--from dd/mm/yyyy] [--to dd/mm/yyyy]
//       [--config config.json] [--output out.csv|out.json] [--format csv|json]
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use service_relations::config::ExtractionConfig;
use service_relations::engine::{TracingSink, WorkbookExtractor};
use service_relations::logging;
use service_relations::report::{self, ExportFormat};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "service-relations",
    version,
    about = "Extrae la relación de servicios pagados en efectivo de un libro Excel"
)]
struct Cli {
    /// Libro de servicios (.xlsx, .xls, .ods, .csv)
    input: PathBuf,

    /// Fecha inicial, día primero (por defecto: primer día del mes actual)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Fecha final, día primero (por defecto: hoy)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Archivo de configuración JSON
    #[arg(short, long, env = "SERVICE_RELATIONS_CONFIG")]
    config: Option<PathBuf>,

    /// Archivo de salida (por defecto: CSV en la salida estándar)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Formato de salida (por defecto: según la extensión de --output)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Registros de diagnóstico en JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    report::parse_day_first(value).ok_or_else(|| format!("fecha inválida: '{}'", value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let config = ExtractionConfig::load(cli.config.as_deref())
        .context("no se pudo cargar la configuración")?;

    let (default_from, default_to) = report::default_range(Local::now().date_naive());
    let start_date = cli.from.unwrap_or(default_from);
    let end_date = cli.to.unwrap_or(default_to);
    if start_date > end_date {
        bail!(
            "la fecha inicial ({}) es posterior a la fecha final ({})",
            report::long_date(start_date),
            report::long_date(end_date)
        );
    }

    info!(
        "{} {} - Relación de servicios: {} al {}",
        service_relations::APP_NAME,
        service_relations::VERSION,
        report::long_date(start_date),
        report::long_date(end_date)
    );

    let extractor = WorkbookExtractor::new(config);
    let run = extractor.run(&cli.input, start_date, end_date, &TracingSink);
    let table = run.table;

    let totals = table.totals();
    info!(
        records = table.len(),
        skipped_sheets = run.skipped.len(),
        combined_value = totals.combined_value,
        subtotal = totals.subtotal,
        tax = totals.tax,
        total_company = totals.total_company,
        "Totales {}",
        report::month_year(start_date)
    );

    match cli.output {
        Some(path) => {
            let format = cli
                .format
                .map(ExportFormat::from)
                .unwrap_or_else(|| ExportFormat::from_path(&path));
            report::export_to_path(&table, &path, format)
                .with_context(|| format!("no se pudo escribir {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout().lock();
            match cli.format.map(ExportFormat::from).unwrap_or(ExportFormat::Csv) {
                ExportFormat::Csv => report::write_csv(&table, stdout)?,
                ExportFormat::Json => report::write_json(&table, stdout)?,
            }
        }
    }

    Ok(())
}
