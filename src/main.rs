use anyhow::{Context, Result};
use chartspec::{
    assemble_chart, compile_scene, render_scene, ChartConfig, OutputFormat, PipelineOptions,
    QueryResult, RenderOptions,
};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emit {
    /// Renderer-ready chart description
    Json,
    Png,
    Svg,
}

#[derive(Parser, Debug)]
#[command(name = "chartspec")]
#[command(about = "Turn a query result and a saved chart configuration into a chart", long_about = None)]
struct Args {
    /// Chart configuration JSON (selectedFields, chartType, axisLabels, ...)
    #[arg(short, long)]
    config: PathBuf,

    /// Query result file; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Treat the input as CSV instead of JSON
    #[arg(long)]
    csv: bool,

    #[arg(short, long, value_enum, default_value = "json")]
    emit: Emit,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Output file; writes stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Max/min series ratio above which bars get independent scales
    #[arg(long, default_value_t = 20.0)]
    scale_ratio: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chartspec=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config_text = fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read config {}", args.config.display()))?;
    let config = ChartConfig::from_json_str(&config_text)?;

    let raw = match &args.input {
        Some(path) => fs::read(path).with_context(|| format!("Failed to read input {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read query result from stdin")?;
            buf
        }
    };

    let result = if args.csv {
        QueryResult::from_csv(raw.as_slice()).context("Failed to parse CSV input")?
    } else {
        let text = String::from_utf8(raw).context("Query result is not valid UTF-8")?;
        QueryResult::from_json_str(&text)?
    };
    tracing::debug!(rows = result.rows.len(), columns = result.columns.len(), "loaded query result");

    let pipeline = PipelineOptions {
        separate_scale_ratio: args.scale_ratio,
        ..Default::default()
    };
    let output = assemble_chart(&result, &config, &pipeline);
    if let Some(output) = &output {
        tracing::debug!(chart_type = ?output.chart_type(), "assembled chart");
    }

    let bytes = match args.emit {
        Emit::Json => {
            let mut json = serde_json::to_vec_pretty(&output).context("Failed to serialize chart")?;
            json.push(b'\n');
            json
        }
        Emit::Png | Emit::Svg => {
            let Some(output) = output else {
                tracing::warn!("no fields selected; nothing to render");
                return Ok(());
            };
            let options = RenderOptions {
                width: args.width,
                height: args.height,
                format: if matches!(args.emit, Emit::Svg) { OutputFormat::Svg } else { OutputFormat::Png },
            };
            let scene = compile_scene(&output, &options);
            render_scene(&scene, &options).context("Failed to render chart")?
        }
    };

    match &args.output {
        Some(path) => fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
