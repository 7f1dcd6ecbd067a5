//! anftool: inspect analysis files and run their charts.
//!
//! Usage:
//!   anftool list <file.anf> [--json]
//!   anftool info <file.anf>
//!   anftool run <file.anf> [--chart ID|NAME]... [--show]
//!   anftool export-image <file.anf> [--format png] [--width 6] ...
//!   anftool export-data <file.anf> [--format csv] ...

use anfkit::runner::{ChartRunner, DataExportOptions, EngineConfig, ImageExportOptions, SubprocessEngine};
use anfkit::{Analysis, Chart, Folder, Item, Properties, Workspace};
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "anftool", version, about = "Analysis file tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the charts of an analysis
    List {
        file: PathBuf,
        /// Print the charts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show inputs and the folder tree
    Info { file: PathBuf },
    /// Run chart scripts
    Run {
        #[command(flatten)]
        target: RunArgs,
        /// Show each chart's figure. The interpreter gets `ANF_WANT_SHOW=1`;
        /// the default Python driver then calls `matplotlib.pyplot.show()`
        /// unless the script already did.
        #[arg(long)]
        show: bool,
    },
    /// Run charts to export images
    ExportImage {
        #[command(flatten)]
        target: RunArgs,
        /// Image format (e.g. svg, png, pdf)
        #[arg(long)]
        format: Option<String>,
        /// Target folder, relative to the analysis file
        #[arg(long)]
        folder: Option<PathBuf>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        dpi: Option<u32>,
        /// Warn instead of failing when a chart produces no file
        #[arg(long)]
        no_enforce: bool,
    },
    /// Run charts to export their data
    ExportData {
        #[command(flatten)]
        target: RunArgs,
        /// Data format (e.g. csv)
        #[arg(long)]
        format: Option<String>,
        /// Target folder, relative to the analysis file
        #[arg(long)]
        folder: Option<PathBuf>,
        /// Warn instead of failing when a chart produces no file
        #[arg(long)]
        no_enforce: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Analysis file
    file: PathBuf,
    /// Chart id or name; may be repeated (default: all charts)
    #[arg(short, long)]
    chart: Vec<String>,
    /// Workspace directory (default: searched upwards from the analysis file)
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// YAML file describing the script interpreter
    #[arg(long)]
    engine_config: Option<PathBuf>,
    /// Extra chart property as key=value; may be repeated
    #[arg(short = 'p', long = "property", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

/// Everything needed to run charts of one analysis file
struct Session {
    analysis: Analysis,
    working_dir: PathBuf,
    workspace: Workspace,
    runner: ChartRunner,
    extra: Properties,
}

fn open_session(args: &RunArgs) -> Result<Session, String> {
    let analysis = Analysis::from_anf_file(&args.file).map_err(|e| e.to_string())?;
    let working_dir = analysis_dir(&args.file)?;

    let workspace_dir = match &args.workspace {
        Some(dir) => dir.clone(),
        None => Workspace::find(Some(&working_dir))
            .or_else(|| working_dir.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| working_dir.clone()),
    };
    let workspace = Workspace::new(&workspace_dir, HashMap::new()).map_err(|e| e.to_string())?;

    let config = match &args.engine_config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };

    Ok(Session {
        analysis,
        working_dir,
        workspace,
        runner: ChartRunner::new(SubprocessEngine::new(config)),
        extra: args.properties.iter().cloned().collect(),
    })
}

/// Absolute directory of the analysis file; charts run there
fn analysis_dir(file: &Path) -> Result<PathBuf, String> {
    let canonical = file
        .canonicalize()
        .map_err(|e| format!("cannot resolve '{}': {}", file.display(), e))?;
    Ok(canonical
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(canonical))
}

/// Charts picked by `--chart` (matching id or name), or all of them.
///
/// Each chart appears once, in the order of the first selector matching it.
fn select_charts<'a>(analysis: &'a Analysis, selectors: &[String]) -> Result<Vec<&'a Chart>, String> {
    let charts = analysis.collect_charts();
    if selectors.is_empty() {
        return Ok(charts);
    }
    let mut selected: Vec<&Chart> = Vec::new();
    for selector in selectors {
        let matching: Vec<&Chart> = charts
            .iter()
            .copied()
            .filter(|c| c.id.as_str() == selector || c.name == *selector)
            .collect();
        if matching.is_empty() {
            return Err(format!("no chart with id or name '{}'", selector));
        }
        for chart in matching {
            if !selected.iter().any(|c| c.id == chart.id) {
                selected.push(chart);
            }
        }
    }
    Ok(selected)
}

fn cmd_list(file: &Path, json: bool) -> i32 {
    let analysis = match Analysis::from_anf_file(file) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let charts = analysis.collect_charts();
    if json {
        match serde_json::to_string_pretty(&charts) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }
    if charts.is_empty() {
        println!("No charts defined.");
        return 0;
    }
    println!("{:>6}  {:<10}  PATH", "ID", "TYPE");
    println!("{}", "-".repeat(60));
    for chart in charts {
        let path = analysis
            .item_path_string(&chart.id, " / ")
            .unwrap_or_else(|| chart.name.clone());
        println!("{:>6}  {:<10}  {}", chart.id, chart.chart_type, path);
    }
    0
}

fn print_folder(folder: &Folder, depth: usize) {
    for item in folder {
        let indent = "  ".repeat(depth);
        match item {
            Item::Chart(chart) => println!(
                "{}{} [{}] ({} properties)",
                indent,
                chart.name,
                chart.chart_type,
                chart.properties.len()
            ),
            Item::Folder(child) => {
                println!("{}{}/", indent, child.name);
                print_folder(child, depth + 1);
            }
        }
    }
}

fn cmd_info(file: &Path) -> i32 {
    let analysis = match Analysis::from_anf_file(file) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("Inputs:");
    for input in &analysis.inputs {
        println!("  {}", input);
    }
    println!("Charts:");
    print_folder(&analysis.root_folder, 1);
    0
}

fn cmd_run(args: &RunArgs, show: bool) -> i32 {
    let mut session = match open_session(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let charts = match select_charts(&session.analysis, &args.chart) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut failures = 0;
    for chart in charts {
        match session.runner.run(
            &session.analysis,
            chart,
            &session.working_dir,
            &session.workspace,
            &session.extra,
            show,
        ) {
            Ok(()) => println!("Ran chart '{}'", chart.name),
            Err(e) => {
                eprintln!("Error: chart '{}': {}", chart.name, e);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        1
    } else {
        0
    }
}

fn report_export(chart: &Chart, result: anfkit::RunResult<Option<PathBuf>>) -> bool {
    match result {
        Ok(Some(path)) => {
            println!("Exported '{}' to {}", chart.name, path.display());
            true
        }
        Ok(None) => true,
        Err(e) => {
            eprintln!("Error: chart '{}': {}", chart.name, e);
            false
        }
    }
}

fn cmd_export_image(args: &RunArgs, mut options: ImageExportOptions) -> i32 {
    let mut session = match open_session(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let charts = match select_charts(&session.analysis, &args.chart) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    options.extra_properties = session.extra.clone();
    let mut ok = true;
    for chart in charts {
        let result = session.runner.export_image(
            &session.analysis,
            chart,
            &session.working_dir,
            &session.workspace,
            &options,
        );
        ok &= report_export(chart, result);
    }
    if ok {
        0
    } else {
        1
    }
}

fn cmd_export_data(args: &RunArgs, mut options: DataExportOptions) -> i32 {
    let mut session = match open_session(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let charts = match select_charts(&session.analysis, &args.chart) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    options.extra_properties = session.extra.clone();
    let mut ok = true;
    for chart in charts {
        let result = session.runner.export_data(
            &session.analysis,
            chart,
            &session.working_dir,
            &session.workspace,
            &options,
        );
        ok &= report_export(chart, result);
    }
    if ok {
        0
    } else {
        1
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let code = match cli.command {
        Commands::List { file, json } => cmd_list(&file, json),
        Commands::Info { file } => cmd_info(&file),
        Commands::Run { target, show } => cmd_run(&target, show),
        Commands::ExportImage {
            target,
            format,
            folder,
            width,
            height,
            dpi,
            no_enforce,
        } => cmd_export_image(
            &target,
            ImageExportOptions {
                format,
                target_folder: folder,
                width,
                height,
                dpi,
                enforce: !no_enforce,
                ..Default::default()
            },
        ),
        Commands::ExportData {
            target,
            format,
            folder,
            no_enforce,
        } => cmd_export_data(
            &target,
            DataExportOptions {
                format,
                target_folder: folder,
                enforce: !no_enforce,
                ..Default::default()
            },
        ),
    };
    std::process::exit(code);
}
