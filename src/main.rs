use std::{fs, path::PathBuf, process};

use clap::Parser;
use ela_forensics::{
    ForensicsAnalyzer,
    analysis::ela::ElaParameters,
    error::Result,
    report::{FileTarget, ReportConfig},
};

/// Error Level Analysis of JPEG images
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CliArgs {
    /// Image to analyze
    #[arg(short, long)]
    input: PathBuf,

    /// Where the ELA image is saved
    #[arg(short, long)]
    output: PathBuf,

    /// JPEG quality used for recompression
    #[arg(short, long, default_value_t = 88, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Amplification of the error levels
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=50))]
    scale: u8,

    /// Write an HTML report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Also write the report as JSON
    #[arg(long, requires = "report")]
    json_report: Option<PathBuf>,

    /// Operator name shown in the report
    #[arg(long)]
    operator: Option<String>,

    /// Host name shown in the report
    #[arg(long)]
    host: Option<String>,
}

fn main() {
    env_logger::init();

    let args = CliArgs::parse();

    if let Err(err) = run(&args) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let params = ElaParameters::new(args.quality, args.scale)?;
    let analyzer = ForensicsAnalyzer::new(&args.input)?.with_parameters(params);

    let result = analyzer.ela()?;
    result.save(&args.output)?;

    println!("ELA image: {}", args.output.display());
    println!("  Max difference:  {}", result.max_difference);
    println!("  Mean difference: {:.3}", result.mean_difference);

    let Some(report_path) = &args.report else {
        return Ok(());
    };

    let mut config = ReportConfig::from_environment();
    if let Some(operator) = &args.operator {
        config = config.with_operator(operator);
    }
    if let Some(host) = &args.host {
        config = config.with_host(host);
    }

    let builder = analyzer.report(&args.output)?;
    let record = builder.render(&config, &mut FileTarget::new(report_path))?;
    println!("Report: {}", report_path.display());

    if let Some(json_path) = &args.json_report {
        fs::write(json_path, record.to_json()?)?;
        println!("JSON report: {}", json_path.display());
    }

    Ok(())
}
