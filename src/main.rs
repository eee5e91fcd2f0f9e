use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use docfill_core::selftest::run_self_test;
use docfill_core::{ReportConfig, ReportExtras, ReportGenerator, ReportRequest, ReportSummary};
use docfill_generation::ProviderKind;
use docfill_types::Cnpj;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod prompt;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(about = "Fill Word report templates with company registry data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report from a template
    Generate(GenerateArgs),
    /// Check identifier normalisation and placeholder substitution offline
    SelfTest,
}

#[derive(Args)]
struct GenerateArgs {
    /// Template .docx file (asked for when missing)
    #[arg(long)]
    template: Option<PathBuf>,
    /// Company CNPJ, punctuation allowed (asked for when missing)
    #[arg(long)]
    cnpj: Option<String>,
    /// Link for [LINK_DRIVE]; https:// is added when no scheme is given
    #[arg(long)]
    drive: Option<String>,
    /// Display text for [LINK_DRIVE]
    #[arg(long)]
    drive_text: Option<String>,
    /// Start date, YYYY-MM-DD or dd/mm/yyyy
    #[arg(long)]
    start_date: Option<String>,
    /// Delivery date, YYYY-MM-DD or dd/mm/yyyy
    #[arg(long)]
    delivery_date: Option<String>,
    /// Client domain; also used to build [LINK_PAINEL]
    #[arg(long)]
    domain: Option<String>,
    /// Free-text description of the demand
    #[arg(long)]
    demand: Option<String>,
    /// Person responsible (defaults to the configured assignee)
    #[arg(long)]
    assignee: Option<String>,
    /// Fill [OBJETIVO_EMPRESA] with generated text
    #[arg(long)]
    use_ai: bool,
    /// Text provider: mock, hf or openai (defaults to configuration)
    #[arg(long)]
    ai_provider: Option<ProviderKind>,
    /// Output .docx file (asked for when missing)
    #[arg(long)]
    out: Option<PathBuf>,
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the resolved field mapping as JSON
    #[arg(long)]
    print_mapping: bool,
}

/// Entry point for the docfill CLI.
///
/// Loads `.env`, installs logging (`RUST_LOG`, default `docfill=info`) and runs the selected
/// command. Any error is printed with its causes and turned into a non-zero exit code.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("failed to initialise logging: {e}");
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::SelfTest => Ok(self_test()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docfill=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<ExitCode> {
    let mut config = ReportConfig::load(args.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stderr();

    let template = match args.template {
        Some(path) => path,
        None => PathBuf::from(prompt::ask_required(
            &mut input,
            &mut output,
            "Template .docx path: ",
        )?),
    };
    let raw_cnpj = match args.cnpj {
        Some(cnpj) => cnpj,
        None => prompt::ask_required(&mut input, &mut output, "Company CNPJ: ")?,
    };
    let cnpj = Cnpj::parse(&raw_cnpj).map_err(docfill_core::ReportError::from)?;
    let out = match args.out {
        Some(path) => path,
        None => {
            let default = format!("relatorio_{cnpj}.docx");
            let answer = prompt::ask(
                &mut input,
                &mut output,
                &format!("Output .docx file [{default}]: "),
            )?;
            PathBuf::from(if answer.is_empty() { default } else { answer })
        }
    };

    let objective = args
        .use_ai
        .then(|| args.ai_provider.unwrap_or(config.generation.provider));
    let request = ReportRequest {
        template,
        cnpj: raw_cnpj,
        output: out,
        extras: ReportExtras {
            drive_url: args.drive,
            drive_text: args.drive_text,
            start_date: args.start_date,
            delivery_date: args.delivery_date,
            domain: args.domain,
            demand: args.demand,
            assignee: args.assignee,
        },
        objective,
    };

    let generator = ReportGenerator::from_config(config)?;
    let today = chrono::Local::now().date_naive();
    let summary = generator
        .generate(&request, today)
        .with_context(|| format!("could not generate report for CNPJ {cnpj}"))?;

    if args.print_mapping {
        println!("{}", serde_json::to_string_pretty(&summary.mapping)?);
    }
    print_summary(&summary);
    Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &ReportSummary) {
    let substitution = &summary.substitution;
    println!("Report written to {}", summary.output.display());
    println!(
        "  {} of {} paragraphs changed, {} hyperlink(s) inserted",
        substitution.paragraphs_changed,
        substitution.paragraphs_visited,
        substitution.links_inserted
    );
    for warning in &substitution.warnings {
        println!("  warning: {warning}");
    }
}

fn self_test() -> ExitCode {
    let checks = run_self_test();
    for check in &checks {
        let status = if check.passed { "ok" } else { "FAILED" };
        println!("{status:>6}  {}: {}", check.name, check.detail);
    }
    if checks.iter().all(|check| check.passed) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
