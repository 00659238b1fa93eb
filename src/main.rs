use clap::Parser;
use conformity::{
    cli::{Cli, Commands, InputFormat, OutputFormat, SeverityThreshold},
    config::ConformityConfig,
    document::{self, SourceFormat},
    error::ConformityError,
    evaluator::CancelToken,
    report::{self, ReportFormat},
    runner::{self, RunReport, exit},
    rules::registry::RuleRegistry,
    types::{Category, Severity},
};
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(exit::STARTUP);
        }
    }
}

async fn run(cli: Cli) -> conformity::Result<i32> {
    match cli.command {
        Commands::Check {
            inputs,
            format,
            fail_on,
            jobs,
            rules,
            categories,
            output,
            input_format,
        } => {
            handle_check(
                cli.config,
                inputs,
                format,
                fail_on,
                jobs,
                rules,
                categories,
                output,
                input_format,
            )
            .await
        }
        Commands::Rules { category } => handle_rules(category),
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_check(
    config_path: Option<PathBuf>,
    inputs: Vec<PathBuf>,
    format: OutputFormat,
    fail_on: Option<SeverityThreshold>,
    jobs: Option<usize>,
    rules: Vec<String>,
    categories: Vec<String>,
    output: Option<PathBuf>,
    input_format: InputFormat,
) -> conformity::Result<i32> {
    let mut config = match config_path {
        Some(path) => ConformityConfig::load_from_file(&path)?,
        None => ConformityConfig::load_default()?,
    };

    // Command-line flags override file configuration.
    if !rules.is_empty() {
        config.enabled_rule_ids = rules;
    }
    if !categories.is_empty() {
        config.enabled_categories = categories
            .into_iter()
            .map(|raw| Category::parse(&raw).ok_or(ConformityError::UnknownCategory(raw)))
            .collect::<Result<_, _>>()?;
    }
    if let Some(threshold) = fail_on {
        config.fail_on = severity_of(threshold);
    }
    if let Some(jobs) = jobs {
        config.concurrency = Some(jobs);
    }
    let fail_threshold = config.fail_on;

    // Ctrl-C requests cancellation; in-flight rules finish and the report
    // comes out labeled incomplete.
    let token = CancelToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; letting in-flight rules finish...");
            signal_token.cancel();
        }
    });

    let source_format = source_format_of(input_format);
    let use_stdin = inputs.is_empty() || inputs == [PathBuf::from("-")];
    let report = tokio::task::spawn_blocking(move || -> conformity::Result<RunReport> {
        let outcome = if use_stdin {
            document::load_stdin(source_format)?
        } else {
            document::load_paths(&inputs, source_format)
        };
        runner::execute(outcome, &config, token)
    })
    .await
    .map_err(|e| ConformityError::Runtime(e.to_string()))??;

    if output.is_some() {
        // No ANSI escapes inside report files.
        colored::control::set_override(false);
    }
    let rendered = report::render(&report, report_format_of(format));
    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            println!("Report saved to: {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(report.exit_code(fail_threshold))
}

fn handle_rules(category: Option<String>) -> conformity::Result<i32> {
    let filter = category
        .map(|raw| Category::parse(&raw).ok_or(ConformityError::UnknownCategory(raw)))
        .transpose()?;

    let registry = RuleRegistry::builtin()?;
    for rule in registry.iter() {
        if filter.is_some_and(|wanted| rule.category != wanted) {
            continue;
        }
        println!(
            "{:<8} {:<14} {:<8} {}{}",
            rule.id,
            rule.category.as_str(),
            rule.severity.as_str(),
            rule.description,
            if rule.is_cross_document() {
                " (cross-document)"
            } else {
                ""
            },
        );
    }
    Ok(exit::OK)
}

fn severity_of(threshold: SeverityThreshold) -> Severity {
    match threshold {
        SeverityThreshold::Info => Severity::Info,
        SeverityThreshold::Warning => Severity::Warning,
        SeverityThreshold::Error => Severity::Error,
    }
}

fn report_format_of(format: OutputFormat) -> ReportFormat {
    match format {
        OutputFormat::Human => ReportFormat::Human,
        OutputFormat::Json => ReportFormat::Json,
    }
}

fn source_format_of(format: InputFormat) -> SourceFormat {
    match format {
        InputFormat::Auto => SourceFormat::Auto,
        InputFormat::Yaml => SourceFormat::Yaml,
        InputFormat::Json => SourceFormat::Json,
    }
}
