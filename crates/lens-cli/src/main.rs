mod logging;
mod wizard;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use lens_form::{FormSession, IntakeConfig, SubmitReport};
use lens_spec::{
    AnswerSet, FieldRegistry, RenderStatus, SchemaSpec, answers_schema, contact_lens, evaluate,
    render_json_ui, render_text,
};
use logging::{LogConfig, init_logging};
use serde_json::Value;
use tracing::info;
use wizard::{Verbosity, WizardPresenter, normalize_answer, print_errors};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Contact-lens intake form shell",
    long_about = "Validates answers, prints the active answer schema, and submits intake forms"
)]
struct Cli {
    /// Increase log detail on stderr (-v progress, -vv per-edit detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an answers file and print per-field errors.
    Validate {
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Field schema JSON; defaults to the built-in contact-lens form.
        #[arg(long, value_name = "SCHEMA")]
        schema: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Apply an answers file and submit it once through the configured gateway.
    Submit {
        /// Intake configuration JSON (gateway endpoint, encoding, timeouts).
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_name = "SCHEMA")]
        schema: Option<PathBuf>,
    },
    /// Prompt for each active field until the form is complete, then submit.
    Fill {
        #[arg(long, value_name = "CONFIG")]
        config: PathBuf,
        #[arg(long, value_name = "SCHEMA")]
        schema: Option<PathBuf>,
        /// Render output mode shown before each prompt.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the JSON Schema of the fields active for the given answers.
    Schema {
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        #[arg(long, value_name = "SCHEMA")]
        schema: Option<PathBuf>,
        /// Print the schema of the field-schema file format instead.
        #[arg(long, conflicts_with_all = ["answers", "schema"])]
        definition: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));
    match cli.command {
        Command::Validate {
            answers,
            schema,
            format,
        } => run_validate(&answers, schema.as_deref(), format),
        Command::Submit {
            config,
            answers,
            schema,
        } => run_submit(&config, &answers, schema.as_deref()),
        Command::Fill {
            config,
            schema,
            format,
        } => run_fill(&config, schema.as_deref(), format, cli.verbose > 0),
        Command::Schema {
            answers,
            schema,
            definition,
        } => {
            if definition {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&SchemaSpec::definition_schema())?
                );
                Ok(())
            } else {
                run_schema(answers.as_deref(), schema.as_deref())
            }
        }
    }
}

fn load_registry(path: Option<&Path>) -> CliResult<Arc<FieldRegistry>> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(Arc::new(FieldRegistry::from_json(&raw)?))
        }
        None => Ok(contact_lens()?),
    }
}

fn load_answers(path: &Path) -> CliResult<AnswerSet> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    Ok(AnswerSet::from_json(&value)?)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn run_validate(answers_path: &Path, schema: Option<&Path>, format: OutputFormat) -> CliResult<()> {
    let registry = load_registry(schema)?;
    let answers = load_answers(answers_path)?;
    let unknown: Vec<&str> = answers
        .iter()
        .map(|(name, _)| name)
        .filter(|name| !registry.contains(name))
        .collect();

    let evaluation = evaluate(&registry, &answers);
    let result = &evaluation.result;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            println!(
                "Validation result: {}",
                if result.valid { "valid" } else { "invalid" }
            );
            print_errors(result);
            if !unknown.is_empty() {
                println!("Unknown answer fields: {}", unknown.join(", "));
            }
        }
    }

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_submit(config_path: &Path, answers_path: &Path, schema: Option<&Path>) -> CliResult<()> {
    let config = IntakeConfig::load(config_path)?;
    let registry = load_registry(schema)?;
    let answers = load_answers(answers_path)?;
    let session = FormSession::from_config(registry, &config)?;
    for (field, value) in answers.iter() {
        session.apply_edit(field, value)?;
    }

    info!(endpoint = %config.gateway.endpoint, "submitting answers");
    let report = runtime()?.block_on(session.submit());
    WizardPresenter::new(Verbosity::Clean).show_report(&report);
    finish(report)
}

fn run_fill(
    config_path: &Path,
    schema: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> CliResult<()> {
    let config = IntakeConfig::load(config_path)?;
    let registry = load_registry(schema)?;
    let session = FormSession::from_config(registry, &config)?;
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose));

    loop {
        let payload = session.render();
        presenter.show_header(&payload);
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?)
            }
            OutputFormat::Text if verbose => println!("{}", render_text(&payload)),
            OutputFormat::Text => {}
        }
        presenter.show_status(&payload);

        if payload.status == RenderStatus::Complete {
            presenter.show_completion(&payload);
            break;
        }
        let name = payload
            .next_field
            .as_deref()
            .ok_or("form is incomplete but no field is pending")?;
        let field = payload
            .field(name)
            .ok_or_else(|| format!("render payload missing field '{}'", name))?;

        presenter.show_prompt(&payload, field);
        let raw = read_answer()?;
        session.apply_edit(&field.name, normalize_answer(field.kind, &raw))?;
    }

    let report = runtime()?.block_on(session.submit());
    presenter.show_report(&report);
    finish(report)
}

fn run_schema(answers: Option<&Path>, schema: Option<&Path>) -> CliResult<()> {
    let registry = load_registry(schema)?;
    let answers = match answers {
        Some(path) => load_answers(path)?,
        None => AnswerSet::new(),
    };
    let evaluation = evaluate(&registry, &answers);
    let schema = answers_schema(&registry, &answers, &evaluation.activity);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn read_answer() -> CliResult<String> {
    print!("> ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err("input closed before the form was complete".into());
    }
    let trimmed = input.trim_end_matches(['\r', '\n']);
    if trimmed.trim().eq_ignore_ascii_case("exit") {
        return Err("fill aborted by user".into());
    }
    Ok(trimmed.to_string())
}

fn finish(report: SubmitReport) -> CliResult<()> {
    match report {
        SubmitReport::Succeeded(_) => Ok(()),
        SubmitReport::Failed(failure) => Err(failure.into()),
        SubmitReport::Rejected(_) => Err("validation failed".into()),
        SubmitReport::AlreadySubmitting => Err("a submission is already in flight".into()),
    }
}
