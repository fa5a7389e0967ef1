use chrono::{DateTime, Utc};
use pubflow_config::{Config, ConfigError, ConfigManager};
use pubflow_core::{applicable_steps, validate_step, CoreError, DraftStore, Step};
use pubflow_domain::{DraftKey, DraftSnapshot, Exemption, Identity, PdfReference};
use pubflow_storage_json::JsonDraftStore;
use strsim::levenshtein;
use thiserror::Error;
use uuid::Uuid;

use super::{demo, output};
use crate::errors::SubmissionError;

const COMMANDS: [&str; 4] = ["draft", "config", "demo", "help"];
const DRAFT_ACTIONS: [&str; 4] = ["show", "check", "clear", "list"];
const CONFIG_ACTIONS: [&str; 2] = ["show", "path"];

const USAGE: &str = "\
Usage: submission_cli <command> [options]

Commands:
  draft show  [--user UUID]   Show the saved draft
  draft check [--user UUID]   Run the step validators against the saved draft
  draft clear [--user UUID]   Delete the saved draft
  draft list                  List every saved draft
  config show                 Print the effective configuration
  config path                 Print where the configuration is stored
  demo                        Run a full submission against in-memory services
  help                        Show this message

Without --user the anonymous draft is used.";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("Unknown command `{input}`{}", suggestion_hint(.suggestion))]
    UnknownCommand {
        input: String,
        suggestion: Option<String>,
    },
    #[error("Demo failed: {0}")]
    Demo(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(best) => format!(". Did you mean `{best}`?"),
        None => ". Run `submission_cli help` for usage.".into(),
    }
}

/// Closest known name within an edit distance of 3.
fn suggest(input: &str, known: &[&str]) -> Option<String> {
    let mut candidates: Vec<_> = known
        .iter()
        .map(|name| (levenshtein(name, input), *name))
        .collect();
    candidates.sort_by_key(|(distance, _)| *distance);
    candidates
        .first()
        .filter(|(distance, _)| *distance <= 3)
        .map(|(_, name)| name.to_string())
}

fn unknown(input: &str, known: &[&str]) -> CliError {
    CliError::UnknownCommand {
        input: input.to_string(),
        suggestion: suggest(&input.to_lowercase(), known),
    }
}

pub async fn run(args: Vec<String>) -> Result<(), CliError> {
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };
    match command.to_lowercase().as_str() {
        "draft" => run_draft(rest),
        "config" => run_config(rest),
        "demo" => demo::run_demo().await,
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        _ => Err(unknown(command, &COMMANDS)),
    }
}

struct Environment {
    manager: ConfigManager,
    config: Config,
}

impl Environment {
    fn load() -> Result<Self, CliError> {
        let manager = ConfigManager::from_env()?;
        let config = manager.load()?;
        Ok(Self { manager, config })
    }

    fn store(&self) -> Result<JsonDraftStore, CliError> {
        Ok(JsonDraftStore::new(self.manager.drafts_dir(&self.config))?)
    }
}

fn parse_key(args: &[String]) -> Result<DraftKey, CliError> {
    match args {
        [] => Ok(DraftKey::anonymous()),
        [flag, value] if flag == "--user" => {
            let id = Uuid::parse_str(value)
                .map_err(|_| CliError::Usage(format!("`{value}` is not a valid user id")))?;
            Ok(DraftKey::for_identity(Some(&Identity::author(id))))
        }
        _ => Err(CliError::Usage("Expected no options or `--user <UUID>`".into())),
    }
}

fn run_draft(args: &[String]) -> Result<(), CliError> {
    let Some((action, rest)) = args.split_first() else {
        return Err(CliError::Usage(
            "Usage: submission_cli draft <show|check|clear|list> [--user UUID]".into(),
        ));
    };
    let env = Environment::load()?;
    let store = env.store()?;
    match action.to_lowercase().as_str() {
        "show" => show_draft(&store, &parse_key(rest)?),
        "check" => check_draft(&env, &store, &parse_key(rest)?),
        "clear" => {
            let key = parse_key(rest)?;
            store.clear_snapshot(&key)?;
            output::success(format!("Draft `{key}` cleared."));
            Ok(())
        }
        "list" => list_drafts(&store),
        _ => Err(unknown(action, &DRAFT_ACTIONS)),
    }
}

fn load_or_report(
    store: &JsonDraftStore,
    key: &DraftKey,
) -> Result<Option<DraftSnapshot>, CliError> {
    let snapshot = store.load_snapshot(key)?;
    if snapshot.is_none() {
        output::info(format!("No saved draft for `{key}`."));
    }
    Ok(snapshot)
}

fn show_draft(store: &JsonDraftStore, key: &DraftKey) -> Result<(), CliError> {
    let Some(snapshot) = load_or_report(store, key)? else {
        return Ok(());
    };
    let draft = &snapshot.draft;
    output::section(format!("Draft `{key}`"));
    let step = Step::from_number(snapshot.step).unwrap_or(Step::FIRST);
    output::field(
        "Step",
        format!("{} of {} ({})", step.number(), Step::LAST.number(), step.label()),
    );
    output::field("Title", display_or_dash(&draft.title));
    output::field(
        "Summary",
        format!("{} characters", draft.summary.trim().chars().count()),
    );
    output::field("Domain", draft.domain);
    output::field("Type", draft.document_type);
    if draft.is_academic() && !draft.academic_info.is_blank() {
        let info = &draft.academic_info;
        output::field(
            "Academic",
            format!(
                "{} / {} / {} / {}",
                display_or_dash(&info.student_name),
                display_or_dash(&info.institution),
                display_or_dash(&info.year),
                display_or_dash(&info.supervisor)
            ),
        );
    }
    let document = match &draft.pdf_reference {
        PdfReference::Empty => "-".to_string(),
        PdfReference::Local(file) => format!(
            "local file `{}` ({})",
            file.file_name,
            human_size(file.size_bytes)
        ),
        PdfReference::Url(url) => url.clone(),
    };
    output::field("Document", document);
    if let Some(photo) = &draft.author_photo {
        output::field("Author photo", &photo.file_name);
    }
    let payment = &draft.payment_info;
    output::field(
        "Payment",
        format!(
            "{} {} {} via {}",
            display_or_dash(&payment.amount),
            payment.currency,
            display_or_dash(&payment.phone_number),
            payment.operator
        ),
    );
    if !draft.waiver_code.trim().is_empty() {
        output::field(
            "Waiver code",
            format!("{} (not verified)", draft.waiver_code.trim()),
        );
    }
    if let Some(info) = store.snapshot_info(key)? {
        output::field("Saved", format_time(info.modified_at));
    }
    Ok(())
}

fn check_draft(
    env: &Environment,
    store: &JsonDraftStore,
    key: &DraftKey,
) -> Result<(), CliError> {
    let Some(snapshot) = load_or_report(store, key)? else {
        return Ok(());
    };
    let policy = env.config.validation_policy()?;
    output::section(format!("Checks for `{key}`"));
    let mut failures = 0;
    for step in applicable_steps(&snapshot.draft) {
        match validate_step(step, &snapshot.draft, &Exemption::None, &policy) {
            Ok(()) => output::success(step),
            Err(reason) => {
                failures += 1;
                output::warning(format!("{step}: {reason}"));
            }
        }
    }
    if !snapshot.draft.waiver_code.trim().is_empty() {
        output::info(
            "Payment was checked without the waiver code; it is verified when the form is opened.",
        );
    }
    if failures == 0 {
        output::success("Draft is ready to submit.");
    }
    Ok(())
}

fn list_drafts(store: &JsonDraftStore) -> Result<(), CliError> {
    let rows = store.list_snapshots()?;
    if rows.is_empty() {
        output::info("No saved drafts.");
        return Ok(());
    }
    output::section("Saved drafts");
    for row in rows {
        println!(
            "  {:<38} {:>10}  {}",
            row.key,
            human_size(row.size_bytes),
            format_time(row.modified_at)
        );
    }
    Ok(())
}

fn run_config(args: &[String]) -> Result<(), CliError> {
    let action = args.first().map(|action| action.to_lowercase());
    let env = Environment::load()?;
    match action.as_deref() {
        Some("path") => {
            println!("{}", env.manager.config_path().display());
            Ok(())
        }
        Some("show") | None => {
            let config = &env.config;
            output::section("Configuration");
            output::field(
                "Autosave interval",
                format!("{} s", config.autosave_interval_secs),
            );
            output::field("Max PDF size", human_size(config.max_pdf_bytes));
            output::field("Max photo size", human_size(config.max_photo_bytes));
            output::field("Minimum amount", config.minimum_amount);
            output::field(
                "Phone country code",
                format!("+{}", config.phone_country_code),
            );
            output::field("Document folder", &config.document_folder);
            output::field("Photo folder", &config.photo_folder);
            output::field("Drafts", env.manager.drafts_dir(config).display());
            Ok(())
        }
        Some(other) => Err(unknown(other, &CONFIG_ACTIONS)),
    }
}

fn display_or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "-"
    } else {
        trimmed
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["B", "KiB", "MiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".into())
}
