//! `story-migrate`: command-line front end for story document migration.
//!
//! # Responsibility
//! - Migrate a story JSON file to the current schema version.
//! - Load a configured template set and summarize it.
//! - Keep stdout machine-readable; diagnostics go to the log file.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;
use serde_json::Value;
use std::path::{Path, PathBuf};
use story_migration::{
    declared_version, default_log_level, init_logging, load_templates, migrate, migrate_document,
    pending_steps, LogConfig, MigrationError, TemplateConfig, DATA_VERSION,
};

const PASS_FROM_HINT: &str = "pass --from to set the document version";

fn cli() -> Command {
    Command::new("story-migrate")
        .version(story_migration::core_version())
        .about("Upgrade story documents to the current schema version")
        .subcommand_required(true)
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Absolute directory for rotating log files; logging is off when omitted"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value(default_log_level())
                .help("trace|debug|info|warn|error"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Migrate a story document and print it")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Story document JSON file"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(value_parser!(u32))
                        .help("Declared version; defaults to the document's `version` field"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the migrated document here instead of stdout"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("List the steps that would run without migrating"),
                ),
        )
        .subcommand(
            Command::new("templates")
                .about("Load and migrate a template set")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Template config JSON file"),
                ),
        )
        .subcommand(Command::new("version").about("Print crate and schema versions"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    setup_logging(&matches)?;
    if let Some(command) = matches.subcommand_name() {
        info!("event=cli_command module=cli status=start command={}", command);
    }

    let output = match matches.subcommand() {
        Some(("migrate", sub)) => run_migrate(sub)?,
        Some(("templates", sub)) => {
            let config = sub
                .get_one::<PathBuf>("config")
                .context("--config is required")?;
            run_templates(config)?
        }
        Some(("version", _)) => format!(
            "story_migration {} data_version={}",
            story_migration::core_version(),
            DATA_VERSION
        ),
        _ => bail!("unknown subcommand"),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn setup_logging(matches: &ArgMatches) -> Result<()> {
    let Some(log_dir) = matches.get_one::<PathBuf>("log-dir") else {
        return Ok(());
    };
    let level = matches
        .get_one::<String>("log-level")
        .map_or_else(|| default_log_level(), String::as_str);
    let config = LogConfig::parse(level, log_dir)?;
    init_logging(&config)?;
    Ok(())
}

/// Runs `migrate`; returns text for stdout (empty when written to a file).
fn run_migrate(matches: &ArgMatches) -> Result<String> {
    let file = matches
        .get_one::<PathBuf>("file")
        .context("a story file is required")?;
    let document = read_json(file)?;
    let from = matches.get_one::<u32>("from").copied();

    if matches.get_flag("dry-run") {
        let version = match from {
            Some(version) => version,
            None => declared_version(&document).map_err(with_version_hint)?,
        };
        let steps = pending_steps(version)?;
        if steps.is_empty() {
            return Ok(format!("version {version} is current"));
        }
        let lines: Vec<String> = steps
            .iter()
            .map(|step| format!("{:>3} {}", step.version, step.name))
            .collect();
        return Ok(lines.join("\n"));
    }

    let migrated = match from {
        Some(version) => migrate(&document, version).map_err(anyhow::Error::new),
        None => migrate_document(&document).map_err(with_version_hint),
    }
    .with_context(|| format!("failed to migrate `{}`", file.display()))?;
    let rendered = serde_json::to_string_pretty(&migrated)?;

    match matches.get_one::<PathBuf>("output") {
        Some(target) => {
            std::fs::write(target, rendered)
                .with_context(|| format!("failed to write `{}`", target.display()))?;
            Ok(String::new())
        }
        None => Ok(rendered),
    }
}

/// Points at `--from` when the document's own version is unusable.
fn with_version_hint(err: MigrationError) -> anyhow::Error {
    let unresolved = matches!(
        err,
        MigrationError::MissingVersion | MigrationError::InvalidVersion(_)
    );
    let err = anyhow::Error::new(err);
    if unresolved {
        err.context(PASS_FROM_HINT)
    } else {
        err
    }
}

/// Runs `templates`; one tab-separated line per template.
fn run_templates(config_path: &Path) -> Result<String> {
    let config = TemplateConfig::from_json_file(config_path)?;
    let templates = load_templates(&config)?;
    let lines: Vec<String> = templates
        .iter()
        .map(|template| {
            format!(
                "{}\t{}\tpages={}\telements={}",
                template.name,
                template.metadata.title,
                template.document.pages.len(),
                template.document.element_count()
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("`{}` is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{cli, run_migrate, run_templates};
    use serde_json::{json, Value};
    use story_migration::{MigrationError, DATA_VERSION};

    fn write(dir: &std::path::Path, name: &str, body: &Value) -> String {
        let path = dir.join(name);
        std::fs::write(&path, body.to_string()).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn migrate_args(args: &[&str]) -> clap::ArgMatches {
        let mut argv = vec!["story-migrate", "migrate"];
        argv.extend_from_slice(args);
        let matches = cli().try_get_matches_from(argv).unwrap();
        matches.subcommand_matches("migrate").unwrap().clone()
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn migrate_prints_current_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(
            dir.path(),
            "story.json",
            &json!({ "version": 3, "pages": [{ "id": "p", "elements": [{ "id": "e", "type": "shape" }] }] }),
        );

        let output = run_migrate(&migrate_args(&[&file])).unwrap();
        let migrated: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(migrated["version"], json!(DATA_VERSION));
        assert_eq!(migrated["pages"][0]["elements"][0]["rotationAngle"], json!(0));
    }

    #[test]
    fn dry_run_lists_pending_steps() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "story.json", &json!({ "pages": [] }));

        let output = run_migrate(&migrate_args(&[&file, "--from", "8", "--dry-run"])).unwrap();
        assert_eq!(output, "  9 background_element\n 10 inline_text_styles");
    }

    #[test]
    fn missing_version_without_from_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "story.json", &json!({ "pages": [] }));

        let err = run_migrate(&migrate_args(&[&file])).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("--from"), "{chain}");
        assert!(chain.contains("no `version` field"), "{chain}");
    }

    #[test]
    fn null_version_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "story.json", &json!({ "version": null, "pages": [] }));

        for args in [vec![file.as_str()], vec![file.as_str(), "--dry-run"]] {
            let err = run_migrate(&migrate_args(&args)).unwrap_err();
            let migration = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<MigrationError>())
                .unwrap();
            assert_eq!(migration, &MigrationError::MissingVersion);
        }
    }

    #[test]
    fn step_failures_do_not_suggest_from() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(
            dir.path(),
            "story.json",
            &json!({
                "version": 4,
                "pages": [{ "id": "p", "elements": [{ "id": "e", "type": "text", "color": "nope" }] }]
            }),
        );

        let err = run_migrate(&migrate_args(&[&file])).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("color_patterns"), "{chain}");
        assert!(!chain.contains("--from"), "{chain}");
    }

    #[test]
    fn output_flag_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "story.json", &json!({ "version": DATA_VERSION, "pages": [] }));
        let target = dir.path().join("out.json");
        let target_str = target.to_str().unwrap().to_string();

        let output = run_migrate(&migrate_args(&[&file, "-o", &target_str])).unwrap();
        assert!(output.is_empty());
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written, json!({ "version": DATA_VERSION, "pages": [] }));
    }

    #[test]
    fn templates_command_summarizes_each_template() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "simple.json",
            &json!({
                "version": DATA_VERSION,
                "title": "Simple",
                "pages": [{ "id": "p", "elements": [{ "id": "e", "type": "text" }] }]
            }),
        );
        let config = dir.path().join("config.json");
        std::fs::write(
            &config,
            json!({
                "template_dir": dir.path(),
                "image_base_url": "https://cdn.example/",
                "names": ["simple"]
            })
            .to_string(),
        )
        .unwrap();

        let output = run_templates(&config).unwrap();
        assert_eq!(output, "simple\tSimple\tpages=1\telements=1");
    }
}
