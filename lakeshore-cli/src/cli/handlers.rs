// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for Lakeshore

use colored::Colorize;
use lakeshore::config::DEFAULT_SOURCE_DRIVER;
use lakeshore::{
    AuthMode, CatalogClient, CatalogDescriptor, Credentials, Pipeline, PipelineConfig,
    SourceDescriptor, TableIdentity,
};

use super::commands::{AuthKind, BranchAction, CatalogArgs, OutputFormat, RunArgs};
use super::output;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn prompt_secret(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    print!("{}", prompt);
    std::io::Write::flush(&mut std::io::stdout())?;
    Ok(rpassword::read_password()?)
}

fn open_catalog(args: &CatalogArgs) -> Result<CatalogClient, Box<dyn std::error::Error>> {
    let descriptor = CatalogDescriptor::new(args.uri.clone()).with_ref(args.reference.clone());
    descriptor.validate()?;
    Ok(CatalogClient::open(&descriptor)?)
}

/// Build the run configuration: the config file (if any) with every given
/// flag applied on top
pub fn build_config(args: RunArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        None => {
            let missing: Vec<&str> = [
                ("--source", args.source.is_none()),
                ("--relation", args.relation.is_none()),
                ("--catalog", args.catalog.is_none()),
                ("--target", args.target.is_none()),
            ]
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(flag, _)| *flag)
            .collect();
            if !missing.is_empty() {
                return Err(format!(
                    "Without --config these flags are required: {}",
                    missing.join(", ")
                )
                .into());
            }

            PipelineConfig::new(
                SourceDescriptor {
                    endpoint: args.source.clone().unwrap_or_default(),
                    credentials: None,
                    driver: DEFAULT_SOURCE_DRIVER.to_string(),
                    relation: args.relation.clone().unwrap_or_default(),
                },
                CatalogDescriptor::new(args.catalog.clone().unwrap_or_default()),
                TableIdentity::parse(args.target.as_deref().unwrap_or_default())?,
            )
        }
    };

    if let Some(endpoint) = args.source {
        config.source.endpoint = endpoint;
    }
    if let Some(driver) = args.driver {
        config.source.driver = driver;
    }
    if let Some(relation) = args.relation {
        config.source.relation = relation;
    }
    if let Some(user) = args.user {
        config.source.credentials = Some(Credentials {
            user,
            password: None,
        });
    }
    if let Some(password) = args.password {
        match config.source.credentials.as_mut() {
            Some(credentials) => credentials.password = Some(password),
            None => return Err("--password requires a source user (--user)".into()),
        }
    }
    if let Some(credentials) = config.source.credentials.as_mut() {
        if credentials.password.is_none() {
            credentials.password =
                Some(prompt_secret(&format!("Password for {}: ", credentials.user))?);
        }
    }

    if let Some(uri) = args.catalog {
        config.catalog.uri = uri;
    }
    if let Some(reference) = args.reference {
        config.catalog.reference = reference;
    }
    match (args.auth, args.token) {
        (Some(AuthKind::None), _) => config.catalog.auth = AuthMode::None,
        (_, Some(token)) => config.catalog.auth = AuthMode::Bearer { token },
        (Some(AuthKind::Bearer), None) => {
            let token = match &config.catalog.auth {
                AuthMode::Bearer { token } => token.clone(),
                AuthMode::None => prompt_secret("Catalog bearer token: ")?,
            };
            config.catalog.auth = AuthMode::Bearer { token };
        }
        (None, None) => {}
    }
    if let Some(endpoint) = args.storage_endpoint {
        config.catalog.storage_endpoint = endpoint;
    }
    if let Some(warehouse) = args.warehouse {
        config.catalog.warehouse = warehouse;
    }

    if let Some(target) = args.target {
        config.target = TableIdentity::parse(&target)?;
    }
    if let Some(batch_rows) = args.batch_rows {
        config.write.batch_rows = batch_rows;
    }
    if let Some(preview_rows) = args.preview_rows {
        config.preview_rows = preview_rows;
    }

    config.validate()?;
    Ok(config)
}

/// Handle the run command
pub fn handle_run(args: RunArgs) -> CliResult {
    let quiet = args.quiet;
    let config = build_config(args)?;
    let preview_rows = config.preview_rows;

    println!(
        "{}",
        format!(
            "Ingesting {} → {} (ref '{}')",
            config.source.relation, config.target, config.catalog.reference
        )
        .bold()
        .green()
    );

    let mut pipeline = Pipeline::new(config);
    match pipeline.run() {
        Ok(report) => {
            if !quiet {
                println!("{}", "\nSource rows:".yellow());
                println!(
                    "{}",
                    output::format_dataset(&report.source_sample, preview_rows, OutputFormat::Table)
                );
                println!("{}", "\nCommitted table:".yellow());
                println!(
                    "{}",
                    output::format_dataset(
                        &report.committed_sample,
                        preview_rows,
                        OutputFormat::Table
                    )
                );
            }
            println!(
                "{}",
                format!(
                    "\nDone: {} rows committed to {} version {} ({:.2?})",
                    report.rows_read, report.snapshot.identity, report.snapshot.version, report.elapsed
                )
                .bold()
                .green()
            );
            println!("  snapshot: {}", report.snapshot.snapshot_id);
            println!("  location: {}", report.snapshot.location);
            Ok(())
        }
        Err(failure) => {
            println!(
                "{}",
                format!("\nFailed while {}", failure.stage).bold().red()
            );
            println!("  cause: {}", failure.cause);
            Err(failure.into())
        }
    }
}

/// Handle the show command
pub fn handle_show(
    table: &str,
    catalog: &CatalogArgs,
    version: Option<u64>,
    limit: usize,
    format: OutputFormat,
) -> CliResult {
    let identity = TableIdentity::parse(table)?;
    let client = open_catalog(catalog)?;
    let dataset = client.read_snapshot(&identity, version)?;

    if format == OutputFormat::Table {
        let label = version
            .map(|v| format!("version {}", v))
            .unwrap_or_else(|| "current".to_string());
        println!(
            "{}",
            format!("{} @ {} ({})", identity, catalog.reference, label).cyan()
        );
    }
    println!("{}", output::format_dataset(&dataset, limit, format));
    Ok(())
}

/// Handle the history command
pub fn handle_history(table: &str, catalog: &CatalogArgs) -> CliResult {
    let identity = TableIdentity::parse(table)?;
    let client = open_catalog(catalog)?;
    let history = client.history(&identity)?;

    println!(
        "{}",
        format!("{} @ {}", identity, catalog.reference).cyan()
    );
    println!("{}", output::format_history(&history));
    Ok(())
}

/// Handle the tables command
pub fn handle_tables(catalog: &CatalogArgs) -> CliResult {
    let client = open_catalog(catalog)?;
    let tables = client.list_tables()?;
    if tables.is_empty() {
        println!(
            "{}",
            format!("No tables on ref '{}'", catalog.reference).yellow()
        );
    } else {
        println!("{}", output::format_tables(&tables));
    }
    Ok(())
}

/// Handle the branch subcommands
pub fn handle_branch(action: BranchAction, catalog: &CatalogArgs) -> CliResult {
    let client = open_catalog(catalog)?;
    match action {
        BranchAction::Create { name, from } => {
            let info = client.create_ref(&name, &from)?;
            println!(
                "{}",
                format!("Created ref '{}' from '{}'", info.name, from).green()
            );
        }
        BranchAction::List => {
            println!("{}", output::format_refs(&client.list_refs()?));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeshore::config::DEFAULT_PREVIEW_ROWS;
    use std::io::Write;
    use tempfile::TempDir;

    fn flags() -> RunArgs {
        RunArgs {
            source: Some("mydb.sqlite".to_string()),
            relation: Some("sales_data".to_string()),
            catalog: Some("memory://".to_string()),
            target: Some("sales.sales_data".to_string()),
            ..RunArgs::default()
        }
    }

    #[test]
    fn test_flags_alone_build_a_config() {
        let config = build_config(flags()).unwrap();
        assert_eq!(config.source.driver, "sqlite");
        assert_eq!(config.catalog.reference, "main");
        assert_eq!(config.target.to_string(), "sales.sales_data");
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
    }

    #[test]
    fn test_missing_flags_are_listed() {
        let err = build_config(RunArgs {
            source: Some("mydb.sqlite".to_string()),
            ..RunArgs::default()
        })
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--relation"));
        assert!(message.contains("--target"));
        assert!(!message.contains("--source"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("pipeline.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "source": {{"endpoint": "mydb.sqlite", "relation": "sales_data"}},
                "catalog": {{"uri": "memory://", "ref": "dev"}},
                "target": "sales.sales_data",
                "write": {{"batch_rows": 10}}
            }}"#
        )
        .unwrap();

        let config = build_config(RunArgs {
            config: Some(path),
            reference: Some("main".to_string()),
            batch_rows: Some(500),
            token: Some("secret".to_string()),
            ..RunArgs::default()
        })
        .unwrap();

        assert_eq!(config.catalog.reference, "main");
        assert_eq!(config.write.batch_rows, 500);
        assert_eq!(
            config.catalog.auth,
            AuthMode::Bearer {
                token: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_password_requires_user() {
        let err = build_config(RunArgs {
            password: Some("mypassword".to_string()),
            ..flags()
        })
        .unwrap_err();
        assert!(err.to_string().contains("--user"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = build_config(RunArgs {
            batch_rows: Some(0),
            ..flags()
        })
        .unwrap_err();
        assert!(err.to_string().contains("batch_rows"));
    }
}
