//! Pattern subcommand handlers for PopGuard.

use std::path::Path;

use tracing::{info, warn};

use popguard_config::{Config, ConfigValidator};
use popguard_engine::{InterruptionService, PatternStore, host_of};
use popguard_protocols::{InterruptionType, Pattern};

use crate::cli::Commands;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Handle a CLI command.
pub(crate) async fn handle_command(command: Commands, config: Config) -> CmdResult {
    match command {
        Commands::List {
            interruption_type,
            domain,
            format,
        } => pattern_list(&config, interruption_type, domain.as_deref(), &format).await,
        Commands::Show { id } => pattern_show(&config, &id).await,
        Commands::Add { file } => pattern_add(&config, &file).await,
        Commands::Remove { id } => pattern_remove(&config, &id).await,
        Commands::Import { file } => pattern_import(&config, &file).await,
        Commands::Export { file } => pattern_export(&config, &file).await,
        Commands::Candidates { url, types } => pattern_candidates(&config, &url, &types).await,
        Commands::Stats { id, reset } => pattern_stats(&config, id.as_deref(), reset).await,
        Commands::Validate => validate(&config).await,
    }
}

async fn open_service(config: &Config) -> Result<InterruptionService, Box<dyn std::error::Error>> {
    let service = InterruptionService::new();
    if !service.initialize(config).await {
        return Err("Invalid configuration, run `popguard validate` for details".into());
    }
    Ok(service)
}

/// Write the store before reporting a change. Autosave failures are only
/// logged by the engine, so the command checks the save itself.
async fn persist(service: &InterruptionService) -> CmdResult {
    if !service.save().await? {
        return Err("Failed to save pattern file, the change was not kept".into());
    }
    Ok(())
}

/// List stored patterns.
async fn pattern_list(
    config: &Config,
    interruption_type: Option<InterruptionType>,
    domain: Option<&str>,
    format: &str,
) -> CmdResult {
    let service = open_service(config).await?;
    let patterns = service.get_patterns(interruption_type, domain)?;

    if patterns.is_empty() {
        println!("No patterns found.");
        return Ok(());
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&patterns)?;
            println!("{}", json);
        }
        _ => print_table(&patterns),
    }

    Ok(())
}

fn print_table(patterns: &[Pattern]) {
    println!(
        "{:<28} {:<14} {:>8} {:<8} {}",
        "ID", "TYPE", "PRIORITY", "ENABLED", "DOMAINS"
    );
    println!("{}", "-".repeat(80));
    for pattern in patterns {
        let domains = if pattern.is_global() {
            "*".to_string()
        } else {
            pattern.domains.join(", ")
        };
        println!(
            "{:<28} {:<14} {:>8} {:<8} {}",
            pattern.id,
            pattern.interruption_type.as_str(),
            pattern.priority,
            pattern.enabled,
            domains
        );
    }
}

/// Show one pattern in full.
async fn pattern_show(config: &Config, id: &str) -> CmdResult {
    let service = open_service(config).await?;
    let Some(pattern) = service.get_pattern(id)? else {
        return Err(format!("Pattern not found: {}", id).into());
    };

    println!("Pattern: {}", pattern.id);
    println!("{}", "=".repeat(50));
    println!("Type:        {}", pattern.interruption_type);
    println!("Priority:    {}", pattern.priority);
    println!("Enabled:     {}", pattern.enabled);
    if !pattern.description.is_empty() {
        println!("Description: {}", pattern.description);
    }
    if pattern.is_global() {
        println!("Domains:     (all)");
    } else {
        println!("Domains:     {}", pattern.domains.join(", "));
    }
    if !pattern.keywords.is_empty() {
        println!("Keywords:    {}", pattern.keywords.join(", "));
    }

    println!("\nSelectors:");
    for selector in &pattern.selectors {
        println!("  - {}", selector);
    }

    println!("\nActions:");
    for (i, action) in pattern.actions.iter().enumerate() {
        println!("  {}. {}", i + 1, serde_json::to_string(action)?);
    }

    if !pattern.metadata.is_empty() {
        println!("\nMetadata:");
        println!("{}", serde_json::to_string_pretty(&pattern.metadata)?);
    }

    Ok(())
}

/// Add or replace a pattern from a JSON record file.
async fn pattern_add(config: &Config, file: &Path) -> CmdResult {
    let content = tokio::fs::read_to_string(file).await?;
    let record: serde_json::Value = serde_json::from_str(&content)?;
    let id = record
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let service = open_service(config).await?;
    if !service.add_pattern(record).await? {
        return Err(format!("Pattern record in {} was rejected", file.display()).into());
    }
    persist(&service).await?;

    info!("Pattern added: {}", id);
    println!("Added pattern {}", id);
    Ok(())
}

/// Remove a pattern.
async fn pattern_remove(config: &Config, id: &str) -> CmdResult {
    let service = open_service(config).await?;
    if !service.remove_pattern(id).await? {
        return Err(format!("Pattern not found: {}", id).into());
    }
    persist(&service).await?;

    println!("Removed pattern {}", id);
    Ok(())
}

/// Merge patterns from another file.
async fn pattern_import(config: &Config, file: &Path) -> CmdResult {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let service = open_service(config).await?;
    let imported = service.import_patterns(file).await?;
    if imported > 0 {
        persist(&service).await?;
    }

    println!("Imported {} patterns from {}", imported, file.display());
    Ok(())
}

/// Export every pattern.
async fn pattern_export(config: &Config, file: &Path) -> CmdResult {
    let service = open_service(config).await?;
    if !service.export_patterns(file).await? {
        return Err(format!("Failed to export patterns to {}", file.display()).into());
    }

    println!("Exported patterns to {}", file.display());
    Ok(())
}

/// Show the ordered candidates for a URL.
async fn pattern_candidates(config: &Config, url: &str, types: &[InterruptionType]) -> CmdResult {
    let service = open_service(config).await?;
    let types = (!types.is_empty()).then_some(types);
    let plan = service.plan(Some(url), types)?;

    match host_of(url) {
        Some(host) => println!("Host: {}", host),
        None => println!("Host: (none, only global patterns apply)"),
    }

    if plan.is_empty() {
        println!("No candidates.");
        return Ok(());
    }

    println!("{:<6} {:<28} {:<14} {:>8}", "ORDER", "ID", "TYPE", "PRIORITY");
    println!("{}", "-".repeat(60));
    for (i, pattern) in plan.iter().enumerate() {
        println!(
            "{:<6} {:<28} {:<14} {:>8}",
            i + 1,
            pattern.id,
            pattern.interruption_type.as_str(),
            pattern.priority
        );
    }

    Ok(())
}

/// Show or reset per-pattern statistics.
async fn pattern_stats(config: &Config, id: Option<&str>, reset: bool) -> CmdResult {
    let service = open_service(config).await?;

    if reset {
        let dropped = service.reset_stats(id).await?;
        persist(&service).await?;
        println!("Reset statistics for {} patterns", dropped);
        return Ok(());
    }

    let mut stats: Vec<_> = service
        .stats()?
        .into_iter()
        .filter(|(pattern_id, _)| id.is_none_or(|wanted| wanted == pattern_id))
        .collect();
    if stats.is_empty() {
        println!("No statistics recorded.");
        return Ok(());
    }
    stats.sort_by(|a, b| a.0.cmp(&b.0));

    println!(
        "{:<28} {:>8} {:>9} {:>8} {}",
        "ID", "ATTEMPTS", "SUCCESSES", "FAILURES", "LAST APPLIED"
    );
    println!("{}", "-".repeat(80));
    for (pattern_id, entry) in &stats {
        let last_applied = entry
            .last_applied
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<28} {:>8} {:>9} {:>8} {}",
            pattern_id, entry.attempts, entry.successes, entry.failures, last_applied
        );
    }

    Ok(())
}

/// Validate the configuration and the pattern file.
async fn validate(config: &Config) -> CmdResult {
    let result = ConfigValidator::validate(config)?;

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    let store = PatternStore::new(config.engine.resolved_patterns_path());
    match store.load().await {
        Ok(report) => {
            println!(
                "Pattern file {}: {} patterns loaded",
                store.path().display(),
                report.loaded
            );
            for diagnostic in &report.diagnostics {
                println!(
                    "skipped record #{} ({}): {}",
                    diagnostic.index,
                    diagnostic.id.as_deref().unwrap_or("no id"),
                    diagnostic.reason
                );
            }
        }
        Err(e) => {
            warn!("Pattern file {} is unreadable: {}", store.path().display(), e);
            return Err(e.into());
        }
    }

    if !result.is_valid() {
        return Err(format!("{} configuration errors", result.errors.len()).into());
    }

    println!("Configuration is valid.");
    Ok(())
}
