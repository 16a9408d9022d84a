use crate::config::Config;
use crate::rules::{loader, RuleDatabase, RuleType};
use crate::RuleEngine;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::time::Duration;

pub fn list_categories(engine: &RuleEngine) -> Result<()> {
    let database = engine.database();

    if database.categories.is_empty() {
        println!("{}", "No rule categories loaded.".yellow());
        return Ok(());
    }

    println!("{}", "Rule categories:".bold());
    println!();

    for (key, category) in &database.categories {
        println!(
            "  {} {} {} ({})",
            "✓".green(),
            key.cyan().bold(),
            category.name,
            format!("{} rules", category.rules.len()).dimmed()
        );
        if !category.description.is_empty() {
            println!("      {}", category.description.dimmed());
        }
    }

    Ok(())
}

pub fn show_info(engine: &RuleEngine) -> Result<()> {
    let stats = engine.stats();

    println!("{}", "Rule database".bold());
    println!("  Version: {}", stats.version);
    println!("  Last updated: {}", stats.last_updated);
    println!("  Rules: {}", stats.total_rules.to_string().yellow());
    println!("  Categories: {}", stats.categories.len());

    let declared = engine.database().total_rules;
    if declared != 0 && declared != stats.total_rules {
        println!(
            "  {} header declares {} rules",
            "note:".dimmed(),
            declared.to_string().dimmed()
        );
    }

    if let Some(path) = Config::downloaded_rules_path().filter(|p| p.exists()) {
        println!("  Downloaded copy: {}", path.display().to_string().dimmed());
    }

    Ok(())
}

pub fn show_category(engine: &RuleEngine, category: &str, kind: Option<RuleType>) -> Result<()> {
    let rules = engine.rules_by_category(category);

    if rules.is_empty() {
        println!(
            "{} No rules in category {}.",
            "✗".red().bold(),
            category.yellow()
        );
        println!("Run {} to see available categories.", "rulechk rules list".cyan());
        return Ok(());
    }

    println!("{}", format!("Category: {}", category).bold());

    for rule in rules.iter().filter(|r| kind.map_or(true, |k| r.kind == k)) {
        println!();
        println!(
            "  {} {} {}",
            rule.id.cyan().bold(),
            format!("[{}]", rule.kind).dimmed(),
            format!("priority {}", rule.priority).dimmed()
        );
        println!("    {} → {}", rule.wrong.join(", ").red(), rule.correct.green());
        if !rule.description.is_empty() {
            println!("    {}", rule.description);
        }
        for example in &rule.examples {
            println!("    {} {}", "e.g.".dimmed(), example);
        }
    }

    Ok(())
}

/// Download the configured rule database into the data directory.
pub async fn update_rules(config: &Config) -> Result<()> {
    let url = config
        .rules_url
        .as_deref()
        .context("No rules URL configured. Pass --rules-url or set rules_url in the config file.")?;
    let target = Config::downloaded_rules_path().context("Failed to get data directory")?;

    println!("{} rules from {}...", "Downloading".cyan().bold(), url.dimmed());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message("Downloading...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let bytes = loader::fetch_bytes(url, Duration::from_secs(config.fetch_timeout_secs)).await;
    pb.finish_and_clear();
    let bytes = bytes?;

    // Refuse to overwrite a good copy with something unparsable
    let database = RuleDatabase::from_slice(&bytes, url)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }
    fs::write(&target, &bytes)
        .with_context(|| format!("Failed to write rules: {}", target.display()))?;

    println!(
        "{} Rules {} installed ({} rules): {}",
        "✓".green().bold(),
        database.version.yellow(),
        database.rule_count(),
        target.display().to_string().cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_listing_embedded_rules() {
        let engine = RuleEngine::new(Arc::new(RuleDatabase::embedded().unwrap()));
        assert!(list_categories(&engine).is_ok());
        assert!(show_info(&engine).is_ok());
        assert!(show_category(&engine, "it_terms", None).is_ok());
        assert!(show_category(&engine, "missing", Some(RuleType::Spacing)).is_ok());
    }

    #[tokio::test]
    async fn test_update_requires_url() {
        let err = update_rules(&Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("No rules URL configured"));
    }
}
