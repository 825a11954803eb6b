//! Config command - inspect the configuration and edit its lookup tables.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use darf_core::darf::rules::format_cnpj;
use darf_core::lookup::Category;
use darf_core::models::config::DarfConfig;

use super::{default_config_path, load_config};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Summarize the active configuration and lookup tables
    Show {
        /// Print the full configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a configuration file with the default tables
    Init(InitArgs),

    /// Show which configuration file is used
    Path,

    /// Edit the code to category table
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Edit the CNPJ to org unit (UO Contribuinte) table
    #[command(subcommand)]
    OrgUnit(OrgUnitCommand),
}

#[derive(Args)]
struct InitArgs {
    /// Output path (default: --config, else the user config directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// Route a 4-digit code to `servidor` or `patronal-gilrat`
    Add { code: String, category: Category },
    /// Stop routing a code
    Remove { code: String },
}

#[derive(Subcommand)]
enum OrgUnitCommand {
    /// Map a CNPJ to its org unit
    Add { cnpj: String, unit: String },
    /// Drop the org unit of a CNPJ
    Remove { cnpj: String },
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { json } => show(config_path, json),
        ConfigCommand::Init(init_args) => init(init_args, config_path),
        ConfigCommand::Path => path(config_path),
        ConfigCommand::Category(cmd) => edit(config_path, |config| match cmd {
            CategoryCommand::Add { code, category } => {
                config.lookups.add_category(&code, category)?;
                Ok(format!("{} -> {}", code.trim(), category))
            }
            CategoryCommand::Remove { code } => match config.lookups.remove_category(&code) {
                Some(category) => Ok(format!("removed {} ({})", code.trim(), category)),
                None => anyhow::bail!("Unknown category code: {}", code),
            },
        }),
        ConfigCommand::OrgUnit(cmd) => edit(config_path, |config| match cmd {
            OrgUnitCommand::Add { cnpj, unit } => {
                config.lookups.add_org_unit(&cnpj, &unit)?;
                Ok(format!("{} -> {}", format_cnpj(&cnpj), unit.trim()))
            }
            OrgUnitCommand::Remove { cnpj } => match config.lookups.remove_org_unit(&cnpj) {
                Some(unit) => Ok(format!("removed {} ({})", format_cnpj(&cnpj), unit)),
                None => anyhow::bail!("Unknown CNPJ: {}", cnpj),
            },
        }),
    }
}

/// The file `--config` points at, else the default location.
fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

fn show(config_path: Option<&str>, json: bool) -> anyhow::Result<()> {
    let file = config_file(config_path);
    let config = load_config(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let source = if file.exists() { "" } else { " (not created, using defaults)" };
    println!("{} {}{}", style("Configuration:").bold(), file.display(), source);
    println!(
        "  OCR: {} (models in {})",
        if config.ocr.enabled { "enabled" } else { "disabled" },
        config.ocr.model_dir.display()
    );
    println!(
        "  Pages under {} chars are rendered at {} dpi",
        config.pdf.min_text_chars, config.pdf.render_dpi
    );
    println!("  CNPJ check digits: {}", if config.extraction.validate_cnpj { "validated" } else { "ignored" });
    println!(
        "  Rows: credor {}, ordenador {}, histórico \"{} MM/AAAA\"",
        config.output.creditor_cnpj, config.output.expense_authorizer, config.output.history_prefix
    );

    println!();
    println!("{} ({})", style("Categories").bold(), config.lookups.categories.len());
    for (code, category) in &config.lookups.categories {
        println!("  {}  {}", code, category);
    }

    println!();
    println!("{} ({})", style("Org units").bold(), config.lookups.org_units.len());
    for (cnpj, unit) in &config.lookups.org_units {
        println!("  {}  {}", format_cnpj(cnpj), unit);
    }

    Ok(())
}

fn init(args: InitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| config_file(config_path));

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    save(&DarfConfig::default(), &output_path)?;
    println!("{} Created {}", style("✓").green(), output_path.display());
    Ok(())
}

fn path(config_path: Option<&str>) -> anyhow::Result<()> {
    let file = config_file(config_path);
    println!("{}", file.display());
    if !file.exists() {
        eprintln!(
            "{} Not created yet; run 'darf config init' to write the default tables.",
            style("ℹ").blue()
        );
    }
    Ok(())
}

/// Apply one lookup edit and write the config back to its file.
fn edit<F>(config_path: Option<&str>, apply: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut DarfConfig) -> anyhow::Result<String>,
{
    let file = config_file(config_path);
    // a fresh file starts from the default tables
    let mut config = if file.exists() { DarfConfig::from_file(&file)? } else { DarfConfig::default() };

    let summary = apply(&mut config)?;
    save(&config, &file)?;

    info!("Updated lookups in {}", file.display());
    println!("{} {} in {}", style("✓").green(), summary, file.display());
    Ok(())
}

fn save(config: &DarfConfig, file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    config.save(file)?;
    Ok(())
}
