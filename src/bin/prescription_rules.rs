use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tax_prescription::utils::{logger, validation::parse_iso_date};
use tax_prescription::{load_catalog, PrescriptionRule, RuleCatalog, TaxCategory};

#[derive(Parser)]
#[command(name = "prescription-rules")]
#[command(about = "Validates and lists a prescription rule catalog")]
struct Args {
    /// TOML rule catalog, defaults to the built-in table
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Resolve the rule for this category...
    #[arg(long, requires = "date")]
    category: Option<String>,

    /// ...as of this notice date (YYYY-MM-DD)
    #[arg(long, requires = "category")]
    date: Option<String>,

    /// Only validate, print nothing on success
    #[arg(long)]
    check: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let catalog = load_catalog(args.rules.as_deref()).with_context(|| match &args.rules {
        Some(path) => format!("failed to load rule catalog '{}'", path.display()),
        None => "built-in rule catalog is invalid".to_string(),
    })?;
    tracing::info!("✅ Rule catalog loaded and validated successfully");

    if args.check {
        return Ok(());
    }

    if let (Some(category), Some(date)) = (&args.category, &args.date) {
        let reference_date = parse_iso_date("date", date)?;
        let resolved = TaxCategory::coerce(category);
        let rule = catalog.resolve_rule(resolved, reference_date);
        println!("🔎 {} on {}:", resolved, reference_date);
        print_rule(rule);
        return Ok(());
    }

    print_catalog(&catalog);
    Ok(())
}

fn print_catalog(catalog: &RuleCatalog) {
    println!("📋 Current rules:");
    for rule in catalog.current_rules() {
        print_rule(rule);
    }

    println!();
    println!("📜 Historical rules:");
    for rule in catalog.historical_rules() {
        print_rule(rule);
    }
}

fn print_rule(rule: &PrescriptionRule) {
    let window = match rule.effective_until {
        Some(until) => format!("{} .. {}", rule.effective_from, until),
        None => format!("since {}", rule.effective_from),
    };
    println!(
        "  {:<20} {:<20} {} years  [{}]  {}",
        rule.id,
        rule.category.key(),
        rule.prescription_years,
        window,
        rule.legal_basis.citation()
    );
    if let Some(overrides) = &rule.exception_overrides {
        if let Some(years) = overrides.fraud {
            println!("  {:<20} fraud: {} years", "", years);
        }
        if let Some(years) = overrides.omission {
            println!("  {:<20} omission: {} years", "", years);
        }
    }
}
