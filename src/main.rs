use clap::Parser;
use tax_prescription::config::LogFormat;
use tax_prescription::utils::error::{ErrorSeverity, PrescriptionError};
use tax_prescription::utils::{logger, validation::Validate};
use tax_prescription::{
    load_catalog, CalculationResult, CliConfig, PrescriptionCalculator,
};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    match config.log_format {
        LogFormat::Text => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting tax-prescription CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    if let Err(e) = run(&config) {
        exit_with(&e);
    }

    Ok(())
}

fn run(config: &CliConfig) -> tax_prescription::Result<()> {
    // 先載入規則表，規則錯誤優先於輸入錯誤
    let catalog = load_catalog(config.rules.as_deref())?;
    let calculator = PrescriptionCalculator::new(catalog);

    let input = config.prescription_input()?;
    let today = config.today()?;
    let result = calculator.calculate(&input, today)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, today);
    }

    if config.letter_context {
        let context = config.build_letter_context(&result, input.notice_date)?;
        println!("{}", context.to_json()?);
    }

    Ok(())
}

fn print_summary(result: &CalculationResult, today: chrono::NaiveDate) {
    let headline = if result.is_expired() {
        "❌ Assessment is time-barred"
    } else {
        "✅ Assessment is still enforceable"
    };
    println!("{}", headline);
    println!("📋 Calculation Summary:");
    println!("  Category: {} ({})", result.category, result.category.label());
    println!("  Rule: {}", result.rule_id);
    println!("  Legal basis: {}", result.legal_basis);
    println!(
        "  Period: {} years{}",
        result.prescription_years,
        if result.is_exception { " (exception)" } else { "" }
    );
    println!("  Start: {}", result.start_date);
    println!("  End: {}", result.end_date);
    if result.is_expired() {
        println!("  Expired: {} days ago", result.days_expired);
    } else {
        println!("  Remaining: {} days", result.days_remaining);
    }
    println!("  Elapsed: {:.1}%", result.elapsed_percent(today));
    if let Some(notes) = &result.special_notes {
        println!("  Notes: {}", notes);
    }
}

fn exit_with(e: &PrescriptionError) -> ! {
    tracing::error!(
        "❌ Calculation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
