use chrono::NaiveDate;
use std::io::Write;
use tax_prescription::utils::error::{ErrorCategory, ErrorSeverity};
use tax_prescription::{load_catalog, CatalogFile, PrescriptionError, TaxCategory};
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A full catalog where every category gets the same rule, plus one historical window.
fn flat_catalog_toml(years_for_vat: u32) -> String {
    let mut content = String::from(
        r#"
[catalog]
name = "test-catalog"
version = "2024.1"
description = "flat four-year table"
"#,
    );

    for category in TaxCategory::ALL {
        let years = if category == TaxCategory::Vat { years_for_vat } else { 4 };
        content.push_str(&format!(
            r#"
[[rules]]
id = "{key}-rule"
category = "{key}"
prescription_years = {years}
legal_basis = "cgi_general"
effective_from = "2016-01-01"
"#,
            key = category.key(),
            years = years,
        ));
    }

    content.push_str(
        r#"
[[rules]]
id = "unused"
category = "other"
prescription_years = 4
legal_basis = "cgi_general"
effective_from = "2016-01-01"
"#,
    );
    content
}

fn complete_catalog_toml() -> String {
    // Drop the trailing duplicate "other" entry.
    let content = flat_catalog_toml(5);
    let cut = content.rfind("[[rules]]\nid = \"unused\"").unwrap();
    let mut content = content[..cut].to_string();
    content.push_str(
        r#"
[[historical]]
id = "vat-2005"
category = "vat"
prescription_years = 8
legal_basis = "finance_law"
effective_from = "2005-01-01"
effective_until = "2010-12-31"
special_conditions = "legacy VAT window"
exception_overrides = { fraud = 12 }
"#,
    );
    content
}

#[test]
fn test_load_catalog_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(complete_catalog_toml().as_bytes()).unwrap();

    let catalog = load_catalog(Some(file.path())).unwrap();
    assert_eq!(catalog.current_rules().count(), TaxCategory::ALL.len());

    let current = catalog.resolve_rule(TaxCategory::Vat, date(2020, 1, 1));
    assert_eq!(current.prescription_years, 5);

    let historical = catalog.resolve_rule(TaxCategory::Vat, date(2007, 7, 7));
    assert_eq!(historical.id, "vat-2005");
    assert_eq!(historical.exception_overrides.unwrap().fraud, Some(12));
}

#[test]
fn test_builtin_catalog_when_no_file() {
    let catalog = load_catalog(None).unwrap();
    assert_eq!(catalog.resolve_rule(TaxCategory::Cnss, date(2020, 1, 1)).prescription_years, 5);
}

#[test]
fn test_duplicate_rule_is_a_configuration_error() {
    let err = CatalogFile::from_toml_str(&flat_catalog_toml(4))
        .unwrap()
        .into_catalog()
        .unwrap_err();

    assert!(matches!(err, PrescriptionError::CatalogInvalid { ref rule_id, .. } if rule_id == "unused"));
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(err.severity(), ErrorSeverity::Critical);
}

#[test]
fn test_nonzero_months_is_a_configuration_error() {
    let content = complete_catalog_toml().replacen(
        "prescription_years = 5\n",
        "prescription_years = 5\nprescription_months = 3\n",
        1,
    );
    let err = CatalogFile::from_toml_str(&content).unwrap().into_catalog().unwrap_err();
    assert!(matches!(err, PrescriptionError::CatalogInvalid { ref rule_id, .. } if rule_id == "vat-rule"));
}

#[test]
fn test_zero_years_fails_file_validation() {
    let content = complete_catalog_toml().replacen("prescription_years = 5", "prescription_years = 0", 1);
    let err = CatalogFile::from_toml_str(&content).unwrap().into_catalog().unwrap_err();
    assert_eq!(err.field(), Some("rules.vat-rule.prescription_years"));
}

#[test]
fn test_inverted_historical_window_is_rejected() {
    let content = complete_catalog_toml().replace("effective_until = \"2010-12-31\"", "effective_until = \"2004-12-31\"");
    let err = CatalogFile::from_toml_str(&content).unwrap().into_catalog().unwrap_err();
    assert!(matches!(err, PrescriptionError::CatalogInvalid { ref rule_id, .. } if rule_id == "vat-2005"));
}

#[test]
fn test_missing_file_is_a_system_error() {
    let err = load_catalog(Some(std::path::Path::new("/nonexistent/rules.toml"))).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::System);
}
