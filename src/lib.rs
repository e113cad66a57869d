pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::{load_catalog, CatalogFile};
pub use core::analysis::AnalysisPayload;
pub use core::calculator::{calculate, PrescriptionCalculator, PrescriptionInput};
pub use core::catalog::RuleCatalog;
pub use core::letter::{LetterContext, ResponseKind, TaxpayerDetails};
pub use domain::model::{
    CalculationResult, ExceptionKind, ExceptionOverrides, LegalBasis, PrescriptionRule,
    PrescriptionStatus, TaxCategory,
};
pub use domain::ports::RuleResolver;
pub use utils::error::{PrescriptionError, Result};
