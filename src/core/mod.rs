pub mod analysis;
pub mod calculator;
pub mod catalog;
pub mod letter;

pub use crate::domain::model::{CalculationResult, PrescriptionRule, PrescriptionStatus, TaxCategory};
pub use crate::domain::ports::RuleResolver;
pub use crate::utils::error::Result;
