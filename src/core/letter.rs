//! 交給公文產生器的上下文；信件本身由外部服務撰寫

use crate::domain::model::{CalculationResult, TaxCategory};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// 主張時效已過，請求撤銷
    Prescription,
    /// 對核定提出異議，請求覆查
    Review,
    /// 請求和解
    Settlement,
}

impl ResponseKind {
    pub fn default_for(is_expired: bool) -> Self {
        if is_expired {
            ResponseKind::Prescription
        } else {
            ResponseKind::Review
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxpayerDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    pub reference_number: String,
}

impl Validate for TaxpayerDetails {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("taxpayer.name", &self.name)?;
        validate_non_empty_string("taxpayer.reference_number", &self.reference_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterContext {
    pub category: TaxCategory,
    pub category_label: String,
    pub notice_date: NaiveDate,
    pub is_expired: bool,
    pub prescription_years: u32,
    pub legal_basis: String,
    pub response: ResponseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer: Option<TaxpayerDetails>,
}

impl LetterContext {
    pub fn from_result(result: &CalculationResult, notice_date: NaiveDate) -> Self {
        let is_expired = result.is_expired();
        Self {
            category: result.category,
            category_label: result.category.label().to_string(),
            notice_date,
            is_expired,
            prescription_years: result.prescription_years,
            legal_basis: result.legal_basis.citation().to_string(),
            response: ResponseKind::default_for(is_expired),
            taxpayer: None,
        }
    }

    pub fn with_response(mut self, response: ResponseKind) -> Self {
        self.response = response;
        self
    }

    pub fn with_taxpayer(mut self, taxpayer: TaxpayerDetails) -> Self {
        self.taxpayer = Some(taxpayer);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Validate for LetterContext {
    /// 需要納稅人資料才能撰寫信件
    fn validate(&self) -> Result<()> {
        match &self.taxpayer {
            Some(taxpayer) => taxpayer.validate(),
            None => Err(crate::utils::error::PrescriptionError::MissingField {
                field: "taxpayer".to_string(),
            }),
        }
    }
}
