pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::analysis::AnalysisPayload;
#[cfg(feature = "cli")]
use crate::core::calculator::PrescriptionInput;
#[cfg(feature = "cli")]
use crate::core::letter::{LetterContext, ResponseKind};
#[cfg(feature = "cli")]
use crate::domain::model::CalculationResult;
#[cfg(feature = "cli")]
use crate::utils::error::{PrescriptionError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{parse_iso_date, parse_optional_date, Validate};
#[cfg(feature = "cli")]
use chrono::{Local, NaiveDate};
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "tax-prescription")]
#[command(about = "Checks whether a Moroccan tax assessment is time-barred")]
pub struct CliConfig {
    /// Tax category key or Arabic label; unknown values use the general rule
    #[arg(long, required_unless_present = "analysis")]
    pub category: Option<String>,

    /// Date the assessment was notified (YYYY-MM-DD)
    #[arg(long, required_unless_present = "analysis")]
    pub notice_date: Option<String>,

    /// Payment due date (YYYY-MM-DD), defaults to the notice date
    #[arg(long)]
    pub due_date: Option<String>,

    /// Fraud has been established
    #[arg(long, conflicts_with = "omission")]
    pub fraud: bool,

    /// Income was omitted or concealed
    #[arg(long)]
    pub omission: bool,

    /// Reference date for the status, defaults to the local date
    #[arg(long)]
    pub today: Option<String>,

    /// TOML rule catalog replacing the built-in table
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// JSON payload produced by the notice-analysis service
    #[arg(long, conflicts_with_all = ["category", "notice_date", "due_date"])]
    pub analysis: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the context for the correspondence generator
    #[arg(long)]
    pub letter_context: bool,

    /// Letter type; defaults to prescription when expired, review otherwise
    #[arg(long, value_enum, requires = "letter_context")]
    pub response: Option<ResponseKind>,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 從分析檔或個別參數建立計算輸入
    pub fn prescription_input(&self) -> Result<PrescriptionInput> {
        let input = match &self.analysis {
            Some(path) => AnalysisPayload::from_file(path)?.to_input()?,
            None => {
                let category = self.category.as_deref().ok_or_else(|| PrescriptionError::MissingField {
                    field: "category".to_string(),
                })?;
                let notice_date = self.notice_date.as_deref().ok_or_else(|| PrescriptionError::MissingField {
                    field: "notice_date".to_string(),
                })?;
                PrescriptionInput::from_raw(category, notice_date, self.due_date.as_deref())?
            }
        };
        Ok(input.with_fraud(self.fraud).with_omission(self.omission))
    }

    /// 參考日期，未指定時使用本地日期
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(parse_optional_date("today", self.today.as_deref())?.unwrap_or_else(|| Local::now().date_naive()))
    }

    /// 建立公文上下文 (套用 --response 與分析檔中的納稅人資料)
    pub fn build_letter_context(&self, result: &CalculationResult, notice_date: NaiveDate) -> Result<LetterContext> {
        let mut context = LetterContext::from_result(result, notice_date);
        if let Some(response) = self.response {
            context = context.with_response(response);
        }
        if let Some(path) = &self.analysis {
            if let Some(taxpayer) = AnalysisPayload::from_file(path)?.taxpayer() {
                context = context.with_taxpayer(taxpayer);
            }
        }
        Ok(context)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(notice_date) = &self.notice_date {
            parse_iso_date("notice_date", notice_date)?;
        }
        parse_optional_date("due_date", self.due_date.as_deref())?;
        parse_optional_date("today", self.today.as_deref())?;
        if let Some(path) = &self.rules {
            if !path.exists() {
                return Err(PrescriptionError::InvalidValue {
                    field: "rules".to_string(),
                    value: path.display().to_string(),
                    reason: "file does not exist".to_string(),
                });
            }
        }
        Ok(())
    }
}
