use crate::domain::model::{
    CalculationResult, ExceptionKind, PrescriptionRule, PrescriptionStatus, TaxCategory,
};
use crate::domain::ports::RuleResolver;
use crate::utils::error::{PrescriptionError, Result};
use crate::utils::validation::{parse_iso_date_in, parse_optional_date_in};
use chrono::{Local, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// 計算所需的輸入 (不含「今天」)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionInput {
    pub category: TaxCategory,
    pub notice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub has_fraud: bool,
    #[serde(default)]
    pub has_omission: bool,
}

impl PrescriptionInput {
    pub fn new(category: TaxCategory, notice_date: NaiveDate, due_date: NaiveDate) -> Self {
        Self {
            category,
            notice_date,
            due_date,
            has_fraud: false,
            has_omission: false,
        }
    }

    pub fn with_fraud(mut self, has_fraud: bool) -> Self {
        self.has_fraud = has_fraud;
        self
    }

    pub fn with_omission(mut self, has_omission: bool) -> Self {
        self.has_omission = has_omission;
        self
    }

    /// 從未型別化的字串建立輸入，時間戳以本地時區截斷為日期
    pub fn from_raw(category: &str, notice_date: &str, due_date: Option<&str>) -> Result<Self> {
        Self::from_raw_in(category, notice_date, due_date, &Local)
    }

    /// 從字串建立輸入：稅種寬鬆轉換，日期嚴格解析，缺少到期日時使用通知日
    ///
    /// RFC 3339 時間戳先轉換到 `tz` 再截斷為日期
    pub fn from_raw_in<Tz: TimeZone>(
        category: &str,
        notice_date: &str,
        due_date: Option<&str>,
        tz: &Tz,
    ) -> Result<Self> {
        let notice_date = parse_iso_date_in("notice_date", notice_date, tz)?;
        let due_date = parse_optional_date_in("due_date", due_date, tz)?.unwrap_or(notice_date);
        Ok(Self::new(TaxCategory::coerce(category), notice_date, due_date))
    }
}

/// 加上整數年；2/29 遇到非閏年時落在 2/28
pub fn add_years(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    years
        .checked_mul(12)
        .and_then(|months| date.checked_add_months(Months::new(months)))
        .ok_or_else(|| PrescriptionError::InvalidValue {
            field: "prescription_years".to_string(),
            value: years.to_string(),
            reason: format!("adding {} years to {} leaves the supported date range", years, date),
        })
}

/// 選擇時效年數 (詐欺優先於漏報)
fn effective_years(
    rule: &PrescriptionRule,
    has_fraud: bool,
    has_omission: bool,
) -> (u32, Option<ExceptionKind>) {
    if has_fraud {
        if let Some(years) = rule.override_for(ExceptionKind::Fraud) {
            return (years, Some(ExceptionKind::Fraud));
        }
    }
    if has_omission {
        if let Some(years) = rule.override_for(ExceptionKind::Omission) {
            return (years, Some(ExceptionKind::Omission));
        }
    }
    (rule.prescription_years, None)
}

/// Computes the prescription window and its status on `today`.
///
/// The window starts at the later of the notice and due dates. The rule is
/// resolved against the notice date. Status is `Expired` only when `today` is
/// strictly after the end date.
pub fn calculate<R: RuleResolver + ?Sized>(
    resolver: &R,
    input: &PrescriptionInput,
    today: NaiveDate,
) -> Result<CalculationResult> {
    if input.has_fraud && input.has_omission {
        tracing::warn!(category = %input.category, "both fraud and omission set, fraud takes priority");
    }

    let start_date = input.notice_date.max(input.due_date);
    let rule = resolver.resolve_rule(input.category, input.notice_date);
    let (prescription_years, applied_exception) =
        effective_years(rule, input.has_fraud, input.has_omission);
    let end_date = add_years(start_date, prescription_years)?;

    let status = if today > end_date {
        PrescriptionStatus::Expired
    } else {
        PrescriptionStatus::Active
    };
    let days_until_end = (end_date - today).num_days();

    tracing::debug!(
        category = %input.category,
        rule_id = %rule.id,
        prescription_years,
        %start_date,
        %end_date,
        ?status,
        "prescription calculated"
    );

    Ok(CalculationResult {
        category: input.category,
        rule_id: rule.id.clone(),
        prescription_years,
        legal_basis: rule.legal_basis,
        start_date,
        end_date,
        status,
        days_remaining: days_until_end.max(0),
        days_expired: (-days_until_end).max(0),
        special_notes: rule.special_conditions.clone(),
        is_exception: applied_exception.is_some(),
        applied_exception,
    })
}

/// 綁定單一規則來源的計算器
pub struct PrescriptionCalculator<R: RuleResolver> {
    resolver: R,
}

impl<R: RuleResolver> PrescriptionCalculator<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn calculate(&self, input: &PrescriptionInput, today: NaiveDate) -> Result<CalculationResult> {
        calculate(&self.resolver, input, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::RuleCatalog;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_years_clamps_leap_day() {
        assert_eq!(add_years(date(2020, 2, 29), 1).unwrap(), date(2021, 2, 28));
        assert_eq!(add_years(date(2020, 2, 29), 4).unwrap(), date(2024, 2, 29));
        assert_eq!(add_years(date(2023, 1, 10), 4).unwrap(), date(2027, 1, 10));
    }

    #[test]
    fn test_add_years_out_of_range() {
        let err = add_years(date(2023, 1, 10), u32::MAX).unwrap_err();
        assert_eq!(err.field(), Some("prescription_years"));
    }

    #[test]
    fn test_omission_override() {
        let catalog = RuleCatalog::moroccan().unwrap();
        let input = PrescriptionInput::new(TaxCategory::CorporateTax, date(2020, 3, 1), date(2020, 3, 1))
            .with_omission(true);
        let result = calculate(&catalog, &input, date(2020, 3, 1)).unwrap();
        assert_eq!(result.prescription_years, 6);
        assert_eq!(result.applied_exception, Some(ExceptionKind::Omission));
        assert_eq!(result.end_date, date(2026, 3, 1));
    }

    #[test]
    fn test_flag_without_override_keeps_base_period() {
        let catalog = RuleCatalog::moroccan().unwrap();
        let input = PrescriptionInput::new(TaxCategory::CustomsDuties, date(2020, 3, 1), date(2020, 3, 1))
            .with_fraud(true);
        let result = calculate(&catalog, &input, date(2020, 3, 1)).unwrap();
        assert_eq!(result.prescription_years, 3);
        assert!(!result.is_exception);
        assert_eq!(result.applied_exception, None);
    }

    #[test]
    fn test_from_raw_defaults_due_date() {
        let input = PrescriptionInput::from_raw("vat", "2022-06-15", None).unwrap();
        assert_eq!(input.category, TaxCategory::Vat);
        assert_eq!(input.due_date, date(2022, 6, 15));

        let err = PrescriptionInput::from_raw("vat", "2022-06-15", Some("15/07/2022")).unwrap_err();
        assert_eq!(err.field(), Some("due_date"));
    }

    #[test]
    fn test_from_raw_cuts_offset_timestamps_in_one_zone() {
        // 兩個時間戳換算成 UTC-05:00 都是 2023-01-10
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let input = PrescriptionInput::from_raw_in(
            "vat",
            "2023-01-10T23:30:00-05:00",
            Some("2023-01-11T00:30:00+03:00"),
            &zone,
        )
        .unwrap();
        assert_eq!(input.notice_date, date(2023, 1, 10));
        assert_eq!(input.due_date, date(2023, 1, 10));

        let catalog = RuleCatalog::moroccan().unwrap();
        let result = calculate(&catalog, &input, date(2023, 1, 10)).unwrap();
        assert_eq!(result.start_date, date(2023, 1, 10));
        assert_eq!(result.end_date, date(2027, 1, 10));
    }

    #[test]
    fn test_calculator_wraps_resolver() {
        let calculator = PrescriptionCalculator::new(RuleCatalog::moroccan().unwrap());
        let input = PrescriptionInput::new(TaxCategory::Cnss, date(2019, 5, 20), date(2019, 4, 30));
        let result = calculator.calculate(&input, date(2024, 5, 21)).unwrap();
        assert_eq!(result.start_date, date(2019, 5, 20));
        assert_eq!(result.end_date, date(2024, 5, 20));
        assert_eq!(result.status, PrescriptionStatus::Expired);
        assert_eq!(result.days_expired, 1);
        assert_eq!(result.days_remaining, 0);
    }
}
