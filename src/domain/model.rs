use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 規則表支援的稅種
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxCategory {
    IncomeTax,
    CorporateTax,
    Vat,
    RealEstateTax,
    PropertyTax,
    HousingTax,
    ProfessionalTax,
    UrbanTax,
    RuralTax,
    CleaningTax,
    RegistrationDuties,
    StampDuties,
    EnvironmentalFees,
    CommunityServices,
    CustomsDuties,
    Cnss,
    Other,
}

impl TaxCategory {
    pub const ALL: [TaxCategory; 17] = [
        TaxCategory::IncomeTax,
        TaxCategory::CorporateTax,
        TaxCategory::Vat,
        TaxCategory::RealEstateTax,
        TaxCategory::PropertyTax,
        TaxCategory::HousingTax,
        TaxCategory::ProfessionalTax,
        TaxCategory::UrbanTax,
        TaxCategory::RuralTax,
        TaxCategory::CleaningTax,
        TaxCategory::RegistrationDuties,
        TaxCategory::StampDuties,
        TaxCategory::EnvironmentalFees,
        TaxCategory::CommunityServices,
        TaxCategory::CustomsDuties,
        TaxCategory::Cnss,
        TaxCategory::Other,
    ];

    /// 穩定的機器鍵值，與 serde 表示相同
    pub fn key(self) -> &'static str {
        match self {
            TaxCategory::IncomeTax => "income_tax",
            TaxCategory::CorporateTax => "corporate_tax",
            TaxCategory::Vat => "vat",
            TaxCategory::RealEstateTax => "real_estate_tax",
            TaxCategory::PropertyTax => "property_tax",
            TaxCategory::HousingTax => "housing_tax",
            TaxCategory::ProfessionalTax => "professional_tax",
            TaxCategory::UrbanTax => "urban_tax",
            TaxCategory::RuralTax => "rural_tax",
            TaxCategory::CleaningTax => "cleaning_tax",
            TaxCategory::RegistrationDuties => "registration_duties",
            TaxCategory::StampDuties => "stamp_duties",
            TaxCategory::EnvironmentalFees => "environmental_fees",
            TaxCategory::CommunityServices => "community_services",
            TaxCategory::CustomsDuties => "customs_duties",
            TaxCategory::Cnss => "cnss",
            TaxCategory::Other => "other",
        }
    }

    /// 摩洛哥稅單上的阿拉伯文名稱
    pub fn label(self) -> &'static str {
        match self {
            TaxCategory::IncomeTax => "ضريبة الدخل",
            TaxCategory::CorporateTax => "ضريبة الشركات",
            TaxCategory::Vat => "الضريبة على القيمة المضافة",
            TaxCategory::RealEstateTax => "الضريبة العقارية",
            TaxCategory::PropertyTax => "الضريبة على الأملاك",
            TaxCategory::HousingTax => "ضريبة السكن",
            TaxCategory::ProfessionalTax => "الضريبة المهنية",
            TaxCategory::UrbanTax => "الرسم الحضري",
            TaxCategory::RuralTax => "الرسم القروي",
            TaxCategory::CleaningTax => "ضريبة النظافة",
            TaxCategory::RegistrationDuties => "رسوم التسجيل",
            TaxCategory::StampDuties => "رسوم الطابع",
            TaxCategory::EnvironmentalFees => "الرسوم البيئية",
            TaxCategory::CommunityServices => "الخدمات الجماعية",
            TaxCategory::CustomsDuties => "الرسوم الجمركية",
            TaxCategory::Cnss => "اشتراكات الضمان الاجتماعي",
            TaxCategory::Other => "ضريبة أخرى",
        }
    }

    /// 嚴格比對 (鍵值、阿拉伯文名稱或變體名稱)
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim();
        let folded: String = needle
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL.into_iter().find(|category| {
            category.label() == needle
                || category.key().eq_ignore_ascii_case(needle)
                || category.key().replace('_', "") == folded
        })
    }

    /// 寬鬆比對：無法辨識時使用 [`TaxCategory::Other`]
    pub fn coerce(value: &str) -> Self {
        match Self::parse(value) {
            Some(category) => category,
            None => {
                tracing::debug!(value, "unrecognised tax category, using 'other'");
                TaxCategory::Other
            }
        }
    }
}

impl fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 規則的法源依據
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalBasis {
    #[serde(rename = "cgi_article_232")]
    CgiArticle232,
    #[serde(rename = "cgi_article_123")]
    CgiArticle123,
    CgiGeneral,
    #[serde(rename = "law_47_06")]
    Law4706,
    FinanceLaw,
    CustomsCode,
    CnssLaw,
    EnvironmentalLaw,
    LocalRegulations,
}

impl LegalBasis {
    pub fn citation(self) -> &'static str {
        match self {
            LegalBasis::CgiArticle232 => "المادة 232 من المدونة العامة للضرائب",
            LegalBasis::CgiArticle123 => "المادة 123 من المدونة العامة للضرائب",
            LegalBasis::CgiGeneral => "المبادئ العامة للمدونة العامة للضرائب",
            LegalBasis::Law4706 => "القانون 47-06 المتعلق بالجماعات الترابية",
            LegalBasis::FinanceLaw => "قانون المالية",
            LegalBasis::CustomsCode => "المجموعة الجمركية",
            LegalBasis::CnssLaw => "القانون المنظم للصندوق الوطني للضمان الاجتماعي",
            LegalBasis::EnvironmentalLaw => "القانون البيئي",
            LegalBasis::LocalRegulations => "الأنظمة المحلية",
        }
    }
}

impl fmt::Display for LegalBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.citation())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    Fraud,
    Omission,
}

/// 例外情形 (詐欺、漏報) 成立時取代基本年數的時效
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omission: Option<u32>,
}

impl ExceptionOverrides {
    pub fn years_for(&self, kind: ExceptionKind) -> Option<u32> {
        match kind {
            ExceptionKind::Fraud => self.fraud,
            ExceptionKind::Omission => self.omission,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionRule {
    pub id: String,
    pub category: TaxCategory,
    pub prescription_years: u32,
    /// 保留欄位，規則表驗證會拒絕非零值
    #[serde(default)]
    pub prescription_months: u32,
    pub legal_basis: LegalBasis,
    pub effective_from: NaiveDate,
    /// 含當日；`None` 表示仍然有效
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_until: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_overrides: Option<ExceptionOverrides>,
}

impl PrescriptionRule {
    /// `date` 是否落在 `[effective_from, effective_until]`
    pub fn is_in_force_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_until.map_or(true, |until| date <= until)
    }

    pub fn override_for(&self, kind: ExceptionKind) -> Option<u32> {
        self.exception_overrides
            .as_ref()
            .and_then(|overrides| overrides.years_for(kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    Active,
    Expired,
}

/// 計算結果 (輸入改變時整個重新計算)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub category: TaxCategory,
    pub rule_id: String,
    pub prescription_years: u32,
    pub legal_basis: LegalBasis,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PrescriptionStatus,
    pub days_remaining: i64,
    pub days_expired: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_notes: Option<String>,
    pub is_exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_exception: Option<ExceptionKind>,
}

impl CalculationResult {
    pub fn is_expired(&self) -> bool {
        self.status == PrescriptionStatus::Expired
    }

    /// 到 `today` 為止已經過的時效比例 (0..=100)
    pub fn elapsed_percent(&self, today: NaiveDate) -> f64 {
        let total = (self.end_date - self.start_date).num_days();
        if total <= 0 {
            return 100.0;
        }
        let elapsed = (today - self.start_date).num_days();
        (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_accepts_key_label_and_variant_name() {
        assert_eq!(TaxCategory::parse("income_tax"), Some(TaxCategory::IncomeTax));
        assert_eq!(TaxCategory::parse("ضريبة الدخل"), Some(TaxCategory::IncomeTax));
        assert_eq!(TaxCategory::parse("IncomeTax"), Some(TaxCategory::IncomeTax));
        assert_eq!(TaxCategory::parse(" REGISTRATION_DUTIES "), Some(TaxCategory::RegistrationDuties));
        assert_eq!(TaxCategory::parse("wealth tax"), None);
    }

    #[test]
    fn test_category_coerce_falls_back_to_other() {
        assert_eq!(TaxCategory::coerce("ضريبة غير معروفة"), TaxCategory::Other);
        assert_eq!(TaxCategory::coerce(""), TaxCategory::Other);
        assert_eq!(TaxCategory::coerce("cnss"), TaxCategory::Cnss);
    }

    #[test]
    fn test_category_keys_match_serde() {
        for category in TaxCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.key()));
        }
    }

    #[test]
    fn test_rule_window_is_inclusive() {
        let rule = PrescriptionRule {
            id: "window".to_string(),
            category: TaxCategory::RegistrationDuties,
            prescription_years: 10,
            prescription_months: 0,
            legal_basis: LegalBasis::CgiGeneral,
            effective_from: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            effective_until: NaiveDate::from_ymd_opt(2015, 12, 31),
            special_conditions: None,
            exception_overrides: None,
        };
        assert!(rule.is_in_force_on(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()));
        assert!(rule.is_in_force_on(NaiveDate::from_ymd_opt(2015, 12, 31).unwrap()));
        assert!(!rule.is_in_force_on(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()));
        assert!(!rule.is_in_force_on(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()));
    }

    #[test]
    fn test_elapsed_percent_is_clamped() {
        let result = CalculationResult {
            category: TaxCategory::Vat,
            rule_id: "tva-rule".to_string(),
            prescription_years: 4,
            legal_basis: LegalBasis::CgiGeneral,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: PrescriptionStatus::Active,
            days_remaining: 0,
            days_expired: 0,
            special_notes: None,
            is_exception: false,
            applied_exception: None,
        };
        assert_eq!(result.elapsed_percent(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()), 0.0);
        assert_eq!(result.elapsed_percent(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()), 100.0);
        let midway = result.elapsed_percent(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert!(midway > 49.0 && midway < 51.0);
    }
}
