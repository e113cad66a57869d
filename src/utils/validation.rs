use crate::utils::error::{PrescriptionError, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 解析日期，時區採用本地時區
pub fn parse_iso_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    parse_iso_date_in(field_name, value, &Local)
}

/// 解析日期 (YYYY-MM-DD、YYYY-MM-DDTHH:MM:SS 或 RFC 3339)
///
/// 時間部分會被捨去。RFC 3339 時間戳先轉換到 `tz`，所有時間戳都以同一時區的午夜截斷。
/// 解析失敗時回傳錯誤，不會改用其他日期
pub fn parse_iso_date_in<Tz: TimeZone>(field_name: &str, value: &str, tz: &Tz) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PrescriptionError::MissingField {
            field: field_name.to_string(),
        });
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(tz).date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }

    Err(PrescriptionError::InvalidDate {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: "expected an ISO-8601 date (YYYY-MM-DD)".to_string(),
    })
}

pub fn parse_optional_date(field_name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    parse_optional_date_in(field_name, value, &Local)
}

pub fn parse_optional_date_in<Tz: TimeZone>(
    field_name: &str,
    value: Option<&str>,
    tz: &Tz,
) -> Result<Option<NaiveDate>> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_iso_date_in(field_name, v, tz).map(Some),
        _ => Ok(None),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| PrescriptionError::MissingField {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PrescriptionError::InvalidValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PrescriptionError::InvalidValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
