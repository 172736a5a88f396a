//! 请求体校验 / Request body validation
//!
//! 请求体通过 `#[derive(Validate)]` 声明规则，这里提供自定义规则，
//! 并把 `ValidationErrors` 转成统一的字段错误列表。
//! Request bodies declare their rules with `#[derive(Validate)]`; this module
//! holds the custom rules and turns `ValidationErrors` into field errors.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

use crate::error::{AppError, FieldError};

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// 不能有首尾空白 / No leading or trailing whitespace
pub fn validate_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim() != value {
        return Err(rule_error(
            "trimmed",
            "must not have leading or trailing whitespace",
        ));
    }
    Ok(())
}

/// 去除首尾空白后不能为空 / Must not be empty after trimming
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("not_blank", "must not be blank"));
    }
    Ok(())
}

fn message_of(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("is invalid ({})", err.code))
}

/// 每个字段只报告第一条错误，字段按名称排序
/// One message per field, fields sorted by name
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                errs.first()
                    .map(|e| FieldError::new(field.to_string(), message_of(e)))
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}
