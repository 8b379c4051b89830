//! Field rules shared by the catalog, client and sale inputs.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

lazy_static! {
    /// Letters (any script), digits, spaces and `. , ' & ( ) / -`.
    pub static ref NAME_RE: Regex = Regex::new(r"^[\p{L}\p{N} .,'&()/\-]+$").unwrap();
    pub static ref TAX_DOCUMENT_RE: Regex = Regex::new(r"^[0-9A-Za-z\-]{5,20}$").unwrap();
}

/// Largest value a `DECIMAL(10, 2)` column holds.
pub fn max_money() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn money_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Non-negative amount with at most two decimals that fits the money columns.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(money_error("money_negative", "must not be negative"));
    }
    if value.normalize().scale() > 2 {
        return Err(money_error("money_scale", "must have at most 2 decimals"));
    }
    if *value > max_money() {
        return Err(money_error("money_range", "must not exceed 99999999.99"));
    }
    Ok(())
}

/// Catalog price: a money amount strictly greater than zero.
pub fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    validate_money(value)?;
    if value.is_zero() {
        return Err(money_error("price_zero", "must be greater than zero"));
    }
    Ok(())
}

/// Trims `value` in place.
pub fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trims an optional text field, turning blank input into `None`.
pub fn trim_optional(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

/// Flattens validator output into sorted `"field: message"` strings.
///
/// Nested structs are prefixed with their field name and list entries with
/// their index, e.g. `items[1].quantity: must be at least 1`.
pub fn collect_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    collect_into("", errors, &mut messages);
    messages.sort();
    messages
}

fn collect_into(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed the '{}' rule", err.code));
                    out.push(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_into(&path, inner, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_into(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("Drinks", true)]
    #[case("Café & Té", true)]
    #[case("Snacks (salty) / chips", true)]
    #[case("O'Brien-Smith Co.", true)]
    #[case("Name; DROP TABLE", false)]
    #[case("<script>", false)]
    #[case("", false)]
    fn name_charset(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(NAME_RE.is_match(input), valid, "input: {input:?}");
    }

    #[rstest]
    #[case("20123456789", true)]
    #[case("20-1234567-9", true)]
    #[case("ab12C", true)]
    #[case("1234", false)]
    #[case("123456789012345678901", false)]
    #[case("20 123 456", false)]
    fn tax_document_format(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(TAX_DOCUMENT_RE.is_match(input), valid, "input: {input:?}");
    }

    #[rstest]
    #[case(dec!(0), true)]
    #[case(dec!(15.00), true)]
    #[case(dec!(0.5), true)]
    #[case(dec!(99999999.99), true)]
    #[case(dec!(100000000.00), false)]
    #[case(dec!(-1), false)]
    #[case(dec!(1.005), false)]
    fn money_rules(#[case] value: Decimal, #[case] valid: bool) {
        assert_eq!(validate_money(&value).is_ok(), valid, "value: {value}");
    }

    #[test]
    fn price_must_be_positive() {
        assert!(validate_price(&dec!(0.01)).is_ok());
        assert!(validate_price(&dec!(0.00)).is_err());
        assert!(validate_price(&dec!(-3)).is_err());
    }

    #[test]
    fn trim_optional_drops_blank_values() {
        let mut blank = Some("   ".to_string());
        trim_optional(&mut blank);
        assert_eq!(blank, None);

        let mut padded = Some("  Acme ".to_string());
        trim_optional(&mut padded);
        assert_eq!(padded.as_deref(), Some("Acme"));
    }

    #[test]
    fn collect_messages_flattens_fields() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("must be 1-50 characters".into());
        errors.add("name", err);
        errors.add("price", ValidationError::new("price_zero"));

        assert_eq!(
            collect_messages(&errors),
            vec![
                "name: must be 1-50 characters".to_string(),
                "price: failed the 'price_zero' rule".to_string(),
            ]
        );
    }
}
