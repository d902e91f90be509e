//! Bounds for money fields and overflow-checked totals.

use rust_decimal::Decimal;

use crate::error::{CrmError, CrmResult};

/// Largest amount accepted for any single money field: 1,000,000,000,000.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Accepts `0..=MAX_AMOUNT`; `field` names the input in the error message.
pub fn checked_amount(value: Decimal, field: &str) -> CrmResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CrmError::Validation(format!("{} must not be negative", field)));
    }
    if value > MAX_AMOUNT {
        return Err(CrmError::Validation(format!(
            "{} must not exceed {}",
            field, MAX_AMOUNT
        )));
    }
    Ok(value)
}

pub fn add_amount(total: Decimal, value: Decimal) -> CrmResult<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| CrmError::Store("monetary total is out of range".to_string()))
}

pub fn sum_amounts<I>(values: I) -> CrmResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, add_amount)
}
