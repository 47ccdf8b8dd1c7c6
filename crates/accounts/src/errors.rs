//! Catalogue of account business errors.
//!
//! Codes are stable identifiers; callers and tests compare on them.

use boc_core::Error;

pub const ACCOUNT_NOT_ACTIVE: &str = "AccountNotActive";
pub const INSUFFICIENT_BALANCE: &str = "InsufficientBalance";
pub const TRANSFER_DATE_IS_PAST: &str = "TransferDateIsPast";
pub const INVALID_AMOUNT: &str = "InvalidAmount";
pub const INVALID_CURRENCY: &str = "InvalidCurrency";
pub const INVALID_BIC: &str = "InvalidBic";
pub const INVALID_IBAN: &str = "InvalidIban";
pub const REFERENCE_TOO_LONG: &str = "ReferenceTooLong";
pub const AMOUNT_OUT_OF_RANGE: &str = "AmountOutOfRange";

pub fn account_not_active() -> Error {
    Error::new(ACCOUNT_NOT_ACTIVE, "the account is not active")
}

pub fn insufficient_balance() -> Error {
    Error::new(INSUFFICIENT_BALANCE, "insufficient balance for this operation")
}

pub fn transfer_date_is_past() -> Error {
    Error::new(TRANSFER_DATE_IS_PAST, "transfer date cannot be in the past")
}

pub fn invalid_amount(amount: i64) -> Error {
    Error::new(INVALID_AMOUNT, format!("amount must be positive (got {amount})"))
}

pub fn invalid_currency(code: &str) -> Error {
    Error::new(INVALID_CURRENCY, format!("'{code}' is not a valid currency code"))
}

pub fn invalid_bic(bic: &str) -> Error {
    Error::new(INVALID_BIC, format!("'{bic}' is not a valid BIC"))
}

pub fn invalid_iban(iban: &str) -> Error {
    Error::new(INVALID_IBAN, format!("'{iban}' is not a valid IBAN"))
}

pub fn reference_too_long(max: usize) -> Error {
    Error::new(REFERENCE_TOO_LONG, format!("reference exceeds {max} characters"))
}

/// The resulting balance or overdraft would not fit in an `i64`.
pub fn amount_out_of_range() -> Error {
    Error::new(AMOUNT_OUT_OF_RANGE, "resulting amount is out of range")
}
