//! Command validation.
//!
//! Validators check a command on its own (no account state) and accumulate
//! every failure instead of stopping at the first. Anything time-dependent
//! reads the current date through a [`Clock`].

use chrono::{DateTime, NaiveDate, Utc};

use boc_core::Validation;

use crate::account::{AcknowledgeCashDeposit, MakeTransfer};
use crate::errors;

pub const MAX_REFERENCE_LEN: usize = 140;
pub const MAX_IBAN_LEN: usize = 34;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc>,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

pub fn validate_transfer(cmd: MakeTransfer, clock: &impl Clock) -> Validation<MakeTransfer> {
    let checks: Validation<Vec<()>> = [
        date_not_past(cmd.date, clock.today()),
        positive_amount(cmd.amount),
        bic(&cmd.bic),
        iban(&cmd.iban),
        reference(&cmd.reference),
    ]
    .into_iter()
    .collect();

    checks.map(|_| cmd)
}

pub fn validate_deposit(cmd: AcknowledgeCashDeposit) -> Validation<AcknowledgeCashDeposit> {
    positive_amount(cmd.amount).map(|_| cmd)
}

// Today is still acceptable.
fn date_not_past(date: NaiveDate, today: NaiveDate) -> Validation<()> {
    if date < today {
        Validation::invalid(errors::transfer_date_is_past())
    } else {
        Validation::valid(())
    }
}

fn positive_amount(amount: i64) -> Validation<()> {
    if amount > 0 {
        Validation::valid(())
    } else {
        Validation::invalid(errors::invalid_amount(amount))
    }
}

/// Six letters (bank + country) followed by five uppercase alphanumerics.
fn bic(value: &str) -> Validation<()> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 11
        && bytes[..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

    if well_formed {
        Validation::valid(())
    } else {
        Validation::invalid(errors::invalid_bic(value))
    }
}

/// Country code, two check digits, then up to 30 alphanumerics.
fn iban(value: &str) -> Validation<()> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() > 4
        && bytes.len() <= MAX_IBAN_LEN
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..4].iter().all(u8::is_ascii_digit)
        && bytes[4..].iter().all(u8::is_ascii_alphanumeric);

    if well_formed {
        Validation::valid(())
    } else {
        Validation::invalid(errors::invalid_iban(value))
    }
}

fn reference(value: &str) -> Validation<()> {
    if value.chars().count() <= MAX_REFERENCE_LEN {
        Validation::valid(())
    } else {
        Validation::invalid(errors::reference_too_long(MAX_REFERENCE_LEN))
    }
}
