//! Bank account domain module (event-sourced).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Commands are
//! validated against current state by transitions, accepted commands become
//! events, and events are the only way account state changes.

pub mod account;
pub mod errors;
pub mod transitions;
pub mod validators;

pub use account::{
    AccountCommand, AccountCreated, AccountEvent, AccountFrozen, AccountId, AccountState,
    AccountStatus, AcknowledgeCashDeposit, CashDeposited, CreateAccount, CurrencyCode,
    FreezeAccount, MakeTransfer, OverdraftAltered, SetOverdraft, TransferDebited,
};
pub use transitions::{create, debit, deposit, freeze, open_account, set_overdraft};
pub use validators::{Clock, SystemClock, validate_deposit, validate_transfer};
