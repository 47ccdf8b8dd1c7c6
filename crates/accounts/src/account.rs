use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use boc_core::{Aggregate, AggregateId, Validation, ValueObject};
use boc_events::{Command, Event};

use crate::errors;

/// Account identifier (aggregate id of the account stream).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub AggregateId);

impl AccountId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for AccountId {
    type Err = boc_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// ISO-4217 style currency code: three uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> Validation<Self> {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Validation::valid(Self(code.to_string()))
        } else {
            Validation::invalid(errors::invalid_currency(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for CurrencyCode {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Requested,
    Active,
    Frozen,
}

/// Immutable account snapshot.
///
/// Amounts are in the smallest currency unit (e.g. cents). `allowed_overdraft`
/// is the floor the balance may not drop below after a debit; a negative value
/// lets the account go into the red by that much.
///
/// There are no setters: a new snapshot is produced only by [`Aggregate::apply`]
/// (or by the creation constructor), and `currency` is never touched after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    currency: CurrencyCode,
    status: AccountStatus,
    balance: i64,
    allowed_overdraft: i64,
}

impl AccountState {
    /// Creation constructor: the only way to obtain state for an opened account.
    pub fn created(event: &AccountCreated) -> Self {
        Self {
            currency: event.currency.clone(),
            status: AccountStatus::Active,
            balance: 0,
            allowed_overdraft: event.allowed_overdraft,
        }
    }

    /// An account that has been requested but not yet activated.
    pub fn requested(currency: CurrencyCode) -> Self {
        Self {
            currency,
            status: AccountStatus::Requested,
            balance: 0,
            allowed_overdraft: 0,
        }
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn allowed_overdraft(&self) -> i64 {
        self.allowed_overdraft
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

impl Aggregate for AccountState {
    type Event = AccountEvent;

    fn create(event: &AccountEvent) -> Option<Self> {
        match event {
            AccountEvent::AccountCreated(e) => Some(Self::created(e)),
            _ => None,
        }
    }

    fn apply(self, event: &AccountEvent) -> Self {
        match event {
            // Creation only happens through `create`; on existing state it is a no-op.
            AccountEvent::AccountCreated(_) => self,
            // Saturating so that a foreign history can never panic a replay;
            // transitions reject anything that would reach the bounds.
            AccountEvent::CashDeposited(e) => Self {
                balance: self.balance.saturating_add(e.amount),
                ..self
            },
            AccountEvent::TransferDebited(e) => Self {
                balance: self.balance.saturating_sub(e.amount),
                ..self
            },
            AccountEvent::OverdraftAltered(e) => Self {
                allowed_overdraft: self.allowed_overdraft.saturating_add(e.delta),
                ..self
            },
            AccountEvent::AccountFrozen(_) => Self {
                status: AccountStatus::Frozen,
                allowed_overdraft: 0,
                ..self
            },
        }
    }
}

/// Command: CreateAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccount {
    pub account_id: AccountId,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub allowed_overdraft: i64,
    pub timestamp: DateTime<Utc>,
}

impl CreateAccount {
    pub fn to_created(&self) -> AccountCreated {
        AccountCreated {
            account_id: self.account_id,
            currency: self.currency.clone(),
            allowed_overdraft: self.allowed_overdraft,
            occurred_at: self.timestamp,
        }
    }

    pub fn to_event(&self) -> AccountEvent {
        AccountEvent::AccountCreated(self.to_created())
    }
}

/// Command: AcknowledgeCashDeposit (cash was paid in at a branch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgeCashDeposit {
    pub account_id: AccountId,
    pub amount: i64,
    pub branch_id: String,
    pub timestamp: DateTime<Utc>,
}

impl AcknowledgeCashDeposit {
    pub fn to_event(&self) -> AccountEvent {
        AccountEvent::CashDeposited(CashDeposited {
            account_id: self.account_id,
            amount: self.amount,
            branch_id: self.branch_id.clone(),
            occurred_at: self.timestamp,
        })
    }
}

/// Command: MakeTransfer (debit this account in favour of a beneficiary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeTransfer {
    pub account_id: AccountId,
    pub beneficiary: String,
    pub iban: String,
    pub bic: String,
    /// Requested execution date.
    pub date: NaiveDate,
    pub amount: i64,
    pub reference: String,
    pub timestamp: DateTime<Utc>,
}

impl MakeTransfer {
    pub fn to_event(&self) -> AccountEvent {
        AccountEvent::TransferDebited(TransferDebited {
            account_id: self.account_id,
            beneficiary: self.beneficiary.clone(),
            iban: self.iban.clone(),
            bic: self.bic.clone(),
            amount: self.amount,
            reference: self.reference.clone(),
            occurred_at: self.timestamp,
        })
    }
}

/// Command: SetOverdraft (absolute value requested by the caller).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOverdraft {
    pub account_id: AccountId,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

impl SetOverdraft {
    /// The event stores the change, not the requested value.
    pub fn to_event(&self, delta: i64) -> AccountEvent {
        AccountEvent::OverdraftAltered(OverdraftAltered {
            account_id: self.account_id,
            delta,
            occurred_at: self.timestamp,
        })
    }
}

/// Command: FreezeAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeAccount {
    pub account_id: AccountId,
    pub timestamp: DateTime<Utc>,
}

impl FreezeAccount {
    pub fn to_event(&self) -> AccountEvent {
        AccountEvent::AccountFrozen(AccountFrozen {
            account_id: self.account_id,
            occurred_at: self.timestamp,
        })
    }
}

/// Commands against an existing account.
///
/// `CreateAccount` is not part of this enum: it targets a stream that does not
/// exist yet and needs no prior state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCommand {
    AcknowledgeCashDeposit(AcknowledgeCashDeposit),
    MakeTransfer(MakeTransfer),
    SetOverdraft(SetOverdraft),
    FreezeAccount(FreezeAccount),
}

impl Command for CreateAccount {
    fn target_aggregate_id(&self) -> AggregateId {
        self.account_id.0
    }
}

impl Command for AccountCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            AccountCommand::AcknowledgeCashDeposit(c) => c.account_id.0,
            AccountCommand::MakeTransfer(c) => c.account_id.0,
            AccountCommand::SetOverdraft(c) => c.account_id.0,
            AccountCommand::FreezeAccount(c) => c.account_id.0,
        }
    }
}

/// Event: AccountCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account_id: AccountId,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub allowed_overdraft: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CashDeposited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashDeposited {
    pub account_id: AccountId,
    pub amount: i64,
    pub branch_id: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransferDebited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDebited {
    pub account_id: AccountId,
    pub beneficiary: String,
    pub iban: String,
    pub bic: String,
    pub amount: i64,
    pub reference: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OverdraftAltered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdraftAltered {
    pub account_id: AccountId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AccountFrozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFrozen {
    pub account_id: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    AccountCreated(AccountCreated),
    CashDeposited(CashDeposited),
    TransferDebited(TransferDebited),
    OverdraftAltered(OverdraftAltered),
    AccountFrozen(AccountFrozen),
}

impl AccountEvent {
    pub const CREATED: &'static str = "bank.account.created";
    pub const CASH_DEPOSITED: &'static str = "bank.account.cash_deposited";
    pub const TRANSFER_DEBITED: &'static str = "bank.account.transfer_debited";
    pub const OVERDRAFT_ALTERED: &'static str = "bank.account.overdraft_altered";
    pub const FROZEN: &'static str = "bank.account.frozen";

    /// Every tag the account state machine knows how to apply.
    pub const EVENT_TYPES: [&'static str; 5] = [
        Self::CREATED,
        Self::CASH_DEPOSITED,
        Self::TRANSFER_DEBITED,
        Self::OVERDRAFT_ALTERED,
        Self::FROZEN,
    ];

    pub fn account_id(&self) -> AccountId {
        match self {
            AccountEvent::AccountCreated(e) => e.account_id,
            AccountEvent::CashDeposited(e) => e.account_id,
            AccountEvent::TransferDebited(e) => e.account_id,
            AccountEvent::OverdraftAltered(e) => e.account_id,
            AccountEvent::AccountFrozen(e) => e.account_id,
        }
    }

    pub fn is_creation(&self) -> bool {
        matches!(self, AccountEvent::AccountCreated(_))
    }
}

impl Event for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated(_) => Self::CREATED,
            AccountEvent::CashDeposited(_) => Self::CASH_DEPOSITED,
            AccountEvent::TransferDebited(_) => Self::TRANSFER_DEBITED,
            AccountEvent::OverdraftAltered(_) => Self::OVERDRAFT_ALTERED,
            AccountEvent::AccountFrozen(_) => Self::FROZEN,
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::AccountCreated(e) => e.occurred_at,
            AccountEvent::CashDeposited(e) => e.occurred_at,
            AccountEvent::TransferDebited(e) => e.occurred_at,
            AccountEvent::OverdraftAltered(e) => e.occurred_at,
            AccountEvent::AccountFrozen(e) => e.occurred_at,
        }
    }
}
