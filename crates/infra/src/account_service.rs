//! Account command execution (application-level orchestration).
//!
//! ```text
//! Command
//!   ↓
//! 1. Lock the account (one in-flight command per account)
//!   ↓
//! 2. Load the stream and hydrate current state
//!   ↓
//! 3. Run the transition (pure decision: event + new state, or errors)
//!   ↓
//! 4. Append with an exact expected version
//!   ↓
//! 5. Publish the committed event to subscribers
//! ```
//!
//! State is always hydrated from the store the event is appended to, under the
//! account lock, so a command sees every earlier accepted command. A version
//! conflict from a writer outside this service is retried from step 2 up to
//! `ServiceConfig::max_retries` times.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use boc_accounts::{
    AccountCommand, AccountEvent, AccountId, AccountState, AcknowledgeCashDeposit, Clock, CreateAccount,
    FreezeAccount, MakeTransfer, SetOverdraft, debit, deposit, freeze, open_account, set_overdraft,
    validate_deposit, validate_transfer,
};
use boc_core::{Errors, ExpectedVersion, HistoryError, Optional, Transition};
use boc_events::{Command, EventBus, EventEnvelope, Subscription};

use crate::account_repository::{AccountRepository, LoadedAccount, RepositoryError};
use crate::config::ServiceConfig;
use crate::event_store::{EventStore, EventStoreError, PublishingEventStore};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command broke one or more business rules; nothing was stored.
    #[error("command rejected: {0}")]
    Rejected(Errors),

    #[error("account {0} not found")]
    NotFound(AccountId),

    #[error("account {0} already exists")]
    AlreadyExists(AccountId),

    /// The stored history cannot be replayed.
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Store(EventStoreError),

    /// The event is stored but subscribers were not notified.
    #[error("event publication failed: {0}")]
    Publish(String),

    #[error("concurrency conflict after {attempts} attempts: {message}")]
    Concurrency { attempts: u32, message: String },
}

impl DispatchError {
    fn from_store(err: EventStoreError, attempts: u32) -> Self {
        match err {
            EventStoreError::Concurrency(message) => DispatchError::Concurrency { attempts, message },
            EventStoreError::Publish(message) => DispatchError::Publish(message),
            other => DispatchError::Store(other),
        }
    }
}

impl From<RepositoryError> for DispatchError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Store(err) => DispatchError::from_store(err, 1),
            RepositoryError::History(err) => DispatchError::History(err),
        }
    }
}

/// Result of an accepted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub event: AccountEvent,
    pub state: AccountState,
    /// Stream version after the append.
    pub version: u64,
}

type LockTable = Mutex<HashMap<AccountId, Arc<Mutex<()>>>>;

/// Claim on one account's command lock.
///
/// The table entry is dropped together with the last claim, so the table only
/// holds accounts that currently have a command in flight or waiting.
struct AccountLock<'a> {
    table: &'a LockTable,
    account_id: AccountId,
    lock: Arc<Mutex<()>>,
}

impl Drop for AccountLock<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table plus ours: nobody else is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.account_id);
        }
    }
}

pub struct AccountService<S, B> {
    repository: AccountRepository<PublishingEventStore<S, B>>,
    config: ServiceConfig,
    locks: LockTable,
}

impl<S, B> AccountService<S, B> {
    pub fn new(store: S, bus: B, config: ServiceConfig) -> Self {
        let repository = AccountRepository::new(PublishingEventStore::new(store, bus), config.aggregate_type.clone());
        Self {
            repository,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // The mutexes guard no data, so a panic in another command leaves nothing
    // inconsistent and poisoning is ignored.
    fn account_lock(&self, account_id: AccountId) -> AccountLock<'_> {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = table.entry(account_id).or_default().clone();
        AccountLock {
            table: &self.locks,
            account_id,
            lock,
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<S, B> AccountService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn subscribe(&self) -> Subscription<EventEnvelope<JsonValue>> {
        self.repository.store().subscribe()
    }

    /// Current state of the account, or empty if it was never opened.
    pub fn load(&self, account_id: AccountId) -> Result<Optional<AccountState>, DispatchError> {
        Ok(self.load_stream(account_id)?.state)
    }

    /// Open a new account. Fails with `AlreadyExists` if the stream has any event.
    #[instrument(skip(self, cmd), fields(account_id = %cmd.account_id))]
    pub fn open(&self, cmd: CreateAccount) -> Result<AccountUpdate, DispatchError> {
        let account_id = cmd.account_id;
        let claim = self.account_lock(account_id);
        let _guard = claim.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loaded = self.load_stream(account_id)?;
        if loaded.version > 0 {
            warn!(version = loaded.version, "account already exists");
            return Err(DispatchError::AlreadyExists(account_id));
        }

        let (event, state) = open_account(&cmd).into_result().map_err(DispatchError::Rejected)?;
        match self.commit(account_id, event, state, ExpectedVersion::Exact(0)) {
            Ok(update) => Ok(update),
            Err(EventStoreError::Concurrency(_)) => Err(DispatchError::AlreadyExists(account_id)),
            Err(err) => Err(DispatchError::from_store(err, 1)),
        }
    }

    /// Run `transition` against the account's current state and persist its event.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub fn execute<T>(&self, account_id: AccountId, transition: T) -> Result<AccountUpdate, DispatchError>
    where
        T: Transition<AccountState, AccountEvent>,
    {
        let claim = self.account_lock(account_id);
        let _guard = claim.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let loaded = self.load_stream(account_id)?;
            let state = loaded.state.fold(|| Err(DispatchError::NotFound(account_id)), Ok)?;

            let (event, next) = transition.run(&state).into_result().map_err(|errors| {
                info!(errors = %errors, "command rejected");
                DispatchError::Rejected(errors)
            })?;

            match self.commit(account_id, event, next, ExpectedVersion::Exact(loaded.version)) {
                Ok(update) => return Ok(update),
                Err(EventStoreError::Concurrency(message)) if attempt <= self.config.max_retries => {
                    warn!(attempt, %message, "concurrency conflict, retrying");
                }
                Err(err) => return Err(DispatchError::from_store(err, attempt)),
            }
        }
    }

    pub fn deposit(&self, cmd: AcknowledgeCashDeposit) -> Result<AccountUpdate, DispatchError> {
        let cmd = validate_deposit(cmd).into_result().map_err(DispatchError::Rejected)?;
        self.execute(cmd.account_id, deposit(cmd))
    }

    /// Validate the transfer, then debit the account.
    ///
    /// Field errors are accumulated; the debit is only attempted on a valid
    /// command, so a rejection carries either field errors or a state error.
    /// Validation runs once; retries only re-run the debit.
    pub fn make_transfer(&self, cmd: MakeTransfer, clock: &impl Clock) -> Result<AccountUpdate, DispatchError> {
        let account_id = cmd.account_id;
        let validated = validate_transfer(cmd, clock);
        self.execute(account_id, |state: &AccountState| {
            validated.clone().bind(|valid| debit(valid).run(state))
        })
    }

    pub fn set_overdraft(&self, cmd: SetOverdraft) -> Result<AccountUpdate, DispatchError> {
        self.execute(cmd.account_id, set_overdraft(cmd))
    }

    pub fn freeze(&self, cmd: FreezeAccount) -> Result<AccountUpdate, DispatchError> {
        self.execute(cmd.account_id, freeze(cmd))
    }

    /// Route any command against an existing account.
    #[instrument(skip_all, fields(account_id = %cmd.target_aggregate_id()))]
    pub fn dispatch(&self, cmd: AccountCommand, clock: &impl Clock) -> Result<AccountUpdate, DispatchError> {
        match cmd {
            AccountCommand::AcknowledgeCashDeposit(cmd) => self.deposit(cmd),
            AccountCommand::MakeTransfer(cmd) => self.make_transfer(cmd, clock),
            AccountCommand::SetOverdraft(cmd) => self.set_overdraft(cmd),
            AccountCommand::FreezeAccount(cmd) => self.freeze(cmd),
        }
    }

    fn load_stream(&self, account_id: AccountId) -> Result<LoadedAccount, DispatchError> {
        self.repository.load(account_id).map_err(|err| {
            if let RepositoryError::History(ref history) = err {
                error!(account_id = %account_id, error = %history, "account history cannot be replayed");
            }
            DispatchError::from(err)
        })
    }

    fn commit(
        &self,
        account_id: AccountId,
        event: AccountEvent,
        state: AccountState,
        expected: ExpectedVersion,
    ) -> Result<AccountUpdate, EventStoreError> {
        let stored = self.repository.append(account_id, &event, expected)?;
        info!(
            event_type = %stored.event_type,
            sequence_number = stored.sequence_number,
            "command accepted"
        );
        Ok(AccountUpdate {
            event,
            state,
            version: stored.sequence_number,
        })
    }
}
