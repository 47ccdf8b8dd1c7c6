//! Command handlers expressed as transitions.
//!
//! Each handler decides against the state it is given and nothing else. On
//! acceptance the new state is computed by applying the produced event, so a
//! transition and a later replay of its event always agree.

use boc_core::{Aggregate, Transition, Validation};

use crate::account::{
    AccountCommand, AccountEvent, AccountState, AccountStatus, AcknowledgeCashDeposit,
    CreateAccount, FreezeAccount, MakeTransfer, SetOverdraft,
};
use crate::errors;

type Outcome = Validation<(AccountEvent, AccountState)>;

fn accept(state: &AccountState, event: AccountEvent) -> Outcome {
    let next = state.clone().apply(&event);
    Validation::valid((event, next))
}

/// Open an account. Needs no prior state and always succeeds.
pub fn open_account(cmd: &CreateAccount) -> Outcome {
    let created = cmd.to_created();
    let state = AccountState::created(&created);
    Validation::valid((AccountEvent::AccountCreated(created), state))
}

/// `Create` as a transition: the given state is ignored.
pub fn create(cmd: CreateAccount) -> impl Transition<AccountState, AccountEvent> {
    move |_: &AccountState| open_account(&cmd)
}

pub fn deposit(cmd: AcknowledgeCashDeposit) -> impl Transition<AccountState, AccountEvent> {
    move |state: &AccountState| handle_deposit(state, &cmd)
}

/// Debit the account for an outgoing transfer.
pub fn debit(cmd: MakeTransfer) -> impl Transition<AccountState, AccountEvent> {
    move |state: &AccountState| handle_debit(state, &cmd)
}

pub fn set_overdraft(cmd: SetOverdraft) -> impl Transition<AccountState, AccountEvent> {
    move |state: &AccountState| handle_set_overdraft(state, &cmd)
}

pub fn freeze(cmd: FreezeAccount) -> impl Transition<AccountState, AccountEvent> {
    move |state: &AccountState| handle_freeze(state, &cmd)
}

impl AccountCommand {
    /// Route the command to its handler.
    pub fn decide(&self, state: &AccountState) -> Outcome {
        match self {
            AccountCommand::AcknowledgeCashDeposit(cmd) => handle_deposit(state, cmd),
            AccountCommand::MakeTransfer(cmd) => handle_debit(state, cmd),
            AccountCommand::SetOverdraft(cmd) => handle_set_overdraft(state, cmd),
            AccountCommand::FreezeAccount(cmd) => handle_freeze(state, cmd),
        }
    }

    pub fn into_transition(self) -> impl Transition<AccountState, AccountEvent> {
        move |state: &AccountState| self.decide(state)
    }
}

fn handle_deposit(state: &AccountState, cmd: &AcknowledgeCashDeposit) -> Outcome {
    if !state.is_active() {
        return Validation::invalid(errors::account_not_active());
    }
    if state.balance().checked_add(cmd.amount).is_none() {
        return Validation::invalid(errors::amount_out_of_range());
    }
    accept(state, cmd.to_event())
}

fn handle_debit(state: &AccountState, cmd: &MakeTransfer) -> Outcome {
    if !state.is_active() {
        return Validation::invalid(errors::account_not_active());
    }
    match state.balance().checked_sub(cmd.amount) {
        None => return Validation::invalid(errors::amount_out_of_range()),
        Some(remaining) if remaining < state.allowed_overdraft() => {
            return Validation::invalid(errors::insufficient_balance());
        }
        Some(_) => {}
    }
    accept(state, cmd.to_event())
}

fn handle_set_overdraft(state: &AccountState, cmd: &SetOverdraft) -> Outcome {
    match cmd.amount.checked_sub(state.allowed_overdraft()) {
        Some(delta) => accept(state, cmd.to_event(delta)),
        None => Validation::invalid(errors::amount_out_of_range()),
    }
}

// Re-freezing is rejected rather than treated as a no-op.
fn handle_freeze(state: &AccountState, cmd: &FreezeAccount) -> Outcome {
    if state.status() == AccountStatus::Frozen {
        return Validation::invalid(errors::account_not_active());
    }
    accept(state, cmd.to_event())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountId, CurrencyCode};
    use boc_core::{AggregateId, hydrate};
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    fn test_account_id() -> AccountId {
        AccountId::new(AggregateId::new())
    }

    fn currency(code: &str) -> CurrencyCode {
        CurrencyCode::parse(code).into_result().unwrap()
    }

    fn create_cmd(id: AccountId, code: &str) -> CreateAccount {
        CreateAccount {
            account_id: id,
            currency: currency(code),
            allowed_overdraft: 0,
            timestamp: Utc::now(),
        }
    }

    fn deposit_cmd(id: AccountId, amount: i64) -> AcknowledgeCashDeposit {
        AcknowledgeCashDeposit {
            account_id: id,
            amount,
            branch_id: "BR-1".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn transfer_cmd(id: AccountId, amount: i64) -> MakeTransfer {
        MakeTransfer {
            account_id: id,
            beneficiary: "Jane Doe".to_string(),
            iban: "DE89370400440532013000".to_string(),
            bic: "COBADEFFXXX".to_string(),
            date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            amount,
            reference: "invoice 42".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn overdraft_cmd(id: AccountId, amount: i64) -> SetOverdraft {
        SetOverdraft {
            account_id: id,
            amount,
            timestamp: Utc::now(),
        }
    }

    fn freeze_cmd(id: AccountId) -> FreezeAccount {
        FreezeAccount {
            account_id: id,
            timestamp: Utc::now(),
        }
    }

    /// Active account with the given balance, reached through events only.
    fn active_with_balance(id: AccountId, balance: i64) -> AccountState {
        let (_, state) = open_account(&create_cmd(id, "USD")).into_result().unwrap();
        if balance == 0 {
            return state;
        }
        let (_, state) = deposit(deposit_cmd(id, balance)).run(&state).into_result().unwrap();
        state
    }

    fn frozen_account(id: AccountId) -> AccountState {
        let state = active_with_balance(id, 0);
        let (_, state) = freeze(freeze_cmd(id)).run(&state).into_result().unwrap();
        state
    }

    fn rejected_codes(outcome: Outcome) -> Vec<String> {
        outcome
            .into_result()
            .unwrap_err()
            .iter()
            .map(|e| e.code().to_string())
            .collect()
    }

    #[test]
    fn create_opens_active_account_with_zero_balance() {
        let id = test_account_id();
        let (event, state) = open_account(&create_cmd(id, "USD")).into_result().unwrap();

        match &event {
            AccountEvent::AccountCreated(e) => assert_eq!(e.currency.as_str(), "USD"),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(state.currency().as_str(), "USD");
        assert_eq!(state.status(), AccountStatus::Active);
        assert_eq!(state.balance(), 0);
        assert_eq!(state.allowed_overdraft(), 0);
    }

    #[test]
    fn create_transition_ignores_prior_state() {
        let id = test_account_id();
        let frozen = frozen_account(id);
        let (_, state) = create(create_cmd(id, "EUR")).run(&frozen).into_result().unwrap();
        assert_eq!(state.status(), AccountStatus::Active);
        assert_eq!(state.currency().as_str(), "EUR");
    }

    #[test]
    fn create_carries_initial_overdraft() {
        let id = test_account_id();
        let cmd = CreateAccount {
            allowed_overdraft: -500,
            ..create_cmd(id, "USD")
        };
        let (_, state) = open_account(&cmd).into_result().unwrap();
        assert_eq!(state.allowed_overdraft(), -500);
    }

    #[test]
    fn deposit_increases_balance() {
        let id = test_account_id();
        let state = active_with_balance(id, 0);
        let (event, next) = deposit(deposit_cmd(id, 50)).run(&state).into_result().unwrap();

        match event {
            AccountEvent::CashDeposited(e) => assert_eq!(e.amount, 50),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(next.balance(), 50);
    }

    #[test]
    fn deposit_on_inactive_account_is_rejected() {
        let id = test_account_id();
        let requested = AccountState::requested(currency("USD"));
        assert_eq!(
            rejected_codes(deposit(deposit_cmd(id, 10)).run(&requested)),
            vec![errors::ACCOUNT_NOT_ACTIVE]
        );

        let frozen = frozen_account(id);
        assert_eq!(
            rejected_codes(deposit(deposit_cmd(id, 10)).run(&frozen)),
            vec![errors::ACCOUNT_NOT_ACTIVE]
        );
    }

    #[test]
    fn debit_beyond_balance_is_rejected() {
        let id = test_account_id();
        let state = active_with_balance(id, 50);
        let before = state.clone();

        let outcome = debit(transfer_cmd(id, 1000)).run(&state);

        assert_eq!(rejected_codes(outcome), vec![errors::INSUFFICIENT_BALANCE]);
        assert_eq!(state, before);
    }

    #[test]
    fn debit_within_balance_succeeds() {
        let id = test_account_id();
        let state = active_with_balance(id, 50);
        let (event, next) = debit(transfer_cmd(id, 50)).run(&state).into_result().unwrap();
        assert!(matches!(event, AccountEvent::TransferDebited(ref e) if e.amount == 50));
        assert_eq!(next.balance(), 0);
    }

    #[test]
    fn debit_on_frozen_account_reports_not_active_first() {
        let id = test_account_id();
        let frozen = frozen_account(id);
        assert_eq!(
            rejected_codes(debit(transfer_cmd(id, 1)).run(&frozen)),
            vec![errors::ACCOUNT_NOT_ACTIVE]
        );
    }

    #[test]
    fn debit_compares_against_overdraft_floor() {
        let id = test_account_id();
        let state = active_with_balance(id, 50);
        let (_, state) = set_overdraft(overdraft_cmd(id, -100)).run(&state).into_result().unwrap();

        let (_, after) = debit(transfer_cmd(id, 150)).run(&state).into_result().unwrap();
        assert_eq!(after.balance(), -100);

        assert_eq!(
            rejected_codes(debit(transfer_cmd(id, 151)).run(&state)),
            vec![errors::INSUFFICIENT_BALANCE]
        );
    }

    #[test]
    fn set_overdraft_records_delta_and_sets_absolute_value() {
        let id = test_account_id();
        let state = active_with_balance(id, 0);
        let (_, state) = set_overdraft(overdraft_cmd(id, -300)).run(&state).into_result().unwrap();
        let (event, state) = set_overdraft(overdraft_cmd(id, -100)).run(&state).into_result().unwrap();

        match event {
            AccountEvent::OverdraftAltered(e) => assert_eq!(e.delta, 200),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(state.allowed_overdraft(), -100);
    }

    #[test]
    fn set_overdraft_succeeds_on_frozen_account() {
        let id = test_account_id();
        let frozen = frozen_account(id);
        assert!(set_overdraft(overdraft_cmd(id, -10)).run(&frozen).is_valid());
    }

    #[test]
    fn freeze_resets_overdraft() {
        let id = test_account_id();
        let state = active_with_balance(id, 0);
        let (_, state) = set_overdraft(overdraft_cmd(id, -250)).run(&state).into_result().unwrap();
        let (event, state) = freeze(freeze_cmd(id)).run(&state).into_result().unwrap();

        assert!(matches!(event, AccountEvent::AccountFrozen(_)));
        assert_eq!(state.status(), AccountStatus::Frozen);
        assert_eq!(state.allowed_overdraft(), 0);
    }

    #[test]
    fn freezing_twice_is_rejected() {
        let id = test_account_id();
        let frozen = frozen_account(id);
        assert_eq!(
            rejected_codes(freeze(freeze_cmd(id)).run(&frozen)),
            vec![errors::ACCOUNT_NOT_ACTIVE]
        );
    }

    #[test]
    fn deposit_past_i64_max_is_out_of_range() {
        let id = test_account_id();
        let state = active_with_balance(id, i64::MAX);
        assert_eq!(
            rejected_codes(deposit(deposit_cmd(id, 1)).run(&state)),
            vec![errors::AMOUNT_OUT_OF_RANGE]
        );
        assert_eq!(state.balance(), i64::MAX);
    }

    #[test]
    fn debit_below_i64_min_is_out_of_range() {
        let id = test_account_id();
        let state = active_with_balance(id, 0);
        let (_, state) = set_overdraft(overdraft_cmd(id, i64::MIN)).run(&state).into_result().unwrap();
        let (_, state) = debit(transfer_cmd(id, i64::MAX)).run(&state).into_result().unwrap();
        assert_eq!(state.balance(), -i64::MAX);

        assert_eq!(
            rejected_codes(debit(transfer_cmd(id, 2)).run(&state)),
            vec![errors::AMOUNT_OUT_OF_RANGE]
        );
    }

    #[test]
    fn overdraft_delta_overflow_is_out_of_range() {
        let id = test_account_id();
        let state = active_with_balance(id, 0);
        let (_, state) = set_overdraft(overdraft_cmd(id, i64::MIN)).run(&state).into_result().unwrap();

        assert_eq!(
            rejected_codes(set_overdraft(overdraft_cmd(id, i64::MAX)).run(&state)),
            vec![errors::AMOUNT_OUT_OF_RANGE]
        );
        let (_, state) = set_overdraft(overdraft_cmd(id, 0)).run(&state).into_result().unwrap();
        assert_eq!(state.allowed_overdraft(), 0);
    }

    #[test]
    fn command_enum_routes_to_handlers() {
        let id = test_account_id();
        let state = active_with_balance(id, 20);
        let cmd = AccountCommand::MakeTransfer(transfer_cmd(id, 5));
        let (_, next) = cmd.into_transition().run(&state).into_result().unwrap();
        assert_eq!(next.balance(), 15);
    }

    #[test]
    fn transition_history_hydrates_to_final_state() {
        let id = test_account_id();
        let (created, s0) = open_account(&create_cmd(id, "EUR")).into_result().unwrap();
        let (deposited, s1) = deposit(deposit_cmd(id, 100)).run(&s0).into_result().unwrap();
        let (debited, s2) = debit(transfer_cmd(id, 30)).run(&s1).into_result().unwrap();

        let hydrated = hydrate::<AccountState, _>(vec![created, deposited, debited]).unwrap();
        assert_eq!(hydrated, boc_core::Optional::present(s2.clone()));
        assert_eq!(s2.balance(), 70);
    }

    fn arb_command(id: AccountId) -> impl Strategy<Value = AccountCommand> {
        prop_oneof![
            (-100i64..1_000).prop_map(move |a| AccountCommand::AcknowledgeCashDeposit(deposit_cmd(id, a))),
            (0i64..1_000).prop_map(move |a| AccountCommand::MakeTransfer(transfer_cmd(id, a))),
            (-1_000i64..1_000).prop_map(move |a| AccountCommand::SetOverdraft(overdraft_cmd(id, a))),
            Just(AccountCommand::FreezeAccount(freeze_cmd(id))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the state returned by a transition equals applying its event
        /// to the prior state, and replaying every accepted event reproduces it.
        #[test]
        fn prop_transition_agrees_with_apply(
            commands in prop::collection::vec(arb_command(AccountId::new(AggregateId::from_uuid(uuid::Uuid::nil()))), 1..40)
        ) {
            let id = AccountId::new(AggregateId::from_uuid(uuid::Uuid::nil()));
            let (created, mut state) = open_account(&create_cmd(id, "EUR")).into_result().unwrap();
            let mut history = vec![created];

            for cmd in commands {
                let prior = state.clone();
                match cmd.decide(&prior) {
                    Validation::Valid((event, next)) => {
                        prop_assert_eq!(prior.clone().apply(&event), next.clone());
                        history.push(event);
                        state = next;
                    }
                    Validation::Invalid(_) => {
                        prop_assert_eq!(&state, &prior);
                    }
                }
            }

            let hydrated = hydrate::<AccountState, _>(&history).unwrap();
            prop_assert_eq!(hydrated, boc_core::Optional::present(state));
        }

        /// Property: amounts anywhere in the i64 range never panic, and an
        /// accepted event applies to exactly the returned state.
        #[test]
        fn prop_full_range_amounts_are_total(
            balance in 0i64..=i64::MAX,
            floor in any::<i64>(),
            amount in any::<i64>(),
        ) {
            let id = AccountId::new(AggregateId::from_uuid(uuid::Uuid::nil()));
            let state = active_with_balance(id, balance);
            let (_, state) = set_overdraft(overdraft_cmd(id, floor)).run(&state).into_result().unwrap();

            for cmd in [
                AccountCommand::AcknowledgeCashDeposit(deposit_cmd(id, amount)),
                AccountCommand::MakeTransfer(transfer_cmd(id, amount)),
                AccountCommand::SetOverdraft(overdraft_cmd(id, amount)),
            ] {
                if let Validation::Valid((event, next)) = cmd.decide(&state) {
                    prop_assert_eq!(state.clone().apply(&event), next);
                }
            }
        }

        /// Property: no accepted debit ever leaves the balance below the floor.
        #[test]
        fn prop_debit_never_breaches_floor(balance in 0i64..10_000, amount in 0i64..20_000) {
            let id = AccountId::new(AggregateId::from_uuid(uuid::Uuid::nil()));
            let state = active_with_balance(id, balance);
            if let Validation::Valid((_, next)) = debit(transfer_cmd(id, amount)).run(&state) {
                prop_assert!(next.balance() >= next.allowed_overdraft());
            }
        }
    }
}
