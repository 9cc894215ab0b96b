//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Conservation: Σ(balances) == total supply after every operation
//! - Atomicity: a rejected operation changes no balance, allowance or event
//! - Replace-not-add: the last approval wins
//! - Unlimited allowances are never decremented
//! - Self-transfers are net zero

use proptest::prelude::*;
use token_ledger::{total_supply, Address, Amount, Error, Token, UNLIMITED_ALLOWANCE};

const OWNER: u64 = 1;

/// Operation against the ledger, with accounts as small indices (0 = null)
#[derive(Debug, Clone)]
enum Op {
    Transfer { caller: u64, to: u64, amount: Amount },
    Approve { caller: u64, spender: u64, amount: Amount },
    TransferFrom { caller: u64, from: u64, to: u64, amount: Amount },
}

fn addr(n: u64) -> Address {
    if n == 0 {
        Address::NULL
    } else {
        Address::from_low_u64(n)
    }
}

/// Strategy for account indices, occasionally the null identity
fn account_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        1 => Just(0u64),
        9 => 1u64..6,
    ]
}

/// Strategy for amounts: mostly small, sometimes zero or large
fn amount_strategy() -> impl Strategy<Value = Amount> {
    prop_oneof![
        6 => (1u64..5_000).prop_map(Amount::from),
        1 => Just(Amount::zero()),
        1 => any::<u64>().prop_map(Amount::from),
    ]
}

/// Strategy for approval amounts, including the unlimited sentinel
fn approval_strategy() -> impl Strategy<Value = Amount> {
    prop_oneof![
        4 => amount_strategy(),
        1 => Just(UNLIMITED_ALLOWANCE),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (account_strategy(), account_strategy(), amount_strategy())
            .prop_map(|(caller, to, amount)| Op::Transfer { caller, to, amount }),
        (account_strategy(), account_strategy(), approval_strategy())
            .prop_map(|(caller, spender, amount)| Op::Approve { caller, spender, amount }),
        (
            account_strategy(),
            account_strategy(),
            account_strategy(),
            amount_strategy()
        )
            .prop_map(|(caller, from, to, amount)| Op::TransferFrom {
                caller,
                from,
                to,
                amount
            }),
    ]
}

fn apply(token: &mut Token, op: &Op) -> token_ledger::Result<()> {
    match *op {
        Op::Transfer { caller, to, amount } => {
            token.transfer(&addr(caller), &addr(to), amount)?;
        }
        Op::Approve {
            caller,
            spender,
            amount,
        } => {
            token.approve(&addr(caller), &addr(spender), amount)?;
        }
        Op::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => {
            token.transfer_from(&addr(caller), &addr(from), &addr(to), amount)?;
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: balances always sum to the total supply
    #[test]
    fn prop_conservation(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();

        for op in &ops {
            let _ = apply(&mut token, op);
            prop_assert!(token.check_conservation().is_ok());
        }
    }

    /// Property: a rejected operation leaves the whole state untouched
    #[test]
    fn prop_rejections_are_atomic(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();

        for op in &ops {
            let before = token.snapshot().unwrap();
            if apply(&mut token, op).is_err() {
                let after = token.snapshot().unwrap();
                prop_assert_eq!(&before.balances, &after.balances);
                prop_assert_eq!(&before.allowances, &after.allowances);
                prop_assert_eq!(before.event_count, after.event_count);
                prop_assert_eq!(before.state_root, after.state_root);
            }
        }
    }

    /// Property: every success appends exactly one event
    #[test]
    fn prop_one_event_per_success(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();
        let mut successes = 0usize;

        for op in &ops {
            if apply(&mut token, op).is_ok() {
                successes += 1;
            }
        }

        let events = token.events();
        prop_assert_eq!(events.len(), successes + 1);
        for (i, record) in events.iter().enumerate() {
            prop_assert_eq!(record.sequence, i as u64);
        }
    }

    /// Property: approving A then B leaves exactly B
    #[test]
    fn prop_allowance_replace_not_add(
        first in approval_strategy(),
        second in approval_strategy(),
        spender in 2u64..6,
    ) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();
        token.approve(&addr(OWNER), &addr(spender), first).unwrap();
        token.approve(&addr(OWNER), &addr(spender), second).unwrap();
        prop_assert_eq!(token.allowance(&addr(OWNER), &addr(spender)), second);
    }

    /// Property: an unlimited allowance survives any number of delegated transfers
    #[test]
    fn prop_unlimited_allowance_invariant(
        amounts in prop::collection::vec(any::<u64>(), 1..20),
    ) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();
        token.approve(&addr(OWNER), &addr(2), UNLIMITED_ALLOWANCE).unwrap();

        for amount in amounts {
            token
                .transfer_from(&addr(2), &addr(OWNER), &addr(3), Amount::from(amount))
                .unwrap();
            prop_assert_eq!(token.allowance(&addr(OWNER), &addr(2)), UNLIMITED_ALLOWANCE);
        }
    }

    /// Property: a delegated transfer failing on balance keeps the allowance
    #[test]
    fn prop_balance_failure_keeps_allowance(
        funded in 0u64..1_000,
        extra in 1u64..1_000,
        allowance_headroom in 0u64..1_000,
    ) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();
        token.transfer(&addr(OWNER), &addr(2), Amount::from(funded)).unwrap();

        let requested = Amount::from(funded + extra);
        let granted = requested + Amount::from(allowance_headroom);
        token.approve(&addr(2), &addr(3), granted).unwrap();

        let err = token
            .transfer_from(&addr(3), &addr(2), &addr(4), requested)
            .unwrap_err();
        let is_balance_error = matches!(err, Error::InsufficientBalance { .. });
        prop_assert!(is_balance_error);
        prop_assert_eq!(token.allowance(&addr(2), &addr(3)), granted);
        prop_assert_eq!(token.balance_of(&addr(2)), Amount::from(funded));
    }

    /// Property: transferring to oneself never changes the balance
    #[test]
    fn prop_self_transfer_identity(funded in 0u64..10_000, amount in 0u64..20_000) {
        let mut token = Token::deploy(addr(OWNER)).unwrap();
        token.transfer(&addr(OWNER), &addr(2), Amount::from(funded)).unwrap();

        let result = token.transfer(&addr(2), &addr(2), Amount::from(amount));
        prop_assert_eq!(result.is_ok(), amount <= funded);
        prop_assert_eq!(token.balance_of(&addr(2)), Amount::from(funded));
    }
}

#[test]
fn test_balances_never_exceed_supply() {
    let mut token = Token::deploy(addr(OWNER)).unwrap();
    let err = token
        .transfer(&addr(OWNER), &addr(2), total_supply() + Amount::from(1u64))
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance { .. }));
    assert_eq!(token.balance_of(&addr(OWNER)), total_supply());
}
