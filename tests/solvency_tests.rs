//! Solvency invariant tests.
//!
//! These tests verify that the engine never lets a position fall below the
//! minimum health factor through its own operations, and that its books
//! always match the tokens it actually holds.

use dsc_core::*;
use proptest::prelude::*;

const ENGINE: Address = Address::repeat_byte(0xee);
const DSC: Address = Address::repeat_byte(0xd5);
const WETH: Address = Address::repeat_byte(0x01);
const WBTC: Address = Address::repeat_byte(0x02);
const ETH_FEED: Address = Address::repeat_byte(0xf1);
const BTC_FEED: Address = Address::repeat_byte(0xf2);
const USERS: [Address; 3] = [
    Address::repeat_byte(0xa1),
    Address::repeat_byte(0xa2),
    Address::repeat_byte(0xa3),
];
const ASSETS: [Address; 2] = [WETH, WBTC];

#[derive(Debug, Clone)]
enum Op {
    Deposit { user: usize, asset: usize, units: u64 },
    Mint { user: usize, units: u64 },
    Redeem { user: usize, asset: usize, units: u64 },
    Burn { user: usize, units: u64 },
    DepositAndMint { user: usize, asset: usize, units: u64, debt: u64 },
    RedeemForDsc { user: usize, asset: usize, units: u64, debt: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..2usize, 1..50u64).prop_map(|(user, asset, units)| Op::Deposit { user, asset, units }),
        (0..3usize, 1..40_000u64).prop_map(|(user, units)| Op::Mint { user, units }),
        (0..3usize, 0..2usize, 1..50u64).prop_map(|(user, asset, units)| Op::Redeem { user, asset, units }),
        (0..3usize, 1..40_000u64).prop_map(|(user, units)| Op::Burn { user, units }),
        (0..3usize, 0..2usize, 1..50u64, 1..40_000u64)
            .prop_map(|(user, asset, units, debt)| Op::DepositAndMint { user, asset, units, debt }),
        (0..3usize, 0..2usize, 1..50u64, 1..40_000u64)
            .prop_map(|(user, asset, units, debt)| Op::RedeemForDsc { user, asset, units, debt }),
    ]
}

fn setup_engine(eth_usd: u64, btc_usd: u64) -> Engine<InMemoryChain> {
    let chain = InMemoryChain::new(Timestamp::from_secs(1_700_000_000));
    chain.deploy_token(WETH, "WETH");
    chain.deploy_token(WBTC, "WBTC");
    chain.deploy_debt_token(DSC, "DSC", ENGINE);
    chain.add_usd_feed(ETH_FEED, eth_usd);
    chain.add_usd_feed(BTC_FEED, btc_usd);

    for user in USERS {
        for asset in ASSETS {
            chain.faucet(asset, user, wad(1_000)).unwrap();
            chain.approve(asset, user, ENGINE, U256::MAX).unwrap();
        }
        chain.approve(DSC, user, ENGINE, U256::MAX).unwrap();
    }

    Engine::new(EngineConfig::default(), ENGINE, chain, &ASSETS, &[ETH_FEED, BTC_FEED], DSC).unwrap()
}

fn apply(engine: &Engine<InMemoryChain>, op: &Op) -> Result<(), EngineError> {
    match *op {
        Op::Deposit { user, asset, units } => engine.deposit_collateral(USERS[user], ASSETS[asset], wad(units)),
        Op::Mint { user, units } => engine.mint_debt(USERS[user], wad(units)),
        Op::Redeem { user, asset, units } => engine.redeem_collateral(USERS[user], ASSETS[asset], wad(units)),
        Op::Burn { user, units } => engine.burn_debt(USERS[user], wad(units)),
        Op::DepositAndMint { user, asset, units, debt } => {
            engine.deposit_collateral_and_mint_dsc(USERS[user], ASSETS[asset], wad(units), wad(debt))
        }
        Op::RedeemForDsc { user, asset, units, debt } => {
            engine.redeem_collateral_for_dsc(USERS[user], ASSETS[asset], wad(units), wad(debt))
        }
    }
}

/// Ledger totals must equal what the chain says the engine holds.
fn assert_books_balanced(engine: &Engine<InMemoryChain>) -> Result<(), TestCaseError> {
    for asset in ASSETS {
        let booked = USERS
            .iter()
            .fold(U256::ZERO, |acc, &user| acc + engine.get_collateral_balance_of_user(user, asset));
        let held = engine.host().balance_of(asset, ENGINE).unwrap();
        prop_assert_eq!(booked, held, "collateral books diverge for {}", asset);
    }

    let total_debt = USERS.iter().fold(U256::ZERO, |acc, &user| acc + engine.get_debt_of_user(user));
    prop_assert_eq!(total_debt, engine.host().total_supply(DSC));

    for user in USERS {
        let wallet = engine.host().balance_of(DSC, user).unwrap();
        prop_assert!(wallet <= total_debt);
    }
    Ok(())
}

proptest! {
    /// With prices held still, no sequence of operations leaves an indebted user unhealthy.
    #[test]
    fn health_factor_never_broken_by_operations(
        eth_usd in 100u64..10_000,
        btc_usd in 1_000u64..100_000,
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let engine = setup_engine(eth_usd, btc_usd);

        for op in &ops {
            let _ = apply(&engine, op);

            for user in USERS {
                if engine.get_debt_of_user(user).is_zero() {
                    continue;
                }
                let hf = engine.get_health_factor(user).unwrap();
                prop_assert!(hf.is_healthy(), "user {} unhealthy after {:?}: {}", user, op, hf);
            }
        }
    }

    /// Collateral and debt bookkeeping tracks token movements exactly, including
    /// across rejected operations.
    #[test]
    fn books_match_chain_balances(
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let engine = setup_engine(2_000, 30_000);

        for op in &ops {
            let before: Vec<_> = USERS
                .iter()
                .map(|&u| (engine.get_debt_of_user(u), engine.get_collateral_balance_of_user(u, WETH)))
                .collect();
            let events_before = engine.events().len();

            if apply(&engine, op).is_err() {
                let after: Vec<_> = USERS
                    .iter()
                    .map(|&u| (engine.get_debt_of_user(u), engine.get_collateral_balance_of_user(u, WETH)))
                    .collect();
                prop_assert_eq!(before, after, "rejected {:?} changed state", op);
                prop_assert_eq!(engine.events().len(), events_before);
            }
            assert_books_balanced(&engine)?;
        }
    }

    /// Liquidation either strictly raises the target's health factor or leaves
    /// everything as it was.
    #[test]
    fn liquidation_improves_or_reverts(
        minted in 1_000u64..10_000,
        crash_usd in 100u64..2_000,
        cover in 1u64..10_000,
    ) {
        let engine = setup_engine(2_000, 30_000);
        let (user, liquidator) = (USERS[0], USERS[1]);

        engine.deposit_collateral_and_mint_dsc(user, WETH, wad(10), wad(minted)).unwrap();
        engine.deposit_collateral_and_mint_dsc(liquidator, WBTC, wad(10), wad(10_000)).unwrap();

        engine.host().set_usd_price(ETH_FEED, crash_usd).unwrap();
        let starting = engine.get_health_factor(user).unwrap();
        let debt_before = engine.get_debt_of_user(user);
        let collateral_before = engine.get_collateral_balance_of_user(user, WETH);

        match engine.liquidate(liquidator, WETH, user, wad(cover)) {
            Ok(result) => {
                prop_assert!(!starting.is_healthy());
                prop_assert_eq!(result.starting_health_factor, starting);
                prop_assert!(result.ending_health_factor > starting);
                prop_assert_eq!(engine.get_health_factor(user).unwrap(), result.ending_health_factor);
                prop_assert_eq!(engine.get_debt_of_user(user), debt_before - wad(cover));
                prop_assert_eq!(
                    engine.get_collateral_balance_of_user(user, WETH),
                    collateral_before - result.collateral_seized()
                );
                prop_assert!(engine.get_health_factor(liquidator).unwrap().is_healthy());
            }
            Err(err) => {
                if starting.is_healthy() {
                    prop_assert_eq!(err, EngineError::HealthFactorOk);
                } else {
                    prop_assert!(
                        matches!(
                            err,
                            EngineError::HealthFactorNotImproved
                                | EngineError::Ledger(LedgerError::InsufficientCollateral { .. })
                                | EngineError::Ledger(LedgerError::InsufficientDebt { .. })
                        ),
                        "unexpected liquidation failure: {}",
                        err
                    );
                }
                prop_assert_eq!(engine.get_debt_of_user(user), debt_before);
                prop_assert_eq!(engine.get_collateral_balance_of_user(user, WETH), collateral_before);
            }
        }
        assert_books_balanced(&engine)?;
    }
}

#[test]
fn burn_on_behalf_keeps_books_balanced() {
    let engine = setup_engine(2_000, 30_000);
    let (user, liquidator) = (USERS[0], USERS[1]);

    engine.deposit_collateral_and_mint_dsc(user, WETH, wad(10), wad(10_000)).unwrap();
    engine.deposit_collateral_and_mint_dsc(liquidator, WBTC, wad(1), wad(5_000)).unwrap();
    engine.host().set_usd_price(ETH_FEED, 1_500).unwrap();

    engine.liquidate(liquidator, WETH, user, wad(5_000)).unwrap();

    // the liquidator paid with their own tokens but still owes their own debt
    assert_eq!(engine.get_debt_of_user(liquidator), wad(5_000));
    assert_eq!(engine.host().balance_of(DSC, liquidator).unwrap(), U256::ZERO);
    assert_eq!(engine.host().total_supply(DSC), wad(10_000));
    assert_books_balanced(&engine).unwrap();
}
