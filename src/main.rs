//! Stablecoin Engine Simulation.
//!
//! Walks the engine through collateral deposits, minting, a price crash with
//! liquidation, and an oracle outage. Set `RUST_LOG=debug` to see every event.

use dsc_core::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

const ENGINE: Address = Address::repeat_byte(0xee);
const DSC: Address = Address::repeat_byte(0xd5);
const WETH: Address = Address::repeat_byte(0x01);
const WBTC: Address = Address::repeat_byte(0x02);
const ETH_FEED: Address = Address::repeat_byte(0xf1);
const BTC_FEED: Address = Address::repeat_byte(0xf2);

const ALICE: Address = Address::repeat_byte(0xa1);
const BOB: Address = Address::repeat_byte(0xb0);
const KEEPER: Address = Address::repeat_byte(0xc3);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Stablecoin Engine Simulation");
    println!("WETH and WBTC collateral, 200% overcollateralized\n");

    scenario_1_deposit_and_mint();
    scenario_2_multi_collateral();
    scenario_3_price_crash_and_liquidation();
    scenario_4_stale_oracle();

    println!("\nAll simulations completed successfully.");
}

fn deploy() -> Engine<InMemoryChain> {
    let chain = InMemoryChain::with_system_time();
    chain.deploy_token(WETH, "WETH");
    chain.deploy_token(WBTC, "WBTC");
    chain.deploy_debt_token(DSC, "DSC", ENGINE);
    chain.add_usd_feed(ETH_FEED, 2000);
    chain.add_usd_feed(BTC_FEED, 30000);

    for user in [ALICE, BOB, KEEPER] {
        chain.faucet(WETH, user, wad(100)).unwrap();
        chain.faucet(WBTC, user, wad(10)).unwrap();
        for token in [WETH, WBTC, DSC] {
            chain.approve(token, user, ENGINE, U256::MAX).unwrap();
        }
    }

    Engine::new(EngineConfig::default(), ENGINE, chain, &[WETH, WBTC], &[ETH_FEED, BTC_FEED], DSC).unwrap()
}

fn show(value: U256) -> String {
    to_decimal(value).map_or_else(|| value.to_string(), |d| d.to_string())
}

fn report(engine: &Engine<InMemoryChain>, name: &str, user: Address) {
    let snapshot = engine.account_snapshot(user).unwrap();
    println!(
        "  {}: debt {} DSC, collateral ${}, health factor {}",
        name,
        show(snapshot.total_debt),
        show(snapshot.collateral_value_usd),
        snapshot.health_factor
    );
}

/// A single user locks WETH and mints up to the limit.
fn scenario_1_deposit_and_mint() {
    println!("Scenario 1: Deposit and Mint\n");

    let engine = deploy();

    engine.deposit_collateral(ALICE, WETH, wad(10)).unwrap();
    println!("  Alice deposits 10 WETH @ $2,000");
    report(&engine, "Alice", ALICE);

    engine.mint_debt(ALICE, wad(5000)).unwrap();
    println!("  Alice mints 5,000 DSC");
    report(&engine, "Alice", ALICE);

    let over = engine.mint_debt(ALICE, wad(5001));
    println!("  Minting 5,001 more: {}", over.unwrap_err());

    engine.mint_debt(ALICE, wad(5000)).unwrap();
    println!("  Minting exactly 5,000 more lands on health factor 1");
    report(&engine, "Alice", ALICE);

    let redeem = engine.redeem_collateral(ALICE, WETH, from_decimal(dec!(0.001)).unwrap());
    println!("  Redeeming 0.001 WETH at the limit: {}\n", redeem.unwrap_err());
}

/// Collateral value sums across assets.
fn scenario_2_multi_collateral() {
    println!("Scenario 2: Multiple Collateral Assets\n");

    let engine = deploy();

    engine
        .deposit_collateral_and_mint_dsc(BOB, WETH, wad(5), wad(2000))
        .unwrap();
    engine.deposit_collateral(BOB, WBTC, from_decimal(dec!(0.5)).unwrap()).unwrap();
    println!("  Bob deposits 5 WETH and 0.5 WBTC, mints 2,000 DSC");
    report(&engine, "Bob", BOB);

    let usd = engine.get_usd_value(WBTC, from_decimal(dec!(0.5)).unwrap()).unwrap();
    println!("  0.5 WBTC is worth ${}", show(usd));

    engine
        .redeem_collateral_for_dsc(BOB, WETH, wad(5), wad(2000))
        .unwrap();
    println!("  Bob repays everything and takes back the WETH");
    report(&engine, "Bob", BOB);
    println!();
}

/// ETH drops 40% and a keeper liquidates half the position.
fn scenario_3_price_crash_and_liquidation() {
    println!("Scenario 3: Price Crash and Liquidation\n");

    let engine = deploy();

    engine
        .deposit_collateral_and_mint_dsc(ALICE, WETH, wad(10), wad(8000))
        .unwrap();
    engine
        .deposit_collateral_and_mint_dsc(KEEPER, WETH, wad(50), wad(5000))
        .unwrap();
    report(&engine, "Alice", ALICE);

    engine.host().set_usd_price(ETH_FEED, 1200).unwrap();
    println!("  ETH falls to $1,200");
    report(&engine, "Alice", ALICE);
    println!("  Liquidatable: {}", engine.is_liquidatable(ALICE).unwrap());

    let result = engine.liquidate(KEEPER, WETH, ALICE, wad(4000)).unwrap();
    println!(
        "  Keeper covers {} DSC, seizes {} WETH ({} bonus)",
        show(result.debt_covered),
        show(result.collateral_seized()),
        show(result.bonus_collateral)
    );
    println!(
        "  Health factor {} -> {}",
        result.starting_health_factor, result.ending_health_factor
    );
    report(&engine, "Alice", ALICE);

    let keeper_weth = engine.host().balance_of(WETH, KEEPER).unwrap();
    println!("  Keeper wallet: {} WETH", show(keeper_weth));
    println!("  Events generated: {}\n", engine.events().len());
}

/// A silent feed freezes every price-dependent call until it reports again.
fn scenario_4_stale_oracle() {
    println!("Scenario 4: Stale Oracle\n");

    let engine = deploy();
    engine
        .deposit_collateral_and_mint_dsc(ALICE, WETH, wad(10), wad(1000))
        .unwrap();

    engine.host().advance_time(engine.get_staleness_timeout() + 1);
    println!("  Feeds silent for more than {} seconds", engine.get_staleness_timeout());

    let mint = engine.mint_debt(ALICE, wad(10));
    println!("  Mint: {}", mint.unwrap_err());
    let redeem = engine.redeem_collateral(ALICE, WETH, wad(1));
    println!("  Redeem: {}", redeem.unwrap_err());

    engine.deposit_collateral(ALICE, WETH, wad(1)).unwrap();
    println!("  Deposit still accepted");

    // valuation reads every registered feed, so both must report
    engine.host().set_usd_price(ETH_FEED, 2000).unwrap();
    engine.host().set_usd_price(BTC_FEED, 30000).unwrap();
    engine.mint_debt(ALICE, wad(10)).unwrap();
    println!("  Feeds report again at {}; minting resumes", engine.time());
    report(&engine, "Alice", ALICE);
}
