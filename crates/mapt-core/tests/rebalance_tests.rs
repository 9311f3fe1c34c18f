//! Funding and withdrawing between pools and the LP Account

mod common;

use common::*;
use mapt_core::events::ProtocolEvent;
use mapt_core::{Address, MaptError, DEFAULT_MAPT_TO_UNDERLYER_FACTOR};

fn ids(pools: &[&str]) -> Vec<String> {
    pools.iter().map(|id| id.to_string()).collect()
}

#[test]
fn test_initial_funding_uses_bootstrap_rate() {
    let mut ctx = setup();
    let (alice, dai_pool, emergency, dai) = (
        ctx.actors.alice.clone(),
        ctx.dai_pool.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();
    assert_eq!(ctx.protocol.mapt().total_supply(), 0);
    assert_eq!(ctx.protocol.get_tvl(), Ok(0));

    ctx.protocol
        .emergency_fund_lp_account(&emergency, &[dai_pool.clone()], &[300 * DAI_UNIT])
        .unwrap();

    let expected = 300 * ONE_DOLLAR as u128 * DEFAULT_MAPT_TO_UNDERLYER_FACTOR;
    assert_eq!(ctx.protocol.mapt().balance_of(&dai_pool), expected);
    assert_eq!(ctx.protocol.mapt().total_supply(), expected);
    assert_eq!(ctx.idle_balance(&dai_pool), 700 * DAI_UNIT);
    assert_eq!(ctx.lp_balance(&dai), 300 * DAI_UNIT);
    assert!(ctx.protocol.allocation().is_token_registered(&dai));
    assert!(ctx.protocol.is_oracle_locked());
}

#[test]
fn test_fund_moves_reserve_surplus() {
    let mut ctx = setup();
    let (alice, lp, dai_pool, dai) = (
        ctx.actors.alice.clone(),
        ctx.actors.lp.clone(),
        ctx.dai_pool.clone(),
        ctx.dai.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();

    let (pools, top_ups) = ctx.protocol.get_rebalance_amounts(&ids(&["daiPool"])).unwrap();
    assert_eq!(pools, vec![dai_pool.clone()]);
    assert_eq!(top_ups, vec![-950 * DAI_UNIT as i128]);

    let funded = ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool"])).unwrap();
    assert_eq!(funded, vec![950 * DAI_UNIT]);
    assert_eq!(ctx.idle_balance(&dai_pool), 50 * DAI_UNIT);
    assert_eq!(
        ctx.protocol.get_rebalance_amounts(&ids(&["daiPool"])).unwrap_err(),
        MaptError::Locked
    );

    let lock_end = ctx.protocol.oracle().lock_end();
    assert_eq!(
        lock_end,
        ctx.protocol.env().block_number + ctx.protocol.oracle().default_lock_period()
    );

    ctx.mine_past_lock();
    ctx.sync_tvl();
    assert_eq!(ctx.protocol.get_lp_account_balances(&ids(&["daiPool"])), Ok(vec![950 * DAI_UNIT]));
    assert_eq!(ctx.lp_balance(&dai), 950 * DAI_UNIT);

    // balanced now: nothing to move either way
    assert_eq!(ctx.protocol.get_reserve_top_up_value(&dai_pool), Ok(0));
}

#[test]
fn test_withdraw_restores_reserve() {
    let mut ctx = setup();
    let (alice, lp, admin, dai_pool, dai) = (
        ctx.actors.alice.clone(),
        ctx.actors.lp.clone(),
        ctx.actors.admin.clone(),
        ctx.dai_pool.clone(),
        ctx.dai.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();
    ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool"])).unwrap();
    ctx.mine_past_lock();
    ctx.sync_tvl();

    ctx.protocol.set_reserve_percentage(&admin, &dai_pool, 10).unwrap();
    assert_eq!(
        ctx.protocol.get_reserve_top_up_value(&dai_pool),
        Ok(50 * DAI_UNIT as i128)
    );

    let supply_before = ctx.protocol.mapt().total_supply();
    let withdrawn = ctx.protocol.withdraw_from_lp_account(&lp, &ids(&["daiPool"])).unwrap();
    assert_eq!(withdrawn, vec![50 * DAI_UNIT]);
    assert_eq!(ctx.idle_balance(&dai_pool), 100 * DAI_UNIT);
    assert_eq!(ctx.lp_balance(&dai), 900 * DAI_UNIT);

    // 50 of 950 deployed dollars burns 50/950 of supply
    let burned = supply_before - ctx.protocol.mapt().total_supply();
    assert_eq!(burned, supply_before * 50 / 950);
}

#[test]
fn test_withdraw_capped_by_lp_account_balance() {
    let mut ctx = setup();
    let (alice, lp, admin, emergency, dai_pool) = (
        ctx.actors.alice.clone(),
        ctx.actors.lp.clone(),
        ctx.actors.admin.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();
    ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool"])).unwrap();
    ctx.mine_past_lock();
    ctx.sync_tvl();

    // reported TVL is twice what the LP Account holds in DAI
    ctx.protocol.emergency_set_tvl(&emergency, 1_900 * ONE_DOLLAR, 1_000).unwrap();
    ctx.protocol.set_reserve_percentage(&admin, &dai_pool, 100).unwrap();
    assert_eq!(
        ctx.protocol.get_reserve_top_up_value(&dai_pool),
        Ok(1_900 * DAI_UNIT as i128)
    );

    let supply_before = ctx.protocol.mapt().total_supply();
    let withdrawn = ctx.protocol.withdraw_from_lp_account(&lp, &ids(&["daiPool"])).unwrap();
    assert_eq!(withdrawn, vec![950 * DAI_UNIT]);
    assert_eq!(ctx.lp_balance(&ctx.dai.clone()), 0);
    assert_eq!(ctx.protocol.mapt().total_supply(), supply_before / 2);
}

#[test]
fn test_round_trip_restores_balances() {
    let mut ctx = setup();
    let (alice, emergency, dai_pool, usdc_pool) = (
        ctx.actors.alice.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
        ctx.usdc_pool.clone(),
    );

    // another pool already holds mAPT so the proportional path is used
    ctx.deposit(&alice, &usdc_pool, 1_000 * USDC_UNIT).unwrap();
    ctx.protocol
        .emergency_fund_lp_account(&emergency, &[usdc_pool.clone()], &[500 * USDC_UNIT])
        .unwrap();
    ctx.mine_past_lock();
    ctx.sync_tvl();

    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();
    let idle_before = ctx.idle_balance(&dai_pool);
    let mapt_before = ctx.protocol.mapt().balance_of(&dai_pool);

    ctx.protocol
        .emergency_fund_lp_account(&emergency, &[dai_pool.clone()], &[300 * DAI_UNIT])
        .unwrap();
    assert!(ctx.protocol.mapt().balance_of(&dai_pool) > 0);

    ctx.mine_past_lock();
    ctx.sync_tvl();
    ctx.protocol
        .emergency_withdraw_from_lp_account(&emergency, &[dai_pool.clone()], &[300 * DAI_UNIT])
        .unwrap();

    let idle_after = ctx.idle_balance(&dai_pool);
    let mapt_after = ctx.protocol.mapt().balance_of(&dai_pool);
    assert_eq!(idle_after, idle_before);
    assert!(mapt_after.abs_diff(mapt_before) <= 2);
    assert!(ctx.protocol.check_invariants().is_ok());
}

#[test]
fn test_deltas_share_one_snapshot() {
    let mut ctx = setup();
    let (alice, emergency, dai_pool, usdc_pool) = (
        ctx.actors.alice.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
        ctx.usdc_pool.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();
    ctx.deposit(&alice, &usdc_pool, 1_000 * USDC_UNIT).unwrap();

    // same dollar amount from each pool in one batch earns the same mAPT
    ctx.protocol
        .emergency_fund_lp_account(
            &emergency,
            &[dai_pool.clone(), usdc_pool.clone()],
            &[100 * DAI_UNIT, 100 * USDC_UNIT],
        )
        .unwrap();
    assert_eq!(
        ctx.protocol.mapt().balance_of(&dai_pool),
        ctx.protocol.mapt().balance_of(&usdc_pool)
    );

    ctx.mine_past_lock();
    ctx.sync_tvl();
    let deltas = ctx
        .protocol
        .calculate_deltas(&[dai_pool.clone(), usdc_pool.clone()], &[10 * DAI_UNIT, 10 * USDC_UNIT])
        .unwrap();
    assert_eq!(deltas[0], deltas[1]);
    assert_eq!(
        ctx.protocol.calculate_deltas(&[dai_pool], &[]),
        Err(MaptError::LengthsMustMatch(1, 0))
    );
}

#[test]
fn test_zero_amounts_are_skipped() {
    let mut ctx = setup();
    let (lp, dai_pool) = (ctx.actors.lp.clone(), ctx.dai_pool.clone());

    // empty pool: nothing to fund, but the oracle is still locked
    let funded = ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool"])).unwrap();
    assert_eq!(funded, vec![0]);
    assert_eq!(ctx.protocol.mapt().balance_of(&dai_pool), 0);
    assert!(ctx.protocol.is_oracle_locked());
    assert!(!ctx
        .protocol
        .events()
        .iter()
        .any(|record| matches!(record.event, ProtocolEvent::MaptMinted { .. })));
}

#[test]
fn test_rebalance_permissions_and_lookups() {
    let mut ctx = setup();
    let (alice, lp, emergency, dai_pool) = (
        ctx.actors.alice.clone(),
        ctx.actors.lp.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
    );

    assert_eq!(
        ctx.protocol.fund_lp_account(&alice, &ids(&["daiPool"])),
        Err(MaptError::NotLpRole)
    );
    assert_eq!(
        ctx.protocol.withdraw_from_lp_account(&emergency, &ids(&["daiPool"])),
        Err(MaptError::NotLpRole)
    );
    assert_eq!(
        ctx.protocol.emergency_fund_lp_account(&lp, &[dai_pool.clone()], &[1]),
        Err(MaptError::NotEmergencyRole)
    );
    assert_eq!(
        ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool", "fraxPool"])),
        Err(MaptError::MissingAddress("fraxPool".to_string()))
    );
    assert_eq!(
        ctx.protocol
            .emergency_withdraw_from_lp_account(&emergency, &[Address::from("nowhere")], &[1]),
        Err(MaptError::UnknownPool(Address::from("nowhere")))
    );
    assert_eq!(
        ctx.protocol.emergency_fund_lp_account(&emergency, &[dai_pool], &[1, 2]),
        Err(MaptError::LengthsMustMatch(1, 2))
    );
}

#[test]
fn test_rebalance_blocked_while_locked() {
    let mut ctx = setup();
    let (alice, lp, dai_pool) = (ctx.actors.alice.clone(), ctx.actors.lp.clone(), ctx.dai_pool.clone());
    ctx.deposit(&alice, &dai_pool, 1_000 * DAI_UNIT).unwrap();
    ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool"])).unwrap();

    assert_eq!(
        ctx.protocol.fund_lp_account(&lp, &ids(&["daiPool"])),
        Err(MaptError::Locked)
    );
    assert_eq!(ctx.deposit(&alice, &dai_pool, DAI_UNIT), Err(MaptError::Locked));
}

#[test]
fn test_burn_beyond_claim_reverts() {
    let mut ctx = setup();
    let (alice, emergency, dai_pool, usdc_pool) = (
        ctx.actors.alice.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
        ctx.usdc_pool.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 100 * DAI_UNIT).unwrap();
    ctx.deposit(&alice, &usdc_pool, 100 * USDC_UNIT).unwrap();
    ctx.protocol
        .emergency_fund_lp_account(
            &emergency,
            &[dai_pool.clone(), usdc_pool.clone()],
            &[50 * DAI_UNIT, 50 * USDC_UNIT],
        )
        .unwrap();
    ctx.mine_past_lock();
    ctx.sync_tvl();

    // the DAI pool's claim is worth $50, not $60
    let lp_account = ctx.protocol.lp_account().address().clone();
    let dai = ctx.dai.clone();
    ctx.protocol.mint_underlyer(&dai, &lp_account, 10 * DAI_UNIT).unwrap();
    let err = ctx
        .protocol
        .emergency_withdraw_from_lp_account(&emergency, &[dai_pool.clone()], &[60 * DAI_UNIT])
        .unwrap_err();
    assert_eq!(err, MaptError::BalanceInsufficient);
    assert_eq!(ctx.idle_balance(&dai_pool), 50 * DAI_UNIT);
}
