//! Failed operations leave no trace

mod common;

use common::*;
use mapt_core::MaptError;

#[test]
fn test_failed_batch_reverts_every_pool() {
    let mut ctx = setup();
    let (alice, emergency, dai_pool, usdc_pool, dai, usdc) = (
        ctx.actors.alice.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
        ctx.usdc_pool.clone(),
        ctx.dai.clone(),
        ctx.usdc.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 100 * DAI_UNIT).unwrap();
    ctx.deposit(&alice, &usdc_pool, 100 * USDC_UNIT).unwrap();
    ctx.protocol.emergency_lock_pool(&emergency, &usdc_pool).unwrap();
    let events_before = ctx.protocol.events().len();

    // the DAI leg succeeds before the USDC leg hits the paused pool
    let result = ctx.protocol.emergency_fund_lp_account(
        &emergency,
        &[dai_pool.clone(), usdc_pool.clone()],
        &[40 * DAI_UNIT, 40 * USDC_UNIT],
    );
    assert_eq!(result, Err(MaptError::Paused));

    assert_eq!(ctx.protocol.mapt().total_supply(), 0);
    assert_eq!(ctx.protocol.mapt().balance_of(&dai_pool), 0);
    assert_eq!(ctx.idle_balance(&dai_pool), 100 * DAI_UNIT);
    assert_eq!(ctx.idle_balance(&usdc_pool), 100 * USDC_UNIT);
    assert_eq!(ctx.lp_balance(&dai), 0);
    assert_eq!(ctx.lp_balance(&usdc), 0);
    assert!(!ctx.protocol.is_oracle_locked());
    assert!(!ctx.protocol.allocation().is_token_registered(&dai));
    assert_eq!(ctx.protocol.events().len(), events_before);
}

#[test]
fn test_failed_redeem_keeps_shares() {
    let mut ctx = setup();
    let (alice, dai_pool) = (ctx.actors.alice.clone(), ctx.dai_pool.clone());
    let shares = ctx.deposit(&alice, &dai_pool, 10 * DAI_UNIT).unwrap();

    // price feed goes stale between deposit and redeem
    let stale_period = ctx.protocol.oracle().stale_period();
    ctx.protocol.advance_time(stale_period + 1);
    assert!(matches!(
        ctx.protocol.redeem(&alice, &dai_pool, shares),
        Err(MaptError::StaleData { .. })
    ));

    let pool = ctx.protocol.pool(&dai_pool).unwrap();
    assert_eq!(pool.balance_of(&alice), shares);
    assert_eq!(pool.total_supply(), shares);
    assert_eq!(ctx.idle_balance(&dai_pool), 10 * DAI_UNIT);
}

#[test]
fn test_failed_withdraw_keeps_oracle_unlocked() {
    let mut ctx = setup();
    let (alice, emergency, dai_pool) = (
        ctx.actors.alice.clone(),
        ctx.actors.emergency.clone(),
        ctx.dai_pool.clone(),
    );
    ctx.deposit(&alice, &dai_pool, 100 * DAI_UNIT).unwrap();
    ctx.protocol
        .emergency_fund_lp_account(&emergency, &[dai_pool.clone()], &[50 * DAI_UNIT])
        .unwrap();
    ctx.mine_past_lock();
    ctx.sync_tvl();
    let supply = ctx.protocol.mapt().total_supply();

    let result = ctx
        .protocol
        .emergency_withdraw_from_lp_account(&emergency, &[dai_pool.clone()], &[80 * DAI_UNIT]);
    assert_eq!(result, Err(MaptError::BalanceInsufficient));
    assert_eq!(ctx.protocol.mapt().total_supply(), supply);
    assert!(!ctx.protocol.is_oracle_locked());
    assert!(ctx.protocol.check_invariants().is_ok());
}
