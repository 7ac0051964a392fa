//! End-to-end scenarios for the DexPool exchange engine.
//!
//! These tests verify:
//! 1. The full pool lifecycle works through the transaction layer
//! 2. Structural invariants hold after every accepted operation
//! 3. Rejected transactions leave the chain byte-identical
//! 4. Determinism is preserved across runs
//!
//! ## Running Scenario Tests
//!
//! ```bash
//! # Run all scenario tests
//! cargo test --test scenario_test -- --nocapture
//!
//! # Run specific test
//! cargo test --test scenario_test randomized_operations -- --nocapture
//! ```

use dexpool::engine::{Chain, Operation, Transaction};
use dexpool::types::{Address, ValidatorKey};
use dexpool::Error;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Operations for the randomized soak test
const RANDOM_OP_COUNT: usize = 5_000;

/// Fee divisor used by every pool in these tests (0.2%)
const FEE_RATE: u64 = 500;

const BAKER_A: ValidatorKey = ValidatorKey(1);
const BAKER_B: ValidatorKey = ValidatorKey(2);
const BAKER_C: ValidatorKey = ValidatorKey(3);

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct World {
    chain: Chain,
    traders: Vec<Address>,
    token_a: Address,
    token_b: Address,
    pool_a: Address,
    pool_b: Address,
}

/// Two initialized pools behind one registry, each holding
/// 1_000_000 mutez against 2_000 tokens, plus funded traders.
fn build_world(trader_count: usize) -> World {
    let mut chain = Chain::new();
    let admin = chain.create_account(100_000_000);

    let token_a = chain.deploy_token(admin, 10_000_000);
    let token_b = chain.deploy_token(admin, 10_000_000);
    let pool_a = chain.deploy_exchange(FEE_RATE, token_a, BAKER_A).expect("deploy pool A");
    let pool_b = chain.deploy_exchange(FEE_RATE, token_b, BAKER_A).expect("deploy pool B");

    for (token, pool) in [(token_a, pool_a), (token_b, pool_b)] {
        chain.approve_token(token, admin, pool, 2_000).expect("approve");
        chain
            .execute(Transaction::new(
                admin,
                pool,
                1_000_000,
                Operation::InitializeExchange { token_amount: 2_000, candidate: BAKER_A },
            ))
            .expect("initialize");
    }

    let mut traders = Vec::with_capacity(trader_count);
    for _ in 0..trader_count {
        let trader = chain.create_account(100_000_000);
        chain.transfer_token(token_a, admin, trader, 10_000).expect("fund token A");
        chain.transfer_token(token_b, admin, trader, 10_000).expect("fund token B");
        traders.push(trader);
    }

    World { chain, traders, token_a, token_b, pool_a, pool_b }
}

/// Assert the structural invariants every accepted operation must
/// preserve: ledger consistency inside each pool, custody matching the
/// recorded reserves, and no value stuck in the registry.
fn assert_world_consistent(w: &World) {
    for (token, pool) in [(w.token_a, w.pool_a), (w.token_b, w.pool_b)] {
        let state = w.chain.pool_state(pool).expect("pool state");
        if let Err(violation) = state.verify_consistency() {
            panic!("pool {} inconsistent: {}", pool, violation);
        }

        assert_eq!(
            w.chain.native_balance(pool),
            state.tez_pool,
            "pool {} native custody diverged from its reserve",
            pool
        );
        let held = w.chain.token(token).expect("ledger").balance_of(pool);
        assert_eq!(
            held, state.token_pool,
            "pool {} token custody diverged from its reserve",
            pool
        );
    }
    assert_eq!(w.chain.native_balance(w.chain.registry().address), 0);
}

/// Run a seeded random operation mix and return the final state root.
fn run_random_sequence(seed: u64, count: usize) -> [u8; 32] {
    let mut world = build_world(4);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for _ in 0..count {
        random_step(&mut world, &mut rng);
    }

    world.chain.state_root()
}

/// One random operation; returns whether the chain accepted it.
fn random_step(w: &mut World, rng: &mut ChaCha8Rng) -> bool {
    let trader = w.traders[rng.gen_range(0..w.traders.len())];
    let (token, pool, other_token) = if rng.gen_bool(0.5) {
        (w.token_a, w.pool_a, w.token_b)
    } else {
        (w.token_b, w.pool_b, w.token_a)
    };

    // Occasionally demand an impossible minimum to exercise rollback.
    let hostile = rng.gen_bool(0.1);

    let tx = match rng.gen_range(0..5u32) {
        0 => {
            let amount = rng.gen_range(2_000..=50_000);
            let min = if hostile { u64::MAX } else { 1 };
            Transaction::new(trader, pool, amount, Operation::TezToTokenSwap {
                min_tokens_out: min,
            })
        }
        1 => {
            let tokens_in = rng.gen_range(5..=200);
            let min = if hostile { u64::MAX } else { 1 };
            approve_full(&mut w.chain, token, trader, pool);
            Transaction::new(trader, pool, 0, Operation::TokenToTezSwap {
                tokens_in,
                min_tez_out: min,
            })
        }
        2 => {
            let tokens_in = rng.gen_range(5..=200);
            let min = if hostile { u64::MAX } else { 1 };
            approve_full(&mut w.chain, token, trader, pool);
            Transaction::new(trader, pool, 0, Operation::TokenToTokenSwap {
                tokens_in,
                min_tokens_out: min,
                token_out: other_token,
            })
        }
        3 => {
            let amount = rng.gen_range(1_000..=100_000);
            let candidate = [BAKER_A, BAKER_B, BAKER_C][rng.gen_range(0..3)];
            approve_full(&mut w.chain, token, trader, pool);
            Transaction::new(trader, pool, amount, Operation::InvestLiquidity {
                candidate,
                min_shares: 1,
            })
        }
        _ => {
            let shares_burned = rng.gen_range(1..=50);
            Transaction::new(trader, pool, 0, Operation::DivestLiquidity {
                shares_burned,
                min_tez: 1,
                min_tokens: 1,
            })
        }
    };

    let root_before = w.chain.state_root();
    match w.chain.execute(tx) {
        Ok(_) => {
            assert_world_consistent(w);
            true
        }
        Err(_) => {
            assert_eq!(
                w.chain.state_root(),
                root_before,
                "rejected transaction mutated the chain"
            );
            false
        }
    }
}

/// Refresh the trader's allowance so the pool can pull deposits.
fn approve_full(chain: &mut Chain, token: Address, trader: Address, pool: Address) {
    let balance = chain.token(token).expect("ledger").balance_of(trader);
    chain.approve_token(token, trader, pool, balance).expect("approve");
}

// ============================================================================
// SCENARIO TESTS
// ============================================================================

/// Full lifecycle through the transaction layer: initialize, swap in
/// both directions, invest, two-hop trade, divest.
#[test]
fn full_lifecycle() {
    println!("\n=== LIFECYCLE TEST ===\n");

    let mut w = build_world(1);
    let trader = w.traders[0];
    assert_world_consistent(&w);

    // Settlement -> token on the reference pool: 10_000 mutez buys 20.
    println!("Swapping 10_000 mutez into pool A...");
    w.chain
        .execute(Transaction::new(trader, w.pool_a, 10_000, Operation::TezToTokenSwap {
            min_tokens_out: 20,
        }))
        .expect("tez to token");
    assert_eq!(w.chain.token(w.token_a).expect("ledger").balance_of(trader), 10_020);
    assert_world_consistent(&w);

    // Token -> settlement the other way.
    println!("Swapping 100 token A back out...");
    approve_full(&mut w.chain, w.token_a, trader, w.pool_a);
    w.chain
        .execute(Transaction::new(trader, w.pool_a, 0, Operation::TokenToTezSwap {
            tokens_in: 100,
            min_tez_out: 1,
        }))
        .expect("token to tez");
    assert_world_consistent(&w);

    // Buy into the pool.
    println!("Investing 100_000 mutez...");
    approve_full(&mut w.chain, w.token_a, trader, w.pool_a);
    w.chain
        .execute(Transaction::new(trader, w.pool_a, 100_000, Operation::InvestLiquidity {
            candidate: BAKER_B,
            min_shares: 1,
        }))
        .expect("invest");
    let shares = w.chain.pool_state(w.pool_a).expect("state").share_of(trader);
    println!("  trader holds {} shares", shares);
    assert!(shares > 0);
    assert_world_consistent(&w);

    // Cross pools.
    println!("Two-hop swap: 50 token A -> token B...");
    approve_full(&mut w.chain, w.token_a, trader, w.pool_a);
    let before_b = w.chain.token(w.token_b).expect("ledger").balance_of(trader);
    w.chain
        .execute(Transaction::new(trader, w.pool_a, 0, Operation::TokenToTokenSwap {
            tokens_in: 50,
            min_tokens_out: 1,
            token_out: w.token_b,
        }))
        .expect("two-hop");
    let gained = w.chain.token(w.token_b).expect("ledger").balance_of(trader) - before_b;
    println!("  received {} token B", gained);
    assert!(gained > 0);
    assert_world_consistent(&w);

    // Leave most of the position.
    println!("Divesting {} shares...", shares - 1);
    let receipt = w
        .chain
        .execute(Transaction::new(trader, w.pool_a, 0, Operation::DivestLiquidity {
            shares_burned: shares - 1,
            min_tez: 1,
            min_tokens: 1,
        }))
        .expect("divest");
    assert_eq!(w.chain.pool_state(w.pool_a).expect("state").share_of(trader), 1);
    assert_world_consistent(&w);

    println!("\nFinal root: {}", receipt.state_root_hex());
    println!("\n=== LIFECYCLE TEST PASSED ===\n");
}

/// The reference trade, end to end: fee 20, output 20, and the
/// one-token-stricter minimum bounces without a trace.
#[test]
fn reference_swap_numbers() {
    let mut w = build_world(1);
    let trader = w.traders[0];

    let err = w
        .chain
        .execute(Transaction::new(trader, w.pool_a, 10_000, Operation::TezToTokenSwap {
            min_tokens_out: 21,
        }))
        .expect_err("minimum above true output");
    assert_eq!(err, Error::SlippageExceeded { amount_out: 20, min_out: 21 });

    w.chain
        .execute(Transaction::new(trader, w.pool_a, 10_000, Operation::TezToTokenSwap {
            min_tokens_out: 20,
        }))
        .expect("swap");

    let state = w.chain.pool_state(w.pool_a).expect("state");
    assert_eq!(state.tez_pool, 1_010_000);
    assert_eq!(state.token_pool, 1_980);
    assert_eq!(state.invariant, 1_010_000u128 * 1_980);
}

/// A destination-leg failure unwinds the committed source leg: the
/// chain ends byte-identical to where it started.
#[test]
fn atomic_two_hop_rollback() {
    let mut w = build_world(1);
    let trader = w.traders[0];
    approve_full(&mut w.chain, w.token_a, trader, w.pool_a);

    let root_before = w.chain.state_root();

    let err = w
        .chain
        .execute(Transaction::new(trader, w.pool_a, 0, Operation::TokenToTokenSwap {
            tokens_in: 100,
            min_tokens_out: u64::MAX,
            token_out: w.token_b,
        }))
        .expect_err("impossible minimum");
    assert!(matches!(err, Error::SlippageExceeded { .. }));

    assert_eq!(w.chain.state_root(), root_before);
    let state_a = w.chain.pool_state(w.pool_a).expect("state");
    assert_eq!(state_a.tez_pool, 1_000_000);
    assert_eq!(state_a.token_pool, 2_000);
    assert_eq!(w.chain.token(w.token_a).expect("ledger").balance_of(trader), 10_000);
}

/// Delegation follows investment weight: a challenger that matches the
/// incumbent's votes takes the delegation, and divestment never gives
/// it back.
#[test]
fn delegation_follows_investment() {
    let mut w = build_world(2);
    let (challenger, other) = (w.traders[0], w.traders[1]);

    // 500 shares for BAKER_B: below the incumbent's 1_000, no switch.
    approve_full(&mut w.chain, w.token_a, challenger, w.pool_a);
    w.chain
        .execute(Transaction::new(challenger, w.pool_a, 500_000, Operation::InvestLiquidity {
            candidate: BAKER_B,
            min_shares: 1,
        }))
        .expect("invest below incumbent");
    assert_eq!(w.chain.delegate_of(w.pool_a), Some(BAKER_A));

    // Another 500 for BAKER_B ties the incumbent; ties switch.
    approve_full(&mut w.chain, w.token_a, other, w.pool_a);
    w.chain
        .execute(Transaction::new(other, w.pool_a, 500_000, Operation::InvestLiquidity {
            candidate: BAKER_B,
            min_shares: 1,
        }))
        .expect("invest to tie");
    assert_eq!(w.chain.delegate_of(w.pool_a), Some(BAKER_B));
    let state = w.chain.pool_state(w.pool_a).expect("state");
    assert_eq!(state.delegated, BAKER_B);
    assert_eq!(state.votes_for(BAKER_B), 1_000);

    // Divesting BAKER_B's weight below BAKER_A's leaves the delegate alone.
    w.chain
        .execute(Transaction::new(challenger, w.pool_a, 0, Operation::DivestLiquidity {
            shares_burned: 499,
            min_tez: 1,
            min_tokens: 1,
        }))
        .expect("divest");
    assert_eq!(w.chain.pool_state(w.pool_a).expect("state").delegated, BAKER_B);
    assert_eq!(w.chain.delegate_of(w.pool_a), Some(BAKER_B));
}

/// Soak test: a seeded mix of every operation with hostile minimums
/// sprinkled in. Invariants are checked after every acceptance, and
/// every rejection must leave the root untouched.
#[test]
fn randomized_operations() {
    println!("\n=== RANDOMIZED SOAK TEST ===\n");

    let mut world = build_world(4);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut accepted = 0usize;
    let mut rejected = 0usize;

    println!("Running {} random operations (seed=42)...", RANDOM_OP_COUNT);
    for _ in 0..RANDOM_OP_COUNT {
        if random_step(&mut world, &mut rng) {
            accepted += 1;
        } else {
            rejected += 1;
        }
    }

    println!("  Accepted:   {:>8}", accepted);
    println!("  Rejected:   {:>8}", rejected);
    println!("  Final root: {}", hex::encode(world.chain.state_root()));

    assert!(accepted > 0, "expected some operations to be accepted");
    assert!(rejected > 0, "expected the hostile minimums to be rejected");
    assert_world_consistent(&world);

    println!("\n=== SOAK TEST PASSED ===\n");
}

/// Verify determinism: the same operation sequence produces identical
/// state roots, and a different seed produces a different one.
#[test]
fn verify_determinism() {
    println!("\n=== DETERMINISM TEST ===\n");

    const COUNT: usize = 1_000;
    const SEED: u64 = 12345;

    let root1 = run_random_sequence(SEED, COUNT);
    let root2 = run_random_sequence(SEED, COUNT);
    println!("  Run 1 state root: {}", hex::encode(root1));
    println!("  Run 2 state root: {}", hex::encode(root2));
    assert_eq!(root1, root2, "state roots must match for determinism");

    let root3 = run_random_sequence(SEED + 1, COUNT);
    println!("  Different seed:   {}", hex::encode(root3));
    assert_ne!(root1, root3, "different seeds should diverge");

    println!("\n=== DETERMINISM VERIFIED ===\n");
}
