//! DexPool - Binary Entry Point
//!
//! Walks one pool through its lifecycle: deploy, initialize, swap,
//! and a two-hop token-to-token trade across a second pool.

use dexpool::engine::{Chain, Operation, Transaction};
use dexpool::types::{amount, ValidatorKey};

fn main() {
    println!("===========================================");
    println!("  DexPool - AMM Exchange Engine");
    println!("===========================================");
    println!();

    let mut chain = Chain::new();
    let admin = chain.create_account(amount::tez(10));
    let trader = chain.create_account(amount::tez(5));

    println!("Deploying token ledgers and exchanges...");
    let token_a = chain.deploy_token(admin, 1_000_000);
    let token_b = chain.deploy_token(admin, 1_000_000);
    let pool_a = chain
        .deploy_exchange(500, token_a, ValidatorKey(1))
        .expect("deploy pool A");
    let pool_b = chain
        .deploy_exchange(500, token_b, ValidatorKey(1))
        .expect("deploy pool B");
    println!("  token A at {}, pool A at {}", token_a, pool_a);
    println!("  token B at {}, pool B at {}", token_b, pool_b);
    println!();

    let deposit = amount::to_mutez("1.0").expect("parse deposit");
    println!(
        "Initializing both pools: {} tez against 2000 tokens...",
        amount::from_mutez_trimmed(deposit)
    );
    for (token, pool) in [(token_a, pool_a), (token_b, pool_b)] {
        chain
            .approve_token(token, admin, pool, 2_000)
            .expect("approve");
        let receipt = chain
            .execute(Transaction::new(
                admin,
                pool,
                deposit,
                Operation::InitializeExchange {
                    token_amount: 2_000,
                    candidate: ValidatorKey(1),
                },
            ))
            .expect("initialize");
        println!("  tx {}: root {}", receipt.tx_id, receipt.state_root_hex());
    }
    println!();

    let swap_in = amount::to_mutez("0.01").expect("parse swap amount");
    println!("Swapping {} tez for token A...", amount::from_mutez_trimmed(swap_in));
    let receipt = chain
        .execute(Transaction::new(
            trader,
            pool_a,
            swap_in,
            Operation::TezToTokenSwap { min_tokens_out: 1 },
        ))
        .expect("swap");
    let held = chain
        .token(token_a)
        .map(|l| l.balance_of(trader))
        .unwrap_or(0);
    println!("  tx {}: trader now holds {} token A", receipt.tx_id, held);
    println!(
        "  trader native balance: {} tez",
        amount::from_mutez(chain.native_balance(trader))
    );
    println!();

    println!("Two-hop swap: token A -> token B through the registry...");
    chain
        .approve_token(token_a, trader, pool_a, held)
        .expect("approve");
    let receipt = chain
        .execute(Transaction::new(
            trader,
            pool_a,
            0,
            Operation::TokenToTokenSwap {
                tokens_in: held,
                min_tokens_out: 1,
                token_out: token_b,
            },
        ))
        .expect("two-hop swap");
    let held_b = chain
        .token(token_b)
        .map(|l| l.balance_of(trader))
        .unwrap_or(0);
    println!(
        "  tx {}: {} effects applied, trader now holds {} token B",
        receipt.tx_id, receipt.effects_applied, held_b
    );
    println!();

    println!("Final state root: {}", receipt.state_root_hex());
    println!("Run 'cargo test' to verify all tests pass.");
}
