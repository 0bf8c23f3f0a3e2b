//! Basic usage of the bucketeer crate.
//!
//! Run with: `cargo run --example basic`

use bucketeer::{CancellationToken, TokenBucket, TokenBucketBuilder, TokenBucketConfig};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    println!("=== Token Bucket Example ===\n");

    burst_example();
    separator();
    refill_example();
    separator();
    blocking_example();
    separator();
    cancellation_example();
    separator();
    stats_example();
}

fn separator() {
    println!("\n{}\n", "=".repeat(50));
}

fn burst_example() {
    println!("1. Burst Capacity:");

    let bucket = TokenBucket::new(5, 1, Duration::from_secs(1));
    bucket.start().expect("spawn refill thread");

    for i in 1..=8 {
        if bucket.try_take() {
            println!("   Request {} - ✅ Admitted", i);
        } else {
            println!("   Request {} - ❌ Throttled", i);
        }
    }

    bucket.stop();
}

fn refill_example() {
    println!("2. Steady Refill:");

    let config = TokenBucketConfig::per_second(4).with_capacity(1);
    let bucket = TokenBucket::with_config(config.clone());
    bucket.start().expect("spawn refill thread");

    println!(
        "   Refill interval: {:?} ({} tokens/second)",
        bucket.refill_interval(),
        config.effective_rate_per_second()
    );

    let start = Instant::now();
    for i in 1..=5 {
        bucket.take();
        println!("   Token {} after {:>4}ms", i, start.elapsed().as_millis());
    }

    bucket.stop();
}

fn blocking_example() {
    println!("3. Waiting With a Timeout:");

    let bucket = Arc::new(
        TokenBucketBuilder::new()
            .capacity(2)
            .rate(5)
            .window(Duration::from_secs(1))
            .build(),
    );
    bucket.start().expect("spawn refill thread");

    let workers: Vec<_> = (0..6)
        .map(|id| {
            let bucket = bucket.clone();
            thread::spawn(move || {
                let admitted = bucket.take_with_timeout(Duration::from_millis(500));
                (id, admitted)
            })
        })
        .collect();

    for worker in workers {
        let (id, admitted) = worker.join().expect("worker panicked");
        println!(
            "   Worker {} - {}",
            id,
            if admitted { "✅ got a token" } else { "⏱️ timed out" }
        );
    }

    bucket.stop();
}

fn cancellation_example() {
    println!("4. Cancelling a Wait:");

    // Never started, so it never refills.
    let bucket = Arc::new(TokenBucket::new(0, 1, Duration::from_secs(1)));
    let token = CancellationToken::new();

    let waiter = {
        let bucket = bucket.clone();
        let token = token.clone();
        thread::spawn(move || bucket.take_cancellable(&token))
    };

    thread::sleep(Duration::from_millis(100));
    token.cancel();
    println!(
        "   Waiter admitted: {}",
        waiter.join().expect("waiter panicked")
    );
}

fn stats_example() {
    println!("5. Statistics:");

    let bucket = TokenBucket::new(2, 1, Duration::from_secs(1));
    bucket.start().expect("spawn refill thread");

    for _ in 0..3 {
        bucket.try_take();
    }
    thread::sleep(Duration::from_millis(1100));
    bucket.try_take();

    let (total, blocked, rate) = bucket.stat().as_tuple();
    println!("   total={} blocked={} success={:.1}%", total, blocked, rate);
    println!("{}", bucket.stat());

    bucket.reset_stat();
    println!("   After reset: {:?}", bucket.stat().as_tuple());

    bucket.stop();
}
