//! Smoke test against a live server with the time-series module loaded.
//!
//! ```bash
//! docker run -p 6379:6379 redislabs/redistimeseries
//! TSDB_ADDR=127.0.0.1:6379 RUST_LOG=debug tsdb-smoke
//! ```

use redis_tsdb::{AggregationType, Client, ClientConfig};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    println!("Time-series smoke test against {}\n", config.addr);
    let client = Client::connect(config);

    let now = i64::try_from(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())?;
    let key = format!("smoke:{}", now);
    let dest = format!("{}:count", key);
    let retention = Duration::from_secs(3600);

    client.create_key(&key, retention, 360).await?;
    client.create_key(&dest, retention, 360).await?;
    println!("✓ Created {} and {}", key, dest);

    client.create_rule(&key, AggregationType::Count, 10, &dest).await?;
    println!("✓ Created count rule {} -> {}", key, dest);

    client.add(&key, now - 2, 5.0).await?;
    client.add(&key, now - 1, 6.0).await?;
    println!("✓ Added 2 samples");

    let points = client.range(&key, now - 60, now).await?;
    println!("Range: {:?}", points);

    let buckets = client
        .agg_range(&key, now - 60, now, AggregationType::Count, 10)
        .await?;
    println!("Count per 10s: {:?}", buckets);

    let info = client.info(&key).await?;
    println!("Info: {:?}", info);

    client.delete_rule(&key, &dest).await?;
    println!("✓ Deleted rule");

    match client.delete_rule(&key, &dest).await {
        Err(e) => println!("✓ Second delete rejected: {}", e),
        Ok(()) => return Err("second delete_rule unexpectedly succeeded".into()),
    }

    println!("\n✅ Smoke test passed");
    Ok(())
}
