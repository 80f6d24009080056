//! The handle API end to end, with compaction logged.
//!
//! Run with:
//!     RUST_LOG=strpool=debug cargo run --example hello_dolly

use strpool::{Pool, PoolConfig, pool_format};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Small slack so the demo compacts a few times
    let config = PoolConfig::default().with_initial_capacity(64);
    let mut pool = Pool::with_config(config)?;

    pool.assign(4, b"Hello ")?;
    pool.append(4, b"Dolly")?;
    pool.copy(5, 4)?;
    pool.substring_of(7, 4, 6, 5)?;

    println!("handle 4: {}", String::from_utf8_lossy(pool.get(4)?));
    println!("handle 5: {}", String::from_utf8_lossy(pool.get(5)?));
    println!("handle 7: {}", String::from_utf8_lossy(pool.get(7)?));
    println!("\"Doll\" found at {:?}", pool.find(5, b"Doll")?);
    println!("handles 0..{} are addressable\n", pool.count());

    // Keep growing one string; it stays on top and grows in place
    for verse in 0..20 {
        pool.append(4, b", well hello Dolly")?;
        if verse % 5 == 4 {
            let stats = pool.stats();
            println!(
                "len={} capacity={} compactions={}",
                pool.len(4)?,
                stats.capacity,
                stats.compactions
            );
        }
    }

    pool_format!(pool, 8, "handle 4 holds {} bytes", pool.len(4)?)?;
    println!("\n{}", String::from_utf8_lossy(pool.get(8)?));

    let stats = pool.stats();
    println!(
        "data={} garbage={} live={} generation={}",
        stats.data_size, stats.garbage_size, stats.live_bytes, stats.generation
    );

    Ok(())
}
