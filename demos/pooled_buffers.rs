//! Reusing one output buffer across many encodes.
//!
//! Run with: cargo run --example pooled_buffers

use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use toon_codec::pool::{BufferPool, PoolConfig, PooledBuffer, SharedPool};
use toon_codec::to_buffer;

#[derive(Serialize)]
struct Reading {
    sensor: String,
    celsius: f64,
    flags: Vec<&'static str>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let pool = Arc::new(SharedPool::new(PoolConfig::new().with_max_idle_buffers(2)));

    // One buffer, cleared between messages: the storage is allocated once.
    let mut buffer = PooledBuffer::from_pool(pool.clone(), 128);
    for n in 0..3 {
        buffer.clear();
        let reading = Reading {
            sensor: format!("probe-{}", n),
            celsius: 20.5 + f64::from(n),
            flags: vec!["ok", "calibrated"],
        };
        let written = to_buffer(&mut buffer, &reading)?;
        println!("{} bytes:\n{}", written, String::from_utf8_lossy(buffer.as_bytes()));
    }
    buffer.release();

    // Short-lived buffers pick up storage the pool kept from earlier leases.
    for _ in 0..5 {
        let mut scratch = PooledBuffer::from_pool(pool.clone(), 64);
        to_buffer(&mut scratch, &vec![1, 2, 3])?;
    }

    let stats = pool.stats();
    println!(
        "acquired: {}, allocated: {}, reused: {}, outstanding: {}",
        stats.acquired, stats.allocated, stats.reused, stats.outstanding
    );
    assert_eq!(stats.allocated, 1);
    assert_eq!(stats.outstanding, 0);

    Ok(())
}
