//! Decoding without a target type and building values at runtime.
//!
//! Run with: cargo run --example dynamic_values

use std::error::Error;
use toon_codec::{decode, from_slice_to_map, to_string, toon, Value};

const CONFIG: &str = "\
service: billing
port: 8080
replicas:
  - region: eu-west
    weight: 0.7
  - region: us-east
    weight: 0.3
features: audit, retries
";

fn main() -> Result<(), Box<dyn Error>> {
    // Untyped decode: the root must be a map.
    let config = from_slice_to_map(CONFIG.as_bytes())?;
    println!("service: {:?}", config.get("service").and_then(Value::as_str));
    println!("port: {:?}", config.get("port").and_then(Value::as_i64));

    if let Some(replicas) = config.get("replicas").and_then(Value::as_sequence) {
        for replica in replicas {
            let region = replica.as_map().and_then(|m| m.get("region"));
            println!("replica in {}", region.map(ToString::to_string).unwrap_or_default());
        }
    }

    // Any root kind decodes into a Value tree.
    let list = decode(b"1, 2.5, null, text\n")?;
    println!("list kinds: {:?}", list.as_sequence().map(|items| {
        items.iter().map(Value::kind).collect::<Vec<_>>()
    }));

    // Build a value and encode it.
    let patch = toon!({
        "service": "billing",
        "port": 9090,
        "features": ["audit"]
    });
    println!("patch:\n{}", to_string(&patch)?);

    Ok(())
}
