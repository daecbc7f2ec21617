//! Fetch a quick overview of a connected vehicle.
//!
//! Usage:
//!   SMARTCAR_TOKEN=<access token> SMARTCAR_VEHICLE_ID=<id> \
//!     cargo run --example vehicle_overview

use anyhow::Context;
use smartcar_client::Vehicle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartcar_client=debug".into()),
        )
        .init();

    let token = std::env::var("SMARTCAR_TOKEN").context("SMARTCAR_TOKEN is not set")?;
    let vehicle_id =
        std::env::var("SMARTCAR_VEHICLE_ID").context("SMARTCAR_VEHICLE_ID is not set")?;

    let vehicle = Vehicle::new(&token, &vehicle_id)?;

    let attributes = vehicle.attributes().await?;
    println!(
        "{} {} ({})",
        attributes.get("make").and_then(|v| v.as_str()).unwrap_or("?"),
        attributes.get("model").and_then(|v| v.as_str()).unwrap_or("?"),
        attributes.get("year").and_then(|v| v.as_i64()).unwrap_or(0),
    );

    // One round trip for the rest; entries fail independently.
    let batch = vehicle.batch(&["/odometer", "/battery", "/charge"]).await?;
    for name in ["odometer", "battery", "charge"] {
        match batch.get(name) {
            Ok(value) => println!("{name}: {}", value.to_json()),
            Err(error) => println!("{name}: unavailable ({error})"),
        }
    }

    Ok(())
}
