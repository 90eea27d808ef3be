// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer Demo
//!
//! Runs the customer lifecycle end to end in one process:
//! register two customers (the second with a taken email), rename, deactivate
//! and reactivate the first, then print the read model and the event log.
//!
//! Run with: cargo run --bin customer-demo
//!
//! Configuration comes from `CUSTOMER_*` environment variables (see
//! `cim_customer::config`); `RUST_LOG` controls log output.

use anyhow::{Context, Result};
use chrono::Utc;
use cim_customer::aggregate::commands::{
    DeactivateCustomerCommand, ReactivateCustomerCommand, RegisterCustomerCommand,
    UpdateCustomerCommand,
};
use cim_customer::{CustomerApplication, CustomerConfig, CustomerId, InboundCommand};
use tracing::info;
use uuid::Uuid;

fn register(entity_id: &CustomerId, name: &str, email: &str) -> RegisterCustomerCommand {
    RegisterCustomerCommand {
        entity_id: entity_id.clone(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "sha1$demo$1$0000".to_string(),
        timestamp: Utc::now(),
        correlation_id: Uuid::now_v7(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = CustomerConfig::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded:");
    info!("  - Registration timeout: {} ms", config.registration_timeout_ms);
    info!("  - Saga consistency: {:?}", config.saga.consistency);

    let app = CustomerApplication::start(config)
        .await
        .context("Failed to start customer application")?;

    let alice = CustomerId::new("C1").context("Invalid customer id")?;
    let bob = CustomerId::new("C2").context("Invalid customer id")?;

    let outcome = app
        .register_customer(register(&alice, "Alice", "alice@example.com"))
        .await
        .context("Failed to register C1")?;
    info!("Register {}: {:?}", alice, outcome);

    let outcome = app
        .register_customer(register(&bob, "Bob", "alice@example.com"))
        .await
        .context("Failed to register C2")?;
    info!("Register {} with the same email: {:?}", bob, outcome);

    app.submit(InboundCommand::UpdateCustomer(UpdateCustomerCommand {
        entity_id: alice.clone(),
        name: "Alice Liddell".to_string(),
        timestamp: Utc::now(),
        correlation_id: Uuid::now_v7(),
        causation_id: None,
    }))
    .await
    .context("Failed to update C1")?;

    app.submit(InboundCommand::DeactivateCustomer(DeactivateCustomerCommand {
        entity_id: alice.clone(),
        timestamp: Utc::now(),
        correlation_id: Uuid::now_v7(),
        causation_id: None,
    }))
    .await
    .context("Failed to deactivate C1")?;

    match app
        .submit(InboundCommand::UpdateCustomer(UpdateCustomerCommand {
            entity_id: alice.clone(),
            name: "Nobody".to_string(),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
        }))
        .await
    {
        Ok(_) => info!("Update of a deactivated customer was accepted"),
        Err(e) => info!("Update of a deactivated customer rejected: {}", e),
    }

    let outcome = app
        .submit(InboundCommand::ReactivateCustomer(ReactivateCustomerCommand {
            entity_id: alice.clone(),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
        }))
        .await
        .context("Failed to reactivate C1")?;

    app.watermark()
        .wait_for(outcome.last_position, app.config().registration_timeout())
        .await
        .context("Read model did not catch up")?;

    let customers = app.list_customers().await?;
    println!("{}", serde_json::to_string_pretty(&customers)?);

    for stored in app.export().await {
        println!(
            "{:>3} {:<4} v{} {}",
            stored.position, stored.entity_id, stored.version, stored.kind
        );
    }

    app.shutdown().await.context("Shutdown failed")?;
    Ok(())
}
