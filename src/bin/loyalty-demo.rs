// Copyright (c) 2025 - Cowboy AI, Inc.
//! Loyalty Demo
//!
//! Runs a referral end to end against the in-memory runtime and prints the
//! resulting read model.
//!
//! Run with: cargo run --bin loyalty-demo
//!
//! Retry tuning comes from EVENT_BUS_BACKOFF_INITIAL_INTERVAL,
//! EVENT_BUS_BACKOFF_MAX_ELAPSED_TIME and EVENT_BUS_BACKOFF_MAX_RETRY.

use anyhow::{Context, Result};
use loyalty_es::aggregate::{CreateReferral, CreateUser};
use loyalty_es::config::init_tracing;
use loyalty_es::{EventBusConfig, LoyaltyRuntime};
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = EventBusConfig::from_env().context("invalid event bus configuration")?;
    info!(?config, "Starting loyalty demo");
    let runtime = LoyaltyRuntime::in_memory(config);

    let referrer_id = Uuid::new_v4().to_string();
    runtime
        .dispatch(CreateUser {
            user_id: referrer_id.clone(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            referred_by_code: None,
        })
        .await
        .context("failed to create referrer")?;

    let referrer = runtime.read_repo.user(&referrer_id).await?;
    info!(referral_code = %referrer.referral_code, "Referrer created");

    runtime
        .dispatch(CreateReferral {
            user_id: referrer_id.clone(),
            referred_user_email: "bob@example.com".to_string(),
        })
        .await
        .context("failed to create referral")?;

    runtime
        .dispatch(CreateUser {
            user_id: Uuid::new_v4().to_string(),
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            referred_by_code: Some(referrer.referral_code.clone()),
        })
        .await
        .context("failed to create referred user")?;

    for user in runtime.read_repo.users().await? {
        println!(
            "{:<8} {:>5} points  code {}  referrals {}",
            user.username,
            user.points,
            user.referral_code,
            user.referrals
                .iter()
                .map(|referral| format!("{} ({})", referral.referred_user_email, referral.status))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    info!("✅ Loyalty demo complete");
    Ok(())
}
