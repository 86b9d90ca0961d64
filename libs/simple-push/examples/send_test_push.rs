//! Sends the default test alert to a single device.
//!
//! ```text
//! APNS_TOPIC=com.example.app \
//! APNS_CERTIFICATE_PATH=apns_cert.p12 \
//! APNS_SANDBOX=true \
//! cargo run -p simple-push --example send_test_push -- <hex device token>
//! ```

use anyhow::{bail, Context, Result};
use simple_push::{DeviceToken, Payload, PushClient, PushConfig, SendOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(token) = std::env::args().nth(1) else {
        bail!("usage: send_test_push <hex device token>");
    };
    let token = DeviceToken::from_hex(&token).context("parsing device token")?;

    let config = PushConfig::from_env().context("loading APNs configuration")?;
    if config.certificate_path.is_none() {
        tracing::warn!("APNS_CERTIFICATE_PATH not set; sending without a client certificate");
    }

    let client = PushClient::from_config(config).context("creating APNs client")?;
    let receipt = client
        .send(&Payload::default_alert(), &token, SendOptions::default())
        .await
        .context("sending test notification")?;

    tracing::info!(apns_id = ?receipt.apns_id, "Test notification delivered");
    Ok(())
}
