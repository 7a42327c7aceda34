use crate::api_client::DcmApi;
use crate::batch::Success;
use crate::error::Error;
use log::{info, warn};
use std::time::Duration;
use tokio_retry2::strategy::ExponentialBackoff;

const MAX_BACKOFF: Duration = Duration::from_secs(20);

/// Schedule for retrying activation while DCM finishes transcoding.
#[derive(Debug, Clone, Copy)]
pub struct ActivationPolicy {
    pub attempts: u32,
    /// Milliseconds per backoff step. The pause before retry `n` is
    /// `backoff_factor * 2^n`, capped at 20s.
    pub backoff_factor: u64,
}

impl ActivationPolicy {
    pub fn new(attempts: u32) -> Self {
        ActivationPolicy {
            attempts,
            backoff_factor: 500,
        }
    }

    /// Pauses between rounds: 1s, 2s, 4s... up to 20s with the default factor.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::from_millis(2)
            .factor(self.backoff_factor)
            .max_delay(MAX_BACKOFF)
    }
}

/// Activates the creative and then the ad of every created row.
///
/// Ads that fail are retried in later rounds, with a growing pause between
/// rounds. Returns the ids of the ads still inactive after the last round.
pub async fn activate_all(
    api: &dyn DcmApi,
    profile_id: u64,
    created: &[Success],
    policy: ActivationPolicy,
) -> Vec<u64> {
    let mut pending: Vec<(u64, u64)> = created
        .iter()
        .map(|success| (success.ad_id, success.creative_id))
        .collect();

    info!("Activating {} ads", pending.len());

    let mut backoff = policy.backoff();
    for round in 0..policy.attempts {
        if pending.is_empty() {
            break;
        }
        if round > 0 {
            let pause = backoff.next().unwrap_or(MAX_BACKOFF);
            info!(
                "Ads pending activation: {}. Retrying in {:?}",
                pending.len(),
                pause
            );
            tokio::time::sleep(pause).await;
        }

        let mut still_pending = vec![];
        for (ad_id, creative_id) in pending {
            match activate(api, profile_id, ad_id, creative_id).await {
                Ok(()) => info!("Ad {} activated", ad_id),
                Err(err) => {
                    warn!("Couldn't activate ad ID '{}': {}", ad_id, err);
                    still_pending.push((ad_id, creative_id));
                }
            }
        }
        pending = still_pending;
    }

    if pending.is_empty() {
        info!("All ads activated");
    }

    pending.into_iter().map(|(ad_id, _)| ad_id).collect()
}

async fn activate(
    api: &dyn DcmApi,
    profile_id: u64,
    ad_id: u64,
    creative_id: u64,
) -> Result<(), Error> {
    api.activate_creative(profile_id, creative_id).await?;
    api.activate_ad(profile_id, ad_id).await
}
