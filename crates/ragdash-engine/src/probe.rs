//! Reachability probe

use ragdash_client::RagApi;
use ragdash_core::Reachability;

/// Probe the backend once; any failure means offline
pub async fn probe(api: &dyn RagApi) -> Reachability {
    match api.health().await {
        Ok(_) => {
            tracing::debug!(base_url = %api.base_url(), "backend reachable");
            Reachability::Online
        }
        Err(err) => {
            tracing::info!(base_url = %api.base_url(), error = %err, "backend unreachable, using fallback data");
            Reachability::Offline
        }
    }
}
