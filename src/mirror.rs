//! Mirror status resolution.
//!
//! Runs once per session: reads the backend's mirror status and asks for
//! mirror mode when it is not already on. The display always stays on the
//! music surface, whatever the outcome.

use tracing::{debug, info, warn};

use crate::remote::{EnableMirrorRequest, MirrorBackend, MirrorStatus, iso_timestamp};

pub const ENABLE_REFUSED: &str = "Failed to enable Spotify mirror mode";
pub const ENABLE_UNREACHABLE: &str = "Error connecting to Pi";

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorResolution {
    /// Always `true`: the display never navigates away from itself.
    pub stay_local: bool,
    pub mirror_enabled: bool,
    pub pi_connected: bool,
    /// Whether an enable request was issued.
    pub enable_requested: bool,
    /// User-facing message when the enable request failed.
    pub enable_error: Option<String>,
}

pub async fn resolve<B: MirrorBackend>(backend: &B) -> MirrorResolution {
    let mut resolution = MirrorResolution {
        stay_local: true,
        ..MirrorResolution::default()
    };

    match backend.mirror_status().await {
        Ok(MirrorStatus {
            success: true,
            mirror_enabled: true,
            credentials_sent,
            credentials_expired,
        }) => {
            resolution.mirror_enabled = true;
            resolution.pi_connected = credentials_sent && !credentials_expired;
            info!(
                pi_connected = resolution.pi_connected,
                "mirror mode already enabled"
            );
            return resolution;
        }
        Ok(status) if status.success => {
            debug!("mirror mode disabled on the backend, enabling");
        }
        Ok(_) => {
            warn!("mirror status reported failure, enabling");
        }
        Err(e) => {
            warn!(error = %e, "mirror status unavailable, enabling");
        }
    }

    resolution.enable_requested = true;
    let request = EnableMirrorRequest {
        mirror_enabled: true,
        timestamp: iso_timestamp(),
    };
    match backend.enable_mirror(&request).await {
        Ok(response) if response.success => {
            resolution.mirror_enabled = true;
            info!("mirror mode enabled");
        }
        Ok(response) => {
            warn!(
                error = response.error.as_deref().unwrap_or("unspecified"),
                "mirror enable refused"
            );
            resolution.enable_error = Some(ENABLE_REFUSED.to_string());
        }
        Err(e) => {
            warn!(error = %e, "mirror enable failed");
            resolution.enable_error = Some(ENABLE_UNREACHABLE.to_string());
        }
    }
    resolution
}
