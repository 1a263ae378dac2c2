//! crates/couplequest_client/src/adapters/geolocation.rs

use async_trait::async_trait;
use couplequest_core::domain::LocationCoords;
use couplequest_core::ports::{GeolocationService, PortError, PortResult};

/// Reports a fixed position from configuration. Without one, every lookup
/// fails the way a denied permission prompt does.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredGeolocation {
    position: Option<LocationCoords>,
}

impl ConfiguredGeolocation {
    pub fn new(position: Option<LocationCoords>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationService for ConfiguredGeolocation {
    async fn current_position(&self) -> PortResult<LocationCoords> {
        self.position.ok_or_else(|| {
            PortError::PermissionDenied("no position is configured for this device".to_string())
        })
    }
}
