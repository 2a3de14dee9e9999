use std::sync::Arc;
use zfsvol_driver::VolumeDriver;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Driver every request is dispatched to
    pub driver: Arc<dyn VolumeDriver>,
}

impl AppState {
    pub fn new(driver: Arc<dyn VolumeDriver>) -> Self {
        Self { driver }
    }
}
