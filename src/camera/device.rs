//! Camera device enumeration.

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use super::types::{AcquisitionError, CameraInfo};

/// List all available camera devices on the system.
///
/// Returns a vector of `CameraInfo` structs, or an error if querying fails.
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices() -> Result<Vec<CameraInfo>, AcquisitionError> {
    let devices =
        query(ApiBackend::Auto).map_err(|e| AcquisitionError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| {
            let index = d.index().as_index().unwrap_or(0);
            let name = d.human_name();
            CameraInfo {
                index,
                // Some backends report unnamed devices
                name: if name.trim().is_empty() {
                    format!("Camera {}", index)
                } else {
                    name
                },
                description: d.description().to_string(),
            }
        })
        .collect())
}
