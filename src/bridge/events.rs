//! Outbound event types and their wire encoding.

use serde::Serialize;

use crate::camera::CameraInfo;
use crate::pose::NormalizedPoint;

/// One enumerable video source, as reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraDevice {
    pub label: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

impl From<&CameraInfo> for CameraDevice {
    fn from(info: &CameraInfo) -> Self {
        Self {
            label: info.name.clone(),
            device_id: info.index.to_string(),
        }
    }
}

/// An event delivered to the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The enumerable camera options, sent once per host attachment.
    CameraList(Vec<CameraDevice>),
    /// One-time signal after the first successful frame of a loop instance.
    CameraReady,
    /// Raw frame payload as a `data:image/jpeg;base64,...` URI.
    Frame(String),
    /// Normalized target landmark for this tick.
    Landmark(NormalizedPoint),
}

impl HostEvent {
    /// The channel identifier the host dispatches on.
    pub fn channel(&self) -> &'static str {
        match self {
            HostEvent::CameraList(_) => "camera-list",
            HostEvent::CameraReady => "camera-ready",
            HostEvent::Frame(_) => "frame",
            HostEvent::Landmark(_) => "landmark",
        }
    }

    /// Encode as one wire line: `{"channel": ..., "payload": ...}`, with
    /// `payload` omitted for signal-only events.
    pub fn to_wire(&self) -> String {
        let mut object = serde_json::Map::new();
        object.insert("channel".to_string(), self.channel().into());

        let payload = match self {
            HostEvent::CameraList(devices) => {
                Some(serde_json::to_value(devices).unwrap_or(serde_json::Value::Null))
            }
            HostEvent::CameraReady => None,
            HostEvent::Frame(data_uri) => Some(serde_json::Value::String(data_uri.clone())),
            HostEvent::Landmark(point) => {
                Some(serde_json::to_value(point).unwrap_or(serde_json::Value::Null))
            }
        };
        if let Some(value) = payload {
            object.insert("payload".to_string(), value);
        }

        serde_json::Value::Object(object).to_string()
    }
}
