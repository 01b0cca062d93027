//! Request-kind classification for the ONVIF control plane
//!
//! Request bodies are classified by substring match against the expected
//! method tokens, in a fixed priority order. The enumerated kinds keep the
//! dispatch table reviewable even though the matching itself stays
//! namespace-agnostic.

/// Device-channel methods, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMethod {
    DeviceInformation,
    Capabilities,
    Services,
    SystemDateAndTime,
    NetworkInterfaces,
}

impl DeviceMethod {
    /// Classify a request body. Unrecognized bodies default to
    /// `DeviceInformation`, which every recorder understands.
    pub fn classify(body: &str) -> Self {
        if body.contains("GetDeviceInformation") {
            Self::DeviceInformation
        } else if body.contains("GetCapabilities") {
            Self::Capabilities
        } else if body.contains("GetServices") {
            Self::Services
        } else if body.contains("GetSystemDateAndTime") {
            Self::SystemDateAndTime
        } else if body.contains("GetNetworkInterfaces") {
            Self::NetworkInterfaces
        } else {
            Self::DeviceInformation
        }
    }
}

/// Media-channel methods, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMethod {
    Profiles,
    StreamUri,
    VideoSources,
}

impl MediaMethod {
    pub fn classify(body: &str) -> Self {
        if body.contains("GetProfiles") {
            Self::Profiles
        } else if body.contains("GetStreamUri") {
            Self::StreamUri
        } else if body.contains("GetVideoSources") {
            Self::VideoSources
        } else {
            Self::Profiles
        }
    }
}

/// `true` when a GetStreamUri body selects the sub stream. The marker is a
/// plain substring check on the profile token, matching what recorders
/// actually send.
pub fn wants_sub_stream(body: &str) -> bool {
    body.to_ascii_lowercase().contains("sub")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_classification_priority() {
        assert_eq!(
            DeviceMethod::classify("<GetDeviceInformation/>"),
            DeviceMethod::DeviceInformation
        );
        assert_eq!(
            DeviceMethod::classify("<tds:GetCapabilities/>"),
            DeviceMethod::Capabilities
        );
        assert_eq!(
            DeviceMethod::classify("<tds:GetServices/>"),
            DeviceMethod::Services
        );
        assert_eq!(
            DeviceMethod::classify("<GetSystemDateAndTime/>"),
            DeviceMethod::SystemDateAndTime
        );
        assert_eq!(
            DeviceMethod::classify("<GetNetworkInterfaces/>"),
            DeviceMethod::NetworkInterfaces
        );
        // DeviceInformation wins when multiple tokens appear
        assert_eq!(
            DeviceMethod::classify("<GetDeviceInformation/><GetCapabilities/>"),
            DeviceMethod::DeviceInformation
        );
    }

    #[test]
    fn unknown_device_body_defaults_to_device_information() {
        assert_eq!(
            DeviceMethod::classify("<SomethingElse/>"),
            DeviceMethod::DeviceInformation
        );
    }

    #[test]
    fn media_classification() {
        assert_eq!(
            MediaMethod::classify("<trt:GetProfiles/>"),
            MediaMethod::Profiles
        );
        assert_eq!(
            MediaMethod::classify("<trt:GetStreamUri><ProfileToken>main</ProfileToken></trt:GetStreamUri>"),
            MediaMethod::StreamUri
        );
        assert_eq!(
            MediaMethod::classify("<GetVideoSources/>"),
            MediaMethod::VideoSources
        );
        assert_eq!(MediaMethod::classify("garbage"), MediaMethod::Profiles);
    }

    #[test]
    fn sub_stream_marker() {
        assert!(wants_sub_stream("<ProfileToken>sub</ProfileToken>"));
        assert!(wants_sub_stream("<ProfileToken>SubStream</ProfileToken>"));
        assert!(!wants_sub_stream("<ProfileToken>main</ProfileToken>"));
    }
}
