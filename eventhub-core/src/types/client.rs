// Copyright 2026 EventHub Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client metadata captured at session issuance.

use serde::{Deserialize, Serialize};

/// Label used when the user agent carries no recognizable hints.
pub const UNKNOWN_DEVICE: &str = "Unknown device";

/// Client information attached to a session.
///
/// Both the address and the user agent are opaque strings supplied by the
/// transport layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientMetadata {
    /// Origin address of the request that created the session
    pub ip_address: String,

    /// Raw user agent string
    pub user_agent: String,

    /// Human readable label derived from the user agent
    pub device_label: String,
}

impl ClientMetadata {
    /// Creates client metadata and derives the device label.
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        let device_label = derive_device_label(&user_agent);
        Self {
            ip_address: ip_address.into(),
            user_agent,
            device_label,
        }
    }
}

/// Derives a short device label such as "Firefox on Linux".
pub fn derive_device_label(user_agent: &str) -> String {
    if user_agent.starts_with("okhttp")
        || user_agent.starts_with("Dart/")
        || user_agent.starts_with("CFNetwork")
    {
        return "Mobile app".to_string();
    }

    // Order matters: Edge and Chrome both advertise Safari.
    let browser = if user_agent.contains("Edg/") {
        Some("Edge")
    } else if user_agent.contains("Firefox/") {
        Some("Firefox")
    } else if user_agent.contains("Chrome/") {
        Some("Chrome")
    } else if user_agent.contains("Safari/") {
        Some("Safari")
    } else {
        None
    };

    // Android advertises Linux, iOS advertises Mac OS X.
    let os = if user_agent.contains("Android") {
        Some("Android")
    } else if user_agent.contains("iPhone") || user_agent.contains("iPad") {
        Some("iOS")
    } else if user_agent.contains("Windows") {
        Some("Windows")
    } else if user_agent.contains("Macintosh") || user_agent.contains("Mac OS X") {
        Some("macOS")
    } else if user_agent.contains("Linux") {
        Some("Linux")
    } else {
        None
    };

    match (browser, os) {
        (Some(browser), Some(os)) => format!("{} on {}", browser, os),
        (Some(browser), None) => browser.to_string(),
        (None, Some(os)) => format!("{} device", os),
        (None, None) => UNKNOWN_DEVICE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_labels() {
        let firefox = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        assert_eq!(derive_device_label(firefox), "Firefox on Linux");

        let chrome_mac = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
        assert_eq!(derive_device_label(chrome_mac), "Chrome on macOS");

        let edge = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                    (KHTML, like Gecko) Chrome/120.0 Safari/537.36 Edg/120.0";
        assert_eq!(derive_device_label(edge), "Edge on Windows");

        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                      AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile Safari/604.1";
        assert_eq!(derive_device_label(iphone), "Safari on iOS");

        let android = "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 Chrome/120.0 Mobile";
        assert_eq!(derive_device_label(android), "Chrome on Android");
    }

    #[test]
    fn test_unknown_and_app_agents() {
        assert_eq!(derive_device_label(""), UNKNOWN_DEVICE);
        assert_eq!(derive_device_label("curl/8.4.0"), UNKNOWN_DEVICE);
        assert_eq!(derive_device_label("okhttp/4.12.0"), "Mobile app");
    }
}
