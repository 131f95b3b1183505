// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::channel::Result;

/// One sensor sample of the channel.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Feed {
    /// Creation time as sent by the channel, e.g. `2024-11-20T14:03:11Z`.
    pub created_at: String,
    pub entry_id: u64,

    /// Voltage, string-encoded decimal.
    #[serde(default)]
    pub field1: Option<String>,

    /// Temperature, string-encoded decimal.
    #[serde(default)]
    pub field2: Option<String>,
}

impl Feed {
    /// Returns the raw value of field `index` (1-based), if any.
    pub fn field(&self, index: u8) -> Option<&str> {
        match index {
            1 => self.field1.as_deref(),
            2 => self.field2.as_deref(),
            _ => None,
        }
    }
}

/// Static metadata of the channel.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Channel {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,

    /// Label of field 1.
    pub field1: Option<String>,

    /// Label of field 2.
    pub field2: Option<String>,

    pub created_at: String,
    pub updated_at: String,
    pub last_entry_id: Option<u64>,
}

/// A channel together with its feeds, oldest first.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ChannelResponse {
    pub channel: Channel,
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

pub type ChannelControllerSharedPointer = Arc<dyn ChannelController>;

/// The channel controller trait that reads from and writes to a data channel.
#[async_trait]
pub trait ChannelController: Send + Sync {
    /// Fetches the most recent `count` feeds.
    async fn recent_feeds(&self, count: u32) -> Result<ChannelResponse>;

    /// Fetches the most recent `count` feeds of a single field.
    async fn field_series(&self, field: u8, count: u32) -> Result<ChannelResponse>;

    /// Writes `value` to field 1 and returns the id of the new entry.
    async fn submit_field_value(&self, value: f64) -> Result<u64>;
}

#[test]
fn test_parse_channel_response() {
    let json = r#"{
        "channel": {
            "id": 2716801,
            "name": "Energy",
            "field1": "Voltage",
            "field2": "Temperature",
            "created_at": "2024-11-12T18:20:11Z",
            "updated_at": "2024-11-12T18:24:35Z",
            "last_entry_id": 812
        },
        "feeds": [
            { "created_at": "2024-11-20T14:03:11Z", "entry_id": 811, "field1": "3.71", "field2": "24.5" },
            { "created_at": "2024-11-20T14:04:12Z", "entry_id": 812, "field1": null }
        ]
    }"#;

    let response: ChannelResponse = serde_json::from_str(json).unwrap();

    assert_eq!(response.channel.id, 2716801);
    assert_eq!(response.channel.last_entry_id, Some(812));
    assert_eq!(response.feeds.len(), 2);
    assert_eq!(response.feeds[0].field(1), Some("3.71"));
    assert_eq!(response.feeds[0].field(2), Some("24.5"));
    assert_eq!(response.feeds[1].field1, None);
    assert_eq!(response.feeds[1].field2, None);
}

#[test]
fn test_parse_field_response() {
    // The per-field endpoint sends a reduced channel object.
    let json = r#"{
        "channel": { "id": 2716801, "name": "Energy", "field2": "Temperature" },
        "feeds": [ { "created_at": "2024-11-20T14:03:11Z", "entry_id": 811, "field2": "24.5" } ]
    }"#;

    let response: ChannelResponse = serde_json::from_str(json).unwrap();

    assert_eq!(response.channel.field1, None);
    assert_eq!(response.feeds[0].field(1), None);
    assert_eq!(response.feeds[0].field(2), Some("24.5"));
}
