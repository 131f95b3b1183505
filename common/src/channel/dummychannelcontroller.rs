// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::channel::channelcontroller::{ChannelController, ChannelResponse, Feed};
use crate::channel::Result;

/// Serves a bundled channel response, for running without a configured channel.
pub struct DummyChannelController {
    response: ChannelResponse,
}

impl DummyChannelController {
    pub fn new() -> Result<Self> {
        let json_data = std::include_str!("./dummychannel.json");

        let response = serde_json::from_str::<ChannelResponse>(json_data)?;

        Ok(Self { response })
    }

    fn last_feeds(&self, count: u32) -> &[Feed] {
        let feeds = &self.response.feeds;
        let count = (count as usize).min(feeds.len());
        &feeds[feeds.len() - count..]
    }
}

#[async_trait]
impl ChannelController for DummyChannelController {
    async fn recent_feeds(&self, count: u32) -> Result<ChannelResponse> {
        Ok(ChannelResponse {
            channel: self.response.channel.clone(),
            feeds: self.last_feeds(count).to_vec(),
        })
    }

    async fn field_series(&self, field: u8, count: u32) -> Result<ChannelResponse> {
        let feeds = self
            .last_feeds(count)
            .iter()
            .map(|feed| Feed {
                field1: feed.field(1).filter(|_| field == 1).map(Into::into),
                field2: feed.field(2).filter(|_| field == 2).map(Into::into),
                ..feed.clone()
            })
            .collect();

        Ok(ChannelResponse {
            channel: self.response.channel.clone(),
            feeds,
        })
    }

    async fn submit_field_value(&self, value: f64) -> Result<u64> {
        log::debug!("Dummy channel ignores written value {value}");

        Ok(self.response.channel.last_entry_id.unwrap_or_default() + 1)
    }
}

#[tokio::test]
async fn test_dummy_channel_controller() {
    let controller = DummyChannelController::new().unwrap();
    let response = controller.recent_feeds(30).await.unwrap();

    assert_eq!(response.channel.name, "Energy Monitoring");
    assert_eq!(response.feeds.len(), 7);
    assert_eq!(response.feeds[0].field1.as_deref(), Some("3.62"));
    assert_eq!(response.feeds[3].field2, None);
}

#[tokio::test]
async fn test_dummy_recent_feeds_keeps_newest() {
    let controller = DummyChannelController::new().unwrap();
    let response = controller.recent_feeds(2).await.unwrap();

    let ids: Vec<u64> = response.feeds.iter().map(|feed| feed.entry_id).collect();
    assert_eq!(ids, vec![814, 816]);
}

#[tokio::test]
async fn test_dummy_field_series() {
    let controller = DummyChannelController::new().unwrap();
    let response = controller.field_series(2, 3).await.unwrap();

    assert_eq!(response.feeds.len(), 3);
    assert!(response.feeds.iter().all(|feed| feed.field1.is_none()));
    assert_eq!(response.feeds[2].field2.as_deref(), Some("26.2"));
}

#[tokio::test]
async fn test_dummy_submit() {
    let controller = DummyChannelController::new().unwrap();

    assert_eq!(controller.submit_field_value(3.3).await.unwrap(), 817);
}
