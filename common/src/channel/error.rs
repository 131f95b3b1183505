// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::result;
use thiserror::Error;

/// Result type for operations that could result in a [ChannelError]
pub type Result<T, E = ChannelError> = result::Result<T, E>;

/// Everything that can go wrong while talking to a channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[cfg(feature = "thingspeak")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("update answered with a non-numeric entry id: {0:?}")]
    InvalidEntryId(String),
    #[error("no write API key configured")]
    MissingWriteKey,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
