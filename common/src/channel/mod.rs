// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod channelcontroller;
mod config;
mod dummychannelcontroller;
mod error;

pub use channelcontroller::{
    Channel, ChannelController, ChannelControllerSharedPointer, ChannelResponse, Feed,
};
pub use config::ChannelConfig;
pub use dummychannelcontroller::DummyChannelController;
pub use error::{ChannelError, Result};

#[cfg(feature = "thingspeak")]
mod thingspeakcontroller;

#[cfg(feature = "thingspeak")]
pub use thingspeakcontroller::ThingSpeakController;
