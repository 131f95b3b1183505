// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use reqwest::{Client, Request};

use crate::channel::channelcontroller::{ChannelController, ChannelResponse};
use crate::channel::{ChannelConfig, ChannelError, Result};

/// Talks to the ThingSpeak REST API.
///
/// There is no retry and no timeout; a failed request is reported as is.
pub struct ThingSpeakController {
    config: ChannelConfig,
    client: Client,
}

impl ThingSpeakController {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn read_query(&self, count: u32) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(2);
        if let Some(key) = &self.config.read_api_key {
            query.push(("api_key", key.clone()));
        }
        query.push(("results", count.to_string()));
        query
    }

    fn feeds_request(&self, count: u32) -> Result<Request> {
        let url = format!("{}/feeds.json", self.config.channel_url());

        Ok(self.client.get(url).query(&self.read_query(count)).build()?)
    }

    fn field_request(&self, field: u8, count: u32) -> Result<Request> {
        let url = format!("{}/fields/{field}.json", self.config.channel_url());

        Ok(self.client.get(url).query(&self.read_query(count)).build()?)
    }

    fn update_request(&self, value: f64) -> Result<Request> {
        let key = self
            .config
            .write_api_key
            .as_ref()
            .ok_or(ChannelError::MissingWriteKey)?;

        Ok(self
            .client
            .get(self.config.update_url())
            .query(&[("api_key", key.clone()), ("field1", value.to_string())])
            .build()?)
    }

    /// Sends `request` and returns the body of a successful response.
    async fn send(&self, request: Request) -> Result<String> {
        // The query carries the api key, so only the path goes to the log.
        log::debug!("-> GET {}", request.url().path());
        let response = self.client.execute(request).await?;

        let status = response.status();
        log::debug!("<- {status}");
        if !status.is_success() {
            return Err(ChannelError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn fetch_response(&self, request: Request) -> Result<ChannelResponse> {
        let body = self.send(request).await?;

        Ok(serde_json::from_str(&body)?)
    }
}

fn parse_entry_id(body: &str) -> Result<u64> {
    body.trim()
        .parse()
        .map_err(|_| ChannelError::InvalidEntryId(body.into()))
}

#[async_trait]
impl ChannelController for ThingSpeakController {
    async fn recent_feeds(&self, count: u32) -> Result<ChannelResponse> {
        let request = self.feeds_request(count)?;
        self.fetch_response(request).await
    }

    async fn field_series(&self, field: u8, count: u32) -> Result<ChannelResponse> {
        let request = self.field_request(field, count)?;
        self.fetch_response(request).await
    }

    async fn submit_field_value(&self, value: f64) -> Result<u64> {
        let request = self.update_request(value)?;
        let body = self.send(request).await?;

        // ThingSpeak answers 0 if it rejected the write; the id is passed on unchanged.
        parse_entry_id(&body)
    }
}

#[cfg(test)]
fn test_controller() -> ThingSpeakController {
    ThingSpeakController::new(ChannelConfig {
        host: "https://api.thingspeak.com".into(),
        channel_id: 2716801,
        read_api_key: Some("READKEY".into()),
        write_api_key: Some("WRITEKEY".into()),
    })
}

#[cfg(test)]
fn query_of(request: &Request) -> Vec<(String, String)> {
    request
        .url()
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[test]
fn test_feeds_request() {
    let request = test_controller().feeds_request(30).unwrap();

    assert_eq!(request.method(), &reqwest::Method::GET);
    assert_eq!(request.url().path(), "/channels/2716801/feeds.json");
    assert_eq!(
        query_of(&request),
        vec![
            ("api_key".to_string(), "READKEY".to_string()),
            ("results".to_string(), "30".to_string()),
        ]
    );
}

#[test]
fn test_field_request() {
    let request = test_controller().field_request(2, 10).unwrap();

    assert_eq!(request.url().path(), "/channels/2716801/fields/2.json");
    assert_eq!(query_of(&request)[1], ("results".to_string(), "10".to_string()));
}

#[test]
fn test_public_channel_omits_api_key() {
    let controller = ThingSpeakController::new(ChannelConfig::new(2716801));
    let request = controller.feeds_request(5).unwrap();

    assert_eq!(query_of(&request), vec![("results".to_string(), "5".to_string())]);
}

#[test]
fn test_update_request() {
    let request = test_controller().update_request(3.7).unwrap();

    assert_eq!(request.url().as_str(), "https://api.thingspeak.com/update?api_key=WRITEKEY&field1=3.7");
}

#[tokio::test]
async fn test_submit_without_write_key() {
    let controller = ThingSpeakController::new(ChannelConfig::new(2716801));

    let result = controller.submit_field_value(3.7).await;
    assert!(matches!(result, Err(ChannelError::MissingWriteKey)));
}

#[test]
fn test_parse_entry_id() {
    assert_eq!(parse_entry_id("817").unwrap(), 817);
    assert_eq!(parse_entry_id("0\n").unwrap(), 0);
    assert!(matches!(
        parse_entry_id("<html>"),
        Err(ChannelError::InvalidEntryId(_))
    ));
}

/// Answers the first connection on a local port with `status` and `body`,
/// and returns a controller pointed at that port.
#[cfg(test)]
async fn local_controller(status: &'static str, body: &'static str) -> ThingSpeakController {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        // Read up to the end of the request head; GET requests carry no body.
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let bytes_read = stream.read(&mut buf).await.unwrap();
            if bytes_read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..bytes_read]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    ThingSpeakController {
        config: ChannelConfig {
            host: format!("http://{address}"),
            channel_id: 2716801,
            read_api_key: Some("READKEY".into()),
            write_api_key: Some("WRITEKEY".into()),
        },
        client: Client::builder().no_proxy().build().unwrap(),
    }
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let controller = local_controller("500 Internal Server Error", "error").await;

    let result = controller.recent_feeds(30).await;
    assert!(matches!(result, Err(ChannelError::Status(500))));
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let controller = local_controller("200 OK", "<html>not json</html>").await;

    let result = controller.field_series(1, 30).await;
    assert!(matches!(result, Err(ChannelError::Json(_))));
}

#[tokio::test]
async fn test_recent_feeds_over_http() {
    let controller = local_controller(
        "200 OK",
        r#"{"channel":{"id":2716801,"name":"Energy"},"feeds":[{"created_at":"2024-11-20T14:03:11Z","entry_id":811,"field1":"3.71"}]}"#,
    )
    .await;

    let response = controller.recent_feeds(30).await.unwrap();
    assert_eq!(response.channel.id, 2716801);
    assert_eq!(response.feeds.len(), 1);
    assert_eq!(response.feeds[0].field1.as_deref(), Some("3.71"));
}

#[tokio::test]
async fn test_submit_over_http() {
    let controller = local_controller("200 OK", "817").await;

    assert_eq!(controller.submit_field_value(3.7).await.unwrap(), 817);
}
