// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Notification sinks - where alerts finally go

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::config::{ContactMethod, DispatchConfig, ManagerContact};
use crate::detection::Frame;

/// Outbound notification transport
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver `message` (and optionally the frame) to `contact`
    async fn send(&self, contact: &ManagerContact, message: &str, image: Option<&Frame>) -> Result<()>;
}

/// Writes notifications to the application log
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, contact: &ManagerContact, message: &str, image: Option<&Frame>) -> Result<()> {
        info!(
            "Notify {}: {} (frame {})",
            contact.name,
            message,
            image.map(|f| f.sequence.to_string()).unwrap_or_else(|| "-".to_string())
        );
        Ok(())
    }
}

/// LINE Notify push messages
pub struct LineNotifySink {
    client: reqwest::Client,
    api_url: String,
}

impl LineNotifySink {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl NotificationSink for LineNotifySink {
    fn name(&self) -> &str {
        "line"
    }

    async fn send(&self, contact: &ManagerContact, message: &str, image: Option<&Frame>) -> Result<()> {
        if contact.token.is_empty() {
            bail!("no LINE token configured for {}", contact.name);
        }

        let mut form = Form::new().text("message", message.to_string());

        // Only encoded frames can be attached; raw buffers are skipped
        match image.and_then(|f| f.attachment().map(|a| (f, a))) {
            Some((frame, (mime, file_name))) => {
                let part = Part::bytes(frame.data.to_vec())
                    .file_name(file_name)
                    .mime_str(mime)?;
                form = form.part("imageFile", part);
            }
            None if image.is_some() => debug!("Frame is not encoded, sending text only"),
            None => {}
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&contact.token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("LINE Notify returned {} for {}: {}", status, contact.name, body);
        }

        Ok(())
    }
}

/// Routes each notification to the sink registered for the contact's method
#[derive(Default)]
pub struct ContactRouter {
    routes: HashMap<ContactMethod, Arc<dyn NotificationSink>>,
}

impl ContactRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, method: ContactMethod, sink: Arc<dyn NotificationSink>) -> Self {
        self.routes.insert(method, sink);
        self
    }

    /// LINE and log routes built from dispatch settings
    pub fn from_config(config: &DispatchConfig) -> Result<Self> {
        let line = LineNotifySink::new(&config.line_api_url, config.send_timeout())?;
        Ok(Self::new()
            .with_route(ContactMethod::Line, Arc::new(line))
            .with_route(ContactMethod::Log, Arc::new(LogSink)))
    }
}

#[async_trait]
impl NotificationSink for ContactRouter {
    fn name(&self) -> &str {
        "router"
    }

    async fn send(&self, contact: &ManagerContact, message: &str, image: Option<&Frame>) -> Result<()> {
        let sink = self
            .routes
            .get(&contact.contact_method)
            .ok_or_else(|| anyhow!("no sink registered for {:?}", contact.contact_method))?;
        sink.send(contact, message, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn send(&self, contact: &ManagerContact, message: &str, _image: Option<&Frame>) -> Result<()> {
            self.sent.lock().push(format!("{}: {}", contact.name, message));
            Ok(())
        }
    }

    fn contact(method: ContactMethod, token: &str) -> ManagerContact {
        ManagerContact {
            name: "Dock".to_string(),
            contact_method: method,
            token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_router_dispatches_by_method() {
        let recorder = Arc::new(Recorder::default());
        let router = ContactRouter::new().with_route(ContactMethod::Log, recorder.clone());

        router.send(&contact(ContactMethod::Log, ""), "hello", None).await.unwrap();
        assert_eq!(*recorder.sent.lock(), vec!["Dock: hello".to_string()]);

        let missing = router.send(&contact(ContactMethod::Line, "t"), "hello", None).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_line_requires_token() {
        let sink = LineNotifySink::new("http://127.0.0.1:9/notify", Duration::from_millis(200)).unwrap();
        let err = sink.send(&contact(ContactMethod::Line, ""), "hi", None).await.unwrap_err();
        assert!(err.to_string().contains("no LINE token"));
    }

    #[tokio::test]
    async fn test_log_sink_always_succeeds() {
        let frame = Frame::blank(3, 10, 10);
        assert!(LogSink.send(&contact(ContactMethod::Log, ""), "hi", Some(&frame)).await.is_ok());
    }
}
