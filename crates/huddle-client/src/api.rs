//! REST client for the chat backend.
//!
//! [`ChatApi`] is the seam the chat interface and the meeting scheduler talk
//! through; [`HttpApi`] is the reqwest-backed implementation used by the
//! terminal client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use huddle_shared::constants::{AVAILABILITY_PATH, GROUP_PATH, MESSAGES_PATH, SCHEDULE_PATH};
use huddle_shared::protocol::{
    AvailabilityRequest, ErrorResponse, ScheduleRequest, SendMessageRequest, SendMessageResponse,
    StatusResponse,
};
use huddle_shared::{Group, MeetingId, Message, SendMessageResult};

use crate::error::{ClientError, Result};

/// Operations the chat backend offers.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chat/group/`
    async fn fetch_group(&self) -> Result<Group>;

    /// `GET /chat/messages/`
    async fn fetch_messages(&self) -> Result<Vec<Message>>;

    /// `POST /chat/messages/`
    async fn send_message(&self, content: &str) -> Result<SendMessageResult>;

    /// `POST /chat/schedule/`
    async fn schedule_meeting(&self, request: &ScheduleRequest) -> Result<()>;

    /// `POST /chat/availability/`
    async fn update_availability(&self, meeting_id: MeetingId, is_available: bool) -> Result<()>;
}

/// [`ChatApi`] over HTTP with bearer-token authentication.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let resp = self.authorize(self.client.get(self.url(path))).send().await?;
        decode(resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let resp = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn fetch_group(&self) -> Result<Group> {
        self.get_json(GROUP_PATH).await
    }

    async fn fetch_messages(&self) -> Result<Vec<Message>> {
        self.get_json(MESSAGES_PATH).await
    }

    async fn send_message(&self, content: &str) -> Result<SendMessageResult> {
        let body = SendMessageRequest {
            content: content.to_string(),
        };
        let resp: SendMessageResponse = self.post_json(MESSAGES_PATH, &body).await?;
        Ok(resp.into())
    }

    async fn schedule_meeting(&self, request: &ScheduleRequest) -> Result<()> {
        let status: StatusResponse = self.post_json(SCHEDULE_PATH, request).await?;
        debug!(meeting = %request.meeting_id, status = %status.status, "Schedule acknowledged");
        Ok(())
    }

    async fn update_availability(&self, meeting_id: MeetingId, is_available: bool) -> Result<()> {
        let body = AvailabilityRequest {
            meeting_id,
            is_available,
        };
        let status: StatusResponse = self.post_json(AVAILABILITY_PATH, &body).await?;
        debug!(meeting = %meeting_id, status = %status.status, "Availability acknowledged");
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Server {
            status: status.as_u16(),
            message: parse_error_message(&body),
        });
    }
    Ok(resp.json::<T>().await?)
}

/// Pull the `error` field out of a JSON error body, falling back to the raw
/// body text.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error)
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| body.to_string())
}
