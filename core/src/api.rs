//! Typed catalog operations on top of `RequestClient`.
//!
//! Each method is one call through the client, so the auth header and the
//! 401 handling are the same for all of them. Where the client would yield
//! "no data" because the session expired, these methods return
//! `ApiError::SessionExpired` instead.

use serde::de::DeserializeOwned;
use tracing::info;

use crate::client::RequestClient;
use crate::context::RequestContext;
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::types::{
    Ack, Envelope, LoginData, LoginRequest, NewPost, Post, Tool, ToolPost, UpdateTool,
};

/// Typed tool, post and auth operations of the catalog backend.
///
/// `login` and `logout` also maintain the client's session token.
#[derive(Debug, Clone)]
pub struct CatalogApi {
    client: RequestClient,
}

impl CatalogApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    /// Authenticate and store the issued token in the session.
    pub fn login(&self, name: &str, password: &str) -> Result<LoginData, ApiError> {
        let ctx = RequestContext::post("/api/login").with_json(&LoginRequest {
            name: name.to_string(),
            password: password.to_string(),
        })?;
        let data: LoginData = self.enveloped(&ctx)?;
        self.client.session().set_token(data.token.clone())?;
        info!(user = %data.user.name, "logged in");
        Ok(data)
    }

    /// Notify the backend, then drop the local token. The token is dropped
    /// even when the call fails; the call's error takes precedence.
    pub fn logout(&self) -> Result<(), ApiError> {
        let result = self.client.send(&RequestContext::post("/api/logout"));
        let cleared = self.client.session().clear();
        result?;
        cleared
    }

    pub fn tool(&self, id: i64) -> Result<Tool, ApiError> {
        self.enveloped(&RequestContext::get(format!("/api/tools/{id}")))
    }

    pub fn update_tool(&self, id: i64, update: &UpdateTool) -> Result<(), ApiError> {
        let ctx = RequestContext::put(format!("/api/tools/{id}")).with_json(update)?;
        let envelope: Envelope<serde_json::Value> = self.client.send_json(&ctx)?;
        check_envelope(&envelope)
    }

    pub fn tool_post(&self, tool_id: i64) -> Result<ToolPost, ApiError> {
        self.client
            .send_json(&RequestContext::get(format!("/api/admin/tool/{tool_id}/post")))
    }

    pub fn update_tool_post(&self, tool_id: i64, post: &ToolPost) -> Result<(), ApiError> {
        let ctx = RequestContext::put(format!("/api/admin/tool/{tool_id}/post")).with_json(post)?;
        self.acknowledged::<Ack>(&ctx).map(|_| ())
    }

    /// Newest first.
    pub fn posts(&self) -> Result<Vec<Post>, ApiError> {
        self.client.send_json(&RequestContext::get("/api/admin/posts"))
    }

    pub fn add_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        let ctx = RequestContext::post("/api/admin/posts").with_json(post)?;
        self.client.send_json(&ctx)
    }

    pub fn update_post(&self, id: i64, post: &NewPost) -> Result<(), ApiError> {
        let ctx = RequestContext::put(format!("/api/admin/posts/{id}")).with_json(post)?;
        self.acknowledged::<Ack>(&ctx).map(|_| ())
    }

    pub fn delete_post(&self, id: i64) -> Result<(), ApiError> {
        self.acknowledged::<Ack>(&RequestContext::delete(format!("/api/admin/posts/{id}")))
            .map(|_| ())
    }

    /// Unwrap `{success, data}`; `success: false` becomes `Rejected`.
    fn enveloped<T: DeserializeOwned>(&self, ctx: &RequestContext) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.client.send_json(ctx)?;
        check_envelope(&envelope)?;
        envelope
            .data
            .ok_or_else(|| ApiError::Decode("envelope is missing `data`".to_string()))
    }

    /// Mutations whose reply body is informational. A non-JSON reply is
    /// accepted as the default acknowledgement.
    fn acknowledged<T: DeserializeOwned + Default>(
        &self,
        ctx: &RequestContext,
    ) -> Result<T, ApiError> {
        match self.client.send(ctx)? {
            None => Err(ApiError::SessionExpired),
            Some(body) => match body.as_json() {
                Some(value) => serde_json::from_value(value.clone())
                    .map_err(|e| ApiError::Decode(e.to_string())),
                None => Ok(T::default()),
            },
        }
    }
}

fn check_envelope<T>(envelope: &Envelope<T>) -> Result<(), ApiError> {
    if envelope.success {
        Ok(())
    } else {
        Err(ApiError::Rejected(
            envelope
                .error_message
                .clone()
                .unwrap_or_else(|| "request rejected".to_string()),
        ))
    }
}
