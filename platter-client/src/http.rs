//! HTTP client for the Platter order API

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::ApiResponse;
use shared::models::{
    BulkStatusRequest, CancelOrderRequest, CreateOrderRequest, Order, OrderStats, OrderStatus,
    PaymentStatus, UpdatePaymentRequest, UpdateStatusRequest,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// `GET /health` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store: String,
}

/// Listing options for [`HttpClient::list_orders`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Empty means any status
    pub statuses: Vec<OrderStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListOptions {
    pub fn statuses(statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            ..Default::default()
        }
    }
}

/// HTTP client for making requests to the Platter server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Map the envelope: error statuses to [`ClientError`], success to its `data`
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.message.or(envelope.error))
                .unwrap_or(text);
            return Err(match status {
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                StatusCode::BAD_REQUEST => ClientError::Validation(message),
                StatusCode::CONFLICT => ClientError::Conflict(message),
                other => ClientError::Api {
                    status: other.as_u16(),
                    message,
                },
            });
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&text)?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .or(envelope.error)
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("Missing data".to_string()))
    }

    // ========== Orders API ==========

    /// List a portal's orders, newest first
    pub async fn list_orders(&self, portal_id: &str, options: &ListOptions) -> ClientResult<Vec<Order>> {
        let mut query: Vec<(&str, String)> = vec![("portalId", portal_id.to_string())];
        if !options.statuses.is_empty() {
            let statuses: Vec<_> = options.statuses.iter().map(|s| s.as_str()).collect();
            query.push(("status", statuses.join(",")));
        }
        if let Some(limit) = options.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = options.offset {
            query.push(("offset", offset.to_string()));
        }
        Self::send(self.request(Method::GET, "/api/orders").query(&query)).await
    }

    pub async fn get_order(&self, id: &str) -> ClientResult<Order> {
        Self::send(self.request(Method::GET, &format!("/api/orders/{id}"))).await
    }

    pub async fn create_order(&self, request: &CreateOrderRequest) -> ClientResult<Order> {
        Self::send(self.request(Method::POST, "/api/orders").json(request)).await
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> ClientResult<Order> {
        let body = UpdateStatusRequest {
            status: status.to_string(),
        };
        Self::send(
            self.request(Method::PATCH, &format!("/api/orders/{id}/status"))
                .json(&body),
        )
        .await
    }

    pub async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> ClientResult<Order> {
        let body = UpdatePaymentRequest {
            payment_status: payment_status.to_string(),
        };
        Self::send(
            self.request(Method::PATCH, &format!("/api/orders/{id}/payment"))
                .json(&body),
        )
        .await
    }

    pub async fn cancel_order(&self, id: &str, reason: Option<&str>) -> ClientResult<Order> {
        let body = CancelOrderRequest {
            reason: reason.map(str::to_string),
        };
        Self::send(
            self.request(Method::POST, &format!("/api/orders/{id}/cancel"))
                .json(&body),
        )
        .await
    }

    pub async fn bulk_update_status(
        &self,
        ids: Vec<String>,
        status: OrderStatus,
    ) -> ClientResult<Vec<Order>> {
        let body = BulkStatusRequest {
            ids,
            status: status.to_string(),
        };
        Self::send(self.request(Method::PATCH, "/api/orders/bulk/status").json(&body)).await
    }

    /// Statistics; dates are RFC 3339 or `YYYY-MM-DD`
    pub async fn order_stats(
        &self,
        portal_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ClientResult<OrderStats> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct StatsQuery<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            start_date: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            end_date: Option<&'a str>,
        }

        Self::send(
            self.request(Method::GET, &format!("/api/orders/stats/{portal_id}"))
                .query(&StatsQuery {
                    start_date,
                    end_date,
                }),
        )
        .await
    }

    /// Health probe (not wrapped in the envelope)
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let response = self.request(Method::GET, "/health").send().await?;
        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|_| ClientError::Api {
            status: status.as_u16(),
            message: text,
        })
    }
}
