use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::domain::cart::{Cart, ProductId};
use crate::domain::errors::DomainError;
use crate::domain::order::{Document, Order, OrderId, PaymentRedirect, ReturnRequest};
use crate::domain::ports::CommerceBackend;
use crate::errors::{classify, Endpoint};

use super::models::{
    AddItemBody, CartResponse, OrderResponse, PaymentRedirectResponse, ReturnBody,
    StartPaymentBody, UpdateItemBody,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DomainError::InvalidResponse(e.to_string())
        } else {
            DomainError::NetworkFailure(e.to_string())
        }
    }
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// [`CommerceBackend`] over the backend's JSON REST API.
#[derive(Debug, Clone)]
pub struct HttpCommerceBackend {
    http: Client,
    config: ClientConfig,
}

impl HttpCommerceBackend {
    pub fn new(config: ClientConfig) -> Result<Self, DomainError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::Internal(format!("http client: {e}")))?;
        Ok(Self { http, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{method} {path}");
        let builder = self
            .http
            .request(method, format!("{}{}", self.config.api_url, path));
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder, endpoint: Endpoint) -> Result<Response, DomainError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body, endpoint))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: Endpoint,
    ) -> Result<T, DomainError> {
        Ok(self.send(request, endpoint).await?.json::<T>().await?)
    }

    async fn cart(&self, request: RequestBuilder) -> Result<Cart, DomainError> {
        self.json::<CartResponse>(request, Endpoint::Cart)
            .await
            .map(Cart::from)
    }

    async fn order_from(&self, request: RequestBuilder, endpoint: Endpoint) -> Result<Order, DomainError> {
        self.json::<OrderResponse>(request, endpoint)
            .await?
            .try_into()
    }

    async fn document(&self, path: &str) -> Result<Document, DomainError> {
        let response = self
            .send(self.request(Method::GET, path), Endpoint::Read)
            .await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        Ok(Document {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[async_trait]
impl CommerceBackend for HttpCommerceBackend {
    async fn fetch_cart(&self) -> Result<Cart, DomainError> {
        self.cart(self.request(Method::GET, "/cart")).await
    }

    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart, DomainError> {
        let body = AddItemBody {
            product_id,
            quantity,
        };
        self.cart(self.request(Method::POST, "/cart/items").json(&body))
            .await
    }

    async fn update_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let path = format!("/cart/items/{product_id}");
        self.cart(
            self.request(Method::PATCH, &path)
                .json(&UpdateItemBody { quantity }),
        )
        .await
    }

    async fn remove_item(&self, product_id: ProductId) -> Result<Cart, DomainError> {
        let path = format!("/cart/items/{product_id}");
        self.cart(self.request(Method::DELETE, &path)).await
    }

    async fn clear_cart(&self) -> Result<Cart, DomainError> {
        self.cart(self.request(Method::DELETE, "/cart")).await
    }

    async fn checkout(&self) -> Result<Order, DomainError> {
        self.order_from(self.request(Method::POST, "/orders/checkout"), Endpoint::Checkout)
            .await
    }

    async fn my_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.json::<Vec<OrderResponse>>(self.request(Method::GET, "/orders/my-orders"), Endpoint::Read)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn order(&self, id: OrderId) -> Result<Order, DomainError> {
        let path = format!("/orders/{id}");
        self.order_from(self.request(Method::GET, &path), Endpoint::Read)
            .await
    }

    async fn cancel_order(&self, id: OrderId) -> Result<Order, DomainError> {
        let path = format!("/orders/{id}/cancel");
        self.order_from(self.request(Method::POST, &path), Endpoint::Transition)
            .await
    }

    async fn request_return(
        &self,
        id: OrderId,
        request: &ReturnRequest,
    ) -> Result<Order, DomainError> {
        let path = format!("/orders/{id}/return");
        self.order_from(
            self.request(Method::POST, &path)
                .json(&ReturnBody::from(request)),
            Endpoint::Transition,
        )
        .await
    }

    async fn start_payment(&self, id: OrderId) -> Result<PaymentRedirect, DomainError> {
        self.json::<PaymentRedirectResponse>(
            self.request(Method::POST, "/payments/stripe-checkout")
                .json(&StartPaymentBody { order_id: id }),
            Endpoint::Transition,
        )
        .await
        .map(PaymentRedirect::from)
    }

    /// The backend confirms a session once and answers repeats with the
    /// same order, so a conflict here is a refusal and not a duplicate.
    async fn confirm_payment(&self, session_id: &str) -> Result<Order, DomainError> {
        let request = self
            .request(Method::POST, "/payments/stripe-confirm")
            .query(&[("session_id", session_id)]);
        self.order_from(request, Endpoint::Transition).await
    }

    async fn invoice(&self, id: OrderId) -> Result<Document, DomainError> {
        self.document(&format!("/orders/{id}/invoice")).await
    }

    async fn return_label(&self, id: OrderId) -> Result<Document, DomainError> {
        self.document(&format!("/orders/{id}/return-label")).await
    }
}
