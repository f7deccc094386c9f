//! REST client for the credential service and the booking API
//!
//! Every request carries `Authorization: Bearer <token>` when the attached
//! [`TokenSource`] holds a session. Non-2xx answers become
//! [`ClientError::Api`] with the server's `error` message. No retries.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    models::{
        AvailabilityCheck, Booking, LoginForm, LoginResponse, NewBooking, NewVilla, PaymentOrder,
        PaymentVerification, ProfileResponse, SignupForm, SignupResponse, VerifiedPayment, Villa,
        VillaAvailability,
    },
    session::TokenSource,
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone, Copy)]
enum Service {
    Auth,
    Api,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ApiClient {
    /// Client that sends no credentials
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            tokens: None,
        }
    }

    /// Attach the source of the bearer token, usually a session context
    pub fn with_tokens(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, service: Service, path: &str) -> RequestBuilder {
        let base = match service {
            Service::Auth => &self.config.auth_url,
            Service::Api => &self.config.api_url,
        };
        let builder = self.http.request(method, format!("{base}{path}"));

        match self.tokens.as_ref().and_then(|tokens| tokens.bearer_token()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> ClientResult<T> {
        self.send(request.json(body)).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        debug!("Request rejected with {}: {}", status, message);

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn signup(&self, form: &SignupForm) -> ClientResult<SignupResponse> {
        self.send_json(self.request(Method::POST, Service::Auth, "/users/signup"), form)
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        self.send_json(
            self.request(Method::POST, Service::Auth, "/users/login"),
            &LoginForm { email, password },
        )
        .await
    }

    /// Profile of the current session
    pub async fn profile(&self) -> ClientResult<ProfileResponse> {
        let token = self
            .tokens
            .as_ref()
            .and_then(|tokens| tokens.bearer_token())
            .ok_or(ClientError::NotAuthenticated)?;
        self.profile_with(&token).await
    }

    /// Profile bound to an explicit token, used right after login
    pub async fn profile_with(&self, token: &str) -> ClientResult<ProfileResponse> {
        let request = self
            .http
            .get(format!("{}/profile", self.config.auth_url))
            .bearer_auth(token);
        self.send(request).await
    }

    /// Villas matching `search`, or the whole catalogue
    pub async fn villas(&self, search: Option<&str>) -> ClientResult<Vec<Villa>> {
        let mut request = self.request(Method::GET, Service::Api, "/villas");
        if let Some(q) = search {
            request = request.query(&[("q", q)]);
        }
        self.send(request).await
    }

    pub async fn villa(&self, id: Uuid) -> ClientResult<Villa> {
        self.send(self.request(Method::GET, Service::Api, &format!("/villas/{id}")))
            .await
    }

    /// Add a listing (admin session)
    pub async fn create_villa(&self, villa: &NewVilla) -> ClientResult<Villa> {
        self.send_json(self.request(Method::POST, Service::Api, "/villas"), villa)
            .await
    }

    /// Intervals currently held on a villa
    pub async fn villa_availability(&self, id: Uuid) -> ClientResult<VillaAvailability> {
        self.send(self.request(
            Method::GET,
            Service::Api,
            &format!("/villas/{id}/availability"),
        ))
        .await
    }

    pub async fn check_availability(&self, stay: &NewBooking) -> ClientResult<AvailabilityCheck> {
        self.send_json(
            self.request(Method::POST, Service::Api, "/bookings/check-availability"),
            stay,
        )
        .await
    }

    pub async fn create_booking(&self, stay: &NewBooking) -> ClientResult<Booking> {
        self.send_json(self.request(Method::POST, Service::Api, "/bookings"), stay)
            .await
    }

    pub async fn my_bookings(&self) -> ClientResult<Vec<Booking>> {
        self.send(self.request(Method::GET, Service::Api, "/bookings/mine"))
            .await
    }

    pub async fn cancel_booking(&self, id: Uuid) -> ClientResult<Booking> {
        self.send(self.request(
            Method::PATCH,
            Service::Api,
            &format!("/bookings/{id}/cancel"),
        ))
        .await
    }

    pub async fn create_payment_order(&self, booking_id: Uuid) -> ClientResult<PaymentOrder> {
        self.send(self.request(
            Method::POST,
            Service::Api,
            &format!("/payments/orders/{booking_id}"),
        ))
        .await
    }

    pub async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> ClientResult<VerifiedPayment> {
        self.send_json(
            self.request(Method::POST, Service::Api, "/payments/verify"),
            verification,
        )
        .await
    }
}
