use std::sync::Arc;

use log::*;
use pod_common::Money;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::RazorpayConfig,
    data_objects::{GatewayOrder, NewGatewayOrder, Notes},
    helpers::amount_in_minor_units,
    RazorpayApiError,
};

#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        if self.config.key_id.is_empty() || self.config.key_secret.is_missing() {
            return Err(RazorpayApiError::MissingCredentials);
        }
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
            Err(RazorpayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Opens a gateway order for the storefront order `order_id`. The buyer's checkout pays against it.
    ///
    /// The storefront order id is sent as the receipt and in the notes, so that webhooks can be traced back to it.
    pub async fn create_order(
        &self,
        order_id: &str,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayOrder, RazorpayApiError> {
        let body = NewGatewayOrder {
            amount: amount_in_minor_units(amount)?,
            currency: currency.to_string(),
            receipt: order_id.to_string(),
            notes: Notes::for_order(order_id),
        };
        debug!("Creating gateway order for {order_id}: {amount} {currency}");
        let order = self.rest_query::<GatewayOrder, _>(Method::POST, "/orders", Some(body)).await?;
        info!("Gateway order {} created for {order_id}", order.id);
        Ok(order)
    }

    pub async fn fetch_order(&self, gateway_order_id: &str) -> Result<GatewayOrder, RazorpayApiError> {
        let path = format!("/orders/{gateway_order_id}");
        debug!("Fetching gateway order {gateway_order_id}");
        self.rest_query::<GatewayOrder, ()>(Method::GET, &path, None).await
    }
}
