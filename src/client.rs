use std::time::Duration;

use reqwest::{
    blocking::{Client, RequestBuilder},
    header::{CACHE_CONTROL, CONTENT_TYPE},
    Method, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{event, Level};
use uuid::Uuid;

use crate::{
    config::{SuiteConfig, BASE_URL_VAR},
    domain::Product,
    dtos::ProductPatch,
    error::SuiteError,
};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Status and raw body of one exchange with the Products API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SuiteError> {
        serde_json::from_str(&self.body).map_err(|source| SuiteError::Decode {
            body: self.body.clone(),
            source,
        })
    }

    pub fn require_status(&self, expected: StatusCode) -> Result<&ApiResponse, SuiteError> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(SuiteError::UnexpectedStatus {
                expected,
                actual: self.status,
                body: self.body.clone(),
            })
        }
    }
}

/// Blocking requests against `/api/products` on one base URL.
///
/// Reads go to the lowercase collection path and writes to `/api/Products`,
/// the same spellings the API's own clients use.
#[derive(Debug, Clone)]
pub struct ProductsApi {
    client: Client,
    base_url: String,
}

impl ProductsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<ProductsApi, SuiteError> {
        let base_url = base_url.trim_end_matches('/');
        let parsed = Url::parse(base_url).map_err(|e| SuiteError::Config {
            key: String::from(BASE_URL_VAR),
            message: e.to_string(),
        })?;

        let mut builder = Client::builder().timeout(timeout);
        // a system proxy must never see requests meant for this machine
        if matches!(parsed.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")) {
            builder = builder.no_proxy();
        }

        Ok(ProductsApi {
            client: builder.build()?,
            base_url: String::from(base_url),
        })
    }

    pub fn from_config(config: &SuiteConfig) -> Result<ProductsApi, SuiteError> {
        ProductsApi::new(&config.base_url, config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list_products(&self) -> Result<ApiResponse, SuiteError> {
        let url = format!("{}/api/products", self.base_url);
        self.execute(self.request(Method::GET, &url))
    }

    pub fn get_product(&self, id: i32) -> Result<ApiResponse, SuiteError> {
        let url = format!("{}/api/products/{}", self.base_url, id);
        self.execute(self.request(Method::GET, &url))
    }

    pub fn put_product(&self, id: i32, product: &Product) -> Result<ApiResponse, SuiteError> {
        let url = self.item_url(id);
        self.execute(self.with_body(Method::PUT, &url, product))
    }

    pub fn post_product(&self, product: &Product) -> Result<ApiResponse, SuiteError> {
        let url = format!("{}/api/Products", self.base_url);
        self.execute(self.with_body(Method::POST, &url, product))
    }

    pub fn delete_product(&self, id: i32) -> Result<ApiResponse, SuiteError> {
        let url = self.item_url(id);
        let request = self
            .request(Method::DELETE, &url)
            .header(CONTENT_TYPE, "application/json");
        self.execute(request)
    }

    pub fn patch_product(&self, id: i32, patch: &ProductPatch) -> Result<ApiResponse, SuiteError> {
        let url = self.item_url(id);
        self.execute(self.with_body(Method::PATCH, &url, patch))
    }

    fn item_url(&self, id: i32) -> String {
        format!("{}/api/Products/{}", self.base_url, id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let correlation_id = Uuid::new_v4().to_string();
        event!(Level::DEBUG, "{} {} [{}]", method, url, correlation_id);

        self.client
            .request(method, url)
            .header(CACHE_CONTROL, "no-cache")
            .header(CORRELATION_HEADER, correlation_id)
    }

    fn with_body<T: Serialize>(&self, method: Method, url: &str, body: &T) -> RequestBuilder {
        self.request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
    }

    fn execute(&self, request: RequestBuilder) -> Result<ApiResponse, SuiteError> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        event!(Level::DEBUG, "-> {} ({} bytes)", status, body.len());
        Ok(ApiResponse { status, body })
    }
}
