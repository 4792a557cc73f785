//! Setup and teardown around the Products API scenarios.
//!
//! Product 1 is assumed to exist before the suite runs; nothing here creates
//! it. Anything the suite does change is undone by a guard when it drops, so
//! cleanup also happens when an assertion panics.

use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::StatusCode;
use tracing::{event, Level};

use crate::{
    client::{ApiResponse, ProductsApi},
    config::SuiteConfig,
    domain::Product,
    dtos::ProductPatch,
    error::SuiteError,
    server::StubServer,
    state::AppState,
    telemetry,
};

pub const SEEDED_PRODUCT_ID: i32 = 1;
pub const UPDATED_NAME: &str = "Update_ProductName";
pub const PATCHED_NAME: &str = "Patch_ProductName";

static STUB: Mutex<Option<StubServer>> = Mutex::new(None);
// One snapshot at a time, so a restore never captures another test's edit.
static SNAPSHOT_LOCK: Mutex<()> = Mutex::new(());

pub struct SuiteContext {
    pub api: ProductsApi,
}

impl SuiteContext {
    pub fn connect() -> Result<SuiteContext, SuiteError> {
        telemetry::init_test_logging();
        let config = SuiteConfig::from_env()?;
        SuiteContext::with_config(&config)
    }

    /// Tries `config.base_url` once and falls back to the shared in-process
    /// stub when nothing answers there.
    pub fn with_config(config: &SuiteConfig) -> Result<SuiteContext, SuiteError> {
        let api = ProductsApi::from_config(config)?;

        match api.list_products() {
            Ok(_) => Ok(SuiteContext { api }),
            Err(SuiteError::Transport(e)) if config.stub_fallback => {
                event!(
                    Level::WARN,
                    "{} is unreachable ({}), using the in-process stub",
                    config.base_url,
                    e
                );
                let stub_url = shared_stub_url()?;
                Ok(SuiteContext {
                    api: ProductsApi::new(&stub_url, config.timeout)?,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn shared_stub_url() -> Result<String, SuiteError> {
    let mut stub = STUB.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(server) = stub.as_ref() {
        return Ok(server.base_url());
    }

    let server = StubServer::start("127.0.0.1:0", AppState::seeded())?;
    let url = server.base_url();
    *stub = Some(server);
    Ok(url)
}

/// The full body the create and update scenarios send.
pub fn sample_product() -> Product {
    Product {
        product_id: SEEDED_PRODUCT_ID,
        product_name: String::from(UPDATED_NAME),
        supplier_id: 1,
        category_id: 1,
        quantity_per_unit: String::from("10 boxes x 20 bags"),
        unit_price: 18.0,
        units_in_stock: 39,
        units_on_order: 0,
        reorder_level: 10,
        discontinued: false,
    }
}

pub fn name_patch() -> ProductPatch {
    ProductPatch {
        product_id: Some(SEEDED_PRODUCT_ID),
        product_name: Some(String::from(PATCHED_NAME)),
        supplier_id: Some(2),
        ..Default::default()
    }
}

/// POSTs [`sample_product`]. Shared by the create and delete scenarios.
pub fn add_product(api: &ProductsApi) -> Result<ApiResponse, SuiteError> {
    api.post_product(&sample_product())
}

pub fn require_product(api: &ProductsApi, id: i32) -> Result<Product, SuiteError> {
    let response = api.get_product(id)?;

    if response.status != StatusCode::OK {
        return Err(SuiteError::Prerequisite(format!(
            "product {} must already exist on the server, GET returned {}",
            id, response.status
        )));
    }

    response.json()
}

/// Puts a product back the way it was when captured. Snapshots are
/// exclusive process-wide: a second `capture` blocks until the first one has
/// been restored.
pub struct ProductSnapshot<'a> {
    api: &'a ProductsApi,
    original: Product,
    _exclusive: MutexGuard<'static, ()>,
}

impl<'a> ProductSnapshot<'a> {
    pub fn capture(api: &'a ProductsApi, id: i32) -> Result<ProductSnapshot<'a>, SuiteError> {
        let exclusive = SNAPSHOT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let original = require_product(api, id)?;

        Ok(ProductSnapshot {
            api,
            original,
            _exclusive: exclusive,
        })
    }

    pub fn original(&self) -> &Product {
        &self.original
    }
}

impl Drop for ProductSnapshot<'_> {
    fn drop(&mut self) {
        let id = self.original.product_id;

        match self.api.put_product(id, &self.original) {
            Ok(response) if response.status.is_success() => {
                event!(Level::DEBUG, "Restored product {}", id)
            }
            Ok(response) => event!(
                Level::WARN,
                "Restoring product {} returned {}",
                id,
                response.status
            ),
            Err(e) => event!(Level::WARN, "Failed to restore product {}: {}", id, e),
        }
    }
}

/// A product the suite created. It is deleted on drop unless [`delete`]
/// already removed it.
///
/// [`delete`]: CreatedProduct::delete
pub struct CreatedProduct<'a> {
    api: &'a ProductsApi,
    product: Product,
    deleted: bool,
}

impl<'a> CreatedProduct<'a> {
    /// Takes ownership of whatever a create call produced. Anything other
    /// than `201 Created` is a failed prerequisite.
    pub fn from_response(
        api: &'a ProductsApi,
        response: ApiResponse,
    ) -> Result<CreatedProduct<'a>, SuiteError> {
        if response.status != StatusCode::CREATED {
            return Err(SuiteError::Prerequisite(format!(
                "creating a product returned {}, expected {}",
                response.status,
                StatusCode::CREATED
            )));
        }

        let product = match response.json::<Product>() {
            Ok(product) => product,
            Err(e) => {
                discard_undecodable(api, &response.body);
                return Err(e);
            }
        };

        Ok(CreatedProduct {
            api,
            product,
            deleted: false,
        })
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn delete(mut self) -> Result<ApiResponse, SuiteError> {
        let response = self.api.delete_product(self.product.product_id);

        if let Ok(r) = &response {
            if r.status.is_success() {
                self.deleted = true;
            }
        }

        response
    }
}

impl Drop for CreatedProduct<'_> {
    fn drop(&mut self) {
        if self.deleted {
            return;
        }

        let id = self.product.product_id;
        match self.api.delete_product(id) {
            Ok(response) if response.status.is_success() => {
                event!(Level::DEBUG, "Cleaned up product {}", id)
            }
            Ok(response) => event!(
                Level::WARN,
                "Cleaning up product {} returned {}",
                id,
                response.status
            ),
            Err(e) => event!(Level::WARN, "Failed to clean up product {}: {}", id, e),
        }
    }
}

/// A 201 whose body is not a valid Product still created a row. Remove it if
/// the id can be read at all.
fn discard_undecodable(api: &ProductsApi, body: &str) {
    let id = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value["ProductID"].as_i64())
        .and_then(|id| i32::try_from(id).ok());

    match id {
        Some(id) => match api.delete_product(id) {
            Ok(response) if response.status.is_success() => {
                event!(Level::DEBUG, "Cleaned up undecodable product {}", id)
            }
            Ok(response) => event!(
                Level::WARN,
                "Cleaning up undecodable product {} returned {}",
                id,
                response.status
            ),
            Err(e) => event!(Level::WARN, "Failed to clean up product {}: {}", id, e),
        },
        None => event!(
            Level::WARN,
            "Created product has no readable ProductID and was left on the server: {}",
            body
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn isolated_stub() -> (StubServer, ProductsApi) {
        let server = StubServer::start("127.0.0.1:0", AppState::seeded()).unwrap();
        let api = ProductsApi::new(&server.base_url(), Duration::from_secs(5)).unwrap();
        (server, api)
    }

    fn unreachable_config(stub_fallback: bool) -> SuiteConfig {
        SuiteConfig {
            base_url: String::from("http://127.0.0.1:1"),
            timeout: Duration::from_secs(5),
            stub_fallback,
        }
    }

    #[test]
    fn falls_back_to_the_stub_when_unreachable() {
        let context = SuiteContext::with_config(&unreachable_config(true)).unwrap();

        assert_ne!(context.api.base_url(), "http://127.0.0.1:1");
        let response = context.api.list_products().unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn surfaces_transport_errors_without_fallback() {
        let result = SuiteContext::with_config(&unreachable_config(false));
        assert!(matches!(result, Err(SuiteError::Transport(_))));
    }

    #[test]
    fn missing_seed_is_a_prerequisite_failure() {
        let (_server, api) = isolated_stub();

        assert_eq!(require_product(&api, 1).unwrap().product_name, "Chai");
        assert!(matches!(
            require_product(&api, 500),
            Err(SuiteError::Prerequisite(_))
        ));
    }

    #[test]
    fn snapshot_restores_on_drop() {
        let (_server, api) = isolated_stub();

        {
            let snapshot = ProductSnapshot::capture(&api, SEEDED_PRODUCT_ID).unwrap();
            assert_eq!(snapshot.original().product_name, "Chai");

            let response = api.patch_product(SEEDED_PRODUCT_ID, &name_patch()).unwrap();
            assert_eq!(response.status, StatusCode::OK);
        }

        let restored = require_product(&api, SEEDED_PRODUCT_ID).unwrap();
        assert_eq!(restored.product_name, "Chai");
        assert_eq!(restored.supplier_id, 1);
    }

    #[test]
    fn created_product_is_removed_on_drop() {
        let (_server, api) = isolated_stub();

        let id = {
            let created = CreatedProduct::from_response(&api, add_product(&api).unwrap()).unwrap();
            assert_eq!(created.product().product_name, UPDATED_NAME);
            created.product().product_id
        };

        let response = api.get_product(id).unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn concurrent_snapshots_leave_the_seed_intact() {
        let (_server, api) = isolated_stub();

        std::thread::scope(|scope| {
            let patcher = scope.spawn(|| {
                let _restore = ProductSnapshot::capture(&api, SEEDED_PRODUCT_ID).unwrap();
                api.patch_product(SEEDED_PRODUCT_ID, &name_patch()).unwrap();
                std::thread::sleep(Duration::from_millis(50));
            });
            let updater = scope.spawn(|| {
                let _restore = ProductSnapshot::capture(&api, SEEDED_PRODUCT_ID).unwrap();
                api.put_product(SEEDED_PRODUCT_ID, &sample_product()).unwrap();
                std::thread::sleep(Duration::from_millis(50));
            });
            patcher.join().unwrap();
            updater.join().unwrap();
        });

        let seed = require_product(&api, SEEDED_PRODUCT_ID).unwrap();
        assert_eq!(seed.product_name, "Chai");
        assert_eq!(seed.supplier_id, 1);
    }

    #[test]
    fn undecodable_created_body_is_still_cleaned_up() {
        let (_server, api) = isolated_stub();

        let id = add_product(&api).unwrap().json::<Product>().unwrap().product_id;
        let mangled = ApiResponse {
            status: StatusCode::CREATED,
            body: format!(r#"{{"ProductID": {}, "ProductName": 5}}"#, id),
        };

        let result = CreatedProduct::from_response(&api, mangled);
        assert!(matches!(result, Err(SuiteError::Decode { .. })));

        let response = api.get_product(id).unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn non_created_response_is_a_prerequisite_failure() {
        let (_server, api) = isolated_stub();

        let rejected = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            body: String::from(r#"{"error":"ProductName is required"}"#),
        };
        let result = CreatedProduct::from_response(&api, rejected);
        assert!(matches!(result, Err(SuiteError::Prerequisite(_))));
    }
}
