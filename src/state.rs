use std::sync::Arc;

use crate::repositories::{InMemoryProductRepository, ProductRepository};

#[derive(Clone)]
pub struct AppState {
    pub product_repository: Arc<dyn ProductRepository>,
}

impl AppState {
    pub fn new(product_repository: Arc<dyn ProductRepository>) -> Self {
        AppState { product_repository }
    }

    pub fn seeded() -> Self {
        AppState::new(Arc::new(InMemoryProductRepository::seeded()))
    }
}
