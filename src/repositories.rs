use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{event, Level};

use crate::{domain::Product, dtos::ProductPatch, error::RepositoryError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Stores a new product under a freshly assigned id and returns it.
    async fn create(&self, product: Product) -> Result<Product, RepositoryError>;
    async fn read(&self, id: i32) -> Result<Product, RepositoryError>;
    async fn read_all(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn update(&self, id: i32, product: Product) -> Result<Product, RepositoryError>;
    async fn patch(&self, id: i32, patch: ProductPatch) -> Result<Product, RepositoryError>;
    async fn delete(&self, id: i32) -> Result<Product, RepositoryError>;
}

struct ProductTable {
    products: BTreeMap<i32, Product>,
    next_id: i32,
}

#[derive(Clone)]
pub struct InMemoryProductRepository {
    table: Arc<Mutex<ProductTable>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        InMemoryProductRepository::with_products(Vec::new())
    }

    /// Starts out holding the first three Northwind products.
    pub fn seeded() -> Self {
        InMemoryProductRepository::with_products(vec![
            northwind_product(1, "Chai", 1, "10 boxes x 20 bags", 18.0, 39, 0, 10),
            northwind_product(2, "Chang", 1, "24 - 12 oz bottles", 19.0, 17, 40, 25),
            northwind_product(3, "Aniseed Syrup", 2, "12 - 550 ml bottles", 10.0, 13, 70, 25),
        ])
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let products: BTreeMap<i32, Product> = products
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect();
        let next_id = products.keys().next_back().map_or(1, |id| id + 1);

        InMemoryProductRepository {
            table: Arc::new(Mutex::new(ProductTable { products, next_id })),
        }
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        InMemoryProductRepository::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, mut product: Product) -> Result<Product, RepositoryError> {
        product.validate().map_err(RepositoryError::Invalid)?;

        let mut lock = self.table.lock().await;
        product.product_id = lock.next_id;
        lock.next_id += 1;
        lock.products.insert(product.product_id, product.clone());

        event!(Level::DEBUG, "Created product {}", product.product_id);
        Ok(product)
    }

    async fn read(&self, id: i32) -> Result<Product, RepositoryError> {
        let lock = self.table.lock().await;
        lock.products
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn read_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let lock = self.table.lock().await;
        Ok(lock.products.values().cloned().collect())
    }

    async fn update(&self, id: i32, product: Product) -> Result<Product, RepositoryError> {
        if product.product_id != id {
            return Err(RepositoryError::Invalid(format!(
                "ProductID {} does not match id {}",
                product.product_id, id
            )));
        }
        product.validate().map_err(RepositoryError::Invalid)?;

        let mut lock = self.table.lock().await;
        match lock.products.get_mut(&id) {
            Some(existing) => {
                *existing = product;
                Ok(existing.clone())
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn patch(&self, id: i32, patch: ProductPatch) -> Result<Product, RepositoryError> {
        if let Some(patch_id) = patch.product_id {
            if patch_id != id {
                return Err(RepositoryError::Invalid(format!(
                    "ProductID {} does not match id {}",
                    patch_id, id
                )));
            }
        }

        let mut lock = self.table.lock().await;
        let existing = lock
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;

        let mut patched = existing.clone();
        patch.apply_to(&mut patched);
        patched.validate().map_err(RepositoryError::Invalid)?;

        *existing = patched.clone();
        Ok(patched)
    }

    async fn delete(&self, id: i32) -> Result<Product, RepositoryError> {
        let mut lock = self.table.lock().await;
        let removed = lock.products.remove(&id).ok_or(RepositoryError::NotFound(id))?;

        event!(Level::DEBUG, "Deleted product {}", id);
        Ok(removed)
    }
}

#[allow(clippy::too_many_arguments)]
fn northwind_product(
    id: i32,
    name: &str,
    category_id: i32,
    quantity_per_unit: &str,
    unit_price: f64,
    units_in_stock: i32,
    units_on_order: i32,
    reorder_level: i32,
) -> Product {
    Product {
        product_id: id,
        product_name: String::from(name),
        supplier_id: 1,
        category_id,
        quantity_per_unit: String::from(quantity_per_unit),
        unit_price,
        units_in_stock,
        units_on_order,
        reorder_level,
        discontinued: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Product {
        Product {
            product_name: String::from(name),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn seeded_repository_lists_in_id_order() {
        let repository = InMemoryProductRepository::seeded();

        let products = repository.read_all().await.unwrap();
        let ids: Vec<i32> = products.iter().map(|p| p.product_id).collect();

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(products[0].product_name, "Chai");
    }

    #[tokio::test]
    async fn create_ignores_the_supplied_id() {
        let repository = InMemoryProductRepository::seeded();

        let created = repository
            .create(Product {
                product_id: 1,
                ..named("Update_ProductName")
            })
            .await
            .unwrap();

        assert_eq!(created.product_id, 4);
        assert_eq!(repository.read(1).await.unwrap().product_name, "Chai");
        assert_eq!(repository.read(4).await.unwrap(), created);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repository = InMemoryProductRepository::new();

        let first = repository.create(named("first")).await.unwrap();
        repository.delete(first.product_id).await.unwrap();
        let second = repository.create(named("second")).await.unwrap();

        assert_eq!(first.product_id, 1);
        assert_eq!(second.product_id, 2);
    }

    #[tokio::test]
    async fn update_requires_matching_id_and_existing_row() {
        let repository = InMemoryProductRepository::seeded();

        let mismatch = repository
            .update(
                2,
                Product {
                    product_id: 1,
                    ..named("x")
                },
            )
            .await;
        assert!(matches!(mismatch, Err(RepositoryError::Invalid(_))));

        let missing = repository
            .update(
                42,
                Product {
                    product_id: 42,
                    ..named("x")
                },
            )
            .await;
        assert_eq!(missing, Err(RepositoryError::NotFound(42)));
    }

    #[tokio::test]
    async fn patch_merges_and_validates() {
        let repository = InMemoryProductRepository::seeded();

        let patched = repository
            .patch(
                1,
                ProductPatch {
                    product_name: Some(String::from("Patch_ProductName")),
                    supplier_id: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.product_name, "Patch_ProductName");
        assert_eq!(patched.supplier_id, 2);
        assert_eq!(patched.units_in_stock, 39);

        let blank = repository
            .patch(
                1,
                ProductPatch {
                    product_name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(blank, Err(RepositoryError::Invalid(_))));
        assert_eq!(
            repository.read(1).await.unwrap().product_name,
            "Patch_ProductName"
        );
    }

    #[tokio::test]
    async fn delete_missing_product_is_not_found() {
        let repository = InMemoryProductRepository::new();
        assert_eq!(
            repository.delete(9).await,
            Err(RepositoryError::NotFound(9))
        );
    }
}
