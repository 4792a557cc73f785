use serde::{Deserialize, Serialize};

use crate::domain::Product;

/// Partial update body. Absent fields are left out of the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductPatch {
    #[serde(rename = "ProductID", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(rename = "SupplierID", skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i32>,
    #[serde(rename = "CategoryID", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_per_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_in_stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_on_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discontinued: Option<bool>,
}

impl ProductPatch {
    /// Overwrites the fields of `product` that this patch carries. The
    /// identifier is never touched.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.product_name {
            product.product_name = name.clone();
        }
        if let Some(supplier_id) = self.supplier_id {
            product.supplier_id = supplier_id;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(quantity) = &self.quantity_per_unit {
            product.quantity_per_unit = quantity.clone();
        }
        if let Some(price) = self.unit_price {
            product.unit_price = price;
        }
        if let Some(in_stock) = self.units_in_stock {
            product.units_in_stock = in_stock;
        }
        if let Some(on_order) = self.units_on_order {
            product.units_on_order = on_order;
        }
        if let Some(reorder_level) = self.reorder_level {
            product.reorder_level = reorder_level;
        }
        if let Some(discontinued) = self.discontinued {
            product.discontinued = discontinued;
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
}
