use serde::{Deserialize, Serialize};

/// A catalog item as the Products API sends it over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Product {
    #[serde(rename = "ProductID")]
    pub product_id: i32,
    pub product_name: String,
    #[serde(rename = "SupplierID")]
    pub supplier_id: i32,
    #[serde(rename = "CategoryID")]
    pub category_id: i32,
    pub quantity_per_unit: String,
    pub unit_price: f64,
    pub units_in_stock: i32,
    pub units_on_order: i32,
    pub reorder_level: i32,
    pub discontinued: bool,
}

impl Product {
    pub const MAX_NAME_LENGTH: usize = 40;

    pub fn validate(&self) -> Result<(), String> {
        if self.product_name.trim().is_empty() {
            return Err(String::from("ProductName is required"));
        }

        if self.product_name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(format!(
                "ProductName must be at most {} characters",
                Self::MAX_NAME_LENGTH
            ));
        }

        Ok(())
    }
}
