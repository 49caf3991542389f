//! Inventory catalogue, stock movements and alerts.
//!
//! These calls mirror the `/api/inventory` routes. Scalar parameters travel
//! as query pairs; only bulk receiving sends a JSON body.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ChatClient, require_id};
use crate::errors::ChatError;
use crate::model::timestamp;

const INVENTORY: [&str; 2] = ["api", "inventory"];
/// Largest page the product listing accepts.
pub const MAX_PRODUCT_PAGE: u32 = 100;
const DEFAULT_REORDER_POINT: i64 = 10;

/// Maps each variant to its wire spelling, in both directions.
macro_rules! wire_names {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ChatError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ChatError::Validation(format!(
                        "unknown {} {other:?}",
                        stringify!($ty)
                    ))),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Footwear,
    Apparel,
    Equipment,
    Accessories,
    Camping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    Discontinued,
}

/// Why a stock level changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Received,
    Sold,
    Returned,
    #[default]
    Adjustment,
    Transfer,
    Damaged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

wire_names!(ProductCategory {
    Footwear => "footwear",
    Apparel => "apparel",
    Equipment => "equipment",
    Accessories => "accessories",
    Camping => "camping",
});

wire_names!(StockStatus {
    InStock => "in_stock",
    LowStock => "low_stock",
    OutOfStock => "out_of_stock",
    Discontinued => "discontinued",
});

wire_names!(MovementType {
    Received => "received",
    Sold => "sold",
    Returned => "returned",
    Adjustment => "adjustment",
    Transfer => "transfer",
    Damaged => "damaged",
});

wire_names!(AlertSeverity {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

fn default_reorder_point() -> i64 {
    DEFAULT_REORDER_POINT
}

/// One catalogue entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub sku: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: ProductCategory,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub quantity: i64,
    #[serde(default = "default_reorder_point")]
    pub reorder_point: i64,
    pub status: StockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether stock has fallen to the reorder point.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_point
    }
}

/// A recorded stock change.
///
/// The history route sends a short form (`type`, `quantity`) while the full
/// record carries before and after levels; both decode here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub sku: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(alias = "type")]
    pub movement_type: MovementType,
    #[serde(alias = "quantity")]
    pub quantity_change: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAlert {
    pub id: String,
    #[serde(default)]
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub alert_type: String,
    pub current_quantity: i64,
    pub threshold: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Whole-catalogue totals from `GET /analytics/summary`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub total_units: i64,
    #[serde(default)]
    pub low_stock_count: u64,
    #[serde(default)]
    pub out_of_stock_count: u64,
    #[serde(default)]
    pub in_stock_count: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockUpdateResult {
    #[serde(default)]
    pub success: bool,
    pub sku: String,
    #[serde(default)]
    pub product_name: String,
    pub old_quantity: i64,
    pub new_quantity: i64,
    pub change: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<StockStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReorderResult {
    #[serde(default)]
    pub success: bool,
    pub reorder_id: String,
    pub sku: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub estimated_cost: f64,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAcknowledgement {
    #[serde(default)]
    pub success: bool,
    pub alert_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryProduct {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalytics {
    pub category: ProductCategory,
    #[serde(default)]
    pub product_count: u64,
    #[serde(default)]
    pub total_units: i64,
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub average_price: f64,
    #[serde(default)]
    pub products: Vec<CategoryProduct>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub threshold: i64,
    pub status: StockStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockReport {
    #[serde(default)]
    pub items: Vec<LowStockItem>,
    #[serde(default)]
    pub count: u64,
    pub threshold: u32,
}

/// One line of a bulk receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReceiveItem {
    pub sku: String,
    pub quantity: i64,
}

impl BulkReceiveItem {
    pub fn new(sku: impl Into<String>, quantity: i64) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkReceiveResult {
    pub sku: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkReceiveReport {
    pub total_items: u64,
    pub successful: u64,
    pub failed: u64,
    #[serde(default)]
    pub results: Vec<BulkReceiveResult>,
}

/// Whether cross-app token exchange is configured for the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XaaStatus {
    #[serde(default)]
    pub xaa_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_server_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Filters for `list_products`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<ProductCategory>,
    pub status: Option<StockStatus>,
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: ProductCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn status(mut self, status: StockStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Case-insensitive match on name or SKU.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into()).filter(|s: &String| !s.trim().is_empty());
        self
    }

    /// Page size, clamped to `1..=MAX_PRODUCT_PAGE`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.clamp(1, MAX_PRODUCT_PAGE));
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Filters for `inventory_alerts`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertQuery {
    pub severity: Option<AlertSeverity>,
    pub acknowledged: Option<bool>,
}

impl AlertQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn acknowledged(mut self, acknowledged: bool) -> Self {
        self.acknowledged = Some(acknowledged);
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(severity) = self.severity {
            pairs.push(("severity", severity.as_str().to_string()));
        }
        if let Some(acknowledged) = self.acknowledged {
            pairs.push(("acknowledged", acknowledged.to_string()));
        }
        pairs
    }
}

/// A manual stock change: positive adds units, negative removes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockAdjustment {
    pub quantity_change: i64,
    pub reason: String,
    pub movement_type: MovementType,
}

impl StockAdjustment {
    pub fn new(quantity_change: i64, reason: impl Into<String>) -> Self {
        Self {
            quantity_change,
            reason: reason.into(),
            movement_type: MovementType::default(),
        }
    }

    pub fn movement_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = movement_type;
        self
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("quantity_change", self.quantity_change.to_string()),
            ("reason", self.reason.clone()),
            ("movement_type", self.movement_type.as_str().to_string()),
        ]
    }
}

impl ChatClient {
    fn inventory_url(&self, tail: &[&str], query: &[(&str, String)]) -> Result<String, ChatError> {
        let segments: Vec<&str> = INVENTORY.iter().chain(tail).copied().collect();
        self.endpoint(&segments, query)
    }

    /// `GET /api/inventory/products`.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ChatError> {
        let url = self.inventory_url(&["products"], &query.pairs())?;
        self.get_json(&url).await
    }

    /// `GET /api/inventory/products/{sku}`. An unknown SKU is a 404.
    pub async fn product(&self, sku: &str) -> Result<Product, ChatError> {
        require_id("sku", sku)?;
        let url = self.inventory_url(&["products", sku], &[])?;
        self.get_json(&url).await
    }

    /// `POST /api/inventory/products/{sku}/stock`.
    pub async fn update_stock(
        &self,
        sku: &str,
        adjustment: &StockAdjustment,
    ) -> Result<StockUpdateResult, ChatError> {
        require_id("sku", sku)?;
        if adjustment.reason.trim().is_empty() {
            return Err(ChatError::Validation("stock change needs a reason".into()));
        }
        let url = self.inventory_url(&["products", sku, "stock"], &adjustment.pairs())?;
        debug!(sku, change = adjustment.quantity_change, "updating stock");
        self.post_json(&url, None::<&()>).await
    }

    /// `POST /api/inventory/products/{sku}/reorder`. `quantity` must be positive.
    pub async fn create_reorder(&self, sku: &str, quantity: u32) -> Result<ReorderResult, ChatError> {
        require_id("sku", sku)?;
        if quantity == 0 {
            return Err(ChatError::Validation(
                "reorder quantity must be greater than zero".into(),
            ));
        }
        let url = self.inventory_url(
            &["products", sku, "reorder"],
            &[("quantity", quantity.to_string())],
        )?;
        self.post_json(&url, None::<&()>).await
    }

    /// `GET /api/inventory/products/{sku}/movements`, newest first.
    pub async fn stock_movements(
        &self,
        sku: &str,
        limit: Option<u32>,
    ) -> Result<Vec<StockMovement>, ChatError> {
        require_id("sku", sku)?;
        let query: Vec<(&str, String)> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        let url = self.inventory_url(&["products", sku, "movements"], &query)?;
        self.get_json(&url).await
    }

    /// `GET /api/inventory/alerts`.
    pub async fn inventory_alerts(&self, query: &AlertQuery) -> Result<Vec<InventoryAlert>, ChatError> {
        let url = self.inventory_url(&["alerts"], &query.pairs())?;
        self.get_json(&url).await
    }

    /// `POST /api/inventory/alerts/{id}/acknowledge`.
    pub async fn acknowledge_alert(&self, alert_id: &str) -> Result<AlertAcknowledgement, ChatError> {
        require_id("alert id", alert_id)?;
        let url = self.inventory_url(&["alerts", alert_id, "acknowledge"], &[])?;
        self.post_json(&url, None::<&()>).await
    }

    /// `GET /api/inventory/analytics/summary`.
    pub async fn inventory_summary(&self) -> Result<StockSummary, ChatError> {
        let url = self.inventory_url(&["analytics", "summary"], &[])?;
        self.get_json(&url).await
    }

    /// `GET /api/inventory/analytics/category/{category}`.
    pub async fn category_analytics(
        &self,
        category: ProductCategory,
    ) -> Result<CategoryAnalytics, ChatError> {
        let url = self.inventory_url(&["analytics", "category", category.as_str()], &[])?;
        self.get_json(&url).await
    }

    /// `GET /api/inventory/analytics/low-stock`. Server default threshold is 15.
    pub async fn low_stock_report(&self, threshold: Option<u32>) -> Result<LowStockReport, ChatError> {
        if threshold == Some(0) {
            return Err(ChatError::Validation(
                "low stock threshold must be at least 1".into(),
            ));
        }
        let query: Vec<(&str, String)> = threshold
            .map(|t| ("threshold", t.to_string()))
            .into_iter()
            .collect();
        let url = self.inventory_url(&["analytics", "low-stock"], &query)?;
        self.get_json(&url).await
    }

    /// `POST /api/inventory/bulk/receive`. Each line succeeds or fails on its own.
    pub async fn bulk_receive(&self, items: &[BulkReceiveItem]) -> Result<BulkReceiveReport, ChatError> {
        if items.is_empty() {
            return Err(ChatError::Validation("nothing to receive".into()));
        }
        let url = self.inventory_url(&["bulk", "receive"], &[])?;
        self.post_json(&url, Some(items)).await
    }

    /// `GET /api/inventory/xaa/status`.
    pub async fn xaa_status(&self) -> Result<XaaStatus, ChatError> {
        let url = self.inventory_url(&["xaa", "status"], &[])?;
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, Reply, client};
    use crate::transport::Method;

    const BOOT: &str = r#"{"id":"prod-001","sku":"BOOT-HK-001","name":"TrailMaster Hiking Boot","category":"footwear","price":149.99,"cost":65.0,"quantity":45,"reorder_point":20,"status":"in_stock","location":"A1-01","last_updated":"2025-01-15T10:30:00"}"#;

    #[test]
    fn product_decodes_and_defaults_reorder_point() {
        let product: Product = serde_json::from_str(BOOT).expect("product");
        assert_eq!(product.category, ProductCategory::Footwear);
        assert_eq!(product.status, StockStatus::InStock);
        assert!(product.last_updated.is_some());
        assert!(!product.needs_reorder());

        let bare: Product = serde_json::from_value(serde_json::json!({
            "sku": "TENT-2P", "name": "Tent", "category": "camping",
            "price": 10.0, "quantity": 3, "status": "low_stock"
        }))
        .expect("bare product");
        assert_eq!(bare.reorder_point, 10);
        assert!(bare.needs_reorder());
    }

    #[test]
    fn enum_names_parse_like_the_wire() {
        assert_eq!("Low-Stock".parse::<StockStatus>(), Ok(StockStatus::LowStock));
        assert_eq!(" camping ".parse::<ProductCategory>(), Ok(ProductCategory::Camping));
        assert_eq!(MovementType::Damaged.to_string(), "damaged");
        assert!(matches!(
            "urgent".parse::<AlertSeverity>(),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn movement_accepts_short_history_form() {
        let movement: StockMovement = serde_json::from_value(serde_json::json!({
            "id": "mov-1", "sku": "BOOT-HK-001", "type": "sold",
            "quantity": -2, "timestamp": "2025-01-15T10:30:00Z", "reason": "Order"
        }))
        .expect("movement");
        assert_eq!(movement.movement_type, MovementType::Sold);
        assert_eq!(movement.quantity_change, -2);
        assert!(movement.previous_quantity.is_none());
        assert!(movement.product_name.is_empty());
    }

    #[tokio::test]
    async fn list_products_sends_filters_as_query() {
        let transport = FakeTransport::new(Reply::Chunks(200, vec!["[", BOOT, "]"]));
        let query = ProductQuery::new()
            .category(ProductCategory::Footwear)
            .status(StockStatus::InStock)
            .search("trail boot")
            .limit(500);
        let products = client(transport.clone(), Some("tok"))
            .list_products(&query)
            .await
            .expect("products");
        assert_eq!(products.len(), 1);
        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Get);
        assert_eq!(
            sent.url,
            "http://api.test/api/inventory/products?category=footwear&status=in_stock&search=trail+boot&limit=100"
        );
        assert_eq!(sent.header_value("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn unknown_product_surfaces_server_detail() {
        let transport = FakeTransport::new(Reply::Chunks(
            404,
            vec![r#"{"detail":"Product NOPE not found"}"#],
        ));
        let err = client(transport.clone(), Some("tok"))
            .product("NOPE")
            .await
            .expect_err("missing");
        assert_eq!(err, ChatError::http(404, "Product NOPE not found"));
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/products/NOPE"
        );
    }

    #[tokio::test]
    async fn stock_update_and_reorder_use_query_parameters() {
        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"success":true,"sku":"BOOT-HK-001","product_name":"Boot","old_quantity":45,"new_quantity":40,"change":-5,"new_status":"in_stock","reason":"damaged box"}"#],
        ));
        let adjustment = StockAdjustment::new(-5, "damaged box").movement_type(MovementType::Damaged);
        let result = client(transport.clone(), Some("tok"))
            .update_stock("BOOT-HK-001", &adjustment)
            .await
            .expect("update");
        assert_eq!(result.new_quantity, 40);
        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Post);
        assert!(sent.body.is_none());
        assert_eq!(
            sent.url,
            "http://api.test/api/inventory/products/BOOT-HK-001/stock?quantity_change=-5&reason=damaged+box&movement_type=damaged"
        );

        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"success":true,"reorder_id":"RO-1A2B3C4D","sku":"BOOT-HK-001","product_name":"Boot","quantity":30,"estimated_cost":1950.0,"status":"pending"}"#],
        ));
        let reorder = client(transport.clone(), Some("tok"))
            .create_reorder("BOOT-HK-001", 30)
            .await
            .expect("reorder");
        assert_eq!(reorder.status, "pending");
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/products/BOOT-HK-001/reorder?quantity=30"
        );
    }

    #[tokio::test]
    async fn invalid_arguments_fail_before_sending() {
        let transport = FakeTransport::new(Reply::Chunks(200, vec!["{}"]));
        let client = client(transport.clone(), Some("tok"));
        assert!(matches!(
            client.create_reorder("BOOT-HK-001", 0).await,
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(client.product(" ").await, Err(ChatError::Validation(_))));
        assert!(matches!(
            client.update_stock("BOOT-HK-001", &StockAdjustment::new(1, "")).await,
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            client.low_stock_report(Some(0)).await,
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(client.bulk_receive(&[]).await, Err(ChatError::Validation(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn alerts_route_and_acknowledge() {
        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"[{"id":"alert-001","product_name":"Tent","sku":"TENT-2P","alert_type":"low_stock","current_quantity":3,"threshold":10,"severity":"high","acknowledged":false}]"#],
        ));
        let alerts = client(transport.clone(), Some("tok"))
            .inventory_alerts(&AlertQuery::new().severity(AlertSeverity::High).acknowledged(false))
            .await
            .expect("alerts");
        assert_eq!(alerts[0].severity, Some(AlertSeverity::High));
        assert!(alerts[0].product_id.is_empty());
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/alerts?severity=high&acknowledged=false"
        );

        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"success":true,"alert_id":"alert-001","acknowledged_by":"sam@progear.example","message":"Alert acknowledged"}"#],
        ));
        let ack = client(transport.clone(), Some("tok"))
            .acknowledge_alert("alert-001")
            .await
            .expect("ack");
        assert!(ack.success);
        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(
            sent.url,
            "http://api.test/api/inventory/alerts/alert-001/acknowledge"
        );
    }

    #[tokio::test]
    async fn analytics_routes() {
        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"total_products":12,"total_value":10450.5,"total_units":420,"low_stock_count":3,"out_of_stock_count":1,"in_stock_count":8}"#],
        ));
        let summary = client(transport.clone(), Some("tok"))
            .inventory_summary()
            .await
            .expect("summary");
        assert_eq!(summary.total_products, 12);
        assert!(summary.categories.is_empty());
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/analytics/summary"
        );

        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"category":"camping","product_count":1,"total_units":3,"total_value":30.0,"average_price":10.0,"products":[{"sku":"TENT-2P","name":"Tent","quantity":3,"value":30.0}]}"#],
        ));
        let analytics = client(transport.clone(), Some("tok"))
            .category_analytics(ProductCategory::Camping)
            .await
            .expect("category");
        assert_eq!(analytics.products.len(), 1);
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/analytics/category/camping"
        );

        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"items":[{"sku":"TENT-2P","name":"Tent","quantity":3,"threshold":10,"status":"low_stock"}],"count":1,"threshold":15}"#],
        ));
        let report = client(transport.clone(), Some("tok"))
            .low_stock_report(Some(15))
            .await
            .expect("low stock");
        assert_eq!(report.items[0].status, StockStatus::LowStock);
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/analytics/low-stock?threshold=15"
        );
    }

    #[tokio::test]
    async fn bulk_receive_posts_json_lines() {
        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"total_items":2,"successful":1,"failed":1,"results":[{"sku":"BOOT-HK-001","success":true,"result":{"new_quantity":55}},{"sku":"NOPE","success":false,"error":"Product not found"}]}"#],
        ));
        let report = client(transport.clone(), Some("tok"))
            .bulk_receive(&[BulkReceiveItem::new("BOOT-HK-001", 10), BulkReceiveItem::new("NOPE", 1)])
            .await
            .expect("bulk");
        assert_eq!((report.successful, report.failed), (1, 1));
        assert_eq!(report.results[1].error.as_deref(), Some("Product not found"));
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/bulk/receive"
        );
        assert_eq!(
            transport.last_json(),
            serde_json::json!([
                {"sku": "BOOT-HK-001", "quantity": 10},
                {"sku": "NOPE", "quantity": 1}
            ])
        );
    }

    #[tokio::test]
    async fn movements_and_xaa_status() {
        let transport = FakeTransport::new(Reply::Chunks(200, vec!["[]"]));
        let movements = client(transport.clone(), Some("tok"))
            .stock_movements("BOOT-HK-001", Some(5))
            .await
            .expect("movements");
        assert!(movements.is_empty());
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/products/BOOT-HK-001/movements?limit=5"
        );

        let transport = FakeTransport::new(Reply::Chunks(
            200,
            vec![r#"{"xaa_enabled":false,"reason":"ID-JAG exchange not configured","fallback":"demo_mode"}"#],
        ));
        let status = client(transport.clone(), Some("tok"))
            .xaa_status()
            .await
            .expect("xaa");
        assert!(!status.xaa_enabled);
        assert_eq!(status.fallback.as_deref(), Some("demo_mode"));
        assert_eq!(
            transport.last_request().url,
            "http://api.test/api/inventory/xaa/status"
        );
    }
}
