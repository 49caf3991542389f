//! Account and connection shapes returned by the user and Salesforce routes.
use serde::{Deserialize, Serialize};

/// Signed-in user as seen by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserInfo {
    /// Best display label: full name, then email.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesforceAccess {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAccess {
    #[serde(default)]
    pub authorized: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Which downstream systems the signed-in user may reach.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccess {
    pub salesforce: SalesforceAccess,
    pub inventory: InventoryAccess,
}

/// Group membership summary from `GET /api/user/groups`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroups {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub has_sales_access: bool,
    #[serde(default)]
    pub has_warehouse_access: bool,
    #[serde(default)]
    pub is_admin: bool,
}

/// Result of `GET /api/salesforce/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesforceStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Deserialize)]
pub(crate) struct SalesforceConnectReply {
    #[serde(default)]
    pub auth_url: Option<String>,
}
