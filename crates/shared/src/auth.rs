//! Authentication claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims for access tokens.
///
/// Every report is scoped to the shop named in `shop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier).
    pub sub: String,
    /// Shop the user is currently working in.
    pub shop: String,
    /// User's role in the shop.
    #[serde(default)]
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user: &str, shop_id: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user.to_string(),
            shop: shop_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the shop ID from claims.
    #[must_use]
    pub fn shop_id(&self) -> &str {
        &self.shop
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new("user-1", "SHOP1", "accountant", expires_at);

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.shop_id(), "SHOP1");
        assert_eq!(claims.role, "accountant");
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }
}
