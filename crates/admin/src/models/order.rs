//! Shop order domain types.
//!
//! Orders are written by the mobile app; the console only reads them and
//! moves their status forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kinniku_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};

/// A shop order from the `orders` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer: Customer,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Amounts in whole yen.
    #[serde(default)]
    pub subtotal: i64,
    #[serde(default)]
    pub tax: i64,
    #[serde(default)]
    pub shipping: i64,
    #[serde(default)]
    pub total: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
}

/// Japanese postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub zip_code: String,
    pub prefecture: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub building: Option<String>,
}

impl ShippingAddress {
    /// Multi-line form used in customer emails.
    #[must_use]
    pub fn to_multiline(&self, recipient: &str) -> String {
        let mut lines = vec![
            format!("{recipient} 様"),
            format!("〒{}", self.zip_code),
            format!("{}{}{}", self.prefecture, self.city, self.address),
        ];
        if let Some(building) = self.building.as_deref().filter(|b| !b.trim().is_empty()) {
            lines.push(building.to_string());
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: String,
    pub product_name: String,
    /// Unit price in whole yen.
    pub price: i64,
    pub quantity: u32,
}

/// Order counts and sales for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub pending: u64,
    /// Orders confirmed or being packed.
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    /// Sum of `total` over every order, in whole yen.
    pub total_sales: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(building: Option<&str>) -> ShippingAddress {
        ShippingAddress {
            zip_code: "150-0001".to_string(),
            prefecture: "東京都".to_string(),
            city: "渋谷区".to_string(),
            address: "神宮前1-2-3".to_string(),
            building: building.map(str::to_string),
        }
    }

    #[test]
    fn test_multiline_address_with_building() {
        assert_eq!(
            address(Some("筋肉ビル 4F")).to_multiline("山田 太郎"),
            "山田 太郎 様\n〒150-0001\n東京都渋谷区神宮前1-2-3\n筋肉ビル 4F"
        );
    }

    #[test]
    fn test_multiline_address_skips_blank_building() {
        assert_eq!(
            address(Some("  ")).to_multiline("Taro"),
            "Taro 様\n〒150-0001\n東京都渋谷区神宮前1-2-3"
        );
    }
}
