use crate::model::{MenuItemId, RestaurantId};
use serde::{Deserialize, Serialize};

/// A dish as listed on a restaurant's menu. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub price: u64,
    pub image_ref: Option<String>,
}

/// One line of a cart. Identity is `menu_item_id` within one restaurant's cart.
///
/// `quantity` is always at least 1: a line that would reach 0 is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub image_ref: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// What a caller hands to "add to cart".
///
/// Menu screens pass the raw menu item; cart screens pass the line they are showing.
/// Both normalize to a single-unit [`CartItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEntry {
    FromMenu(MenuItem),
    FromCart {
        restaurant_id: RestaurantId,
        item: CartItem,
    },
}

impl CartEntry {
    pub fn menu_item_id(&self) -> MenuItemId {
        match self {
            CartEntry::FromMenu(item) => item.id,
            CartEntry::FromCart { item, .. } => item.menu_item_id,
        }
    }

    pub fn restaurant_id(&self) -> RestaurantId {
        match self {
            CartEntry::FromMenu(item) => item.restaurant_id,
            CartEntry::FromCart { restaurant_id, .. } => *restaurant_id,
        }
    }

    /// Normalize to a fresh line with quantity 1.
    pub fn into_line(self) -> CartItem {
        match self {
            CartEntry::FromMenu(item) => CartItem {
                menu_item_id: item.id,
                name: item.name,
                unit_price: item.price,
                quantity: 1,
                image_ref: item.image_ref,
            },
            CartEntry::FromCart { item, .. } => CartItem { quantity: 1, ..item },
        }
    }
}

/// The server's cart of record. The server tracks membership only, so every
/// item comes back with quantity 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCart {
    pub restaurant_id: Option<RestaurantId>,
    pub items: Vec<CartItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jollof() -> MenuItem {
        MenuItem {
            id: MenuItemId(7),
            restaurant_id: RestaurantId(1),
            name: "Jollof rice".to_string(),
            price: 1500,
            image_ref: Some("jollof.png".to_string()),
        }
    }

    #[test]
    fn test_both_entry_shapes_normalize_to_single_unit_line() {
        let from_menu = CartEntry::FromMenu(jollof()).into_line();

        let mut shown = from_menu.clone();
        shown.quantity = 4;
        let from_cart = CartEntry::FromCart {
            restaurant_id: RestaurantId(1),
            item: shown,
        }
        .into_line();

        assert_eq!(from_menu, from_cart);
        assert_eq!(from_menu.quantity, 1);
        assert_eq!(from_menu.unit_price, 1500);
    }

    #[test]
    fn test_server_cart_reads_camel_case() {
        let cart: ServerCart = serde_json::from_value(serde_json::json!({
            "restaurantId": 1,
            "items": [{
                "menuItemId": 7,
                "name": "Jollof rice",
                "unitPrice": 1500,
                "quantity": 1,
                "imageRef": null
            }]
        }))
        .unwrap();
        assert_eq!(cart.restaurant_id, Some(RestaurantId(1)));
        assert_eq!(cart.items[0].line_total(), 1500);
    }
}
