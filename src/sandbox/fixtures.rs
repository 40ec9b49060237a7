//! The people, places and dishes [`SandboxBackend::seeded`](super::SandboxBackend::seeded)
//! starts with.

use crate::api::Session;
use crate::model::{
    CustomerId, DeliveryLocation, DriverId, MenuItem, MenuItemId, RestaurantId, Role,
};

pub const CUSTOMER: CustomerId = CustomerId(42);
pub const RESTAURANT: RestaurantId = RestaurantId(1);
pub const OTHER_RESTAURANT: RestaurantId = RestaurantId(2);
pub const DRIVER: DriverId = DriverId(31);
pub const OTHER_DRIVER: DriverId = DriverId(32);
pub const ADMIN: u64 = 99;

pub fn customer() -> Session {
    Session::new(CUSTOMER.0, Role::Customer, "tok_customer")
}

pub fn restaurant() -> Session {
    Session::new(RESTAURANT.0, Role::Restaurant, "tok_restaurant")
}

pub fn driver() -> Session {
    Session::new(DRIVER.0, Role::Driver, "tok_driver")
}

pub fn admin() -> Session {
    Session::new(ADMIN, Role::Admin, "tok_admin")
}

pub fn jollof() -> MenuItem {
    MenuItem {
        id: MenuItemId(7),
        restaurant_id: RESTAURANT,
        name: "Jollof rice".to_string(),
        price: 1500,
        image_ref: Some("jollof.png".to_string()),
    }
}

pub fn plantain() -> MenuItem {
    MenuItem {
        id: MenuItemId(8),
        restaurant_id: RESTAURANT,
        name: "Fried plantain".to_string(),
        price: 500,
        image_ref: None,
    }
}

pub fn suya() -> MenuItem {
    MenuItem {
        id: MenuItemId(21),
        restaurant_id: OTHER_RESTAURANT,
        name: "Beef suya".to_string(),
        price: 1200,
        image_ref: Some("suya.png".to_string()),
    }
}

pub fn location() -> DeliveryLocation {
    DeliveryLocation {
        address: "12 Allen Avenue, Ikeja".to_string(),
        latitude: 6.6018,
        longitude: 3.3515,
    }
}
