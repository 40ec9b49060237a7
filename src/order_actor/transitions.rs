//! The order status transition table.
//!
//! | From | To | Role | Side effect |
//! |------|----|------|-------------|
//! | pending | accepted | restaurant | none |
//! | accepted | ready | restaurant | driver search |
//! | ready | delivering | driver | assigns the driver |
//! | delivering | completed | driver | confirmation code checked |
//! | any non-terminal | any | admin | may reassign the driver |
//!
//! Both the client-side gate and the sandbox backend read this table.

use crate::model::{OrderStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    /// Look for an online driver; finding none does not fail the transition.
    DriverSearch,
    /// The acting driver becomes the order's driver.
    AssignDriver,
    /// The transition must carry the customer's confirmation code.
    ConfirmDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub role: Role,
    pub effect: SideEffect,
}

pub const RULES: [Rule; 4] = [
    Rule {
        from: OrderStatus::Pending,
        to: OrderStatus::Accepted,
        role: Role::Restaurant,
        effect: SideEffect::None,
    },
    Rule {
        from: OrderStatus::Accepted,
        to: OrderStatus::Ready,
        role: Role::Restaurant,
        effect: SideEffect::DriverSearch,
    },
    Rule {
        from: OrderStatus::Ready,
        to: OrderStatus::Delivering,
        role: Role::Driver,
        effect: SideEffect::AssignDriver,
    },
    Rule {
        from: OrderStatus::Delivering,
        to: OrderStatus::Completed,
        role: Role::Driver,
        effect: SideEffect::ConfirmDelivery,
    },
];

pub fn rule(role: Role, from: OrderStatus, to: OrderStatus) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|r| r.role == role && r.from == from && r.to == to)
}

/// Whether `role` may move an order from `from` to `to`.
///
/// Nothing leaves `completed`, not even an admin override.
pub fn permitted(role: Role, from: OrderStatus, to: OrderStatus) -> bool {
    match role {
        Role::Admin => !from.is_terminal(),
        _ => rule(role, from, to).is_some(),
    }
}

pub fn side_effect(role: Role, from: OrderStatus, to: OrderStatus) -> SideEffect {
    rule(role, from, to).map_or(SideEffect::None, |r| r.effect)
}
