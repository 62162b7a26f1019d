use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use emporium_shared::Masked;

/// Account roles issued by the auth service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        };
        f.write_str(s)
    }
}

/// The verified caller of an operation.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            role,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &Masked(&self.email))
            .field("role", &self.role)
            .finish()
    }
}

/// Every lifecycle operation that passes through the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateOrder,
    VerifyPayment,
    ListMyOrders,
    ListAllOrders,
    UpdateOrderStatus,
    CancelOrder,
    DeleteOrder,
}

const ANY_ROLE: &[Role] = &[Role::User, Role::Admin, Role::SuperAdmin];
const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

impl Operation {
    /// Callable without any identity at all (gateway redirects and webhooks).
    pub fn is_public(self) -> bool {
        matches!(self, Operation::VerifyPayment)
    }

    /// Callable by a guest when guest checkout is switched on.
    pub fn allows_guests(self) -> bool {
        matches!(self, Operation::CreateOrder)
    }

    /// Roles an authenticated caller must hold.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Operation::CreateOrder
            | Operation::VerifyPayment
            | Operation::ListMyOrders
            | Operation::DeleteOrder => ANY_ROLE,
            Operation::ListAllOrders | Operation::UpdateOrderStatus | Operation::CancelOrder => {
                ADMIN_ROLES
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Not authorized, no token provided")]
    Unauthenticated,
    #[error("Access denied: {role} is not authorized to access this route")]
    Forbidden { role: Role, operation: Operation },
}

/// Check that `identity` holds one of the roles `operation` requires.
pub fn require_role(identity: &Identity, operation: Operation) -> Result<(), AccessError> {
    if operation.is_public() || operation.allowed_roles().contains(&identity.role) {
        Ok(())
    } else {
        Err(AccessError::Forbidden {
            role: identity.role,
            operation,
        })
    }
}

/// Decide whether `actor` (absent for guests) may invoke `operation`.
pub fn authorize(
    actor: Option<&Identity>,
    operation: Operation,
    guest_checkout: bool,
) -> Result<(), AccessError> {
    match actor {
        Some(identity) => require_role(identity, operation),
        None if operation.is_public() => Ok(()),
        None if operation.allows_guests() && guest_checkout => Ok(()),
        None => Err(AccessError::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> Identity {
        Identity::new(Uuid::new_v4(), "someone@example.com", role)
    }

    #[test]
    fn test_admin_operations_reject_plain_users() {
        let customer = user(Role::User);
        for op in [
            Operation::ListAllOrders,
            Operation::UpdateOrderStatus,
            Operation::CancelOrder,
        ] {
            assert_eq!(
                authorize(Some(&customer), op, false),
                Err(AccessError::Forbidden {
                    role: Role::User,
                    operation: op
                })
            );
            assert!(authorize(Some(&user(Role::Admin)), op, false).is_ok());
            assert!(authorize(Some(&user(Role::SuperAdmin)), op, false).is_ok());
        }
    }

    #[test]
    fn test_guest_access() {
        assert!(authorize(None, Operation::VerifyPayment, false).is_ok());
        assert_eq!(
            authorize(None, Operation::CreateOrder, false),
            Err(AccessError::Unauthenticated)
        );
        assert!(authorize(None, Operation::CreateOrder, true).is_ok());
        // guest checkout never opens anything beyond order creation
        assert_eq!(
            authorize(None, Operation::ListMyOrders, true),
            Err(AccessError::Unauthenticated)
        );
        assert_eq!(
            authorize(None, Operation::DeleteOrder, true),
            Err(AccessError::Unauthenticated)
        );
    }

    #[test]
    fn test_any_role_may_manage_own_orders() {
        for role in [Role::User, Role::Admin, Role::SuperAdmin] {
            let identity = user(role);
            assert!(require_role(&identity, Operation::CreateOrder).is_ok());
            assert!(require_role(&identity, Operation::ListMyOrders).is_ok());
            assert!(require_role(&identity, Operation::DeleteOrder).is_ok());
        }
    }

    #[test]
    fn test_role_wire_format() {
        let role: Role = serde_json::from_str("\"superadmin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_identity_debug_masks_email() {
        let identity = user(Role::User);
        assert!(!format!("{:?}", identity).contains("someone@example.com"));
    }
}
