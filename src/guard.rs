//! Ownership guard shared by every hero and pet operation.
use crate::error::ServiceError;
use crate::types::CallerIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny,
}

impl Decision {
    pub fn is_permit(self) -> bool {
        self == Decision::Permit
    }
}

/// Canonical identity equality. Ids are bech32 strings, which are case-insensitive.
pub fn same_identity(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Admins are always permitted; anyone else only when they own the resource.
/// A resource without an owner can only be touched by an admin.
pub fn authorize(caller: &CallerIdentity, owner_id: Option<&str>) -> Decision {
    if caller.is_admin() {
        return Decision::Permit;
    }
    match owner_id {
        Some(owner) if same_identity(&caller.id, owner) => Decision::Permit,
        _ => Decision::Deny,
    }
}

/// [`authorize`] translated into the service error taxonomy.
pub fn require(caller: &CallerIdentity, owner_id: Option<&str>) -> Result<(), ServiceError> {
    match authorize(caller, owner_id) {
        Decision::Permit => Ok(()),
        Decision::Deny => {
            tracing::warn!(caller = %caller.id, role = ?caller.role, "ownership check denied");
            Err(ServiceError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_permitted() {
        let caller = CallerIdentity::hero("hero_1xyz");
        assert_eq!(authorize(&caller, Some("hero_1xyz")), Decision::Permit);
    }

    #[test]
    fn other_hero_is_denied() {
        let caller = CallerIdentity::hero("hero_1xyz");
        assert_eq!(authorize(&caller, Some("hero_1abc")), Decision::Deny);
        assert!(matches!(
            require(&caller, Some("hero_1abc")),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn admin_is_always_permitted() {
        let caller = CallerIdentity::admin("admin_1xyz");
        assert!(authorize(&caller, Some("hero_1abc")).is_permit());
        assert!(authorize(&caller, None).is_permit());
    }

    #[test]
    fn unowned_resource_denies_heroes() {
        let caller = CallerIdentity::hero("hero_1xyz");
        assert_eq!(authorize(&caller, None), Decision::Deny);
    }

    #[test]
    fn identity_comparison_is_normalised() {
        assert!(same_identity(" hero_1XYZ", "hero_1xyz "));
        assert!(!same_identity("", ""));
        assert!(!same_identity("hero_1xyz", "hero_1xy"));
    }
}
