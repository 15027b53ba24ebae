#![allow(clippy::unwrap_used, clippy::expect_used)]

use botfleet_security::{AccessScope, Principal, SecurityContext, SecurityError};

fn ctx(id: i64, superuser: bool) -> SecurityContext {
    SecurityContext::builder(
        Principal::new(id, format!("user{id}"), format!("user{id}@example.com"))
            .with_superuser(superuser),
    )
    .build()
}

#[test]
fn default_scope_denies_everything() {
    let scope = AccessScope::default();
    assert!(scope.is_empty());
    assert!(!scope.is_unrestricted());
    assert!(scope.owner_ids().is_empty());
}

#[test]
fn owned_by_uses_principal_id() {
    let scope = AccessScope::owned_by(&ctx(42, false));
    assert_eq!(scope.owner_ids(), &[42]);
    assert!(!scope.is_empty());
    assert!(!scope.is_unrestricted());
}

#[test]
fn ordinary_principal_cannot_bypass() {
    let err = AccessScope::superuser_bypass(&ctx(2, false)).unwrap_err();
    assert!(matches!(err, SecurityError::BypassDenied { principal_id: 2 }));
}

#[test]
fn superuser_bypass_is_unrestricted() {
    let scope = AccessScope::superuser_bypass(&ctx(1, true)).unwrap();
    assert!(scope.is_unrestricted());
    assert!(!scope.is_empty());
    assert!(scope.owner_ids().is_empty());
}

// Resolves to the inherent const only when `T: DeserializeOwned` holds.
#[allow(dead_code)]
struct Witness<T: ?Sized>(std::marker::PhantomData<T>);

trait NotDeserializable {
    const DESERIALIZABLE: bool = false;
}

impl<T: ?Sized> NotDeserializable for Witness<T> {}

#[allow(dead_code)]
impl<T: serde::de::DeserializeOwned> Witness<T> {
    const DESERIALIZABLE: bool = true;
}

#[test]
fn scopes_and_contexts_cannot_be_built_from_wire_data() {
    // An unrestricted scope or a superuser context must never come from input.
    assert!(!Witness::<AccessScope>::DESERIALIZABLE);
    assert!(!Witness::<SecurityContext>::DESERIALIZABLE);
    assert!(!Witness::<Principal>::DESERIALIZABLE);
}
