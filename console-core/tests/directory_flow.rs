//! Admin bootstrap and provider group membership

mod common;

use console_core::ErrorCode;
use console_core::auth::permissions::{FINANCE_APPROVE, ORDERS_VIEW};
use console_core::directory::PROVIDERS;
use serde_json::json;
use shared::models::{AdminCreate, AdminRole, GroupCreate, ProviderFilter, ProviderType};

#[tokio::test]
async fn test_bootstrap_then_create_staff() {
    let (_dir, state) = common::create_test_state();
    state
        .identity
        .create_account("owner@fazzaain.app", "s3cret-pass")
        .await
        .unwrap();

    let owner = state.bootstrap.sign_in("owner@fazzaain.app", "s3cret-pass").await.unwrap();
    assert_eq!(owner.role, AdminRole::SuperAdmin);
    assert!(state.session.is_signed_in());

    let staff = state
        .admins
        .create_admin(AdminCreate {
            name: "Reem".into(),
            email: "reem@fazzaain.app".into(),
            password: "another-pass".into(),
            role: AdminRole::Admin,
            permissions: [ORDERS_VIEW.to_string()].into_iter().collect(),
        })
        .await
        .unwrap();
    // creating staff never swaps the signed-in account
    assert_eq!(state.session.current().unwrap().account_id, owner.account_id);
    assert!(state.admins.has_permission(&staff.id, ORDERS_VIEW).unwrap());
    assert!(!state.admins.has_permission(&staff.id, FINANCE_APPROVE).unwrap());

    state.bootstrap.sign_out().await.unwrap();
    assert!(!state.session.is_signed_in());
}

#[test]
fn test_group_delete_returns_members_to_general() {
    let (_dir, state) = common::create_test_state();
    for id in ["p1", "p2", "p3"] {
        state.store.set(PROVIDERS, id, json!({"name": id})).unwrap();
    }
    let group = state
        .groups
        .create_group(GroupCreate {
            name: "Elite".into(),
            color: Some("#C9A227".into()),
            ..Default::default()
        })
        .unwrap();
    let members = vec!["p1".to_string(), "p2".to_string()];
    state.groups.assign_providers(&group.id, &members).unwrap();

    let vip = ProviderFilter {
        provider_type: Some(ProviderType::Vip),
        ..Default::default()
    };
    assert_eq!(state.providers.list_providers(&vip).unwrap().len(), 2);

    state.groups.delete_group(&group.id).unwrap();
    assert!(state.providers.list_providers(&vip).unwrap().is_empty());
    assert_eq!(
        state.groups.get_group(&group.id).unwrap_err().code,
        ErrorCode::GroupNotFound
    );
}
