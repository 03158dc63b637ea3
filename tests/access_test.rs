// tests/access_test.rs

mod common;

use chrono::{Duration, Utc};

use canteiro::models::assignment::ContextType;
use common::{
    seed_assignment, seed_location, seed_organization, seed_project, seed_user, standard_role, test_state,
};

#[tokio::test]
async fn organization_assignment_sees_every_location() {
    let Some(state) = test_state().await else { return };
    let pool = &state.db_pool;

    let org = seed_organization(pool).await;
    let user = seed_user(pool, org, "user").await;
    let l1 = seed_location(pool, org, "Matriz").await;
    let l2 = seed_location(pool, org, "Canteiro Norte").await;
    let admin = standard_role(pool, "Administrador").await;
    seed_assignment(pool, org, user, admin, ContextType::Organization, org, (None, None)).await;

    let access = state
        .access_service
        .resolve_accessible_locations(user, org)
        .await
        .unwrap();

    assert!(access.is_org_wide);
    assert!(access.location_ids.contains(&l1));
    assert!(access.location_ids.contains(&l2));
    assert_eq!(access.access_contexts, vec![format!("ORG:{}", org)]);
}

#[tokio::test]
async fn project_assignment_expands_to_its_location() {
    let Some(state) = test_state().await else { return };
    let pool = &state.db_pool;

    let org = seed_organization(pool).await;
    let user = seed_user(pool, org, "user").await;
    let l3 = seed_location(pool, org, "L3").await;
    let l9 = seed_location(pool, org, "L9").await;
    let _unrelated = seed_location(pool, org, "L5").await;
    let p7 = seed_project(pool, org, l3, "P7").await;
    let engineer = standard_role(pool, "Engenheiro").await;

    seed_assignment(pool, org, user, engineer, ContextType::Project, p7, (None, None)).await;
    seed_assignment(pool, org, user, engineer, ContextType::Location, l9, (None, None)).await;

    let access = state
        .access_service
        .resolve_accessible_locations(user, org)
        .await
        .unwrap();

    assert!(!access.is_org_wide);
    let mut expected = vec![l3, l9];
    expected.sort();
    let mut got = access.location_ids.clone();
    got.sort();
    assert_eq!(got, expected);

    // Tokens vêm das atribuições diretas, não dos locais expandidos
    assert!(access.access_contexts.contains(&format!("PROJ:{}", p7)));
    assert!(access.access_contexts.contains(&format!("LOC:{}", l9)));
    assert!(!access.access_contexts.contains(&format!("LOC:{}", l3)));
}

#[tokio::test]
async fn expired_and_future_assignments_grant_nothing() {
    let Some(state) = test_state().await else { return };
    let pool = &state.db_pool;

    let org = seed_organization(pool).await;
    let user = seed_user(pool, org, "user").await;
    let loc = seed_location(pool, org, "Canteiro Sul").await;
    let viewer = standard_role(pool, "Visualizador").await;

    let today = Utc::now().date_naive();
    let yesterday = (today - Duration::days(1)).to_string();
    let tomorrow = (today + Duration::days(1)).to_string();

    seed_assignment(pool, org, user, viewer, ContextType::Location, loc, (None, Some(&yesterday))).await;
    seed_assignment(pool, org, user, viewer, ContextType::Organization, org, (Some(&tomorrow), None)).await;

    let access = state
        .access_service
        .resolve_accessible_locations(user, org)
        .await
        .unwrap();

    assert!(!access.is_org_wide);
    assert!(access.location_ids.is_empty());
    assert!(access.access_contexts.is_empty());

    let active = state.access_service.get_active_assignments(org, user).await.unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn superadmin_is_org_wide_without_assignments() {
    let Some(state) = test_state().await else { return };
    let pool = &state.db_pool;

    let org = seed_organization(pool).await;
    let root = seed_user(pool, org, "superadmin").await;
    let loc = seed_location(pool, org, "Escritório").await;

    let access = state
        .access_service
        .resolve_accessible_locations(root, org)
        .await
        .unwrap();

    assert!(access.is_superadmin);
    assert!(access.is_org_wide);
    assert_eq!(access.location_ids, vec![loc]);
}

#[tokio::test]
async fn user_contexts_are_named() {
    let Some(state) = test_state().await else { return };
    let pool = &state.db_pool;

    let org = seed_organization(pool).await;
    let user = seed_user(pool, org, "user").await;
    let loc = seed_location(pool, org, "Canteiro Leste").await;
    let foreman = standard_role(pool, "Encarregado").await;
    seed_assignment(pool, org, user, foreman, ContextType::Location, loc, (None, None)).await;

    let contexts = state.access_service.get_user_contexts(org, user).await.unwrap();

    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].context_name.as_deref(), Some("Canteiro Leste"));
    assert_eq!(contexts[0].role_name.as_deref(), Some("Encarregado"));
}
