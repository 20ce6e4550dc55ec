//! Permission resolution integration tests.
//!
//! Run with: `cargo test -p perm-engine --test resolution_test`

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use helpers::{ctx, global, grant, seed, service, service_with, subject};
use perm_common::Tristate;
use perm_engine::data::SubjectData;
use perm_engine::legacy::import_legacy_permissions;
use perm_engine::{CalculatedSubject, EngineConfig, RankLadder};

#[tokio::test]
async fn test_context_grant_applies_only_when_active() {
    let (_store, service) = service();
    let nether = ctx(&["world=nether"]);
    seed(
        &service,
        "group:builder",
        grant("build", Tristate::True).with_permission(&nether, "build", Tristate::False),
    )
    .await;
    seed(
        &service,
        "user:alice",
        SubjectData::empty().add_parent(&global(), subject("group:builder")),
    )
    .await;
    let alice = subject("user:alice");

    assert_eq!(
        service.permission(&alice, &global(), "build").await.unwrap(),
        Tristate::True
    );
    assert_eq!(
        service.permission(&alice, &nether, "build").await.unwrap(),
        Tristate::False
    );
    assert_eq!(
        service
            .permission(&alice, &ctx(&["world=nether", "server=lobby"]), "build.fence")
            .await
            .unwrap(),
        Tristate::False
    );
}

#[tokio::test]
async fn test_context_scoped_parent() {
    let (_store, service) = service();
    let nether = ctx(&["world=nether"]);
    seed(&service, "group:nether", grant("fire", Tristate::True)).await;
    seed(
        &service,
        "user:alice",
        SubjectData::empty().add_parent(&nether, subject("group:nether")),
    )
    .await;
    let alice = subject("user:alice");

    assert_eq!(
        service.permission(&alice, &global(), "fire").await.unwrap(),
        Tristate::Undefined
    );
    assert_eq!(
        service.permission(&alice, &nether, "fire").await.unwrap(),
        Tristate::True
    );
    assert_eq!(
        service.parents(&alice, &nether).await.unwrap(),
        vec![subject("group:nether")]
    );
}

#[tokio::test]
async fn test_parent_order_decides_conflicts() {
    let (_store, service) = service();
    seed(&service, "group:strict", grant("chat", Tristate::False)).await;
    seed(&service, "group:loose", grant("chat", Tristate::True)).await;
    seed(
        &service,
        "user:alice",
        SubjectData::empty().with_parents(
            &global(),
            vec![subject("group:strict"), subject("group:loose")],
        ),
    )
    .await;
    seed(
        &service,
        "user:bob",
        SubjectData::empty().with_parents(
            &global(),
            vec![subject("group:loose"), subject("group:strict")],
        ),
    )
    .await;

    assert_eq!(
        service
            .permission(&subject("user:alice"), &global(), "chat")
            .await
            .unwrap(),
        Tristate::False
    );
    assert_eq!(
        service
            .permission(&subject("user:bob"), &global(), "chat")
            .await
            .unwrap(),
        Tristate::True
    );
}

#[tokio::test]
async fn test_inheritance_cycle_terminates() {
    let (_store, service) = service();
    seed(
        &service,
        "group:a",
        SubjectData::empty().add_parent(&global(), subject("group:b")),
    )
    .await;
    seed(
        &service,
        "group:b",
        SubjectData::empty().add_parent(&global(), subject("group:a")),
    )
    .await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        service.permission(&subject("group:a"), &global(), "anything"),
    )
    .await
    .expect("resolution finished")
    .unwrap();

    assert_eq!(result, Tristate::Undefined);
}

#[tokio::test]
async fn test_type_defaults() {
    let (_store, service) = service();
    seed(&service, "default:user", grant("spawn", Tristate::True)).await;
    seed(&service, "default:default", grant("help", Tristate::True)).await;
    seed(&service, "user:alice", grant("spawn", Tristate::False)).await;

    let alice = subject("user:alice");
    let bob = subject("user:bob");
    assert_eq!(
        service.permission(&bob, &global(), "spawn").await.unwrap(),
        Tristate::True
    );
    assert_eq!(
        service.permission(&bob, &global(), "help").await.unwrap(),
        Tristate::True
    );
    assert_eq!(
        service.permission(&alice, &global(), "spawn").await.unwrap(),
        Tristate::False
    );
    assert_eq!(
        service
            .permission(&subject("group:admin"), &global(), "help")
            .await
            .unwrap(),
        Tristate::True
    );
}

#[tokio::test]
async fn test_own_default_does_not_mask_parent_grants() {
    let (_store, service) = service();
    seed(&service, "group:builder", grant("build", Tristate::True)).await;
    seed(&service, "default:user", grant("spawn", Tristate::True)).await;
    seed(
        &service,
        "user:alice",
        SubjectData::empty()
            .add_parent(&global(), subject("group:builder"))
            .with_default_value(&global(), Tristate::False),
    )
    .await;
    let alice = subject("user:alice");

    assert_eq!(
        service.permission(&alice, &global(), "build").await.unwrap(),
        Tristate::True
    );
    assert_eq!(
        service.permission(&alice, &global(), "spawn").await.unwrap(),
        Tristate::False
    );
    assert_eq!(
        service
            .permission(&subject("user:bob"), &global(), "spawn")
            .await
            .unwrap(),
        Tristate::True
    );
}

#[tokio::test]
async fn test_type_defaults_disabled() {
    let (_store, service) = service_with(EngineConfig {
        use_type_defaults: false,
        ..EngineConfig::default_for_test()
    });
    seed(&service, "default:user", grant("spawn", Tristate::True)).await;

    assert_eq!(
        service
            .permission(&subject("user:bob"), &global(), "spawn")
            .await
            .unwrap(),
        Tristate::Undefined
    );
}

#[tokio::test]
async fn test_has_permission_default() {
    let (_store, service) = service();
    let bob = subject("user:bob");

    assert!(!service.has_permission(&bob, &global(), "fly").await.unwrap());

    let (_store, lenient) = service_with(EngineConfig {
        default_permission: true,
        ..EngineConfig::default_for_test()
    });
    assert!(lenient.has_permission(&bob, &global(), "fly").await.unwrap());
}

#[tokio::test]
async fn test_options_inherit_and_override() {
    let (_store, service) = service();
    let nether = ctx(&["world=nether"]);
    seed(
        &service,
        "group:vip",
        SubjectData::empty()
            .with_option(&global(), "prefix", Some("[VIP]".into()))
            .with_option(&global(), "suffix", Some("*".into())),
    )
    .await;
    seed(
        &service,
        "user:alice",
        SubjectData::empty()
            .add_parent(&global(), subject("group:vip"))
            .with_option(&nether, "prefix", Some("[Hot]".into())),
    )
    .await;
    let alice = subject("user:alice");

    assert_eq!(
        service.option(&alice, &global(), "prefix").await.unwrap(),
        Some("[VIP]".to_string())
    );
    assert_eq!(
        service.option(&alice, &nether, "prefix").await.unwrap(),
        Some("[Hot]".to_string())
    );
    assert_eq!(
        service.option(&alice, &nether, "suffix").await.unwrap(),
        Some("*".to_string())
    );
    assert_eq!(service.option(&alice, &nether, "color").await.unwrap(), None);
}

#[tokio::test]
async fn test_legacy_import_resolves() {
    let (_store, service) = service();
    let imported = import_legacy_permissions(["a.*", "-a.b", "x.(y|z)"]).unwrap();
    seed(
        &service,
        "user:alice",
        SubjectData::empty().with_permissions(&global(), imported),
    )
    .await;
    let alice = subject("user:alice");

    for (permission, expected) in [
        ("a", Tristate::True),
        ("a.c.d", Tristate::True),
        ("a.b", Tristate::False),
        ("a.b.c", Tristate::False),
        ("x.y", Tristate::True),
        ("x.z", Tristate::True),
        ("x.w", Tristate::Undefined),
    ] {
        assert_eq!(
            service.permission(&alice, &global(), permission).await.unwrap(),
            expected,
            "{permission}"
        );
    }
}

#[tokio::test]
async fn test_legacy_star_grants_everything() {
    let (_store, service) = service();
    let imported = import_legacy_permissions(["*", "-plugin.reload"]).unwrap();
    seed(
        &service,
        "group:admin",
        SubjectData::empty().with_permissions(&global(), imported),
    )
    .await;
    let admin = subject("group:admin");

    assert!(service.has_permission(&admin, &global(), "any.thing").await.unwrap());
    assert!(!service
        .has_permission(&admin, &global(), "plugin.reload")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_update_changes_resolution() {
    let (_store, service) = service();
    seed(&service, "group:staff", grant("kick", Tristate::True)).await;
    let alice = subject("user:alice");

    assert_eq!(
        service.permission(&alice, &global(), "kick").await.unwrap(),
        Tristate::Undefined
    );

    service
        .subjects("user")
        .update("alice", |d| d.add_parent(&global(), subject("group:staff")))
        .await
        .unwrap();

    assert_eq!(
        service.permission(&alice, &global(), "kick").await.unwrap(),
        Tristate::True
    );
}

#[tokio::test]
async fn test_promote_and_demote() {
    let (_store, service) = service();
    service
        .ladders()
        .set(
            "staff",
            RankLadder::with_ranks(
                "staff",
                vec![
                    subject("group:helper"),
                    subject("group:mod"),
                    subject("group:admin"),
                ],
            ),
        )
        .await
        .unwrap();
    seed(&service, "group:mod", grant("kick", Tristate::True)).await;

    let promotions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&promotions);
    service
        .subjects("user")
        .add_listener("alice", move |_: &Arc<CalculatedSubject>| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let alice = subject("user:alice");
    let calc = service.promote(&alice, "staff", &global()).await.unwrap();
    assert_eq!(calc.parents(&global()), vec![subject("group:helper")]);

    service.promote(&alice, "staff", &global()).await.unwrap();
    assert_eq!(
        service.permission(&alice, &global(), "kick").await.unwrap(),
        Tristate::True
    );

    service.promote(&alice, "staff", &global()).await.unwrap();
    let top = service.promote(&alice, "staff", &global()).await.unwrap();
    assert_eq!(top.parents(&global()), vec![subject("group:admin")]);
    assert_eq!(promotions.load(Ordering::SeqCst), 3);

    service.demote(&alice, "staff", &global()).await.unwrap();
    service.demote(&alice, "staff", &global()).await.unwrap();
    let bottom = service.demote(&alice, "staff", &global()).await.unwrap();
    assert!(bottom.parents(&global()).is_empty());
}
