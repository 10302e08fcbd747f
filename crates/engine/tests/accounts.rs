mod common;

use common::{category, day, engine_with_db, engine_with_users, units};
use engine::{
    EngineError, NewPlanCmd, NewTransactionCmd, NewUserCmd, ProfilePatch, TransactionListFilter,
};

fn defaults() -> Vec<String> {
    [
        "Entertainment",
        "Food",
        "Transportation",
        "Investment",
        "Salary",
        "Gift",
        "Clothing",
        "Health",
        "Bills",
        "Shopping",
        "Bonus",
        "Other",
    ]
    .map(String::from)
    .to_vec()
}

#[tokio::test]
async fn registration_seeds_defaults_once() {
    let (engine, _db) = engine_with_db().await;

    let user = engine
        .register_user(NewUserCmd::new("alice", "secret").name("Alice"), &defaults())
        .await
        .unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.name.as_deref(), Some("Alice"));

    let categories = engine.list_categories("alice", None).await.unwrap();
    assert_eq!(categories.len(), defaults().len());

    let again = engine
        .seed_default_categories("alice", &defaults())
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(
        engine.list_categories("alice", None).await.unwrap().len(),
        defaults().len()
    );
}

#[tokio::test]
async fn registration_rejects_bad_or_taken_credentials() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .register_user(NewUserCmd::new("  ", "secret"), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));

    let err = engine
        .register_user(NewUserCmd::new("alice", ""), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));

    engine
        .register_user(NewUserCmd::new("alice", "secret"), &defaults())
        .await
        .unwrap();
    let err = engine
        .register_user(NewUserCmd::new("alice", "other"), &defaults())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
    assert_eq!(
        engine.list_categories("alice", None).await.unwrap().len(),
        defaults().len()
    );
}

#[tokio::test]
async fn authenticate_checks_password() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register_user(NewUserCmd::new("alice", "secret"), &[])
        .await
        .unwrap();

    let user = engine.authenticate("alice", "secret").await.unwrap();
    assert_eq!(user.username, "alice");

    for (username, password) in [("alice", "secre"), ("alice", "secret!"), ("mallory", "secret")] {
        let err = engine.authenticate(username, password).await.unwrap_err();
        assert_eq!(err, EngineError::Unauthorized);
    }
}

#[tokio::test]
async fn update_profile_sets_and_clears_name() {
    let (engine, _db) = engine_with_users().await;

    let user = engine
        .update_profile("alice", ProfilePatch::default().name(Some("  Alice  ".into())))
        .await
        .unwrap();
    assert_eq!(user.name.as_deref(), Some("Alice"));
    assert_eq!(engine.profile("alice").await.unwrap().name.as_deref(), Some("Alice"));
    assert_eq!(engine.profile("bob").await.unwrap().name, None);

    let unchanged = engine
        .update_profile("alice", ProfilePatch::default())
        .await
        .unwrap();
    assert_eq!(unchanged.name.as_deref(), Some("Alice"));

    let cleared = engine
        .update_profile("alice", ProfilePatch::default().name(None))
        .await
        .unwrap();
    assert_eq!(cleared.name, None);

    let err = engine
        .update_profile("carol", ProfilePatch::default().name(Some("Carol".into())))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn delete_account_removes_only_owned_rows() {
    let (engine, _db) = engine_with_users().await;
    for owner in ["alice", "bob"] {
        let food = category(&engine, owner, "Food").await;
        engine
            .create_plan(NewPlanCmd::new(owner, food, units(100)))
            .await
            .unwrap();
        engine
            .create_transaction(NewTransactionCmd::expense(owner, food, units(10), day(4)))
            .await
            .unwrap();
    }

    engine.delete_account("alice").await.unwrap();

    let err = engine.profile("alice").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(engine.list_categories("alice", None).await.unwrap().is_empty());
    assert!(engine.list_plans("alice").await.unwrap().is_empty());
    assert!(
        engine
            .list_transactions("alice", &TransactionListFilter::default())
            .await
            .unwrap()
            .is_empty()
    );

    assert_eq!(engine.profile("bob").await.unwrap().username, "bob");
    assert_eq!(engine.list_categories("bob", None).await.unwrap().len(), 1);
    let bob_plans = engine.list_plans("bob").await.unwrap();
    assert_eq!(bob_plans.len(), 1);
    assert_eq!(bob_plans[0].remaining, units(90));
    assert_eq!(
        engine
            .list_transactions("bob", &TransactionListFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );

    let err = engine.delete_account("alice").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn username_can_be_reused_after_deletion() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register_user(NewUserCmd::new("alice", "secret"), &defaults())
        .await
        .unwrap();
    engine.delete_account("alice").await.unwrap();

    engine
        .register_user(NewUserCmd::new("alice", "fresh"), &defaults())
        .await
        .unwrap();
    assert_eq!(
        engine.list_categories("alice", None).await.unwrap().len(),
        defaults().len()
    );
    assert!(engine.authenticate("alice", "secret").await.is_err());
}
