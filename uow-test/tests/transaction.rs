use uow::{AutoHistory, Entity, EntityState, Predicate, UnitOfWork};
use uow_test::{connect, factory};

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[uow(table_name = "account")]
struct Account {
    #[uow(primary_key)]
    pub id: u32,
    #[uow(length = 20, unique)]
    pub owner: String,
    pub balance: i64,
}

fn account(id: u32, owner: &str, balance: i64) -> Account {
    Account {
        id,
        owner: owner.into(),
        balance,
    }
}

async fn session() -> UnitOfWork {
    let uow = UnitOfWork::new(connect().await);
    uow.ensure_created::<Account>().await.unwrap();
    uow
}

async fn count(uow: &UnitOfWork) -> u64 {
    uow.repository::<Account>()
        .unwrap()
        .query()
        .count()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_save_changes_across_connections() {
    let main = session().await;
    let other = session().await;

    main.repository::<Account>()
        .unwrap()
        .add(account(1, "bob", 10))
        .unwrap();
    other
        .repository::<Account>()
        .unwrap()
        .add(account(1, "alice", 20))
        .unwrap();

    assert_eq!(main.save_changes(false, &[&other]).await.unwrap(), 2);
    assert_eq!(count(&main).await, 1);
    assert_eq!(count(&other).await, 1);
    assert!(!main.has_changes().unwrap());
    assert!(!other.has_changes().unwrap());
    assert_eq!(
        other.entry_state::<Account>(&1).unwrap(),
        Some(EntityState::Unchanged)
    );
}

#[tokio::test]
async fn test_failing_secondary_rolls_back_all() {
    let main = session().await;
    let other = session().await;

    other
        .repository::<Account>()
        .unwrap()
        .add(account(1, "alice", 20))
        .unwrap();

    // Duplicate owner, the insert fails after the other session was written
    let repo = main.repository::<Account>().unwrap();
    repo.add(account(1, "bob", 10)).unwrap();
    repo.add(account(2, "bob", 10)).unwrap();

    assert!(main.save_changes(false, &[&other]).await.is_err());
    assert_eq!(count(&main).await, 0);
    assert_eq!(count(&other).await, 0);

    // Nothing was accepted, both sessions still hold their changes
    assert!(main.has_changes().unwrap());
    assert!(other.has_changes().unwrap());

    // The connections are usable again
    repo.delete_entity(&account(2, "bob", 10)).unwrap();
    assert_eq!(main.save_changes(false, &[&other]).await.unwrap(), 2);
    assert_eq!(count(&other).await, 1);
}

#[tokio::test]
async fn test_save_changes_shared_connection() {
    let factory = factory().await;
    let main = factory.create();
    let other = factory.create();
    main.ensure_created::<Account>().await.unwrap();

    other
        .repository::<Account>()
        .unwrap()
        .add(account(1, "alice", 20))
        .unwrap();
    main.repository::<Account>()
        .unwrap()
        .add(account(2, "alice", 30))
        .unwrap();

    // One connection is enlisted once, the failure undoes both sessions
    assert!(main.save_changes(false, &[&other, &other]).await.is_err());
    assert_eq!(count(&main).await, 0);

    main.repository::<Account>()
        .unwrap()
        .update(&account(2, "carol", 30))
        .unwrap();
    assert_eq!(main.save_changes(false, &[&other, &main]).await.unwrap(), 2);
    assert_eq!(count(&main).await, 2);
}

#[tokio::test]
async fn test_sibling_save_waits_for_scope() {
    let factory = factory().await;
    let sibling = factory.create();
    sibling.ensure_created::<Account>().await.unwrap();
    let repo = sibling.repository::<Account>().unwrap();

    for round in 0..20u32 {
        let failing = factory.create();
        let owner = format!("dup{}", round);
        let accounts = failing.repository::<Account>().unwrap();
        accounts.add(account(round * 10 + 1, &owner, 0)).unwrap();
        accounts.add(account(round * 10 + 2, &owner, 0)).unwrap();

        repo.add(account(round * 10 + 5, &format!("ok{}", round), 1))
            .unwrap();

        // The sibling is not written into the scope that is rolled back
        let (failed, saved) = tokio::join!(failing.save_changes(false, &[]), sibling.save());
        assert!(failed.is_err());
        assert_eq!(saved.unwrap(), 1);
    }

    assert_eq!(count(&sibling).await, 20);
    assert!(!sibling.has_changes().unwrap());
}

#[tokio::test]
async fn test_auto_history() {
    let uow = session().await;
    uow.ensure_created::<AutoHistory>().await.unwrap();
    let repo = uow.repository::<Account>().unwrap();

    repo.add_range(vec![account(1, "bob", 10), account(2, "alice", 20)])
        .unwrap();
    // Added entities are not recorded
    assert_eq!(uow.save_changes(true, &[]).await.unwrap(), 2);

    repo.update_by_key(&1, &account(1, "bob", 15)).await.unwrap();
    repo.delete(&2).await.unwrap();
    // Two changes plus their history rows
    assert_eq!(uow.save_changes(true, &[]).await.unwrap(), 4);

    let history = uow
        .repository::<AutoHistory>()
        .unwrap()
        .query()
        .order_by("id", true)
        .all()
        .await
        .unwrap();
    assert_eq!(history.len(), 2);

    assert_eq!(history[0].table_name, "account");
    assert_eq!(history[0].row_id, "1");
    assert_eq!(history[0].kind, "Modified");
    let changed: serde_json::Value = serde_json::from_str(&history[0].changed).unwrap();
    assert_eq!(
        changed,
        serde_json::json!({
            "before": { "balance": 10 },
            "after": { "balance": 15 },
        })
    );

    assert_eq!(history[1].row_id, "2");
    assert_eq!(history[1].kind, "Deleted");
    let changed: serde_json::Value = serde_json::from_str(&history[1].changed).unwrap();
    assert_eq!(changed["owner"], "alice");
    assert_eq!(changed["balance"], 20);
    assert!(history[1].created > 0);

    // Plain saves write no history
    repo.update(&account(1, "bob", 0)).unwrap();
    assert_eq!(uow.save().await.unwrap(), 1);
    assert_eq!(
        uow.repository::<AutoHistory>()
            .unwrap()
            .filter(Predicate::eq("table_name", "account"))
            .count()
            .await
            .unwrap(),
        2
    );
}
