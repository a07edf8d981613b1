use uow::{error::Error, Entity, EntityState, Predicate, UnitOfWork, Value};
use uow_test::run_async_test;

#[derive(Debug, Clone, Default, PartialEq, Eq, Entity)]
#[uow(table_name = "product")]
struct Product {
    #[uow(primary_key, auto_increment)]
    pub id: u32,
    #[uow(length = 40)]
    pub name: String,
    pub price: u32,
    pub note: Option<String>,
}

fn product(name: &str, price: u32) -> Product {
    Product {
        id: 0,
        name: name.into(),
        price,
        note: None,
    }
}

/// Saves products priced 10, 20, .. named p1, p2, ..
async fn seed(uow: &UnitOfWork, n: u32) {
    let repo = uow.repository::<Product>().unwrap();
    repo.add_range((1..=n).map(|i| product(&format!("p{}", i), i * 10)))
        .unwrap();
    assert_eq!(uow.save().await.unwrap(), n as u64);
}

fn names(list: &[Product]) -> Vec<&str> {
    list.iter().map(|p| p.name.as_str()).collect()
}

#[tokio::test]
async fn test_filter_and_order() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 5).await;
        let repo = uow.repository::<Product>().unwrap();

        let list = repo
            .filter(Predicate::ge("price", 20))
            .filter(Predicate::lt("price", 50))
            .order_by("price", false)
            .all()
            .await
            .unwrap();
        assert_eq!(names(&list), vec!["p4", "p3", "p2"]);

        let list = repo
            .get(Predicate::eq("name", "p1").or(Predicate::eq("name", "p5")))
            .await
            .unwrap();
        assert_eq!(names(&list), vec!["p1", "p5"]);

        let found = repo
            .find_by(Predicate::like("name", "p%").and(Predicate::gt("price", 30)))
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.name), Some("p4".to_string()));

        assert_eq!(repo.find_by(Predicate::none()).await.unwrap(), None);
        assert_eq!(repo.query().count().await.unwrap(), 5);
        assert_eq!(
            repo.filter(Predicate::in_list("price", vec![10, 30, 70]))
                .count()
                .await
                .unwrap(),
            2
        );
    });
}

#[tokio::test]
async fn test_page() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 23).await;
        let repo = uow.repository::<Product>().unwrap();
        let query = repo.query().order_by("price", true);

        let page = query.page(1, 10).await.unwrap();
        assert_eq!(page.total_count, 23);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].name, "p1");
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_previous());
        assert!(page.has_next());

        let page = query.page(3, 10).await.unwrap();
        assert_eq!(names(&page.items), vec!["p21", "p22", "p23"]);
        assert!(!page.has_next());

        let page = query.page(4, 10).await.unwrap();
        assert_eq!(page.total_count, 23);
        assert!(page.items.is_empty());

        // The total ignores paging but honors the filter
        let page = repo
            .filter(Predicate::le("price", 50))
            .order_by("price", false)
            .page(2, 2)
            .await
            .unwrap();
        assert_eq!(page.total_count, 5);
        assert_eq!(names(&page.items), vec!["p3", "p2"]);

        assert!(matches!(query.page(0, 10).await, Err(Error::Argument(_))));
        assert!(matches!(query.page(1, 0).await, Err(Error::Argument(_))));
    });
}

#[tokio::test]
async fn test_page_out_of_range() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 5).await;
        let query = uow.repository::<Product>().unwrap().query().order_by("id", true);

        for (page_no, page_size) in [
            (u64::MAX, 10),
            (2, u64::MAX),
            (u64::MAX, u64::MAX),
            (3, i64::MAX as u64),
        ] {
            let page = query.page(page_no, page_size).await.unwrap();
            assert_eq!(page.total_count, 5);
            assert!(page.items.is_empty());
        }

        // A huge page size still returns every row of the first page
        for page_size in [u64::MAX, i64::MAX as u64 + 1] {
            let page = query.page(1, page_size).await.unwrap();
            assert_eq!(page.total_count, 5);
            assert_eq!(page.items.len(), 5);
        }
    });
}

#[tokio::test]
async fn test_tracked_query_skips_pending_deletes() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 5).await;
        let repo = uow.repository::<Product>().unwrap();

        // Each call stages the next row, not the one already pending
        assert_eq!(repo.delete_by(Predicate::le("price", 20)).await.unwrap().name, "p1");
        assert_eq!(repo.delete_by(Predicate::le("price", 20)).await.unwrap().name, "p2");
        let res = repo.delete_by(Predicate::le("price", 20)).await;
        assert!(matches!(&res, Err(Error::NotFound(msg)) if msg == "Product Entity was not found"));

        let query = repo.query().order_by("id", true).tracked();
        assert_eq!(query.first().await.unwrap().map(|p| p.name), Some("p3".to_string()));
        assert_eq!(query.count().await.unwrap(), 3);

        let page = query.page(1, 2).await.unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(names(&page.items), vec!["p3", "p4"]);
        let page = query.page(2, 2).await.unwrap();
        assert_eq!(names(&page.items), vec!["p5"]);

        // Untracked reads still see the stored rows
        assert_eq!(repo.query().count().await.unwrap(), 5);

        assert_eq!(uow.save().await.unwrap(), 2);
        assert_eq!(repo.query().count().await.unwrap(), 3);
    });
}

#[tokio::test]
async fn test_projection() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 4).await;
        let repo = uow.repository::<Product>().unwrap();

        let prices = repo
            .filter(Predicate::gt("price", 10))
            .order_by("price", true)
            .select(|p| p.price)
            .all()
            .await
            .unwrap();
        assert_eq!(prices, vec![20, 30, 40]);

        let page = repo
            .query()
            .order_by("name", true)
            .select(|p| format!("{}={}", p.name, p.price))
            .page(2, 3)
            .await
            .unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(page.items, vec!["p4=40".to_string()]);

        let name = repo
            .find_project(Predicate::eq("price", 30), |p| p.name)
            .await
            .unwrap();
        assert_eq!(name, Some("p3".to_string()));
    });
}

#[tokio::test]
async fn test_invalid_query_input() {
    run_async_test!((uow: [Product]) => {
        let repo = uow.repository::<Product>().unwrap();

        let res = repo.query().order_by("price; DROP TABLE product", true).all().await;
        assert!(matches!(res, Err(Error::Argument(_))));

        let res = repo.include("nothing").first().await;
        assert!(matches!(res, Err(Error::Argument(_))));

        // Predicate text is not checked, the store rejects it
        let res = repo.get(Predicate::raw("no_such_column = ?", vec![Value::I32(1)])).await;
        assert!(matches!(res, Err(Error::Database(_))));
    });
}

#[tokio::test]
async fn test_not_found() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 1).await;
        let repo = uow.repository::<Product>().unwrap();

        let err = repo.delete(&9).await.unwrap_err();
        assert!(matches!(&err, Error::NotFound(msg) if msg == "Product Entity was not found"));

        let err = repo.delete_by(Predicate::eq("name", "nope")).await.unwrap_err();
        assert!(matches!(&err, Error::NotFound(msg) if msg == "Product Entity was not found"));

        let err = repo
            .delete_range_by(Predicate::gt("price", 1000))
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::NotFound(msg) if msg == "There was no entity found"));

        let err = repo.update_by_key(&9, &product("x", 1)).await.unwrap_err();
        assert!(err.is_not_found());

        assert!(!uow.has_changes().unwrap());
        assert_eq!(uow.save().await.unwrap(), 0);
    });
}

#[tokio::test]
async fn test_delete_variants() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 5).await;
        let repo = uow.repository::<Product>().unwrap();

        let deleted = repo.delete_by(Predicate::eq("name", "p1")).await.unwrap();
        assert_eq!(deleted.id, 1);
        assert_eq!(repo.delete_range_by(Predicate::ge("price", 40)).await.unwrap(), 2);

        // An empty list stages nothing
        repo.delete_range(&[]).unwrap();

        // A tracked lookup of a pending delete sees nothing
        assert_eq!(repo.find_tracked(&4).await.unwrap(), None);
        assert_eq!(uow.entry_state::<Product>(&4).unwrap(), Some(EntityState::Deleted));

        assert_eq!(uow.save().await.unwrap(), 3);
        let list = repo.query().order_by("id", true).all().await.unwrap();
        assert_eq!(names(&list), vec!["p2", "p3"]);

        repo.delete_range(&list).unwrap();
        assert_eq!(uow.save().await.unwrap(), 2);
        assert_eq!(repo.query().count().await.unwrap(), 0);
    });
}

#[tokio::test]
async fn test_delete_added() {
    run_async_test!((uow: [Product]) => {
        let repo = uow.repository::<Product>().unwrap();
        let added = repo
            .add(Product {
                id: 7,
                ..product("tmp", 1)
            })
            .unwrap();

        repo.delete_entity(&added).unwrap();
        assert!(!uow.has_changes().unwrap());
        assert_eq!(uow.save().await.unwrap(), 0);
    });
}

#[tokio::test]
async fn test_update() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 3).await;
        let repo = uow.repository::<Product>().unwrap();

        let mut p1 = repo.find(&1).await.unwrap().unwrap();
        p1.price = 11;
        p1.note = Some("full".into());
        repo.update(&p1).unwrap();
        assert_eq!(uow.entry_state::<Product>(&1).unwrap(), Some(EntityState::Modified));

        let p2 = Product {
            id: 2,
            ..product("renamed", 22)
        };
        repo.update_except(&p2, &["name"]).unwrap();

        let p3 = Product {
            id: 3,
            note: Some("ignored".into()),
            ..product("p3", 33)
        };
        repo.update_range_except(&[p3], &["note"]).unwrap();

        assert_eq!(uow.save().await.unwrap(), 3);

        let list = repo.query().order_by("id", true).all().await.unwrap();
        assert_eq!(
            list,
            vec![
                Product {
                    id: 1,
                    name: "p1".into(),
                    price: 11,
                    note: Some("full".into()),
                },
                Product {
                    id: 2,
                    name: "p2".into(),
                    price: 22,
                    note: None,
                },
                Product {
                    id: 3,
                    name: "p3".into(),
                    price: 33,
                    note: None,
                },
            ]
        );
    });
}

#[tokio::test]
async fn test_update_by_key() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 2).await;
        let repo = uow.repository::<Product>().unwrap();

        // Only the changed column is written, the key of the value is ignored
        repo.update_by_key(&1, &Product {
            id: 99,
            ..product("p1", 15)
        })
        .await
        .unwrap();
        assert_eq!(uow.entry_state::<Product>(&1).unwrap(), Some(EntityState::Modified));

        repo.update_by_key_except(&2, &product("changed", 25), &["name"])
            .await
            .unwrap();

        let err = repo
            .update_by_key_except(&2, &product("x", 1), &["nope"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Argument(_)));

        assert_eq!(uow.save().await.unwrap(), 2);
        assert_eq!(repo.find(&1).await.unwrap().unwrap().price, 15);
        assert_eq!(
            repo.find(&2).await.unwrap(),
            Some(Product {
                id: 2,
                ..product("p2", 25)
            })
        );
    });
}

#[tokio::test]
async fn test_identity_map() {
    run_async_test!((uow: [Product]) => {
        seed(&uow, 2).await;
        let repo = uow.repository::<Product>().unwrap();

        let mut p1 = repo.find_tracked(&1).await.unwrap().unwrap();
        p1.price = 1000;
        repo.update(&p1).unwrap();

        // Tracked reads see the staged value, untracked reads the stored one
        assert_eq!(repo.find_tracked(&1).await.unwrap().unwrap().price, 1000);
        assert_eq!(repo.find(&1).await.unwrap().unwrap().price, 10);

        let tracked = repo.query().tracked().order_by("id", true).all().await.unwrap();
        assert_eq!(tracked.iter().map(|p| p.price).collect::<Vec<_>>(), vec![1000, 20]);
        assert_eq!(uow.entry_state::<Product>(&2).unwrap(), Some(EntityState::Unchanged));

        let by = repo
            .find_by_tracked(Predicate::eq("name", "p1"))
            .await
            .unwrap();
        assert_eq!(by.map(|p| p.price), Some(1000));
    });
}

#[tokio::test]
async fn test_repository_cache() {
    run_async_test!((uow: [Product]) => {
        let a = uow.repository::<Product>().unwrap();
        let b = uow.repository::<Product>().unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    });
}
