use uow::{error::Error, Entity, Predicate, UnitOfWork};
use uow_test::run_async_test;

#[derive(Debug, PartialEq, Eq, Entity)]
#[uow(table_name = "user")]
struct User {
    #[uow(primary_key, auto_increment)]
    pub id: u32,
    #[uow(length = 20, default = "NONAME")]
    pub name: String,
    #[uow(relation = id > user_id)]
    pub avatar: Option<Avatar>,
    #[uow(relation = id > user_id)]
    pub address: Vec<Address>,
    #[uow(relation = id > user_id)]
    pub extra: Option<Extra>,
}

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[uow(index = [user_id])]
struct Avatar {
    #[uow(primary_key)]
    pub id: u32,
    pub user_id: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[uow(index = [user_id])]
struct Address {
    #[uow(primary_key)]
    pub id: u32,
    pub user_id: u32,
    pub city: String,
    pub street: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Entity)]
#[uow(index = [user_id])]
struct Extra {
    #[uow(primary_key)]
    pub id: u32,
    pub user_id: u32,
    pub height: u32,
}

fn user(name: &str) -> User {
    User {
        id: 0,
        name: name.into(),
        avatar: None,
        address: vec![],
        extra: None,
    }
}

fn address(id: u32, city: &str) -> Address {
    Address {
        id,
        user_id: 1,
        city: city.into(),
        street: city.into(),
    }
}

async fn seed(uow: &UnitOfWork) {
    uow.repository::<User>()
        .unwrap()
        .add_range(vec![user("user1"), user("user2")])
        .unwrap();
    uow.repository::<Avatar>()
        .unwrap()
        .add(Avatar {
            id: 1,
            user_id: 1,
            url: "xxx".into(),
        })
        .unwrap();
    uow.repository::<Address>()
        .unwrap()
        .add_range(vec![address(1, "a"), address(2, "b")])
        .unwrap();

    assert_eq!(uow.save().await.unwrap(), 5);
}

#[tokio::test]
async fn test_relations_load_on_include() {
    run_async_test!((uow: [User, Avatar, Address, Extra]) => {
        seed(&uow).await;
        let repo = uow.repository::<User>().unwrap();

        // Relations stay empty without include
        let plain = repo.find(&1).await.unwrap().unwrap();
        assert_eq!(plain.avatar, None);
        assert!(plain.address.is_empty());

        let list = repo
            .include("avatar")
            .include("address")
            .include("extra")
            .order_by("id", true)
            .all()
            .await
            .unwrap();
        assert_eq!(
            list,
            vec![
                User {
                    id: 1,
                    name: "user1".into(),
                    avatar: Some(Avatar {
                        id: 1,
                        user_id: 1,
                        url: "xxx".into(),
                    }),
                    address: vec![address(1, "a"), address(2, "b")],
                    extra: None,
                },
                User {
                    id: 2,
                    ..user("user2")
                },
            ]
        );
    });
}

#[tokio::test]
async fn test_include_after_change() {
    run_async_test!((uow: [User, Avatar, Address, Extra]) => {
        seed(&uow).await;
        let users = uow.repository::<User>().unwrap();
        let addresses = uow.repository::<Address>().unwrap();

        addresses.delete(&1).await.unwrap();
        uow.repository::<Extra>()
            .unwrap()
            .add(Extra {
                id: 1,
                user_id: 1,
                height: 100,
            })
            .unwrap();
        assert_eq!(uow.save().await.unwrap(), 2);

        let found = users
            .filter(Predicate::eq("name", "user1"))
            .include("address")
            .include("extra")
            .tracked()
            .first()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.address, vec![address(2, "b")]);
        assert_eq!(
            found.extra,
            Some(Extra {
                id: 1,
                user_id: 1,
                height: 100,
            })
        );
        assert_eq!(found.avatar, None);
    });
}

#[tokio::test]
async fn test_unknown_relation() {
    run_async_test!((uow: [User]) => {
        let repo = uow.repository::<User>().unwrap();
        assert_eq!(User::RELATIONS, &["avatar", "address", "extra"]);
        assert_eq!(User::COLUMNS, &["id", "name"]);

        let res = repo.include("id").all().await;
        assert!(matches!(res, Err(Error::Argument(_))));
    });
}
