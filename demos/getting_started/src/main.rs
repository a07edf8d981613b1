use serde::Serialize;
use uow::{error::Result, Entity, Predicate, UnitOfWork, UnitOfWorkFactory, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Entity)]
#[uow(table_name = "user")]
struct User {
    #[uow(primary_key, auto_increment)]
    pub id: u32,
    #[uow(length = 64)]
    pub name: String,
}

#[derive(Debug, Serialize)]
struct UserName {
    name: String,
}

fn user(name: &str) -> User {
    User {
        id: 0,
        name: name.into(),
    }
}

/// Filtered projection rendered as a JSON body. Any failure becomes status
/// 400 with the error message as the body.
async fn get_values(uow: &UnitOfWork, filter: &str, params: Vec<Value>) -> (u16, String) {
    let result = async {
        let list = uow
            .executor()?
            .exec_filter_project::<User, _, _>(filter, |u| UserName { name: u.name }, params)
            .await?;

        serde_json::to_string(&list).map_err(|e| uow::error::runtime!("Json error: {}", e))
    }
    .await;

    match result {
        Ok(body) => (200, body),
        Err(e) => (400, serde_json::json!(e.to_string()).to_string()),
    }
}

async fn walkthrough(factory: &UnitOfWorkFactory) -> Result<()> {
    let uow = factory.create();
    uow.ensure_created::<User>().await?;
    let repo = uow.repository::<User>()?;

    // Stage two inserts and save them together
    repo.add(user("bob"))?;
    repo.add(user("alice"))?;
    assert_eq!(uow.save().await?, 2);

    // Find bob by id
    assert_eq!(
        repo.find(&1).await?,
        Some(User {
            id: 1,
            name: "bob".into(),
        })
    );

    // Find alice by name
    assert_eq!(
        repo.find_by(Predicate::eq("name", "alice")).await?,
        Some(User {
            id: 2,
            name: "alice".into(),
        })
    );

    // Delete bob, rename alice
    repo.delete(&1).await?;
    repo.update_by_key(&2, &user("alex")).await?;
    assert_eq!(uow.save().await?, 2);
    assert_eq!(
        repo.query().all().await?,
        vec![User {
            id: 2,
            name: "alex".into(),
        }]
    );

    // Add many, then page through them newest first
    repo.add_range([user("carl"), user("lee")])?;
    uow.save().await?;
    let page = repo.query().order_by("id", false).page(1, 2).await?;
    assert_eq!(page.total_count, 3);
    assert_eq!(
        page.items.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        vec!["lee", "carl"]
    );

    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let factory = UnitOfWorkFactory::connect("sqlite://memory").await?;
    walkthrough(&factory).await?;

    let uow = factory.create();
    let (status, body) = get_values(&uow, "name = ?", vec![Value::Str("alex".into())]).await;
    println!("{} {}", status, body);
    assert_eq!((status, body.as_str()), (200, r#"[{"name":"alex"}]"#));

    let (status, body) = get_values(&uow, "name == ", vec![]).await;
    println!("{} {}", status, body);
    assert_eq!(status, 400);

    Ok(())
}
