use uow::{Connection, UnitOfWork, UnitOfWorkFactory};

/// Fresh in-memory database
pub async fn connect() -> Connection {
    env_logger::try_init().ok();

    Connection::connect("sqlite://memory").await.unwrap()
}

pub async fn factory() -> UnitOfWorkFactory {
    UnitOfWorkFactory::new(connect().await)
}

pub async fn unit_of_work() -> UnitOfWork {
    UnitOfWork::new(connect().await)
}

/// Run `body` with a unit of work over a fresh in-memory database whose
/// tables for the listed entities are already created
///
/// ```ignore
/// run_async_test!((uow: [User, Post]) => {
///     let repo = uow.repository::<User>().unwrap();
///     ...
/// });
/// ```
#[macro_export]
macro_rules! run_async_test {
    (($uow:ident : [$($entity:ty),* $(,)?]) => $body:block) => {{
        let $uow = $crate::unit_of_work().await;
        $(
            $uow.ensure_created::<$entity>().await.unwrap();
        )*

        $body
    }};
}
