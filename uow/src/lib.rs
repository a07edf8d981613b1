extern crate self as uow;

mod builder;
mod entity;
mod executor;
mod history;
mod mapper;
mod options;
mod page;
mod predicate;
mod repository;
mod tracker;
mod unit_of_work;

pub use async_trait::async_trait;
pub use uow_error as error;
pub use uow_macro::Entity;
pub use uow_query as query;

pub use uow_conn::{
    ColumnInfo, ColumnType, Connection, Execution, FromValue, IndexInfo, IndexKeyInfo, Row,
    TableInfo, ToValue, Transaction, Value,
};

pub use entity::{fetch_related, Entity, Field};
pub use executor::QueryExecutor;
pub use history::AutoHistory;
pub use mapper::EntityMapper;
pub use options::{MaterializePolicy, SessionOptions};
pub use page::Page;
pub use predicate::Predicate;
pub use repository::{Projection, Query, Repository};
pub use tracker::EntityState;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};

pub(crate) use builder::ToSqlParamPair;
