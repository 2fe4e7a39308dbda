//! fluent-orm
//!
//! A small ORM convenience layer over MySQL: table and index definitions,
//! parameterized single-row CRUD, and bulk writes that commit or roll back as
//! a unit.
//!
//! ```no_run
//! use fluent_orm::{EntityFields, FieldDefinition, Orm, OrmConfig, SqlType, Values};
//!
//! # async fn demo() -> fluent_orm::OrmResult<()> {
//! let orm = Orm::connect(OrmConfig::new("localhost", "app", "secret", "shop")).await?;
//! let fields = EntityFields::new()
//!     .with("name", FieldDefinition::new(SqlType::Varchar).size(100))
//!     .with("age", FieldDefinition::new(SqlType::Int).nullable());
//! let users: fluent_orm::EntityModel = orm.define("users", fields).await?;
//! users.create(&Values::new().with("name", "Ada").with("age", 36)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod models;
pub mod orm;
pub mod sql;

pub use config::OrmConfig;
pub use db::{Connection, ConnectionProvider, MySqlProvider, TransactionInfo};
pub use error::{OrmError, OrmResult};
pub use model::EntityModel;
pub use models::{
    ConditionMap, EntityFields, ExecOutcome, FieldDefinition, FindOptions, JoinSpec, JoinType,
    Nullability, Row, SortOrder, SqlType, SqlValue, Statement, Values,
};
pub use orm::Orm;
