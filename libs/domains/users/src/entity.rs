use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::User;

/// Sea-ORM Entity for the users table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            email: model.email,
        }
    }
}

// A missing id leaves the column unset so the database assigns it
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        ActiveModel {
            id: user.id.map_or(NotSet, Set),
            name: Set(user.name),
            email: Set(user.email),
        }
    }
}
