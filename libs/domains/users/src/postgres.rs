use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::{BoxStream, StreamExt};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::User,
    repository::UserRepository,
};

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    fn find_all(&self) -> BoxStream<'static, UserResult<User>> {
        let db = self.db.clone();

        let stream = async_stream::try_stream! {
            let mut rows = entity::Entity::find()
                .order_by_asc(entity::Column::Id)
                .stream(&db)
                .await?;

            while let Some(model) = rows.try_next().await? {
                yield User::from(model);
            }
        };

        stream.boxed()
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn save(&self, user: User) -> UserResult<User> {
        let email = user.email.clone();
        let is_new = user.id.is_none();
        let active_model: entity::ActiveModel = user.into();

        let model = if is_new {
            active_model.insert(&self.db).await
        } else {
            active_model.update(&self.db).await
        }
        .map_err(|e| UserError::from_insert(e, &email))?;

        Ok(model.into())
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<()> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;
        tracing::debug!(user_id = id, rows_affected = result.rows_affected, "Deleted user");
        Ok(())
    }
}
