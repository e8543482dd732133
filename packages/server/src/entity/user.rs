use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub full_name: String,

    /// Role name; one per user.
    pub role: String,

    #[sea_orm(has_one)]
    pub student_profile: HasOne<super::student_profile::Entity>,

    #[sea_orm(has_one)]
    pub advisor_profile: HasOne<super::advisor_profile::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
