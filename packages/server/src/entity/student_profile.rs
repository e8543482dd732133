use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(unique)]
    pub student_number: String,
    pub program: String,
    pub year: i32,

    /// Assigned advisor; NULL until an admin maps one.
    #[sea_orm(indexed)]
    pub advisor_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "advisor_id", to = "id")]
    pub advisor: BelongsTo<Option<super::advisor_profile::Entity>>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
