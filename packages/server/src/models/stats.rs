use common::AchievementStatus;
use common::store::{KeyCount, MonthCount, StatusCount, StudentVerifiedCount};
use serde::Serialize;
use uuid::Uuid;

use crate::stats::StatsOverview;

#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusCountBody {
    pub status: AchievementStatus,
    #[schema(example = 17)]
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MonthCountBody {
    /// `YYYY-MM` bucket.
    #[schema(example = "2025-09")]
    pub month: String,
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopStudentBody {
    pub student_id: Uuid,
    /// Verified achievements.
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct KeyCountBody {
    #[schema(example = "competition")]
    pub key: String,
    pub count: u64,
}

/// The merged statistics response.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverviewResponse {
    pub status_histogram: Vec<StatusCountBody>,
    pub monthly_submissions: Vec<MonthCountBody>,
    pub top_students: Vec<TopStudentBody>,
    pub by_type: Vec<KeyCountBody>,
    pub by_event_year: Vec<KeyCountBody>,
    pub by_competition_level: Vec<KeyCountBody>,
}

impl From<StatsOverview> for StatsOverviewResponse {
    fn from(overview: StatsOverview) -> Self {
        Self {
            status_histogram: overview
                .status_histogram
                .into_iter()
                .map(|StatusCount { status, count }| StatusCountBody { status, count })
                .collect(),
            monthly_submissions: overview
                .monthly_submissions
                .into_iter()
                .map(|MonthCount { month, count }| MonthCountBody { month, count })
                .collect(),
            top_students: overview
                .top_students
                .into_iter()
                .map(
                    |StudentVerifiedCount { student_id, count }| TopStudentBody {
                        student_id,
                        count,
                    },
                )
                .collect(),
            by_type: key_counts(overview.by_type),
            by_event_year: key_counts(overview.by_event_year),
            by_competition_level: key_counts(overview.by_competition_level),
        }
    }
}

fn key_counts(rows: Vec<KeyCount>) -> Vec<KeyCountBody> {
    rows.into_iter()
        .map(|KeyCount { key, count }| KeyCountBody { key, count })
        .collect()
}
