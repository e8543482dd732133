use common::store::{
    DetailStore, KeyCount, MonthCount, ReferenceStore, StatusCount, StoreResult,
    StudentVerifiedCount,
};

use crate::error::AppError;

/// Months covered by the submission trend.
const TREND_MONTHS: u32 = 12;
/// Size of the top-verified-students leaderboard.
const TOP_STUDENTS: u64 = 5;

/// The composite statistics response, merged from parallel sub-queries over
/// both stores.
pub struct StatsOverview {
    pub status_histogram: Vec<StatusCount>,
    pub monthly_submissions: Vec<MonthCount>,
    pub top_students: Vec<StudentVerifiedCount>,
    pub by_type: Vec<KeyCount>,
    pub by_event_year: Vec<KeyCount>,
    pub by_competition_level: Vec<KeyCount>,
}

/// Fan out all six sub-queries concurrently and merge. Any sub-query failure
/// fails the composite, naming the sub-query.
pub async fn overview(
    references: &dyn ReferenceStore,
    details: &dyn DetailStore,
) -> Result<StatsOverview, AppError> {
    let (histogram, monthly, top, by_type, by_year, by_level) = tokio::join!(
        references.count_by_status(),
        references.monthly_submissions(TREND_MONTHS),
        references.top_verified_students(TOP_STUDENTS),
        details.count_by_type(),
        details.count_by_event_year(),
        details.count_by_competition_level(),
    );

    Ok(StatsOverview {
        status_histogram: sub_query("status_histogram", histogram)?,
        monthly_submissions: sub_query("monthly_submissions", monthly)?,
        top_students: sub_query("top_verified_students", top)?,
        by_type: sub_query("distribution_by_type", by_type)?,
        by_event_year: sub_query("distribution_by_event_year", by_year)?,
        by_competition_level: sub_query("distribution_by_competition_level", by_level)?,
    })
}

fn sub_query<T>(query: &'static str, result: StoreResult<T>) -> Result<T, AppError> {
    result.map_err(|e| {
        tracing::error!(query, error = %e, "Statistics sub-query failed");
        AppError::PartialAggregation { query }
    })
}
