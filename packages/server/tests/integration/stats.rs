use serde_json::json;

use crate::common::{TestApp, routes};

mod overview {
    use super::*;

    #[tokio::test]
    async fn students_cannot_read_statistics() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;

        let res = app.get_with_token(routes::STATS_OVERVIEW, &student.token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn overview_merges_counts_from_both_stores() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;
        let advisor = app.create_advisor("a1", &admin).await;
        app.assign_advisor(&student.profile_id, &advisor.profile_id, &admin)
            .await;

        // One draft, one submitted, one verified.
        app.create_achievement(&student.token, "draft one").await;
        let submitted = app.create_achievement(&student.token, "pending one").await;
        app.submit_achievement(&student.token, &submitted).await;
        let verified = app.create_achievement(&student.token, "done one").await;
        app.submit_achievement(&student.token, &verified).await;
        let res = app
            .post_with_token(
                &routes::achievement_verify(&verified),
                &json!({}),
                &advisor.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_with_token(routes::STATS_OVERVIEW, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let histogram = res.body["statusHistogram"].as_array().unwrap();
        let count_for = |status: &str| {
            histogram
                .iter()
                .find(|row| row["status"] == status)
                .map(|row| row["count"].as_u64().unwrap())
                .unwrap_or(0)
        };
        assert_eq!(count_for("draft"), 1);
        assert_eq!(count_for("submitted"), 1);
        assert_eq!(count_for("verified"), 1);

        // Two submissions happened this month.
        let monthly = res.body["monthlySubmissions"].as_array().unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0]["count"], 2);

        // Document-side distributions.
        let by_type = res.body["byType"].as_array().unwrap();
        assert_eq!(by_type[0]["key"], "competition");
        assert_eq!(by_type[0]["count"], 3);

        let by_year = res.body["byEventYear"].as_array().unwrap();
        assert_eq!(by_year[0]["key"], "2025");
        assert_eq!(by_year[0]["count"], 3);

        let by_level = res.body["byCompetitionLevel"].as_array().unwrap();
        assert_eq!(by_level[0]["key"], "regional");

        // Leaderboard counts verified records only.
        let top = res.body["topStudents"].as_array().unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0]["studentId"], student.profile_id);
        assert_eq!(top[0]["count"], 1);
    }

    #[tokio::test]
    async fn advisors_can_read_statistics() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let advisor = app.create_advisor("a1", &admin).await;

        let res = app.get_with_token(routes::STATS_OVERVIEW, &advisor.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["statusHistogram"].as_array().unwrap().is_empty());
    }
}

mod alerts {
    use super::*;

    #[tokio::test]
    async fn only_admins_list_integrity_alerts() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;

        let res = app.get_with_token(routes::ALERTS, &student.token).await;
        assert_eq!(res.status, 403);

        let res = app.get_with_token(routes::ALERTS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"].as_array().unwrap().is_empty());
        assert_eq!(res.body["pagination"]["total"], 0);
    }
}
