use serde_json::json;

use crate::common::{TestApp, routes};

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn student_creates_submits_and_advisor_verifies() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;
        let advisor = app.create_advisor("a1", &admin).await;
        app.assign_advisor(&student.profile_id, &advisor.profile_id, &admin)
            .await;

        // Create: draft, no workflow timestamps yet, nulls preserved.
        let res = app
            .post_with_token(
                routes::ACHIEVEMENTS,
                &json!({
                    "type": "competition",
                    "title": "Regional Coding 2025",
                    "details": {
                        "eventDate": "2025-09-01",
                        "competitionLevel": "regional",
                        "rank": 1,
                    },
                }),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "draft");
        assert_eq!(res.body["studentId"], student.profile_id);
        assert_eq!(res.body["title"], "Regional Coding 2025");
        assert_eq!(res.body["details"]["competitionLevel"], "regional");
        assert!(res.body["submittedAt"].is_null());
        assert!(res.body["verifiedAt"].is_null());
        assert!(res.body["verifiedBy"].is_null());
        let id = res.id();

        // Submit.
        let res = app
            .post_with_token(&routes::achievement_submit(&id), &json!({}), &student.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "submitted");
        assert!(res.body["submittedAt"].is_string());
        assert!(res.body["verifiedAt"].is_null());

        // Verify by the assigned advisor.
        let res = app
            .post_with_token(&routes::achievement_verify(&id), &json!({}), &advisor.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "verified");
        assert_eq!(res.body["verifiedBy"], advisor.profile_id);
        assert!(res.body["verifiedAt"].is_string());
    }

    #[tokio::test]
    async fn create_then_read_roundtrips_the_payload() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;

        let id = app.create_achievement(&student.token, "Roundtrip").await;

        let res = app
            .get_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["type"], "competition");
        assert_eq!(res.body["title"], "Roundtrip");
        assert_eq!(res.body["tags"], json!(["coding"]));
        assert_eq!(res.body["points"], 10);
        assert_eq!(res.body["details"]["eventDate"], "2025-09-01");
        assert_eq!(res.body["details"]["rank"], 1);
        assert_eq!(res.body["attachments"], json!([]));
    }

    #[tokio::test]
    async fn resubmitting_a_submitted_achievement_is_invalid_state() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "Once").await;
        app.submit_achievement(&student.token, &id).await;

        let res = app
            .post_with_token(&routes::achievement_submit(&id), &json!({}), &student.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn rejection_requires_a_note_and_is_terminal() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;
        let advisor = app.create_advisor("a1", &admin).await;
        app.assign_advisor(&student.profile_id, &advisor.profile_id, &admin)
            .await;

        let id = app.create_achievement(&student.token, "Rejectable").await;
        app.submit_achievement(&student.token, &id).await;

        // Empty note fails validation and leaves the status untouched.
        let res = app
            .post_with_token(
                &routes::achievement_reject(&id),
                &json!({"rejectionNote": ""}),
                &advisor.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let unchanged = app
            .get_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(unchanged.body["status"], "submitted");

        // A real note lands.
        let res = app
            .post_with_token(
                &routes::achievement_reject(&id),
                &json!({"rejectionNote": "Certificate scan is unreadable"}),
                &advisor.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "rejected");
        assert_eq!(res.body["rejectionNote"], "Certificate scan is unreadable");
        assert_eq!(res.body["verifiedBy"], advisor.profile_id);

        // Rejected is terminal; no resubmission path.
        let res = app
            .post_with_token(&routes::achievement_submit(&id), &json!({}), &student.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_STATE");
    }
}

mod authorization {
    use super::*;

    #[tokio::test]
    async fn an_unrelated_advisor_cannot_verify() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;
        let their_advisor = app.create_advisor("a1", &admin).await;
        let other_advisor = app.create_advisor("a2", &admin).await;
        app.assign_advisor(&student.profile_id, &their_advisor.profile_id, &admin)
            .await;

        let id = app.create_achievement(&student.token, "Guarded").await;
        app.submit_achievement(&student.token, &id).await;

        let res = app
            .post_with_token(
                &routes::achievement_verify(&id),
                &json!({}),
                &other_advisor.token,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        // The record is unchanged.
        let unchanged = app
            .get_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(unchanged.body["status"], "submitted");
        assert!(unchanged.body["verifiedBy"].is_null());
    }

    #[tokio::test]
    async fn students_cannot_read_each_others_records() {
        let app = TestApp::spawn().await;
        let owner = app.create_student("s1").await;
        let other = app.create_student("s2").await;

        let id = app.create_achievement(&owner.token, "Private").await;

        let res = app.get_with_token(&routes::achievement(&id), &other.token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn reading_a_nonexistent_achievement_is_not_found() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;

        let res = app
            .get_with_token(
                &routes::achievement("00000000-0000-4000-8000-000000000000"),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_after_submit_is_forbidden_but_admin_forces_it() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;

        let id = app.create_achievement(&student.token, "Doomed").await;
        app.submit_achievement(&student.token, &id).await;

        // The status guard denies the owner once the record left draft.
        let res = app
            .delete_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        // Admin override deletes regardless of status.
        let res = app.delete_with_token(&routes::achievement(&id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        // Soft-deleted records read as absent.
        let res = app
            .get_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn owner_deletes_their_own_draft() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "Gone").await;

        let res = app
            .delete_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .get_with_token(&routes::achievement(&id), &student.token)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn advisors_cannot_create_achievements() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let advisor = app.create_advisor("a1", &admin).await;

        let res = app
            .post_with_token(
                routes::ACHIEVEMENTS,
                &json!({
                    "type": "competition",
                    "title": "Not yours",
                    "details": {"eventDate": "2025-09-01"},
                }),
                &advisor.token,
            )
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn admin_creation_targets_a_named_student() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let student = app.create_student("s1").await;

        // Without a target the request is rejected.
        let res = app
            .post_with_token(
                routes::ACHIEVEMENTS,
                &json!({
                    "type": "competition",
                    "title": "On behalf",
                    "details": {"eventDate": "2025-09-01"},
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post_with_token(
                routes::ACHIEVEMENTS,
                &json!({
                    "type": "competition",
                    "title": "On behalf",
                    "details": {"eventDate": "2025-09-01"},
                    "targetStudentId": student.profile_id,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["studentId"], student.profile_id);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn create_with_malformed_event_date_is_rejected() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;

        for bad in ["09/01/2025", "2025-13-01", ""] {
            let res = app
                .post_with_token(
                    routes::ACHIEVEMENTS,
                    &json!({
                        "type": "competition",
                        "title": "Bad date",
                        "details": {"eventDate": bad},
                    }),
                    &student.token,
                )
                .await;
            assert_eq!(res.status, 400, "accepted eventDate {bad:?}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn update_patches_only_the_given_fields() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "Before").await;

        let res = app
            .patch_with_token(
                &routes::achievement(&id),
                &json!({"title": "After", "points": null}),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "After");
        assert!(res.body["points"].is_null());
        // Untouched fields survive.
        assert_eq!(res.body["type"], "competition");
        assert_eq!(res.body["details"]["competitionLevel"], "regional");
    }

    #[tokio::test]
    async fn editing_after_submit_is_forbidden_for_the_owner() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "Frozen").await;
        app.submit_achievement(&student.token, &id).await;

        let res = app
            .patch_with_token(
                &routes::achievement(&id),
                &json!({"title": "Too late"}),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "Noop").await;

        let res = app
            .patch_with_token(&routes::achievement(&id), &json!({}), &student.token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod attachments {
    use super::*;

    #[tokio::test]
    async fn upload_appends_metadata_to_the_draft() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "With file").await;

        let res = app
            .upload_with_token(
                &routes::achievement_attachments(&id),
                "certificate.pdf",
                b"%PDF-1.4 fake".to_vec(),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let attachments = res.body["attachments"].as_array().unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0]["fileName"], "certificate.pdf");
        assert_eq!(attachments[0]["fileType"], "application/pdf");
        assert!(attachments[0]["fileUrl"].as_str().unwrap().starts_with("/files/"));
        assert!(attachments[0]["uploadedAt"].is_string());
    }

    #[tokio::test]
    async fn upload_after_submit_is_forbidden() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;
        let id = app.create_achievement(&student.token, "Sealed").await;
        app.submit_achievement(&student.token, &id).await;

        let res = app
            .upload_with_token(
                &routes::achievement_attachments(&id),
                "late.pdf",
                b"late".to_vec(),
                &student.token,
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn scopes_partition_by_role() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let s1 = app.create_student("s1").await;
        let s2 = app.create_student("s2").await;
        let advisor = app.create_advisor("a1", &admin).await;
        app.assign_advisor(&s1.profile_id, &advisor.profile_id, &admin)
            .await;

        app.create_achievement(&s1.token, "s1 first").await;
        app.create_achievement(&s1.token, "s1 second").await;
        app.create_achievement(&s2.token, "s2 only").await;

        // Students see their own.
        let res = app.get_with_token(routes::ACHIEVEMENTS, &s1.token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);

        // Advisors see their advisees'.
        let res = app.get_with_token(routes::ACHIEVEMENTS, &advisor.token).await;
        assert_eq!(res.body["total"], 2);
        for item in res.body["data"].as_array().unwrap() {
            assert_eq!(item["studentId"], s1.profile_id);
        }

        // Admin sees everything.
        let res = app.get_with_token(routes::ACHIEVEMENTS, &admin).await;
        assert_eq!(res.body["total"], 3);
    }

    #[tokio::test]
    async fn deleted_records_drop_out_of_listings() {
        let app = TestApp::spawn().await;
        let student = app.create_student("s1").await;

        let keep = app.create_achievement(&student.token, "keep").await;
        let gone = app.create_achievement(&student.token, "gone").await;
        let res = app
            .delete_with_token(&routes::achievement(&gone), &student.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(routes::ACHIEVEMENTS, &student.token).await;
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["data"][0]["id"], keep);
    }

    #[tokio::test]
    async fn per_student_report_respects_the_advises_predicate() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let s1 = app.create_student("s1").await;
        let advisor = app.create_advisor("a1", &admin).await;
        let stranger = app.create_advisor("a2", &admin).await;
        app.assign_advisor(&s1.profile_id, &advisor.profile_id, &admin)
            .await;
        app.create_achievement(&s1.token, "Reported").await;

        let res = app
            .get_with_token(&routes::student_report(&s1.profile_id), &advisor.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["student"]["id"], s1.profile_id);
        assert_eq!(res.body["achievements"].as_array().unwrap().len(), 1);

        let res = app
            .get_with_token(&routes::student_report(&s1.profile_id), &stranger.token)
            .await;
        assert_eq!(res.status, 403);

        // The student reads their own report.
        let res = app
            .get_with_token(&routes::student_report(&s1.profile_id), &s1.token)
            .await;
        assert_eq!(res.status, 200);
    }
}
