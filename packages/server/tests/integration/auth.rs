use serde_json::json;

use crate::common::{TestApp, TestResponse, routes};

fn register_body(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "password": "securepass",
        "fullName": "Alice Wonder",
        "studentNumber": "2201234567",
        "program": "Computer Science",
        "year": 2,
    })
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_student_can_register_and_gets_a_profile() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::REGISTER, &register_body("alice"))
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["username"], "alice");
        assert!(res.body["studentProfileId"].is_string());
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_username() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(routes::REGISTER, &register_body("alice"))
            .await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let mut body = register_body("alice");
        body["studentNumber"] = json!("2209999999");
        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_password_that_is_too_short() {
        let app = TestApp::spawn().await;

        let mut body = register_body("alice");
        body["password"] = json!("short");
        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_an_invalid_username() {
        let app = TestApp::spawn().await;

        let mut body = register_body("alice");
        body["username"] = json!("no spaces!");
        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_a_duplicate_student_number() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(routes::REGISTER, &register_body("alice"))
            .await;
        assert_eq!(first.status, 201);

        let res = app
            .post_without_token(routes::REGISTER, &register_body("bob"))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_the_success_envelope_with_both_tokens() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::REGISTER, &register_body("alice"))
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "success");
        assert!(res.body["data"]["token"].is_string());
        assert!(res.body["data"]["refreshToken"].is_string());

        let user = &res.body["data"]["user"];
        assert_eq!(user["username"], "alice");
        assert_eq!(user["fullName"], "Alice Wonder");
        assert_eq!(user["role"], "student");
        let permissions = user["permissions"]
            .as_array()
            .expect("permissions should be an array");
        assert!(permissions.contains(&json!("achievement:create")));
        assert!(permissions.contains(&json!("achievement:submit")));
        assert!(!permissions.contains(&json!("achievement:verify")));
    }

    #[tokio::test]
    async fn cannot_login_with_wrong_password() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::REGISTER, &register_body("alice"))
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn cannot_login_with_nonexistent_username() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "nobody", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn refresh_token_mints_a_working_access_token() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::REGISTER, &register_body("alice"))
            .await;

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "securepass"}),
            )
            .await;
        let refresh_token = login.body["data"]["refreshToken"].as_str().unwrap();

        let res = app
            .post_without_token(routes::REFRESH, &json!({"refreshToken": refresh_token}))
            .await;
        assert_eq!(res.status, 200);
        let new_token = res.body["data"]["token"].as_str().unwrap();

        let me = app.get_with_token(routes::ME, new_token).await;
        assert_eq!(me.status, 200);
        assert_eq!(me.body["username"], "alice");
    }

    #[tokio::test]
    async fn access_tokens_are_rejected_on_the_refresh_path() {
        let app = TestApp::spawn().await;
        let student = app.create_student("alice").await;

        let res = app
            .post_without_token(routes::REFRESH, &json!({"refreshToken": student.token}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn refresh_tokens_are_rejected_on_authenticated_paths() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::REGISTER, &register_body("alice"))
            .await;

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "securepass"}),
            )
            .await;
        let refresh_token = login.body["data"]["refreshToken"].as_str().unwrap();

        let res = app.get_with_token(routes::ME, refresh_token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod revocation {
    use super::*;

    #[tokio::test]
    async fn logout_revokes_only_the_presented_token() {
        let app = TestApp::spawn().await;
        app.post_without_token(routes::REGISTER, &register_body("alice"))
            .await;

        // Two parallel sessions for the same user.
        let token_a = app.login("alice", "securepass").await;
        let token_b = app.login("alice", "securepass").await;

        let res = app
            .post_with_token(routes::LOGOUT, &json!({}), &token_a)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "success");

        // The revoked token is out.
        let revoked = app.get_with_token(routes::ME, &token_a).await;
        assert_eq!(revoked.status, 401);
        assert_eq!(revoked.body["code"], "TOKEN_REVOKED");

        // The sibling session still works.
        let alive = app.get_with_token(routes::ME, &token_b).await;
        assert_eq!(alive.status, 200);
    }
}

mod authenticated_access {
    use super::*;

    #[tokio::test]
    async fn me_includes_the_student_profile_id() {
        let app = TestApp::spawn().await;
        let student = app.create_student("alice").await;

        let res = app.get_with_token(routes::ME, &student.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["role"], "student");
        assert_eq!(res.body["studentProfileId"], student.profile_id);
        assert!(res.body["advisorProfileId"].is_null());
    }

    #[tokio::test]
    async fn request_without_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn request_with_malformed_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-valid-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn request_with_non_bearer_auth_scheme_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::ME))
            .header("Authorization", "Basic abc123")
            .send()
            .await
            .expect("Failed to send request");

        let res = TestResponse::from_response(res).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
