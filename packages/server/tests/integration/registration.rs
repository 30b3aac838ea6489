use std::time::Duration;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::registration;

use crate::common::{TestApp, routes};

async fn registration_rows(app: &TestApp, event_id: i32) -> u64 {
    registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .count(&app.db)
        .await
        .unwrap()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn first_registration_is_confirmed() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app.register(event_id, &token, "Team A").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "confirmed");
        assert_eq!(res.body["event_id"], event_id);
        assert_eq!(res.body["user_id"], app.user_id("alice").await);
        assert_eq!(res.body["team_name"], "Team A");
    }

    #[tokio::test]
    async fn body_form_behaves_like_path_form() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 1).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;

        let body = |team: &str| {
            json!({
                "event_id": event_id,
                "team_name": team,
                "project_idea": "Realtime subtitles",
            })
        };
        let first = app
            .post_with_token(routes::REGISTRATIONS, &body("Team A"), &alice)
            .await;
        let second = app
            .post_with_token(routes::REGISTRATIONS, &body("Team B"), &bob)
            .await;

        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(first.body["status"], "confirmed");
        assert_eq!(second.status, 201, "{}", second.text);
        assert_eq!(second.body["status"], "waitlisted");
    }

    #[tokio::test]
    async fn registration_beyond_capacity_is_waitlisted() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Small Hack", 2).await;

        let mut statuses = Vec::new();
        for name in ["alice", "bob", "carol", "dave"] {
            let token = app.create_authenticated_user(name, "password123").await;
            let res = app.register(event_id, &token, name).await;
            assert_eq!(res.status, 201, "{}", res.text);
            statuses.push(res.body["status"].as_str().unwrap().to_string());
        }

        assert_eq!(statuses, ["confirmed", "confirmed", "waitlisted", "waitlisted"]);
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;

        let res = app
            .post_without_token(
                &routes::event_registrations(event_id),
                &json!({"team_name": "Team A", "project_idea": "Idea"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app.register(9999, &token, "Team A").await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn notice_is_sent_after_registration() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app.register(event_id, &token, "Team A").await;
        assert_eq!(res.status, 201);

        let mut delivered = Vec::new();
        for _ in 0..50 {
            delivered = app.notifier.notices.lock().unwrap().clone();
            if !delivered.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].username, "alice");
        assert_eq!(delivered[0].event_title, "Spring Hack");
        assert_eq!(delivered[0].registration_id, res.id());
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn blank_fields_are_rejected_without_creating_a_row() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        for body in [
            json!({"team_name": "   ", "project_idea": "Idea"}),
            json!({"team_name": "Team A", "project_idea": ""}),
        ] {
            let res = app
                .post_with_token(&routes::event_registrations(event_id), &body, &token)
                .await;
            assert_eq!(res.status, 400, "{}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }

        assert_eq!(registration_rows(&app, event_id).await, 0);
    }

    #[tokio::test]
    async fn team_name_length_limit_is_inclusive() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;

        let too_long = app.register(event_id, &alice, &"x".repeat(129)).await;
        assert_eq!(too_long.status, 400);

        let at_limit = app.register(event_id, &bob, &"x".repeat(128)).await;
        assert_eq!(at_limit.status, 201, "{}", at_limit.text);
    }
}

mod conflicts {
    use super::*;

    #[tokio::test]
    async fn second_registration_by_same_user_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let first = app.register(event_id, &token, "Team A").await;
        assert_eq!(first.status, 201);

        let second = app.register(event_id, &token, "Team B").await;

        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "DUPLICATE_REGISTRATION");
        assert_eq!(registration_rows(&app, event_id).await, 1);
    }

    #[tokio::test]
    async fn waitlisted_user_is_still_a_duplicate() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Tiny Hack", 1).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;

        app.register(event_id, &alice, "Team A").await;
        let waitlisted = app.register(event_id, &bob, "Team B").await;
        assert_eq!(waitlisted.body["status"], "waitlisted");

        let again = app.register(event_id, &bob, "Team B").await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "DUPLICATE_REGISTRATION");
    }

    #[tokio::test]
    async fn concurrent_duplicates_store_exactly_one_row() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let attempts = (0..8).map(|i| {
            let team = format!("Team {i}");
            let app = &app;
            let token = &token;
            async move { app.register(event_id, token, &team).await }
        });
        let results = futures::future::join_all(attempts).await;

        let created = results.iter().filter(|r| r.status == 201).count();
        let duplicates = results
            .iter()
            .filter(|r| r.status == 409 && r.body["code"] == "DUPLICATE_REGISTRATION")
            .count();
        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(registration_rows(&app, event_id).await, 1);
    }

    #[tokio::test]
    async fn concurrent_registrations_never_overfill_an_event() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Small Hack", 3).await;

        let mut tokens = Vec::new();
        for i in 0..10 {
            tokens.push(
                app.create_authenticated_user(&format!("user{i}"), "password123")
                    .await,
            );
        }

        let attempts = tokens
            .iter()
            .map(|token| app.register(event_id, token, "Team"));
        let results = futures::future::join_all(attempts).await;

        assert!(results.iter().all(|r| r.status == 201));
        let confirmed = results
            .iter()
            .filter(|r| r.body["status"] == "confirmed")
            .count();
        assert_eq!(confirmed, 3);

        let res = app.get_without_token(&routes::event(event_id)).await;
        assert_eq!(res.body["confirmed_count"], 3);
        assert_eq!(res.body["waitlisted_count"], 7);
    }

    #[tokio::test]
    async fn closed_event_rejects_registration_and_stores_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .patch_with_token(
                &routes::event(event_id),
                &json!({"registration_open": false}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);

        let res = app.register(event_id, &token, "Team A").await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "REGISTRATION_CLOSED");
        assert_eq!(registration_rows(&app, event_id).await, 0);
    }
}

mod rate_limit {
    use super::*;

    #[tokio::test]
    async fn too_many_attempts_are_limited_with_retry_after() {
        let app =
            TestApp::spawn_with(|config| config.rate_limit.registrations_per_minute = 2).await;
        let admin = app.create_admin().await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let first = app.create_event(&admin, "Hack One", 10).await;
        let second = app.create_event(&admin, "Hack Two", 10).await;
        let third = app.create_event(&admin, "Hack Three", 10).await;

        assert_eq!(app.register(first, &token, "Team A").await.status, 201);
        assert_eq!(app.register(second, &token, "Team A").await.status, 201);
        let res = app.register(third, &token, "Team A").await;

        assert_eq!(res.status, 429);
        assert_eq!(res.body["code"], "RATE_LIMITED");
        let retry_after: u64 = res
            .retry_after
            .expect("Retry-After header")
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));
        assert_eq!(registration_rows(&app, third).await, 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn user_sees_only_their_own_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let first = app.create_event(&admin, "Hack One", 10).await;
        let second = app.create_event(&admin, "Hack Two", 10).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;

        app.register(first, &alice, "Team A").await;
        app.register(second, &alice, "Team A").await;
        app.register(first, &bob, "Team B").await;

        let res = app.get_with_token(routes::MY_REGISTRATIONS, &alice).await;

        assert_eq!(res.status, 200);
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["team_name"] == "Team A"));
    }

    #[tokio::test]
    async fn admin_lists_event_registrations_filtered_by_status() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Tiny Hack", 1).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        app.register(event_id, &alice, "Team A").await;
        app.register(event_id, &bob, "Team B").await;

        let all = app
            .get_with_token(&routes::event_registrations(event_id), &admin)
            .await;
        assert_eq!(all.status, 200, "{}", all.text);
        assert_eq!(all.body.as_array().unwrap().len(), 2);
        assert_eq!(all.body[0]["username"], "alice");

        let waitlisted = app
            .get_with_token(
                &format!("{}?status=waitlisted", routes::event_registrations(event_id)),
                &admin,
            )
            .await;
        let rows = waitlisted.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "bob");
    }

    #[tokio::test]
    async fn participant_cannot_list_event_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .get_with_token(&routes::event_registrations(event_id), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod status_override {
    use super::*;

    #[tokio::test]
    async fn admin_can_promote_a_waitlisted_registration() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Tiny Hack", 1).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let bob = app.create_authenticated_user("bob", "password123").await;
        app.register(event_id, &alice, "Team A").await;
        let waitlisted = app.register(event_id, &bob, "Team B").await;

        let res = app
            .patch_with_token(
                &routes::registration_status(waitlisted.id()),
                &json!({"status": "confirmed"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "confirmed");

        let event = app.get_without_token(&routes::event(event_id)).await;
        assert_eq!(event.body["confirmed_count"], 2);
        assert_eq!(event.body["waitlisted_count"], 0);
    }

    #[tokio::test]
    async fn unknown_status_value_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let alice = app.create_authenticated_user("alice", "password123").await;
        let reg = app.register(event_id, &alice, "Team A").await;

        let res = app
            .patch_with_token(
                &routes::registration_status(reg.id()),
                &json!({"status": "vip"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_registration_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app
            .patch_with_token(
                &routes::registration_status(9999),
                &json!({"status": "confirmed"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}
