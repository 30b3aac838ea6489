use common::RankingScheme;
use serde_json::json;

use crate::common::{TestApp, routes};

/// Create `names` as participants and return their ids in the same order.
async fn participants(app: &TestApp, names: &[&str]) -> Vec<i32> {
    let mut ids = Vec::new();
    for name in names {
        app.create_authenticated_user(name, "password123").await;
        ids.push(app.user_id(name).await);
    }
    ids
}

/// Ranks from the public leaderboard, keyed back to `user_ids` order.
async fn ranks_for(app: &TestApp, event_id: i32, user_ids: &[i32]) -> Vec<i64> {
    let res = app
        .get_without_token(&routes::event_leaderboard(event_id))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let entries = res.body["entries"].as_array().unwrap();
    user_ids
        .iter()
        .map(|id| {
            entries
                .iter()
                .find(|e| e["user_id"] == *id)
                .and_then(|e| e["rank"].as_i64())
                .expect("user missing from leaderboard")
        })
        .collect()
}

mod ranking {
    use super::*;

    #[tokio::test]
    async fn ties_share_a_dense_rank_and_ranks_shift_on_new_leader() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1", "u2", "u3", "u4", "u5"]).await;

        for (id, score) in ids.iter().zip([50, 80, 80, 30]) {
            let res = app.set_score(event_id, *id, score, &admin).await;
            assert_eq!(res.status, 200, "{}", res.text);
        }
        assert_eq!(ranks_for(&app, event_id, &ids[..4]).await, [2, 1, 1, 3]);

        let res = app.set_score(event_id, ids[4], 100, &admin).await;
        assert_eq!(res.body["rank"], 1);
        assert_eq!(ranks_for(&app, event_id, &ids).await, [3, 2, 2, 4, 1]);
    }

    #[tokio::test]
    async fn competition_ranking_skips_after_ties() {
        let app = TestApp::spawn_with_ranking(RankingScheme::Competition).await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1", "u2", "u3", "u4", "u5"]).await;

        for (id, score) in ids.iter().zip([50, 80, 80, 30]) {
            app.set_score(event_id, *id, score, &admin).await;
        }
        assert_eq!(ranks_for(&app, event_id, &ids[..4]).await, [3, 1, 1, 4]);

        app.set_score(event_id, ids[4], 100, &admin).await;
        assert_eq!(ranks_for(&app, event_id, &ids).await, [4, 2, 2, 5, 1]);
    }

    #[tokio::test]
    async fn resubmitting_the_same_score_changes_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1", "u2"]).await;

        app.set_score(event_id, ids[0], 70, &admin).await;
        app.set_score(event_id, ids[1], 90, &admin).await;
        let before = ranks_for(&app, event_id, &ids).await;

        let res = app.set_score(event_id, ids[0], 70, &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(ranks_for(&app, event_id, &ids).await, before);
        assert_eq!(before, [2, 1]);
    }

    #[tokio::test]
    async fn updating_a_score_replaces_the_entry() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1", "u2"]).await;

        app.set_score(event_id, ids[0], 10, &admin).await;
        app.set_score(event_id, ids[1], 20, &admin).await;
        let res = app.set_score(event_id, ids[0], 30, &admin).await;

        assert_eq!(res.body["score"], 30);
        assert_eq!(res.body["rank"], 1);

        let board = app
            .get_without_token(&routes::event_leaderboard(event_id))
            .await;
        let entries = board.body["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["username"], "u1");
        assert_eq!(entries[1]["rank"], 2);
    }

    #[tokio::test]
    async fn body_form_upsert_matches_path_form() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1"]).await;

        let res = app
            .post_with_token(
                routes::LEADERBOARD,
                &json!({"event_id": event_id, "user_id": ids[0], "score": 42}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["event_id"], event_id);
        assert_eq!(res.body["score"], 42);
        assert_eq!(res.body["rank"], 1);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn participant_cannot_set_scores() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let token = app.create_authenticated_user("alice", "password123").await;
        let alice = app.user_id("alice").await;

        let res = app.set_score(event_id, alice, 100, &token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn unknown_event_or_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1"]).await;

        let res = app.set_score(9999, ids[0], 10, &admin).await;
        assert_eq!(res.status, 404);

        let res = app.set_score(event_id, 9999, 10, &admin).await;
        assert_eq!(res.status, 404);

        let res = app
            .get_without_token(&routes::event_leaderboard(9999))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn negative_score_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;
        let ids = participants(&app, &["u1"]).await;

        let res = app.set_score(event_id, ids[0], -1, &admin).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn empty_leaderboard_is_an_empty_list() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Spring Hack", 10).await;

        let res = app
            .get_without_token(&routes::event_leaderboard(event_id))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["entries"], json!([]));
    }
}

mod scenario {
    use super::*;

    #[tokio::test]
    async fn register_fill_waitlist_and_rank_teams() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let event_id = app.create_event(&admin, "Weekend Hack", 2).await;

        let mut tokens = Vec::new();
        for name in ["alice", "bob", "carol"] {
            tokens.push(app.create_authenticated_user(name, "password123").await);
        }

        let statuses: Vec<String> = {
            let mut out = Vec::new();
            for (token, team) in tokens.iter().zip(["A", "B", "C"]) {
                let res = app.register(event_id, token, team).await;
                assert_eq!(res.status, 201, "{}", res.text);
                out.push(res.body["status"].as_str().unwrap().to_string());
            }
            out
        };
        assert_eq!(statuses, ["confirmed", "confirmed", "waitlisted"]);

        let dup = app.register(event_id, &tokens[0], "A").await;
        assert_eq!(dup.body["code"], "DUPLICATE_REGISTRATION");

        let alice = app.user_id("alice").await;
        let bob = app.user_id("bob").await;
        app.set_score(event_id, alice, 75, &admin).await;
        app.set_score(event_id, bob, 90, &admin).await;

        let board = app
            .get_without_token(&routes::event_leaderboard(event_id))
            .await;
        let entries = board.body["entries"].as_array().unwrap();
        assert_eq!(entries[0]["username"], "bob");
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[1]["username"], "alice");
        assert_eq!(entries[1]["rank"], 2);
    }
}
