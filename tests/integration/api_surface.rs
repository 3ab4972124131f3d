//! HTTP API surface tests through the axum router
//!
//! Requests go through `tower::ServiceExt::oneshot`, so the full stack is
//! exercised: bearer extraction, JSON (de)serialization with integer enum
//! values, and error-to-status mapping.

use crate::fixtures::TestSystem;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_user_create_me_update_flow() {
    let system = TestSystem::new();

    let (status, body) = system
        .post(
            "/user/create",
            None,
            json!({ "user_name": "alice", "leader_card_id": 42 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["user_token"].as_str().unwrap().to_string();

    let (status, body) = system.get("/user/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice");
    assert_eq!(body["leader_card_id"], 42);

    let (status, _) = system
        .post(
            "/user/update",
            Some(&token),
            json!({ "user_name": "alicia", "leader_card_id": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = system.get("/user/me", Some(&token)).await;
    assert_eq!(body["name"], "alicia");
    assert_eq!(body["leader_card_id"], 7);
}

#[tokio::test]
async fn test_authentication_failures() {
    let system = TestSystem::new();

    // no Authorization header at all
    let (status, _) = system.get("/user/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // wrong scheme
    let (status, _) = system
        .post("/room/wait", Some(""), json!({ "room_id": 1 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // well-formed token that resolves to nobody
    let (status, _) = system.get("/user/me", Some("not-a-real-token")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_flow_over_http() {
    let system = TestSystem::new();
    let (owner_token, _) = system.user("owner");
    let (guest_token, _) = system.user("guest");

    // create
    let (status, body) = system
        .post(
            "/room/create",
            Some(&owner_token),
            json!({ "live_id": 5, "select_difficulty": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let room_id = body["room_id"].as_i64().unwrap();

    // list carries occupancy and the capacity constant
    let (status, body) = system.post("/room/list", None, json!({ "live_id": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_info_list"][0]["room_id"], room_id);
    assert_eq!(body["room_info_list"][0]["joined_user_count"], 1);
    assert_eq!(body["room_info_list"][0]["max_user_count"], 4);

    // join: outcome enum travels as an integer in a 200 response
    let (status, body) = system
        .post(
            "/room/join",
            Some(&guest_token),
            json!({ "room_id": room_id, "select_difficulty": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["join_room_result"], 1);

    // wait: status integer plus annotated member list
    let (status, body) = system
        .post("/room/wait", Some(&guest_token), json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 1);
    let members = body["room_user_list"].as_array().unwrap();
    assert_eq!(members.len(), 2);

    let me = members.iter().find(|m| m["is_me"] == true).unwrap();
    assert_eq!(me["name"], "guest");
    assert_eq!(me["is_host"], false);
    assert_eq!(me["select_difficulty"], 1);

    let host = members.iter().find(|m| m["is_host"] == true).unwrap();
    assert_eq!(host["name"], "owner");

    // start, then wait reflects LiveStart
    let (status, _) = system
        .post("/room/start", Some(&owner_token), json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = system
        .post("/room/wait", Some(&owner_token), json!({ "room_id": room_id }))
        .await;
    assert_eq!(body["status"], 2);

    // both members submit results
    let (status, _) = system
        .post(
            "/room/end",
            Some(&owner_token),
            json!({ "room_id": room_id, "judge_count_list": [20, 5, 1], "score": 95000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = system
        .post(
            "/room/end",
            Some(&guest_token),
            json!({ "room_id": room_id, "judge_count_list": [18, 6, 2], "score": 88000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // results are public and round-trip the judge sequence
    let (status, body) = system
        .post("/room/result", None, json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["result_user_list"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["judge_count_list"], json!([20, 5, 1]));
    assert_eq!(results[1]["judge_count_list"], json!([18, 6, 2]));
}

#[tokio::test]
async fn test_join_outcomes_over_http() {
    let system = TestSystem::new();
    let (owner_token, _) = system.user("owner");

    let (_, body) = system
        .post(
            "/room/create",
            Some(&owner_token),
            json!({ "live_id": 1, "select_difficulty": 1 }),
        )
        .await;
    let room_id = body["room_id"].as_i64().unwrap();

    // fill the remaining three seats
    for i in 0..3 {
        let (token, _) = system.user(&format!("guest{}", i));
        let (_, body) = system
            .post(
                "/room/join",
                Some(&token),
                json!({ "room_id": room_id, "select_difficulty": 1 }),
            )
            .await;
        assert_eq!(body["join_room_result"], 1);
    }

    // a full room answers RoomFull as data, not as an error status
    let (late_token, _) = system.user("late");
    let (status, body) = system
        .post(
            "/room/join",
            Some(&late_token),
            json!({ "room_id": room_id, "select_difficulty": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["join_room_result"], 2);

    // a nonexistent room answers OtherError
    let (status, body) = system
        .post(
            "/room/join",
            Some(&late_token),
            json!({ "room_id": 99999, "select_difficulty": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["join_room_result"], 4);
}

#[tokio::test]
async fn test_error_status_mapping() {
    let system = TestSystem::new();
    let (owner_token, _) = system.user("owner");
    let (other_token, _) = system.user("other");

    let (_, body) = system
        .post(
            "/room/create",
            Some(&owner_token),
            json!({ "live_id": 1, "select_difficulty": 1 }),
        )
        .await;
    let room_id = body["room_id"].as_i64().unwrap();

    // unknown room -> 404
    let (status, _) = system
        .post("/room/wait", Some(&owner_token), json!({ "room_id": 424242 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // non-owner start -> 403
    let (_, body) = system
        .post(
            "/room/join",
            Some(&other_token),
            json!({ "room_id": room_id, "select_difficulty": 1 }),
        )
        .await;
    assert_eq!(body["join_room_result"], 1);
    let (status, _) = system
        .post("/room/start", Some(&other_token), json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // results before dissolution -> 400
    let (status, _) = system
        .post("/room/result", None, json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // double start -> 400
    let (status, _) = system
        .post("/room/start", Some(&owner_token), json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = system
        .post("/room/start", Some(&owner_token), json!({ "room_id": room_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // finish by a non-member -> 404
    let (stranger_token, _) = system.user("stranger");
    let (status, _) = system
        .post(
            "/room/end",
            Some(&stranger_token),
            json!({ "room_id": room_id, "judge_count_list": [1], "score": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
