mod common;

use anyhow::Result;
use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

async fn create(app: &Router, csrf: &str, body: &Value) -> Result<(StatusCode, Value)> {
    let (status, _, body) =
        common::send(app, common::mutating_request("POST", "/api/charts", body, csrf, None))
            .await?;
    Ok((status, body))
}

#[tokio::test]
async fn title_is_derived_from_layout_at_creation() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, body) = create(
        &app,
        &csrf,
        &json!({
            "data": [{"x": [1, 2, 3], "y": [1, 4, 9], "type": "scatter"}],
            "layout": {"title": {"text": "T"}},
        }),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], json!("T"));

    Ok(())
}

#[tokio::test]
async fn missing_titles_default_to_untitled() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, body) = create(
        &app,
        &csrf,
        &json!({"data": [{"x": [1], "y": [2], "type": "bar"}]}),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], json!("Untitled Chart"));

    Ok(())
}

#[tokio::test]
async fn explicit_title_wins_over_layout() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, body) = create(
        &app,
        &csrf,
        &json!({
            "chartTitle": "Monthly Sales Report",
            "data": [],
            "layout": {"title": {"text": "Other"}},
            "description": "Sales performance over 5 months",
            "tags": ["sales", "monthly", "line-chart"],
        }),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], json!("Monthly Sales Report"));
    assert_eq!(body["data"]["tags"], json!(["sales", "monthly", "line-chart"]));

    Ok(())
}

#[tokio::test]
async fn payload_must_have_data_or_layout() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, body) = create(&app, &csrf, &json!({"chartTitle": "Empty"})).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));

    Ok(())
}

#[tokio::test]
async fn crud_round_trip() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (_, created) = create(
        &app,
        &csrf,
        &json!({"chartTitle": "Lifecycle", "data": []}),
    )
    .await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _, body) = common::send(&app, common::get(&format!("/api/charts/{}", id))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("Lifecycle"));
    assert!(body["data"]["payload"]["data"].is_array());

    let (status, _, body) = common::send(
        &app,
        common::mutating_request(
            "PUT",
            &format!("/api/charts/{}", id),
            &json!({"chartTitle": "Renamed", "description": "now described"}),
            &csrf,
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("Renamed"));
    assert_eq!(body["data"]["description"], json!("now described"));

    let (status, _, _) = common::send(
        &app,
        common::mutating_request(
            "DELETE",
            &format!("/api/charts/{}", id),
            &json!({}),
            &csrf,
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = common::send(&app, common::get(&format!("/api/charts/{}", id))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));

    Ok(())
}

#[tokio::test]
async fn update_does_not_rederive_title_from_payload() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (_, created) = create(
        &app,
        &csrf,
        &json!({"data": [], "layout": {"title": {"text": "Original"}}}),
    )
    .await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _, body) = common::send(
        &app,
        common::mutating_request(
            "PUT",
            &format!("/api/charts/{}", id),
            &json!({"layout": {"title": {"text": "Changed"}}}),
            &csrf,
            None,
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("Original"));
    assert_eq!(
        body["data"]["payload"]["layout"]["title"]["text"],
        json!("Changed")
    );

    Ok(())
}

#[tokio::test]
async fn malformed_id_is_400_and_unknown_id_is_404() -> Result<()> {
    let app = common::test_app();

    let (status, _, body) = common::send(&app, common::get("/api/charts/not-a-uuid")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ID"));

    let ghost = uuid::Uuid::new_v4();
    let (status, _, body) =
        common::send(&app, common::get(&format!("/api/charts/{}", ghost))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));

    Ok(())
}

#[tokio::test]
async fn duplicate_title_conflicts_with_400() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, _) = create(&app, &csrf, &json!({"chartTitle": "Same", "data": []})).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(&app, &csrf, &json!({"chartTitle": "Same", "data": []})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("DUPLICATE_FIELD"));

    Ok(())
}

#[tokio::test]
async fn duplicate_endpoint_copies_the_record() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (_, created) = create(
        &app,
        &csrf,
        &json!({"chartTitle": "Sales", "data": [], "tags": ["finance"]}),
    )
    .await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _, body) = common::send(
        &app,
        common::mutating_request(
            "POST",
            &format!("/api/charts/{}/duplicate", id),
            &json!({}),
            &csrf,
            None,
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], json!("Copy of Sales"));
    assert_eq!(body["data"]["tags"], json!(["finance"]));
    assert_ne!(body["data"]["id"], created["data"]["id"]);

    Ok(())
}

#[tokio::test]
async fn stats_summarize_the_payload() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (_, created) = create(
        &app,
        &csrf,
        &json!({
            "chartTitle": "Stats",
            "data": [
                {"x": [1, 2, 3], "y": [1, 4, 9], "type": "scatter"},
                {"x": [1, 2], "y": [2, 4], "type": "bar"},
            ],
            "tags": ["a", "b"],
        }),
    )
    .await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _, body) =
        common::send(&app, common::get(&format!("/api/charts/{}/stats", id))).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["traceCount"], json!(2));
    assert_eq!(body["data"]["dataPointCount"], json!(5));
    assert_eq!(body["data"]["tagCount"], json!(2));
    assert!(body["data"]["sizeBytes"].as_u64().unwrap() > 0);

    Ok(())
}

#[tokio::test]
async fn listing_paginates_and_omits_payload() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    for i in 0..25 {
        let (status, _) = create(
            &app,
            &csrf,
            &json!({"chartTitle": format!("Chart {:02}", i), "data": []}),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, body) =
        common::send(&app, common::get("/api/charts?page=1&limit=10")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalCount"], json!(25));
    assert_eq!(body["pagination"]["totalPages"], json!(3));
    assert_eq!(body["pagination"]["hasNextPage"], json!(true));
    assert_eq!(body["pagination"]["hasPrevPage"], json!(false));
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert!(
        body["data"][0].get("payload").is_none(),
        "list items must omit the figure payload"
    );

    let (_, _, body) = common::send(&app, common::get("/api/charts?page=3&limit=10")).await?;
    assert_eq!(body["pagination"]["hasNextPage"], json!(false));
    assert_eq!(body["pagination"]["hasPrevPage"], json!(true));
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    Ok(())
}

#[tokio::test]
async fn search_and_sort_shape_the_listing() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    create(
        &app,
        &csrf,
        &json!({"chartTitle": "Revenue", "data": [], "tags": ["finance"]}),
    )
    .await?;
    create(
        &app,
        &csrf,
        &json!({"chartTitle": "Traffic", "data": [], "description": "web visits"}),
    )
    .await?;
    create(&app, &csrf, &json!({"chartTitle": "Audience", "data": []})).await?;

    let (_, _, body) = common::send(&app, common::get("/api/charts?search=finance")).await?;
    assert_eq!(body["pagination"]["totalCount"], json!(1));
    assert_eq!(body["data"][0]["title"], json!("Revenue"));

    let (_, _, body) = common::send(&app, common::get("/api/charts?sort=title")).await?;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Audience", "Revenue", "Traffic"]);

    Ok(())
}

#[tokio::test]
async fn request_bodies_are_sanitized_before_storage() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, created) = create(
        &app,
        &csrf,
        &json!({
            "chartTitle": "Clean",
            "data": [],
            "layout": {"title": {"text": "x"}, "$where": "1 == 1"},
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let id = created["data"]["id"].as_str().unwrap().to_string();
    let (_, _, body) = common::send(&app, common::get(&format!("/api/charts/{}", id))).await?;

    assert!(
        body["data"]["payload"]["layout"].get("$where").is_none(),
        "operator keys must be stripped before the store sees them"
    );

    Ok(())
}

#[tokio::test]
async fn wrong_typed_body_field_gets_the_validation_envelope() -> Result<()> {
    let app = common::test_app();
    let csrf = common::csrf_handshake(&app).await?;

    let (status, body) = create(
        &app,
        &csrf,
        &json!({"data": [], "chartTitle": 123}),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    assert!(body["timestamp"].is_string());

    Ok(())
}

#[tokio::test]
async fn malformed_query_parameters_get_the_validation_envelope() -> Result<()> {
    let app = common::test_app();

    let (status, _, body) =
        common::send(&app, common::get("/api/charts?page=abc")).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));

    Ok(())
}
