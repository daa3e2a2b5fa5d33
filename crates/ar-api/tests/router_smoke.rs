use axum::{
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/recommend")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn livez_healthy_and_index_lists_endpoints() {
    let app = ar_api::create_router(ar_api::test_state());

    let livez_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(livez_response.status(), StatusCode::OK);
    assert!(livez_response.headers().contains_key("x-request-id"));

    let index = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(index.status(), StatusCode::OK);
    let body = json_body(index).await;
    assert_eq!(body["endpoints"]["recommend"], "/recommend");
}

#[tokio::test]
async fn get_recommend_returns_ranked_assessments() {
    let app = ar_api::create_router(ar_api::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommend?query=java%20developer%20who%20works%20in%20a%20team&n_results=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let count = body["count"].as_u64().unwrap();
    assert!(count >= 1 && count <= 3);

    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len() as u64, count);
    let urls: Vec<&str> = recommendations
        .iter()
        .filter_map(|item| item["url"].as_str())
        .collect();
    assert!(urls.contains(&"https://catalog.test/core-java"));
}

#[tokio::test]
async fn post_recommend_matches_get() {
    let app = ar_api::create_router(ar_api::test_state());

    let via_post = app
        .clone()
        .oneshot(post(r#"{"query": "java developer", "n_results": 2}"#))
        .await
        .unwrap();
    assert_eq!(via_post.status(), StatusCode::OK);

    let via_get = app
        .oneshot(
            Request::builder()
                .uri("/recommend?query=java%20developer&n_results=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(via_get.status(), StatusCode::OK);

    let post_body = json_body(via_post).await;
    let get_body = json_body(via_get).await;
    assert_eq!(post_body["recommendations"], get_body["recommendations"]);
}

#[tokio::test]
async fn short_query_is_a_bad_request() {
    let app = ar_api::create_router(ar_api::test_state());

    let response = app.oneshot(post(r#"{"query": "  j  "}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn out_of_range_n_results_is_a_bad_request() {
    let app = ar_api::create_router(ar_api::test_state());

    let too_many = app
        .clone()
        .oneshot(post(r#"{"query": "java developer", "n_results": 11}"#))
        .await
        .unwrap();
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

    let zero = app
        .oneshot(post(r#"{"query": "java developer", "n_results": 0}"#))
        .await
        .unwrap();
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_query_is_reported_as_json() {
    let app = ar_api::create_router(ar_api::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommend?n_results=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "bad_request");
    assert!(body["request_id"].is_string());
}
