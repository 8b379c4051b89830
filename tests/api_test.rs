mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

async fn create_category(app: &TestApp, name: &str) -> i64 {
    let response = app
        .request(Method::POST, "/api/v1/categories", Some(json!({ "name": name })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"]["id"]
        .as_i64()
        .expect("category id")
}

async fn create_product(app: &TestApp, category_id: i64, name: &str, stock: i32) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": name,
                "price": "2.50",
                "stock": stock,
                "category_id": category_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["data"]["id"]
        .as_i64()
        .expect("product id")
}

#[tokio::test]
async fn health_and_status_report_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["database"], "healthy");

    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["service"], "minimarket-pos");
    assert_eq!(body["data"]["environment"], "test");
}

#[tokio::test]
async fn request_id_is_echoed_and_reported_in_errors() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/products/4242")
        .header("x-request-id", "till-7-000123")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "till-7-000123"
    );
    let body = response_json(response).await;
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Product 4242 not found");
    assert_eq!(body["request_id"], "till-7-000123");
}

#[tokio::test]
async fn generated_request_id_when_none_is_sent() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/categories", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("generated request id");
    let body = response_json(response).await;
    assert_eq!(body["meta"]["request_id"], header.as_str());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/categories")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::POST, "/api/v1/products", Some(json!({ "name": "Bread" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validation_failures_list_field_details() {
    let app = TestApp::new().await;
    let category_id = create_category(&app, "Dairy").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "",
                "price": "0",
                "stock": 5,
                "category_id": category_id,
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    let details: Vec<String> = serde_json::from_value(body["details"].clone()).unwrap();
    assert!(details.iter().any(|d| d.starts_with("name:")));
    assert!(details.iter().any(|d| d == "price: must be greater than zero"));
}

#[tokio::test]
async fn category_lifecycle_over_http() {
    let app = TestApp::new().await;
    let id = create_category(&app, "Snacks").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/categories/{id}"),
            Some(json!({ "name": "Salty Snacks", "description": "Chips and nuts" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["name"], "Salty Snacks");

    let response = app
        .request(Method::POST, &format!("/api/v1/categories/{id}/deactivate"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["status"], "inactive");

    let listed = response_json(app.request(Method::GET, "/api/v1/categories", None).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);
    let listed = response_json(
        app.request(Method::GET, "/api/v1/categories?include_inactive=true", None)
            .await,
    )
    .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(Method::POST, &format!("/api/v1/categories/{id}/activate"), None)
        .await;
    assert_eq!(response_json(response).await["data"]["status"], "active");

    let response = app
        .request(Method::POST, "/api/v1/categories", Some(json!({ "name": "salty snacks" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn product_detail_search_and_stock_endpoints() {
    let app = TestApp::new().await;
    let category_id = create_category(&app, "Bakery").await;
    let bread = create_product(&app, category_id, "Sourdough Bread", 4).await;

    let detail = response_json(
        app.request(Method::GET, &format!("/api/v1/products/{bread}"), None)
            .await,
    )
    .await;
    assert_eq!(detail["data"]["name"], "Sourdough Bread");
    assert_eq!(detail["data"]["category"]["name"], "Bakery");
    assert_eq!(decimal(&detail["data"]["price"]), dec!(2.50));

    let found = response_json(
        app.request(Method::GET, "/api/v1/products/search?term=sour", None)
            .await,
    )
    .await;
    assert_eq!(found["data"].as_array().unwrap().len(), 1);

    let blank = response_json(app.request(Method::GET, "/api/v1/products/search", None).await).await;
    assert_eq!(blank["data"].as_array().unwrap().len(), 0);

    let stock = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/products/{bread}/stock?quantity=4"),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(stock["data"]["available"], true);

    let stock = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/products/{bread}/stock?quantity=5"),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(stock["data"]["available"], false);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{bread}/stock?quantity=0"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sale_endpoint_records_and_reports_receipt() {
    let app = TestApp::new().await;
    let category_id = create_category(&app, "Bakery").await;
    let bread = create_product(&app, category_id, "Bread", 10).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "clientId": null,
                "paymentType": 1,
                "totalAmount": "5.00",
                "cashReceived": "10.00",
                "change": "5.00",
                "items": [{ "productId": bread, "quantity": 2, "price": "2.50" }],
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Sale completed successfully");
    assert_eq!(body["data"]["itemsCount"], 1);
    assert_eq!(decimal(&body["data"]["change"]), dec!(5));
    let sale_id = body["data"]["saleId"].as_i64().expect("sale id");

    let detail = response_json(
        app.request(Method::GET, &format!("/api/v1/sales/{sale_id}"), None)
            .await,
    )
    .await;
    assert_eq!(detail["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(detail["data"]["items"][0]["quantity"], 2);

    let listing = response_json(app.request(Method::GET, "/api/v1/sales?page=1&per_page=10", None).await).await;
    assert_eq!(listing["data"]["total"], 1);
    assert_eq!(listing["data"]["total_pages"], 1);

    let product = response_json(
        app.request(Method::GET, &format!("/api/v1/products/{bread}"), None)
            .await,
    )
    .await;
    assert_eq!(product["data"]["stock"], 8);
}

#[tokio::test]
async fn rejected_sales_explain_every_line() {
    let app = TestApp::new().await;
    let category_id = create_category(&app, "Bakery").await;
    let bread = create_product(&app, category_id, "Bread", 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "paymentType": 1,
                "totalAmount": "7.50",
                "cashReceived": "10.00",
                "change": "2.50",
                "items": [
                    { "productId": bread, "quantity": 2, "price": "2.50" },
                    { "productId": 999, "quantity": 1, "price": "2.50" }
                ],
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Insufficient stock for one or more products");
    assert_eq!(
        body["errors"],
        json!([
            "Insufficient stock for 'Bread': available 1, requested 2",
            "Product 999 not found"
        ])
    );
    assert!(body["data"].is_null());

    let response = app
        .request(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "paymentType": 1,
                "totalAmount": "0",
                "cashReceived": "0",
                "change": "0",
                "items": [],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["message"], "No products in sale");
}

#[tokio::test]
async fn malformed_sale_body_still_answers_with_a_sale_result() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/v1/sales", Some(json!({ "paymentType": "cash" })))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid sale request");
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn client_endpoints_cover_lookup_and_removal() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/clients",
            Some(json!({
                "business_name": "Corner Cafe",
                "email": "orders@cornercafe.test",
                "tax_document": "20-1234567-8",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = response_json(response).await["data"]["id"].as_i64().unwrap();

    let found = app
        .request(Method::GET, "/api/v1/clients/by-document/20-1234567-8", None)
        .await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(response_json(found).await["data"]["id"], id);

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/clients",
            Some(json!({ "business_name": "Other", "tax_document": "20-1234567-8" })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let removed = app
        .request(Method::DELETE, &format!("/api/v1/clients/{id}"), None)
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let gone = app
        .request(Method::GET, &format!("/api/v1/clients/{id}"), None)
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"]["/api/v1/sales"].is_object());
}
