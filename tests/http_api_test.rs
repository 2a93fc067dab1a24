//! End-to-end requests through the full router.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, FR, IT};
use serde_json::json;
use stockroom_api::{handlers::common::ACTOR_HEADER, tracing::REQUEST_ID_HEADER};

#[tokio::test]
async fn health_and_status_report_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");

    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["service"], "stockroom-api");
}

#[tokio::test]
async fn request_id_is_echoed_and_reported_in_errors() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            Method::GET,
            "/api/v1/products/00000000-0000-0000-0000-000000000000",
            None,
            &[(REQUEST_ID_HEADER, "req-404")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "req-404"
    );
    let body = response_json(response).await;
    assert_eq!(body["request_id"], "req-404");
}

#[tokio::test]
async fn product_crud_over_http() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Dell Latitude 3420",
                "category": IT,
                "brand": "Dell",
                "price": "25000",
                "quantity": 3
            })),
            &[(ACTOR_HEADER, "admin@example.com")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let product = &body["data"]["product"];
    assert_eq!(product["p_id"], "IT-0001");
    assert_eq!(product["unit"], "ชิ้น");
    assert_eq!(product["stock_available"], 3);
    assert_eq!(body["data"]["serial_codes"][2], "IT-0001-0003");
    let id = product["id"].as_str().unwrap().to_string();

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}/serials", id), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}", id),
            Some(json!({ "quantity": 5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["product"]["stock_total"], 5);

    let response = app
        .request(Method::GET, "/api/v1/products?search=Latitude", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}/history", id), None)
        .await;
    let body = response_json(response).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .any(|row| row["changed_by"] == "admin@example.com"));

    let response = app
        .request(Method::DELETE, &format!("/api/v1/products/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payloads_map_to_client_errors() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "", "category": IT })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Chair", "category": FR, "p_id": "IT-0001" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({ "serial_id": "00000000-0000-0000-0000-000000000000" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn borrow_and_return_over_http() {
    let app = TestApp::new().await;
    let product = app.seed_product("Projector", IT, 1).await;
    let employee = app.seed_employee("EMP-100").await;

    let response = app.request(Method::GET, "/api/v1/serials/available", None).await;
    let body = response_json(response).await;
    let serial_id = body["data"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"][0]["product"]["p_id"], product.product.p_id);

    let response = app
        .request(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({
                "serial_id": serial_id,
                "employee_id": employee.employee.id,
                "note": "ประชุมลูกค้า"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "Active");
    let transaction_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({ "serial_id": serial_id, "employee_id": employee.employee.id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::GET, "/api/v1/transactions?status=Active", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(Method::GET, "/api/v1/dashboard", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["borrowed_count"], 1);
    assert_eq!(body["data"]["low_stock_items"].as_array().unwrap().len(), 1);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/transactions/{}/return", transaction_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "Completed");
    assert_eq!(body["data"]["serial"]["status"], "Ready");

    let response = app
        .request(Method::GET, "/api/v1/transactions/recent?limit=1", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/employees/{}/transactions", employee.employee.id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["id"], transaction_id.as_str());
}

#[tokio::test]
async fn csv_import_and_reference_endpoints() {
    let app = TestApp::new().await;

    let response = app
        .post_csv(
            "/api/v1/products/import",
            "name,category,quantity\nเก้าอี้สำนักงาน,FR,2\n,IT,1\n",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["success"], 1);
    assert_eq!(body["data"]["errors"][0], "row 3: name is required");

    let response = app
        .request(
            Method::GET,
            "/api/v1/products/next-sku?category=%E0%B9%80%E0%B8%9F%E0%B8%AD%E0%B8%A3%E0%B9%8C%E0%B8%99%E0%B8%B4%E0%B9%80%E0%B8%88%E0%B8%AD%E0%B8%A3%E0%B9%8C%20(FR)",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["p_id"], "FR-0002");

    let response = app.request(Method::GET, "/api/v1/categories", None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"][1]["code"], "FR");

    let response = app
        .request(Method::POST, "/api/v1/locations", Some(json!({ "name": "Store A" })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app.request(Method::GET, "/api/v1/locations", None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["name"], "Store A");

    let response = app
        .request(Method::POST, "/api/v1/departments", Some(json!({ "name": "HR" })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let department_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/api/v1/employees",
            Some(json!({
                "emp_code": "EMP-200",
                "name": "Nok",
                "department_id": department_id
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["emp_code"], "EMP-200");
    assert_eq!(body["data"]["department_name"], "HR");

    let response = app
        .request(Method::GET, "/api/v1/dashboard/low-stock", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["current"], 2);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"].get("/api/v1/serials/{id}").is_some());
}
