mod common;

use assert_matches::assert_matches;
use common::TestApp;
use minimarket_pos::entities::RecordStatus;
use minimarket_pos::errors::ServiceError;
use minimarket_pos::services::clients::ClientInput;
use minimarket_pos::services::sales::{SaleLineRequest, SaleRequest};
use rust_decimal_macros::dec;

fn client_input(business_name: &str, tax_document: &str) -> ClientInput {
    ClientInput {
        business_name: business_name.to_string(),
        email: Some("billing@example.com".to_string()),
        address: Some("12 Market Street".to_string()),
        tax_document: tax_document.to_string(),
        status: None,
    }
}

#[tokio::test]
async fn tax_documents_are_unique() {
    let app = TestApp::new().await;
    let clients = &app.state.services.clients;
    let first = clients
        .create(client_input("Corner Cafe", "20-1234567-8"))
        .await
        .unwrap();
    assert_eq!(first.status, RecordStatus::Active);

    assert_matches!(
        clients.create(client_input("Copycat", " 20-1234567-8 ")).await,
        Err(ServiceError::Conflict(ref message)) => assert!(message.contains("20-1234567-8"))
    );

    let second = clients
        .create(client_input("Green Grocer", "20-7654321-0"))
        .await
        .unwrap();
    assert_matches!(
        clients
            .update(second.id, client_input("Green Grocer", "20-1234567-8"))
            .await,
        Err(ServiceError::Conflict(_))
    );

    // Re-saving a client with its own document is fine.
    let renamed = clients
        .update(first.id, client_input("Corner Cafe & Bakery", "20-1234567-8"))
        .await
        .unwrap();
    assert_eq!(renamed.business_name, "Corner Cafe & Bakery");
}

#[tokio::test]
async fn client_fields_are_validated() {
    let app = TestApp::new().await;
    let clients = &app.state.services.clients;

    let mut bad_email = client_input("Corner Cafe", "20-1234567-8");
    bad_email.email = Some("not-an-email".into());
    assert_matches!(
        clients.create(bad_email).await,
        Err(ServiceError::ValidationError(ref m)) => assert!(m[0].starts_with("email:"))
    );

    assert_matches!(
        clients.create(client_input("Corner Cafe", "1234")).await,
        Err(ServiceError::ValidationError(ref m)) => assert!(m[0].starts_with("tax_document:"))
    );

    assert_matches!(
        clients.create(client_input("Corner Cafe", "20 1234567 8")).await,
        Err(ServiceError::ValidationError(_))
    );

    let mut blank_optional = client_input("Corner Cafe", "20-1234567-8");
    blank_optional.email = Some("  ".into());
    blank_optional.address = Some("".into());
    let created = clients.create(blank_optional).await.unwrap();
    assert_eq!(created.email, None);
    assert_eq!(created.address, None);
}

#[tokio::test]
async fn clients_are_found_by_tax_document() {
    let app = TestApp::new().await;
    let clients = &app.state.services.clients;
    let created = app.seed_client("Night Owl Kiosk", "27-11223344-5").await;

    let found = clients.get_by_tax_document("27-11223344-5").await.unwrap();
    assert_eq!(found.id, created.id);

    assert_matches!(
        clients.get_by_tax_document("00000").await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn client_listing_is_ordered_by_business_name() {
    let app = TestApp::new().await;
    app.seed_client("Zeta Market", "30-00000001-1").await;
    app.seed_client("Alpha Store", "30-00000002-2").await;

    let names: Vec<String> = app
        .state
        .services
        .clients
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.business_name)
        .collect();
    assert_eq!(names, vec!["Alpha Store", "Zeta Market"]);
}

#[tokio::test]
async fn clients_with_sales_cannot_be_removed() {
    let app = TestApp::new().await;
    let clients = &app.state.services.clients;
    let category = app.seed_category("Bakery").await;
    let bread = app.seed_product(category.id, "Bread", dec!(2), 10).await;
    let buyer = app.seed_client("Corner Cafe", "20-1234567-8").await;
    let idle = app.seed_client("Idle Shop", "20-7654321-0").await;

    app.state
        .services
        .sales
        .create_sale(SaleRequest {
            client_id: Some(buyer.id),
            payment_type: 2,
            total_amount: dec!(2),
            cash_received: dec!(0),
            change: dec!(0),
            items: vec![SaleLineRequest {
                product_id: bread.id,
                quantity: 1,
                price: dec!(2),
            }],
        })
        .await
        .unwrap();

    assert_matches!(
        clients.remove(buyer.id).await,
        Err(ServiceError::Conflict(ref message)) => assert!(message.contains("1 recorded sale"))
    );
    assert!(clients.get(buyer.id).await.is_ok());

    clients.remove(idle.id).await.unwrap();
    assert_matches!(clients.get(idle.id).await, Err(ServiceError::NotFound(_)));
    assert_matches!(clients.remove(idle.id).await, Err(ServiceError::NotFound(_)));
}
