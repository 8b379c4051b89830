use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Minimarket POS API",
        version = "1.0.0",
        description = r#"
# Minimarket Point-of-Sale API

Backend for a convenience-store till: product catalog, client registry and
sale checkout.

## Features

- **Catalog**: categories and products with soft activation status
- **Search**: case-insensitive product lookup for the till
- **Clients**: business clients identified by tax document
- **Sales**: stock-checked, all-or-nothing sale recording

## Error Handling

Catalog and client endpoints answer errors with a consistent body:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "details": ["name: must be between 1 and 100 characters"],
  "request_id": "3f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

The sale endpoint always answers with a `SaleResult` and uses the status code
to tell recorded (201), rejected (400/422) and failed (500) sales apart.

## Pagination

The sale listing accepts `page` (default 1) and `per_page` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Product category endpoints"),
        (name = "Products", description = "Product catalog and stock endpoints"),
        (name = "Clients", description = "Client registry endpoints"),
        (name = "Sales", description = "Sale checkout and history endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::deactivate_category,
        crate::handlers::categories::activate_category,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::search_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::deactivate_product,
        crate::handlers::products::check_stock,

        // Clients
        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_client,
        crate::handlers::clients::get_client_by_document,
        crate::handlers::clients::update_client,
        crate::handlers::clients::remove_client,

        // Sales
        crate::handlers::sales::create_sale,
        crate::handlers::sales::list_sales,
        crate::handlers::sales::get_sale,

        // Health
        crate::health_check,
        crate::api_status,
    ),
    components(
        schemas(
            crate::entities::RecordStatus,
            crate::entities::sale::PaymentType,
            crate::services::categories::CategoryInput,
            crate::services::products::ProductInput,
            crate::services::clients::ClientInput,
            crate::services::sales::SaleRequest,
            crate::services::sales::SaleLineRequest,
            crate::services::sales::SaleReceipt,
            crate::services::sales::SaleResult,
            crate::handlers::products::StockAvailability,
            crate::ResponseMeta,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
