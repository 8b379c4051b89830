//! Seed data script - fills an empty database with a small demo store
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 4 categories
//! - 12 products spread over them
//! - 3 business clients
//! - 2 sales, one anonymous and one billed to a client (with `--with-sales`)

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use minimarket_pos::config::AppConfig;
use minimarket_pos::entities::{client, product};
use minimarket_pos::services::categories::CategoryInput;
use minimarket_pos::services::clients::ClientInput;
use minimarket_pos::services::products::ProductInput;
use minimarket_pos::services::sales::{SaleLineRequest, SaleRequest};
use minimarket_pos::services::{CategoryService, ClientService, ProductService, SaleService};

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate the POS database with demo data")]
struct Cli {
    /// Database URL; falls back to DATABASE_URL, then to the configured one
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Apply pending migrations first
    #[arg(long)]
    migrate: bool,

    /// Also record a couple of demo sales
    #[arg(long)]
    with_sales: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = match cli.database_url {
        Some(url) => AppConfig::new(url, "127.0.0.1".into(), 8080, "development".into()),
        None => minimarket_pos::config::load_config()
            .context("no --database-url given and configuration could not be loaded")?,
    };

    info!("=== Minimarket POS Seed Data ===");
    let db = minimarket_pos::db::establish_connection_from_app_config(&config)
        .await
        .context("failed to connect to the database")?;
    if cli.migrate {
        minimarket_pos::db::run_migrations(&db).await?;
    }
    let db = Arc::new(db);

    let categories = CategoryService::new(db.clone());
    if !categories.list(true).await?.is_empty() {
        anyhow::bail!("the catalog already has categories; seed only an empty database");
    }

    info!("Creating catalog...");
    let products = ProductService::new(db.clone(), config.product_search_limit);
    let mut created = Vec::new();
    for (category_name, description, items) in catalog() {
        let category = categories
            .create(CategoryInput {
                name: category_name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;

        for (name, brand, price, stock) in items {
            let model = products
                .create(ProductInput {
                    name: name.to_string(),
                    description: None,
                    brand: Some(brand.to_string()),
                    price,
                    stock,
                    category_id: category.id,
                    status: None,
                })
                .await?;
            created.push(model);
        }
    }
    info!("  Created {} products", created.len());

    info!("Creating clients...");
    let clients = ClientService::new(db.clone());
    let mut registered = Vec::new();
    for (business_name, email, tax_document) in [
        ("Corner Cafe", "orders@cornercafe.test", "20-12345678-9"),
        ("Green Grocer", "billing@greengrocer.test", "20-87654321-0"),
        ("Night Owl Kiosk", "owner@nightowl.test", "27-11223344-5"),
    ] {
        let client = clients
            .create(ClientInput {
                business_name: business_name.to_string(),
                email: Some(email.to_string()),
                address: None,
                tax_document: tax_document.to_string(),
                status: None,
            })
            .await?;
        registered.push(client);
    }
    info!("  Created {} clients", registered.len());

    if cli.with_sales {
        info!("Recording demo sales...");
        let sales = SaleService::from_config(db.clone(), &config);
        let count = record_demo_sales(&sales, &created, &registered).await?;
        info!("  Recorded {} sales", count);
    }

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/products");
    info!("  curl 'http://localhost:8080/api/v1/products/search?term=milk'");
    info!("  curl http://localhost:8080/api/v1/sales");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

type SeedProduct = (&'static str, &'static str, Decimal, i32);

fn catalog() -> Vec<(&'static str, &'static str, Vec<SeedProduct>)> {
    vec![
        (
            "Dairy",
            "Milk, cheese and yogurt",
            vec![
                ("Whole Milk 1L", "La Granja", dec!(2), 40),
                ("Natural Yogurt", "La Granja", dec!(1), 25),
                ("Cheddar Cheese 200g", "Valle Verde", dec!(4), 12),
            ],
        ),
        (
            "Beverages",
            "Soft drinks, water and juices",
            vec![
                ("Mineral Water 500ml", "Fuente Clara", dec!(1), 100),
                ("Orange Juice 1L", "Citrus & Co", dec!(3), 30),
                ("Cola 2L", "Fizz", dec!(3), 48),
            ],
        ),
        (
            "Bakery",
            "Bread and pastries",
            vec![
                ("Sliced Bread", "Panadero", dec!(2), 20),
                ("Butter Croissant", "Panadero", dec!(1), 35),
                ("Corn Tortillas", "Maizal", dec!(2), 18),
            ],
        ),
        (
            "Cleaning",
            "Household cleaning supplies",
            vec![
                ("Dish Soap 750ml", "Brillo", dec!(3), 15),
                ("Paper Towels x2", "Suave", dec!(4), 22),
                ("Bleach 1L", "Brillo", dec!(2), 10),
            ],
        ),
    ]
}

async fn record_demo_sales(
    sales: &SaleService,
    products: &[product::Model],
    clients: &[client::Model],
) -> anyhow::Result<usize> {
    let baskets: Vec<(Option<i32>, Vec<(&product::Model, i32)>)> = vec![
        (
            None,
            products.iter().take(2).map(|p| (p, 2)).collect(),
        ),
        (
            clients.first().map(|c| c.id),
            products.iter().skip(3).take(3).map(|p| (p, 1)).collect(),
        ),
    ];

    let mut recorded = 0;
    for (client_id, lines) in baskets {
        let items: Vec<SaleLineRequest> = lines
            .iter()
            .map(|(product, quantity)| SaleLineRequest {
                product_id: product.id,
                quantity: *quantity,
                price: product.price,
            })
            .collect();
        let total: Decimal = items
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();
        let cash_received = total.ceil() + dec!(5);

        let receipt = sales
            .create_sale(SaleRequest {
                client_id,
                payment_type: 1,
                total_amount: total,
                cash_received,
                change: cash_received - total,
                items,
            })
            .await
            .map_err(|err| anyhow::anyhow!("demo sale failed: {err}"))?;
        info!(sale_id = receipt.sale_id, total = %receipt.total_amount, "Recorded demo sale");
        recorded += 1;
    }

    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn database_url_can_come_from_the_environment() {
        let command = Cli::command();
        command.clone().debug_assert();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "database_url")
            .expect("database_url argument");
        assert_eq!(arg.get_env(), Some(std::ffi::OsStr::new("DATABASE_URL")));
    }
}
