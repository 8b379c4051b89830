//! The sale workflow: validate a basket, then record the sale and take the
//! sold units out of stock in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::NotSet, DatabaseConnection, DatabaseTransaction, DbErr, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::{AppConfig, SaleTotalPolicy};
use crate::entities::product::Model as ProductModel;
use crate::entities::sale::{self, Model as SaleModel, PaymentType};
use crate::entities::sale_item::{self, Model as SaleItemModel};
use crate::errors::ServiceError;
use crate::repositories::{Page, UnitOfWork};
use crate::validation::{collect_messages, validate_money};

const SALE_COMPLETED: &str = "Sale completed successfully";
const SALE_FAILED_UNEXPECTEDLY: &str = "An unexpected error occurred while processing the sale";

/// One basket line as sent by the till.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub product_id: i32,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
    /// Unit price charged. Recorded as-is on the sale line.
    #[validate(custom = "validate_money")]
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    #[serde(default)]
    pub client_id: Option<i32>,
    /// 1 cash, 2 card, 3 transfer
    #[validate(range(min = 1, max = 3, message = "must be 1 (cash), 2 (card) or 3 (transfer)"))]
    pub payment_type: u8,
    #[validate(custom = "validate_money")]
    #[schema(value_type = String, example = "15.00")]
    pub total_amount: Decimal,
    #[validate(custom = "validate_money")]
    #[schema(value_type = String, example = "20.00")]
    pub cash_received: Decimal,
    #[validate(custom = "validate_money")]
    #[schema(value_type = String, example = "5.00")]
    pub change: Decimal,
    #[validate]
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
}

impl SaleRequest {
    /// Sum of `quantity * price` over every line.
    pub fn computed_total(&self) -> Decimal {
        self.items
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum()
    }
}

/// What the till prints once a sale is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale_id: i32,
    pub sale_date: DateTime<Utc>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub cash_received: Decimal,
    #[schema(value_type = String)]
    pub change: Decimal,
    /// Number of lines, not units.
    pub items_count: usize,
}

/// Outcome of the sale endpoint, success or not.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleResult {
    pub success: bool,
    pub message: String,
    pub data: Option<SaleReceipt>,
    pub errors: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    #[error("No products in sale")]
    EmptySale,

    #[error("Invalid sale request")]
    InvalidRequest(Vec<String>),

    #[error("Client {0} not found or inactive")]
    ClientUnavailable(i32),

    #[error("Insufficient stock for one or more products")]
    StockUnavailable(Vec<String>),

    #[error("Declared total {declared} does not match the computed total {computed}")]
    TotalMismatch { declared: Decimal, computed: Decimal },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl SaleError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EmptySale
            | Self::ClientUnavailable(_)
            | Self::StockUnavailable(_)
            | Self::TotalMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the cashier. Database details never leave the service.
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) => SALE_FAILED_UNEXPECTEDLY.to_string(),
            other => other.to_string(),
        }
    }

    /// Per-line or per-field details, when there are any.
    pub fn details(&self) -> Vec<String> {
        match self {
            Self::InvalidRequest(messages) | Self::StockUnavailable(messages) => messages.clone(),
            Self::Database(_) => Vec::new(),
            other => vec![other.to_string()],
        }
    }
}

impl From<Result<SaleReceipt, SaleError>> for SaleResult {
    fn from(outcome: Result<SaleReceipt, SaleError>) -> Self {
        match outcome {
            Ok(receipt) => SaleResult {
                success: true,
                message: SALE_COMPLETED.to_string(),
                data: Some(receipt),
                errors: Vec::new(),
            },
            Err(err) => SaleResult {
                success: false,
                message: err.user_message(),
                data: None,
                errors: err.details(),
            },
        }
    }
}

/// A recorded sale with its lines.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: SaleModel,
    pub items: Vec<SaleItemModel>,
}

/// Every reason the basket cannot be sold as-is, one message per line.
///
/// Duplicated products and non-positive quantities are reported alongside
/// missing, inactive and short products.
pub fn line_violations(
    lines: &[SaleLineRequest],
    products: &HashMap<i32, ProductModel>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut violations = Vec::new();

    for line in lines {
        if !seen.insert(line.product_id) {
            violations.push(format!(
                "Product {} appears on more than one line",
                line.product_id
            ));
            continue;
        }
        if line.quantity < 1 {
            violations.push(format!(
                "Invalid quantity {} for product {}",
                line.quantity, line.product_id
            ));
            continue;
        }

        match products.get(&line.product_id) {
            None => violations.push(format!("Product {} not found", line.product_id)),
            Some(product) if !product.status.is_active() => violations.push(format!(
                "Product '{}' is not available for sale",
                product.name
            )),
            Some(product) if product.stock < line.quantity => violations.push(format!(
                "Insufficient stock for '{}': available {}, requested {}",
                product.name, product.stock, line.quantity
            )),
            Some(_) => {}
        }
    }

    violations
}

/// Commits the transaction when the sale was written, rolls it back otherwise.
async fn settle(
    txn: DatabaseTransaction,
    outcome: Result<SaleReceipt, SaleError>,
) -> Result<SaleReceipt, SaleError> {
    match outcome {
        Ok(receipt) => {
            txn.commit().await.map_err(|e| {
                error!(error = %e, "Sale transaction failed to commit");
                SaleError::Database(e)
            })?;
            info!(
                sale_id = receipt.sale_id,
                total = %receipt.total_amount,
                items = receipt.items_count,
                "Sale recorded"
            );
            Ok(receipt)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(error = %rollback_err, "Sale transaction rollback failed");
            }
            match &err {
                SaleError::Database(db_err) => {
                    error!(error = %db_err, "Sale aborted by a database error")
                }
                other => warn!(reason = %other, details = ?other.details(), "Sale rejected"),
            }
            Err(err)
        }
    }
}

#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    policy: SaleTotalPolicy,
    tolerance: Decimal,
}

impl SaleService {
    pub fn new(db: Arc<DatabaseConnection>, policy: SaleTotalPolicy, tolerance: Decimal) -> Self {
        Self {
            db,
            policy,
            tolerance,
        }
    }

    pub fn from_config(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        Self::new(db, config.sale_total_policy, config.sale_total_tolerance)
    }

    /// Records a sale and decrements stock, atomically.
    ///
    /// Either the header, every line and every stock decrement commit
    /// together, or nothing is written. Not idempotent: the same request
    /// submitted twice records two sales.
    #[instrument(
        skip(self, request),
        fields(lines = request.items.len(), client_id = ?request.client_id)
    )]
    pub async fn create_sale(&self, request: SaleRequest) -> Result<SaleReceipt, SaleError> {
        if request.items.is_empty() {
            warn!("Rejected sale without products");
            return Err(SaleError::EmptySale);
        }

        request
            .validate()
            .map_err(|e| SaleError::InvalidRequest(collect_messages(&e)))?;
        let payment = PaymentType::try_from(request.payment_type).map_err(|code| {
            SaleError::InvalidRequest(vec![format!("paymentType: unknown payment type {}", code)])
        })?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Could not open the sale transaction");
            SaleError::Database(e)
        })?;

        let outcome = self.record_sale(&txn, &request, payment).await;
        settle(txn, outcome).await
    }

    async fn record_sale(
        &self,
        txn: &DatabaseTransaction,
        request: &SaleRequest,
        payment: PaymentType,
    ) -> Result<SaleReceipt, SaleError> {
        let uow = UnitOfWork::new(txn);
        let products = self.checked_basket(&uow, request).await?;
        self.write_sale(&uow, request, payment, &products).await
    }

    /// Reads the client and every product on the basket and rejects the
    /// sale if anything is off. Returns the products as read.
    async fn checked_basket(
        &self,
        uow: &UnitOfWork<'_, DatabaseTransaction>,
        request: &SaleRequest,
    ) -> Result<HashMap<i32, ProductModel>, SaleError> {
        if let Some(client_id) = request.client_id {
            let usable = uow
                .clients()
                .find_by_id(client_id)
                .await?
                .map_or(false, |client| client.status.is_active());
            if !usable {
                return Err(SaleError::ClientUnavailable(client_id));
            }
        }

        let ids: Vec<i32> = request.items.iter().map(|line| line.product_id).collect();
        let products: HashMap<i32, ProductModel> = uow
            .products()
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let violations = line_violations(&request.items, &products);
        if !violations.is_empty() {
            return Err(SaleError::StockUnavailable(violations));
        }

        self.check_total(request.total_amount, request.computed_total())?;
        Ok(products)
    }

    /// Inserts the header and lines, then takes each line off stock.
    async fn write_sale(
        &self,
        uow: &UnitOfWork<'_, DatabaseTransaction>,
        request: &SaleRequest,
        payment: PaymentType,
        products: &HashMap<i32, ProductModel>,
    ) -> Result<SaleReceipt, SaleError> {
        let header = uow
            .sales()
            .insert_header(sale::ActiveModel {
                id: NotSet,
                sale_date: Set(Utc::now()),
                total_amount: Set(request.total_amount),
                cash_received: Set(request.cash_received),
                change_given: Set(request.change),
                payment_type: Set(payment.code()),
                client_id: Set(request.client_id),
            })
            .await?;

        let lines = request
            .items
            .iter()
            .map(|line| sale_item::ActiveModel {
                sale_id: Set(header.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price: Set(line.price),
            })
            .collect();
        uow.sales().insert_items(lines).await?;

        // Guarded decrement: a concurrent sale may have taken the stock since the read.
        for line in &request.items {
            if !uow
                .products()
                .decrement_stock(line.product_id, line.quantity)
                .await?
            {
                let name = products
                    .get(&line.product_id)
                    .map(|p| p.name.as_str())
                    .unwrap_or("unknown");
                return Err(SaleError::StockUnavailable(vec![format!(
                    "Stock for '{}' changed before the sale could be recorded; requested {}",
                    name, line.quantity
                )]));
            }
        }

        Ok(SaleReceipt {
            sale_id: header.id,
            sale_date: header.sale_date,
            total_amount: request.total_amount,
            cash_received: request.cash_received,
            change: request.change,
            items_count: request.items.len(),
        })
    }

    fn check_total(&self, declared: Decimal, computed: Decimal) -> Result<(), SaleError> {
        if (declared - computed).abs() <= self.tolerance {
            return Ok(());
        }
        match self.policy {
            SaleTotalPolicy::Warn => {
                warn!(%declared, %computed, "Declared sale total differs from line total");
                Ok(())
            }
            SaleTotalPolicy::Strict => Err(SaleError::TotalMismatch { declared, computed }),
        }
    }

    pub async fn get_sale(&self, id: i32) -> Result<SaleDetail, ServiceError> {
        let (sale, items) = UnitOfWork::new(&*self.db)
            .sales()
            .find_with_items(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", id))?;
        Ok(SaleDetail { sale, items })
    }

    /// Sale headers newest first. `page` is 1-based.
    pub async fn list_sales(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Page<SaleModel>, ServiceError> {
        Ok(UnitOfWork::new(&*self.db)
            .sales()
            .list(page.max(1), per_page.clamp(1, 100))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RecordStatus;
    use crate::repositories::test_db::TestDb;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn product(id: i32, name: &str, stock: i32, status: RecordStatus) -> ProductModel {
        ProductModel {
            id,
            name: name.into(),
            description: None,
            brand: None,
            price: dec!(5.00),
            stock,
            category_id: 1,
            status,
            last_update: Utc::now(),
        }
    }

    fn line(product_id: i32, quantity: i32, price: Decimal) -> SaleLineRequest {
        SaleLineRequest {
            product_id,
            quantity,
            price,
        }
    }

    fn catalog() -> HashMap<i32, ProductModel> {
        [
            product(1, "Bread", 10, RecordStatus::Active),
            product(2, "Milk", 0, RecordStatus::Active),
            product(3, "Old soda", 40, RecordStatus::Inactive),
        ]
        .into_iter()
        .map(|p| (p.id, p))
        .collect()
    }

    fn service(policy: SaleTotalPolicy) -> SaleService {
        SaleService::new(
            Arc::new(DatabaseConnection::Disconnected),
            policy,
            dec!(0.01),
        )
    }

    #[test]
    fn sufficient_basket_has_no_violations() {
        let lines = vec![line(1, 10, dec!(5.00))];
        assert!(line_violations(&lines, &catalog()).is_empty());
    }

    #[test]
    fn every_violation_is_reported() {
        let lines = vec![
            line(2, 1, dec!(1.00)),
            line(3, 1, dec!(1.00)),
            line(99, 1, dec!(1.00)),
            line(1, 11, dec!(5.00)),
        ];
        let violations = line_violations(&lines, &catalog());
        assert_eq!(
            violations,
            vec![
                "Insufficient stock for 'Milk': available 0, requested 1".to_string(),
                "Product 'Old soda' is not available for sale".to_string(),
                "Product 99 not found".to_string(),
                "Insufficient stock for 'Bread': available 10, requested 11".to_string(),
            ]
        );
    }

    #[test]
    fn duplicate_lines_and_bad_quantities_are_violations() {
        let lines = vec![line(1, 1, dec!(5)), line(1, 2, dec!(5)), line(2, 0, dec!(1))];
        let violations = line_violations(&lines, &catalog());
        assert_eq!(violations.len(), 2);
        assert!(violations[0].contains("more than one line"));
        assert!(violations[1].contains("Invalid quantity 0"));
    }

    #[test]
    fn computed_total_sums_lines() {
        let request = SaleRequest {
            client_id: None,
            payment_type: 1,
            total_amount: dec!(17.50),
            cash_received: dec!(20),
            change: dec!(2.50),
            items: vec![line(1, 3, dec!(5.00)), line(2, 1, dec!(2.50))],
        };
        assert_eq!(request.computed_total(), dec!(17.50));
    }

    #[test]
    fn warn_policy_accepts_mismatched_total() {
        assert!(service(SaleTotalPolicy::Warn)
            .check_total(dec!(10.00), dec!(15.00))
            .is_ok());
    }

    #[test]
    fn strict_policy_rejects_mismatch_beyond_tolerance() {
        let strict = service(SaleTotalPolicy::Strict);
        assert!(strict.check_total(dec!(15.01), dec!(15.00)).is_ok());
        assert_matches!(
            strict.check_total(dec!(15.02), dec!(15.00)),
            Err(SaleError::TotalMismatch { declared, computed })
                if declared == dec!(15.02) && computed == dec!(15.00)
        );
    }

    #[tokio::test]
    async fn empty_sale_is_rejected_before_touching_the_database() {
        let request = SaleRequest {
            client_id: Some(1),
            payment_type: 1,
            total_amount: dec!(0),
            cash_received: dec!(0),
            change: dec!(0),
            items: Vec::new(),
        };
        let outcome = service(SaleTotalPolicy::Warn).create_sale(request).await;
        assert_matches!(outcome, Err(SaleError::EmptySale));
    }

    #[test]
    fn failure_result_hides_database_details() {
        let result = SaleResult::from(Err(SaleError::Database(DbErr::Custom(
            "connection reset".into(),
        ))));
        assert!(!result.success);
        assert_eq!(result.message, SALE_FAILED_UNEXPECTEDLY);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn stock_failure_result_lists_each_line() {
        let result = SaleResult::from(Err(SaleError::StockUnavailable(vec![
            "a".into(),
            "b".into(),
        ])));
        assert_eq!(result.errors, vec!["a".to_string(), "b".to_string()]);
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn stock_taken_after_the_read_rolls_the_whole_sale_back() {
        let db = TestDb::new().await;
        let bread = db.product("Bread", 10, RecordStatus::Active).await;
        let sales = SaleService::new(
            Arc::new(db.conn.clone()),
            SaleTotalPolicy::Warn,
            dec!(0.01),
        );
        let request = SaleRequest {
            client_id: None,
            payment_type: 1,
            total_amount: dec!(15.00),
            cash_received: dec!(20.00),
            change: dec!(5.00),
            items: vec![line(bread.id, 3, dec!(5.00))],
        };

        let txn = db.conn.begin().await.unwrap();
        let uow = UnitOfWork::new(&txn);
        let snapshot = sales.checked_basket(&uow, &request).await.unwrap();
        assert_eq!(snapshot[&bread.id].stock, 10);

        // another till sells 8 between the read and the write
        assert!(uow.products().decrement_stock(bread.id, 8).await.unwrap());

        let outcome = sales
            .write_sale(&uow, &request, PaymentType::Cash, &snapshot)
            .await;
        assert_matches!(
            &outcome,
            Err(SaleError::StockUnavailable(messages))
                if messages.len() == 1 && messages[0].contains("'Bread' changed before")
        );
        assert_matches!(settle(txn, outcome).await, Err(SaleError::StockUnavailable(_)));

        assert_eq!(sale::Entity::find().count(&db.conn).await.unwrap(), 0);
        assert_eq!(sale_item::Entity::find().count(&db.conn).await.unwrap(), 0);
        assert_eq!(db.stock_of(bread.id).await, 10);
    }

    #[tokio::test]
    async fn settle_commits_a_written_sale() {
        let db = TestDb::new().await;
        let milk = db.product("Milk", 4, RecordStatus::Active).await;
        let sales = SaleService::new(
            Arc::new(db.conn.clone()),
            SaleTotalPolicy::Strict,
            dec!(0.01),
        );
        let request = SaleRequest {
            client_id: None,
            payment_type: 2,
            total_amount: dec!(10.00),
            cash_received: dec!(0),
            change: dec!(0),
            items: vec![line(milk.id, 2, dec!(5.00))],
        };

        let txn = db.conn.begin().await.unwrap();
        let outcome = sales.record_sale(&txn, &request, PaymentType::Card).await;
        let receipt = settle(txn, outcome).await.unwrap();

        assert_eq!(receipt.items_count, 1);
        assert_eq!(sale::Entity::find().count(&db.conn).await.unwrap(), 1);
        assert_eq!(db.stock_of(milk.id).await, 2);
    }
}
