//! Transaction orchestrator - The public write and read surface of the ledger.
//!
//! Every write follows the same sequence: open the request (replays stop here),
//! read what the event depends on, validate, compute the distribution, stage
//! all mutations in a [`Transaction`], and commit them as one unit. Any error
//! before the commit drops the database transaction, so a rejected request
//! leaves no trace.

use crate::{
    config::LedgerSettings,
    entities::{
        AccountModel, ClientModel, CounterpartyKind, Currency, DistributorModel, EventKind,
        MovementModel, OrderStatus, ProductModel, PurchaseOrder, PurchaseOrderModel, Sale,
        SaleModel, SaleStatus, payment, purchase_order, sale, transfer,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use std::sync::Arc;
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set, prelude::*};
use tracing::warn;

use super::{
    Amount,
    account::{self, AccountId},
    audit::{self, AuditReport},
    counterparty,
    debt::{self, DebtDelta},
    distribution::{Distribution, LineItem, prorate_increment},
    inventory::{self, ProductUpsert},
    ledger::{self, Mutation, Opened, Receipt, Transaction},
    movement,
    report::{self, AccountStatement, ClientSummary},
    requests::{
        Counterparty, ExpenseRequest, IncomeRequest, NewClient, NewDistributor, PaymentRequest,
        PurchaseOrderRequest, SaleRequest, TransferRequest, new_request_id,
    },
    validation::{
        CreditPosition, FieldError, ProposedPurchaseOrder, ProposedSale, Validation,
        ValidationErrors, validate_expense, validate_income, validate_payment_shape,
        validate_purchase_order, validate_purchase_order_line, validate_sale, validate_sale_line,
        validate_transfer,
    },
};

fn rejected(field: &'static str, message: impl Into<String>) -> Error {
    ValidationErrors::from(vec![FieldError::new(field, message)]).into()
}

/// Entry point for every ledger operation.
///
/// Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Arc<DatabaseConnection>,
    settings: LedgerSettings,
}

impl Ledger {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        Self {
            db: Arc::new(db),
            settings,
        }
    }

    /// Underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Engine settings.
    #[must_use]
    pub const fn settings(&self) -> LedgerSettings {
        self.settings
    }

    const fn require_funds(&self) -> bool {
        !self.settings.allow_overdraft
    }

    // ----- counterparties -----

    /// Creates a client.
    pub async fn create_client(&self, request: NewClient) -> Result<ClientModel> {
        counterparty::create_client(self.connection(), &request)
            .await
            .inspect_err(|err| warn!("Rejected client {}: {}", request.id, err))
    }

    /// Creates a distributor.
    pub async fn create_distributor(&self, request: NewDistributor) -> Result<DistributorModel> {
        counterparty::create_distributor(self.connection(), &request)
            .await
            .inspect_err(|err| warn!("Rejected distributor {}: {}", request.id, err))
    }

    // ----- business events -----

    /// Records a sale, the client's new debt, stock and any up-front payment.
    pub async fn create_sale(&self, request: SaleRequest) -> Result<Receipt> {
        let txn = match ledger::open(self.connection(), &request.id).await? {
            Opened::Fresh(txn) => txn,
            Opened::Replayed(receipt) => return Ok(receipt),
        };
        let planned = self.plan_sale(&txn, &request).await;
        commit(txn, planned)
            .await
            .inspect_err(|err| warn!("Rejected sale {}: {}", request.id, err))
    }

    /// Records a purchase order, the distributor's new debt, stock and any initial payment.
    pub async fn create_purchase_order(&self, request: PurchaseOrderRequest) -> Result<Receipt> {
        let txn = match ledger::open(self.connection(), &request.id).await? {
            Opened::Fresh(txn) => txn,
            Opened::Replayed(receipt) => return Ok(receipt),
        };
        let planned = self.plan_purchase_order(&txn, &request).await;
        commit(txn, planned)
            .await
            .inspect_err(|err| warn!("Rejected purchase order {}: {}", request.id, err))
    }

    /// Reconciles a payment from a client or to a distributor.
    pub async fn register_payment(&self, request: PaymentRequest) -> Result<Receipt> {
        let txn = match ledger::open(self.connection(), &request.id).await? {
            Opened::Fresh(txn) => txn,
            Opened::Replayed(receipt) => return Ok(receipt),
        };
        let planned = match &request.counterparty {
            Counterparty::Client(client_id) => {
                self.plan_client_payment(&txn, &request, client_id).await
            }
            Counterparty::Distributor(distributor_id) => {
                self.plan_distributor_payment(&txn, &request, distributor_id)
                    .await
            }
        };
        commit(txn, planned)
            .await
            .inspect_err(|err| warn!("Rejected payment {}: {}", request.id, err))
    }

    /// Moves money between two accounts.
    pub async fn register_transfer(&self, request: TransferRequest) -> Result<Receipt> {
        validate_transfer(&request)
            .map_err(Error::from)
            .inspect_err(|err| warn!("Rejected transfer {}: {}", request.id, err))?;
        let txn = match ledger::open(self.connection(), &request.id).await? {
            Opened::Fresh(txn) => txn,
            Opened::Replayed(receipt) => return Ok(receipt),
        };

        let memo = request.memo.trim();
        let mut tx = Transaction::new(request.id.as_str(), EventKind::Transfer);
        tx.push(Mutation::InsertTransfer(transfer::ActiveModel {
            id: Set(request.id.clone()),
            from_account: Set(request.from.as_str().to_string()),
            to_account: Set(request.to.as_str().to_string()),
            amount: Set(request.amount),
            memo: Set(memo.to_string()),
            created_at: Set(Utc::now()),
        }))
        .transfer(
            request.from,
            request.to,
            request.amount,
            self.require_funds(),
            memo,
        );
        tx.commit(txn)
            .await
            .inspect_err(|err| warn!("Rejected transfer {}: {}", request.id, err))
    }

    /// Records income received directly into an operational account.
    pub async fn register_income(&self, request: IncomeRequest) -> Result<Receipt> {
        validate_income(&request)
            .map_err(Error::from)
            .inspect_err(|err| warn!("Rejected income {}: {}", request.id, err))?;
        let txn = match ledger::open(self.connection(), &request.id).await? {
            Opened::Fresh(txn) => txn,
            Opened::Replayed(receipt) => return Ok(receipt),
        };

        let mut tx = Transaction::new(request.id.as_str(), EventKind::Income);
        tx.credit(request.account, request.amount, request.memo.trim());
        tx.commit(txn)
            .await
            .inspect_err(|err| warn!("Rejected income {}: {}", request.id, err))
    }

    /// Records an expense paid directly from an account.
    pub async fn register_expense(&self, request: ExpenseRequest) -> Result<Receipt> {
        validate_expense(&request)
            .map_err(Error::from)
            .inspect_err(|err| warn!("Rejected expense {}: {}", request.id, err))?;
        let txn = match ledger::open(self.connection(), &request.id).await? {
            Opened::Fresh(txn) => txn,
            Opened::Replayed(receipt) => return Ok(receipt),
        };

        let mut tx = Transaction::new(request.id.as_str(), EventKind::Expense);
        tx.debit(
            request.account,
            request.amount,
            self.require_funds(),
            request.memo.trim(),
        );
        tx.commit(txn)
            .await
            .inspect_err(|err| warn!("Rejected expense {}: {}", request.id, err))
    }

    // ----- planning -----

    async fn plan_sale(&self, txn: &DatabaseTransaction, request: &SaleRequest) -> Result<Transaction> {
        let client = counterparty::get_client(txn, &request.client_id)
            .await?
            .ok_or_else(|| Error::not_found("client", request.client_id.as_str()))?;

        let order = match &request.purchase_order_id {
            Some(order_id) => Some(
                PurchaseOrder::find_by_id(order_id.as_str())
                    .one(txn)
                    .await?
                    .ok_or_else(|| Error::not_found("purchase order", order_id.as_str()))?,
            ),
            None => None,
        };
        let unit_cost = match (request.unit_cost, &order) {
            (Some(unit_cost), _) => unit_cost,
            (None, Some(order)) => order.unit_total_cost,
            (None, None) => {
                return Err(rejected(
                    "unit_cost",
                    "is required when no purchase order is referenced",
                ));
            }
        };

        let product_id = request
            .product_id
            .clone()
            .or_else(|| order.as_ref().and_then(|order| order.product_id.clone()));
        if let Some(product_id) = &product_id {
            if inventory::get_product_by_id(txn, product_id).await?.is_none() {
                return Err(Error::not_found("product", product_id.as_str()));
            }
        }

        let line = LineItem {
            unit_sale_price: request.unit_sale_price,
            unit_cost,
            unit_freight: request
                .unit_freight
                .unwrap_or(self.settings.default_unit_freight),
            quantity: request.quantity,
        };
        let proposed = ProposedSale::compute(line, request.include_freight, request.amount_paid)
            .ok_or_else(|| out_of_range(validate_sale_line(&line, request.amount_paid), "total"))?;
        validate_sale(
            &proposed,
            Some(CreditPosition {
                owed: client.total_owed,
                limit: client.credit_limit,
            }),
        )?;

        let now = Utc::now();
        let stored_freight = if request.include_freight { line.unit_freight } else { 0 };
        let mut tx = Transaction::new(request.id.as_str(), EventKind::Sale);
        tx.push(Mutation::InsertSale(sale::ActiveModel {
            id: Set(request.id.clone()),
            client_id: Set(client.id.clone()),
            purchase_order_id: Set(request.purchase_order_id.clone()),
            product_id: Set(product_id.clone()),
            quantity: Set(line.quantity),
            unit_sale_price: Set(line.unit_sale_price),
            unit_cost: Set(line.unit_cost),
            unit_freight: Set(stored_freight),
            include_freight: Set(request.include_freight),
            currency: Set(request.currency),
            total: Set(proposed.total),
            amount_paid: Set(proposed.amount_paid),
            amount_remaining: Set(proposed.amount_remaining),
            status: Set(SaleStatus::from_amounts(
                proposed.amount_paid,
                proposed.amount_remaining,
            )),
            cost_recovery: Set(proposed.distribution.cost_recovery),
            freight: Set(proposed.distribution.freight),
            profit: Set(proposed.distribution.profit),
            created_at: Set(now),
            updated_at: Set(now),
        }))
        .push(Mutation::Debt(DebtDelta::obligation(
            Counterparty::Client(client.id.clone()),
            proposed.amount_remaining,
            proposed.amount_paid,
        )));
        if let Some(product_id) = product_id {
            tx.push(Mutation::Stock {
                product_id,
                delta: -line.quantity,
            });
        }

        let credited = prorate_increment(&proposed.distribution, proposed.total, 0, proposed.amount_paid);
        credit_distribution(
            &mut tx,
            &request.id,
            request.currency,
            &credited,
            &format!("Sale {}", request.id),
        );
        Ok(tx)
    }

    async fn plan_purchase_order(
        &self,
        txn: &DatabaseTransaction,
        request: &PurchaseOrderRequest,
    ) -> Result<Transaction> {
        let distributor = counterparty::get_distributor(txn, &request.distributor_id)
            .await?
            .ok_or_else(|| Error::not_found("distributor", request.distributor_id.as_str()))?;

        let proposed = ProposedPurchaseOrder::compute(
            &request.product_name,
            request.quantity,
            request.unit_distributor_cost,
            request.unit_transport_cost,
            request.initial_payment,
            request.source_account,
        )
        .ok_or_else(|| {
            out_of_range(
                validate_purchase_order_line(
                    request.quantity,
                    request.unit_distributor_cost,
                    request.unit_transport_cost,
                    request.initial_payment,
                ),
                "grand_total",
            )
        })?;
        validate_purchase_order(&proposed)?;

        let product_id = inventory::get_product_by_name(txn, &proposed.product_name)
            .await?
            .map_or_else(new_request_id, |product| product.id);

        let now = Utc::now();
        let mut tx = Transaction::new(request.id.as_str(), EventKind::PurchaseOrder);
        tx.push(Mutation::UpsertProduct(ProductUpsert {
            id: product_id.clone(),
            name: proposed.product_name.clone(),
            unit_cost: proposed.unit_total_cost,
        }))
        .push(Mutation::Stock {
            product_id: product_id.clone(),
            delta: proposed.quantity,
        })
        .push(Mutation::InsertPurchaseOrder(purchase_order::ActiveModel {
            id: Set(request.id.clone()),
            distributor_id: Set(distributor.id.clone()),
            product_id: Set(Some(product_id)),
            product_name: Set(proposed.product_name.clone()),
            quantity: Set(proposed.quantity),
            unit_distributor_cost: Set(proposed.unit_distributor_cost),
            unit_transport_cost: Set(proposed.unit_transport_cost),
            unit_total_cost: Set(proposed.unit_total_cost),
            grand_total: Set(proposed.grand_total),
            initial_payment: Set(proposed.initial_payment),
            amount_paid: Set(proposed.initial_payment),
            remaining_debt: Set(proposed.remaining_debt),
            status: Set(OrderStatus::from_amounts(
                proposed.initial_payment,
                proposed.remaining_debt,
            )),
            source_account: Set(proposed.source_account.map(|id| id.as_str().to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }))
        .push(Mutation::Debt(DebtDelta::order(
            distributor.id,
            proposed.grand_total,
            proposed.initial_payment,
        )));
        if let Some(source) = proposed.source_account {
            tx.debit(
                source,
                proposed.initial_payment,
                self.require_funds(),
                &format!("Purchase order {}: {}", request.id, proposed.product_name),
            );
        }
        Ok(tx)
    }

    async fn plan_client_payment(
        &self,
        txn: &DatabaseTransaction,
        request: &PaymentRequest,
        client_id: &str,
    ) -> Result<Transaction> {
        validate_payment_shape(request.amount, &request.memo, false, request.account)?;
        let client = counterparty::get_client(txn, client_id)
            .await?
            .ok_or_else(|| Error::not_found("client", client_id))?;
        check_outstanding(request, client.total_owed)?;

        let open_sales = match &request.target_id {
            Some(sale_id) => {
                let sale = Sale::find_by_id(sale_id.as_str())
                    .one(txn)
                    .await?
                    .filter(|sale| sale.client_id == client.id)
                    .ok_or_else(|| Error::not_found("sale", sale_id.as_str()))?;
                vec![sale]
            }
            None => debt::open_sales_for_client(txn, &client.id).await?,
        };
        let remaining: Vec<Amount> = open_sales.iter().map(|sale| sale.amount_remaining).collect();
        let allocation = allocate(request.amount, &remaining)?;

        let memo = payment_memo(request);
        let mut tx = Transaction::new(request.id.as_str(), EventKind::Payment);
        tx.push(insert_payment(request, CounterpartyKind::Client, client.total_owed));
        for (sale, part) in open_sales.iter().zip(allocation) {
            if part == 0 {
                continue;
            }
            tx.push(Mutation::SalePayment {
                sale_id: sale.id.clone(),
                amount: part,
            });
            let full = Distribution {
                cost_recovery: sale.cost_recovery,
                freight: sale.freight,
                profit: sale.profit,
            };
            let credited =
                prorate_increment(&full, sale.total, sale.amount_paid, sale.amount_paid + part);
            credit_distribution(&mut tx, &sale.id, sale.currency, &credited, &memo);
        }
        tx.push(Mutation::Debt(DebtDelta::payment(
            Counterparty::Client(client.id),
            request.amount,
        )));
        Ok(tx)
    }

    async fn plan_distributor_payment(
        &self,
        txn: &DatabaseTransaction,
        request: &PaymentRequest,
        distributor_id: &str,
    ) -> Result<Transaction> {
        validate_payment_shape(request.amount, &request.memo, true, request.account)?;
        let source = request
            .account
            .ok_or_else(|| rejected("account", "distributor payments require a source account"))?;
        let distributor = counterparty::get_distributor(txn, distributor_id)
            .await?
            .ok_or_else(|| Error::not_found("distributor", distributor_id))?;
        check_outstanding(request, distributor.total_owed)?;

        let open_orders = match &request.target_id {
            Some(order_id) => {
                let order = PurchaseOrder::find_by_id(order_id.as_str())
                    .one(txn)
                    .await?
                    .filter(|order| order.distributor_id == distributor.id)
                    .ok_or_else(|| Error::not_found("purchase order", order_id.as_str()))?;
                vec![order]
            }
            None => debt::open_orders_for_distributor(txn, &distributor.id).await?,
        };
        let remaining: Vec<Amount> = open_orders.iter().map(|order| order.remaining_debt).collect();
        let allocation = allocate(request.amount, &remaining)?;

        let mut tx = Transaction::new(request.id.as_str(), EventKind::Payment);
        tx.push(insert_payment(
            request,
            CounterpartyKind::Distributor,
            distributor.total_owed,
        ));
        for (order, part) in open_orders.iter().zip(allocation) {
            if part > 0 {
                tx.push(Mutation::OrderPayment {
                    order_id: order.id.clone(),
                    amount: part,
                });
            }
        }
        tx.push(Mutation::Debt(DebtDelta::payment(
            Counterparty::Distributor(distributor.id),
            request.amount,
        )))
        .debit(
            source,
            request.amount,
            self.require_funds(),
            &payment_memo(request),
        );
        Ok(tx)
    }

    // ----- read side -----

    /// One account, if it has been created.
    pub async fn get_account(&self, account: AccountId) -> Result<Option<AccountModel>> {
        account::get_account(self.connection(), account).await
    }

    /// Every account in display order.
    pub async fn accounts(&self) -> Result<Vec<AccountModel>> {
        account::get_all_accounts(self.connection()).await
    }

    /// Movements of one account, newest first.
    pub async fn movements_for_account(
        &self,
        account: AccountId,
        limit: Option<u64>,
    ) -> Result<Vec<MovementModel>> {
        movement::movements_for_account(self.connection(), account, limit).await
    }

    /// Movements written by one request.
    pub async fn movements_for_source(&self, source_id: &str) -> Result<Vec<MovementModel>> {
        movement::movements_for_source(self.connection(), source_id).await
    }

    /// A sale by id.
    pub async fn get_sale(&self, sale_id: &str) -> Result<Option<SaleModel>> {
        Sale::find_by_id(sale_id)
            .one(self.connection())
            .await
            .map_err(Into::into)
    }

    /// A purchase order by id.
    pub async fn get_purchase_order(&self, order_id: &str) -> Result<Option<PurchaseOrderModel>> {
        PurchaseOrder::find_by_id(order_id)
            .one(self.connection())
            .await
            .map_err(Into::into)
    }

    /// A client by id.
    pub async fn get_client(&self, client_id: &str) -> Result<Option<ClientModel>> {
        counterparty::get_client(self.connection(), client_id).await
    }

    /// A distributor by id.
    pub async fn get_distributor(&self, distributor_id: &str) -> Result<Option<DistributorModel>> {
        counterparty::get_distributor(self.connection(), distributor_id).await
    }

    /// A product by id.
    pub async fn get_product(&self, product_id: &str) -> Result<Option<ProductModel>> {
        inventory::get_product_by_id(self.connection(), product_id).await
    }

    /// Every product, sorted by name.
    pub async fn products(&self) -> Result<Vec<ProductModel>> {
        inventory::get_all_products(self.connection()).await
    }

    /// A product by name.
    pub async fn get_product_by_name(&self, name: &str) -> Result<Option<ProductModel>> {
        inventory::get_product_by_name(self.connection(), name).await
    }

    /// Sales of a client that still owe something, oldest first.
    pub async fn open_sales_for_client(&self, client_id: &str) -> Result<Vec<SaleModel>> {
        debt::open_sales_for_client(self.connection(), client_id).await
    }

    /// Orders still owed to a distributor, oldest first.
    pub async fn open_orders_for_distributor(
        &self,
        distributor_id: &str,
    ) -> Result<Vec<PurchaseOrderModel>> {
        debt::open_orders_for_distributor(self.connection(), distributor_id).await
    }

    /// Balance, lifetime totals and the latest movements of one account.
    pub async fn account_statement(
        &self,
        account: AccountId,
        limit: Option<u64>,
    ) -> Result<AccountStatement> {
        report::account_statement(self.connection(), account, limit).await
    }

    /// Aggregate distribution and debt position of one client.
    pub async fn client_summary(&self, client_id: &str) -> Result<ClientSummary> {
        report::client_summary(self.connection(), client_id).await
    }

    /// Rebuilds derived totals and reports mismatches.
    pub async fn audit(&self) -> Result<AuditReport> {
        audit::audit(self.connection()).await
    }

    /// Like [`Ledger::audit`], but any mismatch is an [`Error::InvariantViolation`].
    pub async fn verify(&self) -> Result<AuditReport> {
        audit::verify(self.connection()).await
    }
}

// Reports the range errors of a line too large to compute with.
fn out_of_range(checked: Validation, field: &'static str) -> Error {
    checked
        .err()
        .map_or_else(|| rejected(field, "is too large"), Error::from)
}

async fn commit(txn: DatabaseTransaction, planned: Result<Transaction>) -> Result<Receipt> {
    planned?.commit(txn).await
}

fn check_outstanding(request: &PaymentRequest, outstanding: Amount) -> Result<()> {
    match request.expected_outstanding {
        Some(expected) if expected != outstanding => {
            return Err(Error::CommitConflict {
                message: format!(
                    "outstanding debt changed from {expected} to {outstanding} since it was read"
                ),
            });
        }
        _ => {}
    }
    if request.amount > outstanding {
        return Err(Error::PaymentExceedsDebt {
            outstanding,
            requested: request.amount,
        });
    }
    Ok(())
}

/// Splits `amount` across `remaining`, filling each slot in order.
fn allocate(amount: Amount, remaining: &[Amount]) -> Result<Vec<Amount>> {
    let mut left = amount;
    let parts: Vec<Amount> = remaining
        .iter()
        .map(|slot| {
            let part = left.min(*slot).max(0);
            left -= part;
            part
        })
        .collect();
    if left > 0 {
        return Err(Error::PaymentExceedsDebt {
            outstanding: remaining.iter().sum(),
            requested: amount,
        });
    }
    Ok(parts)
}

fn payment_memo(request: &PaymentRequest) -> String {
    let memo = request.memo.trim();
    if memo.is_empty() {
        format!("Payment {}", request.id)
    } else {
        memo.to_string()
    }
}

fn insert_payment(request: &PaymentRequest, kind: CounterpartyKind, debt_before: Amount) -> Mutation {
    Mutation::InsertPayment(payment::ActiveModel {
        id: Set(request.id.clone()),
        counterparty_kind: Set(kind),
        counterparty_id: Set(request.counterparty.id().to_string()),
        target_id: Set(request.target_id.clone()),
        amount: Set(request.amount),
        account_id: Set(request.account.map(|id| id.as_str().to_string())),
        memo: Set(request.memo.trim().to_string()),
        debt_before: Set(debt_before),
        debt_after: Set(debt_before - request.amount),
        created_at: Set(Utc::now()),
    })
}

fn credit_distribution(
    tx: &mut Transaction,
    sale: &str,
    currency: Currency,
    credited: &Distribution,
    source: &str,
) {
    tx.credit_sale(
        AccountId::cost_recovery_for(currency),
        credited.cost_recovery,
        &format!("{source}: cost recovery"),
        sale,
    )
    .credit_sale(
        AccountId::FleteSur,
        credited.freight,
        &format!("{source}: freight"),
        sale,
    )
    .credit_sale(
        AccountId::Utilidades,
        credited.profit,
        &format!("{source}: profit"),
        sale,
    );
}
