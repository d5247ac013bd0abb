//! Request types accepted by the [`Ledger`](super::orchestrator::Ledger).
//!
//! Each request carries a caller-generated `id`. The id becomes the id of the
//! record the request creates and the `source_transaction_id` of its movements,
//! and resubmitting the same id is a no-op.

use crate::entities::Currency;
use serde::{Deserialize, Serialize};

use super::{Amount, account::AccountId};

/// Generates a fresh request id.
#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Client to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    /// Record id
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional phone
    pub phone: Option<String>,
    /// Optional email
    pub email: Option<String>,
    /// Maximum outstanding debt; 0 means no limit
    pub credit_limit: Amount,
}

impl NewClient {
    /// A client with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_request_id(),
            name: name.into(),
            phone: None,
            email: None,
            credit_limit: 0,
        }
    }
}

/// Distributor to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDistributor {
    /// Record id
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional company name
    pub company: Option<String>,
    /// Optional phone
    pub phone: Option<String>,
    /// Optional email
    pub email: Option<String>,
}

impl NewDistributor {
    /// A distributor with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_request_id(),
            name: name.into(),
            company: None,
            phone: None,
            email: None,
        }
    }
}

/// A single-line sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Sale id
    pub id: String,
    /// Buyer
    pub client_id: String,
    /// Order to look the unit cost up from when `unit_cost` is `None`
    pub purchase_order_id: Option<String>,
    /// Product whose stock the sale draws down
    pub product_id: Option<String>,
    /// Units sold
    pub quantity: i64,
    /// Price per unit
    pub unit_sale_price: Amount,
    /// Cost per unit; `None` takes it from the purchase order
    pub unit_cost: Option<Amount>,
    /// Freight per unit; `None` takes the configured default
    pub unit_freight: Option<Amount>,
    /// Whether freight is split out of the revenue
    pub include_freight: bool,
    /// Settlement currency
    pub currency: Currency,
    /// Paid at the time of sale
    pub amount_paid: Amount,
}

impl SaleRequest {
    /// An unpaid MXN sale with freight at the configured default.
    pub fn new(
        client_id: impl Into<String>,
        quantity: i64,
        unit_sale_price: Amount,
        unit_cost: Amount,
    ) -> Self {
        Self {
            id: new_request_id(),
            client_id: client_id.into(),
            purchase_order_id: None,
            product_id: None,
            quantity,
            unit_sale_price,
            unit_cost: Some(unit_cost),
            unit_freight: None,
            include_freight: true,
            currency: Currency::Mxn,
            amount_paid: 0,
        }
    }

    /// Takes the unit cost from `purchase_order_id`.
    #[must_use]
    pub fn from_order(mut self, purchase_order_id: impl Into<String>) -> Self {
        self.purchase_order_id = Some(purchase_order_id.into());
        self.unit_cost = None;
        self
    }

    /// Draws stock from `product_id`.
    #[must_use]
    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Explicit freight per unit.
    #[must_use]
    pub const fn with_freight(mut self, unit_freight: Amount) -> Self {
        self.unit_freight = Some(unit_freight);
        self
    }

    /// Leaves freight out of the split.
    #[must_use]
    pub const fn without_freight(mut self) -> Self {
        self.include_freight = false;
        self
    }

    /// Amount paid up front.
    #[must_use]
    pub const fn paid(mut self, amount: Amount) -> Self {
        self.amount_paid = amount;
        self
    }

    /// Settlement currency.
    #[must_use]
    pub const fn in_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }
}

/// An order placed with a distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderRequest {
    /// Order id
    pub id: String,
    /// Supplier
    pub distributor_id: String,
    /// Product received; created on first purchase
    pub product_name: String,
    /// Units ordered
    pub quantity: i64,
    /// Distributor's price per unit
    pub unit_distributor_cost: Amount,
    /// Transport per unit
    pub unit_transport_cost: Amount,
    /// Paid when the order is placed
    pub initial_payment: Amount,
    /// Account the initial payment leaves from
    pub source_account: Option<AccountId>,
}

impl PurchaseOrderRequest {
    /// An unpaid order.
    pub fn new(
        distributor_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_distributor_cost: Amount,
        unit_transport_cost: Amount,
    ) -> Self {
        Self {
            id: new_request_id(),
            distributor_id: distributor_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_distributor_cost,
            unit_transport_cost,
            initial_payment: 0,
            source_account: None,
        }
    }

    /// Pays `amount` up front from `account`.
    #[must_use]
    pub const fn with_initial_payment(mut self, amount: Amount, account: AccountId) -> Self {
        self.initial_payment = amount;
        self.source_account = Some(account);
        self
    }
}

/// Who a payment settles debt with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Counterparty {
    /// Client paying the business
    Client(String),
    /// Business paying a distributor
    Distributor(String),
}

impl Counterparty {
    /// Record id of the counterparty.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Client(id) | Self::Distributor(id) => id,
        }
    }
}

/// A payment reconciling counterparty debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Payment id
    pub id: String,
    /// Client or distributor
    pub counterparty: Counterparty,
    /// Sale or order to apply the payment to; `None` settles oldest first
    pub target_id: Option<String>,
    /// Amount paid
    pub amount: Amount,
    /// Source account, required for distributor payments
    pub account: Option<AccountId>,
    /// Free-text memo
    pub memo: String,
    /// When set, the payment only commits if the outstanding debt still equals this value
    pub expected_outstanding: Option<Amount>,
}

impl PaymentRequest {
    /// A client payment allocated oldest sale first.
    pub fn from_client(client_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            id: new_request_id(),
            counterparty: Counterparty::Client(client_id.into()),
            target_id: None,
            amount,
            account: None,
            memo: String::new(),
            expected_outstanding: None,
        }
    }

    /// A distributor payment from `account`, allocated oldest order first.
    pub fn to_distributor(
        distributor_id: impl Into<String>,
        amount: Amount,
        account: AccountId,
    ) -> Self {
        Self {
            id: new_request_id(),
            counterparty: Counterparty::Distributor(distributor_id.into()),
            target_id: None,
            amount,
            account: Some(account),
            memo: String::new(),
            expected_outstanding: None,
        }
    }

    /// Applies the payment to one sale or order.
    #[must_use]
    pub fn for_record(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Memo for the movement log.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Optimistic-concurrency token: the outstanding debt the caller last read.
    #[must_use]
    pub const fn expecting_outstanding(mut self, outstanding: Amount) -> Self {
        self.expected_outstanding = Some(outstanding);
        self
    }
}

/// Money moved between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Transfer id
    pub id: String,
    /// Debited account
    pub from: AccountId,
    /// Credited account
    pub to: AccountId,
    /// Amount moved
    pub amount: Amount,
    /// Free-text memo
    pub memo: String,
}

impl TransferRequest {
    /// Transfer with a fresh id.
    pub fn new(from: AccountId, to: AccountId, amount: Amount, memo: impl Into<String>) -> Self {
        Self {
            id: new_request_id(),
            from,
            to,
            amount,
            memo: memo.into(),
        }
    }
}

/// Income received directly into an operational account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRequest {
    /// Entry id
    pub id: String,
    /// Destination
    pub account: AccountId,
    /// Amount received
    pub amount: Amount,
    /// Free-text memo
    pub memo: String,
}

impl IncomeRequest {
    /// Income with a fresh id.
    pub fn new(account: AccountId, amount: Amount, memo: impl Into<String>) -> Self {
        Self {
            id: new_request_id(),
            account,
            amount,
            memo: memo.into(),
        }
    }
}

/// Expense paid directly from an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    /// Entry id
    pub id: String,
    /// Source
    pub account: AccountId,
    /// Amount spent
    pub amount: Amount,
    /// Free-text memo
    pub memo: String,
}

impl ExpenseRequest {
    /// Expense with a fresh id.
    pub fn new(account: AccountId, amount: Amount, memo: impl Into<String>) -> Self {
        Self {
            id: new_request_id(),
            account,
            amount,
            memo: memo.into(),
        }
    }
}
