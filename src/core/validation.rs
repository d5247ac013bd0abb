//! Validation layer - Cross-field business rules checked before anything is staged.
//!
//! Every predicate for a record kind runs, even after one fails, and the result is
//! either `Ok(())` or a [`ValidationErrors`] listing each violation with the field
//! it concerns.

use serde::Serialize;
use std::fmt;

use super::{
    Amount,
    account::AccountId,
    distribution::{Distribution, LineItem, compute_line_distribution},
    requests::{ExpenseRequest, IncomeRequest, NewClient, NewDistributor, TransferRequest},
};

/// Largest amount accepted on any request: 999,999,999.00.
pub const MAX_AMOUNT: Amount = 99_999_999_900;
/// Largest quantity accepted on a sale or order line.
pub const MAX_QUANTITY: i64 = 99_999;
/// Longest memo accepted.
pub const MAX_MEMO_LEN: usize = 200;

/// One rule violation tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name
    pub field: &'static str,
    /// What is wrong
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered, non-empty list of violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// All violations in the order the rules ran.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a value produced by a rule set; provided for completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any violation concerns `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Outcome of a rule set.
pub type Validation = std::result::Result<(), ValidationErrors>;

#[derive(Default)]
struct Rules {
    errors: Vec<FieldError>,
}

impl Rules {
    fn check(&mut self, holds: bool, field: &'static str, message: impl Into<String>) -> &mut Self {
        if !holds {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    fn amount(&mut self, field: &'static str, amount: Amount, allow_zero: bool) -> &mut Self {
        if allow_zero {
            self.check(amount >= 0, field, "cannot be negative");
        } else {
            self.check(amount > 0, field, "must be greater than 0");
        }
        self.check(amount <= MAX_AMOUNT, field, "is too large")
    }

    fn quantity(&mut self, quantity: i64) -> &mut Self {
        self.check(quantity >= 1, "quantity", "must be at least 1")
            .check(quantity <= MAX_QUANTITY, "quantity", "is too large")
    }

    fn memo(&mut self, memo: &str) -> &mut Self {
        self.check(!memo.trim().is_empty(), "memo", "is required")
            .check(
                memo.chars().count() <= MAX_MEMO_LEN,
                "memo",
                format!("cannot exceed {MAX_MEMO_LEN} characters"),
            )
    }

    fn finish(&mut self) -> Validation {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.errors)))
        }
    }
}

/// A fully computed sale about to be staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedSale {
    /// The priced line
    pub line: LineItem,
    /// Whether freight is split out
    pub include_freight: bool,
    /// Sale total
    pub total: Amount,
    /// Paid now
    pub amount_paid: Amount,
    /// Owed afterwards
    pub amount_remaining: Amount,
    /// Full three-way split
    pub distribution: Distribution,
}

/// A fully computed purchase order about to be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedPurchaseOrder {
    /// Product name
    pub product_name: String,
    /// Units
    pub quantity: i64,
    /// Distributor's price per unit
    pub unit_distributor_cost: Amount,
    /// Transport per unit
    pub unit_transport_cost: Amount,
    /// Sum of the two unit costs
    pub unit_total_cost: Amount,
    /// `unit_total_cost × quantity`
    pub grand_total: Amount,
    /// Paid now
    pub initial_payment: Amount,
    /// Owed afterwards
    pub remaining_debt: Amount,
    /// Source of the initial payment
    pub source_account: Option<AccountId>,
}

impl ProposedSale {
    /// Prices `line`. Returns `None` when a value is too large to compute with.
    #[must_use]
    pub fn compute(line: LineItem, include_freight: bool, amount_paid: Amount) -> Option<Self> {
        let amounts_fit = [
            line.unit_sale_price,
            line.unit_cost,
            line.unit_freight,
            amount_paid,
        ]
        .iter()
        .all(|amount| amount.unsigned_abs() <= MAX_AMOUNT.unsigned_abs());
        if !amounts_fit || line.quantity.unsigned_abs() > MAX_QUANTITY.unsigned_abs() {
            return None;
        }

        let split = compute_line_distribution(&line, include_freight);
        Some(Self {
            line,
            include_freight,
            total: split.total_revenue,
            amount_paid,
            amount_remaining: split.total_revenue - amount_paid,
            distribution: split.distribution,
        })
    }
}

impl ProposedPurchaseOrder {
    /// Totals an order line. Returns `None` when the arithmetic would overflow.
    #[must_use]
    pub fn compute(
        product_name: &str,
        quantity: i64,
        unit_distributor_cost: Amount,
        unit_transport_cost: Amount,
        initial_payment: Amount,
        source_account: Option<AccountId>,
    ) -> Option<Self> {
        let unit_total_cost = unit_distributor_cost.checked_add(unit_transport_cost)?;
        let grand_total = unit_total_cost.checked_mul(quantity)?;
        Some(Self {
            product_name: product_name.trim().to_string(),
            quantity,
            unit_distributor_cost,
            unit_transport_cost,
            unit_total_cost,
            grand_total,
            initial_payment,
            remaining_debt: grand_total.checked_sub(initial_payment)?,
            source_account,
        })
    }
}

/// What the buying client owes before the sale, and its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPosition {
    /// Currently owed
    pub owed: Amount,
    /// Credit limit; zero means unlimited
    pub limit: Amount,
}

fn sale_line_rules(rules: &mut Rules, line: &LineItem, amount_paid: Amount) {
    rules
        .quantity(line.quantity)
        .amount("unit_sale_price", line.unit_sale_price, false)
        .amount("unit_cost", line.unit_cost, true)
        .amount("unit_freight", line.unit_freight, true)
        .amount("amount_paid", amount_paid, true);
}

fn purchase_order_line_rules(
    rules: &mut Rules,
    quantity: i64,
    unit_distributor_cost: Amount,
    unit_transport_cost: Amount,
    initial_payment: Amount,
) {
    rules
        .quantity(quantity)
        .amount("unit_distributor_cost", unit_distributor_cost, false)
        .amount("unit_transport_cost", unit_transport_cost, true)
        .amount("initial_payment", initial_payment, true);
}

/// Range checks on a sale line. Used alone when the line cannot be priced.
pub fn validate_sale_line(line: &LineItem, amount_paid: Amount) -> Validation {
    let mut rules = Rules::default();
    sale_line_rules(&mut rules, line, amount_paid);
    rules.finish()
}

/// Every rule for a priced sale: ranges, reconciliation, margin and, when the
/// client is known, its credit limit.
pub fn validate_sale(sale: &ProposedSale, credit: Option<CreditPosition>) -> Validation {
    let line = &sale.line;
    let charged_freight = if sale.include_freight { line.unit_freight } else { 0 };
    let mut rules = Rules::default();
    sale_line_rules(&mut rules, line, sale.amount_paid);
    rules
        .check(
            line.quantity.checked_mul(line.unit_sale_price) == Some(sale.total),
            "total",
            "must equal quantity × unit sale price",
        )
        .check(
            sale.amount_paid + sale.amount_remaining == sale.total,
            "amount_remaining",
            "amount paid plus amount remaining must equal the total",
        )
        .check(
            sale.amount_paid <= sale.total,
            "amount_paid",
            "cannot exceed the sale total",
        )
        .check(
            line.unit_sale_price >= line.unit_cost + charged_freight,
            "unit_sale_price",
            "sale would produce a negative profit; raise the price or lower the freight",
        )
        .check(
            sale.distribution.total() == sale.total,
            "distribution",
            "cost recovery, freight and profit must add up to the total",
        );
    if let Some(credit) = credit {
        let owed_after = credit.owed + sale.amount_remaining;
        rules.check(
            credit.limit == 0 || owed_after <= credit.limit,
            "client_id",
            format!(
                "sale would raise the client's debt to {owed_after} over a credit limit of {}",
                credit.limit
            ),
        );
    }
    rules.finish()
}

/// Range checks on an order line. Used alone when the line cannot be totalled.
pub fn validate_purchase_order_line(
    quantity: i64,
    unit_distributor_cost: Amount,
    unit_transport_cost: Amount,
    initial_payment: Amount,
) -> Validation {
    let mut rules = Rules::default();
    purchase_order_line_rules(
        &mut rules,
        quantity,
        unit_distributor_cost,
        unit_transport_cost,
        initial_payment,
    );
    rules.finish()
}

/// Every rule for a totalled purchase order: ranges, reconciliation and the
/// payment source.
pub fn validate_purchase_order(order: &ProposedPurchaseOrder) -> Validation {
    let name_len = order.product_name.trim().chars().count();
    let mut rules = Rules::default();
    purchase_order_line_rules(
        &mut rules,
        order.quantity,
        order.unit_distributor_cost,
        order.unit_transport_cost,
        order.initial_payment,
    );
    rules
        .check(
            (2..=100).contains(&name_len),
            "product_name",
            "must be between 2 and 100 characters",
        )
        .check(
            order.unit_distributor_cost + order.unit_transport_cost == order.unit_total_cost,
            "unit_total_cost",
            "must equal distributor cost plus transport cost",
        )
        .check(
            order.unit_total_cost.checked_mul(order.quantity) == Some(order.grand_total),
            "grand_total",
            "must equal unit total cost × quantity",
        )
        .check(
            order.initial_payment + order.remaining_debt == order.grand_total,
            "remaining_debt",
            "initial payment plus remaining debt must equal the grand total",
        )
        .check(
            order.initial_payment <= order.grand_total,
            "initial_payment",
            "cannot exceed the grand total",
        )
        .check(
            order.initial_payment == 0 || order.source_account.is_some(),
            "source_account",
            "an initial payment requires a source account",
        )
        .check(
            order.source_account.is_none_or(AccountId::can_pay_suppliers),
            "source_account",
            "account cannot be used to pay suppliers",
        );
    rules.finish()
}

/// Rules for a transfer between accounts.
pub fn validate_transfer(transfer: &TransferRequest) -> Validation {
    let mut rules = Rules::default();
    rules
        .check(
            transfer.from != transfer.to,
            "to",
            "source and destination accounts must differ",
        )
        .amount("amount", transfer.amount, false)
        .memo(&transfer.memo);
    rules.finish()
}

/// Rules for direct income.
pub fn validate_income(income: &IncomeRequest) -> Validation {
    let mut rules = Rules::default();
    rules
        .check(
            income.account.accepts_direct_income(),
            "account",
            "only Azteca, Leftie and Profit accept direct income",
        )
        .amount("amount", income.amount, false)
        .memo(&income.memo);
    rules.finish()
}

/// Rules for a direct expense.
pub fn validate_expense(expense: &ExpenseRequest) -> Validation {
    let mut rules = Rules::default();
    rules
        .amount("amount", expense.amount, false)
        .memo(&expense.memo);
    rules.finish()
}

/// Rules on a payment that do not depend on stored state.
pub fn validate_payment_shape(
    amount: Amount,
    memo: &str,
    is_distributor: bool,
    account: Option<AccountId>,
) -> Validation {
    let mut rules = Rules::default();
    rules
        .amount("amount", amount, false)
        .check(
            memo.chars().count() <= MAX_MEMO_LEN,
            "memo",
            format!("cannot exceed {MAX_MEMO_LEN} characters"),
        );
    if is_distributor {
        rules
            .check(
                account.is_some(),
                "account",
                "distributor payments require a source account",
            )
            .check(
                account.is_none_or(AccountId::can_pay_suppliers),
                "account",
                "account cannot be used to pay suppliers",
            );
    } else {
        rules.check(
            account.is_none(),
            "account",
            "client payments are distributed automatically and take no account",
        );
    }
    rules.finish()
}

fn check_name(rules: &mut Rules, name: &str) {
    let len = name.trim().chars().count();
    rules
        .check(len >= 2, "name", "must be at least 2 characters")
        .check(len <= 100, "name", "cannot exceed 100 characters");
}

fn check_phone(rules: &mut Rules, phone: Option<&str>) {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return;
    };
    let len = phone.chars().count();
    rules
        .check(
            (10..=15).contains(&len),
            "phone",
            "must be between 10 and 15 characters",
        )
        .check(
            phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')')),
            "phone",
            "may only contain digits, spaces and - + ( )",
        );
}

fn check_email(rules: &mut Rules, email: Option<&str>) {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return;
    };
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    rules
        .check(well_formed, "email", "is not a valid email address")
        .check(email.len() <= 100, "email", "cannot exceed 100 characters");
}

/// Rules for a new client. Empty optional fields pass.
pub fn validate_new_client(client: &NewClient) -> Validation {
    let mut rules = Rules::default();
    check_name(&mut rules, &client.name);
    check_phone(&mut rules, client.phone.as_deref());
    check_email(&mut rules, client.email.as_deref());
    rules.amount("credit_limit", client.credit_limit, true);
    rules.finish()
}

/// Rules for a new distributor. Empty optional fields pass.
pub fn validate_new_distributor(distributor: &NewDistributor) -> Validation {
    let mut rules = Rules::default();
    check_name(&mut rules, &distributor.name);
    check_phone(&mut rules, distributor.phone.as_deref());
    check_email(&mut rules, distributor.email.as_deref());
    if let Some(company) = &distributor.company {
        rules.check(
            company.chars().count() <= 100,
            "company",
            "cannot exceed 100 characters",
        );
    }
    rules.finish()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn sale(quantity: i64, unit_sale_price: Amount, paid: Amount) -> ProposedSale {
        let line = LineItem {
            unit_sale_price,
            unit_cost: 6_300,
            unit_freight: 500,
            quantity,
        };
        ProposedSale::compute(line, true, paid).unwrap()
    }

    fn order(initial_payment: Amount, source: Option<AccountId>) -> ProposedPurchaseOrder {
        ProposedPurchaseOrder {
            product_name: "Widget".to_string(),
            quantity: 100,
            unit_distributor_cost: 6_000,
            unit_transport_cost: 300,
            unit_total_cost: 6_300,
            grand_total: 630_000,
            initial_payment,
            remaining_debt: 630_000 - initial_payment,
            source_account: source,
        }
    }

    #[test]
    fn test_valid_sale_passes() {
        assert!(validate_sale(&sale(10, 10_000, 40_000), None).is_ok());
    }

    #[test]
    fn test_break_even_sale_passes() {
        assert!(validate_sale(&sale(10, 6_800, 0), None).is_ok());
    }

    #[test]
    fn test_sale_collects_every_violation() {
        let mut bad = sale(10, 6_000, 0);
        bad.total += 1;
        bad.amount_paid = bad.total + 5;

        let errors = validate_sale(&bad, None).unwrap_err();
        assert!(errors.has_field("total"));
        assert!(errors.has_field("amount_paid"));
        assert!(errors.has_field("amount_remaining"));
        assert!(errors.has_field("unit_sale_price"));
        assert!(errors.has_field("distribution"));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_sale_ranges_do_not_hide_other_rules() {
        let errors = validate_sale(&sale(0, 100, 0), None).unwrap_err();
        assert!(errors.has_field("quantity"));
        assert!(errors.has_field("unit_sale_price"));
        assert_eq!(errors.len(), 2);

        let credit = CreditPosition {
            owed: 0,
            limit: 1_000,
        };
        let errors = validate_sale(&sale(1, 100, 500), Some(credit)).unwrap_err();
        assert!(errors.has_field("unit_sale_price"));
        assert!(errors.has_field("amount_paid"));
        assert!(!errors.has_field("client_id"));
    }

    #[test]
    fn test_credit_limit_rule() {
        let credit = CreditPosition {
            owed: 60_000,
            limit: 100_000,
        };
        assert!(validate_sale(&sale(10, 10_000, 60_000), Some(credit)).is_ok());
        let errors = validate_sale(&sale(10, 10_000, 59_999), Some(credit)).unwrap_err();
        assert!(errors.has_field("client_id"));

        let unlimited = CreditPosition { owed: 60_000, limit: 0 };
        assert!(validate_sale(&sale(10, 10_000, 0), Some(unlimited)).is_ok());
    }

    #[test]
    fn test_oversized_line_cannot_be_priced() {
        let line = LineItem {
            unit_sale_price: i64::MAX,
            unit_cost: 0,
            unit_freight: 0,
            quantity: 2,
        };
        assert!(ProposedSale::compute(line, true, 0).is_none());
        let errors = validate_sale_line(&line, 0).unwrap_err();
        assert!(errors.has_field("unit_sale_price"));
    }

    #[test]
    fn test_sale_line_ranges() {
        let line = LineItem {
            unit_sale_price: 0,
            unit_cost: -1,
            unit_freight: -1,
            quantity: 0,
        };
        let errors = validate_sale_line(&line, -10).unwrap_err();
        for field in ["quantity", "unit_sale_price", "unit_cost", "unit_freight", "amount_paid"] {
            assert!(errors.has_field(field), "missing {field}");
        }
    }

    #[test]
    fn test_purchase_order_reference_case() {
        assert!(validate_purchase_order(&order(0, None)).is_ok());
        assert!(validate_purchase_order(&order(100_000, Some(AccountId::Profit))).is_ok());

        let mut with_payment = order(100_000, Some(AccountId::Profit));
        assert_eq!(with_payment.remaining_debt, 530_000);
        with_payment.source_account = None;
        let errors = validate_purchase_order(&with_payment).unwrap_err();
        assert!(errors.has_field("source_account"));
    }

    #[test]
    fn test_purchase_order_composition_rules() {
        let mut bad = order(0, None);
        bad.unit_total_cost = 6_200;
        bad.remaining_debt = 1;
        let errors = validate_purchase_order(&bad).unwrap_err();
        assert!(errors.has_field("unit_total_cost"));
        assert!(errors.has_field("grand_total"));
        assert!(errors.has_field("remaining_debt"));
    }

    #[test]
    fn test_purchase_order_rejects_non_supplier_account() {
        let errors =
            validate_purchase_order(&order(10_000, Some(AccountId::Utilidades))).unwrap_err();
        assert!(errors.has_field("source_account"));
    }

    #[test]
    fn test_transfer_same_account_rejected() {
        for account in AccountId::ALL {
            let transfer = TransferRequest::new(account, account, 1_000, "rebalance");
            let errors = validate_transfer(&transfer).unwrap_err();
            assert!(errors.has_field("to"));
        }
    }

    #[test]
    fn test_transfer_collects_all_errors() {
        let transfer = TransferRequest::new(AccountId::Profit, AccountId::Profit, 0, "   ");
        let errors = validate_transfer(&transfer).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.to_string(),
            "to: source and destination accounts must differ; amount: must be greater than 0; memo: is required"
        );
    }

    #[test]
    fn test_income_only_into_operational_accounts() {
        assert!(validate_income(&IncomeRequest::new(AccountId::Azteca, 100, "deposit")).is_ok());
        let errors =
            validate_income(&IncomeRequest::new(AccountId::Utilidades, 100, "deposit")).unwrap_err();
        assert!(errors.has_field("account"));
    }

    #[test]
    fn test_expense_rules() {
        assert!(validate_expense(&ExpenseRequest::new(AccountId::FleteSur, 100, "fuel")).is_ok());
        assert!(validate_expense(&ExpenseRequest::new(AccountId::FleteSur, -1, "")).is_err());
    }

    #[test]
    fn test_payment_shape() {
        assert!(validate_payment_shape(100, "", false, None).is_ok());
        assert!(validate_payment_shape(100, "", true, Some(AccountId::Azteca)).is_ok());

        let errors = validate_payment_shape(0, "", true, None).unwrap_err();
        assert!(errors.has_field("amount"));
        assert!(errors.has_field("account"));

        let errors = validate_payment_shape(100, "", false, Some(AccountId::Profit)).unwrap_err();
        assert!(errors.has_field("account"));
    }

    #[test]
    fn test_client_optional_fields_pass_when_empty() {
        let mut client = NewClient::new("Ana");
        client.phone = Some(String::new());
        client.email = Some("  ".to_string());
        assert!(validate_new_client(&client).is_ok());
    }

    #[test]
    fn test_client_field_rules() {
        let mut client = NewClient::new("A");
        client.phone = Some("55-12ab".to_string());
        client.email = Some("not-an-email".to_string());
        client.credit_limit = -1;

        let errors = validate_new_client(&client).unwrap_err();
        assert!(errors.has_field("name"));
        assert!(errors.has_field("phone"));
        assert!(errors.has_field("email"));
        assert!(errors.has_field("credit_limit"));
    }

    #[test]
    fn test_client_with_valid_contact() {
        let mut client = NewClient::new("  Ana López  ");
        client.phone = Some("55-1234-5678".to_string());
        client.email = Some("ana@example.mx".to_string());
        assert!(validate_new_client(&client).is_ok());
    }

    #[test]
    fn test_phone_length_bounds() {
        let mut client = NewClient::new("Ana");
        client.phone = Some("+52 55 1234 567".to_string());
        assert!(validate_new_client(&client).is_ok());

        client.phone = Some("+52 55 1234 5678".to_string());
        let errors = validate_new_client(&client).unwrap_err();
        assert!(errors.has_field("phone"));
        assert_eq!(errors.len(), 1);

        client.phone = Some("55-1234-5".to_string());
        assert!(validate_new_client(&client).unwrap_err().has_field("phone"));
    }

    #[test]
    fn test_distributor_rules() {
        let mut distributor = NewDistributor::new("Proveedor Norte");
        assert!(validate_new_distributor(&distributor).is_ok());
        distributor.email = Some("a@b".to_string());
        assert!(validate_new_distributor(&distributor)
            .unwrap_err()
            .has_field("email"));
    }
}
