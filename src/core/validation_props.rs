//! Property-based tests for the validation layer.

use proptest::prelude::*;

use super::account::AccountId;
use super::distribution::{LineItem, compute_line_distribution};
use super::requests::TransferRequest;
use super::validation::{
    MAX_AMOUNT, ProposedPurchaseOrder, ProposedSale, validate_purchase_order, validate_sale,
    validate_transfer,
};

fn any_account() -> impl Strategy<Value = AccountId> {
    proptest::sample::select(AccountId::ALL.to_vec())
}

fn supplier_account() -> impl Strategy<Value = AccountId> {
    proptest::sample::select(
        AccountId::ALL
            .into_iter()
            .filter(|id| id.can_pay_suppliers())
            .collect::<Vec<_>>(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A transfer onto the same account is rejected whatever the amount and memo.
    #[test]
    fn prop_same_account_transfer_rejected(
        account in any_account(),
        amount in -1_000i64..MAX_AMOUNT,
        memo in "\\PC{0,40}",
    ) {
        let transfer = TransferRequest::new(account, account, amount, memo);
        let errors = validate_transfer(&transfer);
        prop_assert!(errors.is_err());
        prop_assert!(errors.unwrap_err().has_field("to"));
    }

    /// A profitable, computed sale always reconciles for any valid payment.
    #[test]
    fn prop_computed_sales_reconcile(
        quantity in 1i64..99_999,
        unit_cost in 0i64..1_000_000,
        unit_freight in 0i64..10_000,
        markup in 0i64..1_000_000,
        paid_share in 0u32..=100,
        include_freight in any::<bool>(),
    ) {
        let line = LineItem {
            unit_sale_price: unit_cost + unit_freight + markup + 1,
            unit_cost,
            unit_freight,
            quantity,
        };
        let split = compute_line_distribution(&line, include_freight);
        let amount_paid = split.total_revenue / 100 * i64::from(paid_share);
        let sale = ProposedSale {
            line,
            include_freight,
            total: split.total_revenue,
            amount_paid,
            amount_remaining: split.total_revenue - amount_paid,
            distribution: split.distribution,
        };
        prop_assert!(validate_sale(&sale, None).is_ok());
        prop_assert_eq!(sale.amount_paid + sale.amount_remaining, sale.total);
        prop_assert_eq!(sale.total, quantity * line.unit_sale_price);
    }

    /// Any sale priced below cost is rejected on the price field.
    #[test]
    fn prop_loss_making_sale_rejected(
        quantity in 1i64..1_000,
        unit_cost in 2i64..1_000_000,
        shortfall in 1i64..1_000,
    ) {
        let line = LineItem {
            unit_sale_price: (unit_cost - shortfall).max(1),
            unit_cost,
            unit_freight: 0,
            quantity,
        };
        prop_assume!(line.unit_sale_price < unit_cost);
        let split = compute_line_distribution(&line, true);
        let sale = ProposedSale {
            line,
            include_freight: true,
            total: split.total_revenue,
            amount_paid: 0,
            amount_remaining: split.total_revenue,
            distribution: split.distribution,
        };
        let errors = validate_sale(&sale, None).unwrap_err();
        prop_assert!(errors.has_field("unit_sale_price"));
    }

    /// An order with an initial payment needs a supplier account, and debt always reconciles.
    #[test]
    fn prop_order_payment_requires_source(
        quantity in 1i64..10_000,
        unit_distributor_cost in 1i64..100_000,
        unit_transport_cost in 0i64..10_000,
        paid_share in 1u32..=100,
        source in supplier_account(),
    ) {
        let unit_total_cost = unit_distributor_cost + unit_transport_cost;
        let grand_total = unit_total_cost * quantity;
        let initial_payment = (grand_total / 100 * i64::from(paid_share)).max(1);
        let mut order = ProposedPurchaseOrder {
            product_name: "Widget".to_string(),
            quantity,
            unit_distributor_cost,
            unit_transport_cost,
            unit_total_cost,
            grand_total,
            initial_payment,
            remaining_debt: grand_total - initial_payment,
            source_account: Some(source),
        };
        prop_assert!(validate_purchase_order(&order).is_ok());

        order.source_account = None;
        let errors = validate_purchase_order(&order).unwrap_err();
        prop_assert!(errors.has_field("source_account"));
    }
}
