//! Redemption desk flows against the mock backend.

#![allow(clippy::unwrap_used)]

use honor_loyalty_client::{ApiError, DeskError, RedemptionDesk};
use honor_loyalty_core::TransactionKind;
use honor_loyalty_integration_tests::MockBackend;

async fn loaded_desk(backend: &MockBackend) -> RedemptionDesk {
    let mut desk = RedemptionDesk::new(backend.admin_client().await);
    desk.load().await.expect("Desk failed to load");
    desk
}

#[tokio::test]
async fn test_exact_balance_redeems_to_zero() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Lim Xiao Ming", "0123456789", 500);
    let gift = backend.seed_gift("Voucher RM50", 500, 3);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();

    let eligibility = desk.eligibility();
    assert!(eligibility.eligible);
    assert_eq!(eligibility.balance_after, Some(0));

    let receipt = desk.confirm().await.expect("Redemption failed");
    assert_eq!(receipt.redemption.points_used, 500);
    assert_eq!(receipt.gift_name, "Voucher RM50");
    assert_eq!(receipt.balance, 0);

    assert!(desk.is_completed());
    assert_eq!(desk.customer().unwrap().total_points, 0);
    assert_eq!(desk.gift().unwrap().stock, 2);
    assert_eq!(backend.customer(customer.id).unwrap().total_points, 0);
    assert_eq!(backend.gift(gift.id).unwrap().stock, 2);

    let history = transaction_history(&backend, customer.id).await;
    assert_eq!(history, vec![(TransactionKind::Redeem, -500)]);
}

async fn transaction_history(
    backend: &MockBackend,
    id: honor_loyalty_core::CustomerId,
) -> Vec<(TransactionKind, i64)> {
    backend
        .admin_client()
        .await
        .list_transactions(id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.kind, t.amount))
        .collect()
}

#[tokio::test]
async fn test_one_point_short_sends_nothing() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Siti", "0111111111", 499);
    let gift = backend.seed_gift("Voucher RM50", 500, 3);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();

    let eligibility = desk.eligibility();
    assert!(!eligibility.eligible);
    assert_eq!(eligibility.balance_after, Some(-1));
    assert!(eligibility.is_unaffordable());

    let err = desk.confirm().await.unwrap_err();
    assert!(matches!(err, DeskError::NotEligible { balance_after: -1 }));
    assert!(backend.requests_matching("POST /redeem").is_empty());
}

#[tokio::test]
async fn test_out_of_stock_gift_cannot_be_selected() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Siti", "0111111111", 10_000);
    let gift = backend.seed_gift("Umbrella", 100, 0);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();

    let err = desk.select_gift_by_id(gift.id).unwrap_err();
    assert!(matches!(err, DeskError::OutOfStock { .. }));
    assert!(desk.gift().is_none());

    let option = desk
        .gift_options()
        .into_iter()
        .find(|o| o.gift.id == gift.id)
        .unwrap();
    assert!(!option.in_stock);
    assert!(option.affordable);
}

#[tokio::test]
async fn test_refresh_overwrites_optimistic_balance() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Ahmad", "0122222222", 1_000);
    let gift = backend.seed_gift("Tote bag", 300, 5);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();

    // Another counter awards points after the desk loaded
    backend.set_points(customer.id, 1_200);

    let receipt = desk.confirm().await.unwrap();

    // Optimistic value would be 700; the refetch says 900
    assert_eq!(receipt.balance, 900);
    assert_eq!(desk.customer().unwrap().total_points, 900);
    let listed = desk
        .customers()
        .iter()
        .find(|c| c.id == customer.id)
        .unwrap();
    assert_eq!(listed.total_points, 900);
}

#[tokio::test]
async fn test_submit_shows_optimistic_balance_until_refresh() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Ahmad", "0122222222", 1_000);
    let gift = backend.seed_gift("Tote bag", 300, 5);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();
    backend.set_points(customer.id, 1_200);

    let receipt = desk.submit().await.unwrap();
    assert!(desk.is_completed());
    assert_eq!(receipt.balance, 700);
    assert_eq!(desk.customer().unwrap().total_points, 700);
    assert_eq!(backend.requests_matching("GET /customers").len(), 1);

    desk.load().await.unwrap();
    assert_eq!(desk.customer().unwrap().total_points, 900);
}

#[tokio::test]
async fn test_failed_refresh_keeps_optimistic_balance() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Ahmad", "0122222222", 1_000);
    let gift = backend.seed_gift("Tote bag", 300, 5);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();
    backend.set_customer_list_down(true);

    let receipt = desk.confirm().await.expect("Redemption failed");

    assert!(desk.is_completed());
    assert_eq!(receipt.balance, 700);
    assert_eq!(desk.customer().unwrap().total_points, 700);
    // Gifts still refreshed
    assert_eq!(desk.gift().unwrap().stock, 4);
    assert_eq!(backend.customer(customer.id).unwrap().total_points, 700);
    assert_eq!(backend.requests_matching("GET /customers").len(), 2);
}

#[tokio::test]
async fn test_backend_conflict_leaves_desk_untouched() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Ahmad", "0122222222", 1_000);
    let gift = backend.seed_gift("Last mug", 200, 1);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();

    // Someone else takes the last unit
    backend.set_stock(gift.id, 0);

    let err = desk.confirm().await.unwrap_err();
    match &err {
        DeskError::Api(ApiError::Conflict(msg)) => assert_eq!(msg, "Gift is out of stock"),
        other => panic!("Expected a conflict, got {other:?}"),
    }
    assert_eq!(err.user_message(), "Gift is out of stock");

    assert!(!desk.is_completed());
    assert_eq!(desk.customer().unwrap().total_points, 1_000);
    assert_eq!(desk.gift().unwrap().stock, 1);
    assert_eq!(backend.customer(customer.id).unwrap().total_points, 1_000);
}

#[tokio::test]
async fn test_insufficient_points_at_submission() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Mei", "0133333333", 600);
    let gift = backend.seed_gift("Headphones", 500, 2);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();
    backend.set_points(customer.id, 100);

    let err = desk.confirm().await.unwrap_err();
    assert_eq!(err.user_message(), "Insufficient points for this gift");
    assert_eq!(backend.gift(gift.id).unwrap().stock, 2);
}

#[tokio::test]
async fn test_completed_desk_needs_reset() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Mei", "0133333333", 1_000);
    let gift = backend.seed_gift("Keychain", 100, 5);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();
    desk.confirm().await.unwrap();

    assert!(matches!(
        desk.confirm().await,
        Err(DeskError::AlreadyCompleted)
    ));
    assert_eq!(backend.requests_matching("POST /redeem").len(), 1);

    desk.reset();
    assert!(!desk.is_completed());
    assert!(desk.customer().is_none());
    assert!(desk.gift().is_none());
    assert_eq!(desk.eligibility().balance_after, None);
}

#[tokio::test]
async fn test_session_rejected_during_confirm() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Mei", "0133333333", 1_000);
    let gift = backend.seed_gift("Keychain", 100, 5);

    let mut desk = loaded_desk(&backend).await;
    desk.select_customer_by_id(customer.id).unwrap();
    desk.select_gift_by_id(gift.id).unwrap();
    backend.revoke_tokens();

    let err = desk.confirm().await.unwrap_err();
    assert!(matches!(err, DeskError::Api(ApiError::SessionExpired)));
    assert!(!desk.is_completed());
    assert_eq!(backend.gift(gift.id).unwrap().stock, 5);
}

#[tokio::test]
async fn test_redemptions_are_listed_newest_first() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Mei", "0133333333", 1_000);
    let pen = backend.seed_gift("Pen", 100, 5);
    let cap = backend.seed_gift("Cap", 200, 5);

    let mut desk = loaded_desk(&backend).await;
    for gift in [pen.id, cap.id] {
        desk.select_customer_by_id(customer.id).unwrap();
        desk.select_gift_by_id(gift).unwrap();
        desk.confirm().await.unwrap();
    }

    let client = backend.admin_client().await;
    let redemptions = client.list_redemptions().await.unwrap();
    let gifts: Vec<_> = redemptions.iter().map(|r| r.gift_id).collect();
    assert_eq!(gifts, vec![cap.id, pen.id]);

    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_redemptions, 2);
    assert_eq!(backend.customer(customer.id).unwrap().total_points, 700);
}
