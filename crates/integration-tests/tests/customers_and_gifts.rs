//! Customer, points, gift and dashboard calls against the mock backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use honor_loyalty_client::{ApiError, CustomerSearch};
use honor_loyalty_core::{
    CustomerId, CustomerUpdate, GiftUpdate, NewCustomer, NewGift, PointsAdjustment,
    TransactionKind,
};
use honor_loyalty_integration_tests::MockBackend;

// ============================================================================
// Customers
// ============================================================================

#[tokio::test]
async fn test_register_and_reject_duplicate_phone() {
    let backend = MockBackend::start().await;
    let client = backend.admin_client().await;

    let draft = NewCustomer::new("Tan Mei Ling", "0129876543", Some("mei@example.com".into())).unwrap();
    let created = client.create_customer(&draft).await.unwrap();
    assert_eq!(created.total_points, 0);
    assert_eq!(created.email.as_deref(), Some("mei@example.com"));

    let again = NewCustomer::new("Someone Else", "0129876543", None).unwrap();
    let err = client.create_customer(&again).await.unwrap_err();
    match err {
        ApiError::Validation(msg) => assert_eq!(msg, "Phone number already registered"),
        other => panic!("Expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_is_forwarded_and_blank_is_omitted() {
    let backend = MockBackend::start().await;
    backend.seed_customer("Ali Hassan", "0170000001", 10);
    backend.seed_customer("Bala Kumar", "0170000002", 20);
    let client = backend.admin_client().await;

    let all = client.list_customers(Some("   ")).await.unwrap();
    assert_eq!(all.len(), 2);
    // Newest first
    assert_eq!(all[0].full_name, "Bala Kumar");

    let found = client.list_customers(Some("ali")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].full_name, "Ali Hassan");

    assert_eq!(
        backend.requests_matching("GET /customers"),
        vec!["GET /customers", "GET /customers?search=ali"]
    );
}

#[tokio::test]
async fn test_update_and_delete_customer() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Ali Hassan", "0170000001", 10);
    let client = backend.admin_client().await;

    let update = CustomerUpdate {
        full_name: Some("Ali bin Hassan".into()),
        ..CustomerUpdate::default()
    };
    let updated = client.update_customer(customer.id, &update).await.unwrap();
    assert_eq!(updated.full_name, "Ali bin Hassan");
    assert_eq!(updated.phone_number, "0170000001");

    client.delete_customer(customer.id).await.unwrap();
    let err = client.get_customer(customer.id).await.unwrap_err();
    match err {
        ApiError::NotFound(msg) => assert_eq!(msg, "Customer not found"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_update_is_not_sent() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Ali Hassan", "0170000001", 10);
    let client = backend.admin_client().await;

    let err = client
        .update_customer(customer.id, &CustomerUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(backend.requests_matching("PUT").is_empty());
}

#[tokio::test]
async fn test_unknown_customer() {
    let backend = MockBackend::start().await;
    let client = backend.admin_client().await;
    let err = client.get_customer(CustomerId::random()).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    // A 404 does not end the session
    assert!(client.session().is_authenticated().await);
}

// ============================================================================
// Points
// ============================================================================

#[tokio::test]
async fn test_award_deduct_and_history() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Chen Wei", "0160000000", 0);
    let client = backend.admin_client().await;

    let award = PointsAdjustment::new(250, "Purchase RM250").unwrap();
    let after_award = client.add_points(customer.id, &award).await.unwrap();
    assert_eq!(after_award.total_points, 250);

    let too_much = PointsAdjustment::new(300, "Correction").unwrap();
    let err = client.deduct_points(customer.id, &too_much).await.unwrap_err();
    assert_eq!(err.user_message("Failed"), "Insufficient points");
    assert_eq!(backend.customer(customer.id).unwrap().total_points, 250);

    let fix = PointsAdjustment::new(50, "Correction").unwrap();
    let after_deduct = client.deduct_points(customer.id, &fix).await.unwrap();
    assert_eq!(after_deduct.total_points, 200);

    let history: Vec<_> = client
        .list_transactions(customer.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.kind, t.amount, t.description))
        .collect();
    assert_eq!(
        history,
        vec![
            (TransactionKind::ManualAdjust, -50, "Correction".to_owned()),
            (TransactionKind::Earn, 250, "Purchase RM250".to_owned()),
        ]
    );
}

// ============================================================================
// Gifts and dashboard
// ============================================================================

#[tokio::test]
async fn test_gift_catalog_lifecycle() {
    let backend = MockBackend::start().await;
    let client = backend.admin_client().await;

    let draft = NewGift::new("Water bottle", Some("  500ml  ".into()), 150, 10).unwrap();
    let gift = client.create_gift(&draft).await.unwrap();
    assert_eq!(gift.description.as_deref(), Some("500ml"));

    let update = GiftUpdate {
        stock: Some(0),
        ..GiftUpdate::default()
    };
    let updated = client.update_gift(gift.id, &update).await.unwrap();
    assert_eq!(updated.stock, 0);
    assert!(!updated.in_stock());

    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.active_gifts, 0);

    client.delete_gift(gift.id).await.unwrap();
    assert!(client.list_gifts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_counts_earned_points_only() {
    let backend = MockBackend::start().await;
    let customer = backend.seed_customer("Chen Wei", "0160000000", 0);
    backend.seed_gift("Pen", 10, 3);
    let client = backend.admin_client().await;

    client
        .add_points(customer.id, &PointsAdjustment::new(100, "Purchase").unwrap())
        .await
        .unwrap();
    client
        .deduct_points(customer.id, &PointsAdjustment::new(40, "Fix").unwrap())
        .await
        .unwrap();

    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_customers, 1);
    assert_eq!(stats.total_points_issued, 100);
    assert_eq!(stats.total_redemptions, 0);
    assert_eq!(stats.active_gifts, 1);
}

// ============================================================================
// Debounced search
// ============================================================================

#[tokio::test]
async fn test_debounced_search_fetches_once() {
    let backend = MockBackend::start().await;
    backend.seed_customer("Ali Hassan", "0170000001", 10);
    backend.seed_customer("Bala Kumar", "0170000002", 20);
    let client = backend.admin_client().await;

    let search = CustomerSearch::spawn(client, Duration::from_millis(100));
    let mut updates = search.subscribe();
    for query in ["a", "al", "ali"] {
        search.set_query(query);
    }

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("No search results")
        .unwrap();

    let results = search.results();
    assert_eq!(results.query, "ali");
    assert_eq!(results.customers.len(), 1);
    assert_eq!(
        backend.requests_matching("GET /customers"),
        vec!["GET /customers?search=ali"]
    );
}

#[tokio::test]
async fn test_search_after_forced_logout_reports_error() {
    let backend = MockBackend::start().await;
    let client = backend.admin_client().await;
    backend.revoke_tokens();

    let search = CustomerSearch::spawn(client.clone(), Duration::from_millis(20));
    let mut updates = search.subscribe();
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("No search update")
        .unwrap();

    assert!(search.results().error.is_some());
    assert!(!client.session().is_authenticated().await);
}
