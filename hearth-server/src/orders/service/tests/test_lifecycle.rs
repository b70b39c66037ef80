//! Lifecycle pass-through and lookup mapping.

use super::*;

fn scripted_sub() -> SubOrder {
    let now = now_millis();
    SubOrder {
        id: 301,
        order_id: 1,
        chef_id: 10,
        chef_order_code: "ORD-20250301-001-CHEF10".into(),
        status: SubOrderStatus::Pending,
        subtotal: dec("25.00"),
        delivery_fee: Decimal::ZERO,
        service_fee: Decimal::ZERO,
        total: dec("25.00"),
        estimated_prep_minutes: 30,
        chef_note: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_advance_sub_order_records_note() {
    let h = harness(vec![], vec![]);
    *h.repo.sub_order_response.lock().unwrap() = Some(scripted_sub());

    let sub = h
        .service
        .advance_sub_order(301, SubOrderStatus::Confirmed, Some("on it".into()))
        .await
        .unwrap();

    assert_eq!(sub.status, SubOrderStatus::Confirmed);
    assert_eq!(sub.chef_note.as_deref(), Some("on it"));
    assert_eq!(
        *h.repo.sub_updates.lock().unwrap(),
        vec![(301, SubOrderStatus::Confirmed, Some("on it".to_string()))]
    );
}

#[tokio::test]
async fn test_advance_sub_order_rejects_overlong_note() {
    let h = harness(vec![], vec![]);
    *h.repo.sub_order_response.lock().unwrap() = Some(scripted_sub());

    let err = h
        .service
        .advance_sub_order(301, SubOrderStatus::Confirmed, Some("x".repeat(501)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidRequest(_)));
    assert!(h.repo.sub_updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_detail_maps_missing_to_not_found() {
    let h = harness(vec![], vec![]);

    let err = h.service.order_detail(42).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_sub_order_maps_missing_to_not_found() {
    let h = harness(vec![], vec![]);

    let err = h.service.sub_order(42).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}
