//! Status lifecycle rules
//!
//! Pure functions over the order and sub-order status graphs. The
//! repository calls these inside its transactions; the service calls
//! them for pre-checks. Neither graph has cycles and terminal states
//! have no exits.
//!
//! Sub-order graph:
//!
//! ```text
//! Pending ──> Confirmed ──> Preparing ──> Ready ──> Delivered
//!    │            │
//!    └────────────┴──> Cancelled
//! ```
//!
//! The parent mirrors its sub-orders except for `Delivering`, which
//! only an admin sets once every active sub-order is ready.

use shared::models::{OrderStatus, SubOrderStatus};

/// Whether a chef-side transition is legal.
pub fn sub_transition_allowed(from: SubOrderStatus, to: SubOrderStatus) -> bool {
    use SubOrderStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Preparing)
            | (Confirmed, Cancelled)
            | (Preparing, Ready)
            | (Ready, Delivered)
    )
}

/// Position of a non-terminal sub-order along the fulfilment path.
/// Terminal states have no rank.
fn progress_rank(status: SubOrderStatus) -> Option<u8> {
    match status {
        SubOrderStatus::Pending => Some(0),
        SubOrderStatus::Confirmed => Some(1),
        SubOrderStatus::Preparing => Some(2),
        SubOrderStatus::Ready => Some(3),
        SubOrderStatus::Delivered | SubOrderStatus::Cancelled => None,
    }
}

/// Derive the parent status from its sub-orders.
///
/// Rules, in order:
/// 1. every sub cancelled -> `Cancelled`
/// 2. every sub terminal with at least one delivered -> `Delivered`
/// 3. an admin-set `Delivering` stays until rule 1 or 2 applies
/// 4. otherwise the least-advanced non-terminal sub wins
pub fn recompute_parent(current: OrderStatus, subs: &[SubOrderStatus]) -> OrderStatus {
    if subs.is_empty() {
        return current;
    }

    if subs.iter().all(|s| *s == SubOrderStatus::Cancelled) {
        return OrderStatus::Cancelled;
    }

    if subs.iter().all(|s| s.is_terminal()) {
        // Mixed Delivered + Cancelled collapses to Delivered
        return OrderStatus::Delivered;
    }

    if current == OrderStatus::Delivering {
        return OrderStatus::Delivering;
    }

    let min_rank = subs.iter().filter_map(|s| progress_rank(*s)).min();
    match min_rank {
        Some(0) => OrderStatus::Pending,
        Some(1) => OrderStatus::Confirmed,
        Some(2) => OrderStatus::Preparing,
        Some(3) => OrderStatus::Ready,
        _ => current,
    }
}

/// Whether an admin may move the parent to `Delivering`: the order is
/// still active and every non-cancelled sub-order has at least reached
/// `Ready`.
pub fn can_enter_delivering(current: OrderStatus, subs: &[SubOrderStatus]) -> bool {
    if current.is_terminal() || current == OrderStatus::Delivering {
        return false;
    }

    let mut active = 0;
    for sub in subs {
        match sub {
            SubOrderStatus::Cancelled => {}
            SubOrderStatus::Ready | SubOrderStatus::Delivered => active += 1,
            _ => return false,
        }
    }
    active > 0
}

/// Whether a whole-order cancellation is still allowed.
pub fn order_cancellable(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Pending | OrderStatus::Confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus as O;
    use SubOrderStatus as S;

    #[test]
    fn test_forward_path_is_allowed() {
        assert!(sub_transition_allowed(S::Pending, S::Confirmed));
        assert!(sub_transition_allowed(S::Confirmed, S::Preparing));
        assert!(sub_transition_allowed(S::Preparing, S::Ready));
        assert!(sub_transition_allowed(S::Ready, S::Delivered));
    }

    #[test]
    fn test_cancel_only_before_preparing() {
        assert!(sub_transition_allowed(S::Pending, S::Cancelled));
        assert!(sub_transition_allowed(S::Confirmed, S::Cancelled));
        assert!(!sub_transition_allowed(S::Preparing, S::Cancelled));
        assert!(!sub_transition_allowed(S::Ready, S::Cancelled));
    }

    #[test]
    fn test_no_skipping_or_backtracking() {
        assert!(!sub_transition_allowed(S::Pending, S::Preparing));
        assert!(!sub_transition_allowed(S::Confirmed, S::Ready));
        assert!(!sub_transition_allowed(S::Ready, S::Pending));
        assert!(!sub_transition_allowed(S::Preparing, S::Confirmed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in [S::Pending, S::Confirmed, S::Preparing, S::Ready, S::Delivered, S::Cancelled] {
            assert!(!sub_transition_allowed(S::Delivered, to));
            assert!(!sub_transition_allowed(S::Cancelled, to));
        }
    }

    #[test]
    fn test_parent_is_least_advanced_sub() {
        assert_eq!(recompute_parent(O::Pending, &[S::Confirmed, S::Pending]), O::Pending);
        assert_eq!(recompute_parent(O::Pending, &[S::Ready, S::Preparing]), O::Preparing);
        assert_eq!(recompute_parent(O::Confirmed, &[S::Ready, S::Ready]), O::Ready);
    }

    #[test]
    fn test_cancelled_subs_are_ignored_for_progress() {
        assert_eq!(
            recompute_parent(O::Pending, &[S::Cancelled, S::Preparing]),
            O::Preparing
        );
    }

    #[test]
    fn test_all_cancelled_cancels_parent() {
        assert_eq!(recompute_parent(O::Pending, &[S::Cancelled, S::Cancelled]), O::Cancelled);
    }

    #[test]
    fn test_delivered_plus_cancelled_is_delivered() {
        assert_eq!(
            recompute_parent(O::Delivering, &[S::Delivered, S::Cancelled]),
            O::Delivered
        );
        assert_eq!(recompute_parent(O::Ready, &[S::Delivered, S::Delivered]), O::Delivered);
    }

    #[test]
    fn test_delivering_is_sticky_while_active() {
        assert_eq!(
            recompute_parent(O::Delivering, &[S::Ready, S::Delivered]),
            O::Delivering
        );
        // but collapses once everything is terminal
        assert_eq!(
            recompute_parent(O::Delivering, &[S::Cancelled, S::Cancelled]),
            O::Cancelled
        );
    }

    #[test]
    fn test_can_enter_delivering() {
        assert!(can_enter_delivering(O::Ready, &[S::Ready, S::Ready]));
        assert!(can_enter_delivering(O::Preparing, &[S::Ready, S::Cancelled]));
        assert!(!can_enter_delivering(O::Preparing, &[S::Ready, S::Preparing]));
        assert!(!can_enter_delivering(O::Delivering, &[S::Ready]));
        assert!(!can_enter_delivering(O::Cancelled, &[S::Cancelled]));
        // all subs cancelled leaves nothing to deliver
        assert!(!can_enter_delivering(O::Pending, &[S::Cancelled]));
    }

    #[test]
    fn test_order_cancellable_window() {
        assert!(order_cancellable(O::Pending));
        assert!(order_cancellable(O::Confirmed));
        assert!(!order_cancellable(O::Preparing));
        assert!(!order_cancellable(O::Delivering));
        assert!(!order_cancellable(O::Delivered));
        assert!(!order_cancellable(O::Cancelled));
    }
}
