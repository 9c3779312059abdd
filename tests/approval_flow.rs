//! Integration tests for the ink-request approval gate.

use orderflow::approval::ApprovalGate;
use orderflow::models::{Availability, Decision, InkSpec, InkStockItem};
use orderflow::storage::memory::MemoryStore;
use orderflow::storage::{RequestStore, StockStore};
use orderflow::WorkflowError;

fn cyan_liter() -> InkSpec {
    InkSpec {
        ink_type: "Sublimation Ink".to_string(),
        color: "CYAN".to_string(),
        quantity: "1000".to_string(),
        unit: "ml".to_string(),
    }
}

fn stock(barcode: &str, spec: InkSpec) -> InkStockItem {
    InkStockItem {
        barcode_id: barcode.to_string(),
        spec,
        availability: Availability::Available,
    }
}

#[test]
fn test_full_request_approval_round() {
    let store = MemoryStore::new();
    store.put_stock(stock("BC-1", cyan_liter())).unwrap();
    let gate = ApprovalGate::new(&store, &store);

    let request = gate
        .submit("operator-7", cyan_liter(), Some("for SPK-1 print run".to_string()))
        .unwrap();
    assert!(request.decision.is_pending());

    let decided = gate.approve(request.id, "approver-1", "BC-1").unwrap();
    assert_eq!(
        decided.decision,
        Decision::Approved {
            barcode_id: "BC-1".to_string()
        }
    );

    // Audit trail: the decided request stays in storage, frozen.
    let stored = store.load_request(request.id).unwrap();
    assert_eq!(stored, decided);
    assert_eq!(
        store.lookup_by_barcode("BC-1").unwrap().availability,
        Availability::Consumed
    );
}

#[test]
fn test_spec_mismatch_keeps_request_pending_for_rescan() {
    let store = MemoryStore::new();
    store
        .put_stock(stock(
            "BC-HALF",
            InkSpec {
                quantity: "500".to_string(),
                ..cyan_liter()
            },
        ))
        .unwrap();
    store.put_stock(stock("BC-FULL", cyan_liter())).unwrap();
    let gate = ApprovalGate::new(&store, &store);

    let request = gate.submit("operator-7", cyan_liter(), None).unwrap();

    let err = gate.approve(request.id, "approver-1", "BC-HALF").unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    let message = err.to_string();
    assert!(message.contains("quantity"));
    assert!(message.contains("1000"));
    assert!(message.contains("500"));

    // Operator rescans with the right unit; the request was never rejected.
    let decided = gate.approve(request.id, "approver-1", "BC-FULL").unwrap();
    assert!(!decided.decision.is_pending());
}

#[test]
fn test_concurrent_approvals_of_one_barcode_have_one_winner() {
    let store = MemoryStore::new();
    store.put_stock(stock("BC-1", cyan_liter())).unwrap();
    let gate = ApprovalGate::new(&store, &store);

    // Two requests competing for the same physical unit.
    let first = gate.submit("operator-7", cyan_liter(), None).unwrap();
    let second = gate.submit("operator-8", cyan_liter(), None).unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles = vec![
            scope.spawn(|| {
                let gate = ApprovalGate::new(&store, &store);
                gate.approve(first.id, "approver-1", "BC-1")
            }),
            scope.spawn(|| {
                let gate = ApprovalGate::new(&store, &store);
                gate.approve(second.id, "approver-2", "BC-1")
            }),
        ];
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(WorkflowError::AlreadyConsumed { .. }) | Err(WorkflowError::Conflict(_))
            )
        })
        .count();
    assert_eq!(winners, 1, "exactly one approval may consume the unit");
    assert_eq!(losers, 1);
    assert_eq!(
        store.lookup_by_barcode("BC-1").unwrap().availability,
        Availability::Consumed
    );
}

#[test]
fn test_concurrent_approvers_of_one_request_land_one_decision() {
    let store = MemoryStore::new();
    store.put_stock(stock("BC-A", cyan_liter())).unwrap();
    store.put_stock(stock("BC-B", cyan_liter())).unwrap();
    let gate = ApprovalGate::new(&store, &store);

    // One request, two approvers scanning different matching units.
    let request = gate.submit("operator-7", cyan_liter(), None).unwrap();

    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| {
            let gate = ApprovalGate::new(&store, &store);
            gate.approve(request.id, "approver-1", "BC-A")
        });
        let b = scope.spawn(|| {
            let gate = ApprovalGate::new(&store, &store);
            gate.approve(request.id, "approver-2", "BC-B")
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    let (winner_barcode, loser_barcode, loser) = match (&a, &b) {
        (Ok(_), Err(_)) => ("BC-A", "BC-B", &b),
        (Err(_), Ok(_)) => ("BC-B", "BC-A", &a),
        other => panic!("expected exactly one winning approval, got {other:?}"),
    };
    assert!(matches!(loser, Err(WorkflowError::AlreadyDecided { .. })));

    // The stored decision names the winner's barcode, and only the winner's
    // unit stays consumed. The loser's unit was handed back.
    let stored = store.load_request(request.id).unwrap();
    assert_eq!(
        stored.decision,
        Decision::Approved {
            barcode_id: winner_barcode.to_string()
        }
    );
    assert_eq!(
        store.lookup_by_barcode(winner_barcode).unwrap().availability,
        Availability::Consumed
    );
    assert_eq!(
        store.lookup_by_barcode(loser_barcode).unwrap().availability,
        Availability::Available
    );
}

#[test]
fn test_decided_requests_cannot_be_redecided() {
    let store = MemoryStore::new();
    store.put_stock(stock("BC-1", cyan_liter())).unwrap();
    let gate = ApprovalGate::new(&store, &store);

    let approved = gate.submit("operator-7", cyan_liter(), None).unwrap();
    gate.approve(approved.id, "approver-1", "BC-1").unwrap();
    assert!(matches!(
        gate.reject(approved.id, "approver-1", None),
        Err(WorkflowError::AlreadyDecided { .. })
    ));

    let rejected = gate.submit("operator-7", cyan_liter(), None).unwrap();
    gate.reject(rejected.id, "approver-1", Some("stock count off".to_string()))
        .unwrap();
    assert!(matches!(
        gate.approve(rejected.id, "approver-1", "BC-1"),
        Err(WorkflowError::AlreadyDecided { .. })
    ));
}
