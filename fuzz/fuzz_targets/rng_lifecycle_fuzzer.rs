//! Fuzz target for the RNG context lifecycle
//!
//! # Strategy
//!
//! - Arbitrary sequences of seed, generate and free on two contexts
//! - Both DRBG kinds, arbitrary personalization (including oversized)
//! - Request sizes spanning the per-request limit
//!
//! # Invariants
//!
//! - Generate before seeding fails with NotSeeded and leaves the buffer alone
//! - Seeding a seeded context fails with AlreadySeeded
//! - Two contexts driven through the same reproducible history agree
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tlsprobe_crypto::{DrbgKind, RngContext, RngError};

#[derive(Debug, Clone, Arbitrary)]
enum RngOp {
    Seed { personalization: Vec<u8> },
    Generate { len: u16 },
    Free,
}

#[derive(Debug, Clone, Arbitrary)]
struct Input {
    hmac: bool,
    ops: Vec<RngOp>,
}

fuzz_target!(|input: Input| {
    let kind = if input.hmac { DrbgKind::Hmac } else { DrbgKind::Ctr };
    let mut a = RngContext::new(kind);
    let mut b = RngContext::new(kind);

    for op in input.ops {
        match op {
            RngOp::Seed { personalization } => {
                let was_seeded = a.is_seeded();
                let ra = a.seed(true, &personalization);
                let rb = b.seed(true, &personalization);
                assert_eq!(ra, rb);
                if was_seeded {
                    assert_eq!(ra, Err(RngError::AlreadySeeded));
                }
                if let Err(e) = ra {
                    let rejected_input = matches!(e, RngError::PersonalizationTooLong { .. });
                    assert!(e.is_misuse() || rejected_input, "reproducible seeding cannot starve: {e}");
                }
            }

            RngOp::Generate { len } => {
                let len = (len % 4096) as usize;
                let mut out_a = vec![0x3Cu8; len];
                let mut out_b = vec![0x3Cu8; len];
                let ra = a.generate(&mut out_a);
                let rb = b.generate(&mut out_b);
                assert_eq!(ra, rb);

                match ra {
                    Ok(()) => assert_eq!(out_a, out_b),
                    Err(e) => {
                        assert_eq!(e, RngError::NotSeeded);
                        assert!(out_a.iter().all(|&x| x == 0x3C));
                    }
                }
            }

            RngOp::Free => {
                a.free();
                b.free();
                assert!(!a.is_seeded());
            }
        }
    }
});
