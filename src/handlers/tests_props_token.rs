//! Property tests for session tokens (pure, no DB).

use proptest::prelude::*;

use crate::handlers::auth::{Payload, SessionIssuer};
use crate::handlers::token::{TokenCodec, TokenError};
use crate::models::all_models::UserRole;
use chrono::{Duration, Utc};
use std::sync::Arc;

fn role() -> impl Strategy<Value = UserRole> {
    prop_oneof![Just(UserRole::Seller), Just(UserRole::Buyer)]
}

/// Positive lifetimes, from one second up to thirty days.
fn duration() -> impl Strategy<Value = Duration> {
    (1i64..=30 * 24 * 3600).prop_map(Duration::seconds)
}

fn distinct_keys() -> impl Strategy<Value = ([u8; 32], [u8; 32])> {
    (any::<[u8; 32]>(), any::<[u8; 32]>()).prop_filter("keys must differ", |(a, b)| a != b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any subject sealed under a key opens to the same payload at any
    /// instant up to and including its expiry.
    #[test]
    fn prop_round_trip_until_expiry(
        key in any::<[u8; 32]>(),
        user_id in any::<i64>(),
        username in "\\PC{0,40}",
        role in role(),
        lifetime in duration(),
        elapsed_pct in 0i64..=100,
    ) {
        let codec = Arc::new(TokenCodec::new(&key).unwrap());
        let issuer = SessionIssuer::new(codec.clone());

        let (token, payload) = issuer.issue(user_id, &username, role, lifetime).unwrap();
        prop_assert!(payload.expires_at > payload.issued_at);
        prop_assert_eq!(payload.expires_at - payload.issued_at, lifetime);

        let now = payload.issued_at + Duration::seconds(lifetime.num_seconds() * elapsed_pct / 100);
        let opened = codec.decrypt_at(&token, now).unwrap();
        prop_assert_eq!(&opened, &payload);
        prop_assert_eq!(opened.user_id, user_id);
        prop_assert_eq!(opened.username, username);
        prop_assert_eq!(opened.role, role);
    }

    /// A token sealed under one key never opens under another, whatever
    /// the clock says.
    #[test]
    fn prop_other_key_never_yields_a_payload(
        (sealing, opening) in distinct_keys(),
        user_id in any::<i64>(),
        username in "[a-z0-9_]{3,20}",
        role in role(),
        lifetime in duration(),
    ) {
        let sealer = TokenCodec::new(&sealing).unwrap();
        let opener = TokenCodec::new(&opening).unwrap();
        let payload = Payload::new(user_id, username, role, Utc::now(), lifetime).unwrap();
        let token = sealer.encrypt(&payload).unwrap();

        for now in [payload.issued_at, payload.expires_at + Duration::days(1)] {
            let err = opener.decrypt_at(&token, now).unwrap_err();
            prop_assert!(
                matches!(err, TokenError::Tampered | TokenError::Malformed),
                "unexpected error {:?}",
                err
            );
        }
    }

    /// Past its expiry a genuine token is reported as expired, never as
    /// forged.
    #[test]
    fn prop_expired_after_expires_at(
        key in any::<[u8; 32]>(),
        user_id in any::<i64>(),
        role in role(),
        lifetime in duration(),
        overdue_ms in 1i64..=7 * 24 * 3600 * 1000,
    ) {
        let codec = TokenCodec::new(&key).unwrap();
        let payload = Payload::new(user_id, "reader".into(), role, Utc::now(), lifetime).unwrap();
        let token = codec.encrypt(&payload).unwrap();

        prop_assert!(codec.decrypt_at(&token, payload.expires_at).is_ok());
        prop_assert_eq!(
            codec
                .decrypt_at(&token, payload.expires_at + Duration::milliseconds(overdue_ms))
                .unwrap_err(),
            TokenError::Expired
        );
    }

    /// Lifetimes that are zero or negative never produce a payload.
    #[test]
    fn prop_non_positive_lifetime_is_refused(
        user_id in any::<i64>(),
        role in role(),
        secs in -30i64 * 24 * 3600..=0,
    ) {
        let lifetime = Duration::seconds(secs);
        prop_assert_eq!(
            Payload::new(user_id, "reader".into(), role, Utc::now(), lifetime).unwrap_err(),
            TokenError::Duration(lifetime)
        );
    }
}
