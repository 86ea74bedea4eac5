#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]

use auth_identity::{Identity, IdentityConfig, Role, TokenCodec, VerificationError};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

const SECRET: &str = "property-test-secret-0123456789abcdef";

fn codec() -> TokenCodec {
    TokenCodec::new(&IdentityConfig::new(SECRET)).unwrap()
}

fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::User), Just(Role::Guest)]
}

fn identity() -> impl Strategy<Value = Identity> {
    (any::<i32>(), "[a-z0-9._]{1,20}@[a-z]{1,10}\\.[a-z]{2,4}", "\\PC{1,24}", role()).prop_map(
        |(user_id, email, login, role)| Identity {
            user_id,
            email,
            login,
            role,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn access_tokens_round_trip(
        identity in identity(),
        issued in 1_000_000_000i64..2_000_000_000,
        elapsed in 0i64..=1800,
    ) {
        let codec = codec();
        let now = Utc.timestamp_opt(issued, 0).unwrap();
        let token = codec.issue_access_token(&identity, now).unwrap();

        let claims = codec
            .decode_access(&token, now + Duration::seconds(elapsed))
            .unwrap();
        prop_assert_eq!(claims.identity, identity);
    }

    #[test]
    fn expired_tokens_always_fail_as_expired(
        identity in identity(),
        issued in 1_000_000_000i64..2_000_000_000,
        late_by in 1i64..10_000_000,
    ) {
        let codec = codec();
        let now = Utc.timestamp_opt(issued, 0).unwrap();
        let access = codec.issue_access_token(&identity, now).unwrap();
        let refresh = codec.issue_refresh_token(identity.user_id, now).unwrap();

        let after_access = now + codec.access_ttl() + Duration::seconds(late_by);
        let after_refresh = now + codec.refresh_ttl() + Duration::seconds(late_by);
        prop_assert_eq!(
            codec.decode_and_verify(&access, after_access),
            Err(VerificationError::Expired)
        );
        prop_assert_eq!(
            codec.decode_and_verify(&refresh, after_refresh),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn wrong_separator_count_is_malformed(raw in "[A-Za-z0-9_.-]{0,64}") {
        prop_assume!(raw.matches('.').count() != 2);
        prop_assert_eq!(
            codec().decode_and_verify(&raw, Utc::now()),
            Err(VerificationError::MalformedToken)
        );
    }

    #[test]
    fn extra_segment_on_a_valid_token_is_malformed(
        identity in identity(),
        suffix in "[A-Za-z0-9_-]{0,12}",
    ) {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue_access_token(&identity, now).unwrap();
        let tampered = format!("{token}.{suffix}");
        prop_assert_eq!(
            codec.decode_and_verify(&tampered, now),
            Err(VerificationError::MalformedToken)
        );
    }
}
