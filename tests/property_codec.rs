// tests/property_codec.rs

//! Property-based checks on the transport codec.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bgtask::{AsyncTask, Codec};
use proptest::prelude::*;

proptest! {
    /// Decoding never panics, whatever arrives on the command line.
    #[test]
    fn decode_never_panics(input in ".{0,256}") {
        let _ = Codec::new().decode(&input);
        let _ = Codec::with_secret("s").decode(&input);
    }

    /// Base64-wrapped arbitrary bytes never panic the decoder either.
    #[test]
    fn decode_of_arbitrary_base64_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let transport = BASE64.encode(&bytes);
        let _ = Codec::new().decode(&transport);
    }

    /// Any JSON-safe argument payload survives encode/decode intact.
    #[test]
    fn func_args_round_trip(name in "[a-z][a-z0-9_.]{0,32}", arg in "\\PC{0,64}", limit in 1u64..86_400) {
        let codec = Codec::new();
        let task = AsyncTask::from_fn(name, serde_json::json!([arg]))
            .with_time_limit(limit)
            .unwrap();

        let decoded = codec.decode(&codec.encode(&task).unwrap()).unwrap();
        prop_assert_eq!(decoded.payload(), task.payload());
        prop_assert_eq!(decoded.time_limit(), Some(limit));
    }

    /// Tampering with any byte of a signed transport is rejected.
    #[test]
    fn signed_transport_rejects_tampering(flip in 0usize..64) {
        let codec = Codec::with_secret("property-secret");
        let task = AsyncTask::from_fn("prop.tamper", serde_json::json!(null));
        let transport = codec.encode(&task).unwrap();

        let mut bytes = BASE64.decode(&transport).unwrap();
        let idx = flip % bytes.len();
        bytes[idx] ^= 0x01;
        let tampered = BASE64.encode(&bytes);
        prop_assert!(codec.decode(&tampered).is_err());
    }
}
