//! RFC 4226 Appendix D test vectors
//!
//! The full published vector table for the 20-byte key "12345678901234567890".
//! The key is supplied hex-encoded or as raw bytes: the plain string is
//! itself even-length valid hex, so `Secret::parse` would decode it to ten
//! different key bytes (that decode rule is pinned below).

use otp_engine::{hotp, validate_hotp, HotpConfig, Secret};

const RFC_CODES: [&str; 10] = [
    "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583", "399871",
    "520489",
];

fn rfc_secret() -> Secret {
    Secret::parse("3132333435363738393031323334353637383930").unwrap()
}

#[test]
fn all_appendix_d_codes() {
    let secret = rfc_secret();
    for (counter, expected) in RFC_CODES.iter().enumerate() {
        assert_eq!(
            hotp(&secret, counter as u64, 6).unwrap(),
            *expected,
            "counter {}",
            counter
        );
    }
}

#[test]
fn raw_bytes_match_hex_encoded_secret() {
    let from_bytes = Secret::from_bytes(b"12345678901234567890".to_vec()).unwrap();
    assert_eq!(from_bytes.as_bytes(), rfc_secret().as_bytes());
    assert_eq!(hotp(&from_bytes, 0, 6).unwrap(), "755224");
}

#[test]
fn all_digit_secret_string_decodes_as_hex_not_ascii() {
    // "12345678901234567890" is valid hex, so parse() produces the ten
    // bytes 12 34 56 78 90 12 34 56 78 90 and different codes than the
    // RFC table for the same-named ASCII key
    let parsed = Secret::parse("12345678901234567890").unwrap();
    assert_eq!(
        parsed.as_bytes(),
        &[0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90]
    );
    assert_ne!(hotp(&parsed, 0, 6).unwrap(), "755224");
}

#[test]
fn every_vector_validates_at_its_own_counter() {
    let secret = rfc_secret();
    let config = HotpConfig::default();

    for (counter, code) in RFC_CODES.iter().enumerate() {
        let result = validate_hotp(&secret, code, counter as u64, &config).unwrap();
        assert!(result.accepted);
        assert_eq!(result.new_counter, counter as u64 + 1);
    }
}

#[test]
fn window_covers_exactly_ten_counters() {
    let secret = rfc_secret();
    let config = HotpConfig::default();

    // Counter 9 is the last value inside a window starting at 0
    let inside = validate_hotp(&secret, RFC_CODES[9], 0, &config).unwrap();
    assert!(inside.accepted);
    assert_eq!(inside.new_counter, 10);

    // Counter 10 is the first value outside it
    let code_10 = hotp(&secret, 10, 6).unwrap();
    let outside = validate_hotp(&secret, &code_10, 0, &config).unwrap();
    assert!(!outside.accepted);
    assert_eq!(outside.new_counter, 0);
}
