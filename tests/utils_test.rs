use moodcli::utils::{
    CODE_VERIFIER_LENGTH, STATE_LENGTH, format_clock, generate_code_challenge,
    generate_code_verifier, generate_random_string, generate_state,
};

#[test]
fn test_generate_random_string_length_and_alphabet() {
    for length in [0, 1, 16, 43, 128] {
        let s = generate_random_string(length);
        assert_eq!(s.len(), length);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

#[test]
fn test_generate_random_string_is_not_repeated() {
    assert_ne!(generate_random_string(32), generate_random_string(32));
}

#[test]
fn test_verifier_and_state_lengths() {
    assert_eq!(generate_code_verifier().len(), CODE_VERIFIER_LENGTH);
    assert_eq!(generate_state().len(), STATE_LENGTH);
    assert_eq!(CODE_VERIFIER_LENGTH, 128);
    assert_eq!(STATE_LENGTH, 16);
}

#[test]
fn test_code_challenge_rfc7636_vector() {
    assert_eq!(
        generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_code_challenge_for_full_length_verifier() {
    let alphabet = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let verifier: String = alphabet.chars().cycle().take(128).collect();
    assert!(verifier.ends_with("abcd"));

    let challenge = generate_code_challenge(&verifier);
    assert_eq!(challenge, "0x0OwmlS-Pjf_S6O8RbJZLlbn1lzhB9L9S3KngySNMw");
}

#[test]
fn test_code_challenge_is_deterministic_and_url_safe() {
    let verifier = generate_code_verifier();
    let challenge = generate_code_challenge(&verifier);

    assert_eq!(challenge, generate_code_challenge(&verifier));
    assert_eq!(challenge.len(), 43);
    assert!(!challenge.contains(['+', '/', '=']));
}

#[test]
fn test_format_clock() {
    assert_eq!(format_clock(0), "00:00");
    assert_eq!(format_clock(59), "00:59");
    assert_eq!(format_clock(25 * 60), "25:00");
    assert_eq!(format_clock(61 * 60 + 5), "61:05");
}
