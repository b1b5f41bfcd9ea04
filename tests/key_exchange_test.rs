use kdc_protocol::{
    DhParameters, Error, ExponentiationMode, KeyExchange, ParseError, Result, SessionKey,
};
use kdc_protocol::core::crypto::derivation::derive;
use std::io::Write;

const SAMPLE: DhParameters = DhParameters {
    modulus: 23,
    generator: 5,
};

// ----- Key Exchange Tests -----

#[test]
fn test_sample_exchange_agrees() {
    let center = KeyExchange::new(SAMPLE, 9);
    let party = KeyExchange::new(SAMPLE, 3);

    assert_eq!(center.public_value(), 11);
    assert_eq!(party.public_value(), 10);

    let (_, center_secret) = center.compute_exchange(party.public_value());
    let (_, party_secret) = party.compute_exchange(center.public_value());
    assert_eq!(center_secret, 20);
    assert_eq!(party_secret, 20);

    assert_eq!(SessionKey::derive(center_secret).value(), 1003);
    assert_eq!(SessionKey::derive(party_secret).value(), 1003);
}

#[test]
fn test_float_overflow_is_preserved() {
    let params = DhParameters::new(2_147_483_647, 16_807).unwrap();
    let exchange = KeyExchange::new(params, 9);

    assert_eq!(exchange.mode(), ExponentiationMode::Float);
    assert_eq!(exchange.public_value(), -2);
    assert_eq!(derive(exchange.public_value()), 1);
}

#[test]
fn test_exact_mode_differs_on_overflow() {
    let params = DhParameters::new(1_000_003, 123_456).unwrap();
    let exact = KeyExchange::with_mode(params, 3, ExponentiationMode::Exact);
    assert_eq!(exact.public_value(), 298_866);

    let params = DhParameters::new(2_147_483_647, 16_807).unwrap();
    let exact = KeyExchange::with_mode(params, 9, ExponentiationMode::Exact);
    assert!(exact.public_value() >= 0);
    assert!(exact.public_value() < 2_147_483_647);
}

#[test]
fn test_modes_agree_on_small_parameters() {
    for (p, g) in [(23, 5), (353, 3), (97, 5)] {
        let params = DhParameters::new(p, g).unwrap();
        for e in 1..6 {
            let float = KeyExchange::with_mode(params, e, ExponentiationMode::Float);
            let exact = KeyExchange::with_mode(params, e, ExponentiationMode::Exact);
            assert_eq!(float.public_value(), exact.public_value(), "P={} G={} e={}", p, g, e);
        }
    }
}

// ----- Key File Tests -----

#[test]
fn test_parse_key_parameters() -> Result<()> {
    assert_eq!(DhParameters::parse("23 5\n")?, SAMPLE);
    assert_eq!(DhParameters::parse("  23\n\t5  ")?, SAMPLE);
    Ok(())
}

#[test]
fn test_parse_key_parameters_rejects_garbage() {
    for text in ["", "23", "P G", "23 five"] {
        match DhParameters::parse(text) {
            Err(Error::Parse(ParseError::KeyParameters(_))) => {}
            other => panic!("expected key parameter error for {:?}, got {:?}", text, other),
        }
    }
    assert!(matches!(DhParameters::parse("0 5"), Err(Error::Config(_))));
}

#[test]
fn test_load_key_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("kdc-keys-{}.txt", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "353 3")?;
    drop(file);

    let params = DhParameters::load(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(params, DhParameters { modulus: 353, generator: 3 });

    let missing = DhParameters::load(&path);
    assert!(matches!(missing, Err(Error::Setup(_))));
    Ok(())
}
