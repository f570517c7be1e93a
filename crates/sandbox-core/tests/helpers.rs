#![allow(dead_code)]

use sandbox_core::{ChainConfig, Clock, Session, TimestampMode};

pub fn deterministic_config() -> ChainConfig {
    ChainConfig::default()
        .with_timestamp_mode(TimestampMode::Excluded)
        .with_clock(Clock::Fixed(1_600_000_000))
}

pub fn deterministic_session() -> Session {
    Session::new(deterministic_config())
}

pub fn random_payload(rng: &mut impl rand::Rng) -> String {
    let amount: u32 = rng.gen_range(1..1_000);
    let names = ["Alice", "Bob", "Carol", "Dave", "Erin"];
    let from = names[rng.gen_range(0..names.len())];
    let to = names[rng.gen_range(0..names.len())];
    format!("{from} pays {to} {amount}")
}
