//! Utility functions for record ids

use bech32::Bech32m;
use uuid7::uuid7;

pub const HERO_PREFIX: &str = "hero_";
pub const PET_PREFIX: &str = "pet_";
pub const ADMIN_PREFIX: &str = "admin_";

// construct a unique record id then encode using bech32
pub fn new_record_id(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_carry_prefix() {
        let id = new_record_id(PET_PREFIX).unwrap();
        assert!(id.starts_with("pet_1"));
    }

    #[test]
    fn record_ids_differ_per_call() {
        let a = new_record_id(HERO_PREFIX).unwrap();
        let b = new_record_id(HERO_PREFIX).unwrap();
        assert_ne!(a, b);
    }
}
