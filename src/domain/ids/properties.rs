//! Property tests: text round-trips and ordering laws.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;

use super::*;

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn country() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["DE", "AT", "FR", "NL", "CH", "DK", "IT", "SE"])
}

fn party_suffix() -> impl Strategy<Value = String> {
    "[A-Z0-9]{3}"
}

fn evse_text() -> impl Strategy<Value = String> {
    (country(), party_suffix(), "[A-Z0-9]{1,20}")
        .prop_map(|(cc, op, suffix)| format!("{}*{}*E{}", cc, op, suffix))
}

proptest! {
    #[test]
    fn operator_id_round_trips_in_every_iso_dialect(cc in country(), suffix in party_suffix()) {
        for text in [
            format!("{}{}", cc, suffix),
            format!("{}*{}", cc, suffix),
            format!("{}-{}", cc, suffix),
        ] {
            let id = OperatorId::parse(&text).unwrap();
            prop_assert_eq!(id.to_string(), text.clone());
            prop_assert_eq!(OperatorId::parse(&id.to_string()).unwrap(), id);
        }
    }

    #[test]
    fn operator_dialects_are_one_party(cc in country(), suffix in party_suffix()) {
        let plain = ProviderId::parse(&format!("{}{}", cc, suffix)).unwrap();
        let star = ProviderId::parse(&format!("{}*{}", cc, suffix)).unwrap();
        prop_assert_eq!(&plain, &star);
        prop_assert_eq!(hash_of(&plain), hash_of(&star));
        prop_assert_eq!(plain.cmp(&star), Ordering::Equal);
    }

    #[test]
    fn evse_id_round_trips(text in evse_text()) {
        let id = EvseId::parse(&text).unwrap();
        prop_assert_eq!(id.to_string(), text);
        let again = EvseId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(hash_of(&again), hash_of(&id));
        prop_assert_eq!(again, id);
    }

    #[test]
    fn evse_lowercase_is_the_same_evse(text in evse_text()) {
        let upper = EvseId::parse(&text).unwrap();
        let lower = EvseId::parse(&text.to_ascii_lowercase()).unwrap();
        prop_assert_eq!(upper, lower);
    }

    #[test]
    fn evco_din_star_round_trips(
        cc in country(),
        provider in party_suffix(),
        instance in "[A-Z0-9]{6}",
        check in prop::option::of("[0-9X]"),
    ) {
        let text = match &check {
            Some(digit) => format!("{}*{}*{}*{}", cc, provider, instance, digit),
            None => format!("{}*{}*{}", cc, provider, instance),
        };
        let id = EvcoId::parse(&text).unwrap();
        prop_assert_eq!(id.to_string(), text);
        prop_assert_eq!(EvcoId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn uid_is_case_insensitive(hex in "[a-f0-9]{8}|[a-f0-9]{14}|[a-f0-9]{20}") {
        let lower = Uid::parse(&hex).unwrap();
        let upper = Uid::parse(&hex.to_ascii_uppercase()).unwrap();
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn evse_order_is_a_total_order(a in evse_text(), b in evse_text(), c in evse_text()) {
        let (a, b, c) = (
            EvseId::parse(&a).unwrap(),
            EvseId::parse(&b).unwrap(),
            EvseId::parse(&c).unwrap(),
        );
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
        if a <= b && b <= c {
            prop_assert!(a <= c);
        }
    }

    #[test]
    fn shorter_uid_sorts_first(short in "[A-F0-9]{8}", long in "[A-F0-9]{14}") {
        let short = Uid::parse(&short).unwrap();
        let long = Uid::parse(&long).unwrap();
        prop_assert!(short < long);
    }

    #[test]
    fn session_ids_round_trip(_seed in any::<u8>()) {
        let id = SessionId::new_random();
        prop_assert_eq!(SessionId::parse(id.as_str()).unwrap(), id);
    }
}
