//! Property-based tests for the hamlet core.
//!
//! Random operation sequences against the memory stream, character state
//! and room occupancy, checking the bounds that must hold after every step.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use hamlet_core::memory::{Importance, MemoryKind, MemoryStream, NewMemory};
use hamlet_core::room::{NoiseLevel, Room, RoomDefinition};
use hamlet_core::types::{CharacterId, RoomId};
use hamlet_core::{snapshot, Character, CharacterDefinition};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid date")
}

fn arb_kind() -> impl Strategy<Value = MemoryKind> {
    prop_oneof![
        Just(MemoryKind::Movement),
        Just(MemoryKind::Action),
        Just(MemoryKind::Dialogue),
        Just(MemoryKind::Observation),
        Just(MemoryKind::Custom),
    ]
}

/// (kind, importance, minutes since the previous add)
fn arb_add() -> impl Strategy<Value = (MemoryKind, u8, i64)> {
    (arb_kind(), 1u8..=5, 0i64..120)
}

fn character() -> Character {
    Character::from_definition(
        CharacterDefinition {
            id: CharacterId::new("alice"),
            name: "Alice".into(),
            age: 28,
            occupation: "painter".into(),
            personality: "restless".into(),
            background: String::new(),
            interests: BTreeSet::new(),
            initial_location: RoomId::new("studio"),
            daily_routine: BTreeMap::new(),
        },
        10,
    )
}

fn empty_room() -> Room {
    Room::from_definition(RoomDefinition {
        id: RoomId::new("hall"),
        name: "Hall".into(),
        description: "A long hall.".into(),
        connected_to: BTreeSet::new(),
        items: Vec::new(),
        ambient_sounds: Vec::new(),
        time_features: BTreeMap::new(),
    })
}

fn fill(stream: &mut MemoryStream, adds: &[(MemoryKind, u8, i64)]) -> DateTime<Utc> {
    let mut now = t0();
    for (i, (kind, importance, gap)) in adds.iter().enumerate() {
        now += Duration::minutes(*gap);
        let importance = Importance::new(*importance).expect("strategy yields 1..=5");
        stream.add(NewMemory::new(*kind, format!("event {i}"), importance), now);
    }
    now
}

// ---------------------------------------------------------------------------
// Property: a stream never exceeds its capacity
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn stream_length_never_exceeds_capacity(
        capacity in 1usize..20,
        adds in prop::collection::vec(arb_add(), 0..80),
    ) {
        let mut stream = MemoryStream::new(capacity);
        let mut now = t0();
        for (i, (kind, importance, gap)) in adds.iter().enumerate() {
            now += Duration::minutes(*gap);
            let importance = Importance::new(*importance).expect("strategy yields 1..=5");
            stream.add(NewMemory::new(*kind, format!("event {i}"), importance), now);
            prop_assert!(stream.len() <= capacity);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: the stream stays in chronological order
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn stream_stays_chronological(
        capacity in 1usize..10,
        adds in prop::collection::vec(arb_add(), 0..50),
    ) {
        let mut stream = MemoryStream::new(capacity);
        fill(&mut stream, &adds);
        let records = stream.records();
        for pair in records.windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at);
        }
    }
}

proptest! {
    #[test]
    fn stream_stays_chronological_when_the_clock_jumps_back(
        capacity in 1usize..10,
        gaps in prop::collection::vec(-180i64..120, 0..50),
    ) {
        let mut stream = MemoryStream::new(capacity);
        let mut now = t0();
        for (i, gap) in gaps.iter().enumerate() {
            now += Duration::minutes(*gap);
            stream.add(NewMemory::new(MemoryKind::Action, format!("event {i}"), Importance::ROUTINE), now);
        }
        for pair in stream.records().windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at);
        }
        let rebuilt = MemoryStream::from_records(stream.records().to_vec(), capacity);
        prop_assert_eq!(rebuilt.records(), stream.records());
    }
}

// ---------------------------------------------------------------------------
// Property: eviction never drops something more important than it keeps
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn evicted_records_rank_no_higher_than_survivors(
        adds in prop::collection::vec(arb_add(), 1..40),
    ) {
        let mut stream = MemoryStream::new(5);
        let mut now = t0();
        for (i, (kind, importance, gap)) in adds.iter().enumerate() {
            now += Duration::minutes(*gap);
            let importance = Importance::new(*importance).expect("strategy yields 1..=5");
            let evicted = stream.add(NewMemory::new(*kind, format!("event {i}"), importance), now);
            for gone in &evicted {
                for kept in stream.iter() {
                    prop_assert!(gone.importance <= kept.importance);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property: recent(h1) ⊆ recent(h2) when h1 <= h2
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn recent_is_monotonic(
        adds in prop::collection::vec(arb_add(), 0..40),
        h1 in 0i64..2_000,
        extra in 0i64..2_000,
    ) {
        let mut stream = MemoryStream::new(100);
        let now = fill(&mut stream, &adds);
        let narrow: Vec<_> = stream.recent(Duration::minutes(h1), now).collect();
        let wide: Vec<_> = stream.recent(Duration::minutes(h1 + extra), now).collect();
        prop_assert!(narrow.len() <= wide.len());
        for record in narrow {
            prop_assert!(wide.iter().any(|r| std::ptr::eq(*r, record)));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: relationship values stay within 0..=100
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn relationship_always_clamped(deltas in prop::collection::vec(any::<i32>(), 1..50)) {
        let mut alice = character();
        let bob = CharacterId::new("bob");
        for delta in deltas {
            let value = alice.update_relationship(&bob, delta);
            prop_assert!(value <= 100);
            prop_assert_eq!(value, alice.relationship_with(&bob));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: energy stays within 0..=100
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn energy_always_bounded(ops in prop::collection::vec((any::<bool>(), any::<u8>()), 1..60)) {
        let mut alice = character();
        for (consume, amount) in ops {
            let before = alice.energy();
            if consume {
                let ok = alice.consume_energy(amount);
                prop_assert_eq!(ok, before >= amount);
                if !ok {
                    prop_assert_eq!(alice.energy(), before);
                }
            } else {
                alice.rest(amount);
            }
            prop_assert!(alice.energy() <= 100);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: noise level tracks occupancy for every transition sequence
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn noise_level_tracks_occupancy(ops in prop::collection::vec((any::<bool>(), 0u8..6), 1..60)) {
        let mut room = empty_room();
        for (enter, who) in ops {
            let id = CharacterId::new(format!("c{who}"));
            if enter {
                room.add_occupant(id);
            } else {
                room.remove_occupant(&id);
            }
            let expected = match room.occupants().len() {
                0 => NoiseLevel::Quiet,
                1 | 2 => NoiseLevel::Normal,
                _ => NoiseLevel::Noisy,
            };
            prop_assert_eq!(room.state().noise_level, expected);
            prop_assert!(room.state().temperature <= 26.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: snapshots round-trip exactly
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn snapshot_round_trip(adds in prop::collection::vec(arb_add(), 0..30)) {
        let mut stream = MemoryStream::new(12);
        fill(&mut stream, &adds);
        let json = snapshot::to_json(&stream).expect("serialize");
        let restored = snapshot::from_json(&json, 12).expect("deserialize");
        prop_assert_eq!(restored, stream);
    }
}
