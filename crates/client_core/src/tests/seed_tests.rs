use super::*;
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn generates_requested_count_with_unique_emails() {
    let mut rng = StdRng::seed_from_u64(7);
    let members = generate_members(&mut rng, DEFAULT_SEED_COUNT);

    assert_eq!(members.len(), DEFAULT_SEED_COUNT);
    let unique: HashSet<&str> = members.iter().map(|m| m.email()).collect();
    assert_eq!(unique.len(), members.len());
}

#[test]
fn emails_are_built_from_the_chosen_names() {
    let mut rng = StdRng::seed_from_u64(42);
    for member in generate_members(&mut rng, 50) {
        let (local, domain) = member.email().split_once('@').expect("has @");
        assert!(DOMAINS.contains(&domain), "unexpected domain {domain}");
        assert!(
            local.contains(&member.surname().to_lowercase()),
            "{local} does not mention {}",
            member.surname()
        );
        assert!(GIVEN_NAMES.contains(&member.name()));
        assert!(FAMILY_NAMES.contains(&member.surname()));
    }
}

#[test]
fn same_seed_gives_same_members() {
    let first = generate_members(&mut StdRng::seed_from_u64(3), 20);
    let second = generate_members(&mut StdRng::seed_from_u64(3), 20);
    assert_eq!(first, second);
}

#[test]
fn large_batches_stay_unique_despite_collisions() {
    let mut rng = StdRng::seed_from_u64(1);
    let members = generate_members(&mut rng, 2_000);
    let unique: HashSet<&str> = members.iter().map(|m| m.email()).collect();
    assert_eq!(unique.len(), 2_000);
}

#[test]
fn deduplicate_inserts_counter_before_at() {
    let mut used = HashSet::new();
    assert_eq!(deduplicate("a.b@x.org", &used), "a.b@x.org");

    used.insert("a.b@x.org".to_string());
    assert_eq!(deduplicate("a.b@x.org", &used), "a.b1@x.org");

    used.insert("a.b1@x.org".to_string());
    assert_eq!(deduplicate("a.b@x.org", &used), "a.b2@x.org");
}

#[test]
fn zero_count_is_empty() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(generate_members(&mut rng, 0).is_empty());
}
