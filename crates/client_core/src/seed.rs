//! Synthetic member generation for exercising paging and sorting.

use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

use crate::registration::NewMember;

pub const DEFAULT_SEED_COUNT: usize = 100;

const GIVEN_NAMES: &[&str] = &[
    "John", "Jane", "Michael", "Sarah", "David", "Lisa", "Robert", "Emily", "James", "Jessica",
    "William", "Ashley", "Richard", "Amanda", "Joseph", "Stephanie", "Thomas", "Melissa",
    "Christopher", "Nicole", "Daniel", "Jennifer", "Matthew", "Elizabeth", "Anthony", "Helen",
    "Mark", "Sandra", "Donald", "Donna", "Steven", "Carol", "Paul", "Ruth", "Andrew", "Sharon",
    "Joshua", "Michelle", "Kenneth", "Laura", "Kevin", "Brian", "Kimberly", "George", "Deborah",
    "Edward", "Dorothy", "Ronald", "Timothy", "Nancy", "Jason", "Karen", "Jeffrey", "Betty",
    "Ryan", "Jacob", "Gary", "Nicholas", "Eric", "Jonathan", "Stephen", "Larry", "Justin",
    "Scott", "Brandon", "Benjamin", "Samuel", "Gregory", "Frank", "Raymond", "Alexander",
    "Patrick", "Jack", "Dennis", "Jerry", "Tyler",
];

const FAMILY_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
    "Scott", "Torres", "Nguyen", "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall",
    "Rivera", "Campbell", "Mitchell", "Carter", "Roberts", "Gomez", "Phillips", "Evans", "Turner",
    "Diaz", "Parker", "Cruz", "Edwards", "Collins", "Reyes", "Stewart", "Morris", "Morales",
    "Murphy", "Cook", "Rogers", "Gutierrez", "Ortiz", "Morgan", "Cooper", "Peterson", "Bailey",
    "Reed", "Kelly", "Howard", "Ramos", "Kim", "Cox", "Ward", "Richardson", "Watson", "Brooks",
    "Chavez", "Wood", "James", "Bennett", "Gray", "Mendoza", "Ruiz", "Hughes", "Price", "Alvarez",
    "Castillo", "Sanders", "Patel", "Myers", "Long", "Ross", "Foster", "Jimenez",
];

const DOMAINS: &[&str] = &[
    "example.com",
    "test.org",
    "demo.net",
    "sample.edu",
    "mock.gov",
    "company.co.uk",
    "university.ac.uk",
];

const EMAIL_FORMAT_COUNT: usize = 8;
const DOTTED_FORMAT_BIAS: f64 = 0.4;

/// Builds `count` members whose emails are unique within the batch.
///
/// Emails are spread over several local-part shapes (dots, plus tags,
/// initials, digits). A collision gets a numeric suffix before the `@`.
pub fn generate_members<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<NewMember> {
    let mut used = HashSet::with_capacity(count);
    let mut members = Vec::with_capacity(count);

    while members.len() < count {
        let name = GIVEN_NAMES.choose(rng).copied().unwrap_or("John");
        let surname = FAMILY_NAMES.choose(rng).copied().unwrap_or("Smith");
        let domain = DOMAINS.choose(rng).copied().unwrap_or("example.com");

        let base = random_email(rng, name, surname, domain);
        let email = deduplicate(&base, &used);
        used.insert(email.clone());

        if let Ok(member) = NewMember::new(name, surname, &email) {
            members.push(member);
        }
    }

    members
}

fn random_email<R: Rng + ?Sized>(rng: &mut R, name: &str, surname: &str, domain: &str) -> String {
    let first = name.to_lowercase();
    let last = surname.to_lowercase();
    let format = if rng.gen_bool(DOTTED_FORMAT_BIAS) {
        0
    } else {
        rng.gen_range(0..EMAIL_FORMAT_COUNT)
    };

    match format {
        0 => format!("{first}.{last}@{domain}"),
        1 => format!("{first}{last}@{domain}"),
        2 => format!("{first}_{last}@{domain}"),
        3 => format!("{first}+{last}@{domain}"),
        4 => format!("{first}.{last}{}@{domain}", rng.gen_range(0..99)),
        5 => {
            let initial = first.chars().next().unwrap_or('x');
            format!("{initial}.{last}@{domain}")
        }
        6 => {
            let middle = char::from(b'a' + rng.gen_range(0..26u8));
            format!("{first}.{middle}.{last}@{domain}")
        }
        _ => format!("{first}-{last}@{domain}"),
    }
}

/// `a.b@x` -> `a.b1@x`, `a.b2@x`, ... until unused.
pub fn deduplicate(email: &str, used: &HashSet<String>) -> String {
    if !used.contains(email) {
        return email.to_string();
    }

    let (local, domain) = email.split_at(email.find('@').unwrap_or(email.len()));
    let mut counter = 1usize;
    loop {
        let candidate = format!("{local}{counter}{domain}");
        if !used.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
#[path = "tests/seed_tests.rs"]
mod tests;
