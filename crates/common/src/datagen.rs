//! Random test data generation
//!
//! Generators take any [`Rng`] so tests can seed them. The `*_random_*`
//! wrappers use the thread-local generator.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{Category, Credentials, Pet, PetStatus, Tag};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated passwords
pub const PASSWORD_LENGTH: usize = 14;

const EMAIL_PREFIX: &str = "testUser";
const EMAIL_DOMAIN: &str = "automation.cedar";
const EMAIL_SUFFIX_LENGTH: usize = 5;

/// Species and the photo used for them
const SPECIES: &[(&str, &str)] = &[
    ("Dog", "https://images.dog.ceo/breeds/retriever-golden/n02099601_3004.jpg"),
    ("Cat", "https://cdn2.thecatapi.com/images/MTY3ODIyMQ.jpg"),
    ("Rabbit", "https://upload.wikimedia.org/wikipedia/commons/4/41/Oryctolagus_cuniculus_Rcdo.jpg"),
    ("Parrot", "https://upload.wikimedia.org/wikipedia/commons/5/5b/Ara_macao_-on_a_small_bicycle-8.jpg"),
    ("Hamster", "https://upload.wikimedia.org/wikipedia/commons/c/cf/Pearl_Winter_White_Russian_Dwarf_Hamster_-_Front.jpg"),
    ("Turtle", "https://upload.wikimedia.org/wikipedia/commons/8/80/Turtle_Trachemys_scripta.jpg"),
];

const NAMES: &[&str] = &[
    "Max", "Bella", "Charlie", "Luna", "Rocky", "Daisy", "Milo", "Coco", "Buddy", "Lola",
    "Oscar", "Ruby", "Teddy", "Nala", "Simba",
];

/// Generate a random pet with a status of `available`
pub fn generate_pet<R: Rng + ?Sized>(rng: &mut R) -> Pet {
    let (species, photo_url) = SPECIES[rng.gen_range(0..SPECIES.len())];
    let name = NAMES[rng.gen_range(0..NAMES.len())];

    Pet {
        id: rng.gen_range(0..1000),
        category: Category {
            id: rng.gen_range(0..100),
            name: species.to_string(),
        },
        name: name.to_string(),
        photo_urls: vec![photo_url.to_string()],
        tags: vec![Tag {
            id: rng.gen_range(0..100),
            name: species.to_lowercase(),
        }],
        status: PetStatus::Available,
    }
}

pub fn generate_random_pet() -> Pet {
    generate_pet(&mut rand::thread_rng())
}

/// `testUser<5 alphanumerics>@automation.cedar`
pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}{}@{}",
        EMAIL_PREFIX,
        random_from(rng, ALPHANUMERIC, EMAIL_SUFFIX_LENGTH),
        EMAIL_DOMAIN
    )
}

pub fn create_random_email() -> String {
    email(&mut rand::thread_rng())
}

/// A password of [`PASSWORD_LENGTH`] characters containing at least one
/// uppercase letter, lowercase letter, digit and symbol.
pub fn password<R: Rng + ?Sized>(rng: &mut R) -> String {
    let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LENGTH);
    for class in [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS] {
        chars.push(pick(rng, class));
    }
    while chars.len() < PASSWORD_LENGTH {
        chars.push(pick(rng, &all));
    }

    // Fisher-Yates; only reorders the guaranteed characters
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}

pub fn create_random_password() -> String {
    password(&mut rand::thread_rng())
}

pub fn random_credentials() -> Credentials {
    let mut rng = rand::thread_rng();
    Credentials {
        email: email(&mut rng),
        password: password(&mut rng),
    }
}

/// Random lowercase letters
pub fn random_letters(length: usize) -> String {
    random_from(&mut rand::thread_rng(), LOWERCASE, length)
}

/// Random alphanumeric string
pub fn random_string(length: usize) -> String {
    random_from(&mut rand::thread_rng(), ALPHANUMERIC, length)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, set: &[u8]) -> u8 {
    set[rng.gen_range(0..set.len())]
}

fn random_from<R: Rng + ?Sized>(rng: &mut R, set: &[u8], length: usize) -> String {
    (0..length).map(|_| char::from(pick(rng, set))).collect()
}
