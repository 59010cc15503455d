/// Stand-in credential check behind a single seam so a real identity
/// provider can replace it without touching the session handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub username: String,
}

const USERS: &[(&str, &str)] = &[
    ("admin", "admin123"),
    ("guru1", "guru123"),
    ("Luzman", "123123"),
];

pub fn verify(username: &str, password: &str) -> Option<Principal> {
    USERS
        .iter()
        .find(|(u, p)| *u == username && *p == password)
        .map(|(u, _)| Principal {
            username: u.to_string(),
        })
}
