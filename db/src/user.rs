#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// The contact slice of a user exposed through nested selections.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UserEmail {
    pub email: String,
}

impl From<String> for UserEmail {
    fn from(email: String) -> Self {
        Self { email }
    }
}
