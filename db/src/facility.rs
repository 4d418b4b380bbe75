use crate::user::UserEmail;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FacilityContact {
    pub name: String,
    pub user: UserEmail,
}

impl FacilityContact {
    pub fn new(name: String, email: String) -> Self {
        Self {
            name,
            user: UserEmail::from(email),
        }
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}
