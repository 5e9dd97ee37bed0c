use tokio_postgres::Row;

/// An administrator account.
#[derive(Clone, Debug)]
pub struct Admin {
    /// The admin's login name.
    pub username: String,
    /// The argon2id PHC string of the admin's password.
    pub password_hash: String,
}

impl TryFrom<&Row> for Admin {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}
