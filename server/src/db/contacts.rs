//! Database operations for the contacts table.

use rolodex_engine::{identity, ContactRecord, Origin};
use sqlx::{PgConnection, PgPool, Row};

/// A stored contact row from the database.
#[derive(Debug)]
pub struct StoredContact {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub remote_ref: Option<String>,
    pub remote_version: Option<String>,
    pub origin: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredContact {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredContact {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            company: row.try_get("company")?,
            remote_ref: row.try_get("remote_ref")?,
            remote_version: row.try_get("remote_version")?,
            origin: row.try_get("origin")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredContact {
    /// Convert database row to an engine contact.
    pub fn to_record(&self) -> Result<ContactRecord, String> {
        let origin: Origin = self.origin.parse()?;
        Ok(ContactRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            remote_ref: self.remote_ref.clone(),
            remote_version: self.remote_version.clone(),
            origin,
            created_at: self.created_at as u64,
            updated_at: self.updated_at as u64,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, phone, email, company, remote_ref, remote_version,
           origin, created_at, updated_at
    FROM contacts
"#;

/// Insert a new contact.
pub async fn insert_contact(pool: &PgPool, record: &ContactRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO contacts (
            id, name, phone, phone_key, email, company,
            remote_ref, remote_version, origin, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(&record.phone)
    .bind(identity::key(record))
    .bind(&record.email)
    .bind(&record.company)
    .bind(&record.remote_ref)
    .bind(&record.remote_version)
    .bind(record.origin.as_str())
    .bind(record.created_at as i64)
    .bind(record.updated_at as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite every mutable column of an existing contact.
pub async fn update_contact(
    conn: &mut PgConnection,
    record: &ContactRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE contacts SET
            name = $2,
            phone = $3,
            phone_key = $4,
            email = $5,
            company = $6,
            remote_ref = $7,
            remote_version = $8,
            origin = $9,
            updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(&record.id)
    .bind(&record.name)
    .bind(&record.phone)
    .bind(identity::key(record))
    .bind(&record.email)
    .bind(&record.company)
    .bind(&record.remote_ref)
    .bind(&record.remote_version)
    .bind(record.origin.as_str())
    .bind(record.updated_at as i64)
    .execute(conn)
    .await?;

    Ok(())
}

/// Get a contact by ID, locking its row for the rest of the transaction.
pub async fn get_contact_for_update(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Option<StoredContact>, sqlx::Error> {
    let query = format!("{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, StoredContact>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Get a contact by ID.
pub async fn get_contact(pool: &PgPool, id: &str) -> Result<Option<StoredContact>, sqlx::Error> {
    let query = format!("{SELECT_COLUMNS} WHERE id = $1");
    sqlx::query_as::<_, StoredContact>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// All contacts in insertion order.
pub async fn list_contacts(pool: &PgPool) -> Result<Vec<StoredContact>, sqlx::Error> {
    let query = format!("{SELECT_COLUMNS} ORDER BY seq ASC");
    sqlx::query_as::<_, StoredContact>(&query)
        .fetch_all(pool)
        .await
}

/// Delete a contact, returning the removed row.
pub async fn delete_contact(pool: &PgPool, id: &str) -> Result<Option<StoredContact>, sqlx::Error> {
    sqlx::query_as::<_, StoredContact>(
        r#"
        DELETE FROM contacts
        WHERE id = $1
        RETURNING id, name, phone, email, company, remote_ref, remote_version,
                  origin, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
