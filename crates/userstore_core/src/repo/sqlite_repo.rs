//! SQLite-backed user repository.
//!
//! # Responsibility
//! - Persist users and their role links in relational storage.
//! - Delegate uniqueness and write races to the database server.
//!
//! # Invariants
//! - `users.email` carries a UNIQUE index; a constraint violation on it maps
//!   to `RepoError::DuplicateKey`.
//! - Role rows are shared across users and re-attached on every write.
//! - Multi-statement writes run inside a single transaction.

use crate::model::user::{User, UserId, UserUniqueKey};
use crate::repo::user_repo::{RepoError, RepoResult, UserRepository};
use log::{error, warn};
use rusqlite::{params, Connection, Transaction};
use uuid::Uuid;

/// Repository over a migrated/ready SQLite connection.
#[derive(Debug)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, new_user: &User) -> RepoResult<User> {
        new_user.validate()?;

        let id = Uuid::new_v4();
        let key = new_user.unique_key();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3);",
            params![id.to_string(), new_user.name, new_user.email],
        )
        .map_err(|err| {
            let mapped = map_email_constraint(err, &key);
            if matches!(mapped, RepoError::DuplicateKey(_)) {
                error!(
                    "event=user_create module=repo status=error error_code=duplicate_key key={key}"
                );
            }
            mapped
        })?;
        attach_roles(&tx, id, &new_user.roles)?;
        tx.commit()?;

        self.get_user(id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<User> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            return Ok(User {
                id: Some(parse_user_id(&id_text)?),
                name: row.get("name")?,
                email: row.get("email")?,
                roles: load_roles(self.conn, &id_text)?,
            });
        }

        Err(RepoError::NotFound(id))
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        self.query_users("SELECT id, name, email FROM users ORDER BY created_at ASC, id ASC;", [])
    }

    fn update_user(&self, user: &User) -> RepoResult<User> {
        user.validate()?;
        let id = user.id.ok_or_else(|| {
            RepoError::InvalidData("update requires a persisted user id".to_string())
        })?;
        let key = user.unique_key();

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(
                "UPDATE users
                 SET
                    name = ?2,
                    email = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), user.name, user.email],
            )
            .map_err(|err| {
                let mapped = map_email_constraint(err, &key);
                if matches!(mapped, RepoError::DuplicateKey(_)) {
                    error!(
                        "event=user_update module=repo status=error error_code=duplicate_key key={key}"
                    );
                }
                mapped
            })?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute(
            "DELETE FROM user_roles WHERE user_id = ?1;",
            [id.to_string()],
        )?;
        attach_roles(&tx, id, &user.roles)?;
        tx.commit()?;

        self.get_user(id)
    }

    fn delete_user(&self, user: &User) -> RepoResult<()> {
        let key = user.unique_key();
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE email = ?1;", [key.email()])?;
        if changed == 0 {
            warn!("event=user_delete module=repo status=skipped reason=not_found key={key}");
        }
        Ok(())
    }

    fn find_users_by_name(&self, name: &str) -> RepoResult<Vec<User>> {
        self.query_users(
            "SELECT id, name, email FROM users WHERE name = ?1 ORDER BY created_at ASC, id ASC;",
            [name],
        )
    }
}

impl SqliteUserRepository<'_> {
    fn query_users<P: rusqlite::Params>(&self, sql: &str, params: P) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            users.push(User {
                id: Some(parse_user_id(&id_text)?),
                name: row.get("name")?,
                email: row.get("email")?,
                roles: load_roles(self.conn, &id_text)?,
            });
        }
        Ok(users)
    }
}

/// Links roles to a user, creating missing role rows.
///
/// Existing role rows are reused, so two users sharing a role name point at
/// the same row. Duplicate names in the input collapse through the join
/// table primary key.
fn attach_roles(tx: &Transaction<'_>, user_id: UserId, roles: &[String]) -> RepoResult<()> {
    for role in roles {
        tx.execute(
            "INSERT OR IGNORE INTO roles (name) VALUES (?1);",
            [role.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id)
             SELECT ?1, id
             FROM roles
             WHERE name = ?2;",
            params![user_id.to_string(), role.as_str()],
        )?;
    }
    Ok(())
}

fn load_roles(conn: &Connection, user_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT r.name
         FROM user_roles ur
         INNER JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ?1
         ORDER BY r.name ASC;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut roles = Vec::new();
    while let Some(row) = rows.next()? {
        roles.push(row.get::<_, String>(0)?);
    }
    Ok(roles)
}

fn parse_user_id(value: &str) -> RepoResult<UserId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in users.id")))
}

fn map_email_constraint(err: rusqlite::Error, key: &UserUniqueKey) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains("users.email") =>
        {
            RepoError::DuplicateKey(key.clone())
        }
        _ => RepoError::from(err),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["users", "roles", "user_roles"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::InvalidData(format!(
                "required table `{table}` is missing; run migrations first"
            )));
        }
    }

    for column in ["id", "name", "email"] {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::InvalidData(format!(
                "required column `users.{column}` is missing; run migrations first"
            )));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
