use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

use crate::error::Result;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let migrations = Migrations::new(vec![M::up(include_str!(
        "../../migrations/001_initial.sql"
    ))]);

    migrations.to_latest(conn)?;
    Ok(())
}
