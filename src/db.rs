use diesel::{PgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rocket::{fairing, Build, Rocket};
use rocket_sync_db_pools::database;

#[database("items")]
pub(crate) struct DbConn(PgConnection);

pub(crate) const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub(crate) async fn run_db_migrations(rocket: Rocket<Build>) -> fairing::Result {
    let Some(conn) = DbConn::get_one(&rocket).await else {
        tracing::error!("no database connection available for migrations");
        return Err(rocket);
    };

    let applied = conn
        .run(|c| {
            c.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|err| err.to_string())
        })
        .await;

    match applied {
        Ok(count) => {
            tracing::info!(applied = count, "database migrations up to date");
            Ok(rocket)
        }
        Err(err) => {
            tracing::error!(error = %err, "couldn't run database migrations");
            Err(rocket)
        }
    }
}

/// Liveness probe against the backend.
pub(crate) async fn ping(conn: &DbConn) -> Result<(), String> {
    conn.run(|c| diesel::sql_query("SELECT 1").execute(c))
        .await
        .map(|_| ())
        .map_err(|err| err.to_string())
}
