use rocket::http::Status;
use rocket::serde::json::Json;
use serde::Serialize;

use crate::db::{self, DbConn};

#[derive(Serialize, Debug, PartialEq)]
pub struct HealthOut {
    status: String,
    db: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl HealthOut {
    fn up() -> Self {
        HealthOut {
            status: "ok".to_string(),
            db: "up".to_string(),
            error: None,
        }
    }

    fn down(error: String) -> Self {
        HealthOut {
            status: "degraded".to_string(),
            db: "down".to_string(),
            error: Some(error),
        }
    }
}

/// Never fails: an unreachable backend is reported as 503 with the cause.
#[get("/health")]
pub(crate) async fn health(conn: Option<DbConn>) -> (Status, Json<HealthOut>) {
    let probe = match conn {
        Some(conn) => db::ping(&conn).await,
        None => Err("Couldn't acquire a database connection".to_string()),
    };

    match probe {
        Ok(()) => (Status::Ok, Json(HealthOut::up())),
        Err(err) => {
            tracing::warn!(error = %err, "health probe failed");
            (Status::ServiceUnavailable, Json(HealthOut::down(err)))
        }
    }
}
