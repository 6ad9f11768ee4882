use diesel::prelude::*;
use rocket::serde::json::Json;
use serde::Serialize;

use crate::api::item_management::models::parse_item_id;
use crate::db::DbConn;
use crate::error::{ErrorResponse, ItemError};
use crate::schema::items;

#[derive(Serialize, Debug)]
pub struct DeletedOut {
    pub deleted: bool,
    pub id: i32,
}

#[delete("/items/<item_id>")]
pub(crate) async fn delete_item(
    item_id: &str,
    conn: DbConn,
) -> Result<Json<DeletedOut>, ErrorResponse> {
    let item_id = parse_item_id(item_id)?;
    let removed = conn
        .run(move |c| diesel::delete(items::table.find(item_id)).execute(c))
        .await
        .map_err(ItemError::from)?;

    if removed == 0 {
        return Err(ItemError::NotFound.into());
    }

    tracing::info!(item_id, "deleted item");

    Ok(Json(DeletedOut {
        deleted: true,
        id: item_id,
    }))
}
