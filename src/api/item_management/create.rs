use diesel::prelude::*;
use rocket::response::status::Created;
use rocket::serde::json::{self, Json};
use serde_json::Value;

use crate::api::item_management::get_item::ItemOut;
use crate::api::item_management::models::{Item, ItemPayload, NewItem};
use crate::db::DbConn;
use crate::error::{ErrorResponse, ItemError};
use crate::schema::items;

/// Bodies that aren't JSON objects count as empty, so the name check reports them.
pub(crate) fn read_payload(body: Result<Json<Value>, json::Error<'_>>) -> ItemPayload {
    match body {
        Ok(Json(value)) => ItemPayload::from_json(value),
        Err(err) => {
            tracing::debug!(error = ?err, "unreadable item payload, treating as empty");
            ItemPayload::default()
        }
    }
}

#[post("/items", data = "<payload>")]
pub(crate) async fn create_item(
    payload: Result<Json<Value>, json::Error<'_>>,
    conn: DbConn,
) -> Result<Created<Json<ItemOut>>, ErrorResponse> {
    let new_item = NewItem::try_from(read_payload(payload))?;

    let item = conn
        .run(move |c| {
            diesel::insert_into(items::table)
                .values(&new_item)
                .returning(Item::as_returning())
                .get_result(c)
        })
        .await
        .map_err(ItemError::from)?;

    tracing::info!(item_id = item.id, "created item");

    Ok(Created::new(format!("/items/{}", item.id)).body(Json(item.into())))
}
