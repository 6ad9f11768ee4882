use diesel::dsl::now;
use diesel::prelude::*;
use rocket::serde::json::{self, Json};
use serde_json::Value;

use crate::api::item_management::create::read_payload;
use crate::api::item_management::get_item::ItemOut;
use crate::api::item_management::models::{parse_item_id, Item, ItemChanges};
use crate::db::DbConn;
use crate::error::{ErrorResponse, ItemError};
use crate::schema::items;

#[put("/items/<item_id>", data = "<payload>")]
pub(crate) async fn edit_item(
    item_id: &str,
    payload: Result<Json<Value>, json::Error<'_>>,
    conn: DbConn,
) -> Result<Json<ItemOut>, ErrorResponse> {
    let item_id = parse_item_id(item_id)?;
    // Validated up front but reported after the lookup, so an unknown id is a 404.
    let changes = ItemChanges::try_from(read_payload(payload));

    let item = conn
        .run(move |c| {
            c.transaction::<_, ItemError, _>(|c| {
                items::table
                    .find(item_id)
                    .select(items::id)
                    .first::<i32>(c)
                    .optional()?
                    .ok_or(ItemError::NotFound)?;

                let changes = changes?;

                diesel::update(items::table.find(item_id))
                    .set((&changes, items::updated_at.eq(now)))
                    .returning(Item::as_returning())
                    .get_result(c)
                    .optional()?
                    .ok_or(ItemError::NotFound)
            })
        })
        .await?;

    tracing::info!(item_id = item.id, "updated item");

    Ok(Json(item.into()))
}
