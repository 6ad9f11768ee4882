use diesel::prelude::*;
use rocket::serde::json::Json;

use crate::api::item_management::get_item::ItemOut;
use crate::api::item_management::models::{search_pattern, Item};
use crate::db::DbConn;
use crate::error::{ErrorResponse, ItemError};
use crate::schema::items;

/// Newest first. `search` matches name or description, case-insensitively.
#[get("/items?<search>")]
pub(crate) async fn get_items(
    search: Option<String>,
    conn: DbConn,
) -> Result<Json<Vec<ItemOut>>, ErrorResponse> {
    let pattern = search.filter(|term| !term.is_empty()).map(|term| search_pattern(&term));

    let item_list = conn
        .run(move |c| {
            let mut query = items::table
                .select(Item::as_select())
                .order(items::id.desc())
                .into_boxed();

            if let Some(pattern) = pattern {
                // NULL descriptions simply never match.
                query = query
                    .filter(items::name.ilike(pattern.clone()))
                    .or_filter(items::description.ilike(pattern).assume_not_null());
            }

            query.load::<Item>(c)
        })
        .await
        .map_err(ItemError::from)?;

    tracing::debug!(count = item_list.len(), "listed items");

    Ok(Json(item_list.into_iter().map(ItemOut::from).collect()))
}
