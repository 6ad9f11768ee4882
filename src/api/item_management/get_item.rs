use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rocket::serde::json::Json;
use serde::Serialize;

use crate::api::item_management::models::{parse_item_id, Item};
use crate::db::DbConn;
use crate::error::{ErrorResponse, ItemError};
use crate::schema::items;

#[derive(Serialize, Debug)]
pub struct ItemOut {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemOut {
    fn from(item: Item) -> Self {
        ItemOut {
            id: item.id,
            name: item.name,
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[get("/items/<item_id>")]
pub(crate) async fn get_item(item_id: &str, conn: DbConn) -> Result<Json<ItemOut>, ErrorResponse> {
    let item_id = parse_item_id(item_id)?;
    let item = conn
        .run(move |c| {
            items::table
                .find(item_id)
                .select(Item::as_select())
                .first(c)
                .optional()
        })
        .await
        .map_err(ItemError::from)?
        .ok_or(ItemError::NotFound)?;

    Ok(Json(item.into()))
}
