mod api;
mod db;
mod error;
mod schema;
mod settings;
#[cfg(test)]
mod tests;

#[macro_use]
extern crate rocket;

use db::DbConn;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};
use settings::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) fn build_rocket(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(AdHoc::try_on_ignite(
            "Database Migrations",
            db::run_db_migrations,
        ))
        .mount(
            "/",
            routes![
                crate::api::health::health,
                crate::api::item_management::list::get_items,
                crate::api::item_management::create::create_item,
                crate::api::item_management::get_item::get_item,
                crate::api::item_management::edit::edit_item,
                crate::api::item_management::delete::delete_item,
            ],
        )
        .register("/", catchers![crate::error::default_catcher])
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new()?;
    tracing::info!(
        port = settings.port,
        secret_key_set = settings.secret_key.is_some(),
        "starting item service"
    );

    if let Err(err) = build_rocket(settings.figment()).launch().await {
        anyhow::bail!("rocket failed to launch: {}", err);
    }

    Ok(())
}
