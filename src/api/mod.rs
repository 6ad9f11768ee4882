pub(crate) mod health;
pub(crate) mod item_management;
