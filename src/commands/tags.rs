use crate::db::db::Db;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_info;
use anyhow::Result;

pub fn cmd() -> Result<()> {
    let db = Db::new()?;
    run(&db)
}

pub fn run(db: &Db) -> Result<()> {
    let tag_info = db.database.tag_info();
    if tag_info.tags().is_empty() {
        msg_info!(Message::NoTags);
        return Ok(());
    }

    View::tags(tag_info);
    Ok(())
}
