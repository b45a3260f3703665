use crate::db::db::Db;
use crate::libs::config::RulesProvider;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Setting name; all settings are listed when omitted
    pub name: Option<String>,
    /// New value
    pub value: Option<String>,
    /// Remove the setting
    #[arg(long, conflicts_with = "value")]
    pub unset: bool,
}

pub fn cmd(args: ConfigArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args)
}

pub fn run(db: &mut Db, args: ConfigArgs) -> Result<()> {
    let Some(name) = args.name else {
        let names = db.rules.all("");
        View::settings(names.iter().map(|name| (name.as_str(), db.rules.get(name).unwrap_or_default())));
        return Ok(());
    };

    if !args.unset && args.value.is_none() {
        match db.rules.get(&name) {
            Some(value) => msg_print!(Message::ConfigValue {
                name: name.clone(),
                value: value.to_string(),
            }),
            None => msg_info!(Message::ConfigNotSet(name.clone())),
        }
        return Ok(());
    }

    let Db {
        ref mut rules,
        ref mut journal,
        ref registry,
        ..
    } = *db;

    let changed = journal.transaction(|journal| -> Result<bool> {
        let changed = match &args.value {
            Some(value) if !args.unset => rules.set(&name, value, journal)?,
            _ => rules.unset(&name, journal)?,
        };
        if changed {
            rules.save()?;
        }
        Ok(changed)
    })?;
    registry.finalize_all()?;

    match (&args.value, changed) {
        (_, false) if args.unset => msg_info!(Message::ConfigNotSet(name)),
        (_, false) => msg_info!(Message::ConfigUnchanged(name)),
        (Some(value), true) => msg_success!(Message::ConfigSet {
            name,
            value: value.clone(),
        }),
        (None, true) => msg_success!(Message::ConfigUnset(name)),
    }
    Ok(())
}
