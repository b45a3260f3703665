use crate::db::db::Db;
use crate::db::journal::{ActionKind, Transaction};
use crate::libs::config::split_setting;
use crate::libs::interval::Interval;
use crate::libs::messages::Message;
use crate::{msg_info, msg_success, msg_warning};
use anyhow::Result;
use tracing::debug;

pub fn cmd() -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db)
}

/// Reverts the most recent transaction, last action first.
///
/// The shortened journal, the reverted data files and the restored settings
/// are finalized together. When any action cannot be reverted nothing is
/// written and the transaction stays in the journal.
pub fn run(db: &mut Db) -> Result<()> {
    if !db.journal.is_enabled() {
        msg_warning!(Message::UndoDisabled);
        return Ok(());
    }

    let Some(transaction) = db.journal.pop_last_transaction()? else {
        msg_info!(Message::NothingToUndo);
        return Ok(());
    };

    let reverted = match revert(db, transaction) {
        Ok(reverted) => reverted,
        Err(e) => {
            db.registry.reset();
            return Err(e);
        }
    };

    if db.verbose() {
        msg_success!(Message::UndoApplied(reverted));
    }
    Ok(())
}

fn revert(db: &mut Db, transaction: Transaction) -> Result<usize> {
    let actions = transaction.into_actions();
    let mut config_changed = false;
    for action in actions.iter().rev() {
        debug!("Reverting {} action", action.kind());
        match action.kind() {
            ActionKind::Interval => {
                let before = Interval::from_json(action.before())?;
                let after = Interval::from_json(action.after())?;
                // No transaction is open, so the reversal itself is not journaled.
                db.database.modify_interval(&after, &before, &mut db.journal, false)?;
            }
            ActionKind::Config => {
                let state = if action.before().is_empty() { action.after() } else { action.before() };
                let (name, _) = split_setting(state)?;
                db.rules.restore(name, action.before())?;
                config_changed = true;
            }
        }
    }

    if config_changed {
        db.rules.save()?;
    }
    db.database.commit()?;
    Ok(actions.len())
}
