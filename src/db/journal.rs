//! Undo journal: transactions of before/after snapshots.
//!
//! Every mutation performed while a transaction is open is recorded as an
//! [`UndoAction`] holding the serialized state before and after the change.
//! An empty `before` marks a creation and an empty `after` a deletion.
//! Closing the transaction appends it to `undo.data`:
//!
//! ```text
//! txn:
//!   type: interval
//!   before: {"start":"20200601T010000Z","end":"20200601T020000Z"}
//!   after: {"start":"20200601T010000Z","end":"20200601T030000Z"}
//! ```
//!
//! [`Journal::pop_last_transaction`] removes the newest block and hands it
//! back for replay. The removal is staged like any other write and is only
//! persisted once the replay has been committed.

use crate::libs::atomic_file::{AtomicFile, AtomicWriteRegistry};
use crate::libs::error::{AppError, AppResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// File name of the journal inside the data directory.
pub const JOURNAL_FILE_NAME: &str = "undo.data";

const TXN_MARKER: &str = "txn:";
const TYPE_PREFIX: &str = "  type:";
const BEFORE_PREFIX: &str = "  before:";
const AFTER_PREFIX: &str = "  after:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Interval,
    Config,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Interval => write!(f, "interval"),
            ActionKind::Config => write!(f, "config"),
        }
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "interval" => Ok(ActionKind::Interval),
            "config" => Ok(ActionKind::Config),
            other => Err(AppError::Journal(format!("Unknown undo action type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoAction {
    kind: ActionKind,
    before: String,
    after: String,
}

impl UndoAction {
    pub fn new(kind: ActionKind, before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            kind,
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn before(&self) -> &str {
        &self.before
    }

    pub fn after(&self) -> &str {
        &self.after
    }
}

impl fmt::Display for UndoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", TYPE_PREFIX, self.kind)?;
        writeln!(f, "{} {}", BEFORE_PREFIX, self.before)?;
        writeln!(f, "{} {}", AFTER_PREFIX, self.after)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    actions: Vec<UndoAction>,
}

impl Transaction {
    pub fn add_undo_action(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[UndoAction] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<UndoAction> {
        self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TXN_MARKER)?;
        for action in &self.actions {
            write!(f, "{}", action)?;
        }
        Ok(())
    }
}

/// How many transactions the journal keeps, from the `journal.size` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSize {
    Unlimited,
    Disabled,
    Limited(usize),
}

impl JournalSize {
    pub fn from_rule(value: i64) -> Self {
        match value {
            v if v < 0 => JournalSize::Unlimited,
            0 => JournalSize::Disabled,
            v => JournalSize::Limited(v as usize),
        }
    }
}

#[derive(Debug)]
pub struct Journal {
    location: PathBuf,
    size: JournalSize,
    registry: AtomicWriteRegistry,
    current: Option<Transaction>,
}

impl Journal {
    /// Opens the journal at `location`. A disabled journal deletes any
    /// existing file.
    pub fn new(registry: &AtomicWriteRegistry, location: impl AsRef<Path>, size: JournalSize) -> AppResult<Self> {
        let journal = Self {
            location: location.as_ref().to_path_buf(),
            size,
            registry: registry.clone(),
            current: None,
        };

        if !journal.is_enabled() {
            let undo = journal.file();
            if undo.exists() && undo.size()? > 0 {
                undo.remove()?;
                journal.registry.finalize_all()?;
            }
        }

        Ok(journal)
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_enabled(&self) -> bool {
        self.size != JournalSize::Disabled
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn start_transaction(&mut self) -> AppResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if self.current.is_some() {
            return Err(AppError::Journal("Subsequent call to start transaction".to_string()));
        }
        debug!("Starting transaction");
        self.current = Some(Transaction::default());
        Ok(())
    }

    /// Appends the open transaction to the journal file.
    pub fn end_transaction(&mut self) -> AppResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let transaction = self
            .current
            .take()
            .ok_or_else(|| AppError::Journal("Call to end non-existent transaction".to_string()))?;

        if transaction.is_empty() {
            debug!("Dropping empty transaction");
            return Ok(());
        }

        let undo = self.file();
        match self.size {
            JournalSize::Limited(1) => undo.truncate()?,
            JournalSize::Limited(size) => {
                let transactions = self.load()?;
                let keep = size - 1;
                let skip = transactions.len().saturating_sub(keep);
                undo.truncate()?;
                for kept in &transactions[skip..] {
                    undo.append(&kept.to_string())?;
                }
            }
            JournalSize::Unlimited | JournalSize::Disabled => {}
        }

        AtomicFile::append_to(&self.registry, &self.location, &transaction.to_string())?;
        debug!("Recorded transaction with {} actions", transaction.actions().len());
        self.registry.finalize_all()
    }

    /// Drops the open transaction without recording it.
    pub fn abort_transaction(&mut self) {
        if self.current.take().is_some() {
            debug!("Aborted transaction");
        }
    }

    /// Runs `operation` inside a transaction, recording it only on success.
    pub fn transaction<T, E>(&mut self, operation: impl FnOnce(&mut Journal) -> Result<T, E>) -> Result<T, E>
    where
        E: From<AppError>,
    {
        self.start_transaction()?;
        match operation(self) {
            Ok(value) => {
                self.end_transaction()?;
                Ok(value)
            }
            Err(e) => {
                self.abort_transaction();
                Err(e)
            }
        }
    }

    pub fn record_interval_action(&mut self, before: &str, after: &str) {
        self.record_undo_action(ActionKind::Interval, before, after);
    }

    pub fn record_config_action(&mut self, before: &str, after: &str) {
        self.record_undo_action(ActionKind::Config, before, after);
    }

    /// Actions are only recorded while a transaction is open.
    fn record_undo_action(&mut self, kind: ActionKind, before: &str, after: &str) {
        if let Some(transaction) = self.current.as_mut() {
            transaction.add_undo_action(UndoAction::new(kind, before, after));
        }
    }

    /// Removes and returns the most recent transaction, if any.
    ///
    /// The shortened journal is only staged. It reaches the disk with the
    /// next [`AtomicWriteRegistry::finalize_all`], so a caller that fails to
    /// replay the transaction can [`AtomicWriteRegistry::reset`] and keep it.
    pub fn pop_last_transaction(&mut self) -> AppResult<Option<Transaction>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut transactions = self.load()?;
        let Some(last) = transactions.pop() else {
            return Ok(None);
        };

        let undo = self.file();
        if transactions.is_empty() {
            undo.remove()?;
        } else {
            undo.truncate()?;
            for transaction in &transactions {
                undo.append(&transaction.to_string())?;
            }
        }

        debug!("Popped transaction with {} actions", last.actions().len());
        Ok(Some(last))
    }

    /// Every transaction currently stored, oldest first.
    pub fn load(&self) -> AppResult<Vec<Transaction>> {
        parse_transactions(&self.file().read_lines()?)
    }

    fn file(&self) -> AtomicFile {
        AtomicFile::new(&self.registry, &self.location)
    }
}

fn field<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Reads the `txn:` blocks back. Every block must hold at least one complete
/// `type`/`before`/`after` triple; a cut-off block is an error rather than
/// being skipped.
fn parse_transactions(lines: &[String]) -> AppResult<Vec<Transaction>> {
    let mut transactions: Vec<Transaction> = Vec::new();
    let mut kind: Option<ActionKind> = None;
    let mut before: Option<String> = None;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(TXN_MARKER) {
            check_block_complete(transactions.last(), &kind, &before, line)?;
            transactions.push(Transaction::default());
        } else if let Some(value) = field(line, TYPE_PREFIX) {
            if transactions.is_empty() {
                return Err(AppError::parse(line.as_str(), "undo action outside of a transaction"));
            }
            if kind.is_some() {
                return Err(AppError::parse(line.as_str(), "previous undo action is incomplete"));
            }
            kind = Some(value.parse()?);
        } else if let Some(value) = field(line, BEFORE_PREFIX) {
            if kind.is_none() || before.is_some() {
                return Err(AppError::parse(line.as_str(), "before state out of order"));
            }
            before = Some(value.to_string());
        } else if let Some(value) = field(line, AFTER_PREFIX) {
            let transaction = transactions
                .last_mut()
                .ok_or_else(|| AppError::parse(line.as_str(), "undo action outside of a transaction"))?;
            let action_kind = kind.take().ok_or_else(|| AppError::parse(line.as_str(), "missing action type"))?;
            let action_before = before.take().ok_or_else(|| AppError::parse(line.as_str(), "missing before state"))?;
            transaction.add_undo_action(UndoAction::new(action_kind, action_before, value));
        } else {
            return Err(AppError::parse(line.as_str(), "cannot handle journal line"));
        }
    }

    check_block_complete(transactions.last(), &kind, &before, "<end of journal>")?;
    Ok(transactions)
}

fn check_block_complete(last: Option<&Transaction>, kind: &Option<ActionKind>, before: &Option<String>, at: &str) -> AppResult<()> {
    if kind.is_some() || before.is_some() {
        return Err(AppError::parse(at, "undo action is missing its after state"));
    }
    if last.is_some_and(Transaction::is_empty) {
        return Err(AppError::parse(at, "transaction without undo actions"));
    }
    Ok(())
}
