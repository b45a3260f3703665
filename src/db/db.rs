use crate::db::database::Database;
use crate::db::journal::{Journal, JournalSize, JOURNAL_FILE_NAME};
use crate::libs::atomic_file::AtomicWriteRegistry;
use crate::libs::config::{Rules, RulesProvider, CONFIG_FILE_NAME};
use crate::libs::data_storage::DataStorage;
use crate::libs::error::AppResult;
use std::path::Path;

/// Everything a command needs: settings, the interval store and the undo
/// journal, all staging writes in one registry.
#[derive(Debug)]
pub struct Db {
    pub registry: AtomicWriteRegistry,
    pub rules: Rules,
    pub database: Database,
    pub journal: Journal,
}

impl Db {
    /// Opens the store under the default storage root.
    pub fn new() -> AppResult<Db> {
        Self::open(DataStorage::new())
    }

    /// Opens the store under `root`, creating the directories it needs.
    pub fn open_at(root: impl AsRef<Path>) -> AppResult<Db> {
        Self::open(DataStorage::at(root.as_ref()))
    }

    fn open(storage: DataStorage) -> AppResult<Db> {
        let registry = AtomicWriteRegistry::new();
        let rules = Rules::load(&registry, storage.get_path(CONFIG_FILE_NAME)?)?;
        let data_dir = storage.data_dir()?;

        let database = Database::initialize(&registry, &data_dir)?;
        let size = JournalSize::from_rule(rules.get_integer("journal.size", -1));
        let journal = Journal::new(&registry, data_dir.join(JOURNAL_FILE_NAME), size)?;

        Ok(Db {
            registry,
            rules,
            database,
            journal,
        })
    }

    pub fn verbose(&self) -> bool {
        self.rules.get_boolean("verbose", true)
    }

    pub fn confirmation(&self) -> bool {
        self.rules.get_boolean("confirmation", false)
    }
}
