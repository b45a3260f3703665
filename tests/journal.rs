#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tempo::db::database::Database;
    use tempo::db::journal::{ActionKind, Journal, JournalSize, JOURNAL_FILE_NAME};
    use tempo::libs::atomic_file::AtomicWriteRegistry;
    use tempo::libs::datetime::parse_input;
    use tempo::libs::error::{AppError, AppResult};
    use tempo::libs::interval::Interval;
    use tempo::libs::range::Range;
    use test_context::{test_context, TestContext};

    struct JournalTestContext {
        temp_dir: TempDir,
        registry: AtomicWriteRegistry,
    }

    impl TestContext for JournalTestContext {
        fn setup() -> Self {
            JournalTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
                registry: AtomicWriteRegistry::new(),
            }
        }
    }

    impl JournalTestContext {
        fn path(&self) -> PathBuf {
            self.temp_dir.path().join(JOURNAL_FILE_NAME)
        }

        fn journal(&self, size: JournalSize) -> Journal {
            Journal::new(&self.registry, self.path(), size).unwrap()
        }

        fn record(&self, journal: &mut Journal, before: &str, after: &str) {
            journal
                .transaction(|journal| -> AppResult<()> {
                    journal.record_config_action(before, after);
                    Ok(())
                })
                .unwrap();
        }
    }

    fn interval(start: &str, end: &str) -> Interval {
        Interval::new(Range::new(parse_input(start).unwrap(), parse_input(end).unwrap()))
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_add_then_modify_in_one_transaction(ctx: &mut JournalTestContext) {
        let mut database = Database::initialize(&ctx.registry, ctx.temp_dir.path()).unwrap();
        let mut journal = ctx.journal(JournalSize::Unlimited);

        let a = interval("2020-06-01T09:00", "2020-06-01T10:00");
        let b = interval("2020-06-01T09:00", "2020-06-01T11:00");

        journal
            .transaction(|journal| -> AppResult<()> {
                database.add_interval(&a, journal, false)?;
                database.modify_interval(&a, &b, journal, false)?;
                database.commit()
            })
            .unwrap();

        let content = fs::read_to_string(ctx.path()).unwrap();
        assert_eq!(content.matches("txn:").count(), 1);
        assert_eq!(content.matches("  type: interval").count(), 2);

        let transaction = journal.pop_last_transaction().unwrap().unwrap();
        let actions = transaction.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].before(), "");
        assert_eq!(actions[0].after(), a.json());
        assert_eq!(actions[1].before(), a.json());
        assert_eq!(actions[1].after(), b.json());
        assert!(actions.iter().all(|action| action.kind() == ActionKind::Interval));

        assert!(ctx.path().exists());
        ctx.registry.finalize_all().unwrap();
        assert!(!ctx.path().exists());
        assert!(journal.pop_last_transaction().unwrap().is_none());
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_pop_keeps_older_transactions(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Unlimited);
        ctx.record(&mut journal, "verbose=on", "verbose=off");
        ctx.record(&mut journal, "confirmation=off", "confirmation=on");

        let last = journal.pop_last_transaction().unwrap().unwrap();
        assert_eq!(last.actions()[0].after(), "confirmation=on");
        ctx.registry.finalize_all().unwrap();

        assert_eq!(
            fs::read_to_string(ctx.path()).unwrap(),
            "txn:\n  type: config\n  before: verbose=on\n  after: verbose=off\n"
        );
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_pop_is_discarded_by_reset(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Unlimited);
        ctx.record(&mut journal, "verbose=on", "verbose=off");
        ctx.record(&mut journal, "confirmation=off", "confirmation=on");
        let before = fs::read_to_string(ctx.path()).unwrap();

        assert!(journal.pop_last_transaction().unwrap().is_some());
        assert_eq!(journal.load().unwrap().len(), 1);
        assert_eq!(fs::read_to_string(ctx.path()).unwrap(), before);

        ctx.registry.reset();
        assert_eq!(journal.load().unwrap().len(), 2);
        assert_eq!(fs::read_to_string(ctx.path()).unwrap(), before);
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_nested_transaction_is_an_error(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Unlimited);
        journal.start_transaction().unwrap();
        assert!(matches!(journal.start_transaction(), Err(AppError::Journal(_))));
        journal.abort_transaction();
        assert!(matches!(journal.end_transaction(), Err(AppError::Journal(_))));
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_empty_transaction_is_not_written(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Unlimited);
        journal.transaction(|_| -> AppResult<()> { Ok(()) }).unwrap();
        assert!(!ctx.path().exists());
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_failed_operation_is_not_recorded(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Unlimited);
        let result = journal.transaction(|journal| -> AppResult<()> {
            journal.record_config_action("verbose=on", "verbose=off");
            Err(AppError::validation("boom"))
        });

        assert!(result.is_err());
        assert!(!journal.is_open());
        assert!(journal.load().unwrap().is_empty());
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_actions_outside_transaction_are_dropped(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Unlimited);
        journal.record_interval_action("", "{}");
        journal.transaction(|_| -> AppResult<()> { Ok(()) }).unwrap();
        assert!(journal.load().unwrap().is_empty());
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_size_limit_keeps_newest(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Limited(2));
        for n in 1..=4 {
            ctx.record(&mut journal, &format!("a={}", n - 1), &format!("a={}", n));
        }

        let kept: Vec<String> = journal
            .load()
            .unwrap()
            .iter()
            .map(|transaction| transaction.actions()[0].after().to_string())
            .collect();
        assert_eq!(kept, vec!["a=3", "a=4"]);
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_size_of_one_keeps_only_last(ctx: &mut JournalTestContext) {
        let mut journal = ctx.journal(JournalSize::Limited(1));
        ctx.record(&mut journal, "a=0", "a=1");
        ctx.record(&mut journal, "a=1", "a=2");

        let transactions = journal.load().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].actions()[0].after(), "a=2");
    }

    #[test_context(JournalTestContext)]
    #[test]
    fn test_disabled_journal_removes_file_and_records_nothing(ctx: &mut JournalTestContext) {
        fs::write(ctx.path(), "txn:\n  type: config\n  before: a=0\n  after: a=1\n").unwrap();

        let mut journal = ctx.journal(JournalSize::Disabled);
        assert!(!ctx.path().exists());
        assert!(!journal.is_enabled());

        ctx.record(&mut journal, "a=1", "a=2");
        assert!(!ctx.path().exists());
        assert!(journal.pop_last_transaction().unwrap().is_none());
    }
}
