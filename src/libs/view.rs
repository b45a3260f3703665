use super::datetime::Datetime;
use super::formatter::{format_duration, format_optional, format_tags};
use super::interval::Interval;
use crate::db::tag_info::TagInfoDatabase;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn intervals(intervals: &[Interval], now: Datetime) {
        let mut table = Table::new();

        table.add_row(row!["ID", "START", "END", "TIME", "TAGS", "ANNOTATION"]);
        for interval in intervals {
            table.add_row(row![
                format!("@{}", interval.id),
                format_optional(interval.start()),
                format_optional(interval.end()),
                format_duration(&interval.range.total(now)),
                format_tags(interval.tags()),
                interval.annotation
            ]);
        }
        table.printstd();
    }

    pub fn tags(tag_info: &TagInfoDatabase) {
        let mut table = Table::new();

        table.add_row(row!["TAG", "COUNT"]);
        for (tag, info) in tag_info.iter() {
            table.add_row(row![tag, info.count]);
        }
        table.printstd();
    }

    pub fn settings<'a>(settings: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let mut table = Table::new();

        table.add_row(row!["NAME", "VALUE"]);
        for (name, value) in settings {
            table.add_row(row![name, value]);
        }
        table.printstd();
    }
}
