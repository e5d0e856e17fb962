//! Report rendering for newly detected commits

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::fmt::Write;

use crate::github::CommitSnapshot;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Repositories with a new commit this round, in the order they were checked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCommits {
    entries: Vec<(String, CommitSnapshot)>,
}

impl NewCommits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its original position
    pub fn insert(&mut self, name: impl Into<String>, snapshot: CommitSnapshot) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = snapshot,
            None => self.entries.push((name, snapshot)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommitSnapshot> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, snapshot)| snapshot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommitSnapshot)> {
        self.entries.iter().map(|(name, snapshot)| (name.as_str(), snapshot))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything besides the commits that goes into a report
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub app_name: String,
    pub generated_at: DateTime<FixedOffset>,
    pub next_check: Option<DateTime<FixedOffset>>,
    pub show_changed_files: bool,
    pub max_files: usize,
}

/// Shift a UTC instant into the configured display offset.
///
/// Offsets outside ±23h fall back to UTC; config validation rejects them
/// before the monitor starts.
pub fn display_time(now: DateTime<Utc>, offset_hours: i32) -> DateTime<FixedOffset> {
    let offset = offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset)
}

/// Render the notification text for one round.
///
/// Pure: identical context and commits always produce identical output.
pub fn build_message(context: &ReportContext, commits: &NewCommits) -> String {
    let mut message = String::new();

    let _ = writeln!(message, "🔍 [{} Status Report]", context.app_name);
    let _ = writeln!(
        message,
        "⏰ Current time: {}",
        context.generated_at.format(TIME_FORMAT)
    );
    if let Some(next_check) = context.next_check {
        let _ = writeln!(message, "⏭ Next check: {}", next_check.format(TIME_FORMAT));
    }
    message.push('\n');

    for (name, commit) in commits.iter() {
        let _ = writeln!(message, "📦 Repository: {}", name);
        let _ = writeln!(message, "🔖 Commit: {}", commit.short_sha());
        let _ = writeln!(message, "👤 Author: {}", commit.author);
        let _ = writeln!(message, "📝 Message: {}", commit.message.trim());
        let _ = writeln!(message, "🔗 Link: {}", commit.url);
        let _ = writeln!(message, "⌚️ Committed at: {}", commit.date);

        if context.show_changed_files {
            if let Some(files) = commit.changed_files.as_deref().filter(|f| !f.is_empty()) {
                write_files(&mut message, files, context.max_files);
            }
        }
        message.push('\n');
    }

    message.trim().to_string()
}

fn write_files(message: &mut String, files: &[String], max_files: usize) {
    let _ = writeln!(message, "📄 Changed files ({}):", files.len());
    for file in files.iter().take(max_files) {
        let _ = writeln!(message, "   - {}", file);
    }
    if files.len() > max_files {
        let _ = writeln!(message, "   … and {} more", files.len() - max_files);
    }
}
