//! Console progress for a conversion run.
//!
//! The conversion loop only talks to [`ProgressReporter`]; whether that ends
//! up as indicatif bars or plain stderr lines is decided once at startup.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Instant,
};

use crate::provider::Usage;

/// Status of a single post being converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStatus {
    /// Downloading and rewriting images
    ProcessingImages { total: usize },
    /// Waiting for the provider
    Transforming,
    /// Writing the artifact
    Saving,
    /// Artifact written
    Saved,
    /// Artifact already present
    Skipped,
    /// Failed with error
    Failed(String),
}

/// Phase of the overall run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    /// Reading the export
    ReadingExport,
    /// Handing instructions to the provider
    Priming,
    /// Converting posts one by one
    ConvertingPosts,
    /// Renaming downloaded images
    RenamingImages,
    /// Completed successfully
    Completed,
    /// Stopped early by the provider
    Halted(String),
    /// Failed with error
    Failed(String),
}

/// Sink for run and per-post progress.
pub trait ProgressReporter: Send + Sync {
    /// Set the overall run phase.
    fn set_phase(&self, phase: RunPhase);

    /// Register posts to track (call before processing starts).
    fn register_posts(&self, slugs: Vec<String>);

    /// Update the status of a specific post.
    fn update_post(&self, slug: &str, status: PostStatus);

    /// Record the running usage total.
    fn set_usage(&self, usage: Usage);

    /// Tear down the display and print the summary.
    fn finish(&self);
}

/// Discards everything. Used by tests.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn set_phase(&self, _phase: RunPhase) {}
    fn register_posts(&self, _slugs: Vec<String>) {}
    fn update_post(&self, _slug: &str, _status: PostStatus) {}
    fn set_usage(&self, _usage: Usage) {}
    fn finish(&self) {}
}

/// Statistics collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub attempted: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub usage: Usage,
}

impl Stats {
    fn record(&mut self, status: &PostStatus) {
        match status {
            PostStatus::Saved => self.saved += 1,
            PostStatus::Skipped => self.skipped += 1,
            PostStatus::Failed(_) => self.failed += 1,
            _ => {}
        }
    }
}

fn print_summary(stats: &Stats, started: Instant) {
    let duration = started.elapsed();

    eprintln!();
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("📊 Summary");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("   📄 Posts:      {} attempted", stats.attempted);
    eprintln!("   ✅ Saved:      {}", stats.saved);
    if stats.skipped > 0 {
        eprintln!("   ⏭️  Skipped:    {}", stats.skipped);
    }
    if stats.failed > 0 {
        eprintln!("   ❌ Failed:     {}", stats.failed);
    }
    eprintln!(
        "   🔤 Tokens:     {} in / {} out",
        stats.usage.input_tokens, stats.usage.output_tokens
    );
    eprintln!("   ⏱️  Duration:   {:.2}s", duration.as_secs_f64());
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

fn phase_message(phase: &RunPhase) -> String {
    match phase {
        RunPhase::ReadingExport => "📋 Reading export...".to_owned(),
        RunPhase::Priming => "🧠 Sending instructions...".to_owned(),
        RunPhase::ConvertingPosts => "📄 Converting posts...".to_owned(),
        RunPhase::RenamingImages => "🏷️  Renaming images...".to_owned(),
        RunPhase::Completed => "✅ Completed!".to_owned(),
        RunPhase::Halted(reason) => format!("⛔ Halted: {reason}"),
        RunPhase::Failed(e) => format!("❌ Failed: {e}"),
    }
}

/// Line-oriented reporter for logs and pipes.
pub struct SimpleReporter {
    stats: RwLock<Stats>,
    started: Instant,
}

impl SimpleReporter {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(Stats::default()),
            started: Instant::now(),
        }
    }
}

impl Default for SimpleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for SimpleReporter {
    fn set_phase(&self, phase: RunPhase) {
        eprintln!("{}", phase_message(&phase));
    }

    fn register_posts(&self, slugs: Vec<String>) {
        if let Ok(mut stats) = self.stats.write() {
            stats.attempted = slugs.len();
        }
        eprintln!("   Found {} posts to convert", slugs.len());
    }

    fn update_post(&self, slug: &str, status: PostStatus) {
        if let Ok(mut stats) = self.stats.write() {
            stats.record(&status);
        }
        match status {
            PostStatus::Saved => eprintln!("   ✓ {slug}"),
            PostStatus::Skipped => eprintln!("   ↷ {slug} (already converted)"),
            PostStatus::Failed(ref e) => eprintln!("   ✗ {slug}: {e}"),
            _ => {}
        }
    }

    fn set_usage(&self, usage: Usage) {
        if let Ok(mut stats) = self.stats.write() {
            stats.usage = usage;
        }
    }

    fn finish(&self) {
        if let Ok(stats) = self.stats.read() {
            print_summary(&stats, self.started);
        }
    }
}

/// Interactive reporter with one spinner per post in flight.
pub struct FancyReporter {
    multi: indicatif::MultiProgress,
    phase_bar: indicatif::ProgressBar,
    posts: RwLock<HashMap<String, Option<indicatif::ProgressBar>>>,
    main_progress: RwLock<Option<indicatif::ProgressBar>>,
    stats: RwLock<Stats>,
    started: Instant,
}

impl FancyReporter {
    pub fn new() -> Self {
        let multi = indicatif::MultiProgress::new();
        let phase_bar = multi.add(indicatif::ProgressBar::new_spinner());
        if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            phase_bar.set_style(style);
        }
        phase_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            phase_bar,
            posts: RwLock::new(HashMap::new()),
            main_progress: RwLock::new(None),
            stats: RwLock::new(Stats::default()),
            started: Instant::now(),
        }
    }

    fn status_emoji(status: &PostStatus) -> &'static str {
        match status {
            PostStatus::ProcessingImages { .. } => "🖼️ ",
            PostStatus::Transforming => "🧠",
            PostStatus::Saving => "💾",
            PostStatus::Saved => "✅",
            PostStatus::Skipped => "↷",
            PostStatus::Failed(_) => "❌",
        }
    }

    fn status_detail(status: &PostStatus) -> String {
        match status {
            PostStatus::ProcessingImages { total } => format!("images ({total})"),
            PostStatus::Transforming => "transforming".to_string(),
            PostStatus::Saving => "saving".to_string(),
            PostStatus::Saved => "saved".to_string(),
            PostStatus::Skipped => "skipped".to_string(),
            PostStatus::Failed(e) => e.clone(),
        }
    }
}

impl Default for FancyReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for FancyReporter {
    fn set_phase(&self, phase: RunPhase) {
        let msg = phase_message(&phase);
        match phase {
            RunPhase::Completed | RunPhase::Halted(_) | RunPhase::Failed(_) => {
                self.phase_bar.finish_with_message(msg)
            }
            _ => self.phase_bar.set_message(msg),
        }
    }

    fn register_posts(&self, slugs: Vec<String>) {
        let total = slugs.len();
        if let Ok(mut stats) = self.stats.write() {
            stats.attempted = total;
        }

        let main_pb = self.multi.add(indicatif::ProgressBar::new(total as u64));
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("   {bar:40.cyan/blue} {pos}/{len} posts {msg}")
        {
            main_pb.set_style(style.progress_chars("█▓▒░  "));
        }
        if let Ok(mut main_progress) = self.main_progress.write() {
            *main_progress = Some(main_pb);
        }

        // Bars are created on demand once a post starts processing.
        if let Ok(mut posts) = self.posts.write() {
            posts.extend(slugs.into_iter().map(|slug| (slug, None)));
        }
    }

    fn update_post(&self, slug: &str, status: PostStatus) {
        let Ok(mut posts) = self.posts.write() else {
            return;
        };

        if matches!(
            status,
            PostStatus::Saved | PostStatus::Skipped | PostStatus::Failed(_)
        ) {
            if let Some(Some(pb)) = posts.remove(slug) {
                pb.finish_and_clear();
            }
            if let Ok(main_progress) = self.main_progress.read()
                && let Some(main_pb) = main_progress.as_ref()
            {
                main_pb.inc(1);
            }
            if let PostStatus::Failed(ref e) = status {
                self.multi.println(format!("❌ {slug}: {e}")).ok();
            }
            if let Ok(mut stats) = self.stats.write() {
                stats.record(&status);
            }
            return;
        }

        if let Some(slot) = posts.get_mut(slug) {
            let message = format!(
                "{} {slug}: {}",
                Self::status_emoji(&status),
                Self::status_detail(&status)
            );
            match slot {
                Some(pb) => pb.set_message(message),
                None => {
                    let pb = self.multi.add(indicatif::ProgressBar::new_spinner());
                    if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("   {msg}") {
                        pb.set_style(style);
                    }
                    pb.set_message(message);
                    pb.enable_steady_tick(std::time::Duration::from_millis(100));
                    *slot = Some(pb);
                }
            }
        }
    }

    fn set_usage(&self, usage: Usage) {
        if let Ok(mut stats) = self.stats.write() {
            stats.usage = usage;
        }
        if let Ok(main_progress) = self.main_progress.read()
            && let Some(main_pb) = main_progress.as_ref()
        {
            main_pb.set_message(format!(
                "{} in / {} out tokens",
                usage.input_tokens, usage.output_tokens
            ));
        }
    }

    fn finish(&self) {
        if let Ok(posts) = self.posts.read() {
            for pb in posts.values().flatten() {
                pb.finish_and_clear();
            }
        }
        if let Ok(main_progress) = self.main_progress.read()
            && let Some(main_pb) = main_progress.as_ref()
        {
            main_pb.finish_and_clear();
        }
        self.phase_bar.finish_and_clear();

        if let Ok(stats) = self.stats.read() {
            print_summary(&stats, self.started);
        }
    }
}

/// Bars on a terminal, plain lines otherwise.
pub fn create_reporter() -> Arc<dyn ProgressReporter> {
    if console::Term::stderr().is_term() {
        Arc::new(FancyReporter::new())
    } else {
        Arc::new(SimpleReporter::new())
    }
}
