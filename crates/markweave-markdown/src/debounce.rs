//! Debounced parsing for live previews.
//!
//! Nothing here owns a timer thread: callers pass the current [`Instant`] in and call `poll` from
//! whatever loop they already run (UI tick, async interval, test clock).
use markweave_core::ast::MarkdownNode;
use markweave_core::ast::ParseResult;
use markweave_core::ast::ParserOptions;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;

use crate::parser::CmarkParser;
use crate::parser::MarkdownParser;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

type Job<T> = Box<dyn FnOnce() -> T + Send>;

struct Pending<T> {
    handle: ScheduleHandle,
    deadline: Instant,
    job: Job<T>,
}

/// Single-slot cancellable timer: a new schedule replaces whatever was pending.
pub struct Debouncer<T> {
    next_id: u64,
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: None,
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("pending", &self.pending.as_ref().map(|p| p.handle))
            .field("deadline", &self.deadline())
            .finish()
    }
}

impl<T> Debouncer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        job: impl FnOnce() -> T + Send + 'static,
    ) -> ScheduleHandle {
        self.cancel_pending();
        let handle = ScheduleHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some(Pending {
            handle,
            deadline: now + delay,
            job: Box::new(job),
        });
        handle
    }

    /// Cancels `handle` if it is still the pending job. Returns whether anything was canceled.
    pub fn cancel(&mut self, handle: ScheduleHandle) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.handle == handle) {
            self.pending = None;
            return true;
        }
        false
    }

    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Runs the pending job if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref().is_some_and(|p| p.deadline <= now) {
            return self.pending.take().map(|p| (p.job)());
        }
        None
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(handle = pending.handle.0, "debouncer dropped with a pending job");
        }
    }
}

/// Parse result that follows edited content, re-parsing only once edits settle.
///
/// The initial content is parsed synchronously so there is always a result to render.
pub struct DebouncedParsing {
    parser: Arc<dyn MarkdownParser>,
    options: ParserOptions,
    delay: Duration,
    committed: String,
    pending: Option<String>,
    result: ParseResult,
    debouncer: Debouncer<ParseResult>,
}

impl fmt::Debug for DebouncedParsing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedParsing")
            .field("options", &self.options)
            .field("delay", &self.delay)
            .field("content_len", &self.content().len())
            .field("success", &self.result.success)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

impl DebouncedParsing {
    pub fn new(content: impl Into<String>, options: ParserOptions) -> Self {
        Self::with_parser(content, options, CmarkParser)
    }

    pub fn with_parser(
        content: impl Into<String>,
        options: ParserOptions,
        parser: impl MarkdownParser + 'static,
    ) -> Self {
        let parser: Arc<dyn MarkdownParser> = Arc::new(parser);
        let content = content.into();
        let result = parser.parse(&content, &options);
        Self {
            parser,
            options,
            delay: DEFAULT_DEBOUNCE,
            committed: content,
            pending: None,
            result,
            debouncer: Debouncer::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Schedules a parse of `content` after the delay, replacing any parse still pending.
    /// Unchanged content schedules nothing.
    pub fn set_content(&mut self, now: Instant, content: impl Into<String>) {
        let content = content.into();
        if content == self.content() {
            return;
        }
        self.pending = Some(content.clone());

        let parser = Arc::clone(&self.parser);
        let options = self.options.clone();
        self.debouncer
            .schedule(now, self.delay, move || parser.parse(&content, &options));
    }

    /// Commits the scheduled parse once due. Returns whether the result changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(result) => {
                self.result = result;
                if let Some(content) = self.pending.take() {
                    self.committed = content;
                }
                true
            }
            None => false,
        }
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    /// Committed nodes, empty when the last parse failed.
    pub fn nodes(&self) -> &[MarkdownNode] {
        if self.result.success {
            &self.result.nodes
        } else {
            &[]
        }
    }

    /// The latest content handed to [`DebouncedParsing::set_content`], parsed or not.
    /// After a cancel this is the content of the committed result again.
    pub fn content(&self) -> &str {
        self.pending.as_deref().unwrap_or(&self.committed)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn cancel(&mut self) -> bool {
        self.pending = None;
        self.debouncer.cancel_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_core::ast::NodeType;
    use pretty_assertions::assert_eq;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn newer_schedule_replaces_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::new();
        let first = d.schedule(t0, ms(100), || 1);
        let second = d.schedule(t0 + ms(50), ms(100), || 2);
        assert_ne!(first, second);
        assert!(!d.cancel(first));

        assert_eq!(d.poll(t0 + ms(120)), None);
        assert_eq!(d.poll(t0 + ms(150)), Some(2));
        assert_eq!(d.poll(t0 + ms(500)), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn canceled_jobs_never_run() {
        let t0 = Instant::now();
        let mut d = Debouncer::new();
        let handle = d.schedule(t0, ms(10), || "x");
        assert!(d.cancel(handle));
        assert_eq!(d.poll(t0 + ms(20)), None);
    }

    #[test]
    fn initial_parse_is_synchronous() {
        let p = DebouncedParsing::new("# Hi", ParserOptions::default());
        assert!(!p.is_pending());
        assert_eq!(p.nodes().len(), 1);
        assert_eq!(p.nodes()[0].children[0].kind, NodeType::Heading);
    }

    #[test]
    fn only_the_newest_edit_is_committed() {
        let t0 = Instant::now();
        let mut p = DebouncedParsing::new("a", ParserOptions::default()).with_delay(ms(300));
        p.set_content(t0, "b");
        p.set_content(t0 + ms(100), "# c");
        assert_eq!(p.deadline(), Some(t0 + ms(400)));

        assert!(!p.poll(t0 + ms(350)));
        assert_eq!(p.nodes()[0].children[0].kind, NodeType::Paragraph);

        assert!(p.poll(t0 + ms(400)));
        assert_eq!(p.nodes()[0].children[0].kind, NodeType::Heading);
        assert_eq!(p.content(), "# c");
    }

    #[test]
    fn unchanged_content_schedules_nothing() {
        let t0 = Instant::now();
        let mut p = DebouncedParsing::new("same", ParserOptions::default());
        p.set_content(t0, "same");
        assert!(!p.is_pending());
    }

    #[test]
    fn cancel_drops_the_pending_parse() {
        let t0 = Instant::now();
        let mut p = DebouncedParsing::new("a", ParserOptions::default());
        p.set_content(t0, "# b");
        assert!(p.cancel());
        assert!(!p.poll(t0 + DEFAULT_DEBOUNCE));
        assert_eq!(p.nodes()[0].children[0].kind, NodeType::Paragraph);
        assert_eq!(p.content(), "a");
    }

    #[test]
    fn content_reset_after_cancel_is_scheduled_again() {
        let t0 = Instant::now();
        let mut p = DebouncedParsing::new("a", ParserOptions::default());
        p.set_content(t0, "# b");
        assert!(p.cancel());
        p.set_content(t0 + ms(10), "# b");
        assert!(p.is_pending());
        assert!(p.poll(t0 + ms(10) + DEFAULT_DEBOUNCE));
        assert_eq!(p.nodes()[0].children[0].kind, NodeType::Heading);
        assert_eq!(p.content(), "# b");
    }

    #[test]
    fn reverting_to_committed_content_while_pending_reparses_it() {
        let t0 = Instant::now();
        let mut p = DebouncedParsing::new("a", ParserOptions::default());
        p.set_content(t0, "# b");
        p.set_content(t0 + ms(10), "a");
        assert!(p.is_pending());
        assert!(p.poll(t0 + ms(10) + DEFAULT_DEBOUNCE));
        assert_eq!(p.nodes()[0].children[0].kind, NodeType::Paragraph);
        assert_eq!(p.content(), "a");
    }

    #[test]
    fn failed_parse_exposes_no_nodes() {
        let t0 = Instant::now();
        let options = ParserOptions {
            max_input_size: 3,
            ..ParserOptions::default()
        };
        let mut p = DebouncedParsing::new("ok", options);
        assert_eq!(p.nodes().len(), 1);
        p.set_content(t0, "too long");
        assert!(p.poll(t0 + DEFAULT_DEBOUNCE));
        assert!(!p.result().success);
        assert!(p.nodes().is_empty());
    }
}
