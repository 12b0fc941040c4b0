//! Character-granularity typing pacer. Fragments from the stream are
//! replayed one character at a time so the reveal looks typed rather than
//! pasted, with a small state machine deferring spans that might be the
//! prefix of a structural marker. A half-received `<think>` tag or a lone
//! opening backtick is never shown as literal text; once the marker
//! completes it is committed as one atomic append.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

use crate::core::constants::{CURSOR_GLYPH, REASONING_CLOSE_TAG, REASONING_OPEN_TAG};

/// Longest span the pacer will hold back while waiting for a marker to
/// resolve. No recognized marker is longer than this, so overflow means the
/// buffered text was ordinary prose and it is flushed verbatim.
pub const MAX_PENDING_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSpeed {
    VeryFast,
    Fast,
    Normal,
    Slow,
    VerySlow,
}

impl TypingSpeed {
    pub fn profile(self) -> TypingSpeedProfile {
        match self {
            TypingSpeed::VeryFast => TypingSpeedProfile::new(5, 15, 2),
            TypingSpeed::Fast => TypingSpeedProfile::new(15, 40, 8),
            TypingSpeed::Normal => TypingSpeedProfile::new(30, 90, 15),
            TypingSpeed::Slow => TypingSpeedProfile::new(50, 140, 25),
            TypingSpeed::VerySlow => TypingSpeedProfile::new(80, 220, 40),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TypingSpeed::VeryFast => "very-fast",
            TypingSpeed::Fast => "fast",
            TypingSpeed::Normal => "normal",
            TypingSpeed::Slow => "slow",
            TypingSpeed::VerySlow => "very-slow",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "very-fast" => Some(TypingSpeed::VeryFast),
            "fast" => Some(TypingSpeed::Fast),
            "normal" => Some(TypingSpeed::Normal),
            "slow" => Some(TypingSpeed::Slow),
            "very-slow" => Some(TypingSpeed::VerySlow),
            _ => None,
        }
    }

    /// Next profile in the cycle, for the UI speed toggle.
    pub fn next(self) -> Self {
        match self {
            TypingSpeed::VeryFast => TypingSpeed::Fast,
            TypingSpeed::Fast => TypingSpeed::Normal,
            TypingSpeed::Normal => TypingSpeed::Slow,
            TypingSpeed::Slow => TypingSpeed::VerySlow,
            TypingSpeed::VerySlow => TypingSpeed::VeryFast,
        }
    }
}

/// Per-character delays in milliseconds, plus the multiplier applied to
/// atomically committed structural content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingSpeedProfile {
    pub base_ms: u64,
    pub punctuation_ms: u64,
    pub whitespace_ms: u64,
    pub special_multiplier: u64,
}

impl TypingSpeedProfile {
    const fn new(base_ms: u64, punctuation_ms: u64, whitespace_ms: u64) -> Self {
        Self {
            base_ms,
            punctuation_ms,
            whitespace_ms,
            special_multiplier: 2,
        }
    }
}

/// One display emission: the full accumulated content so far. Interim
/// updates carry a trailing cursor glyph; the final update (`done`) does
/// not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUpdate {
    pub content: String,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PacerState {
    Plain,
    Buffering,
}

enum Resolution {
    /// Marker may still be forming; keep buffering.
    Keep,
    /// Buffer is a complete reasoning tag; commit with no delay.
    Reasoning,
    /// Buffer is a complete structural span; commit with the special delay.
    Special,
}

pub struct TypingPacer<F: FnMut(DisplayUpdate)> {
    state: PacerState,
    pending: String,
    content: String,
    speed: watch::Receiver<TypingSpeed>,
    sink: F,
}

impl<F: FnMut(DisplayUpdate)> TypingPacer<F> {
    pub fn new(initial: impl Into<String>, speed: watch::Receiver<TypingSpeed>, sink: F) -> Self {
        Self {
            state: PacerState::Plain,
            pending: String::new(),
            content: initial.into(),
            speed,
            sink,
        }
    }

    /// Replay one fragment character by character. Each revealed character
    /// or atomic unit produces exactly one display update; the delay after
    /// each emission is a cooperative suspension point.
    pub async fn feed(&mut self, fragment: &str) {
        for ch in fragment.chars() {
            self.step(ch).await;
        }
    }

    /// End of stream: whatever is still buffered is appended as-is, and the
    /// final update is emitted without the cursor glyph.
    pub fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.content.push_str(&pending);
        }
        (self.sink)(DisplayUpdate {
            content: self.content.clone(),
            done: true,
        });
        self.content
    }

    async fn step(&mut self, ch: char) {
        match self.state {
            PacerState::Plain => {
                if matches!(ch, '<' | '`' | '$') {
                    self.state = PacerState::Buffering;
                    self.pending.push(ch);
                    return;
                }
                self.content.push(ch);
                self.emit();
                self.delay_ms(self.plain_delay_ms(ch)).await;
            }
            PacerState::Buffering => {
                self.pending.push(ch);
                match self.resolve_pending() {
                    Resolution::Reasoning => self.commit_pending(0).await,
                    Resolution::Special => {
                        let ms = self.profile().base_ms * self.profile().special_multiplier;
                        self.commit_pending(ms).await;
                    }
                    Resolution::Keep => {
                        if self.pending.chars().count() >= MAX_PENDING_LEN {
                            // Safety valve: nothing resolved, so this was
                            // never a marker. Flush verbatim.
                            self.commit_pending(self.profile().base_ms).await;
                        }
                    }
                }
            }
        }
    }

    fn resolve_pending(&self) -> Resolution {
        let pending = self.pending.as_str();
        if pending == REASONING_OPEN_TAG || pending == REASONING_CLOSE_TAG {
            return Resolution::Reasoning;
        }

        match pending.chars().next() {
            Some('<') => {
                if pending.len() > 1 && pending.ends_with('>') {
                    Resolution::Special
                } else {
                    Resolution::Keep
                }
            }
            Some('`') => {
                if pending.matches("```").count() >= 2 {
                    // A complete fenced span within the window.
                    Resolution::Special
                } else if !pending.starts_with("``")
                    && pending.len() > 1
                    && pending.ends_with('`')
                {
                    // A closed single-backtick inline span.
                    Resolution::Special
                } else {
                    Resolution::Keep
                }
            }
            Some('$') => {
                if pending.len() > 1 && pending.ends_with('$') {
                    Resolution::Special
                } else {
                    Resolution::Keep
                }
            }
            _ => Resolution::Keep,
        }
    }

    async fn commit_pending(&mut self, delay_ms: u64) {
        let pending = std::mem::take(&mut self.pending);
        self.content.push_str(&pending);
        self.state = PacerState::Plain;
        self.emit();
        self.delay_ms(delay_ms).await;
    }

    fn emit(&mut self) {
        let mut shown = self.content.clone();
        shown.push(CURSOR_GLYPH);
        (self.sink)(DisplayUpdate {
            content: shown,
            done: false,
        });
    }

    fn plain_delay_ms(&self, ch: char) -> u64 {
        let profile = self.profile();
        if ch.is_whitespace() {
            profile.whitespace_ms
        } else if ch.is_ascii_punctuation() {
            profile.punctuation_ms
        } else {
            profile.base_ms
        }
    }

    /// The active profile is re-read on every emission decision, so a speed
    /// change takes effect on the next character, never retroactively.
    fn profile(&self) -> TypingSpeedProfile {
        self.speed.borrow().profile()
    }

    async fn delay_ms(&self, ms: u64) {
        if ms > 0 {
            sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_pacer(
        initial: &str,
        speed: TypingSpeed,
    ) -> (
        TypingPacer<impl FnMut(DisplayUpdate)>,
        watch::Sender<TypingSpeed>,
        mpsc::UnboundedReceiver<DisplayUpdate>,
    ) {
        let (speed_tx, speed_rx) = watch::channel(speed);
        let (tx, rx) = mpsc::unbounded_channel();
        let pacer = TypingPacer::new(initial, speed_rx, move |update| {
            let _ = tx.send(update);
        });
        (pacer, speed_tx, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<DisplayUpdate>) -> Vec<DisplayUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    fn without_cursor(content: &str) -> &str {
        content.strip_suffix(CURSOR_GLYPH).unwrap_or(content)
    }

    fn assert_prefix_monotonic(updates: &[DisplayUpdate]) {
        for pair in updates.windows(2) {
            let prev = without_cursor(&pair[0].content);
            let next = without_cursor(&pair[1].content);
            assert!(
                next.starts_with(prev),
                "update {next:?} does not extend {prev:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn plain_text_reveals_one_character_per_update() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        pacer.feed("hi!").await;
        let final_content = pacer.finish();

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 4);
        assert_eq!(without_cursor(&updates[0].content), "h");
        assert_eq!(without_cursor(&updates[1].content), "hi");
        assert_eq!(without_cursor(&updates[2].content), "hi!");
        assert!(updates[3].done);
        assert_eq!(final_content, "hi!");
        assert_prefix_monotonic(&updates);
    }

    #[tokio::test(start_paused = true)]
    async fn interim_updates_carry_the_cursor_and_the_final_does_not() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::Normal);
        pacer.feed("ok").await;
        pacer.finish();

        let updates = drain(&mut rx);
        for update in &updates[..updates.len() - 1] {
            assert!(update.content.ends_with(CURSOR_GLYPH));
            assert!(!update.done);
        }
        let last = updates.last().unwrap();
        assert!(last.done);
        assert!(!last.content.contains(CURSOR_GLYPH));
    }

    #[tokio::test(start_paused = true)]
    async fn reasoning_tag_split_across_fragments_commits_atomically() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        pacer.feed("so <thi").await;
        pacer.feed("nk>deep</thi").await;
        pacer.feed("nk> done").await;
        let final_content = pacer.finish();

        let updates = drain(&mut rx);
        for update in &updates {
            let shown = without_cursor(&update.content);
            assert!(
                !shown.contains("<thi") || shown.contains(REASONING_OPEN_TAG),
                "half-formed tag revealed: {shown:?}"
            );
        }
        assert_eq!(final_content, "so <think>deep</think> done");
        assert_prefix_monotonic(&updates);
    }

    #[tokio::test(start_paused = true)]
    async fn lone_angle_bracket_flushes_within_the_safety_valve() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        // More characters after '<' than the pending cap; no marker ever
        // resolves, so the buffer must flush mid-stream.
        pacer.feed("<3 cats plus 3 dogs plus 3 birds").await;

        let updates = drain(&mut rx);
        assert!(
            updates
                .iter()
                .any(|u| without_cursor(&u.content).starts_with("<3 cats")),
            "buffered text never flushed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn inline_code_span_commits_as_one_unit() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        pacer.feed("run `ls` now").await;
        pacer.finish();

        let updates = drain(&mut rx);
        let contents: Vec<&str> = updates
            .iter()
            .map(|u| without_cursor(&u.content))
            .collect();
        assert!(contents.contains(&"run `ls`"));
        assert!(!contents.contains(&"run `"));
        assert!(!contents.contains(&"run `l"));
        assert_prefix_monotonic(&updates);
    }

    #[tokio::test(start_paused = true)]
    async fn math_span_commits_as_one_unit() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        pacer.feed("so $e=mc^2$ holds").await;
        pacer.finish();

        let updates = drain(&mut rx);
        let contents: Vec<&str> = updates
            .iter()
            .map(|u| without_cursor(&u.content))
            .collect();
        assert!(contents.contains(&"so $e=mc^2$"));
        assert!(!contents.contains(&"so $e"));
    }

    #[tokio::test(start_paused = true)]
    async fn short_fenced_span_commits_as_one_unit() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        pacer.feed("```rs x=1```").await;
        pacer.finish();

        let updates = drain(&mut rx);
        let contents: Vec<&str> = updates
            .iter()
            .map(|u| without_cursor(&u.content))
            .collect();
        assert!(contents.contains(&"```rs x=1```"));
        assert!(!contents.iter().any(|c| c.starts_with("``") && c.len() < 12));
    }

    #[tokio::test(start_paused = true)]
    async fn finish_appends_unresolved_buffer_verbatim() {
        let (mut pacer, _speed, mut rx) = test_pacer("", TypingSpeed::VeryFast);
        pacer.feed("tail <unfini").await;
        let final_content = pacer.finish();

        assert_eq!(final_content, "tail <unfini");
        let updates = drain(&mut rx);
        let last = updates.last().unwrap();
        assert!(last.done);
        assert_eq!(last.content, "tail <unfini");
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_seed_is_preserved_as_a_prefix() {
        let (mut pacer, _speed, mut rx) = test_pacer("<think>working</think>", TypingSpeed::Fast);
        pacer.feed("yes").await;
        let final_content = pacer.finish();

        assert_eq!(final_content, "<think>working</think>yes");
        assert_prefix_monotonic(&drain(&mut rx));
    }

    #[tokio::test(start_paused = true)]
    async fn speed_change_applies_from_the_next_character() {
        let (mut pacer, speed_tx, _rx) = test_pacer("", TypingSpeed::Slow);

        let start = tokio::time::Instant::now();
        pacer.feed("a").await;
        assert_eq!(start.elapsed(), Duration::from_millis(50));

        speed_tx.send(TypingSpeed::VeryFast).unwrap();
        let start = tokio::time::Instant::now();
        pacer.feed("b").await;
        assert_eq!(start.elapsed(), Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn punctuation_and_whitespace_use_their_own_delays() {
        let (mut pacer, _speed, _rx) = test_pacer("", TypingSpeed::Normal);

        let start = tokio::time::Instant::now();
        pacer.feed("a").await;
        assert_eq!(start.elapsed(), Duration::from_millis(30));

        let start = tokio::time::Instant::now();
        pacer.feed(".").await;
        assert_eq!(start.elapsed(), Duration::from_millis(90));

        let start = tokio::time::Instant::now();
        pacer.feed(" ").await;
        assert_eq!(start.elapsed(), Duration::from_millis(15));
    }

    #[tokio::test(start_paused = true)]
    async fn reasoning_tags_charge_no_delay() {
        let (mut pacer, _speed, _rx) = test_pacer("", TypingSpeed::VerySlow);

        let start = tokio::time::Instant::now();
        pacer.feed("<think>").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_labels_round_trip() {
        for speed in [
            TypingSpeed::VeryFast,
            TypingSpeed::Fast,
            TypingSpeed::Normal,
            TypingSpeed::Slow,
            TypingSpeed::VerySlow,
        ] {
            assert_eq!(TypingSpeed::from_label(speed.label()), Some(speed));
        }
        assert_eq!(TypingSpeed::from_label("warp"), None);
    }
}
