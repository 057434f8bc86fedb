//! Paginated narration.
//!
//! A [`NarrationSequencer`] walks an ordered list of pages, either on the
//! next-page key or on a per-page timer, then fades its surface out. The
//! sequencer is the only writer of its `active` flag and notifies its
//! observers synchronously whenever that flag flips.
//!
//! At most one timed operation (auto-advance or fade-out) is outstanding at
//! any time; starting a new one cancels the previous.

use std::rc::Rc;

use serde::Deserialize;
use tracing::{debug, info};
use winit::keyboard::KeyCode;

use crate::constants::{DEFAULT_NARRATION_FADE_OUT, DEFAULT_PAGE_DISPLAY_TIME};
use crate::observers::{Observers, SubscriptionId};
use crate::presentation::{Color, PresentationSurface, VoicePlayer, WHITE};
use crate::time_system::{Scheduler, TimerHandle};

fn default_display_time() -> f32 {
    DEFAULT_PAGE_DISPLAY_TIME
}

/// One page of narration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NarrationPage {
    pub content: String,
    /// Seconds on screen before auto-advancing (ignored for manual paging)
    #[serde(default = "default_display_time")]
    pub display_time: f32,
    #[serde(default)]
    pub voice_clip: Option<String>,
}

impl NarrationPage {
    pub fn new(content: impl Into<String>, display_time: f32) -> Self {
        Self {
            content: content.into(),
            display_time,
            voice_clip: None,
        }
    }

    pub fn with_voice(mut self, clip: impl Into<String>) -> Self {
        self.voice_clip = Some(clip.into());
        self
    }
}

/// Where a sequence currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    /// Not started (cursor = -1)
    Idle,
    /// Showing page `i`
    Displaying(usize),
    /// Past the last page (fading out, or faded)
    Finished,
}

/// Ordered pages plus a cursor in `-1..=len`
#[derive(Debug, Clone)]
pub struct NarrationSequence {
    pages: Vec<NarrationPage>,
    cursor: isize,
}

impl NarrationSequence {
    pub fn new(pages: Vec<NarrationPage>) -> Self {
        Self { pages, cursor: -1 }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn state(&self) -> NarrationState {
        if self.cursor < 0 {
            NarrationState::Idle
        } else if (self.cursor as usize) < self.pages.len() {
            NarrationState::Displaying(self.cursor as usize)
        } else {
            NarrationState::Finished
        }
    }

    /// Back to "not started"
    pub fn rewind(&mut self) {
        self.cursor = -1;
    }

    /// Move the cursor forward one step, saturating at `len`
    pub fn step(&mut self) -> NarrationState {
        self.cursor = (self.cursor + 1).min(self.pages.len() as isize);
        self.state()
    }

    /// Place the cursor so that the next step lands on `index`.
    /// Returns false (and leaves the cursor alone) for out-of-range indices.
    pub fn seek_before(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.cursor = index as isize - 1;
        true
    }

    pub fn page(&self, index: usize) -> Option<&NarrationPage> {
        self.pages.get(index)
    }

    pub fn current_page(&self) -> Option<&NarrationPage> {
        match self.state() {
            NarrationState::Displaying(i) => self.pages.get(i),
            _ => None,
        }
    }
}

/// Static per-sequencer settings
#[derive(Debug, Clone)]
pub struct NarrationSettings {
    pub auto_advance: bool,
    pub next_page_key: KeyCode,
    pub fade_out_duration: f32,
    pub text_color: Color,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            auto_advance: false,
            next_page_key: KeyCode::Space,
            fade_out_duration: DEFAULT_NARRATION_FADE_OUT,
            text_color: WHITE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NarrationTimer {
    AutoAdvance,
    FadeOut { started_at: f32 },
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    timer: NarrationTimer,
}

/// Drives one narration sequence and owns its `active` flag
pub struct NarrationSequencer {
    id: String,
    sequence: NarrationSequence,
    settings: NarrationSettings,
    active: bool,
    opacity: f32,
    timers: Scheduler<NarrationTimer>,
    pending: Option<PendingTimer>,
    surface: Option<Box<dyn PresentationSurface>>,
    voice: Option<Rc<dyn VoicePlayer>>,
    observers: Observers<bool>,
}

impl NarrationSequencer {
    pub fn new(id: impl Into<String>, pages: Vec<NarrationPage>, settings: NarrationSettings) -> Self {
        Self {
            id: id.into(),
            sequence: NarrationSequence::new(pages),
            settings,
            active: false,
            opacity: 1.0,
            timers: Scheduler::new(),
            pending: None,
            surface: None,
            voice: None,
            observers: Observers::new(),
        }
    }

    pub fn with_surface(mut self, surface: Box<dyn PresentationSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_voice(mut self, voice: Rc<dyn VoicePlayer>) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> NarrationState {
        self.sequence.state()
    }

    pub fn cursor(&self) -> isize {
        self.sequence.cursor()
    }

    pub fn page_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn current_page(&self) -> Option<&NarrationPage> {
        self.sequence.current_page()
    }

    /// Page still on the surface: the current one, or the last one while fading out
    pub fn visible_page(&self) -> Option<&NarrationPage> {
        if !self.active {
            return None;
        }
        match self.sequence.state() {
            NarrationState::Displaying(i) => self.sequence.page(i),
            NarrationState::Finished => self.sequence.page(self.sequence.len().checked_sub(1)?),
            NarrationState::Idle => None,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn next_page_key(&self) -> KeyCode {
        self.settings.next_page_key
    }

    pub fn is_fading(&self) -> bool {
        matches!(
            self.pending,
            Some(PendingTimer {
                timer: NarrationTimer::FadeOut { .. },
                ..
            })
        )
    }

    /// Whether the next-page key should advance right now: a page is up
    /// and no timer is about to advance or fade it.
    pub fn accepts_manual_advance(&self) -> bool {
        matches!(self.state(), NarrationState::Displaying(_)) && self.pending.is_none()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(bool) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Restart from the first page. Always legal, also mid-sequence.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.sequence.rewind();
        self.set_opacity(1.0);
        debug!(narration = %self.id, "reset");
        self.advance();
    }

    /// Show the next page, or start fading out after the last one.
    pub fn advance(&mut self) {
        self.cancel_pending();

        if self.sequence.is_empty() {
            self.sequence.step();
            self.hide_surface();
            self.set_active(false);
            return;
        }

        if self.sequence.state() == NarrationState::Finished {
            if self.active {
                // Fade was cut short: show again and run a single fresh fade
                self.begin_fade_out();
            } else {
                debug!(narration = %self.id, "advance on finished narration ignored");
            }
            return;
        }

        match self.sequence.step() {
            NarrationState::Displaying(index) => {
                self.set_active(true);
                self.present_page(index);
                if self.settings.auto_advance {
                    let delay = self
                        .sequence
                        .page(index)
                        .map(|page| page.display_time)
                        .unwrap_or(DEFAULT_PAGE_DISPLAY_TIME);
                    self.start_timer(delay, NarrationTimer::AutoAdvance);
                }
            }
            _ => self.begin_fade_out(),
        }
    }

    /// Jump so the next page shown is `index`. Out-of-range indices are ignored.
    pub fn jump_to_page(&mut self, index: usize) {
        if !self.sequence.seek_before(index) {
            debug!(narration = %self.id, index, "jump out of range ignored");
            return;
        }
        self.advance();
    }

    /// Advance this sequencer's timers by `dt` and run whatever came due.
    pub fn tick(&mut self, dt: f32) {
        puffin::profile_function!();

        let fired = self.timers.advance(dt);

        if let Some(PendingTimer {
            timer: NarrationTimer::FadeOut { started_at },
            ..
        }) = self.pending
        {
            let duration = self.settings.fade_out_duration.max(f32::EPSILON);
            let progress = (self.timers.elapsed_since(started_at) / duration).clamp(0.0, 1.0);
            self.set_opacity(1.0 - progress);
        }

        for (handle, timer) in fired {
            // Cancelled timers never reach here, but a stale handle must not act
            if self.pending.map(|p| p.handle) != Some(handle) {
                continue;
            }
            self.pending = None;
            match timer {
                NarrationTimer::AutoAdvance => self.advance(),
                NarrationTimer::FadeOut { .. } => self.complete_fade_out(),
            }
        }
    }

    /// Stop timers, audio and hide the surface
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        self.timers.clear();
        if let Some(voice) = &self.voice {
            voice.stop();
        }
        self.hide_surface();
    }

    // --- Private helpers ---

    fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        info!(narration = %self.id, active, "narration state changed");
        self.observers.notify(active);
    }

    fn present_page(&mut self, index: usize) {
        let Some(page) = self.sequence.page(index) else {
            return;
        };
        match self.surface.as_mut() {
            Some(surface) => surface.show(&page.content, Some(self.settings.text_color)),
            None => debug!(narration = %self.id, "no surface bound, page not shown"),
        }
        if let (Some(voice), Some(clip)) = (&self.voice, &page.voice_clip) {
            voice.play(clip);
        }
    }

    fn start_timer(&mut self, delay: f32, timer: NarrationTimer) {
        self.cancel_pending();
        let handle = self.timers.schedule_after(delay, timer);
        self.pending = Some(PendingTimer { handle, timer });
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.timers.cancel(pending.handle);
            if matches!(pending.timer, NarrationTimer::FadeOut { .. }) {
                self.set_opacity(1.0);
            }
        }
    }

    fn begin_fade_out(&mut self) {
        self.set_opacity(1.0);
        if self.settings.fade_out_duration <= 0.0 {
            self.complete_fade_out();
            return;
        }
        let started_at = self.timers.now();
        self.start_timer(
            self.settings.fade_out_duration,
            NarrationTimer::FadeOut { started_at },
        );
    }

    fn complete_fade_out(&mut self) {
        self.pending = None;
        self.set_opacity(0.0);
        self.hide_surface();
        self.set_active(false);
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
        if let Some(surface) = self.surface.as_mut() {
            surface.set_opacity(opacity);
        }
    }

    fn hide_surface(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.hide();
        }
    }
}

impl std::fmt::Debug for NarrationSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationSequencer")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("active", &self.active)
            .field("opacity", &self.opacity)
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call_log, count, Call, Recorder};
    use std::cell::RefCell;

    fn pages(n: usize) -> Vec<NarrationPage> {
        (0..n)
            .map(|i| NarrationPage::new(format!("page {}", i), 1.0))
            .collect()
    }

    fn manual(n: usize, fade: f32) -> NarrationSequencer {
        NarrationSequencer::new(
            "test",
            pages(n),
            NarrationSettings {
                fade_out_duration: fade,
                ..NarrationSettings::default()
            },
        )
    }

    fn cursor_in_pages(seq: &NarrationSequencer) -> bool {
        seq.cursor() >= 0 && (seq.cursor() as usize) < seq.page_count()
    }

    fn record_edges(seq: &mut NarrationSequencer) -> Rc<RefCell<Vec<bool>>> {
        let edges = Rc::new(RefCell::new(Vec::new()));
        let sink = edges.clone();
        seq.subscribe(move |active| sink.borrow_mut().push(active));
        edges
    }

    #[test]
    fn test_active_iff_cursor_on_a_page() {
        // Zero fade so the flag settles inside each call
        for n in 0..4 {
            let mut seq = manual(n, 0.0);
            assert_eq!(seq.is_active(), cursor_in_pages(&seq));
            let calls = [true, true, false, true, true, true, false, true, true];
            for advance in calls {
                if advance {
                    seq.advance();
                } else {
                    seq.reset();
                }
                assert_eq!(seq.is_active(), cursor_in_pages(&seq), "n = {}", n);
                assert!(seq.cursor() >= -1 && seq.cursor() <= n as isize);
            }
        }
    }

    #[test]
    fn test_notification_only_on_edges() {
        let mut seq = manual(3, 0.0);
        let edges = record_edges(&mut seq);

        seq.reset();
        assert_eq!(*edges.borrow(), vec![true]);
        seq.advance();
        seq.advance();
        assert_eq!(*edges.borrow(), vec![true]);
        seq.advance();
        assert_eq!(*edges.borrow(), vec![true, false]);
        // Idempotent: already finished and faded
        seq.advance();
        seq.advance();
        assert_eq!(*edges.borrow(), vec![true, false]);
    }

    #[test]
    fn test_reset_then_n_advances_finishes() {
        for n in 0..6 {
            let mut seq = manual(n, 1.5);
            seq.reset();
            for _ in 0..n {
                seq.advance();
            }
            assert_eq!(seq.state(), NarrationState::Finished, "n = {}", n);
        }
    }

    #[test]
    fn test_reset_rewinds_before_first_page() {
        let log = call_log();
        let mut seq = manual(3, 0.0).with_surface(Box::new(Recorder::new(&log)));
        seq.reset();
        seq.advance();
        seq.advance();
        assert_eq!(seq.state(), NarrationState::Displaying(2));

        let mut rewound = seq.sequence.clone();
        rewound.rewind();
        assert_eq!(rewound.cursor(), -1);
        assert_eq!(rewound.state(), NarrationState::Idle);

        seq.reset();
        assert_eq!(seq.state(), NarrationState::Displaying(0));
        assert_eq!(log.borrow().last(), Some(&Call::Show("page 0".to_string())));
    }

    #[test]
    fn test_empty_sequence_finishes_without_display() {
        let log = call_log();
        let mut seq = manual(0, 1.5).with_surface(Box::new(Recorder::new(&log)));
        let edges = record_edges(&mut seq);

        seq.reset();
        assert_eq!(seq.state(), NarrationState::Finished);
        assert!(!seq.is_active());
        seq.advance();
        assert_eq!(count(&log, |c| matches!(c, Call::Show(_))), 0);
        assert!(edges.borrow().is_empty());
    }

    #[test]
    fn test_fade_out_then_inactive() {
        let log = call_log();
        let mut seq = manual(1, 1.0).with_surface(Box::new(Recorder::new(&log)));
        let edges = record_edges(&mut seq);
        seq.reset();
        seq.advance();

        assert_eq!(seq.state(), NarrationState::Finished);
        assert!(seq.is_active());
        assert!(seq.is_fading());
        assert_eq!(seq.visible_page().map(|p| p.content.as_str()), Some("page 0"));

        seq.tick(0.5);
        assert!((seq.opacity() - 0.5).abs() < 1e-4);
        assert_eq!(*edges.borrow(), vec![true]);

        seq.tick(0.5);
        assert_eq!(*edges.borrow(), vec![true, false]);
        assert!(!seq.is_active());
        assert!(seq.visible_page().is_none());
        assert_eq!(seq.opacity(), 0.0);
        assert_eq!(log.borrow().last(), Some(&Call::Hide));
    }

    #[test]
    fn test_reset_during_fade_cancels_it() {
        let mut seq = manual(2, 1.0);
        let edges = record_edges(&mut seq);
        seq.reset();
        seq.advance();
        seq.advance();
        seq.tick(0.5);
        assert!(seq.opacity() < 1.0);

        seq.reset();
        assert_eq!(seq.opacity(), 1.0);
        assert_eq!(seq.state(), NarrationState::Displaying(0));
        assert!(!seq.is_fading());

        // The old fade must not fire later
        seq.tick(2.0);
        assert!(seq.is_active());
        assert_eq!(*edges.borrow(), vec![true]);
    }

    #[test]
    fn test_advance_during_fade_restarts_single_fade() {
        let mut seq = manual(1, 1.0);
        let edges = record_edges(&mut seq);
        seq.reset();
        seq.advance();
        seq.tick(0.75);

        seq.advance();
        assert_eq!(seq.opacity(), 1.0);
        assert_eq!(seq.timers.len(), 1);

        // Original deadline passes without finishing
        seq.tick(0.5);
        assert!(seq.is_active());
        seq.tick(0.5);
        assert!(!seq.is_active());
        assert_eq!(*edges.borrow(), vec![true, false]);
    }

    #[test]
    fn test_auto_advance_walks_pages() {
        let mut seq = NarrationSequencer::new(
            "auto",
            pages(2),
            NarrationSettings {
                auto_advance: true,
                fade_out_duration: 1.5,
                ..NarrationSettings::default()
            },
        );
        let edges = record_edges(&mut seq);

        seq.reset();
        assert!(!seq.accepts_manual_advance());
        seq.tick(1.0);
        assert_eq!(seq.state(), NarrationState::Displaying(1));
        seq.tick(1.0);
        assert_eq!(seq.state(), NarrationState::Finished);
        assert!(seq.is_active());
        seq.tick(1.5);
        assert!(!seq.is_active());
        assert_eq!(*edges.borrow(), vec![true, false]);
    }

    #[test]
    fn test_manual_paging_accepts_key() {
        let mut seq = manual(2, 1.0);
        assert!(!seq.accepts_manual_advance());
        seq.reset();
        assert!(seq.accepts_manual_advance());
        seq.advance();
        seq.advance();
        // Fading: the key must not stack another fade
        assert!(!seq.accepts_manual_advance());
    }

    #[test]
    fn test_voice_clip_played_per_page() {
        let log = call_log();
        let voice: Rc<dyn VoicePlayer> = Rc::new(Recorder::new(&log));
        let mut seq = NarrationSequencer::new(
            "voiced",
            vec![
                NarrationPage::new("hello", 1.0).with_voice("hello.ogg"),
                NarrationPage::new("quiet", 1.0),
            ],
            NarrationSettings::default(),
        )
        .with_voice(voice);

        seq.reset();
        seq.advance();
        assert_eq!(count(&log, |c| matches!(c, Call::Voice(_))), 1);
        assert_eq!(log.borrow()[0], Call::Voice("hello.ogg".to_string()));
    }

    #[test]
    fn test_jump_to_page() {
        let mut seq = manual(4, 0.0);
        seq.reset();
        seq.jump_to_page(2);
        assert_eq!(seq.state(), NarrationState::Displaying(2));

        // Out of range is a no-op
        seq.jump_to_page(9);
        assert_eq!(seq.state(), NarrationState::Displaying(2));
    }

    #[test]
    fn test_missing_surface_is_not_an_error() {
        let mut seq = manual(1, 0.0);
        seq.reset();
        assert!(seq.is_active());
        assert_eq!(seq.current_page().map(|p| p.content.as_str()), Some("page 0"));
        seq.advance();
        assert!(!seq.is_active());
    }
}
