//! Per-session generation state.
//!
//! ```text
//! Idle ──begin(Full)──▶ Generating ──apply──▶ Ready
//!   ▲                       │ fail                │ begin(Titles|Hashtags|Article)
//!   └──────── reset ────────┴─────────────────────┘ (independent slices)
//! ```
//!
//! Each `begin` hands out a `Ticket`. A completion is applied only while its
//! ticket is current: a reset, a newer FULL generation, or a newer begin on
//! the same slice makes it stale, and it is dropped (last-started-wins).

use crate::llm::error::GenerationError;
use crate::llm::types::GenerationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
    Ready,
}

/// Independently updatable part of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Full,
    Titles,
    Hashtags,
    Article,
}

impl Slice {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            Slice::Full => 0,
            Slice::Titles => 1,
            Slice::Hashtags => 2,
            Slice::Article => 3,
        }
    }
}

/// Proof of a started operation; needed to apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    slice: Slice,
    seq: u64,
}

impl Ticket {
    pub fn slice(&self) -> Slice {
        self.slice
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// The ticket was superseded; session state is unchanged.
    Stale,
}

#[derive(Debug, Default)]
struct SliceState {
    seq: u64,
    in_flight: bool,
}

#[derive(Debug)]
pub struct Session {
    epoch: u64,
    phase: Phase,
    result: GenerationResult,
    selected: Vec<String>,
    slices: [SliceState; Slice::COUNT],
    last_error: Option<GenerationError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            phase: Phase::Idle,
            result: GenerationResult::default(),
            selected: Vec::new(),
            slices: Default::default(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self, slice: Slice) -> bool {
        self.slices[slice.index()].in_flight
    }

    pub fn selected_titles(&self) -> &[String] {
        &self.selected
    }

    pub fn last_error(&self) -> Option<&GenerationError> {
        self.last_error.as_ref()
    }

    /// Current bundle.
    pub fn snapshot(&self) -> GenerationResult {
        self.result.clone()
    }

    /// `NewInput`: discard everything and orphan every in-flight call.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.phase = Phase::Idle;
        self.result = GenerationResult::default();
        self.selected.clear();
        self.last_error = None;
        for slice in &mut self.slices {
            slice.in_flight = false;
        }
        log::debug!("[SESSION] Reset (epoch {})", self.epoch);
    }

    /// Start an operation on `slice`.
    ///
    /// FULL may start from any phase and supersedes in-flight regenerations.
    /// Regenerations need a `Ready` session with an article.
    pub fn begin(&mut self, slice: Slice) -> Result<Ticket, GenerationError> {
        match slice {
            Slice::Full => {
                self.epoch += 1;
                for s in &mut self.slices {
                    s.in_flight = false;
                }
                self.phase = Phase::Generating;
            }
            _ => {
                if self.phase != Phase::Ready || self.result.article().trim().is_empty() {
                    return Err(GenerationError::MissingPriorArticle);
                }
            }
        }

        let state = &mut self.slices[slice.index()];
        state.seq += 1;
        state.in_flight = true;
        self.last_error = None;
        log::debug!("[SESSION] Begin {:?} #{} (epoch {})", slice, state.seq, self.epoch);
        Ok(Ticket {
            epoch: self.epoch,
            slice,
            seq: state.seq,
        })
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch && ticket.seq == self.slices[ticket.slice.index()].seq
    }

    /// Common gate for every completion. Returns false (and logs) for a
    /// superseded ticket, otherwise clears the slice's in-flight flag.
    fn settle(&mut self, ticket: &Ticket, expected: Slice) -> bool {
        if ticket.slice != expected || !self.is_current(ticket) {
            log::info!("[SESSION] Dropping stale {:?} result", ticket.slice);
            return false;
        }
        self.slices[expected.index()].in_flight = false;
        true
    }

    /// Store a FULL result. Clears title selections.
    pub fn apply_full(&mut self, ticket: &Ticket, result: GenerationResult) -> Applied {
        if !self.settle(ticket, Slice::Full) {
            return Applied::Stale;
        }
        self.result = result;
        self.selected.clear();
        self.phase = Phase::Ready;
        Applied::Applied
    }

    pub fn apply_titles(&mut self, ticket: &Ticket, titles: Vec<String>) -> Applied {
        if !self.settle(ticket, Slice::Titles) {
            return Applied::Stale;
        }
        // Selections whose title vanished can no longer be honoured.
        self.selected.retain(|s| titles.contains(s));
        self.result.titles = Some(titles);
        Applied::Applied
    }

    pub fn apply_hashtags(&mut self, ticket: &Ticket, hashtags: Vec<String>) -> Applied {
        if !self.settle(ticket, Slice::Hashtags) {
            return Applied::Stale;
        }
        self.result.hashtags = Some(hashtags);
        Applied::Applied
    }

    pub fn apply_article(&mut self, ticket: &Ticket, article: String) -> Applied {
        if !self.settle(ticket, Slice::Article) {
            return Applied::Stale;
        }
        self.result.article = Some(article);
        Applied::Applied
    }

    /// Record a failure. A failed FULL returns to `Ready` if a bundle is
    /// still held, else to `Idle`; regeneration failures leave the bundle
    /// as it was.
    pub fn fail(&mut self, ticket: &Ticket, error: GenerationError) -> Applied {
        if !self.settle(ticket, ticket.slice) {
            return Applied::Stale;
        }
        if ticket.slice == Slice::Full {
            self.phase = if self.result.article.is_some() {
                Phase::Ready
            } else {
                Phase::Idle
            };
        }
        log::warn!("[SESSION] {:?} failed: {}", ticket.slice, error);
        self.last_error = Some(error);
        Applied::Applied
    }

    /// Lock or unlock `title`. Returns whether it is now locked.
    /// Titles not in the current bundle cannot be locked.
    pub fn toggle_title(&mut self, title: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| s == title) {
            self.selected.remove(pos);
            return false;
        }
        if self.result.titles().iter().any(|t| t == title) {
            self.selected.push(title.to_string());
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> GenerationResult {
        GenerationResult {
            titles: Some(vec!["A".into(), "B".into(), "C".into()]),
            hashtags: Some(vec!["#One".into()]),
            article: Some("Body.".into()),
        }
    }

    fn ready() -> Session {
        let mut session = Session::new();
        let ticket = session.begin(Slice::Full).unwrap();
        assert_eq!(session.phase(), Phase::Generating);
        assert_eq!(session.apply_full(&ticket, bundle()), Applied::Applied);
        session
    }

    #[test]
    fn full_generation_reaches_ready() {
        let session = ready();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.snapshot(), bundle());
        assert!(!session.is_busy(Slice::Full));
    }

    #[test]
    fn regeneration_requires_ready_session() {
        let mut session = Session::new();
        assert_eq!(session.begin(Slice::Titles), Err(GenerationError::MissingPriorArticle));
    }

    #[test]
    fn slices_are_independent() {
        let mut session = ready();
        let titles = session.begin(Slice::Titles).unwrap();
        let tags = session.begin(Slice::Hashtags).unwrap();
        assert!(session.is_busy(Slice::Titles) && session.is_busy(Slice::Hashtags));

        assert_eq!(session.apply_hashtags(&tags, vec!["#Two".into()]), Applied::Applied);
        assert_eq!(
            session.apply_titles(&titles, vec!["A".into(), "X".into(), "Y".into()]),
            Applied::Applied
        );
        let snap = session.snapshot();
        assert_eq!(snap.titles(), ["A", "X", "Y"]);
        assert_eq!(snap.hashtags(), ["#Two"]);
        assert_eq!(snap.article(), "Body.");
    }

    #[test]
    fn last_started_wins_on_same_slice() {
        let mut session = ready();
        let first = session.begin(Slice::Article).unwrap();
        let second = session.begin(Slice::Article).unwrap();
        assert_eq!(session.apply_article(&second, "Second.".into()), Applied::Applied);
        assert_eq!(session.apply_article(&first, "First.".into()), Applied::Stale);
        assert_eq!(session.snapshot().article(), "Second.");
    }

    #[test]
    fn reset_orphans_in_flight_calls() {
        let mut session = ready();
        let ticket = session.begin(Slice::Hashtags).unwrap();
        session.reset();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.apply_hashtags(&ticket, vec!["#Late".into()]), Applied::Stale);
        assert_eq!(session.snapshot(), GenerationResult::default());
    }

    #[test]
    fn new_full_generation_orphans_regenerations() {
        let mut session = ready();
        let titles = session.begin(Slice::Titles).unwrap();
        let full = session.begin(Slice::Full).unwrap();
        assert_eq!(session.apply_titles(&titles, vec!["Old".into()]), Applied::Stale);
        assert_eq!(session.apply_full(&full, bundle()), Applied::Applied);
    }

    #[test]
    fn failures_keep_bundle() {
        let mut session = ready();
        let ticket = session.begin(Slice::Titles).unwrap();
        assert_eq!(session.fail(&ticket, GenerationError::EmptyResponse), Applied::Applied);
        assert_eq!(session.snapshot(), bundle());
        assert_eq!(session.last_error(), Some(&GenerationError::EmptyResponse));
        assert_eq!(session.phase(), Phase::Ready);

        let mut fresh = Session::new();
        let ticket = fresh.begin(Slice::Full).unwrap();
        fresh.fail(&ticket, GenerationError::MissingCredential);
        assert_eq!(fresh.phase(), Phase::Idle);
    }

    #[test]
    fn toggle_and_selection_lifecycle() {
        let mut session = ready();
        assert!(session.toggle_title("A"));
        assert!(!session.toggle_title("Nope"));
        assert_eq!(session.selected_titles(), ["A"]);
        assert!(!session.toggle_title("A"));
        assert!(session.selected_titles().is_empty());

        session.toggle_title("B");
        let ticket = session.begin(Slice::Full).unwrap();
        session.apply_full(&ticket, bundle());
        assert!(session.selected_titles().is_empty());
    }

    #[test]
    fn ticket_for_wrong_slice_is_stale() {
        let mut session = ready();
        let ticket = session.begin(Slice::Titles).unwrap();
        assert_eq!(session.apply_hashtags(&ticket, vec![]), Applied::Stale);
        assert!(session.is_busy(Slice::Titles));
    }
}
