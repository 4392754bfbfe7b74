#![forbid(unsafe_code)]

//! Tour state machine.
//!
//! ```text
//!              start()                    next() [i < n-1]
//!  Inactive ───────────▶ Active(0) ──▶ … Active(i) ───────▶ Active(i+1)
//!     ▲                                   │  ▲
//!     │    skip() from any i              │  │ previous() [i > 0]
//!     ├───────────────────────────────────┘  │
//!     │    next() at n-1 (complete)          │
//!     └──────────────────────────────────────┘
//! ```
//!
//! `Inactive` is both the initial and the only resting terminal state. The
//! machine owns no DOM or timer state: every transition returns a
//! [`Transition`] listing the effects the caller must carry out (schedule a
//! settle timer, toggle the compact menu, persist the terminal action).

use waypoint_core::viewport::LayoutClass;

use crate::catalog::{Catalog, TourStep, select_catalog};
use crate::persistence::TerminalAction;

/// Current run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TourState {
    #[default]
    Inactive,
    Active { step: usize },
}

/// Outbound request to the navigation shell (compact layout only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavRequest {
    OpenMenu,
    CloseMenu,
}

impl NavRequest {
    /// Deliver this request to a navigation shell.
    pub fn dispatch(self, shell: &mut dyn NavigationShell) {
        match self {
            Self::OpenMenu => shell.open_menu(),
            Self::CloseMenu => shell.close_menu(),
        }
    }
}

/// The application's collapsible navigation menu.
pub trait NavigationShell {
    fn open_menu(&mut self);
    fn close_menu(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourAdvanceReason {
    Start,
    Next,
    Previous,
    /// The viewport class changed and the tour restarted on the new catalog.
    LayoutChanged,
}

/// One side effect of a transition, in the order it should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourEffect {
    StepChanged {
        from: Option<usize>,
        to: usize,
        reason: TourAdvanceReason,
    },
    Nav(NavRequest),
    Persist(TerminalAction),
    Finished {
        action: TerminalAction,
        last_step: usize,
    },
}

/// Effects produced by one operation. Empty means the call was a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    effects: Vec<TourEffect>,
}

impl Transition {
    fn noop() -> Self {
        Self::default()
    }

    fn push(&mut self, effect: TourEffect) {
        self.effects.push(effect);
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }

    #[must_use]
    pub fn effects(&self) -> &[TourEffect] {
        &self.effects
    }

    /// The step the tour moved to, if this transition changed steps.
    #[must_use]
    pub fn step_changed(&self) -> Option<usize> {
        self.effects.iter().find_map(|effect| match effect {
            TourEffect::StepChanged { to, .. } => Some(*to),
            _ => None,
        })
    }

    /// The terminal action to persist, if any.
    #[must_use]
    pub fn persisted(&self) -> Option<TerminalAction> {
        self.effects.iter().find_map(|effect| match effect {
            TourEffect::Persist(action) => Some(*action),
            _ => None,
        })
    }

    pub fn nav_requests(&self) -> impl Iterator<Item = NavRequest> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            TourEffect::Nav(request) => Some(*request),
            _ => None,
        })
    }
}

impl IntoIterator for Transition {
    type Item = TourEffect;
    type IntoIter = std::vec::IntoIter<TourEffect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.into_iter()
    }
}

/// Progress indicator data ("step 3 of 9").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourProgress {
    /// 0-based index.
    pub index: usize,
    pub count: usize,
}

impl TourProgress {
    /// 1-based position for display.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.index + 1
    }

    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.index + 1 >= self.count
    }
}

#[derive(Debug, Clone)]
pub struct TourMachine {
    state: TourState,
    layout: LayoutClass,
    wide: Catalog,
    compact: Catalog,
    offer_pending: bool,
}

impl Default for TourMachine {
    fn default() -> Self {
        Self::new(LayoutClass::default())
    }
}

impl TourMachine {
    /// Machine over the built-in catalogs.
    #[must_use]
    pub fn new(layout: LayoutClass) -> Self {
        Self::with_catalogs(
            layout,
            select_catalog(LayoutClass::Wide).clone(),
            select_catalog(LayoutClass::Compact).clone(),
        )
    }

    /// Machine over custom catalogs.
    #[must_use]
    pub fn with_catalogs(layout: LayoutClass, wide: Catalog, compact: Catalog) -> Self {
        Self {
            state: TourState::Inactive,
            layout,
            wide,
            compact,
            offer_pending: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> TourState {
        self.state
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, TourState::Active { .. })
    }

    /// Current index; 0 while inactive.
    #[must_use]
    pub const fn step_index(&self) -> usize {
        match self.state {
            TourState::Active { step } => step,
            TourState::Inactive => 0,
        }
    }

    #[must_use]
    pub const fn layout(&self) -> LayoutClass {
        self.layout
    }

    /// Catalog in effect for the current layout.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        match self.layout {
            LayoutClass::Compact => &self.compact,
            LayoutClass::Wide => &self.wide,
        }
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.catalog().len()
    }

    /// The active step, if the tour is running.
    #[must_use]
    pub fn current_step(&self) -> Option<&TourStep> {
        match self.state {
            TourState::Active { step } => self.catalog().get(step),
            TourState::Inactive => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Option<TourProgress> {
        match self.state {
            TourState::Active { step } => Some(TourProgress {
                index: step,
                count: self.step_count(),
            }),
            TourState::Inactive => None,
        }
    }

    /// Whether the tour should be offered to the signed-in user.
    #[must_use]
    pub const fn offer_pending(&self) -> bool {
        self.offer_pending
    }

    pub fn set_offer(&mut self, offer: bool) {
        self.offer_pending = offer;
    }

    fn open_menu(&self, transition: &mut Transition) {
        if self.layout.is_compact() {
            transition.push(TourEffect::Nav(NavRequest::OpenMenu));
        }
    }

    fn move_to(&mut self, to: usize, reason: TourAdvanceReason) -> Transition {
        let from = match self.state {
            TourState::Active { step } => Some(step),
            TourState::Inactive => None,
        };
        self.state = TourState::Active { step: to };
        let mut transition = Transition::noop();
        transition.push(TourEffect::StepChanged { from, to, reason });
        self.open_menu(&mut transition);
        tracing::debug!(
            from = ?from,
            to,
            reason = ?reason,
            layout = self.layout.as_str(),
            "tour step changed"
        );
        transition
    }

    /// Begin (or restart) the tour at step 0.
    pub fn start(&mut self) -> Transition {
        if self.catalog().is_empty() {
            tracing::warn!(
                layout = self.layout.as_str(),
                "cannot start tour: catalog is empty"
            );
            return Transition::noop();
        }
        self.offer_pending = false;
        self.move_to(0, TourAdvanceReason::Start)
    }

    /// Advance one step, completing the tour when already on the last one.
    pub fn next(&mut self) -> Transition {
        let TourState::Active { step } = self.state else {
            return Transition::noop();
        };
        if step + 1 < self.step_count() {
            self.move_to(step + 1, TourAdvanceReason::Next)
        } else {
            self.complete()
        }
    }

    /// Go back one step. No-op on the first step.
    pub fn previous(&mut self) -> Transition {
        match self.state {
            TourState::Active { step } if step > 0 => {
                self.move_to(step - 1, TourAdvanceReason::Previous)
            }
            _ => Transition::noop(),
        }
    }

    /// End the tour early.
    pub fn skip(&mut self) -> Transition {
        self.finish(TerminalAction::Skipped)
    }

    /// End the tour after the last step.
    pub fn complete(&mut self) -> Transition {
        self.finish(TerminalAction::Completed)
    }

    fn finish(&mut self, action: TerminalAction) -> Transition {
        let TourState::Active { step } = self.state else {
            return Transition::noop();
        };
        self.state = TourState::Inactive;
        self.offer_pending = false;

        let mut transition = Transition::noop();
        if self.layout.is_compact() {
            transition.push(TourEffect::Nav(NavRequest::CloseMenu));
        }
        transition.push(TourEffect::Persist(action));
        transition.push(TourEffect::Finished {
            action,
            last_step: step,
        });
        tracing::info!(
            action = action.as_str(),
            last_step = step,
            step_count = self.step_count(),
            "tour finished"
        );
        transition
    }

    /// Leave the tour without recording a terminal action (sign-out, teardown).
    pub fn abort(&mut self) -> Transition {
        let TourState::Active { step } = self.state else {
            return Transition::noop();
        };
        self.state = TourState::Inactive;
        let mut transition = Transition::noop();
        if self.layout.is_compact() {
            transition.push(TourEffect::Nav(NavRequest::CloseMenu));
        }
        tracing::debug!(last_step = step, "tour aborted");
        transition
    }

    /// Switch to the catalog for `layout`.
    ///
    /// An active tour restarts at step 0 of the new catalog, so an index that
    /// only exists in the old catalog is never referenced.
    pub fn set_layout(&mut self, layout: LayoutClass) -> Transition {
        if layout == self.layout {
            return Transition::noop();
        }
        let was_compact = self.layout.is_compact();
        self.layout = layout;

        let TourState::Active { step } = self.state else {
            return Transition::noop();
        };

        let mut transition = Transition::noop();
        if was_compact {
            transition.push(TourEffect::Nav(NavRequest::CloseMenu));
        }
        if self.catalog().is_empty() {
            tracing::warn!(
                layout = layout.as_str(),
                "catalog for new layout is empty; leaving tour without persisting"
            );
            self.state = TourState::Inactive;
            return transition;
        }
        tracing::debug!(
            previous_step = step,
            layout = layout.as_str(),
            "layout class changed mid-tour; restarting on new catalog"
        );
        transition
            .effects
            .extend(self.move_to(0, TourAdvanceReason::LayoutChanged));
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Placement, TourStep};

    fn catalog(n: u32) -> Catalog {
        Catalog::new(
            (1..=n)
                .map(|order| {
                    TourStep::new(
                        format!("s{order}"),
                        format!("Step {order}"),
                        "",
                        format!("#s{order}"),
                        Placement::Bottom,
                        order,
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn start_enters_first_step_and_clears_offer() {
        let mut tour = TourMachine::new(LayoutClass::Wide);
        tour.set_offer(true);
        let transition = tour.start();
        assert_eq!(tour.state(), TourState::Active { step: 0 });
        assert!(!tour.offer_pending());
        assert_eq!(transition.step_changed(), Some(0));
        assert_eq!(transition.nav_requests().count(), 0);
    }

    #[test]
    fn start_on_empty_catalog_is_noop() {
        let mut tour =
            TourMachine::with_catalogs(LayoutClass::Wide, Catalog::empty(), catalog(3));
        tour.set_offer(true);
        assert!(tour.start().is_noop());
        assert_eq!(tour.state(), TourState::Inactive);
        assert!(tour.offer_pending());
    }

    #[test]
    fn next_and_previous_move_within_bounds() {
        let mut tour = TourMachine::with_catalogs(LayoutClass::Wide, catalog(3), catalog(3));
        tour.start();
        assert!(tour.previous().is_noop());
        assert_eq!(tour.next().step_changed(), Some(1));
        assert_eq!(tour.next().step_changed(), Some(2));
        assert_eq!(tour.previous().step_changed(), Some(1));
        assert_eq!(tour.step_index(), 1);
    }

    #[test]
    fn next_on_last_step_completes() {
        let mut tour = TourMachine::with_catalogs(LayoutClass::Wide, catalog(2), catalog(2));
        tour.start();
        tour.next();
        let transition = tour.next();
        assert_eq!(tour.state(), TourState::Inactive);
        assert_eq!(tour.step_index(), 0);
        assert_eq!(transition.persisted(), Some(TerminalAction::Completed));
        assert!(transition.effects().contains(&TourEffect::Finished {
            action: TerminalAction::Completed,
            last_step: 1,
        }));
    }

    #[test]
    fn inactive_operations_are_noops() {
        let mut tour = TourMachine::new(LayoutClass::Compact);
        assert!(tour.next().is_noop());
        assert!(tour.previous().is_noop());
        assert!(tour.skip().is_noop());
        assert!(tour.complete().is_noop());
        assert!(tour.current_step().is_none());
        assert!(tour.progress().is_none());
    }

    #[test]
    fn compact_transitions_toggle_menu() {
        let mut tour = TourMachine::new(LayoutClass::Compact);
        let start: Vec<_> = tour.start().nav_requests().collect();
        assert_eq!(start, [NavRequest::OpenMenu]);
        let next: Vec<_> = tour.next().nav_requests().collect();
        assert_eq!(next, [NavRequest::OpenMenu]);
        let prev: Vec<_> = tour.previous().nav_requests().collect();
        assert_eq!(prev, [NavRequest::OpenMenu]);
        let skip = tour.skip();
        let nav: Vec<_> = skip.nav_requests().collect();
        assert_eq!(nav, [NavRequest::CloseMenu]);
        assert_eq!(skip.persisted(), Some(TerminalAction::Skipped));
    }

    #[test]
    fn progress_reports_ordinal_and_last() {
        let mut tour = TourMachine::with_catalogs(LayoutClass::Wide, catalog(2), catalog(2));
        tour.start();
        let progress = tour.progress().unwrap();
        assert_eq!(progress.ordinal(), 1);
        assert!(progress.is_first() && !progress.is_last());
        tour.next();
        assert!(tour.progress().unwrap().is_last());
    }

    #[test]
    fn layout_change_restarts_active_tour() {
        let mut tour = TourMachine::with_catalogs(LayoutClass::Wide, catalog(9), catalog(10));
        tour.start();
        for _ in 0..8 {
            tour.next();
        }
        assert_eq!(tour.step_index(), 8);

        let transition = tour.set_layout(LayoutClass::Compact);
        assert_eq!(tour.state(), TourState::Active { step: 0 });
        assert_eq!(tour.step_count(), 10);
        assert_eq!(
            transition.effects(),
            &[
                TourEffect::StepChanged {
                    from: Some(8),
                    to: 0,
                    reason: TourAdvanceReason::LayoutChanged,
                },
                TourEffect::Nav(NavRequest::OpenMenu),
            ]
        );

        let back: Vec<_> = tour.set_layout(LayoutClass::Wide).nav_requests().collect();
        assert_eq!(back, [NavRequest::CloseMenu]);
        assert_eq!(tour.step_index(), 0);
    }

    #[test]
    fn layout_change_while_inactive_only_swaps_catalog() {
        let mut tour = TourMachine::with_catalogs(LayoutClass::Wide, catalog(2), catalog(4));
        assert!(tour.set_layout(LayoutClass::Compact).is_noop());
        assert_eq!(tour.step_count(), 4);
        assert!(tour.set_layout(LayoutClass::Compact).is_noop());
    }

    #[test]
    fn abort_leaves_without_persisting() {
        let mut tour = TourMachine::new(LayoutClass::Compact);
        tour.start();
        tour.next();
        let transition = tour.abort();
        assert!(!tour.is_active());
        assert_eq!(transition.persisted(), None);
        assert_eq!(transition.effects(), &[TourEffect::Nav(NavRequest::CloseMenu)]);
        assert!(tour.abort().is_noop());
    }

    #[test]
    fn layout_change_to_empty_catalog_ends_without_persisting() {
        let mut tour =
            TourMachine::with_catalogs(LayoutClass::Wide, catalog(3), Catalog::empty());
        tour.start();
        let transition = tour.set_layout(LayoutClass::Compact);
        assert!(!tour.is_active());
        assert_eq!(transition.persisted(), None);
    }
}
