//! # Targeting
//!
//! Interactive single-target selection for ranged items and spells.
//!
//! A [`TargetingSession`] moves through `Active -> Committed | Cancelled`.
//! Once it leaves `Active` it is inert and every operation on it is an
//! error. The [`TargetingController`] owns at most one session and drops it
//! when it finishes, so the controller reads `Inactive` again.
//!
//! Candidates are snapshotted at start: alive, within range, visible. They
//! are ordered by distance, then creation order. Liveness is checked again
//! only on commit. Nothing here mutates the entity store.

use crate::{DelveError, DelveResult, EntityId, EntityStore, Position, VisibilityQuery};
use serde::{Deserialize, Serialize};

/// Lifecycle state of targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetingState {
    Inactive,
    Active,
    Committed,
    Cancelled,
}

/// Direction for [`TargetingSession::cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// A target captured when the session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: EntityId,
    pub position: Position,
}

/// Result of [`TargetingSession::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetingStart {
    Started(TargetingSession),
    /// Nothing alive, visible and in range
    NoTargets,
}

/// Result of [`TargetingSession::move_cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Moved,
    /// The move would leave the range; the cursor did not move
    Rejected,
}

/// Why a commit did not produce a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The cursor is not on a candidate
    NoCandidate,
    /// The selected candidate died after the session started
    TargetDied,
}

/// Result of [`TargetingSession::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(EntityId),
    Cancelled(CancelReason),
}

/// One target-selection interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetingSession {
    origin: Position,
    max_range: u32,
    cursor: Position,
    candidates: Vec<Candidate>,
    current: Option<usize>,
    state: TargetingState,
}

impl TargetingSession {
    /// Starts a session over the eligible members of `pool`.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{
    ///     Entity, EntityStore, MonsterTemplate, Position, TargetingSession, TargetingStart,
    ///     VisibilityQuery,
    /// };
    ///
    /// struct SeeAll;
    /// impl VisibilityQuery for SeeAll {
    ///     fn is_visible(&self, _: Position) -> bool { true }
    /// }
    ///
    /// let mut store = EntityStore::new();
    /// let near = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(5, 6)));
    /// let far = store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(5, 20)));
    ///
    /// let start = TargetingSession::start(Position::new(5, 5), 10, &[near, far], &store, &SeeAll);
    /// let TargetingStart::Started(session) = start else { panic!("no targets") };
    /// assert_eq!(session.candidates().len(), 1);
    /// assert_eq!(session.cursor(), Position::new(5, 6));
    /// ```
    pub fn start(
        origin: Position,
        max_range: u32,
        pool: &[EntityId],
        store: &EntityStore,
        visibility: &impl VisibilityQuery,
    ) -> TargetingStart {
        let mut candidates: Vec<Candidate> = pool
            .iter()
            .filter_map(|id| store.get(*id))
            .filter(|entity| entity.is_alive())
            .filter(|entity| origin.manhattan_distance(entity.position) <= max_range)
            .filter(|entity| visibility.is_visible(entity.position))
            .map(|entity| Candidate {
                id: entity.id,
                position: entity.position,
            })
            .collect();
        candidates.sort_by_key(|candidate| {
            (origin.manhattan_distance(candidate.position), candidate.id)
        });
        candidates.dedup_by_key(|candidate| candidate.id);

        let Some(first) = candidates.first().copied() else {
            log::debug!("targeting from {} found no candidates", origin);
            return TargetingStart::NoTargets;
        };
        log::debug!(
            "targeting from {} started with {} candidates",
            origin,
            candidates.len()
        );
        TargetingStart::Started(Self {
            origin,
            max_range,
            cursor: first.position,
            candidates,
            current: Some(0),
            state: TargetingState::Active,
        })
    }

    pub fn state(&self) -> TargetingState {
        self.state
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn max_range(&self) -> u32 {
        self.max_range
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Index of the candidate under the cursor.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The candidate under the cursor.
    pub fn current_candidate(&self) -> Option<Candidate> {
        self.current.and_then(|index| self.candidates.get(index).copied())
    }

    /// Moves the cursor by a delta, refusing moves that leave the range.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) -> DelveResult<CursorMove> {
        self.require_active("move_cursor")?;
        let Some(next) = self.cursor.checked_offset(dx, dy) else {
            return Ok(CursorMove::Rejected);
        };
        if self.origin.manhattan_distance(next) > self.max_range {
            return Ok(CursorMove::Rejected);
        }
        self.cursor = next;
        self.current = self
            .candidates
            .iter()
            .position(|candidate| candidate.position == next);
        Ok(CursorMove::Moved)
    }

    /// Selects the next or previous candidate, wrapping around.
    ///
    /// With the cursor off every candidate, forward selects the first and
    /// backward the last.
    pub fn cycle(&mut self, direction: CycleDirection) -> DelveResult<Option<EntityId>> {
        self.require_active("cycle")?;
        let count = self.candidates.len();
        if count == 0 {
            return Ok(None);
        }
        let next = match (self.current, direction) {
            (Some(index), CycleDirection::Forward) => (index + 1) % count,
            (Some(index), CycleDirection::Backward) => (index + count - 1) % count,
            (None, CycleDirection::Forward) => 0,
            (None, CycleDirection::Backward) => count - 1,
        };
        let candidate = self.candidates[next];
        self.current = Some(next);
        self.cursor = candidate.position;
        Ok(Some(candidate.id))
    }

    /// Resolves the selection.
    ///
    /// The session ends either way: `Committed` with a live target, or
    /// `Cancelled` when the cursor is on no candidate or the candidate died.
    pub fn commit(&mut self, store: &EntityStore) -> DelveResult<CommitOutcome> {
        self.require_active("commit")?;
        let outcome = match self.current_candidate() {
            None => CommitOutcome::Cancelled(CancelReason::NoCandidate),
            Some(candidate) if !store.is_alive(candidate.id) => {
                CommitOutcome::Cancelled(CancelReason::TargetDied)
            }
            Some(candidate) => CommitOutcome::Committed(candidate.id),
        };
        self.state = match outcome {
            CommitOutcome::Committed(_) => TargetingState::Committed,
            CommitOutcome::Cancelled(_) => TargetingState::Cancelled,
        };
        log::debug!("targeting commit: {:?}", outcome);
        Ok(outcome)
    }

    /// Abandons the selection.
    pub fn cancel(&mut self) -> DelveResult<()> {
        self.require_active("cancel")?;
        self.state = TargetingState::Cancelled;
        log::debug!("targeting cancelled");
        Ok(())
    }

    fn require_active(&self, operation: &'static str) -> DelveResult<()> {
        if self.state == TargetingState::Active {
            Ok(())
        } else {
            Err(DelveError::InvalidTargetingState {
                operation,
                state: self.state,
            })
        }
    }
}

/// Holds the session in progress, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetingController {
    session: Option<TargetingSession>,
}

impl TargetingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Active` while a session is running, `Inactive` otherwise.
    pub fn state(&self) -> TargetingState {
        self.session
            .as_ref()
            .map(TargetingSession::state)
            .unwrap_or(TargetingState::Inactive)
    }

    pub fn is_active(&self) -> bool {
        self.state() == TargetingState::Active
    }

    pub fn session(&self) -> Option<&TargetingSession> {
        self.session.as_ref()
    }

    /// Starts a session. Starting while one is running is an error.
    pub fn start(
        &mut self,
        origin: Position,
        max_range: u32,
        pool: &[EntityId],
        store: &EntityStore,
        visibility: &impl VisibilityQuery,
    ) -> DelveResult<TargetingStart> {
        if self.is_active() {
            return Err(DelveError::InvalidTargetingState {
                operation: "start",
                state: TargetingState::Active,
            });
        }
        let start = TargetingSession::start(origin, max_range, pool, store, visibility);
        if let TargetingStart::Started(session) = &start {
            self.session = Some(session.clone());
        }
        Ok(start)
    }

    pub fn move_cursor(&mut self, dx: i32, dy: i32) -> DelveResult<CursorMove> {
        self.active_session("move_cursor")?.move_cursor(dx, dy)
    }

    pub fn cycle(&mut self, direction: CycleDirection) -> DelveResult<Option<EntityId>> {
        self.active_session("cycle")?.cycle(direction)
    }

    /// Commits and returns to `Inactive`.
    pub fn commit(&mut self, store: &EntityStore) -> DelveResult<CommitOutcome> {
        let outcome = self.active_session("commit")?.commit(store)?;
        self.session = None;
        Ok(outcome)
    }

    /// Cancels and returns to `Inactive`.
    pub fn cancel(&mut self) -> DelveResult<()> {
        self.active_session("cancel")?.cancel()?;
        self.session = None;
        Ok(())
    }

    fn active_session(&mut self, operation: &'static str) -> DelveResult<&mut TargetingSession> {
        self.session
            .as_mut()
            .ok_or(DelveError::InvalidTargetingState {
                operation,
                state: TargetingState::Inactive,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, MonsterTemplate};

    struct SeeAll;

    impl VisibilityQuery for SeeAll {
        fn is_visible(&self, _: Position) -> bool {
            true
        }
    }

    struct SeeNothing;

    impl VisibilityQuery for SeeNothing {
        fn is_visible(&self, _: Position) -> bool {
            false
        }
    }

    fn three_targets() -> (EntityStore, Vec<EntityId>) {
        let mut store = EntityStore::new();
        let ids = [(5, 8), (5, 6), (7, 5)]
            .iter()
            .map(|(x, y)| {
                store.spawn(Entity::monster(&MonsterTemplate::ORC, Position::new(*x, *y)))
            })
            .collect();
        (store, ids)
    }

    fn started(store: &EntityStore, pool: &[EntityId]) -> TargetingSession {
        match TargetingSession::start(Position::new(5, 5), 10, pool, store, &SeeAll) {
            TargetingStart::Started(session) => session,
            TargetingStart::NoTargets => panic!("expected candidates"),
        }
    }

    #[test]
    fn test_candidates_ordered_by_distance_then_id() {
        let (store, ids) = three_targets();
        let session = started(&store, &ids);
        let order: Vec<EntityId> = session.candidates().iter().map(|c| c.id).collect();
        // (5,6) at 1, then (7,5) at 2, then (5,8) at 3
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.state(), TargetingState::Active);
    }

    #[test]
    fn test_invisible_and_dead_are_filtered() {
        let (mut store, ids) = three_targets();
        assert_eq!(
            TargetingSession::start(Position::new(5, 5), 10, &ids, &store, &SeeNothing),
            TargetingStart::NoTargets
        );
        for id in &ids {
            store.entity_mut(*id).unwrap().health_mut().unwrap().set_current(0);
        }
        assert_eq!(
            TargetingSession::start(Position::new(5, 5), 10, &ids, &store, &SeeAll),
            TargetingStart::NoTargets
        );
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let (store, ids) = three_targets();
        let mut session = started(&store, &ids);
        let last = session.candidates()[2];

        assert_eq!(session.cycle(CycleDirection::Backward).unwrap(), Some(last.id));
        assert_eq!(session.cursor(), last.position);
        assert_eq!(
            session.cycle(CycleDirection::Forward).unwrap(),
            Some(session.candidates()[0].id)
        );
    }

    #[test]
    fn test_move_cursor_clears_and_restores_index() {
        let (store, ids) = three_targets();
        let mut session = started(&store, &ids);
        assert_eq!(session.move_cursor(1, 0).unwrap(), CursorMove::Moved);
        assert_eq!(session.current_index(), None);
        assert_eq!(session.move_cursor(1, -1).unwrap(), CursorMove::Moved);
        assert_eq!(session.cursor(), Position::new(7, 5));
        assert_eq!(session.current_candidate().map(|c| c.id), Some(ids[2]));
    }

    #[test]
    fn test_move_cursor_rejects_out_of_range() {
        let (store, ids) = three_targets();
        let mut session = started(&store, &ids);
        assert_eq!(session.move_cursor(0, 9).unwrap(), CursorMove::Moved);
        assert_eq!(session.move_cursor(0, 1).unwrap(), CursorMove::Rejected);
        assert_eq!(session.cursor(), Position::new(5, 15));
    }

    #[test]
    fn test_commit_on_empty_tile_cancels() {
        let (store, ids) = three_targets();
        let mut session = started(&store, &ids);
        session.move_cursor(-1, 0).unwrap();
        assert_eq!(
            session.commit(&store).unwrap(),
            CommitOutcome::Cancelled(CancelReason::NoCandidate)
        );
        assert_eq!(session.state(), TargetingState::Cancelled);
    }

    #[test]
    fn test_commit_rejects_dead_candidate() {
        let (mut store, ids) = three_targets();
        let mut session = started(&store, &ids);
        store.despawn(ids[1]);
        assert_eq!(
            session.commit(&store).unwrap(),
            CommitOutcome::Cancelled(CancelReason::TargetDied)
        );
    }

    #[test]
    fn test_finished_session_is_inert() {
        let (store, ids) = three_targets();
        let mut session = started(&store, &ids);
        assert_eq!(session.commit(&store).unwrap(), CommitOutcome::Committed(ids[1]));
        assert!(matches!(
            session.move_cursor(1, 0),
            Err(DelveError::InvalidTargetingState {
                operation: "move_cursor",
                state: TargetingState::Committed
            })
        ));
        assert!(session.cancel().is_err());
        assert!(session.commit(&store).is_err());
    }

    #[test]
    fn test_controller_lifecycle() {
        let (store, ids) = three_targets();
        let mut controller = TargetingController::new();
        assert_eq!(controller.state(), TargetingState::Inactive);
        assert!(controller.cycle(CycleDirection::Forward).is_err());

        let start = controller
            .start(Position::new(5, 5), 10, &ids, &store, &SeeAll)
            .unwrap();
        assert!(matches!(start, TargetingStart::Started(_)));
        assert!(controller.is_active());
        assert!(controller
            .start(Position::new(5, 5), 10, &ids, &store, &SeeAll)
            .is_err());

        controller.cancel().unwrap();
        assert_eq!(controller.state(), TargetingState::Inactive);
        assert!(controller.commit(&store).is_err());
    }

    #[test]
    fn test_controller_stays_inactive_without_targets() {
        let store = EntityStore::new();
        let mut controller = TargetingController::new();
        let start = controller
            .start(Position::new(0, 0), 10, &[], &store, &SeeAll)
            .unwrap();
        assert_eq!(start, TargetingStart::NoTargets);
        assert_eq!(controller.state(), TargetingState::Inactive);
    }

    #[test]
    fn test_overflowing_cursor_move_is_rejected() {
        let (store, ids) = three_targets();
        let mut session = started(&store, &ids);
        let before = session.cursor();

        assert_eq!(session.move_cursor(i32::MAX, 0).unwrap(), CursorMove::Rejected);
        assert_eq!(session.move_cursor(i32::MIN, 0).unwrap(), CursorMove::Rejected);
        assert_eq!(session.move_cursor(0, i32::MIN).unwrap(), CursorMove::Rejected);
        assert_eq!(session.cursor(), before);
        assert_eq!(session.state(), TargetingState::Active);
    }
}
