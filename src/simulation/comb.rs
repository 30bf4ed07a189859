//! Staged comb fill.
//!
//! Each delivery bumps a counter; the stage moves up by at most one per
//! delivery once the counter reaches `(stage + 2) * deliveries_per_stage_unit`,
//! evaluated against the stage the cell is in at that moment. Passing the last
//! stage raises completion once per fill cycle.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CombConfig;
use crate::simulation::bee::NectarDelivered;

/// Stage value before any stage has been applied.
pub const NO_STAGE: i32 = -1;

/// Largest progress reported before the final stage.
const BELOW_FULL: f32 = 1.0 - f32::EPSILON;

/// Opaque name of the visual/structural form the presentation layer applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepresentationHandle(pub String);

impl From<&str> for RepresentationHandle {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// What the presentation layer must show after an advance or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageApplied {
    /// `NO_STAGE` for the base representation.
    pub stage: i32,
    pub representation: RepresentationHandle,
}

/// Result of feeding one delivery to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Counted; no threshold crossed.
    Counted,
    Advanced(StageApplied),
    /// The cell moved past its last stage. Raised once per fill cycle.
    Completed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CombError {
    #[error("stage {stage} is out of range for a comb with {stage_count} stages")]
    StageOutOfRange { stage: i32, stage_count: usize },
}

#[derive(Debug, Clone)]
pub struct CombCellController {
    stage: i32,
    delivery_count: u64,
    deliveries_per_stage_unit: u32,
    base: RepresentationHandle,
    stages: Vec<RepresentationHandle>,
    completed: bool,
}

impl CombCellController {
    /// At least one stage is kept and the unit is at least one delivery.
    pub fn new(
        deliveries_per_stage_unit: u32,
        base: RepresentationHandle,
        stages: Vec<RepresentationHandle>,
    ) -> Self {
        let stages = if stages.is_empty() { vec![base.clone()] } else { stages };
        Self {
            stage: NO_STAGE,
            delivery_count: 0,
            deliveries_per_stage_unit: deliveries_per_stage_unit.max(1),
            base,
            stages,
            completed: false,
        }
    }

    pub fn from_config(config: &CombConfig) -> Self {
        Self::new(
            config.deliveries_per_stage_unit,
            RepresentationHandle(config.base_representation.clone()),
            config
                .stages
                .iter()
                .map(|name| RepresentationHandle(name.clone()))
                .collect(),
        )
    }

    pub fn stage(&self) -> i32 {
        self.stage
    }

    pub fn delivery_count(&self) -> u64 {
        self.delivery_count
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn deliveries_per_stage_unit(&self) -> u32 {
        self.deliveries_per_stage_unit
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn final_stage(&self) -> i32 {
        self.stages.len() as i32 - 1
    }

    pub fn is_final_stage(&self) -> bool {
        self.stage == self.final_stage()
    }

    /// Deliveries the counter must reach for the next advance from the current stage.
    pub fn deliveries_required(&self) -> u64 {
        Self::required_for(self.stage, self.deliveries_per_stage_unit)
    }

    /// Widened so `(stage + 2) * unit` cannot wrap for any `i32` stage and `u32` unit.
    fn required_for(stage: i32, unit: u32) -> u64 {
        (i64::from(stage) + 2).max(0) as u64 * u64::from(unit)
    }

    pub fn representation(&self) -> &RepresentationHandle {
        match usize::try_from(self.stage) {
            Ok(index) => &self.stages[index],
            Err(_) => &self.base,
        }
    }

    /// Counts one delivery and advances at most one stage.
    pub fn advance(&mut self, _delivery: &NectarDelivered) -> FillOutcome {
        self.delivery_count = self.delivery_count.saturating_add(1);

        if self.completed || self.delivery_count < self.deliveries_required() {
            return FillOutcome::Counted;
        }

        let next = self.stage + 1;
        if next > self.final_stage() {
            self.completed = true;
            debug!(deliveries = self.delivery_count, "All comb stages completed");
            return FillOutcome::Completed;
        }

        self.stage = next;
        debug!(stage = next, deliveries = self.delivery_count, "Comb advanced");
        FillOutcome::Advanced(self.applied())
    }

    /// Back to the unfilled base; completion can fire again.
    pub fn reset(&mut self) -> StageApplied {
        self.stage = NO_STAGE;
        self.delivery_count = 0;
        self.completed = false;
        self.applied()
    }

    /// Reset, then start a fresh fill cycle.
    pub fn restart(&mut self) -> StageApplied {
        let applied = self.reset();
        info!("Comb fill cycle restarted");
        applied
    }

    /// Jumps straight to `stage`, setting the counter to `stage * unit` and
    /// opening a new fill cycle. Leaves the cell untouched when `stage` does
    /// not exist.
    pub fn skip_to_stage(&mut self, stage: i32) -> Result<StageApplied, CombError> {
        if stage < 0 || stage > self.final_stage() {
            return Err(CombError::StageOutOfRange {
                stage,
                stage_count: self.stage_count(),
            });
        }
        self.stage = stage;
        self.delivery_count = stage as u64 * u64::from(self.deliveries_per_stage_unit);
        self.completed = false;
        Ok(self.applied())
    }

    /// 1.0 on the final stage, otherwise the share of the next threshold reached.
    pub fn fill_progress(&self) -> f32 {
        if self.is_final_stage() {
            return 1.0;
        }
        // Rounding must not report a full cell before the final stage.
        let share = self.delivery_count as f64 / self.deliveries_required() as f64;
        (share as f32).clamp(0.0, BELOW_FULL)
    }

    fn applied(&self) -> StageApplied {
        StageApplied {
            stage: self.stage,
            representation: self.representation().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DELIVERY: NectarDelivered = NectarDelivered { bee: 0 };

    fn cell(unit: u32, stage_count: usize) -> CombCellController {
        let stages = (0..stage_count)
            .map(|i| RepresentationHandle(format!("stage_{i}")))
            .collect();
        CombCellController::new(unit, "base".into(), stages)
    }

    fn feed(cell: &mut CombCellController, n: u32) -> Vec<FillOutcome> {
        (0..n).map(|_| cell.advance(&DELIVERY)).collect()
    }

    /// Replays the threshold recurrence one delivery at a time.
    fn expected_stage(n: u32, unit: u32, stage_count: usize) -> i32 {
        let mut stage = NO_STAGE;
        for count in 1..=n {
            if count >= (stage + 2) as u32 * unit && stage + 1 < stage_count as i32 {
                stage += 1;
            }
        }
        stage
    }

    #[test]
    fn thresholds_follow_running_stage_with_unit_five() {
        let mut comb = cell(5, 3);

        // From NO_STAGE the threshold is (-1 + 2) * 5 = 5.
        feed(&mut comb, 4);
        assert_eq!(comb.stage(), NO_STAGE);
        assert_eq!(comb.deliveries_required(), 5);

        assert_eq!(
            comb.advance(&DELIVERY),
            FillOutcome::Advanced(StageApplied { stage: 0, representation: "stage_0".into() })
        );
        assert_eq!(comb.delivery_count(), 5);
        assert_eq!(comb.deliveries_required(), 10);

        feed(&mut comb, 4);
        assert_eq!(comb.stage(), 0);
        assert!(matches!(comb.advance(&DELIVERY), FillOutcome::Advanced(StageApplied { stage: 1, .. })));

        feed(&mut comb, 4);
        assert!(matches!(comb.advance(&DELIVERY), FillOutcome::Advanced(StageApplied { stage: 2, .. })));
        assert_eq!(comb.delivery_count(), 15);
        assert!(comb.is_final_stage());

        feed(&mut comb, 4);
        assert!(!comb.is_completed());
        assert_eq!(comb.advance(&DELIVERY), FillOutcome::Completed);
        assert!(comb.is_completed());
        assert_eq!(comb.delivery_count(), 20);

        // Counted but inert until reset.
        assert_eq!(feed(&mut comb, 30), vec![FillOutcome::Counted; 30]);
        assert_eq!(comb.stage(), 2);
    }

    #[test]
    fn completion_fires_once_per_cycle() {
        let mut comb = cell(1, 1);
        let outcomes = feed(&mut comb, 10);
        let completions = outcomes.iter().filter(|o| **o == FillOutcome::Completed).count();
        assert_eq!(completions, 1);
        assert_eq!(comb.delivery_count(), 10);
        assert_eq!(comb.stage(), 0);

        comb.reset();
        let outcomes = feed(&mut comb, 10);
        assert_eq!(outcomes.iter().filter(|o| **o == FillOutcome::Completed).count(), 1);
    }

    #[test]
    fn reset_restores_base_representation() {
        let mut comb = cell(2, 3);
        feed(&mut comb, 7);
        assert!(comb.stage() >= 0);

        let applied = comb.reset();
        assert_eq!(applied, StageApplied { stage: NO_STAGE, representation: "base".into() });
        assert_eq!(comb.delivery_count(), 0);
        assert!(!comb.is_completed());
    }

    #[test]
    fn skip_to_stage_sets_counter() {
        let mut comb = cell(5, 3);
        let applied = comb.skip_to_stage(1).unwrap();
        assert_eq!(applied.representation, "stage_1".into());
        assert_eq!(comb.stage(), 1);
        assert_eq!(comb.delivery_count(), 5);
    }

    #[test]
    fn skip_to_missing_stage_is_rejected_without_change() {
        let mut comb = cell(5, 3);
        feed(&mut comb, 10);
        let err = comb.skip_to_stage(3).unwrap_err();
        assert_eq!(err, CombError::StageOutOfRange { stage: 3, stage_count: 3 });
        assert!(comb.skip_to_stage(-1).is_err());
        assert_eq!(comb.stage(), 1);
        assert_eq!(comb.delivery_count(), 10);
    }

    #[test]
    fn skip_after_completion_opens_a_new_cycle() {
        let mut comb = cell(1, 3);
        feed(&mut comb, 10);
        assert!(comb.is_completed());

        comb.skip_to_stage(0).unwrap();
        assert!(!comb.is_completed());
        assert_eq!(comb.delivery_count(), 0);
        assert!(comb.fill_progress() < 1.0);

        // Threshold from stage 0 is 2, so the second delivery advances.
        assert_eq!(comb.advance(&DELIVERY), FillOutcome::Counted);
        assert!(matches!(comb.advance(&DELIVERY), FillOutcome::Advanced(StageApplied { stage: 1, .. })));
        let outcomes = feed(&mut comb, 10);
        assert_eq!(outcomes.iter().filter(|o| **o == FillOutcome::Completed).count(), 1);
        assert_eq!(comb.stage(), 2);
    }

    #[test]
    fn huge_unit_does_not_wrap_thresholds() {
        let mut comb = cell(u32::MAX, 3);
        assert_eq!(comb.deliveries_required(), u64::from(u32::MAX));

        comb.skip_to_stage(1).unwrap();
        assert_eq!(comb.delivery_count(), u64::from(u32::MAX));
        assert_eq!(comb.deliveries_required(), 3 * u64::from(u32::MAX));
        let progress = comb.fill_progress();
        assert!((0.0..1.0).contains(&progress));

        assert_eq!(comb.advance(&DELIVERY), FillOutcome::Counted);
        assert_eq!(comb.stage(), 1);
    }

    #[test]
    fn progress_tracks_next_threshold() {
        let mut comb = cell(5, 3);
        assert_eq!(comb.fill_progress(), 0.0);
        feed(&mut comb, 5);
        assert!((comb.fill_progress() - 0.5).abs() < 1e-6);
        comb.skip_to_stage(2).unwrap();
        assert_eq!(comb.fill_progress(), 1.0);
    }

    #[test]
    fn degenerate_settings_are_sanitized() {
        let comb = CombCellController::new(0, "base".into(), Vec::new());
        assert_eq!(comb.deliveries_per_stage_unit(), 1);
        assert_eq!(comb.stage_count(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deliver,
        Skip(i32),
    }

    fn ops(stage_count: usize) -> impl Strategy<Value = Vec<Op>> {
        let op = prop_oneof![
            4 => Just(Op::Deliver),
            1 => (0..stage_count as i32).prop_map(Op::Skip),
        ];
        prop::collection::vec(op, 0..120)
    }

    fn apply(cell: &mut CombCellController, ops: &[Op]) -> Vec<FillOutcome> {
        ops.iter()
            .map(|op| match op {
                Op::Deliver => cell.advance(&DELIVERY),
                Op::Skip(stage) => match cell.skip_to_stage(*stage) {
                    Ok(applied) => FillOutcome::Advanced(applied),
                    Err(_) => FillOutcome::Counted,
                },
            })
            .collect()
    }

    proptest! {
        #[test]
        fn stage_follows_recurrence(n in 0u32..200, unit in 1u32..8, stage_count in 1usize..6) {
            let mut comb = cell(unit, stage_count);
            feed(&mut comb, n);
            prop_assert_eq!(comb.stage(), expected_stage(n, unit, stage_count));
            prop_assert_eq!(comb.delivery_count(), u64::from(n));
        }

        #[test]
        fn progress_is_bounded_and_full_only_on_final(
            (stage_count, script) in (1usize..6).prop_flat_map(|count| (Just(count), ops(count))),
            unit in 1u32..8,
        ) {
            let mut comb = cell(unit, stage_count);
            for op in &script {
                apply(&mut comb, std::slice::from_ref(op));
                let progress = comb.fill_progress();
                prop_assert!((0.0..=1.0).contains(&progress));
                prop_assert_eq!(progress == 1.0, comb.is_final_stage());
            }
        }

        #[test]
        fn skip_clears_completion(n in 0u32..200, unit in 1u32..6, stage in 0i32..3) {
            let mut comb = cell(unit, 3);
            feed(&mut comb, n);
            comb.skip_to_stage(stage).unwrap();
            prop_assert!(!comb.is_completed());
            let completions = feed(&mut comb, 100 * unit)
                .into_iter()
                .filter(|o| *o == FillOutcome::Completed)
                .count();
            prop_assert_eq!(completions, 1);
        }

        #[test]
        fn reset_behaves_like_fresh(before in ops(3), after in ops(3), unit in 1u32..6) {
            let mut used = cell(unit, 3);
            apply(&mut used, &before);
            used.reset();
            let mut fresh = cell(unit, 3);
            prop_assert_eq!(apply(&mut used, &after), apply(&mut fresh, &after));
            prop_assert_eq!(used.stage(), fresh.stage());
            prop_assert_eq!(used.delivery_count(), fresh.delivery_count());
            prop_assert_eq!(used.is_completed(), fresh.is_completed());
        }
    }
}
