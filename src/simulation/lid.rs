//! Hive lid gate.
//!
//! The lid may not close while any comb cell it tracks is lifted, and a cell
//! being lifted under a closed lid forces it open. Only `force_close` can
//! close over a lifted cell.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Anything that can answer whether a tracked cell is currently lifted.
pub trait LiftProbe<C> {
    fn is_lifted(&self, cell: C) -> bool;
}

impl<C, F> LiftProbe<C> for F
where
    F: Fn(C) -> bool,
{
    fn is_lifted(&self, cell: C) -> bool {
        self(cell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateTransition {
    Opened,
    Closed,
    Unchanged,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LidError {
    #[error("lid cannot close while {lifted} tracked comb cell(s) are lifted")]
    CloseBlocked { lifted: usize },
}

#[derive(Debug, Clone)]
pub struct LidGateController<C> {
    is_open: bool,
    tracked: Vec<C>,
    enforce_lift_constraint: bool,
}

impl<C> LidGateController<C>
where
    C: Copy + PartialEq,
{
    pub fn new(start_open: bool, enforce_lift_constraint: bool, tracked: impl IntoIterator<Item = C>) -> Self {
        let mut gate = Self {
            is_open: start_open,
            tracked: Vec::new(),
            enforce_lift_constraint,
        };
        for cell in tracked {
            gate.track(cell);
        }
        gate
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn enforces_lift_constraint(&self) -> bool {
        self.enforce_lift_constraint
    }

    pub fn tracked_cells(&self) -> &[C] {
        &self.tracked
    }

    /// Returns false if the cell was already tracked.
    pub fn track(&mut self, cell: C) -> bool {
        if self.tracked.contains(&cell) {
            return false;
        }
        self.tracked.push(cell);
        true
    }

    /// Returns false if the cell was not tracked.
    pub fn untrack(&mut self, cell: C) -> bool {
        match self.tracked.iter().position(|c| *c == cell) {
            Some(index) => {
                self.tracked.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_tracked(&mut self) {
        self.tracked.clear();
    }

    pub fn any_lifted<P: LiftProbe<C> + ?Sized>(&self, probe: &P) -> bool {
        self.tracked.iter().any(|cell| probe.is_lifted(*cell))
    }

    pub fn lifted_cells<P: LiftProbe<C> + ?Sized>(&self, probe: &P) -> Vec<C> {
        self.tracked
            .iter()
            .copied()
            .filter(|cell| probe.is_lifted(*cell))
            .collect()
    }

    fn check_close<P: LiftProbe<C> + ?Sized>(&self, probe: &P) -> Result<(), LidError> {
        if !self.enforce_lift_constraint {
            return Ok(());
        }
        let lifted = self.lifted_cells(probe).len();
        if lifted > 0 {
            debug!(lifted, "Lid close blocked: comb cells are lifted");
            return Err(LidError::CloseBlocked { lifted });
        }
        Ok(())
    }

    /// Flips the lid, unless that would close it over a lifted cell.
    pub fn request_toggle<P: LiftProbe<C> + ?Sized>(&mut self, probe: &P) -> Result<GateTransition, LidError> {
        let target = !self.is_open;
        self.request_set_open(target, probe)
    }

    /// Opening is always allowed; closing is checked against lifted cells.
    pub fn request_set_open<P: LiftProbe<C> + ?Sized>(
        &mut self,
        open: bool,
        probe: &P,
    ) -> Result<GateTransition, LidError> {
        if !open && self.is_open {
            self.check_close(probe)?;
        }
        Ok(self.set(open))
    }

    /// Re-checks tracked cells after a lift change; a lifted cell always wins
    /// over a closed lid. Never closes the lid.
    pub fn notify_cell_state_changed<P: LiftProbe<C> + ?Sized>(&mut self, probe: &P) -> GateTransition {
        if self.enforce_lift_constraint && !self.is_open && self.any_lifted(probe) {
            debug!("Lid forced open by lifted comb cell");
            return self.set(true);
        }
        GateTransition::Unchanged
    }

    pub fn force_open(&mut self) -> GateTransition {
        self.set(true)
    }

    /// Closes regardless of lifted cells.
    pub fn force_close(&mut self) -> GateTransition {
        self.set(false)
    }

    fn set(&mut self, open: bool) -> GateTransition {
        if self.is_open == open {
            return GateTransition::Unchanged;
        }
        self.is_open = open;
        debug!(open, "Lid moved");
        if open {
            GateTransition::Opened
        } else {
            GateTransition::Closed
        }
    }
}
