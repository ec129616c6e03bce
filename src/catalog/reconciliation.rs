//! Reviewable queue of proposed merges between canonical skills

use crate::catalog::skill::SkillId;
use crate::error::{Result, SkillGapError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    PendingMerge,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeProposal {
    pub id: u64,
    /// Older identity, kept as the canonical entry
    pub survivor: SkillId,
    pub absorbed: SkillId,
    pub similarity: f32,
    pub status: MergeStatus,
    pub proposed_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl MergeProposal {
    fn involves(&self, a: SkillId, b: SkillId) -> bool {
        (self.survivor == a && self.absorbed == b) || (self.survivor == b && self.absorbed == a)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MergeQueue {
    proposals: Vec<MergeProposal>,
}

impl MergeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_proposals(mut proposals: Vec<MergeProposal>) -> Self {
        proposals.sort_by_key(|p| p.id);
        Self { proposals }
    }

    /// Queue a pair for review. A pair already seen in any state is not queued again.
    pub fn propose(&mut self, a: SkillId, b: SkillId, similarity: f32) -> Option<&MergeProposal> {
        if a == b || self.proposals.iter().any(|p| p.involves(a, b)) {
            return None;
        }

        let id = self.proposals.last().map_or(1, |p| p.id + 1);
        self.proposals.push(MergeProposal {
            id,
            survivor: a.min(b),
            absorbed: a.max(b),
            similarity,
            status: MergeStatus::PendingMerge,
            proposed_at: Utc::now(),
            decided_at: None,
        });
        self.proposals.last()
    }

    pub fn confirm(&mut self, id: u64) -> Result<MergeProposal> {
        self.decide(id, MergeStatus::Confirmed)
    }

    pub fn reject(&mut self, id: u64) -> Result<MergeProposal> {
        self.decide(id, MergeStatus::Rejected)
    }

    fn decide(&mut self, id: u64, status: MergeStatus) -> Result<MergeProposal> {
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SkillGapError::UnknownMerge(id))?;

        if proposal.status != MergeStatus::PendingMerge {
            return Err(SkillGapError::MergeNotPending(id));
        }
        proposal.status = status;
        proposal.decided_at = Some(Utc::now());
        Ok(proposal.clone())
    }

    pub fn get(&self, id: u64) -> Option<&MergeProposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &MergeProposal> {
        self.proposals
            .iter()
            .filter(|p| p.status == MergeStatus::PendingMerge)
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &MergeProposal> {
        self.proposals
            .iter()
            .filter(|p| p.status == MergeStatus::Confirmed)
    }

    pub fn all(&self) -> &[MergeProposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propose_orders_pair_and_skips_repeats() {
        let mut queue = MergeQueue::new();
        let proposal = queue.propose(SkillId(7), SkillId(3), 0.95).unwrap();
        assert_eq!(proposal.survivor, SkillId(3));
        assert_eq!(proposal.absorbed, SkillId(7));
        assert_eq!(proposal.status, MergeStatus::PendingMerge);

        assert!(queue.propose(SkillId(3), SkillId(7), 0.97).is_none());
        assert!(queue.propose(SkillId(3), SkillId(3), 1.0).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_decisions_are_final() {
        let mut queue = MergeQueue::new();
        queue.propose(SkillId(1), SkillId(2), 0.93);
        queue.propose(SkillId(1), SkillId(4), 0.94);

        let confirmed = queue.confirm(1).unwrap();
        assert_eq!(confirmed.status, MergeStatus::Confirmed);
        assert!(confirmed.decided_at.is_some());
        assert!(matches!(queue.reject(1), Err(SkillGapError::MergeNotPending(1))));

        queue.reject(2).unwrap();
        assert_eq!(queue.pending().count(), 0);
        assert_eq!(queue.confirmed().count(), 1);
        assert!(matches!(queue.confirm(9), Err(SkillGapError::UnknownMerge(9))));
    }

    #[test]
    fn test_rejected_pair_is_not_requeued() {
        let mut queue = MergeQueue::new();
        queue.propose(SkillId(1), SkillId(2), 0.93);
        queue.reject(1).unwrap();
        assert!(queue.propose(SkillId(2), SkillId(1), 0.99).is_none());
    }
}
