//! Work queue dispatcher.
//!
//! Hands at most one eligible contact to a requesting agent. Exclusivity comes from the
//! store's lease compare-and-swap: two agents may rank the same contact first, but only one
//! swap against the observed `(token, version)` pair can succeed. The loser moves on to the
//! next candidate.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::{AgentId, AgentProfile, Contact, ContactId, Lease, LeaseToken};
use super::repository::{ContactStore, EligibilityFilter, LeaseExpectation, StoreError};
use super::scoring::{ScoreBreakdown, ScoringEngine};

pub const DEFAULT_LEASE_TTL_SECS: i64 = 300;
pub const MIN_LEASE_TTL_SECS: i64 = 30;
pub const MAX_LEASE_TTL_SECS: i64 = 1800;
const DEFAULT_CLAIM_ROUNDS: u8 = 3;

/// Tunables for lease hand-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub lease_ttl: Duration,
    pub claim_rounds: u8,
}

impl DispatchConfig {
    /// Clamp the TTL into the supported window.
    pub fn with_ttl_secs(secs: i64) -> Self {
        Self {
            lease_ttl: Duration::seconds(secs.clamp(MIN_LEASE_TTL_SECS, MAX_LEASE_TTL_SECS)),
            claim_rounds: DEFAULT_CLAIM_ROUNDS,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_LEASE_TTL_SECS)
    }
}

/// Result of a next-contact request. An empty queue is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Assigned(Assignment),
    QueueEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub contact: Contact,
    pub lease: Lease,
    pub score: ScoreBreakdown,
}

/// Contact paired with the score that placed it in the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedContact {
    pub contact: Contact,
    pub score: ScoreBreakdown,
}

/// Whether `agent` may be handed `contact` at `now`.
pub fn is_eligible(contact: &Contact, agent: &AgentProfile, now: DateTime<Utc>) -> bool {
    if contact.do_not_contact || contact.status.is_terminal_for_calling() {
        return false;
    }
    if contact.live_lease(now).is_some() {
        return false;
    }
    if contact.status.requires_callback()
        && !contact
            .next_action_date
            .map(|due| due <= now)
            .unwrap_or(false)
    {
        return false;
    }

    if !agent.role.has_full_access() {
        if !agent.campaigns.contains(&contact.campaign_id) {
            return false;
        }
        if let Some(assigned) = &contact.assigned_agent_id {
            if assigned != &agent.id {
                return false;
            }
        }
    }

    agent.covers_zone(contact.profile.postcode.as_deref())
}

/// Order candidates by score, then staleness, then id.
pub fn rank(
    candidates: Vec<Contact>,
    scoring: &ScoringEngine,
    now: DateTime<Utc>,
) -> Vec<RankedContact> {
    let mut ranked: Vec<RankedContact> = candidates
        .into_iter()
        .map(|contact| {
            let score = scoring.score(&contact, now);
            RankedContact { contact, score }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total
            .cmp(&a.score.total)
            .then_with(|| a.contact.last_contact_at.cmp(&b.contact.last_contact_at))
            .then_with(|| a.contact.id.cmp(&b.contact.id))
    });
    ranked
}

pub struct WorkQueueDispatcher<S> {
    store: Arc<S>,
    scoring: Arc<ScoringEngine>,
    config: DispatchConfig,
}

impl<S> WorkQueueDispatcher<S>
where
    S: ContactStore + 'static,
{
    pub fn new(store: Arc<S>, scoring: Arc<ScoringEngine>, config: DispatchConfig) -> Self {
        Self {
            store,
            scoring,
            config,
        }
    }

    fn filter_for(agent: &AgentProfile, now: DateTime<Utc>) -> EligibilityFilter {
        EligibilityFilter {
            campaigns: if agent.role.has_full_access() {
                None
            } else {
                Some(agent.campaigns.clone())
            },
            now,
        }
    }

    /// Eligible contacts in dispatch order, without leasing anything.
    pub fn preview(
        &self,
        agent: &AgentProfile,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RankedContact>, StoreError> {
        let candidates = self
            .store
            .list_eligible(&Self::filter_for(agent, now))?
            .into_iter()
            .filter(|contact| is_eligible(contact, agent, now))
            .collect();

        let mut ranked = rank(candidates, &self.scoring, now);
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Lease the best eligible contact to `agent`.
    ///
    /// Returns `StoreError::Conflict` only when every round lost its races.
    pub fn next_for(
        &self,
        agent: &AgentProfile,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, StoreError> {
        for round in 0..self.config.claim_rounds {
            let ranked = self.preview(agent, now, usize::MAX)?;
            if ranked.is_empty() {
                return Ok(DispatchOutcome::QueueEmpty);
            }

            for candidate in ranked {
                let lease = Lease {
                    token: LeaseToken::generate(),
                    agent_id: agent.id.clone(),
                    acquired_at: now,
                    expires_at: now + self.config.lease_ttl,
                };
                let expected = LeaseExpectation::observed(&candidate.contact);

                match self
                    .store
                    .compare_and_swap_lease(&candidate.contact.id, &expected, Some(lease.clone()))
                {
                    Ok(contact) => {
                        debug!(
                            contact_id = %contact.id,
                            agent_id = %agent.id,
                            score = candidate.score.total,
                            expires_at = %lease.expires_at,
                            "lease granted"
                        );
                        return Ok(DispatchOutcome::Assigned(Assignment {
                            contact,
                            lease,
                            score: candidate.score,
                        }));
                    }
                    Err(StoreError::Conflict) | Err(StoreError::NotFound) => {
                        debug!(
                            contact_id = %candidate.contact.id,
                            agent_id = %agent.id,
                            round,
                            "lease race lost"
                        );
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        Err(StoreError::Conflict)
    }

    /// Release a lease held by `agent_id`; a stale or foreign token is a conflict.
    pub fn abandon(
        &self,
        contact_id: &ContactId,
        agent_id: &AgentId,
        token: &LeaseToken,
    ) -> Result<Contact, StoreError> {
        let contact = self
            .store
            .get_contact(contact_id)?
            .ok_or(StoreError::NotFound)?;

        let held = contact
            .lease
            .as_ref()
            .map(|lease| &lease.token == token && &lease.agent_id == agent_id)
            .unwrap_or(false);
        if !held {
            return Err(StoreError::Conflict);
        }

        let released = self.store.compare_and_swap_lease(
            contact_id,
            &LeaseExpectation::observed(&contact),
            None,
        )?;
        debug!(contact_id = %contact_id, agent_id = %agent_id, "lease abandoned");
        Ok(released)
    }

    /// Clear every lease expired at `now`. Safe to run repeatedly.
    pub fn expire(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut expired = 0;

        for contact in self.store.leased_contacts()? {
            let Some(lease) = contact.lease.as_ref() else {
                continue;
            };
            if lease.is_live(now) {
                continue;
            }

            match self.store.compare_and_swap_lease(
                &contact.id,
                &LeaseExpectation::observed(&contact),
                None,
            ) {
                Ok(_) => {
                    debug!(contact_id = %contact.id, agent_id = %lease.agent_id, "lease expired");
                    expired += 1;
                }
                Err(StoreError::Conflict) | Err(StoreError::NotFound) => {}
                Err(other) => return Err(other),
            }
        }

        Ok(expired)
    }
}
