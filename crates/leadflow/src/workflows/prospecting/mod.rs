//! Lead lifecycle and prioritization engine.
//!
//! Qualification and appointment transitions are pure functions producing commit payloads;
//! the service applies them through the store traits so that every governed write, and the
//! audit trail that goes with it, passes through one place.

pub mod appointments;
pub mod catalog;
pub mod dispatcher;
pub mod domain;
pub mod memory;
pub mod qualification;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use appointments::{
    Appointment, AppointmentHistoryEntry, AppointmentId, AppointmentStatus, BookingRequest,
    StatusChange,
};
pub use catalog::{CatalogError, ProspectingCatalog, SubReason};
pub use dispatcher::{Assignment, DispatchConfig, DispatchOutcome, RankedContact};
pub use domain::{
    AgentId, AgentProfile, AgentRole, CallEvent, CallOutcome, CampaignId, Contact,
    ContactHistoryEntry, ContactId, ContactProfile, ContactStatus, HistoryEntry, Lease,
    LeaseToken,
};
pub use memory::{
    InMemoryAgentDirectory, InMemoryAppointmentStore, InMemoryContactStore, InMemoryNotifier,
};
pub use qualification::{
    QualificationError, QualificationFields, QualificationRequest, Transition, ValidationError,
};
pub use repository::{
    AgentDirectory, AppointmentStore, ContactStore, ContactTimeline, NotifyError, PipelineAlert,
    PipelineNotifier, StoreError,
};
pub use router::prospecting_router;
pub use scoring::{Priority, ScoreBreakdown, ScoreCategory, ScoringConfig, ScoringEngine};
pub use service::{ProspectingError, ProspectingService};
