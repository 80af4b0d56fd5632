use std::sync::atomic::{AtomicU64, Ordering};

use super::{ErrorKind, MessageType, Subsystem};

/// Track datagram codec counters without external dependencies.
pub(crate) struct Metrics;

static ENVELOPES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static ENVELOPES_READ: AtomicU64 = AtomicU64::new(0);
static UNROUTED_ENVELOPES: AtomicU64 = AtomicU64::new(0);
static OVERFLOW_ERRORS: AtomicU64 = AtomicU64::new(0);
static UNDERRUN_ERRORS: AtomicU64 = AtomicU64::new(0);
static MALFORMED_ERRORS: AtomicU64 = AtomicU64::new(0);
static INVALID_VALUE_ERRORS: AtomicU64 = AtomicU64::new(0);

struct SubsystemCounters {
    control: AtomicU64,
    client_agent: AtomicU64,
    state_server: AtomicU64,
    database_server: AtomicU64,
}

static SUBSYSTEM_COUNTERS: SubsystemCounters = SubsystemCounters::new();

impl SubsystemCounters {
    const fn new() -> Self {
        Self {
            control: AtomicU64::new(0),
            client_agent: AtomicU64::new(0),
            state_server: AtomicU64::new(0),
            database_server: AtomicU64::new(0),
        }
    }

    fn counter(&self, subsystem: Subsystem) -> &AtomicU64 {
        match subsystem {
            Subsystem::Control => &self.control,
            Subsystem::ClientAgent => &self.client_agent,
            Subsystem::StateServer => &self.state_server,
            Subsystem::DatabaseServer => &self.database_server,
        }
    }
}

/// Whether an envelope was built or parsed.
#[derive(Clone, Copy)]
pub(crate) enum EnvelopeDirection {
    Written,
    Read,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_envelope(direction: EnvelopeDirection, msg_type: MessageType) {
        match direction {
            EnvelopeDirection::Written => ENVELOPES_WRITTEN.fetch_add(1, Ordering::Relaxed),
            EnvelopeDirection::Read => ENVELOPES_READ.fetch_add(1, Ordering::Relaxed),
        };
        match msg_type.subsystem() {
            Some(subsystem) => SUBSYSTEM_COUNTERS
                .counter(subsystem)
                .fetch_add(1, Ordering::Relaxed),
            None => UNROUTED_ENVELOPES.fetch_add(1, Ordering::Relaxed),
        };
    }

    #[inline]
    pub(crate) fn record_error(kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::Overflow => &OVERFLOW_ERRORS,
            ErrorKind::Underrun => &UNDERRUN_ERRORS,
            ErrorKind::Malformed => &MALFORMED_ERRORS,
            ErrorKind::InvalidValue => &INVALID_VALUE_ERRORS,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_written: ENVELOPES_WRITTEN.load(Ordering::Relaxed),
            envelopes_read: ENVELOPES_READ.load(Ordering::Relaxed),
            control_envelopes: SUBSYSTEM_COUNTERS.control.load(Ordering::Relaxed),
            client_agent_envelopes: SUBSYSTEM_COUNTERS.client_agent.load(Ordering::Relaxed),
            state_server_envelopes: SUBSYSTEM_COUNTERS.state_server.load(Ordering::Relaxed),
            database_server_envelopes: SUBSYSTEM_COUNTERS.database_server.load(Ordering::Relaxed),
            unrouted_envelopes: UNROUTED_ENVELOPES.load(Ordering::Relaxed),
            overflow_errors: OVERFLOW_ERRORS.load(Ordering::Relaxed),
            underrun_errors: UNDERRUN_ERRORS.load(Ordering::Relaxed),
            malformed_errors: MALFORMED_ERRORS.load(Ordering::Relaxed),
            invalid_value_errors: INVALID_VALUE_ERRORS.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of process-wide codec counters.
#[derive(Default, Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    /// Envelope headers appended to datagrams
    pub envelopes_written: u64,
    /// Envelope headers parsed successfully
    pub envelopes_read: u64,
    /// Envelopes with a control message type
    pub control_envelopes: u64,
    /// Envelopes with a client agent message type
    pub client_agent_envelopes: u64,
    /// Envelopes with a state server message type
    pub state_server_envelopes: u64,
    /// Envelopes with a database server message type
    pub database_server_envelopes: u64,
    /// Envelopes whose message type belongs to no subsystem
    pub unrouted_envelopes: u64,
    /// Rejected appends
    pub overflow_errors: u64,
    /// Rejected reads
    pub underrun_errors: u64,
    /// Structurally inconsistent input
    pub malformed_errors: u64,
    /// Values that did not fit their descriptor
    pub invalid_value_errors: u64,
}

impl MetricsSnapshot {
    /// Envelopes counted for one subsystem, in both directions.
    #[must_use]
    pub fn envelopes_for(&self, subsystem: Subsystem) -> u64 {
        match subsystem {
            Subsystem::Control => self.control_envelopes,
            Subsystem::ClientAgent => self.client_agent_envelopes,
            Subsystem::StateServer => self.state_server_envelopes,
            Subsystem::DatabaseServer => self.database_server_envelopes,
        }
    }

    /// Sum of every error counter.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.overflow_errors
            + self.underrun_errors
            + self.malformed_errors
            + self.invalid_value_errors
    }
}

/// Read the current process-wide counters.
#[must_use]
pub fn metrics_snapshot() -> MetricsSnapshot {
    Metrics::totals()
}
