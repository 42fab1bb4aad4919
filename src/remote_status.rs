use chrono::{DateTime, Duration, Utc};

/// Overall station status. Ordered from most to least severe, so the worst of
/// two statuses is simply the smaller one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SystemStatus {
    Error = 0,   // Red
    Warning = 1, // Orange
    Normal = 2,  // Green
}

impl SystemStatus {
    /// Only ever moves towards `Error`.
    pub fn downgrade(self, observed: SystemStatus) -> SystemStatus {
        if observed < self {
            observed
        } else {
            self
        }
    }
}

/// Data recorder operating mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpType {
    Idle = 0,         // Not shown
    Spectrometer = 1, // Blue
    Recording = 2,    // Green
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusRecord {
    pub timestamp: DateTime<Utc>,
    pub system_status: SystemStatus,
    pub op_types: Vec<OpType>,
    pub aux_feed_active: bool,
}

impl StatusRecord {
    /// The "not yet known" record: all recorders idle, status error, and a
    /// timestamp 30 minutes in the past so it reads as stale.
    pub fn stale(recorder_count: usize) -> StatusRecord {
        StatusRecord {
            timestamp: Utc::now() - Duration::minutes(30),
            system_status: SystemStatus::Error,
            op_types: vec![OpType::Idle; recorder_count],
            aux_feed_active: false,
        }
    }

    pub fn recorder_count(&self) -> usize {
        self.op_types.len()
    }
}
