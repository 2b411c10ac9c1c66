//! Engine constants shared between the planner, the utilization tracker,
//! and the flow-table builder.

/// Utilization charged to every link of an active primary path.
pub const UTILIZATION_UNIT: u32 = 10;

/// How many candidate paths the planner ranks per flow.
pub const DEFAULT_CANDIDATES: usize = 4;

/// Flow-table priority for critical flows.
pub const PRIO_CRITICAL: u8 = 100;

/// Flow-table priority for non-critical flows.
pub const PRIO_NORMAL: u8 = 10;

/// Backup entries sit this far below their flow's primary layer, so a
/// switch can tell standby rules from active ones.
pub const BACKUP_PRIO_STEP: u8 = 5;
