//! State management module
//!
//! This module contains the step counter state, its serialized state
//! machine, and the render schedule state.

pub mod render_state;
pub mod step_machine;
pub mod step_state;

// Re-export main types
pub use render_state::{RenderScheduleState, SchedulePhase, UpdatePeriods};
pub use step_machine::StepStateMachine;
pub use step_state::{StepCounterState, StepEvent};
