//! Background tasks behind the scheduler.
//!
//! The timer task fires on the configured cadence and hands each claimed fire
//! to a cycle task, which runs the pipeline and publishes the outcome.

mod cycle;
mod timer;

pub(crate) use cycle::Pipeline;
pub(crate) use timer::spawn_timer;
