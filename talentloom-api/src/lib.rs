//! TalentLoom API - Remote Service Facade
//!
//! Typed async traits for every backend resource the dashboard reads and
//! writes, plus [`MockRecruitingApi`], the in-memory implementation used by
//! the demo and the test suites.

pub mod mock;
mod traits;

pub use mock::{CallLog, FaultInjector, LatencyProfile, MockRecruitingApi, Operation};
pub use traits::*;
