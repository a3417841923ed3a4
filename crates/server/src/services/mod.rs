//! Business services: provisioning and shipment processing.
//!
//! Services own a pool handle and a platform client and are constructed per
//! request from [`crate::state::AppState`]. Remote loops are sequential and
//! partial-failure tolerant: a failed (application, plan) pair is collected
//! and reported, never rolled back.

pub mod campaigns;
pub mod plans;
pub mod shipments;

pub use campaigns::CampaignService;
pub use plans::PlanService;
pub use shipments::ShipmentProcessor;
