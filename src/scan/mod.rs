//! Scan lifecycle
//!
//! ```text
//! LOCATING ──fix──► IDLE ──scan──► SEARCHING ──place────► RESULTS
//!    │               ▲                 ├──nothing───► IDLE
//!    └──failure──► ERROR ◄──failure────┘
//!
//! RESULTS / ERROR ──reset──► IDLE (fix known) | LOCATING (no fix)
//! ```

mod controller;
pub mod state;


pub use controller::ScanController;
pub use state::{
    MessageKind, ScanFault, ScanRejected, ScanSnapshot, ScanState, StatusMessage, TriggerAction,
};
