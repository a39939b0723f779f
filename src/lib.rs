//! In-memory clinic reservation system.
//!
//! Accounts live in a chained hash [`AccountDirectory`]; doctor identifiers are
//! indexed in an [`IdentifierTrie`] for prefix search. Sorted views are built
//! per query: a [`ChronoOrderedView`] (AVL tree) for one patient or one doctor,
//! a [`ReportHeap`] for the system-wide report.

pub mod clinic;
pub mod config;
pub mod directory;
pub mod display;
pub mod error;
pub mod menu;
pub mod ordering;
pub mod store;
pub mod validation;

pub use clinic::{Clinic, DoctorListing, Session};
pub use config::ClinicConfig;
pub use directory::{Account, AccountDirectory, IdentifierTrie, Reservation, Role};
pub use error::{ClinicError, NotFoundKind, StoreError};
pub use menu::Console;
pub use ordering::{ChronoOrderedView, ReportHeap};
pub use store::CsvStore;
