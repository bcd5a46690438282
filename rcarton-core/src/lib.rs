//! Entry point for hosts: feed panels, optionally pin the driven map, root
//! or fold order, then read back the rig and a pose for any fold progress.
//!
//! ```
//! use rcarton_core::{FoldConfig, FoldSimulation};
//! use rcarton_model::Panel;
//!
//! let mut simulation = FoldSimulation::new(FoldConfig::default()).unwrap();
//! simulation.set_panels(vec![
//!     Panel::new("A", 0.0, 0.0, 100.0, 50.0),
//!     Panel::new("B", 100.0, 0.0, 100.0, 50.0),
//! ]);
//! simulation.set_fold_progress(0.5);
//! let rig = simulation.rig().unwrap();
//! assert_eq!(rig.skeleton().len(), 3);
//! ```

pub mod cache;
pub mod config;
pub mod simulation;

pub use cache::{evict, InMemoryCache, ResourceCache};
pub use config::{ConfigError, FoldConfig};
pub use simulation::{FoldSimulation, Invalidation, SimulationError};

pub use rcarton_layout::{AutoFoldSequence, SiblingMode};
pub use rcarton_rig::{FoldRig, Pose};
