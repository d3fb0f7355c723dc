//! Snapfit Core - Socket/plug docking engine and connection registry
//!
//! This crate provides the engine-independent part of Snapfit:
//! - Rigid transforms built on `bevy_math` double precision types
//! - Sockets and plugs with their connection state machines
//! - The docking engine that corrects a dragged plug's transform
//! - The assembly registry that applies docking results and reports seating
//! - Completion sequencing (seating progress, cutaway reveal)
//! - TOML assembly descriptions

pub mod assembly;
pub mod description;
pub mod docking;
pub mod feedback;
pub mod plug;
pub mod sequence;
pub mod socket;
pub mod xfo;

pub use assembly::{Assembly, AssemblySnapshot, DockingReport, PlugSnapshot, SocketSnapshot};
pub use description::{AssemblyDescription, DescriptionError, SocketDescription};
pub use docking::{dock, test_socket, DockingOutcome, Rejection, SocketFit, Transition};
pub use feedback::{Feedback, FeedbackSink, HighlightRequest, HighlightState, Rgba};
pub use plug::{Plug, PlugId, PlugParams, PlugState};
pub use sequence::{CutawayReveal, SeatingProgress};
pub use socket::{ConnectionMode, Plugged, Socket, SocketId, SocketParams};
pub use xfo::{angle_between, Xfo};
