//! End-of-run report

use serde::Serialize;
use snapfit_core::AssemblySnapshot;

use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub assembly: AssemblySnapshot,
    pub complete: bool,
    pub drags: usize,
    pub pairings: usize,
    pub releases: usize,
    pub plugged_events: usize,
    pub error_highlights: usize,
    pub reveal_steps: u32,
    pub cut_plane_distance: Option<f64>,
    pub elapsed_ms: u128,
}

impl Report {
    pub fn from_session(session: &Session) -> Self {
        let stats = session.stats();
        Self {
            assembly: session.assembly().snapshot(),
            complete: stats.completed,
            drags: stats.drags,
            pairings: stats.pairings,
            releases: stats.releases,
            plugged_events: stats.plugged_events,
            error_highlights: stats.error_highlights,
            reveal_steps: stats.reveal_steps,
            cut_plane_distance: stats.cut_plane_distance,
            elapsed_ms: session.elapsed().as_millis(),
        }
    }

    /// Human readable summary on stdout
    pub fn print(&self) {
        println!(
            "Assembly {}: {}/{} plugs seated{}",
            self.assembly.name,
            self.assembly.seated,
            self.assembly.active,
            if self.complete { " (complete)" } else { "" }
        );
        for plug in &self.assembly.plugs {
            match &plug.socket {
                Some(socket) => println!("  - {} [{}] in {}", plug.name, plug.state, socket),
                None => println!("  - {} [{}]", plug.name, plug.state),
            }
        }
        println!(
            "Drags: {}  pairings: {}  releases: {}  plugged: {}  warnings: {}",
            self.drags, self.pairings, self.releases, self.plugged_events, self.error_highlights
        );
        if let Some(distance) = self.cut_plane_distance {
            println!(
                "Cutaway: {} steps, plane at {:.3}",
                self.reveal_steps, distance
            );
        }
        println!("Simulated time: {} ms", self.elapsed_ms);
    }
}
