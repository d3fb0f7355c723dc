//! Simulation session: an assembly plus the feedback and sequencing state
//! a scene would keep around it

use snapfit_core::feedback::FeedbackSink;
use snapfit_core::{
    Assembly, CutawayReveal, DockingReport, Feedback, HighlightRequest, HighlightState, PlugId,
    Plugged, SeatingProgress, Transition, Xfo,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Simulated time between two drag samples
pub const FRAME: Duration = Duration::from_millis(16);

pub struct Session {
    assembly: Assembly,
    progress: SeatingProgress,
    highlights: Vec<HighlightState>,
    reveal_enabled: bool,
    reveal: Option<CutawayReveal>,
    elapsed: Duration,
    stats: SessionStats,
}

/// Counters collected while driving plugs
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub drags: usize,
    pub pairings: usize,
    pub releases: usize,
    pub plugged_events: usize,
    pub error_highlights: usize,
    pub completed: bool,
    pub reveal_steps: u32,
    pub cut_plane_distance: Option<f64>,
}

impl Session {
    pub fn new(assembly: Assembly, reveal_enabled: bool) -> Self {
        let progress = SeatingProgress::for_active_plugs(&assembly);
        let highlights = vec![HighlightState::new(); assembly.plugs().len()];
        Self {
            assembly,
            progress,
            highlights,
            reveal_enabled,
            reveal: None,
            elapsed: Duration::ZERO,
            stats: SessionStats::default(),
        }
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Enable a plug and start tracking its home socket
    pub fn activate_plug(&mut self, plug: PlugId) -> bool {
        if !self.assembly.activate_plug(plug) {
            return false;
        }
        self.refresh_progress();
        true
    }

    /// Enable every disabled plug
    pub fn activate_all(&mut self) -> usize {
        let ids: Vec<PlugId> = self.assembly.plugs().iter().map(|p| p.id()).collect();
        let activated = ids
            .into_iter()
            .filter(|id| self.assembly.activate_plug(*id))
            .count();
        if activated > 0 {
            info!(activated, "Activated disabled plugs");
            self.refresh_progress();
        }
        activated
    }

    /// Rebuild progress for the current set of active plugs, keeping the
    /// sockets that are already filled
    fn refresh_progress(&mut self) {
        let mut progress = SeatingProgress::for_active_plugs(&self.assembly);
        for socket in self.assembly.sockets() {
            if let (true, Some(plug)) = (socket.is_connected(), socket.connected_plug()) {
                progress.on_plugged(&Plugged {
                    socket: socket.id(),
                    plug,
                });
            }
        }
        self.progress = progress;
    }

    /// Feed one candidate transform for a plug, as a drag sample
    pub fn drag(&mut self, plug: PlugId, candidate: Xfo) -> DockingReport {
        let report = self.assembly.clean_global_xfo(plug, candidate);
        self.stats.drags += 1;

        match report.transition {
            Some(Transition::Paired(_)) => self.stats.pairings += 1,
            Some(Transition::Released(_)) => self.stats.releases += 1,
            Some(Transition::Seated(_)) | None => {}
        }

        if let Some(feedback) = report.feedback {
            if feedback == Feedback::Highlight(HighlightRequest::error()) {
                self.stats.error_highlights += 1;
            }
            if let Some(state) = self.highlights.get_mut(plug.0) {
                state.feedback(feedback);
            }
        }

        if let Some(event) = report.plugged {
            self.stats.plugged_events += 1;
            if self.progress.on_plugged(&event) {
                self.on_complete();
            }
        }

        self.advance(FRAME);
        report
    }

    fn on_complete(&mut self) {
        info!(
            assembly = %self.assembly.name(),
            seated = self.assembly.seated_count(),
            "Assembly complete"
        );
        self.stats.completed = true;
        for state in &mut self.highlights {
            state.feedback(Feedback::Highlight(HighlightRequest::seated()));
        }
        if self.reveal_enabled {
            let reveal = CutawayReveal::default();
            self.stats.cut_plane_distance = Some(reveal.value());
            self.reveal = Some(reveal);
        }
    }

    /// Advance the simulated clock
    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
        for (index, state) in self.highlights.iter_mut().enumerate() {
            if state.tick(delta) {
                debug!(plug = index, "Highlight cleared");
            }
        }
        if let Some(reveal) = self.reveal.as_mut() {
            if let Some(distance) = reveal.tick(delta) {
                self.stats.cut_plane_distance = Some(distance);
                self.stats.reveal_steps = reveal.steps();
            }
            if reveal.is_finished() {
                info!(steps = reveal.steps(), "Cutaway reveal finished");
                self.reveal = None;
            }
        }
    }

    /// Let pending highlights and the reveal run out
    pub fn finish(&mut self) {
        // reveal and highlights are bounded; cap the loop anyway
        for _ in 0..10_000 {
            let highlighted = self.highlights.iter().any(HighlightState::is_enabled);
            if self.reveal.is_none() && !highlighted {
                return;
            }
            self.advance(FRAME);
        }
        warn!("Session did not settle");
    }
}
