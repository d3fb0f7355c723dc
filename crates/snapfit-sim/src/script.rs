//! Drag scripts: recorded candidate transforms replayed against an assembly

use anyhow::{bail, Result};
use bevy_math::DVec3;
use serde::{Deserialize, Serialize};
use snapfit_core::Xfo;
use std::path::Path;
use tracing::{debug, info};

use crate::session::Session;

/// One drag sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Plug name
    pub plug: String,
    /// Candidate position in world space
    pub position: [f64; 3],
    /// Candidate insertion axis; keeps the plug's orientation when absent
    #[serde(default)]
    pub direction: Option<[f64; 3]>,
    #[serde(default)]
    pub up: Option<[f64; 3]>,
    /// Enable the plug before this step
    #[serde(default)]
    pub activate: bool,
}

impl ScriptStep {
    /// Candidate transform for a plug currently at `current`
    pub fn candidate(&self, current: &Xfo) -> Xfo {
        let position = DVec3::from_array(self.position);
        let mut xfo = match self.direction {
            Some(direction) => Xfo::from_direction_and_up(
                position,
                DVec3::from_array(direction),
                DVec3::from_array(self.up.unwrap_or([1.0, 0.0, 0.0])),
            ),
            None => Xfo::new(position, current.rotation),
        };
        xfo.scale = current.scale;
        xfo
    }
}

/// A drag script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Replay every step of `script` in order
pub fn run_script(session: &mut Session, script: &Script) -> Result<()> {
    info!(steps = script.steps.len(), "Replaying drag script");

    for (index, step) in script.steps.iter().enumerate() {
        let Some(plug) = session.assembly().plug_by_name(&step.plug) else {
            bail!("Step {}: unknown plug {}", index + 1, step.plug);
        };
        let id = plug.id();
        let candidate = step.candidate(plug.xfo());

        if step.activate {
            session.activate_plug(id);
        }
        let report = session.drag(id, candidate);
        debug!(
            step = index + 1,
            plug = %step.plug,
            transition = ?report.transition,
            "Script step applied"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapfit_core::{AssemblyDescription, PlugState};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BORE: &str = r#"
name = "bore"

[[socket]]
name = "bore"
position = [0.0, 0.0, 0.0]
radius = 0.25
slide_dist = 1.0
start = [3.0, 0.0, 0.0]
enabled = false
"#;

    const SCRIPT: &str = r#"
[[step]]
plug = "borePlug"
position = [0.0, 0.0, 1.1]
activate = true

[[step]]
plug = "borePlug"
position = [0.1, 0.0, 0.5]

[[step]]
plug = "borePlug"
position = [0.0, 0.0, 0.1]
"#;

    fn session() -> Session {
        let assembly = AssemblyDescription::from_toml(BORE).unwrap().build().unwrap();
        Session::new(assembly, false)
    }

    #[test]
    fn test_replay_seats_plug() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();
        let script = Script::from_file(file.path()).unwrap();
        assert_eq!(script.steps.len(), 3);

        let mut session = session();
        run_script(&mut session, &script).unwrap();

        let plug = session.assembly().plug_by_name("borePlug").unwrap();
        assert!(matches!(plug.state(), PlugState::Connected(_)));
        assert_eq!(session.stats().plugged_events, 1);
        assert!(session.stats().completed);
    }

    #[test]
    fn test_unknown_plug_fails() {
        let script = Script::from_toml("[[step]]\nplug = \"nope\"\nposition = [0.0, 0.0, 0.0]\n").unwrap();
        let err = run_script(&mut session(), &script).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_candidate_orientation() {
        let current = Xfo::from_direction_and_up(DVec3::ZERO, DVec3::Y, DVec3::Z);
        let step = ScriptStep {
            plug: "p".to_string(),
            position: [1.0, 2.0, 3.0],
            direction: None,
            up: None,
            activate: false,
        };
        let candidate = step.candidate(&current);
        assert_eq!(candidate.rotation, current.rotation);
        assert_eq!(candidate.translation, DVec3::new(1.0, 2.0, 3.0));

        let step = ScriptStep {
            direction: Some([0.0, 0.0, -1.0]),
            ..step
        };
        assert!(step.candidate(&current).z_axis().distance(DVec3::NEG_Z) < 1e-12);
    }
}
