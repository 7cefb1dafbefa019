//! Warm-start mirror of the enable/disable switches.
//!
//! Only the global switch and the six domain switches survive a restart;
//! baselines and cursors are always rebuilt from scratch. The mirror is a
//! small JSON file rewritten whenever a switch changes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwitchMirror {
    pub checksum_state: u16,
    /// `Domain::SCAN_ORDER` indexing.
    pub domain_states: [u16; 6],
}

impl SwitchMirror {
    /// Read a previously saved mirror. Absent or unreadable files mean a cold
    /// start, not an error.
    pub fn load(path: &str) -> Option<Self> {
        let raw = std::fs::read(path).ok()?;
        serde_json::from_slice(&raw).ok()
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let raw = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switches.json");
        let path = path.to_str().unwrap();

        let mirror = SwitchMirror {
            checksum_state: 2,
            domain_states: [1, 1, 2, 1, 2, 1],
        };
        mirror.save(path).unwrap();

        let restored = SwitchMirror::load(path).unwrap();
        assert_eq!(restored.checksum_state, 2);
        assert_eq!(restored.domain_states, [1, 1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_missing_file_is_cold_start() {
        assert!(SwitchMirror::load("/nonexistent/switches.json").is_none());
    }
}
