// src/config.rs

use crate::types::Config;
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fitting.frame_size == 0 {
            bail!("fitting.frame_size must be at least 1");
        }
        if self.fitting.gesture_span == 0 {
            bail!("fitting.gesture_span must be at least 1");
        }
        Ok(())
    }
}
