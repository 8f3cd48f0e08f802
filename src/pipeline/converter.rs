//! External voice conversion
//!
//! Timbre conversion is delegated to a separate tool that works file to
//! file. [`RvcCommandConverter`] drives an RVC-WebUI checkout through its
//! inference script.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::config::RvcConfig;
use crate::engine::ensure_exists;
use crate::error::{HitmixError, Result};

/// Inference entry point inside an RVC-WebUI checkout
pub const RVC_SCRIPT: &str = "infer-web.py";

/// A file-to-file voice converter
pub trait VoiceConverter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Convert `source` into `output`, returning the written path
    fn convert(&self, source: &Path, output: &Path) -> Result<PathBuf>;
}

/// Runs `python <rvc_root>/infer-web.py` as a subprocess
#[derive(Debug, Clone)]
pub struct RvcCommandConverter {
    rvc_root: PathBuf,
    python_bin: String,
    config_name: String,
    f0_method: String,
    voice_model: Option<PathBuf>,
    index_path: Option<PathBuf>,
}

impl RvcCommandConverter {
    pub fn new(rvc_root: impl Into<PathBuf>) -> Self {
        let defaults = RvcConfig::default();
        Self {
            rvc_root: rvc_root.into(),
            python_bin: defaults.python_bin,
            config_name: defaults.config_name,
            f0_method: defaults.f0_method,
            voice_model: None,
            index_path: None,
        }
    }

    /// Build from config; `None` when no RVC root is configured
    pub fn from_config(config: &RvcConfig) -> Option<Self> {
        let rvc_root = config.rvc_root.clone()?;
        Some(Self {
            rvc_root,
            python_bin: config.python_bin.clone(),
            config_name: config.config_name.clone(),
            f0_method: config.f0_method.clone(),
            voice_model: config.voice_model_path.clone(),
            index_path: config.index_path.clone(),
        })
    }

    pub fn with_voice_model(mut self, model: impl Into<PathBuf>) -> Self {
        self.voice_model = Some(model.into());
        self
    }

    pub fn with_python_bin(mut self, python_bin: impl Into<String>) -> Self {
        self.python_bin = python_bin.into();
        self
    }

    pub fn rvc_root(&self) -> &Path {
        &self.rvc_root
    }

    pub fn script_path(&self) -> PathBuf {
        self.rvc_root.join(RVC_SCRIPT)
    }

    /// Copy the voice model into `<rvc_root>/weights` unless already there
    ///
    /// A configured model that does not exist on disk is skipped.
    pub fn install_voice_model(&self) -> Result<Option<PathBuf>> {
        let Some(model) = self.voice_model.as_deref() else {
            return Ok(None);
        };
        if !model.is_file() {
            debug!("Voice model {} not found; skipping install", model.display());
            return Ok(None);
        }
        let Some(file_name) = model.file_name() else {
            return Ok(None);
        };

        let weights_dir = self.rvc_root.join("weights");
        fs::create_dir_all(&weights_dir)?;
        let target = weights_dir.join(file_name);
        if !target.exists() {
            fs::copy(model, &target)?;
            info!("Copied voice model to {}", target.display());
        }
        Ok(Some(target))
    }

    /// The inference command for one conversion
    pub fn command(&self, source: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(self.script_path())
            .arg("--f0p")
            .arg(&self.f0_method)
            .arg("--path")
            .arg(source)
            .arg("--opt")
            .arg(&self.config_name)
            .arg("--out")
            .arg(output);
        if let Some(index) = &self.index_path {
            cmd.arg("--index").arg(index);
        }
        cmd
    }
}

impl VoiceConverter for RvcCommandConverter {
    fn name(&self) -> &str {
        "rvc"
    }

    fn convert(&self, source: &Path, output: &Path) -> Result<PathBuf> {
        ensure_exists(source)?;
        let script = self.script_path();
        if !script.is_file() {
            return Err(HitmixError::ConverterError {
                reason: format!("RVC-WebUI not found at {}", self.rvc_root.display()),
            });
        }

        self.install_voice_model()?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut cmd = self.command(source, output);
        debug!("Running {:?}", cmd);
        let status = cmd.status().map_err(|e| HitmixError::ConverterError {
            reason: format!("failed to launch {}: {}", self.python_bin, e),
        })?;
        if !status.success() {
            return Err(HitmixError::ConverterError {
                reason: format!("{} exited with {}", RVC_SCRIPT, status),
            });
        }
        if !output.is_file() {
            return Err(HitmixError::ConverterError {
                reason: format!("converter produced no file at {}", output.display()),
            });
        }

        info!("Converted vocals saved to {}", output.display());
        Ok(output.to_path_buf())
    }
}
