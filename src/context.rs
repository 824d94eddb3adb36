use crate::config::ProjectorConfig;
use crate::error::Result;
use crate::logging::{LogLevel, Logger};

/// Process-wide collaborators, built once at start-up and passed to whoever needs them.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: ProjectorConfig,
    pub logger: Logger,
}

impl AppContext {
    pub fn new(config: ProjectorConfig, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Logger activation comes from the config; configured database roots are shortened
    /// to `$INPUT_ROOT` / `$OUTPUT_ROOT` in messages.
    pub fn from_config(config: ProjectorConfig) -> Result<Self> {
        let mut logger = Logger::new(config.log_level()?);
        if let Some(root) = &config.database.input_root {
            logger = logger.with_substitution(root.display().to_string(), "$INPUT_ROOT");
        }
        if let Some(root) = &config.database.output_root {
            logger = logger.with_substitution(root.display().to_string(), "$OUTPUT_ROOT");
        }
        Ok(Self { config, logger })
    }

    #[track_caller]
    pub fn log(&self, message: &str, level: LogLevel) {
        self.logger.log(message, level, 1, true);
    }
}
