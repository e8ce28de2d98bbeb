use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Events applied between two aggregation passes unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 20;

pub const ENV_BATCH_SIZE: &str = "SCOREFOLD_BATCH_SIZE";
pub const ENV_SOURCE_ADDR: &str = "SCOREFOLD_SOURCE_ADDR";
pub const ENV_EVENT_NAME: &str = "SCOREFOLD_EVENT_NAME";

/// Externally supplied settings for the ingest pipeline.
///
/// # Examples
///
/// ```
/// use scorefold::Config;
///
/// let config = Config::builder()
///     .batch_size(50)
///     .event_name("score")
///     .build()
///     .unwrap();
/// assert_eq!(config.batch_size, 50);
/// assert_eq!(config.event_name.as_deref(), Some("score"));
///
/// assert!(Config::builder().batch_size(0).build().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Applied events between two recompute-and-snapshot passes.
    pub batch_size: usize,

    /// Address of the upstream event stream. Opaque to this crate; the
    /// embedding binary decides how to connect to it.
    pub source_addr: Option<String>,

    /// Only SSE frames with this event name are ingested. `None` accepts
    /// every frame.
    pub event_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            batch_size: DEFAULT_BATCH_SIZE,
            source_addr: None,
            event_name: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Defaults overridden by `SCOREFOLD_BATCH_SIZE`, `SCOREFOLD_SOURCE_ADDR`
    /// and `SCOREFOLD_EVENT_NAME` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the batch size is not a positive
    /// integer.
    pub fn from_env() -> Result<Self, Error> {
        Config::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env), reading from the given
    /// key/value pairs instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = Config::builder();
        for (key, value) in vars {
            match key.as_ref() {
                ENV_BATCH_SIZE => {
                    let value: String = value.into();
                    let size = value.trim().parse::<usize>().map_err(|e| {
                        Error::InvalidConfig(format!("{ENV_BATCH_SIZE}={value:?}: {e}"))
                    })?;
                    builder = builder.batch_size(size);
                }
                ENV_SOURCE_ADDR => builder = builder.source_addr(value),
                ENV_EVENT_NAME => builder = builder.event_name(value),
                _ => {}
            }
        }
        builder.build()
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero batch size.
    pub fn validate(&self) -> Result<(), Error> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn source_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.source_addr = Some(addr.into());
        self
    }

    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.config.event_name = Some(name.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero batch size.
    pub fn build(self) -> Result<Config, Error> {
        self.config.validate()?;
        Ok(self.config)
    }
}
