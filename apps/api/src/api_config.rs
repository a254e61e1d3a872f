use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use grantwatch_application::{ActivityWindowPolicy, GenerationConfig};
use grantwatch_core::AppError;
use tracing_subscriber::EnvFilter;

/// Exit status for invalid configuration (`EX_CONFIG`).
pub const CONFIGURATION_EXIT_CODE: u8 = 78;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRuntimeConfig {
    pub location: String,
    pub model: String,
    pub generation: GenerationConfig,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationProviderConfig {
    Integration {
        trigger_id: String,
        max_attempts: u8,
        retry_backoff_ms: u64,
    },
    Console,
}

/// How fatal non-decode failures are reported to the push transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureResponseMode {
    /// Always acknowledge with 200.
    #[default]
    Acknowledge,
    /// Answer 503 when the failure was transient so the event is redelivered.
    Redeliver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub project_id: String,
    pub region: String,
    pub summary_recipient: String,
    pub summary: SummaryRuntimeConfig,
    pub notification_provider: NotificationProviderConfig,
    pub activity_window_policy: ActivityWindowPolicy,
    pub failure_response_mode: FailureResponseMode,
    pub upstream_timeout_seconds: u64,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reader = EnvReader { lookup };

        let project_id = reader.required("PROJECT_ID")?;
        let region = reader.required("REGION")?;
        let summary_recipient = reader.required("SUMMARY_RECIPIENT")?;

        let api_host = reader.optional("API_HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let api_port = reader.parsed("PORT", 8080_u16)?;

        let defaults = GenerationConfig::default();
        let temperature = reader.parsed("SUMMARY_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Configuration(format!(
                "SUMMARY_TEMPERATURE must be between 0 and 2, got {temperature}"
            )));
        }
        let top_p = reader.parsed("SUMMARY_TOP_P", defaults.top_p)?;
        if !(top_p > 0.0 && top_p <= 1.0) {
            return Err(AppError::Configuration(format!(
                "SUMMARY_TOP_P must be in (0, 1], got {top_p}"
            )));
        }
        let summary = SummaryRuntimeConfig {
            location: reader
                .optional("SUMMARY_LOCATION")
                .unwrap_or_else(|| "us-central1".to_owned()),
            model: reader
                .optional("SUMMARY_MODEL")
                .unwrap_or_else(|| grantwatch_infrastructure::DEFAULT_MODEL.to_owned()),
            generation: GenerationConfig {
                max_output_tokens: reader
                    .parsed("SUMMARY_MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
                temperature,
                top_p,
            },
            timeout_seconds: reader.positive("SUMMARY_TIMEOUT_SECONDS", 120)?,
        };

        let notification_provider = match reader
            .optional("NOTIFICATION_PROVIDER")
            .unwrap_or_else(|| "integration".to_owned())
            .as_str()
        {
            "integration" => NotificationProviderConfig::Integration {
                trigger_id: reader.optional("NOTIFICATION_TRIGGER_ID").unwrap_or_else(|| {
                    grantwatch_infrastructure::DEFAULT_TRIGGER_ID.to_owned()
                }),
                max_attempts: reader.parsed("NOTIFICATION_MAX_ATTEMPTS", 1_u8)?.max(1),
                retry_backoff_ms: reader.parsed("NOTIFICATION_RETRY_BACKOFF_MS", 500_u64)?,
            },
            "console" => NotificationProviderConfig::Console,
            other => {
                return Err(AppError::Configuration(format!(
                    "NOTIFICATION_PROVIDER must be either 'integration' or 'console', got '{other}'"
                )));
            }
        };

        let activity_window_policy = match reader.optional("ACTIVITY_WINDOW_POLICY") {
            Some(value) => ActivityWindowPolicy::parse(&value)?,
            None => ActivityWindowPolicy::default(),
        };

        let failure_response_mode = match reader
            .optional("FAILURE_RESPONSE_MODE")
            .unwrap_or_else(|| "acknowledge".to_owned())
            .as_str()
        {
            "acknowledge" => FailureResponseMode::Acknowledge,
            "redeliver" => FailureResponseMode::Redeliver,
            other => {
                return Err(AppError::Configuration(format!(
                    "FAILURE_RESPONSE_MODE must be either 'acknowledge' or 'redeliver', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            project_id,
            region,
            summary_recipient,
            summary,
            notification_provider,
            activity_window_policy,
            failure_response_mode,
            upstream_timeout_seconds: reader.positive("UPSTREAM_TIMEOUT_SECONDS", 30)?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Configuration(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    // Blank values count as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, AppError> {
        self.optional(name)
            .ok_or_else(|| AppError::Configuration(format!("{name} is required")))
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(name) {
            Some(value) => value
                .parse::<T>()
                .map_err(|error| AppError::Configuration(format!("invalid {name}: {error}"))),
            None => Ok(default),
        }
    }

    fn positive(&self, name: &str, default: u64) -> Result<u64, AppError> {
        let value = self.parsed(name, default)?;
        if value == 0 {
            return Err(AppError::Configuration(format!(
                "{name} must be greater than zero"
            )));
        }

        Ok(value)
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
