//! Engine configuration.
//!
//! [`EngineConfig`] is an immutable value handed to the state machine, the
//! scorer, the escalation notifier and the decay job. Nothing in the engine
//! reads ambient global state.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use brain_core::tags;

use crate::error::OrchestratorError;
use crate::quote::Pricing;

/// Default hot-lead alert threshold.
pub const DEFAULT_HOT_LEAD_THRESHOLD: i64 = 40;

/// How quoting collects equipment counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteFlow {
    /// Ask one quantity question.
    Generic,
    /// Ask for pivots, then for pumps.
    Split,
}

impl QuoteFlow {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "generic" => Some(QuoteFlow::Generic),
            "split" => Some(QuoteFlow::Split),
            _ => None,
        }
    }
}

/// Default tag weights.
pub fn default_tag_weights() -> BTreeMap<String, i64> {
    [
        (tags::CLOSING_INTENT, 50),
        (tags::OWN_THEFT, 25),
        (tags::QUOTE_REQUEST, 20),
        (tags::OPERATIONAL_LOSS, 20),
        (tags::REGIONAL_INSECURITY, 15),
        (tags::QUANTITY_GIVEN, 10),
        (tags::PRICE_OBJECTION, 10),
        (tags::PREVENTION, 10),
        (tags::GENERAL_INFO_REQUEST, 5),
        (tags::VIDEO_REQUEST, 5),
        (tags::DEFERRAL_OBJECTION, 2),
        (tags::GREETING, 1),
        (tags::CURIOSITY_ONLY, -15),
        (tags::COMPETITOR_MENTIONED, -5),
        (tags::OUT_OF_SCOPE, -20),
    ]
    .into_iter()
    .map(|(tag, weight)| (tag.to_string(), weight))
    .collect()
}

/// Parse `TAG=weight,TAG=weight` overrides.
pub fn parse_tag_weights(raw: &str) -> Result<BTreeMap<String, i64>, OrchestratorError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (tag, weight) = entry.split_once('=').ok_or_else(|| {
                OrchestratorError::Configuration(format!("tag weight '{}' is not TAG=weight", entry))
            })?;
            let weight = weight.trim().parse::<i64>().map_err(|_| {
                OrchestratorError::Configuration(format!("tag weight '{}' is not an integer", entry))
            })?;
            Ok((tag.trim().to_uppercase(), weight))
        })
        .collect()
}

/// Configuration for the conversation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tag → score weight.
    pub tag_weights: BTreeMap<String, i64>,
    /// Score at which the one-time hot-lead alert fires.
    pub hot_lead_threshold: i64,
    /// Points removed per idle day by the decay job.
    pub decay_rate_per_day: i64,
    /// Idle days before follow-up #1.
    pub first_follow_up_days: i64,
    /// Idle days before follow-up #2.
    pub second_follow_up_days: i64,
    /// Unit, installation and monthly prices.
    pub pricing: Pricing,
    /// Quantity collection style.
    pub quote_flow: QuoteFlow,
    /// Transport id of the demo video, if one is configured.
    pub demo_video: Option<String>,
    /// Manufacturing and delivery lead time, quoted to customers.
    pub delivery_lead_time: String,
    /// History entries given to the classifier and generator.
    pub prompt_history: usize,
    pub classify_timeout: Duration,
    pub generate_timeout: Duration,
    pub notify_timeout: Duration,
    pub send_timeout: Duration,
    /// Pause between follow-up sends.
    pub send_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tag_weights: default_tag_weights(),
            hot_lead_threshold: DEFAULT_HOT_LEAD_THRESHOLD,
            decay_rate_per_day: 1,
            first_follow_up_days: 3,
            second_follow_up_days: 7,
            pricing: Pricing::default(),
            quote_flow: QuoteFlow::Generic,
            demo_video: None,
            delivery_lead_time: "30 days".to_string(),
            prompt_history: 10,
            classify_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(45),
            notify_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            send_delay: Duration::from_secs(1),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, OrchestratorError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| OrchestratorError::Configuration(format!("{} is invalid: {}", name, value))),
        Err(_) => Ok(None),
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `TAG_WEIGHTS` - `TAG=weight` overrides, comma separated
    /// - `HOT_LEAD_THRESHOLD` - Hot-lead alert threshold (default: 40)
    /// - `DECAY_RATE_PER_DAY` - Score points lost per idle day (default: 1)
    /// - `UNIT_PRICE` - Equipment price per unit (default: 11900)
    /// - `INSTALL_PRICE` - Installation price per unit (default: 2500)
    /// - `MONTHLY_FEE` - Monitoring fee per unit and month (default: 150)
    /// - `QUOTE_FLOW` - `generic` or `split` (default: generic)
    /// - `DEMO_VIDEO_FILE_ID` - Demo video asset id (default: none)
    /// - `DELIVERY_LEAD_TIME` - Lead time text (default: "30 days")
    /// - `CLASSIFY_TIMEOUT_SECS` / `GENERATE_TIMEOUT_SECS` / `NOTIFY_TIMEOUT_SECS`
    /// - `FOLLOW_UP_SEND_DELAY_MS` - Delay between follow-up sends (default: 1000)
    pub fn from_env() -> Result<Self, OrchestratorError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("TAG_WEIGHTS") {
            config.tag_weights.extend(parse_tag_weights(&raw)?);
        }
        if let Some(threshold) = parse_var("HOT_LEAD_THRESHOLD")? {
            config.hot_lead_threshold = threshold;
        }
        if let Some(rate) = parse_var::<i64>("DECAY_RATE_PER_DAY")? {
            config.decay_rate_per_day = rate.max(0);
        }
        if let Some(price) = parse_var("UNIT_PRICE")? {
            config.pricing.unit_price = price;
        }
        if let Some(price) = parse_var("INSTALL_PRICE")? {
            config.pricing.install_price = price;
        }
        if let Some(fee) = parse_var("MONTHLY_FEE")? {
            config.pricing.monthly_fee = fee;
        }
        if let Ok(flow) = env::var("QUOTE_FLOW") {
            config.quote_flow = QuoteFlow::parse(&flow).ok_or_else(|| {
                OrchestratorError::Configuration(format!("QUOTE_FLOW is invalid: {}", flow))
            })?;
        }
        config.demo_video = env::var("DEMO_VIDEO_FILE_ID")
            .ok()
            .filter(|id| !id.trim().is_empty());
        if let Ok(lead_time) = env::var("DELIVERY_LEAD_TIME") {
            config.delivery_lead_time = lead_time;
        }
        if let Some(secs) = parse_var("CLASSIFY_TIMEOUT_SECS")? {
            config.classify_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var("GENERATE_TIMEOUT_SECS")? {
            config.generate_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var("NOTIFY_TIMEOUT_SECS")? {
            config.notify_timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_var("FOLLOW_UP_SEND_DELAY_MS")? {
            config.send_delay = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Create a new config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Weight of `tag`, 0 for tags outside the table.
    pub fn weight(&self, tag: &str) -> i64 {
        self.tag_weights.get(tag).copied().unwrap_or(0)
    }
}

/// Builder for EngineConfig.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn tag_weight(mut self, tag: impl Into<String>, weight: i64) -> Self {
        self.config.tag_weights.insert(tag.into(), weight);
        self
    }

    pub fn tag_weights(mut self, weights: BTreeMap<String, i64>) -> Self {
        self.config.tag_weights = weights;
        self
    }

    pub fn hot_lead_threshold(mut self, threshold: i64) -> Self {
        self.config.hot_lead_threshold = threshold;
        self
    }

    pub fn decay_rate_per_day(mut self, rate: i64) -> Self {
        self.config.decay_rate_per_day = rate.max(0);
        self
    }

    pub fn pricing(mut self, pricing: Pricing) -> Self {
        self.config.pricing = pricing;
        self
    }

    pub fn quote_flow(mut self, flow: QuoteFlow) -> Self {
        self.config.quote_flow = flow;
        self
    }

    pub fn demo_video(mut self, file_id: impl Into<String>) -> Self {
        self.config.demo_video = Some(file_id.into());
        self
    }

    pub fn delivery_lead_time(mut self, lead_time: impl Into<String>) -> Self {
        self.config.delivery_lead_time = lead_time.into();
        self
    }

    pub fn classify_timeout(mut self, timeout: Duration) -> Self {
        self.config.classify_timeout = timeout;
        self
    }

    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout = timeout;
        self
    }

    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.config.notify_timeout = timeout;
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    pub fn send_delay(mut self, delay: Duration) -> Self {
        self.config.send_delay = delay;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.hot_lead_threshold, 40);
        assert_eq!(config.weight(tags::CLOSING_INTENT), 50);
        assert_eq!(config.weight(tags::OUT_OF_SCOPE), -20);
        assert_eq!(config.weight("UNKNOWN_TAG"), 0);
        assert_eq!(config.pricing.unit_price, 11_900.0);
        assert_eq!(config.quote_flow, QuoteFlow::Generic);
        assert!(config.demo_video.is_none());
    }

    #[test]
    fn test_parse_tag_weights() {
        let weights = parse_tag_weights("greeting=3, OWN_THEFT=-1,").unwrap();
        assert_eq!(weights.get("GREETING"), Some(&3));
        assert_eq!(weights.get("OWN_THEFT"), Some(&-1));

        assert!(matches!(
            parse_tag_weights("GREETING"),
            Err(OrchestratorError::Configuration(_))
        ));
        assert!(parse_tag_weights("GREETING=lots").is_err());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::builder()
            .hot_lead_threshold(10)
            .decay_rate_per_day(-3)
            .tag_weight("CUSTOM", 7)
            .demo_video("video-1")
            .quote_flow(QuoteFlow::Split)
            .build();

        assert_eq!(config.hot_lead_threshold, 10);
        assert_eq!(config.decay_rate_per_day, 0);
        assert_eq!(config.weight("CUSTOM"), 7);
        assert_eq!(config.demo_video.as_deref(), Some("video-1"));
        assert_eq!(config.quote_flow, QuoteFlow::Split);
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        fn clear_vars() {
            for name in [
                "TAG_WEIGHTS",
                "HOT_LEAD_THRESHOLD",
                "DECAY_RATE_PER_DAY",
                "UNIT_PRICE",
                "QUOTE_FLOW",
                "DEMO_VIDEO_FILE_ID",
            ] {
                std::env::remove_var(name);
            }
        }

        clear_vars();
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.hot_lead_threshold, DEFAULT_HOT_LEAD_THRESHOLD);

        std::env::set_var("TAG_WEIGHTS", "GREETING=4");
        std::env::set_var("HOT_LEAD_THRESHOLD", "55");
        std::env::set_var("UNIT_PRICE", "10000");
        std::env::set_var("QUOTE_FLOW", "split");
        std::env::set_var("DEMO_VIDEO_FILE_ID", "abc");
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.weight(tags::GREETING), 4);
        assert_eq!(config.weight(tags::CLOSING_INTENT), 50);
        assert_eq!(config.hot_lead_threshold, 55);
        assert_eq!(config.pricing.unit_price, 10_000.0);
        assert_eq!(config.quote_flow, QuoteFlow::Split);
        assert_eq!(config.demo_video.as_deref(), Some("abc"));

        clear_vars();
        std::env::set_var("HOT_LEAD_THRESHOLD", "many");
        assert!(EngineConfig::from_env().is_err());

        clear_vars();
    }
}
