//! Tag vocabulary shared by classifiers, the scoring weights and the state
//! machine's routing rules.

pub const CLOSING_INTENT: &str = "CLOSING_INTENT";
pub const OWN_THEFT: &str = "OWN_THEFT";
pub const QUOTE_REQUEST: &str = "QUOTE_REQUEST";
pub const REGIONAL_INSECURITY: &str = "REGIONAL_INSECURITY";
pub const OPERATIONAL_LOSS: &str = "OPERATIONAL_LOSS";
pub const PREVENTION: &str = "PREVENTION";
pub const QUANTITY_GIVEN: &str = "QUANTITY_GIVEN";
pub const PRICE_OBJECTION: &str = "PRICE_OBJECTION";
pub const GENERAL_INFO_REQUEST: &str = "GENERAL_INFO_REQUEST";
pub const VIDEO_REQUEST: &str = "VIDEO_REQUEST";
pub const DEFERRAL_OBJECTION: &str = "DEFERRAL_OBJECTION";
pub const DELIVERY_TIMELINE_QUESTION: &str = "DELIVERY_TIMELINE_QUESTION";
pub const GREETING: &str = "GREETING";
pub const CURIOSITY_ONLY: &str = "CURIOSITY_ONLY";
pub const COMPETITOR_MENTIONED: &str = "COMPETITOR_MENTIONED";
pub const OUT_OF_SCOPE: &str = "OUT_OF_SCOPE";

/// Every tag a classifier is asked to choose from.
pub const ALL: &[&str] = &[
    CLOSING_INTENT,
    OWN_THEFT,
    QUOTE_REQUEST,
    REGIONAL_INSECURITY,
    OPERATIONAL_LOSS,
    PREVENTION,
    QUANTITY_GIVEN,
    PRICE_OBJECTION,
    GENERAL_INFO_REQUEST,
    VIDEO_REQUEST,
    DEFERRAL_OBJECTION,
    DELIVERY_TIMELINE_QUESTION,
    GREETING,
    CURIOSITY_ONLY,
    COMPETITOR_MENTIONED,
    OUT_OF_SCOPE,
];
