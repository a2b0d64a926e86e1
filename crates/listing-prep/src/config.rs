//! Configuration types for the listing pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The defaults reproduce the reseller listing rules: a flat handling cost,
//! a 35% markup for the retail price, a further 35% for the max price, and
//! the fixed quantity and location written on every row.

use serde::{Deserialize, Serialize};

/// Configuration for the listing pipeline.
///
/// Use [`ProcessingConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use listing_prep::config::ProcessingConfig;
///
/// let config = ProcessingConfig::builder()
///     .handling_cost(0.75)
///     .retail_markup(1.35)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Handling cost added to every record before markup.
    /// Default: 0.75
    pub handling_cost: f64,

    /// Multiplier applied to cost + shipping + handling for the retail price.
    /// Default: 1.35
    pub retail_markup: f64,

    /// Multiplier applied to the retail price for the max price.
    /// Default: 1.35
    pub max_price_markup: f64,

    /// Constant quantity written on every record.
    /// Default: 1
    pub quantity: u32,

    /// Constant item location written on every record.
    /// Default: "WALMART"
    pub item_location: String,

    /// Rows with a retail price below this value are flagged for review.
    /// Default: 10.0
    pub low_price_threshold: f64,

    /// Whether to collapse exact duplicate records.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether gaps between shipping bands are accepted (a weight in a gap
    /// resolves to no shipping cost). When false, gapped tables are rejected.
    /// Default: true
    pub allow_band_gaps: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            handling_cost: 0.75,
            retail_markup: 1.35,
            max_price_markup: 1.35,
            quantity: 1,
            item_location: "WALMART".to_string(),
            low_price_threshold: 10.0,
            remove_duplicates: true,
            allow_band_gaps: true,
        }
    }
}

impl ProcessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.handling_cost.is_finite() || self.handling_cost < 0.0 {
            return Err(ConfigValidationError::InvalidAmount {
                field: "handling_cost".to_string(),
                value: self.handling_cost,
            });
        }

        for (field, value) in [
            ("retail_markup", self.retail_markup),
            ("max_price_markup", self.max_price_markup),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::InvalidMarkup {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !self.low_price_threshold.is_finite() || self.low_price_threshold < 0.0 {
            return Err(ConfigValidationError::InvalidAmount {
                field: "low_price_threshold".to_string(),
                value: self.low_price_threshold,
            });
        }

        if self.item_location.trim().is_empty() {
            return Err(ConfigValidationError::EmptyItemLocation);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid amount for '{field}': {value} (must be a non-negative number)")]
    InvalidAmount { field: String, value: f64 },

    #[error("Invalid markup for '{field}': {value} (must be greater than 0)")]
    InvalidMarkup { field: String, value: f64 },

    #[error("Item location must not be empty")]
    EmptyItemLocation,
}

/// Builder for [`ProcessingConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    handling_cost: Option<f64>,
    retail_markup: Option<f64>,
    max_price_markup: Option<f64>,
    quantity: Option<u32>,
    item_location: Option<String>,
    low_price_threshold: Option<f64>,
    remove_duplicates: Option<bool>,
    allow_band_gaps: Option<bool>,
}

impl ProcessingConfigBuilder {
    /// Set the handling cost added to every record.
    pub fn handling_cost(mut self, cost: f64) -> Self {
        self.handling_cost = Some(cost);
        self
    }

    /// Set the retail markup multiplier (e.g., 1.35 = 35%).
    pub fn retail_markup(mut self, markup: f64) -> Self {
        self.retail_markup = Some(markup);
        self
    }

    /// Set the max-price markup multiplier applied to the retail price.
    pub fn max_price_markup(mut self, markup: f64) -> Self {
        self.max_price_markup = Some(markup);
        self
    }

    /// Set the constant quantity.
    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the constant item location.
    pub fn item_location(mut self, location: impl Into<String>) -> Self {
        self.item_location = Some(location.into());
        self
    }

    /// Set the retail price below which rows are flagged for review.
    pub fn low_price_threshold(mut self, threshold: f64) -> Self {
        self.low_price_threshold = Some(threshold);
        self
    }

    /// Enable or disable duplicate record removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Accept or reject gaps between shipping bands.
    pub fn allow_band_gaps(mut self, allow: bool) -> Self {
        self.allow_band_gaps = Some(allow);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProcessingConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProcessingConfig, ConfigValidationError> {
        let defaults = ProcessingConfig::default();
        let config = ProcessingConfig {
            handling_cost: self.handling_cost.unwrap_or(defaults.handling_cost),
            retail_markup: self.retail_markup.unwrap_or(defaults.retail_markup),
            max_price_markup: self.max_price_markup.unwrap_or(defaults.max_price_markup),
            quantity: self.quantity.unwrap_or(defaults.quantity),
            item_location: self.item_location.unwrap_or(defaults.item_location),
            low_price_threshold: self
                .low_price_threshold
                .unwrap_or(defaults.low_price_threshold),
            remove_duplicates: self.remove_duplicates.unwrap_or(defaults.remove_duplicates),
            allow_band_gaps: self.allow_band_gaps.unwrap_or(defaults.allow_band_gaps),
        };

        config.validate()?;
        Ok(config)
    }
}
