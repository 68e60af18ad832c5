//! Validated, immutable configuration for one assessment run.
//!
//! [`AssessmentConfig::from_request`] is the only way to build one. It
//! performs every request-level check up front so that a bad request fails
//! before any stage runs.

use crate::config::error::{ConfigError, ConfigResult};
use crate::registry::CheckFilter;
use ak_protocol::request_models::{AssessmentRequest, CreativeProviderType};
use std::path::PathBuf;
use uuid::Uuid;

/// Brand metadata supplied with the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandMetadata {
    pub name: String,
    pub variations: Vec<String>,
    pub products: Vec<String>,
    pub product_categories: Vec<String>,
    pub call_to_actions: Vec<String>,
}

/// Generation parameters forwarded to the check evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmParams {
    pub model_name: String,
    pub location: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

/// Thresholds used by annotation-based checks.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationThresholds {
    pub early_time_seconds: f64,
    pub confidence_threshold: f64,
    pub face_surface_threshold: f64,
    pub logo_size_threshold: f64,
    pub avg_shot_duration_seconds: f64,
    pub dynamic_cutoff_ms: f64,
}

/// Where results are persisted, if anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageTarget {
    pub dataset: String,
    pub table: String,
    pub assessment_file: String,
}

impl StorageTarget {
    /// Persistence runs only when a table is named.
    pub fn is_enabled(&self) -> bool {
        !self.table.is_empty()
    }
}

/// Everything a run needs to know about the request.
///
/// Shared with stages behind an `Arc` and never mutated once the pipeline
/// plan has been computed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentConfig {
    /// Identifies the run; keys per-run scratch space.
    pub run_id: Uuid,
    pub project_id: String,
    pub project_zone: String,
    pub bucket_name: String,
    pub media_uri: String,
    pub provider: CreativeProviderType,
    pub brand: BrandMetadata,
    pub extract_brand_metadata: bool,
    pub use_annotations: bool,
    pub use_llms: bool,
    pub run_long_form_abcd: bool,
    pub run_shorts: bool,
    pub run_custom: bool,
    pub verbose: bool,
    pub check_filter: CheckFilter,
    pub storage: StorageTarget,
    pub knowledge_graph_api_key: String,
    pub llm: LlmParams,
    pub thresholds: AnnotationThresholds,
    /// Path of the scoped credential file, set once credentials are acquired.
    pub credentials_path: Option<PathBuf>,
}

impl AssessmentConfig {
    /// Validate a request and build the run configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation [`ConfigError`] if:
    /// - the locator or project id is empty
    /// - the provider tag is unknown
    /// - the locator does not match the provider family
    /// - a generation parameter or threshold is out of range
    /// - a storage dataset or table name is not a plain identifier
    pub fn from_request(request: AssessmentRequest) -> ConfigResult<Self> {
        let media_uri = request.gcs_uri.trim().to_string();
        if media_uri.is_empty() {
            return Err(ConfigError::MissingField("gcs_uri"));
        }
        if request.project_id.trim().is_empty() {
            return Err(ConfigError::MissingField("project_id"));
        }

        let provider = CreativeProviderType::parse(&request.creative_provider_type)
            .ok_or_else(|| ConfigError::UnknownProvider(request.creative_provider_type.clone()))?;

        if !media_uri.contains(provider.locator_marker()) {
            return Err(ConfigError::ProviderMismatch {
                provider,
                uri: media_uri,
            });
        }

        validate_range("temperature", request.temperature, 0.0, 2.0)?;
        validate_range("top_p", request.top_p, f64::MIN_POSITIVE, 1.0)?;
        validate_range("confidence_threshold", request.confidence_threshold, 0.0, 1.0)?;
        validate_range("face_surface_threshold", request.face_surface_threshold, 0.0, 1.0)?;
        validate_non_negative("early_time_seconds", request.early_time_seconds)?;
        validate_non_negative("logo_size_threshold", request.logo_size_threshold)?;
        validate_non_negative("avg_shot_duration_seconds", request.avg_shot_duration_seconds)?;
        validate_non_negative("dynamic_cutoff_ms", request.dynamic_cutoff_ms)?;
        if request.max_output_tokens == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_output_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }

        validate_storage_name("bq_dataset_name", &request.bq_dataset_name)?;
        validate_storage_name("bq_table_name", &request.bq_table_name)?;

        let bucket_name = if request.bucket_name.is_empty() {
            bucket_from_uri(&media_uri).unwrap_or_default()
        } else {
            request.bucket_name
        };

        let extract_brand_metadata = request
            .extract_brand_metadata
            .unwrap_or(request.brand_name.is_empty());

        let brand = if request.brand_name.is_empty() {
            BrandMetadata::default()
        } else {
            BrandMetadata {
                name: request.brand_name,
                variations: split_list(&request.brand_variations),
                products: split_list(&request.products),
                product_categories: split_list(&request.products_categories),
                call_to_actions: split_list(&request.call_to_actions),
            }
        };

        Ok(Self {
            run_id: Uuid::new_v4(),
            project_id: request.project_id,
            project_zone: request.project_zone,
            bucket_name,
            media_uri,
            provider,
            brand,
            extract_brand_metadata,
            use_annotations: request.use_annotations,
            use_llms: request.use_llms,
            run_long_form_abcd: request.run_long_form_abcd,
            run_shorts: request.run_shorts,
            run_custom: request.run_custom,
            verbose: request.verbose,
            check_filter: CheckFilter::parse(&request.features_to_evaluate),
            storage: StorageTarget {
                dataset: request.bq_dataset_name,
                table: request.bq_table_name,
                assessment_file: request.assessment_file,
            },
            knowledge_graph_api_key: request.knowledge_graph_api_key,
            llm: LlmParams {
                model_name: request.llm_name,
                location: request.llm_location,
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
            },
            thresholds: AnnotationThresholds {
                early_time_seconds: request.early_time_seconds,
                confidence_threshold: request.confidence_threshold,
                face_surface_threshold: request.face_surface_threshold,
                logo_size_threshold: request.logo_size_threshold,
                avg_shot_duration_seconds: request.avg_shot_duration_seconds,
                dynamic_cutoff_ms: request.dynamic_cutoff_ms,
            },
            credentials_path: None,
        })
    }

    /// Media preparation (annotations, trimming) only applies to stored media.
    pub fn is_stored_media(&self) -> bool {
        self.provider == CreativeProviderType::Gcs
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn with_credentials(mut self, path: Option<PathBuf>) -> Self {
        self.credentials_path = path;
        self
    }
}

/// Dataset and table names become path components of the result store, so
/// they are restricted to BigQuery-style identifiers. Empty means unset.
pub fn is_storage_identifier(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validate_storage_name(field: &'static str, value: &str) -> ConfigResult<()> {
    if is_storage_identifier(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidStorageName {
            field,
            value: value.to_string(),
        })
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn bucket_from_uri(uri: &str) -> Option<String> {
    uri.strip_prefix("gs://")
        .and_then(|rest| rest.split('/').next())
        .filter(|bucket| !bucket.is_empty())
        .map(str::to_string)
}

fn validate_range(name: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{value} is outside [{min}, {max}]"),
        })
    }
}

fn validate_non_negative(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{value} must be a non-negative number"),
        })
    }
}
