//! Google Gemini client
//!
//! Two operations back the application: extracting water-quality
//! parameters from a photographed lab report, and composing a threat
//! assessment narrative from the farm profile, latest readings and the
//! weather forecast. Replies arrive as free text, so parsing is
//! deliberately tolerant: code fences are stripped, prose around the
//! JSON payload is ignored, and non-numeric parameter values are
//! coerced to null rather than rejected.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::{
    evaluate_parameter, DayForecast, ParameterKey, ParameterStatus, ReportStatus, UserProfile,
    WaterQualityParameters, WaterReport,
};

use crate::config::GeminiConfig;
use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Structured outcome of report-image analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub parameters: WaterQualityParameters,
    pub status: ReportStatus,
    pub suggestions: Vec<String>,
}

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Client
// ============================================================================

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract water-quality parameters from a photographed report.
    ///
    /// `image_base64` is the raw base64 payload (no data-URI prefix) and
    /// `mime_type` its content type, e.g. `image/jpeg`.
    pub async fn analyze_report_image(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> AppResult<ExtractionResult> {
        let request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                    Part::Text {
                        text: extraction_prompt(),
                    },
                ],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                response_mime_type: Some("application/json".to_string()),
            }),
        };

        let reply = self.generate(&request).await?;
        parse_extraction_reply(&reply)
    }

    /// Compose the threat assessment narrative for the latest report.
    ///
    /// Callers must supply a non-empty forecast; the narrative weighs
    /// upcoming weather against the readings, so without it the output
    /// would be misleading.
    pub async fn threat_assessment(
        &self,
        profile: &UserProfile,
        report: &WaterReport,
        forecast: &[DayForecast],
    ) -> AppResult<String> {
        if forecast.is_empty() {
            return Err(AppError::AiService(
                "threat assessment requires a weather forecast".to_string(),
            ));
        }

        let request = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text {
                    text: threat_prompt(profile, report, forecast),
                }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: "You are an aquaculture advisor helping small-scale fish and shrimp \
                           farmers interpret water-quality results. Be specific and practical."
                        .to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.4),
                response_mime_type: None,
            }),
        };

        self.generate(&request).await
    }

    /// Send a generateContent request and return the first candidate's text.
    async fn generate(&self, request: &GeminiRequest) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Gemini API key is not configured".into()))?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        tracing::debug!(model = %self.model, "sending Gemini request");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::AiService(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::AiService(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map_or(body, |e| e.message);
            return Err(classify_api_error(status.as_u16(), &message));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::AiService(format!("unexpected response shape: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(classify_api_error(status.as_u16(), &error.message));
        }

        parsed
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| p.drain(..).next())
            .and_then(|p| p.text)
            .ok_or_else(|| AppError::AiService("response contained no text".to_string()))
    }
}

/// Map an API failure to the application error space. Quota exhaustion
/// is surfaced distinctly so the user is told to retry later instead of
/// re-checking their input.
fn classify_api_error(status: u16, message: &str) -> AppError {
    if status == 429 || message.to_lowercase().contains("quota") {
        AppError::QuotaExceeded(message.to_string())
    } else {
        AppError::AiService(format!("API error ({}): {}", status, message))
    }
}

// ============================================================================
// Prompts
// ============================================================================

fn extraction_prompt() -> String {
    let keys: Vec<String> = ParameterKey::ALL
        .iter()
        .map(|key| {
            let unit = key.unit();
            if unit.is_empty() {
                format!("\"{}\" ({})", key.json_key(), key.label())
            } else {
                format!("\"{}\" ({}, {})", key.json_key(), key.label(), unit)
            }
        })
        .collect();

    format!(
        "Analyze this photographed water-quality test report from an aquaculture farm.\n\
         Extract the measured values and reply with a single JSON object with exactly\n\
         these top-level keys:\n\
         - \"parameters\": object whose keys are {keys} -- use the numeric value from\n\
           the report, or null when a parameter is absent or unreadable.\n\
         - \"status\": one of \"Safe\", \"Warning\" or \"Critical\" summarizing the\n\
           overall water condition for fish or shrimp farming.\n\
         - \"suggestions\": array of 2-3 short, actionable recommendations for the farmer.\n\
         Reply with JSON only, no surrounding text.",
        keys = keys.join(", ")
    )
}

fn threat_prompt(profile: &UserProfile, report: &WaterReport, forecast: &[DayForecast]) -> String {
    let mut readings = String::new();
    for (key, value) in report.parameters.present() {
        let status = evaluate_parameter(key, Some(value));
        let unit = key.unit();
        readings.push_str(&format!(
            "- {}: {} {} ({})\n",
            key.label(),
            value,
            unit,
            status_word(status)
        ));
    }
    if readings.is_empty() {
        readings.push_str("- no readings recorded\n");
    }

    let mut weather = String::new();
    for day in forecast {
        weather.push_str(&format!(
            "- {}: {}, {:.0}-{:.0} degrees C\n",
            day.date, day.condition, day.temp_min, day.temp_max
        ));
    }

    format!(
        "A farmer runs a {farming_type} farm ({farm_size}) near {location}.\n\
         Their latest water test (overall status: {status}) shows:\n{readings}\n\
         The forecast for the coming days:\n{weather}\n\
         Identify the threats this combination poses to the stock. For each threat,\n\
         write lines in the form:\n\
         Threat: <what could go wrong and why>\n\
         Risk: <Low, Medium or High>\n\
         Explanation: <one or two sentences linking the readings and the weather>\n\
         Suggestions:\n\
         - <mitigation>\n\
         - <mitigation>\n\
         If the water and forecast pose no meaningful risk, say so in one short paragraph instead.",
        farming_type = profile.farming_type.as_str(),
        farm_size = profile.farm_size,
        location = profile.farm_location,
        status = report.status,
        readings = readings,
        weather = weather,
    )
}

fn status_word(status: ParameterStatus) -> &'static str {
    match status {
        ParameterStatus::Safe => "within ideal range",
        ParameterStatus::Warning => "outside ideal range",
        ParameterStatus::Critical => "critically out of range",
        ParameterStatus::Normal => "no ideal range configured",
    }
}

// ============================================================================
// Reply parsing
// ============================================================================

/// Parse the extraction reply into a structured result.
///
/// The model is asked for bare JSON but routinely wraps it in markdown
/// fences or leading prose, so we strip fences and slice the outermost
/// object before parsing. Missing top-level keys are an error; a
/// non-numeric parameter value is coerced to null.
pub fn parse_extraction_reply(raw: &str) -> AppResult<ExtractionResult> {
    let stripped = strip_code_fences(raw);
    let json = slice_outermost_object(stripped).ok_or_else(|| {
        AppError::AiService("reply did not contain a JSON object".to_string())
    })?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| AppError::AiService(format!("reply was not valid JSON: {}", e)))?;

    let params_obj = value
        .get("parameters")
        .and_then(Value::as_object)
        .ok_or_else(|| AppError::AiService("reply is missing \"parameters\"".to_string()))?;
    let status_str = value
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::AiService("reply is missing \"status\"".to_string()))?;
    let suggestions_arr = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::AiService("reply is missing \"suggestions\"".to_string()))?;

    let mut parameters = WaterQualityParameters::default();
    for key in ParameterKey::ALL {
        // Strings, booleans and other non-numeric values become null.
        let value = params_obj.get(key.json_key()).and_then(Value::as_f64);
        parameters.set(key, value);
    }

    let suggestions = suggestions_arr
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    Ok(ExtractionResult {
        parameters,
        status: ReportStatus::from_wire(status_str),
        suggestions,
    })
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .trim()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Slice from the first `{` to the last `}`, inclusive.
fn slice_outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
