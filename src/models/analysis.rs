use serde::{Deserialize, Serialize};

/// A region the model claims was manipulated, as fractions of the image
/// width/height with the origin at the top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub description: String,
}

impl BoundingBox {
    /// Clamp every coordinate into `[0, 1]` and swap inverted corners so that
    /// `x1 <= x2` and `y1 <= y2` hold. Returns `None` for non-finite input.
    pub fn normalized(self) -> Option<Self> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let [x1, y1, x2, y2] = coords.map(|c| c.clamp(0.0, 1.0));
        Some(Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            description: self.description,
        })
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiDetectionResult {
    pub is_ai_generated: bool,
    pub reasoning: String,
}

/// The analysis half of a result, as returned by the tamper-analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct TamperAnalysis {
    pub analysis_text: String,
    pub manipulated_areas: Vec<BoundingBox>,
    pub ai_detection: Option<AiDetectionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_text: String,
    pub tampered_image_url: String,
    #[serde(default)]
    pub manipulated_areas: Vec<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_detection: Option<AiDetectionResult>,
}

impl AnalysisResult {
    /// Merge the two halves of an analysis run. Area order is preserved as
    /// returned by the model; it doubles as the overlay reveal order.
    pub fn merge(analysis: TamperAnalysis, tampered_image_url: String) -> Self {
        Self {
            analysis_text: analysis.analysis_text,
            tampered_image_url,
            manipulated_areas: analysis.manipulated_areas,
            ai_detection: analysis.ai_detection,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    /// `"WxH"`, or `"unknown"` when the bytes could not be decoded.
    pub dimensions: String,
    /// Hex SHA-256 of the raw file bytes.
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perceptual_hash: Option<String>,
}
