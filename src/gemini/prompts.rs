use serde_json::{json, Value};

pub const ANALYSIS_SYSTEM_INSTRUCTION: &str = "You are a digital forensics expert. Analyze the \
provided image for any signs of digital manipulation or tampering. Your goal is to teach a \
beginner what to look for. Your response must be a JSON object.
1. Provide a concise, educational analysis in the 'analysisText' field.
2. Identify specific manipulated areas in the 'manipulatedAreas' array.
3. For each area, provide a bounding box with coordinates normalized between 0 and 1 (origin 0,0 is top-left).
4. Provide a brief 'description' for each bounding box. If no manipulations are found, return an empty 'manipulatedAreas' array.
5. In 'aiDetection', say whether the image looks AI-generated and briefly explain why.";

pub const SYNTHESIS_INSTRUCTION: &str = "Subtly manipulate this image to serve as an educational \
example of tampering. Make a change that is difficult but not impossible to spot. For example, \
you could remove a small, non-essential object, slightly alter a reflection or shadow, or subtly \
change some background text. Do not add any text or explanation in your text response, only \
output the edited image.";

pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are a friendly digital forensics tutor. Answer \
questions about image tampering, evidence collection, preservation, analysis and reporting in \
plain language suitable for a beginner. Keep answers short.";

/// Structured-output schema for the tamper analysis call.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analysisText": { "type": "STRING", "description": "Forensic analysis of the image." },
            "manipulatedAreas": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING", "description": "Description of the manipulation." },
                        "box": {
                            "type": "OBJECT",
                            "properties": {
                                "x1": { "type": "NUMBER" },
                                "y1": { "type": "NUMBER" },
                                "x2": { "type": "NUMBER" },
                                "y2": { "type": "NUMBER" }
                            },
                            "required": ["x1", "y1", "x2", "y2"]
                        }
                    },
                    "required": ["description", "box"]
                }
            },
            "aiDetection": {
                "type": "OBJECT",
                "properties": {
                    "isAiGenerated": { "type": "BOOLEAN" },
                    "reasoning": { "type": "STRING" }
                },
                "required": ["isAiGenerated", "reasoning"]
            }
        },
        "required": ["analysisText", "manipulatedAreas"]
    })
}
