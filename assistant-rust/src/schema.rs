use serde_json::json;
use study_sdk::ResponseFormatJson;

/// Output shape of process and refine calls. `heading` is declared only when
/// headings are tracked; an empty heading is read as no heading.
pub fn processing_format(with_heading: bool) -> ResponseFormatJson {
    let body = json!({
        "type": "string",
        "description": "The processed (simplified, summarized or question and answer) or refined text in the requested format. Use <strong> tags for emphasis."
    });

    let schema = if with_heading {
        json!({
            "type": "object",
            "properties": {
                "heading": {
                    "type": "string",
                    "description": "A short, descriptive heading for the text."
                },
                "body": body
            },
            "required": ["heading", "body"],
            "additionalProperties": false
        })
    } else {
        json!({
            "type": "object",
            "properties": { "body": body },
            "required": ["body"],
            "additionalProperties": false
        })
    };

    ResponseFormatJson {
        name: "processed_text".to_string(),
        description: Some("Processed or refined study text.".to_string()),
        schema: Some(schema),
    }
}

pub fn study_chat_format() -> ResponseFormatJson {
    ResponseFormatJson {
        name: "study_answer".to_string(),
        description: Some("Answer to a study question.".to_string()),
        schema: Some(json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The answer to the question, based on the notes if relevant, or general knowledge."
                }
            },
            "required": ["answer"],
            "additionalProperties": false
        })),
    }
}

pub fn extract_text_format() -> ResponseFormatJson {
    ResponseFormatJson {
        name: "extracted_text".to_string(),
        description: Some("Text read from an image.".to_string()),
        schema: Some(json!({
            "type": "object",
            "properties": {
                "extracted_text": {
                    "type": "string",
                    "description": "All text found in the image, in reading order."
                }
            },
            "required": ["extracted_text"],
            "additionalProperties": false
        })),
    }
}
