//! Completion-endpoint client and LLM configuration

use crate::paths::get_llm_config_path;
use crate::prompts::{
    edit_directive, generation_system_prompt, CODE_ONLY_DIRECTIVE, REVISION_SYSTEM_PROMPT,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Output ceiling for the initial generation call
const GENERATION_MAX_TOKENS: u32 = 3000;

/// Output ceiling for the revision call
const REVISION_MAX_TOKENS: u32 = 2500;

fn default_vision_model() -> String {
    "gpt-4-vision-preview".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LlmConfig {
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub openai_api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            vision_model: default_vision_model(),
            api_base: default_api_base(),
            openai_api_key: None,
        }
    }
}

pub fn load_llm_config() -> Result<LlmConfig, String> {
    let config_path = get_llm_config_path()?;
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read LLM config: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse LLM config: {}", e))
    } else {
        Ok(LlmConfig::default())
    }
}

pub fn save_llm_config(config: &LlmConfig) -> Result<(), String> {
    let config_path = get_llm_config_path()?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory: {}", e))?;
    }
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize LLM config: {}", e))?;
    std::fs::write(&config_path, content).map_err(|e| format!("Failed to save LLM config: {}", e))
}

// ============ Built-in API Key Support ============

/// XOR key for deobfuscation (must match build.rs)
const XOR_KEY: [u8; 16] = [
    0x53, 0x6b, 0x65, 0x74, 0x63, 0x68, 0x61, 0x42, 0x6c, 0x75, 0x65, 0x62, 0x65, 0x72, 0x72,
    0x79,
];

/// Compile-time embedded obfuscated API key (hex-encoded)
const OBFUSCATED_API_KEY: &str = env!("OBFUSCATED_API_KEY");

/// Whether a built-in API key was provided at compile time
const HAS_BUILTIN_KEY: &str = env!("HAS_BUILTIN_KEY");

/// Deobfuscate the hex-encoded XOR-obfuscated API key
fn deobfuscate_api_key(hex_encoded: &str) -> Option<String> {
    if hex_encoded.is_empty() {
        return None;
    }

    let obfuscated: Vec<u8> = (0..hex_encoded.len())
        .step_by(2)
        .filter_map(|i| u8::from_str_radix(&hex_encoded[i..i + 2], 16).ok())
        .collect();

    if obfuscated.is_empty() {
        return None;
    }

    let deobfuscated: Vec<u8> = obfuscated
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
        .collect();

    String::from_utf8(deobfuscated).ok()
}

/// Get the built-in API key if one was embedded at compile time
pub fn get_builtin_api_key() -> Option<String> {
    if HAS_BUILTIN_KEY == "1" {
        deobfuscate_api_key(OBFUSCATED_API_KEY)
    } else {
        None
    }
}

/// Built-in key wins over the user-configured one
fn resolve_api_key(config: &LlmConfig) -> Result<String, String> {
    get_builtin_api_key()
        .or_else(|| config.openai_api_key.clone())
        .ok_or_else(|| "OpenAI API key not configured".to_string())
}

// ============ Vision Calls ============

async fn call_vision_chat(
    config: &LlmConfig,
    messages: Vec<Value>,
    max_tokens: u32,
) -> Result<String, String> {
    let api_key = resolve_api_key(config)?;

    let client = reqwest::Client::new();
    let body = json!({
        "model": config.vision_model,
        "messages": messages,
        "max_tokens": max_tokens
    });

    let response = client
        .post(format!("{}/chat/completions", config.api_base))
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("API request failed: {}", e))?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("API error: {}", error_text));
    }

    let response_json: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    // First choice's text, verbatim; nothing validates it is real code
    response_json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| "API returned empty content".to_string())
}

/// Initial generation: fixed three-message request around the sketch. The
/// vibe label only travels to the log line, never into the prompt.
pub async fn generate_prototype(
    config: &LlmConfig,
    vibe: &str,
    sketch_data_url: &str,
) -> Result<String, String> {
    info!(
        "[generate] requesting {} prototype via {}",
        vibe, config.vision_model
    );

    let messages = vec![
        json!({
            "role": "system",
            "content": generation_system_prompt()
        }),
        json!({
            "role": "user",
            "content": [
                {
                    "type": "image_url",
                    "image_url": {
                        "url": sketch_data_url
                    }
                }
            ]
        }),
        json!({
            "role": "user",
            "content": CODE_ONLY_DIRECTIVE
        }),
    ];

    let content = call_vision_chat(config, messages, GENERATION_MAX_TOKENS).await?;
    info!("[generate] received {} chars", content.len());
    Ok(content)
}

/// Targeted revision: same sketch, plus the user's edit instruction
pub async fn revise_prototype(
    config: &LlmConfig,
    edits: &str,
    sketch_data_url: &str,
) -> Result<String, String> {
    info!("[revise] requesting revision ({} chars of edits)", edits.len());

    let messages = vec![
        json!({
            "role": "system",
            "content": REVISION_SYSTEM_PROMPT
        }),
        json!({
            "role": "user",
            "content": [
                {
                    "type": "image_url",
                    "image_url": {
                        "url": sketch_data_url
                    }
                }
            ]
        }),
        json!({
            "role": "user",
            "content": edit_directive(edits)
        }),
    ];

    let content = call_vision_chat(config, messages, REVISION_MAX_TOKENS).await?;
    info!("[revise] received {} chars", content.len());
    Ok(content)
}
