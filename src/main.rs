// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Module declarations
mod api;
mod capture;
mod models;
mod paths;
mod prompts;
mod session;

use api::LlmConfig;
use models::{ExportResult, GenerationResult, SessionSnapshot};
use paths::*;
use session::{RegenerateMode, SketchSession};

use log::{error, info, warn};
use std::path::Path;
use std::sync::Mutex;
use tauri::{command, Manager};

// ============ App State ============

#[derive(Default)]
pub struct AppState {
    pub session: Mutex<SketchSession>,
}

// ============ Capture Commands ============

/// Accepts a webcam frame from the frontend. A frame that fails to decode
/// is logged and rejected; the session keeps whatever it had before.
#[command]
async fn store_capture(
    state: tauri::State<'_, AppState>,
    data_url: String,
) -> Result<SessionSnapshot, String> {
    let normalized = capture::normalize_sketch(&data_url).map_err(|e| {
        error!("[store_capture] dropping frame: {}", e);
        e
    })?;

    let mut session = state.session.lock().unwrap();
    session.store_capture(normalized)?;
    Ok(session.snapshot())
}

#[command]
async fn discard_capture(state: tauri::State<'_, AppState>) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().unwrap();
    session.discard_capture()?;
    Ok(session.snapshot())
}

#[command]
async fn get_session(state: tauri::State<'_, AppState>) -> Result<SessionSnapshot, String> {
    Ok(state.session.lock().unwrap().snapshot())
}

#[command]
async fn set_vibe(state: tauri::State<'_, AppState>, vibe: String) -> Result<(), String> {
    state.session.lock().unwrap().set_vibe(vibe);
    Ok(())
}

#[command]
async fn reset_session(state: tauri::State<'_, AppState>) -> Result<SessionSnapshot, String> {
    let mut session = state.session.lock().unwrap();
    session.reset();
    Ok(session.snapshot())
}

// ============ Generation Commands ============

#[command]
async fn generate_app(state: tauri::State<'_, AppState>) -> Result<GenerationResult, String> {
    let (sketch, vibe) = {
        let mut session = state.session.lock().unwrap();
        let sketch = session.begin_generation()?;
        (sketch, session.vibe().to_string())
    };

    let config = api::load_llm_config()?;
    // On failure the session deliberately stays in its generating phase;
    // reset_session is the way out
    let content = api::generate_prototype(&config, &vibe, &sketch)
        .await
        .map_err(|e| {
            error!("[generate_app] call failed: {}", e);
            e
        })?;

    let mut session = state.session.lock().unwrap();
    session.complete_generation(content.clone());
    Ok(GenerationResult { content })
}

#[command]
async fn regenerate_app(
    state: tauri::State<'_, AppState>,
    edits: String,
) -> Result<GenerationResult, String> {
    let (sketch, vibe) = {
        let mut session = state.session.lock().unwrap();
        let sketch = session.begin_regeneration()?;
        (sketch, session.vibe().to_string())
    };

    let config = api::load_llm_config()?;
    let result = match session::regenerate_mode(&edits) {
        RegenerateMode::Revise => api::revise_prototype(&config, &edits, &sketch).await,
        RegenerateMode::FromSketch => api::generate_prototype(&config, &vibe, &sketch).await,
    };
    let content = result.map_err(|e| {
        error!("[regenerate_app] call failed: {}", e);
        e
    })?;

    let mut session = state.session.lock().unwrap();
    session.complete_generation(content.clone());
    Ok(GenerationResult { content })
}

// ============ API Key Commands ============

#[command]
async fn save_api_key(key: String) -> Result<(), String> {
    info!("[save_api_key] Starting to save OpenAI API key");
    let mut config = api::load_llm_config()?;
    config.openai_api_key = Some(key);
    api::save_llm_config(&config)?;
    info!("[save_api_key] OpenAI API key saved successfully");
    Ok(())
}

#[command]
async fn get_api_key() -> Result<Option<String>, String> {
    // First check for built-in key (compile-time embedded)
    if let Some(builtin_key) = api::get_builtin_api_key() {
        return Ok(Some(builtin_key));
    }
    // Fall back to user-configured key in LLM config
    let config = api::load_llm_config()?;
    Ok(config.openai_api_key)
}

#[command]
async fn has_api_key() -> Result<bool, String> {
    if api::get_builtin_api_key().is_some() {
        return Ok(true);
    }
    let config = api::load_llm_config()?;
    Ok(config.openai_api_key.is_some())
}

// ============ Model Configuration Commands ============

#[command]
async fn get_llm_config_cmd() -> Result<LlmConfig, String> {
    api::load_llm_config()
}

#[command]
async fn set_vision_model(model: String) -> Result<(), String> {
    info!("[set_vision_model] Setting vision model to: {}", model);
    let mut config = api::load_llm_config()?;
    config.vision_model = model;
    api::save_llm_config(&config)?;
    Ok(())
}

// ============ Export Commands ============

fn write_export(exports_dir: &Path, artifact: &str) -> Result<ExportResult, String> {
    let session_name = format!(
        "prototype-{}",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    );
    let export_dir = exports_dir.join(session_name);
    std::fs::create_dir_all(&export_dir)
        .map_err(|e| format!("Failed to create export directory: {}", e))?;

    let file_path = export_dir.join("App.js");
    std::fs::write(&file_path, artifact).map_err(|e| format!("Failed to write App.js: {}", e))?;

    Ok(ExportResult {
        export_dir: export_dir.to_string_lossy().to_string(),
        files_written: vec!["App.js".to_string()],
    })
}

#[command]
async fn export_artifact(state: tauri::State<'_, AppState>) -> Result<ExportResult, String> {
    let artifact = state
        .session
        .lock()
        .unwrap()
        .artifact()
        .map(|a| a.to_string())
        .ok_or_else(|| "No prototype to export".to_string())?;

    let exports_dir = get_exports_dir()?;
    tokio::fs::create_dir_all(&exports_dir)
        .await
        .map_err(|e| format!("Failed to create exports directory: {}", e))?;

    let result = write_export(&exports_dir, &artifact)?;
    info!("[export_artifact] wrote {}", result.export_dir);
    Ok(result)
}

#[command]
async fn open_exports_folder() -> Result<(), String> {
    let exports_dir = get_exports_dir()?;

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&exports_dir)
        .map_err(|e| format!("Failed to create exports directory: {}", e))?;

    // Open in file manager
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&exports_dir)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(&exports_dir)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&exports_dir)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    Ok(())
}

#[command]
async fn open_logs_folder(app: tauri::AppHandle) -> Result<(), String> {
    let log_dir = app
        .path()
        .app_log_dir()
        .map_err(|e| format!("Failed to get log directory: {}", e))?;

    std::fs::create_dir_all(&log_dir)
        .map_err(|e| format!("Failed to create log directory: {}", e))?;

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&log_dir)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(&log_dir)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&log_dir)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    Ok(())
}

// ============ Housekeeping Commands ============

#[command]
async fn clear_all_data() -> Result<(), String> {
    warn!("[clear_all_data] Removing app data directory");
    clear_app_data()
}

// ============ Frontend Logging ============

#[command]
fn log_from_frontend(level: String, message: String) {
    match level.as_str() {
        "error" => error!("[Frontend] {}", message),
        "warn" => warn!("[Frontend] {}", message),
        _ => info!("[Frontend] {}", message),
    }
}

#[command]
fn is_debug_mode() -> bool {
    cfg!(debug_assertions)
}

#[command]
fn quit_app() {
    info!("[quit_app] Exiting");
    std::process::exit(0);
}

fn main() {
    tauri::Builder::default()
        .manage(AppState::default())
        .setup(|_app| {
            // Log startup information
            info!("=== Sketcha Desktop Starting ===");
            if let Ok(config) = api::load_llm_config() {
                info!("[startup] vision model: {}", config.vision_model);
                info!(
                    "[startup] api key configured: {}",
                    config.openai_api_key.is_some() || api::get_builtin_api_key().is_some()
                );
            }
            Ok(())
        })
        .plugin(
            tauri_plugin_log::Builder::new()
                .target(tauri_plugin_log::Target::new(
                    tauri_plugin_log::TargetKind::LogDir {
                        file_name: Some("sketcha.log".into()),
                    },
                ))
                .level(log::LevelFilter::Info)
                .build(),
        )
        .invoke_handler(tauri::generate_handler![
            store_capture,
            discard_capture,
            get_session,
            set_vibe,
            reset_session,
            generate_app,
            regenerate_app,
            save_api_key,
            get_api_key,
            has_api_key,
            get_llm_config_cmd,
            set_vision_model,
            export_artifact,
            open_exports_folder,
            open_logs_folder,
            clear_all_data,
            log_from_frontend,
            is_debug_mode,
            quit_app,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Phase;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use std::io::Cursor;

    fn webcam_frame() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([30, 30, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        format!("data:image/jpeg;base64,{}", BASE64.encode(&buf))
    }

    fn mock_config(server: &mockito::ServerGuard) -> LlmConfig {
        LlmConfig {
            vision_model: "gpt-4-vision-preview".to_string(),
            api_base: server.url(),
            openai_api_key: Some("sk-test".to_string()),
        }
    }

    fn completion_body(content: &str) -> String {
        json!({ "choices": [ { "message": { "content": content } } ] }).to_string()
    }

    #[tokio::test]
    async fn capture_then_generate_fills_the_artifact_slot() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("// hi\nfunction App(){return null}"))
            .create_async()
            .await;

        let mut session = SketchSession::default();
        let normalized = capture::normalize_sketch(&webcam_frame()).unwrap();
        session.store_capture(normalized).unwrap();
        assert_eq!(session.phase(), Phase::Captured);

        let sketch = session.begin_generation().unwrap();
        let vibe = session.vibe().to_string();
        let content = api::generate_prototype(&mock_config(&server), &vibe, &sketch)
            .await
            .unwrap();
        session.complete_generation(content);

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.artifact(), Some("// hi\nfunction App(){return null}"));
    }

    #[tokio::test]
    async fn eleven_char_instruction_takes_the_revision_path() {
        let edits = "abcdefghijk";
        assert_eq!(edits.len(), 11);
        assert_eq!(session::regenerate_mode(edits), RegenerateMode::Revise);

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Regex("abcdefghijk".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("function App(){return 2}"))
            .create_async()
            .await;

        let mut session = SketchSession::default();
        let normalized = capture::normalize_sketch(&webcam_frame()).unwrap();
        session.store_capture(normalized).unwrap();
        session.begin_generation().unwrap();
        session.complete_generation("function App(){return 1}".to_string());

        let sketch = session.begin_regeneration().unwrap();
        let content = api::revise_prototype(&mock_config(&server), edits, &sketch)
            .await
            .unwrap();
        session.complete_generation(content);

        // replaced wholesale, never merged
        assert_eq!(session.artifact(), Some("function App(){return 2}"));
        mock.assert_async().await;
    }

    #[test]
    fn undecodable_frame_leaves_session_idle() {
        let mut session = SketchSession::default();
        let result = capture::normalize_sketch("data:image/png;base64,!!!!");
        assert!(result.is_err());
        // the command never touches the session on a bad frame
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.sketch().is_none());
    }

    #[test]
    fn export_writes_the_artifact_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = "// exported\nfunction App(){return null}";
        let result = write_export(dir.path(), artifact).unwrap();

        assert_eq!(result.files_written, vec!["App.js".to_string()]);
        let written = std::fs::read_to_string(
            std::path::Path::new(&result.export_dir).join("App.js"),
        )
        .unwrap();
        assert_eq!(written, artifact);
    }
}
